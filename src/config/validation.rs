use crate::config::types::{Config, LocalizerConfig, NetworkConfig};
use crate::ConfigError;
use url::Url;

/// Upper bound on concurrent download workers
const MAX_WORKERS_LIMIT: usize = 64;

/// Proxy schemes understood by the HTTP client
const PROXY_SCHEMES: &[&str] = &["http", "https", "socks5", "socks5h"];

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_localizer_config(&config.localizer)?;
    validate_network_config(&config.network)?;
    Ok(())
}

/// Validates output and worker settings
fn validate_localizer_config(config: &LocalizerConfig) -> Result<(), ConfigError> {
    if config.max_workers < 1 || config.max_workers > MAX_WORKERS_LIMIT {
        return Err(ConfigError::Validation(format!(
            "max_workers must be between 1 and {}, got {}",
            MAX_WORKERS_LIMIT, config.max_workers
        )));
    }

    if !config.served_prefix.starts_with('/') || !config.served_prefix.ends_with('/') {
        return Err(ConfigError::Validation(format!(
            "served_prefix must start and end with '/', got '{}'",
            config.served_prefix
        )));
    }

    if config.served_prefix.contains("..") {
        return Err(ConfigError::Validation(format!(
            "served_prefix cannot contain '..', got '{}'",
            config.served_prefix
        )));
    }

    if config.output_dir_name.trim().is_empty()
        || config.output_dir_name.contains(['/', '\\'])
    {
        return Err(ConfigError::Validation(format!(
            "output_dir_name must be a single non-empty directory name, got '{}'",
            config.output_dir_name
        )));
    }

    if let Some(base_path) = &config.base_path {
        if base_path.trim().is_empty() {
            return Err(ConfigError::Validation(
                "base_path cannot be empty when set".to_string(),
            ));
        }
    }

    Ok(())
}

/// Validates proxy, timeouts and the force-proxy list
fn validate_network_config(config: &NetworkConfig) -> Result<(), ConfigError> {
    if let Some(proxy) = &config.proxy {
        validate_proxy_url(proxy)?;
    }

    for pattern in &config.force_proxy {
        validate_domain_pattern(pattern)?;
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "request_timeout_secs must be >= 1, got {}",
            config.request_timeout_secs
        )));
    }

    if config.proxy_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "proxy_timeout_secs must be >= 1, got {}",
            config.proxy_timeout_secs
        )));
    }

    Ok(())
}

/// Validates that the proxy is an absolute URL with a supported scheme
pub(crate) fn validate_proxy_url(proxy: &str) -> Result<(), ConfigError> {
    let url = Url::parse(proxy)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid proxy '{}': {}", proxy, e)))?;

    if !PROXY_SCHEMES.contains(&url.scheme()) {
        return Err(ConfigError::InvalidUrl(format!(
            "Proxy '{}' must use one of {:?}",
            proxy, PROXY_SCHEMES
        )));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(ConfigError::InvalidUrl(format!(
            "Proxy '{}' has no host",
            proxy
        )));
    }

    Ok(())
}

/// Validates a domain pattern (supports wildcards)
pub(crate) fn validate_domain_pattern(pattern: &str) -> Result<(), ConfigError> {
    if pattern.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Domain pattern cannot be empty".to_string(),
        ));
    }

    let domain = pattern.strip_prefix("*.").unwrap_or(pattern);
    validate_domain_string(domain)
}

/// Validates a domain string (without wildcard prefix)
fn validate_domain_string(domain: &str) -> Result<(), ConfigError> {
    if domain.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Domain cannot be empty".to_string(),
        ));
    }

    if !domain
        .chars()
        .all(|c| c.is_alphanumeric() || c == '.' || c == '-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' contains invalid characters",
            domain
        )));
    }

    if domain.starts_with('.')
        || domain.ends_with('.')
        || domain.starts_with('-')
        || domain.ends_with('-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' cannot start or end with '.' or '-'",
            domain
        )));
    }

    if domain.contains("..") {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' cannot contain consecutive dots",
            domain
        )));
    }

    if !domain.contains('.') {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' must contain at least one dot (e.g., 'example.com')",
            domain
        )));
    }

    Ok(())
}
