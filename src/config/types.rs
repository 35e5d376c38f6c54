use serde::Deserialize;

/// Served-path prefix under which localized resources are exposed
pub const DEFAULT_SERVED_PREFIX: &str = "/niko/";

/// Name of the directory (next to the source card) receiving rewritten cards
pub const DEFAULT_OUTPUT_DIR_NAME: &str = "localized";

/// Number of concurrent download workers
pub const DEFAULT_MAX_WORKERS: usize = 8;

/// Hosts that are only reachable through a proxy in common setups
pub const DEFAULT_FORCE_PROXY: &[&str] = &[
    "gitgud.io",
    "raw.githubusercontent.com",
    "cdn.jsdelivr.net",
    "github.com",
    "fonts.googleapis.com",
    "files.catbox.moe",
];

/// Main configuration structure for Card-Localizer
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub localizer: LocalizerConfig,
    #[serde(default)]
    pub network: NetworkConfig,
}

/// Where localized resources and cards are written
#[derive(Debug, Clone, Deserialize)]
pub struct LocalizerConfig {
    /// Public directory of the serving application; resources land under
    /// `<base-path>/<served-prefix>/<character>/`
    #[serde(rename = "base-path", default)]
    pub base_path: Option<String>,

    /// Served-path prefix, starting and ending with '/'
    #[serde(rename = "served-prefix", default = "default_served_prefix")]
    pub served_prefix: String,

    /// Directory name, next to the source card, receiving rewritten cards
    #[serde(rename = "output-dir-name", default = "default_output_dir_name")]
    pub output_dir_name: String,

    /// Number of concurrent download workers
    #[serde(rename = "max-workers", default = "default_max_workers")]
    pub max_workers: usize,
}

impl Default for LocalizerConfig {
    fn default() -> Self {
        Self {
            base_path: None,
            served_prefix: default_served_prefix(),
            output_dir_name: default_output_dir_name(),
            max_workers: default_max_workers(),
        }
    }
}

/// Outbound HTTP configuration
#[derive(Debug, Clone, Deserialize)]
pub struct NetworkConfig {
    /// Proxy URL (http, https, socks5 or socks5h)
    #[serde(default)]
    pub proxy: Option<String>,

    /// Host patterns that must always go through the proxy
    #[serde(rename = "force-proxy", default = "default_force_proxy")]
    pub force_proxy: Vec<String>,

    /// User-Agent header sent with every request
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,

    /// Timeout for direct requests, in seconds
    #[serde(rename = "request-timeout-secs", default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Timeout for proxied requests, in seconds
    #[serde(rename = "proxy-timeout-secs", default = "default_proxy_timeout")]
    pub proxy_timeout_secs: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            proxy: None,
            force_proxy: default_force_proxy(),
            user_agent: default_user_agent(),
            request_timeout_secs: default_request_timeout(),
            proxy_timeout_secs: default_proxy_timeout(),
        }
    }
}

fn default_served_prefix() -> String {
    DEFAULT_SERVED_PREFIX.to_string()
}

fn default_output_dir_name() -> String {
    DEFAULT_OUTPUT_DIR_NAME.to_string()
}

fn default_max_workers() -> usize {
    DEFAULT_MAX_WORKERS
}

fn default_force_proxy() -> Vec<String> {
    DEFAULT_FORCE_PROXY.iter().map(|s| s.to_string()).collect()
}

fn default_user_agent() -> String {
    "Mozilla/5.0".to_string()
}

fn default_request_timeout() -> u64 {
    15
}

fn default_proxy_timeout() -> u64 {
    45
}
