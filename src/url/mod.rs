//! URL handling module for Card-Localizer
//!
//! This module provides host extraction, host pattern matching for the
//! force-proxy list, and classification of how a reference should be routed
//! through the network.

mod domain;
mod matcher;

use crate::config::NetworkConfig;

// Re-export main functions
pub use domain::{extract_domain, is_stylesheet_endpoint, path_extension};
pub use matcher::matches_host_pattern;

/// How a download request reaches its origin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProxyRoute {
    /// No proxy configured - connect directly
    Direct,
    /// Connect directly first, retry through the proxy on failure
    DirectThenProxy,
    /// Host is on the force-proxy list - only ever use the proxy
    ProxyOnly,
}

impl ProxyRoute {
    /// Returns true if the first attempt goes through the proxy
    pub fn starts_with_proxy(&self) -> bool {
        matches!(self, Self::ProxyOnly)
    }

    /// Returns true if a failed direct attempt may be retried through the proxy
    pub fn has_proxy_fallback(&self) -> bool {
        matches!(self, Self::DirectThenProxy)
    }
}

/// Classifies how requests to a host should be routed
///
/// Priority order:
/// 1. No proxy configured: always `Direct`
/// 2. Host matches an entry of the force-proxy list: `ProxyOnly`
/// 3. Otherwise: `DirectThenProxy`
///
/// # Arguments
///
/// * `host` - The lowercase host of the reference
/// * `network` - The network configuration
///
/// # Examples
///
/// ```
/// use card_localizer::config::NetworkConfig;
/// use card_localizer::url::{classify_route, ProxyRoute};
///
/// let network = NetworkConfig {
///     proxy: Some("http://127.0.0.1:7890".to_string()),
///     force_proxy: vec!["github.com".to_string()],
///     ..NetworkConfig::default()
/// };
/// assert_eq!(classify_route("raw.github.com", &network), ProxyRoute::ProxyOnly);
/// assert_eq!(classify_route("example.com", &network), ProxyRoute::DirectThenProxy);
/// ```
pub fn classify_route(host: &str, network: &NetworkConfig) -> ProxyRoute {
    if network.proxy.is_none() {
        return ProxyRoute::Direct;
    }

    if network
        .force_proxy
        .iter()
        .any(|pattern| matches_host_pattern(pattern, host))
    {
        return ProxyRoute::ProxyOnly;
    }

    ProxyRoute::DirectThenProxy
}
