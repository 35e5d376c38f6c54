/// Checks if a host matches a force-proxy pattern
///
/// Both pattern forms cover the named domain and everything below it:
/// - "github.com" matches "github.com" and "gist.github.com"
/// - "*.github.com" matches exactly the same set
///
/// Matching happens on label boundaries, so "github.com" never matches
/// "notgithub.com".
///
/// # Arguments
///
/// * `pattern` - The host pattern, optionally starting with "*."
/// * `host` - The lowercase host to check
///
/// # Examples
///
/// ```
/// use card_localizer::url::matches_host_pattern;
///
/// assert!(matches_host_pattern("github.com", "github.com"));
/// assert!(matches_host_pattern("github.com", "raw.github.com"));
/// assert!(matches_host_pattern("*.jsdelivr.net", "cdn.jsdelivr.net"));
/// assert!(!matches_host_pattern("github.com", "notgithub.com"));
/// ```
pub fn matches_host_pattern(pattern: &str, host: &str) -> bool {
    let base = pattern.strip_prefix("*.").unwrap_or(pattern);
    let base = base.trim().to_ascii_lowercase();
    if base.is_empty() {
        return false;
    }

    host == base
        || host
            .strip_suffix(base.as_str())
            .is_some_and(|prefix| prefix.ends_with('.'))
}
