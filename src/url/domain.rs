use std::path::Path;
use url::Url;

/// Host suffix of the web-font stylesheet generator
const STYLESHEET_HOST_SUFFIX: &str = "googleapis.com";

/// Path prefix served by the stylesheet generator (`/css`, `/css2`)
const STYLESHEET_PATH_PREFIX: &str = "/css";

/// Extracts the lowercase host from a URL
///
/// # Examples
///
/// ```
/// use url::Url;
/// use card_localizer::url::extract_domain;
///
/// let url = Url::parse("https://CDN.Example.com:8443/a.png").unwrap();
/// assert_eq!(extract_domain(&url), Some("cdn.example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Returns the lowercased extension of the URL path, including the dot
///
/// Returns None when the last path segment has no extension.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use card_localizer::url::path_extension;
///
/// let url = Url::parse("https://example.com/img/Cat.PNG?size=2").unwrap();
/// assert_eq!(path_extension(&url), Some(".png".to_string()));
/// ```
pub fn path_extension(url: &Url) -> Option<String> {
    Path::new(url.path())
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty())
        .map(|ext| format!(".{}", ext.to_lowercase()))
}

/// Returns true for stylesheet-generation endpoints such as
/// `https://fonts.googleapis.com/css2?family=...`
///
/// These produce CSS without a `.css` extension, so they bypass the
/// extension allow-list and are always stored as `.css`.
pub fn is_stylesheet_endpoint(url: &Url) -> bool {
    let host_matches = extract_domain(url).is_some_and(|host| {
        host == STYLESHEET_HOST_SUFFIX || host.ends_with(&format!(".{}", STYLESHEET_HOST_SUFFIX))
    });

    host_matches && url.path().starts_with(STYLESHEET_PATH_PREFIX)
}
