//! HTTP fetcher implementation
//!
//! This module handles every download of the localizer, including:
//! - Building the direct and proxied HTTP clients
//! - Routing requests according to the force-proxy list
//! - Reusing resources already present on disk
//! - Persisting downloaded bodies

use crate::config::NetworkConfig;
use crate::url::ProxyRoute;
use crate::DownloadError;
use reqwest::{Client, Proxy, StatusCode};
use std::path::PathBuf;
use std::time::Duration;

/// Upper bound on the time spent establishing a connection
const CONNECT_TIMEOUT_SECS: u64 = 10;

/// A reference scheduled for download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTask {
    /// Absolute URL, exactly as it appears in the scanned text
    pub url: String,

    /// Where the resource is stored
    pub physical_path: PathBuf,

    /// Path the rewritten document will use
    pub public_path: String,

    /// How the request reaches the origin
    pub route: ProxyRoute,
}

/// Result of processing one download task
#[derive(Debug)]
pub enum FetchOutcome {
    /// The resource is stored at the task's physical path
    Fetched {
        /// Resource body
        content: Vec<u8>,
        /// True if the file already existed and no request was made
        from_cache: bool,
    },

    /// The resource could not be localized
    Failed(DownloadError),

    /// The task was dequeued after a stop request and never started
    Skipped,
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `user_agent` - Value of the User-Agent header
/// * `timeout` - Total request timeout
/// * `proxy` - Optional proxy URL every request is sent through
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client (for example, an invalid proxy URL)
///
/// # Example
///
/// ```no_run
/// use card_localizer::localizer::build_http_client;
/// use std::time::Duration;
///
/// let client = build_http_client("Mozilla/5.0", Duration::from_secs(15), None).unwrap();
/// ```
pub fn build_http_client(
    user_agent: &str,
    timeout: Duration,
    proxy: Option<&str>,
) -> Result<Client, reqwest::Error> {
    let mut builder = Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(CONNECT_TIMEOUT_SECS)))
        .gzip(true)
        .brotli(true);

    if let Some(proxy) = proxy {
        builder = builder.proxy(Proxy::all(proxy)?);
    }

    builder.build()
}

/// Downloads resources to their physical paths
#[derive(Debug, Clone)]
pub struct Fetcher {
    direct: Client,
    proxied: Option<Client>,
}

impl Fetcher {
    /// Creates a fetcher from the network configuration
    ///
    /// The proxied client only exists when a proxy is configured.
    pub fn new(network: &NetworkConfig) -> Result<Self, reqwest::Error> {
        let direct = build_http_client(
            &network.user_agent,
            Duration::from_secs(network.request_timeout_secs),
            None,
        )?;

        let proxied = network
            .proxy
            .as_deref()
            .map(|proxy| {
                build_http_client(
                    &network.user_agent,
                    Duration::from_secs(network.proxy_timeout_secs),
                    Some(proxy),
                )
            })
            .transpose()?;

        Ok(Self { direct, proxied })
    }

    /// Localizes one resource
    ///
    /// # Request Flow
    ///
    /// 1. If the physical path already holds a file, return its content
    /// 2. Create the parent directories
    /// 3. GET the URL along the task's route (only 200 is accepted)
    /// 4. Write the body to the physical path
    ///
    /// Failures are returned as `FetchOutcome::Failed` and never propagate.
    pub async fn fetch(&self, task: &DownloadTask) -> FetchOutcome {
        if let Some(content) = read_existing(task).await {
            tracing::debug!("Reusing {} for {}", task.physical_path.display(), task.url);
            return FetchOutcome::Fetched {
                content,
                from_cache: true,
            };
        }

        match self.download(task).await {
            Ok(content) => FetchOutcome::Fetched {
                content,
                from_cache: false,
            },
            Err(e) => FetchOutcome::Failed(e),
        }
    }

    async fn download(&self, task: &DownloadTask) -> Result<Vec<u8>, DownloadError> {
        if let Some(parent) = task.physical_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| DownloadError::WriteFailure {
                    path: parent.display().to_string(),
                    source,
                })?;
        }

        let content = self.get_routed(&task.url, task.route).await?;

        tokio::fs::write(&task.physical_path, &content)
            .await
            .map_err(|source| DownloadError::WriteFailure {
                path: task.physical_path.display().to_string(),
                source,
            })?;

        tracing::debug!(
            "Saved {} ({} bytes) to {}",
            task.url,
            content.len(),
            task.physical_path.display()
        );

        Ok(content)
    }

    /// Sends the request along `route`, retrying once through the proxy
    /// when the route allows it
    async fn get_routed(&self, url: &str, route: ProxyRoute) -> Result<Vec<u8>, DownloadError> {
        let proxied = self.proxied.as_ref();

        if route.starts_with_proxy() {
            if let Some(client) = proxied {
                return get_bytes(client, url).await;
            }
        }

        match get_bytes(&self.direct, url).await {
            Ok(content) => Ok(content),
            Err(e) => match proxied {
                Some(client) if route.has_proxy_fallback() => {
                    tracing::warn!("Direct request for {} failed ({}), retrying via proxy", url, e);
                    get_bytes(client, url).await
                }
                _ => Err(e),
            },
        }
    }
}

/// Returns the content of an already-localized resource
async fn read_existing(task: &DownloadTask) -> Option<Vec<u8>> {
    let metadata = tokio::fs::metadata(&task.physical_path).await.ok()?;
    if !metadata.is_file() {
        return None;
    }

    match tokio::fs::read(&task.physical_path).await {
        Ok(content) => Some(content),
        Err(e) => {
            tracing::warn!(
                "Failed to read existing {}: {}",
                task.physical_path.display(),
                e
            );
            None
        }
    }
}

/// Issues a GET and returns the body of a 200 response
async fn get_bytes(client: &Client, url: &str) -> Result<Vec<u8>, DownloadError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| DownloadError::NetworkFailure {
            url: url.to_string(),
            message: classify_request_error(&e),
        })?;

    let status = response.status();
    if status != StatusCode::OK {
        return Err(DownloadError::NonOkStatus {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let body = response
        .bytes()
        .await
        .map_err(|e| DownloadError::BodyReadFailure {
            url: url.to_string(),
            message: e.to_string(),
        })?;

    Ok(body.to_vec())
}

fn classify_request_error(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        "Request timeout".to_string()
    } else if e.is_connect() {
        format!("Connection failed: {}", e)
    } else {
        e.to_string()
    }
}
