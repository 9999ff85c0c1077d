use crate::PreviewError;
use reqwest::{header, Client, Response};
use std::time::Duration;
use tracing::{debug, error, instrument};

/// Images are only read far enough to find their dimensions.
const IMAGE_PROBE_LIMIT: usize = 256 * 1024;
/// Metadata lives in the head; anything past this is never parsed.
const HTML_BODY_LIMIT: usize = 2 * 1024 * 1024;

#[derive(Clone)]
pub struct Fetcher {
    client: Client,
}

#[derive(Debug, Clone)]
pub enum FetchResult {
    Html(String),
    /// The link points straight at an image; holds its leading bytes.
    Image(Vec<u8>),
}

impl Default for Fetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Fetcher {
    pub fn new() -> Self {
        debug!("Fetcher initialized with default configuration");
        Self::new_with_config(FetcherConfig::default()).unwrap_or_else(|e| {
            e.log();
            Self::with_client(Client::new())
        })
    }

    pub fn new_with_config(config: FetcherConfig) -> Result<Self, PreviewError> {
        let mut client_builder = Client::builder()
            .user_agent(config.user_agent)
            .timeout(config.timeout)
            .pool_max_idle_per_host(10);

        if let Some(redirect_policy) = config.redirect_policy {
            client_builder = client_builder.redirect(redirect_policy);
        }

        let client = client_builder.build().map_err(|e| {
            error!(error = %e, "Failed to create HTTP client");
            PreviewError::FetchError(e.to_string())
        })?;
        Ok(Self { client })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Fetches `url`; a `user_agent` overrides the client's default for
    /// this request only.
    #[instrument(level = "debug", skip(self), err)]
    pub async fn fetch(
        &self,
        url: &str,
        user_agent: Option<&str>,
    ) -> Result<FetchResult, PreviewError> {
        let response = self.send(url, user_agent).await?;

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        if content_type.starts_with("image/") {
            debug!(url = %url, content_type = %content_type, "Link points at an image");
            return read_prefix(response, IMAGE_PROBE_LIMIT)
                .await
                .map(FetchResult::Image);
        }

        let bytes = read_prefix(response, HTML_BODY_LIMIT).await.map_err(|e| {
            error!(error = %e, url = %url, "Failed to read response body");
            e
        })?;
        // A cut multi-byte character at the limit decodes as U+FFFD.
        let content = String::from_utf8_lossy(&bytes).into_owned();

        debug!(url = %url, content_length = content.len(), "Successfully fetched webpage");
        Ok(FetchResult::Html(content))
    }

    /// Reads the leading bytes of an image, enough to learn its size.
    #[instrument(level = "debug", skip(self), err)]
    pub async fn fetch_image_head(
        &self,
        url: &str,
        user_agent: Option<&str>,
    ) -> Result<Vec<u8>, PreviewError> {
        let response = self.send(url, user_agent).await?;
        read_prefix(response, IMAGE_PROBE_LIMIT).await
    }

    async fn send(&self, url: &str, user_agent: Option<&str>) -> Result<Response, PreviewError> {
        let mut request = self.client.get(url);
        if let Some(user_agent) = user_agent {
            request = request.header(header::USER_AGENT, user_agent);
        }

        let response = request.send().await.map_err(|e| {
            error!(error = %e, url = %url, "Failed to send request");
            PreviewError::FetchError(e.to_string())
        })?;

        if !response.status().is_success() {
            return Err(PreviewError::FetchError(format!(
                "{url} returned status {}",
                response.status()
            )));
        }
        Ok(response)
    }
}

async fn read_prefix(mut response: Response, limit: usize) -> Result<Vec<u8>, PreviewError> {
    let mut bytes = Vec::new();
    while bytes.len() < limit {
        match response.chunk().await {
            Ok(Some(chunk)) => bytes.extend_from_slice(&chunk),
            Ok(None) => break,
            Err(e) => return Err(PreviewError::FetchError(e.to_string())),
        }
    }
    bytes.truncate(limit);
    Ok(bytes)
}

/// HTTP client settings for the preview fetch service.
///
/// # Examples
/// ```ignore
/// let fetcher = Fetcher::new_with_config(FetcherConfig {
///     user_agent: "my-chat/1.0".to_string(),
///     timeout: Duration::from_secs(5),
///     redirect_policy: None,
/// })?;
/// ```
pub struct FetcherConfig {
    pub user_agent: String,
    pub timeout: Duration,
    pub redirect_policy: Option<reqwest::redirect::Policy>,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            user_agent: concat!("link-previewer/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout: Duration::from_secs(10),
            redirect_policy: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    const PAGE_HEAD: &[u8] = b"<html><head><title>Big</title></head>";

    fn local_fetcher() -> Fetcher {
        Fetcher::with_client(Client::builder().no_proxy().build().unwrap())
    }

    /// Serves a single HTML response with `body_len` bytes of body.
    async fn serve_html(body_len: usize) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 1024];
            let _ = socket.read(&mut request).await;
            let head = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: {body_len}\r\nConnection: close\r\n\r\n"
            );
            let _ = socket.write_all(head.as_bytes()).await;
            let _ = socket.write_all(PAGE_HEAD).await;
            let filler = vec![b'a'; body_len - PAGE_HEAD.len()];
            // The client hangs up once it has read enough.
            let _ = socket.write_all(&filler).await;
        });
        format!("http://{addr}/")
    }

    #[tokio::test]
    async fn html_body_is_read_up_to_the_limit() {
        let url = serve_html(HTML_BODY_LIMIT + 512 * 1024).await;
        let fetcher = local_fetcher();

        match fetcher.fetch(&url, None).await.unwrap() {
            FetchResult::Html(content) => {
                assert_eq!(content.len(), HTML_BODY_LIMIT);
                assert!(content.starts_with("<html><head><title>Big</title>"));
            }
            other => panic!("expected html, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn small_html_body_is_read_whole() {
        let url = serve_html(64).await;
        let fetcher = local_fetcher();

        match fetcher.fetch(&url, Some("agent/1.0")).await.unwrap() {
            FetchResult::Html(content) => assert_eq!(content.len(), 64),
            other => panic!("expected html, got {other:?}"),
        }
    }
}
