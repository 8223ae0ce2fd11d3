//! Content fetching from URLs, files, and stdin.
//!
//! Page retrieval during a harvest goes through the [`PageSource`] trait so the
//! orchestrator never touches a global client. [`Fetcher`] is the HTTP
//! implementation; it retries at two levels:
//!
//! - transport level: connection, timeout, request and body errors and the
//!   statuses listed in [`FetchConfig::retry_statuses`] are re-sent with
//!   exponential backoff, or after the server's `Retry-After` on 429 and 503;
//! - process level: any failed attempt (including non-200 answers and empty
//!   bodies) is repeated a few more times with a linear backoff.
//!
//! When both budgets are spent the caller gets [`GleanerError::FetchFailed`].

use std::fs;
use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

#[cfg(feature = "fetch")]
use reqwest::{Client, Response, StatusCode};
#[cfg(feature = "fetch")]
use tracing::{debug, warn};
#[cfg(feature = "fetch")]
use url::Url;

use crate::{GleanerError, Result};

/// Upper bound for a single transport-level backoff sleep.
const MAX_BACKOFF: Duration = Duration::from_secs(120);

/// Anything that can turn a URL into page markup.
///
/// Implementations return the page body on success and an error when the
/// page could not be retrieved; the harvest loop logs the error and skips the row.
pub trait PageSource {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<String>>;
}

/// HTTP client configuration for fetching web pages.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Per-request socket timeout in seconds.
    pub timeout: u64,
    /// User-Agent header sent with every request.
    pub user_agent: String,
    /// Accept header sent with every request.
    pub accept: String,
    /// Additional process-level attempts after the first one.
    pub retries: u32,
    /// Base delay before a process-level retry.
    pub retry_delay: Duration,
    /// Extra delay added per process-level attempt already made.
    pub retry_step: Duration,
    /// Transport-level retries for connection errors and retryable statuses.
    pub transport_retries: u32,
    /// Backoff factor for transport-level retries (`factor * 2^(n-1)`).
    pub backoff_factor: Duration,
    /// Statuses that trigger a transport-level retry.
    pub retry_statuses: Vec<u16>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: 30,
            user_agent: "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) \
                         Chrome/124.0.0.0 Safari/537.36"
                .to_string(),
            accept: "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8".to_string(),
            retries: 2,
            retry_delay: Duration::from_millis(800),
            retry_step: Duration::from_millis(700),
            transport_retries: 4,
            backoff_factor: Duration::from_millis(600),
            retry_statuses: vec![429, 500, 502, 503, 504],
        }
    }
}

impl FetchConfig {
    /// Delay before process-level attempt `attempt + 1`, where `attempt` counts from zero.
    pub fn retry_backoff(&self, attempt: u32) -> Duration {
        self.retry_delay + self.retry_step * attempt
    }

    /// Delay before the `retry`-th transport-level retry (1-based).
    pub fn transport_backoff(&self, retry: u32) -> Duration {
        let exp = retry.saturating_sub(1).min(16);
        (self.backoff_factor * 2u32.pow(exp)).min(MAX_BACKOFF)
    }

    /// Whether a status code should be re-sent at transport level.
    pub fn is_retryable_status(&self, status: u16) -> bool {
        self.retry_statuses.contains(&status)
    }
}

/// HTTP page fetcher with bounded retries.
///
/// The underlying `reqwest::Client` is built once and reused for every
/// request of a run.
#[cfg(feature = "fetch")]
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    config: FetchConfig,
}

#[cfg(feature = "fetch")]
impl Fetcher {
    /// Builds a fetcher from its configuration.
    pub fn new(config: FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(GleanerError::HttpError)?;

        Ok(Self { client, config })
    }

    /// Fetches a page, retrying at both levels before giving up.
    ///
    /// Invalid URLs fail immediately without any network traffic.
    pub async fn fetch_url(&self, url: &str) -> Result<String> {
        let parsed_url = parse_url(url)?;
        let attempts = self.config.retries + 1;
        let mut last_error = None;

        for attempt in 0..attempts {
            match self.get_once(&parsed_url).await {
                Ok(body) => return Ok(body),
                Err(e) => {
                    debug!(url = %parsed_url, attempt = attempt + 1, error = %e, "fetch attempt failed");
                    last_error = Some(e);
                }
            }

            if attempt + 1 < attempts {
                tokio::time::sleep(self.config.retry_backoff(attempt)).await;
            }
        }

        match last_error {
            Some(e) => warn!(url = %parsed_url, error = %e, "fetch failed"),
            None => warn!(url = %parsed_url, "fetch failed"),
        }

        Err(GleanerError::FetchFailed { url: url.to_string(), attempts })
    }

    /// One process-level attempt: send (with transport retries) and read the body.
    async fn get_once(&self, url: &Url) -> Result<String> {
        let response = self.send_with_retry(url).await?;

        if response.status() != StatusCode::OK {
            return Err(GleanerError::HttpStatus { url: url.to_string(), status: response.status().as_u16() });
        }

        let content = response.text().await?;
        if content.is_empty() {
            return Err(GleanerError::EmptyResponse(url.to_string()));
        }

        Ok(content)
    }

    async fn send_with_retry(&self, url: &Url) -> Result<Response> {
        let mut retry = 0;

        loop {
            let result = self
                .client
                .get(url.clone())
                .header("Accept", &self.config.accept)
                .header("Accept-Language", "en-US,en;q=0.9")
                .send()
                .await;

            let can_retry = retry < self.config.transport_retries;
            let delay = match result {
                Ok(response) if can_retry && self.config.is_retryable_status(response.status().as_u16()) => {
                    debug!(url = %url, status = response.status().as_u16(), "retryable status");
                    retry_after(&response)
                }
                Ok(response) => return Ok(response),
                Err(e) if can_retry && is_transport_error(&e) => {
                    debug!(url = %url, error = %e, "transport error, retrying");
                    None
                }
                Err(e) if e.is_timeout() => return Err(GleanerError::Timeout { timeout: self.config.timeout }),
                Err(e) => return Err(GleanerError::HttpError(e)),
            };

            retry += 1;
            tokio::time::sleep(delay.unwrap_or_else(|| self.config.transport_backoff(retry))).await;
        }
    }
}

#[cfg(feature = "fetch")]
impl PageSource for Fetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        self.fetch_url(url).await
    }
}

/// Connection, timeout, request and body errors are worth another try.
#[cfg(feature = "fetch")]
fn is_transport_error(e: &reqwest::Error) -> bool {
    e.is_connect() || e.is_timeout() || e.is_request() || e.is_body()
}

/// Server-requested delay for 429 and 503 answers, capped like any other backoff.
#[cfg(feature = "fetch")]
fn retry_after(response: &Response) -> Option<Duration> {
    if !matches!(response.status(), StatusCode::TOO_MANY_REQUESTS | StatusCode::SERVICE_UNAVAILABLE) {
        return None;
    }

    response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(parse_retry_after)
}

/// Parses a `Retry-After` value given in whole seconds. HTTP dates are not supported.
#[cfg(feature = "fetch")]
fn parse_retry_after(value: &str) -> Option<Duration> {
    value
        .trim()
        .parse::<u64>()
        .ok()
        .map(|secs| Duration::from_secs(secs).min(MAX_BACKOFF))
}

#[cfg(feature = "fetch")]
fn parse_url(url: &str) -> Result<Url> {
    let parsed = Url::parse(url.trim()).map_err(|e| GleanerError::InvalidUrl(format!("{}: {}", url, e)))?;

    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(GleanerError::InvalidUrl(format!("unsupported scheme '{}' in {}", other, url))),
    }
}

/// Reads HTML content from a local file.
pub fn fetch_file(path: &str) -> Result<String> {
    let path_buf = PathBuf::from(path);

    if !path_buf.exists() {
        Err(GleanerError::FileNotFound(path_buf))
    } else {
        fs::read_to_string(&path_buf).map_err(GleanerError::from)
    }
}

/// Reads HTML content from standard input until EOF.
pub fn fetch_stdin() -> Result<String> {
    use std::io::{self, Read};

    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer).map_err(GleanerError::from)?;

    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    #[cfg(feature = "fetch")]
    use std::sync::Arc;
    #[cfg(feature = "fetch")]
    use std::sync::atomic::{AtomicUsize, Ordering};
    #[cfg(feature = "fetch")]
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    #[cfg(feature = "fetch")]
    use tokio::net::TcpListener;

    #[test]
    fn test_fetch_config_default() {
        let config = FetchConfig::default();
        assert_eq!(config.timeout, 30);
        assert_eq!(config.retries, 2);
        assert_eq!(config.transport_retries, 4);
        assert!(config.user_agent.contains("Mozilla/5.0"));
        assert!(config.accept.starts_with("text/html"));
    }

    #[test]
    fn test_retry_backoff_is_linear() {
        let config = FetchConfig::default();
        assert_eq!(config.retry_backoff(0), Duration::from_millis(800));
        assert_eq!(config.retry_backoff(1), Duration::from_millis(1500));
        assert_eq!(config.retry_backoff(2), Duration::from_millis(2200));
    }

    #[test]
    fn test_transport_backoff_is_exponential_and_capped() {
        let config = FetchConfig::default();
        assert_eq!(config.transport_backoff(1), Duration::from_millis(600));
        assert_eq!(config.transport_backoff(2), Duration::from_millis(1200));
        assert_eq!(config.transport_backoff(3), Duration::from_millis(2400));
        assert_eq!(config.transport_backoff(40), MAX_BACKOFF);
    }

    #[test]
    fn test_retryable_statuses() {
        let config = FetchConfig::default();
        for status in [429, 500, 502, 503, 504] {
            assert!(config.is_retryable_status(status));
        }
        assert!(!config.is_retryable_status(404));
        assert!(!config.is_retryable_status(200));
    }

    #[cfg(feature = "fetch")]
    #[tokio::test]
    async fn test_fetch_url_invalid() {
        let fetcher = Fetcher::new(FetchConfig::default()).unwrap();
        let result = fetcher.fetch_url("not-a-url").await;

        assert!(matches!(result, Err(GleanerError::InvalidUrl(_))));
    }

    #[cfg(feature = "fetch")]
    #[tokio::test]
    async fn test_fetch_url_rejects_non_http_scheme() {
        let fetcher = Fetcher::new(FetchConfig::default()).unwrap();
        let result = fetcher.fetch_url("ftp://example.com/file").await;

        assert!(matches!(result, Err(GleanerError::InvalidUrl(_))));
    }

    #[cfg(feature = "fetch")]
    #[test]
    fn test_parse_retry_after() {
        assert_eq!(parse_retry_after("3"), Some(Duration::from_secs(3)));
        assert_eq!(parse_retry_after(" 0 "), Some(Duration::ZERO));
        assert_eq!(parse_retry_after("9999"), Some(MAX_BACKOFF));
        assert_eq!(parse_retry_after("Wed, 21 Oct 2015 07:28:00 GMT"), None);
    }

    /// Serves one canned response per connection, in order, repeating the last
    /// one once the list runs out. Returns the base url and a request counter.
    #[cfg(feature = "fetch")]
    async fn serve(responses: Vec<&'static str>) -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);

        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    break;
                };
                let n = counter.fetch_add(1, Ordering::SeqCst);
                let response = responses[n.min(responses.len() - 1)];

                let mut buf = [0u8; 4096];
                let _ = socket.read(&mut buf).await;
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });

        (format!("http://{}", addr), hits)
    }

    #[cfg(feature = "fetch")]
    fn quick_config() -> FetchConfig {
        FetchConfig {
            timeout: 5,
            retry_delay: Duration::from_millis(1),
            retry_step: Duration::from_millis(1),
            backoff_factor: Duration::from_millis(1),
            ..Default::default()
        }
    }

    #[cfg(feature = "fetch")]
    const UNAVAILABLE: &str = "HTTP/1.1 503 Service Unavailable\r\nContent-Length: 0\r\nConnection: close\r\n\r\n";
    #[cfg(feature = "fetch")]
    const UNAVAILABLE_RETRY_NOW: &str =
        "HTTP/1.1 503 Service Unavailable\r\nRetry-After: 0\r\nContent-Length: 0\r\nConnection: close\r\n\r\n";
    #[cfg(feature = "fetch")]
    const NOT_FOUND: &str = "HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n";
    #[cfg(feature = "fetch")]
    const OK_HELLO: &str = "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: 5\r\nConnection: close\r\n\r\nhello";
    #[cfg(feature = "fetch")]
    const OK_EMPTY: &str = "HTTP/1.1 200 OK\r\nContent-Length: 0\r\nConnection: close\r\n\r\n";

    #[cfg(feature = "fetch")]
    #[tokio::test]
    async fn test_fetch_url_spends_both_retry_budgets() {
        let (base, hits) = serve(vec![UNAVAILABLE]).await;
        let fetcher = Fetcher::new(quick_config()).unwrap();

        let result = fetcher.fetch_url(&format!("{}/x", base)).await;

        assert!(matches!(result, Err(GleanerError::FetchFailed { attempts: 3, .. })));
        assert_eq!(hits.load(Ordering::SeqCst), 15);
    }

    #[cfg(feature = "fetch")]
    #[tokio::test]
    async fn test_fetch_url_recovers_after_retryable_status() {
        let (base, hits) = serve(vec![UNAVAILABLE, OK_HELLO]).await;
        let fetcher = Fetcher::new(quick_config()).unwrap();

        let body = fetcher.fetch_url(&format!("{}/x", base)).await.unwrap();

        assert_eq!(body, "hello");
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[cfg(feature = "fetch")]
    #[tokio::test]
    async fn test_fetch_url_non_retryable_status_uses_process_retries_only() {
        let (base, hits) = serve(vec![NOT_FOUND]).await;
        let fetcher = Fetcher::new(quick_config()).unwrap();

        let result = fetcher.fetch_url(&format!("{}/missing", base)).await;

        assert!(matches!(result, Err(GleanerError::FetchFailed { attempts: 3, .. })));
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[cfg(feature = "fetch")]
    #[tokio::test]
    async fn test_fetch_url_retries_empty_body() {
        let (base, hits) = serve(vec![OK_EMPTY, OK_HELLO]).await;
        let fetcher = Fetcher::new(quick_config()).unwrap();

        let body = fetcher.fetch_url(&format!("{}/x", base)).await.unwrap();

        assert_eq!(body, "hello");
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[cfg(feature = "fetch")]
    #[tokio::test]
    async fn test_fetch_url_honours_retry_after() {
        let (base, hits) = serve(vec![UNAVAILABLE_RETRY_NOW, OK_HELLO]).await;
        let config = FetchConfig { backoff_factor: Duration::from_secs(60), ..quick_config() };
        let fetcher = Fetcher::new(config).unwrap();

        let body = tokio::time::timeout(Duration::from_secs(10), fetcher.fetch_url(&format!("{}/x", base)))
            .await
            .expect("Retry-After: 0 should replace the 60s backoff")
            .unwrap();

        assert_eq!(body, "hello");
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_fetch_file_not_found() {
        let result = fetch_file("/nonexistent/path/file.html");
        assert!(matches!(result, Err(GleanerError::FileNotFound(_))));
    }

    #[test]
    fn test_fetch_file_reads_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.html");
        std::fs::write(&path, "<p>hi</p>").unwrap();

        let content = fetch_file(path.to_str().unwrap()).unwrap();
        assert_eq!(content, "<p>hi</p>");
    }
}
