//! HTTP fetcher implementation
//!
//! This module performs single GET requests and classifies what came back:
//! - Building HTTP clients with the configured user agent and timeout
//! - Capturing status, body and latency for every response, whatever the status
//! - Turning transport failures (DNS, refused connection, timeout) into error strings
//!
//! Retrying and pacing live in the scheduler; a fetcher never retries.

use crate::config::UserAgentConfig;
use async_trait::async_trait;
use reqwest::{redirect::Policy, Client};
use std::time::{Duration, Instant};
use url::Url;

/// Maximum redirect hops the client follows before giving up
const MAX_REDIRECTS: usize = 10;

/// Upper bound on the connect phase, regardless of the request timeout
const MAX_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// What a single GET produced
///
/// Either a status code (with whatever body came with it) or a transport
/// error; a status with an error means the body could not be read.
#[derive(Debug, Clone)]
pub struct RawResponse {
    /// HTTP status code, if a response arrived
    pub status: Option<u16>,

    /// Response body, verbatim
    pub body: Vec<u8>,

    /// Wall time from send to end of body
    pub latency: Duration,

    /// Transport-level failure description
    pub error: Option<String>,
}

impl RawResponse {
    /// A response that arrived with a status code
    pub fn received(status: u16, body: Vec<u8>, latency: Duration) -> Self {
        Self {
            status: Some(status),
            body,
            latency,
            error: None,
        }
    }

    /// A request that failed below HTTP
    pub fn transport_error(error: impl Into<String>, latency: Duration) -> Self {
        Self {
            status: None,
            body: Vec::new(),
            latency,
            error: Some(error.into()),
        }
    }

    /// Success predicate: status in [200, 400) and a non-empty body
    ///
    /// 3xx counts as success: redirects are followed by the client, so a 3xx
    /// seen here carries whatever body the server sent with it.
    pub fn is_success(&self) -> bool {
        self.error.is_none()
            && matches!(self.status, Some(status) if (200..400).contains(&status))
            && !self.body.is_empty()
    }

    /// The error recorded for a rejected response
    ///
    /// The transport error when there is one, otherwise `status_<code>`.
    /// Returns `None` for successful responses.
    pub fn rejection(&self) -> Option<String> {
        if self.is_success() {
            return None;
        }

        Some(match (&self.error, self.status) {
            (Some(error), _) => error.clone(),
            (None, Some(status)) => format!("status_{}", status),
            (None, None) => "no_response".to_string(),
        })
    }
}

/// Performs one GET and reports what happened
///
/// Implementations must not retry and must not fail: every outcome is
/// expressed as a [`RawResponse`].
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn get(&self, url: &Url) -> RawResponse;
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `user_agent` - The user agent configuration
/// * `timeout` - Hard limit for a whole request, body included
///
/// # Example
///
/// ```no_run
/// use scrape_batch::config::UserAgentConfig;
/// use scrape_batch::crawler::build_http_client;
/// use std::time::Duration;
///
/// let client = build_http_client(&UserAgentConfig::default(), Duration::from_secs(15)).unwrap();
/// ```
pub fn build_http_client(
    user_agent: &UserAgentConfig,
    timeout: Duration,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent.header_value())
        .timeout(timeout)
        .connect_timeout(timeout.min(MAX_CONNECT_TIMEOUT))
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

/// reqwest-backed [`PageFetcher`]
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Creates a fetcher with a freshly built client
    pub fn new(user_agent: &UserAgentConfig, timeout: Duration) -> Result<Self, reqwest::Error> {
        Ok(Self::with_client(build_http_client(user_agent, timeout)?))
    }

    /// Wraps an existing client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn get(&self, url: &Url) -> RawResponse {
        let start = Instant::now();

        let response = match self.client.get(url.clone()).send().await {
            Ok(response) => response,
            Err(e) => return RawResponse::transport_error(describe_error(&e), start.elapsed()),
        };

        let status = response.status().as_u16();

        match response.bytes().await {
            Ok(body) => RawResponse::received(status, body.to_vec(), start.elapsed()),
            Err(e) => RawResponse {
                status: Some(status),
                body: Vec::new(),
                latency: start.elapsed(),
                error: Some(describe_error(&e)),
            },
        }
    }
}

/// Classifies a reqwest error into a short, log-friendly description
fn describe_error(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        format!("timeout: {}", error)
    } else if error.is_connect() {
        format!("connection failed: {}", error)
    } else if error.is_redirect() {
        format!("redirect error: {}", error)
    } else {
        error.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_http_client() {
        let client = build_http_client(&UserAgentConfig::default(), Duration::from_secs(5));
        assert!(client.is_ok());
    }

    #[test]
    fn test_success_predicate() {
        let ok = RawResponse::received(200, b"hi".to_vec(), Duration::ZERO);
        assert!(ok.is_success());
        assert_eq!(ok.rejection(), None);

        let moved = RawResponse::received(304, b"cached".to_vec(), Duration::ZERO);
        assert!(moved.is_success());
    }

    #[test]
    fn test_empty_body_is_rejected() {
        let empty = RawResponse::received(200, Vec::new(), Duration::ZERO);
        assert!(!empty.is_success());
        assert_eq!(empty.rejection().as_deref(), Some("status_200"));
    }

    #[test]
    fn test_error_status_is_rejected() {
        for status in [199, 400, 404, 500, 503] {
            let response = RawResponse::received(status, b"body".to_vec(), Duration::ZERO);
            assert!(!response.is_success(), "status {}", status);
            assert_eq!(response.rejection(), Some(format!("status_{}", status)));
        }
    }

    #[test]
    fn test_transport_error_wins_over_status() {
        let failed = RawResponse::transport_error("timeout: operation timed out", Duration::ZERO);
        assert!(!failed.is_success());
        assert_eq!(failed.status, None);
        assert_eq!(
            failed.rejection().as_deref(),
            Some("timeout: operation timed out")
        );

        let truncated = RawResponse {
            status: Some(200),
            body: b"partial".to_vec(),
            latency: Duration::ZERO,
            error: Some("body read failed".to_string()),
        };
        assert!(!truncated.is_success());
        assert_eq!(truncated.rejection().as_deref(), Some("body read failed"));
    }
}
