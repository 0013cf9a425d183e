//! HTTP fetcher for schedule pages
//!
//! This module retrieves schedule documents from the source site with:
//! - Target validation before any network activity
//! - A browser-like User-Agent and bounded timeout
//! - Charset detection with a windows-1251 fallback
//! - Soft-fail reporting: failures are logged and become "no document"

use encoding_rs::{Encoding, UTF_8, WINDOWS_1251};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, USER_AGENT};
use reqwest::{Client, Response};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use crate::config::{SourceConfig, DEFAULT_USER_AGENT};
use crate::crawler::target::validate_target;
use crate::utils::error::FetchError;

/// Schedule page fetcher
///
/// Issues exactly one GET per call. There is no retry logic; retrying a
/// failed refresh is left to the caller.
#[derive(Debug, Clone)]
pub struct ScheduleFetcher {
    /// HTTP client with configured timeout, User-Agent and compression
    client: Client,

    /// Domain every fetched URL must belong to
    allowed_domain: String,
}

impl ScheduleFetcher {
    /// Create a fetcher from the source configuration
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Http` if the HTTP client cannot be created
    pub fn new(source: &SourceConfig) -> Result<Self, FetchError> {
        Self::with_config(
            &source.allowed_domain,
            &source.user_agent,
            Duration::from_secs(source.request_timeout_secs),
        )
    }

    /// Create a fetcher with explicit settings
    ///
    /// # Arguments
    ///
    /// * `allowed_domain` - Domain every target host must belong to
    /// * `user_agent` - Identification string sent with each request
    /// * `timeout` - Request timeout duration
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Http` if the HTTP client cannot be created
    pub fn with_config(
        allowed_domain: &str,
        user_agent: &str,
        timeout: Duration,
    ) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .gzip(true)
            .default_headers(Self::build_headers(user_agent))
            .build()?;

        Ok(Self {
            client,
            allowed_domain: allowed_domain.to_string(),
        })
    }

    /// Domain this fetcher accepts
    pub fn allowed_domain(&self) -> &str {
        &self.allowed_domain
    }

    /// Fetch a page, reducing every network failure to `None`
    ///
    /// Non-success statuses, timeouts and connection errors are logged at
    /// warn level and reported as "no document".
    ///
    /// # Errors
    ///
    /// Returns `FetchError::InvalidTarget` when the URL is rejected; no
    /// request is sent in that case
    pub async fn fetch_page(&self, url: &str) -> Result<Option<String>, FetchError> {
        let url = validate_target(url, &self.allowed_domain)?;

        match self.send(&url).await {
            Ok(body) => Ok(Some(body)),
            Err(e) => {
                warn!(url = %url, error = %e, "Failed to fetch schedule page");
                Ok(None)
            }
        }
    }

    /// Fetch a page, returning the failure to the caller
    ///
    /// # Errors
    ///
    /// Returns `FetchError::InvalidTarget` for a rejected URL,
    /// `FetchError::Status` for a non-success status, `FetchError::Timeout`
    /// or `FetchError::Http` for network failures and `FetchError::Decode`
    /// when the body cannot be decoded
    pub async fn try_fetch(&self, url: &str) -> Result<String, FetchError> {
        let url = validate_target(url, &self.allowed_domain)?;
        self.send(&url).await
    }

    async fn send(&self, url: &Url) -> Result<String, FetchError> {
        debug!(url = %url, "Fetching");

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    FetchError::Timeout
                } else {
                    FetchError::Http(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        Self::decode_response(response).await
    }

    /// Decode a response body using its declared charset
    async fn decode_response(response: Response) -> Result<String, FetchError> {
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string())
            .unwrap_or_default();

        let bytes = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout
            } else {
                FetchError::Http(e)
            }
        })?;

        Self::decode_bytes(&bytes, &content_type)
    }

    /// Decode bytes to a string with charset detection
    ///
    /// This method tries, in order:
    /// 1. The charset named in the Content-Type header
    /// 2. Strict UTF-8
    /// 3. A `<meta charset>` declaration in the first kilobyte
    /// 4. windows-1251, the legacy Cyrillic encoding
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Decode` if no strategy decodes cleanly
    pub fn decode_bytes(bytes: &[u8], content_type: &str) -> Result<String, FetchError> {
        if let Some(encoding) = charset_label(content_type).and_then(Encoding::for_label) {
            return decode_with(encoding, bytes);
        }

        if let Ok(text) = decode_with(UTF_8, bytes) {
            return Ok(text);
        }

        let head = String::from_utf8_lossy(&bytes[..bytes.len().min(1024)]).to_lowercase();
        if let Some(encoding) = charset_label(&head).and_then(Encoding::for_label) {
            return decode_with(encoding, bytes);
        }

        decode_with(WINDOWS_1251, bytes)
    }

    /// Headers sent with every request
    fn build_headers(user_agent: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();

        let value = HeaderValue::from_str(user_agent)
            .unwrap_or_else(|_| HeaderValue::from_static(DEFAULT_USER_AGENT));
        headers.insert(USER_AGENT, value);

        headers
    }
}

/// Charset label following `charset=` in a header or meta tag
fn charset_label(text: &str) -> Option<&[u8]> {
    let lower = text.to_ascii_lowercase();
    let start = lower.find("charset=")? + "charset=".len();

    let label = text[start..]
        .trim_start_matches(['"', '\''])
        .split(|c: char| c == ';' || c == '"' || c == '\'' || c == '>' || c.is_whitespace())
        .next()?;

    (!label.is_empty()).then_some(label.as_bytes())
}

fn decode_with(encoding: &'static Encoding, bytes: &[u8]) -> Result<String, FetchError> {
    let (text, _, had_errors) = encoding.decode(bytes);

    if had_errors {
        return Err(FetchError::Decode(format!(
            "{} decoding errors",
            encoding.name()
        )));
    }

    Ok(text.into_owned())
}
