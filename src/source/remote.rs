use futures::StreamExt;
use reqwest::redirect::Policy;
use std::time::Duration;
use url::Url;

use super::{Fetcher, SourceError, MAX_FEED_SIZE};
use crate::provider::{self, Provider};

const MAX_RETRIES: u32 = 3;
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Redirect policy: at most 3 hops, no loops.
fn redirect_policy() -> Policy {
    Policy::custom(|attempt| {
        if attempt.previous().len() >= 3 {
            return attempt.error("Too many redirects (max 3)");
        }

        let url = attempt.url();
        if attempt.previous().iter().any(|prev| prev.as_str() == url.as_str()) {
            return attempt.error("Redirect loop detected");
        }

        tracing::debug!(
            from = %attempt.previous().last().map(|u| u.as_str()).unwrap_or("initial"),
            to = %url,
            hop = attempt.previous().len() + 1,
            "Following redirect"
        );

        attempt.follow()
    })
}

/// Fetches an appcast over HTTP(S).
///
/// Transient failures (429, 5xx, truncated bodies) are retried up to 3 times
/// with exponential backoff starting at the configured retry delay. Bodies
/// are streamed with a size cap. The timeout bounds each attempt as a whole,
/// so a server that stalls mid-body fails with [`SourceError::Timeout`].
#[derive(Debug, Clone)]
pub struct RemoteUrl {
    url: Url,
    client: reqwest::Client,
    timeout: Duration,
    max_size: usize,
    retry_delay: Duration,
}

impl RemoteUrl {
    /// Parses and validates `url`, building a default HTTP client.
    ///
    /// # Errors
    ///
    /// - [`SourceError::InvalidUrl`] if the string is not a URL
    /// - [`SourceError::UnsupportedScheme`] for anything but http/https
    /// - [`SourceError::Network`] if the HTTP client cannot be built
    pub fn new(url: &str) -> Result<Self, SourceError> {
        let url = Url::parse(url)?;
        match url.scheme() {
            "http" | "https" => {}
            scheme => return Err(SourceError::UnsupportedScheme(scheme.to_owned())),
        }

        let client = reqwest::Client::builder()
            .redirect(redirect_policy())
            .user_agent(concat!("appcast/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            url,
            client,
            timeout: DEFAULT_TIMEOUT,
            max_size: MAX_FEED_SIZE,
            retry_delay: DEFAULT_RETRY_DELAY,
        })
    }

    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_size(mut self, max_size: usize) -> Self {
        self.max_size = max_size;
        self
    }

    /// Base delay for backoff; attempt `n` waits `delay * 2^n`.
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    fn backoff(&self, retry: u32) -> Duration {
        self.retry_delay.saturating_mul(2u32.pow(retry))
    }
}

impl Fetcher for RemoteUrl {
    async fn fetch(&self) -> Result<Vec<u8>, SourceError> {
        let mut retry_count = 0;

        loop {
            // One deadline per attempt, covering headers and body
            let deadline = tokio::time::Instant::now() + self.timeout;
            let response =
                tokio::time::timeout_at(deadline, self.client.get(self.url.clone()).send())
                    .await
                    .map_err(|_| SourceError::Timeout)??;

            let status = response.status();

            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                if retry_count >= MAX_RETRIES {
                    return Err(SourceError::RateLimited(MAX_RETRIES));
                }

                let delay = self.backoff(retry_count);
                tracing::warn!(
                    url = %self.url,
                    retry = retry_count,
                    delay_ms = delay.as_millis() as u64,
                    "Rate limited, backing off"
                );
                tokio::time::sleep(delay).await;
                retry_count += 1;
                continue;
            }

            if status.is_server_error() {
                if retry_count >= MAX_RETRIES {
                    return Err(SourceError::HttpStatus(status.as_u16()));
                }

                let delay = self.backoff(retry_count);
                tracing::warn!(
                    url = %self.url,
                    status = %status,
                    retry = retry_count,
                    delay_ms = delay.as_millis() as u64,
                    "Server error, retrying after delay"
                );
                tokio::time::sleep(delay).await;
                retry_count += 1;
                continue;
            }

            // 4xx fail immediately
            if !status.is_success() {
                return Err(SourceError::HttpStatus(status.as_u16()));
            }

            let body = tokio::time::timeout_at(deadline, read_limited_bytes(response, self.max_size))
                .await
                .map_err(|_| SourceError::Timeout)?;

            match body {
                Ok(bytes) => return Ok(bytes),
                Err(SourceError::IncompleteResponse { expected, received })
                    if retry_count < MAX_RETRIES =>
                {
                    let delay = self.backoff(retry_count);
                    tracing::debug!(
                        url = %self.url,
                        expected,
                        received,
                        attempt = retry_count + 1,
                        delay_ms = delay.as_millis() as u64,
                        "Retrying incomplete download"
                    );
                    tokio::time::sleep(delay).await;
                    retry_count += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn location(&self) -> &str {
        self.url.as_str()
    }

    fn provider_hint(&self) -> Provider {
        provider::detect_by_url(self.url.as_str())
    }
}

async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, SourceError> {
    let expected_length = response.content_length();

    // Fast path: Content-Length already over the limit
    if let Some(len) = expected_length {
        if len > limit as u64 {
            return Err(SourceError::TooLarge(limit));
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(SourceError::TooLarge(limit));
        }
        bytes.extend_from_slice(&chunk);
    }

    if let Some(expected) = expected_length {
        if (bytes.len() as u64) < expected {
            return Err(SourceError::IncompleteResponse {
                expected,
                received: bytes.len(),
            });
        }
    }

    Ok(bytes)
}
