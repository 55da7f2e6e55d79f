// file: src/segment/fetch.rs
// description: retrieval of raw archive segments with a bounded attempt count
// reference: https://docs.rs/reqwest

use crate::config::SegmentConfig;
use crate::error::{PipelineError, Result};
use reqwest::{Client, StatusCode};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Source of raw segment bytes.
///
/// Implementations make at most `retries` attempts (at least one) and fail
/// with [`PipelineError::Fetch`] once they are exhausted.
pub trait SegmentFetcher {
    fn fetch_segment(&self, url: &str, retries: u32)
    -> impl Future<Output = Result<Vec<u8>>> + Send;
}

#[derive(Debug, Clone)]
pub struct HttpSegmentFetcher {
    client: Client,
    initial_backoff: Duration,
    max_backoff: Duration,
}

impl HttpSegmentFetcher {
    pub fn new(config: &SegmentConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| PipelineError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            initial_backoff: Duration::from_millis(config.initial_backoff_ms),
            max_backoff: Duration::from_millis(config.max_backoff_ms),
        })
    }

    fn should_retry(status: StatusCode) -> bool {
        status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
    }

    fn retry_backoff(&self, attempt: u32) -> Duration {
        let capped = attempt.min(10);
        self.initial_backoff
            .saturating_mul(1 << capped)
            .min(self.max_backoff)
    }

    async fn attempt(&self, url: &str) -> std::result::Result<Vec<u8>, (bool, String)> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| (true, format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err((Self::should_retry(status), format!("HTTP status {}", status)));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| (true, format!("failed to read body: {}", e)))?;
        Ok(body.to_vec())
    }
}

impl SegmentFetcher for HttpSegmentFetcher {
    async fn fetch_segment(&self, url: &str, retries: u32) -> Result<Vec<u8>> {
        let attempts = retries.max(1);
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            debug!("Fetching {} (attempt {}/{})", url, attempt, attempts);

            match self.attempt(url).await {
                Ok(bytes) => {
                    debug!("Fetched {} bytes from {}", bytes.len(), url);
                    return Ok(bytes);
                }
                Err((retryable, message)) => {
                    if !retryable || attempt >= attempts {
                        return Err(PipelineError::Fetch {
                            segment: url.to_string(),
                            message: format!("{} after {} attempt(s)", message, attempt),
                        });
                    }
                    let backoff = self.retry_backoff(attempt - 1);
                    warn!(
                        "Fetching {} failed ({}), retrying in {:?}",
                        url, message, backoff
                    );
                    tokio::time::sleep(backoff).await;
                }
            }
        }
    }
}
