use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, ClientBuilder};
use std::time::Duration;
use url::Url;

/// Retry schedule for transient transport failures: a bounded number of
/// attempts with exponential backoff, retried only for a fixed set of
/// server statuses and for connect/timeout errors.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first.
    pub max_attempts: u32,
    /// Base delay; doubled after each failed attempt.
    pub backoff: Duration,
    /// HTTP statuses worth retrying.
    pub retry_statuses: &'static [u16],
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_millis(300),
            retry_statuses: &[500, 502, 504],
        }
    }
}

impl RetryPolicy {
    /// Backoff before the next attempt; `attempt` is 1-based.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.backoff * 2u32.saturating_pow(attempt.saturating_sub(1).min(16))
    }

    pub fn retries_status(&self, status: u16) -> bool {
        self.retry_statuses.contains(&status)
    }
}

/// GET-with-timeout capability consumed by discovery and the downloader.
/// Kept behind a trait so batch behavior can be exercised against canned
/// responses in tests.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get_text(&self, url: &Url) -> Result<String>;
    async fn get_bytes(&self, url: &Url) -> Result<Vec<u8>>;
}

/// The production transport: one reqwest client, explicitly constructed
/// and passed by reference wherever a fetch is needed.
pub struct HttpClient {
    client: Client,
    retry: RetryPolicy,
}

impl HttpClient {
    pub fn new(user_agent: &str, timeout: Duration, retry: RetryPolicy) -> Result<Self> {
        let client = ClientBuilder::new()
            .use_rustls_tls()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self { client, retry })
    }

    async fn get_checked(&self, url: &Url) -> Result<reqwest::Response> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.client.get(url.clone()).send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return Ok(response);
                    }
                    if attempt < self.retry.max_attempts && self.retry.retries_status(status.as_u16()) {
                        tokio::time::sleep(self.retry.delay_for(attempt)).await;
                        continue;
                    }
                    return Err(anyhow!("HTTP {} for {}", status, url));
                }
                Err(e) if attempt < self.retry.max_attempts && (e.is_timeout() || e.is_connect()) => {
                    tokio::time::sleep(self.retry.delay_for(attempt)).await;
                }
                Err(e) => {
                    return Err(e).with_context(|| format!("request failed for {}", url));
                }
            }
        }
    }
}

#[async_trait]
impl Transport for HttpClient {
    async fn get_text(&self, url: &Url) -> Result<String> {
        let response = self.get_checked(url).await?;
        response
            .text()
            .await
            .with_context(|| format!("failed to read body of {}", url))
    }

    async fn get_bytes(&self, url: &Url) -> Result<Vec<u8>> {
        let response = self.get_checked(url).await?;
        let body = response
            .bytes()
            .await
            .with_context(|| format!("failed to read body of {}", url))?;
        Ok(body.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_grows_per_attempt() {
        let policy = RetryPolicy::default();
        let first = policy.delay_for(1);
        let second = policy.delay_for(2);
        let third = policy.delay_for(3);
        assert_eq!(first, Duration::from_millis(300));
        assert!(second > first);
        assert!(third > second);
    }

    #[test]
    fn test_retryable_statuses() {
        let policy = RetryPolicy::default();
        assert!(policy.retries_status(500));
        assert!(policy.retries_status(502));
        assert!(policy.retries_status(504));
        assert!(!policy.retries_status(404));
        assert!(!policy.retries_status(403));
    }
}
