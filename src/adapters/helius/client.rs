//! Helius REST Client
//!
//! Enhanced transaction history for a wallet address.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;

use super::types::EnhancedTransaction;
use crate::domain::Transaction;

pub const DEFAULT_BASE_URL: &str = "https://api.helius.xyz/v0";

/// Helius caps enhanced history pages at 100 entries
const MAX_PAGE_SIZE: usize = 100;
const MAX_RATE_LIMIT_BACKOFF_SECS: u64 = 60;

/// Wait after failed attempt `attempt` (0-based): 2s, 4s, 8s.. capped after a 429,
/// 500ms, 1s, 1.5s.. otherwise
pub fn retry_delay(attempt: u32, rate_limited: bool) -> Duration {
    if rate_limited {
        let secs = 2u64.saturating_pow(attempt.saturating_add(1));
        Duration::from_secs(secs.min(MAX_RATE_LIMIT_BACKOFF_SECS))
    } else {
        Duration::from_millis(500u64.saturating_mul(u64::from(attempt) + 1))
    }
}

#[derive(Debug, Error)]
pub enum HeliusError {
    #[error("Helius API key is not configured")]
    MissingApiKey,
    #[error("HTTP request failed: {0}")]
    Request(String),
    #[error("Rate limit exceeded")]
    RateLimited,
    #[error("Helius returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Failed to parse Helius response: {0}")]
    Parse(String),
}

#[derive(Debug, Clone)]
pub struct HeliusConfig {
    pub base_url: String,
    pub api_key: String,
    pub timeout: Duration,
    /// Number of attempts per request
    pub max_retries: u32,
}

impl Default for HeliusConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: String::new(),
            timeout: Duration::from_secs(10),
            max_retries: 3,
        }
    }
}

#[derive(Debug, Clone)]
pub struct HeliusClient {
    config: HeliusConfig,
    http: Client,
}

impl HeliusClient {
    pub fn new(config: HeliusConfig) -> Result<Self, HeliusError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| HeliusError::Request(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, http })
    }

    pub fn has_api_key(&self) -> bool {
        !self.config.api_key.is_empty()
    }

    pub fn transactions_url(&self, address: &str) -> String {
        format!(
            "{}/addresses/{}/transactions",
            self.config.base_url.trim_end_matches('/'),
            address
        )
    }

    /// Raw enhanced transactions, newest first
    pub async fn get_enhanced_transactions(
        &self,
        address: &str,
        limit: usize,
    ) -> Result<Vec<EnhancedTransaction>, HeliusError> {
        if !self.has_api_key() {
            return Err(HeliusError::MissingApiKey);
        }

        let limit = limit.clamp(1, MAX_PAGE_SIZE).to_string();
        let req = self
            .http
            .get(self.transactions_url(address))
            .query(&[("api-key", self.config.api_key.as_str()), ("limit", limit.as_str())]);

        let response = self
            .execute_with_retry(|| async {
                req.try_clone()
                    .ok_or_else(|| HeliusError::Request("Failed to clone request".into()))?
                    .send()
                    .await
                    .map_err(|e| HeliusError::Request(e.to_string()))
            })
            .await?;

        self.handle_response(response).await
    }

    /// Wallet history mapped to domain transactions
    pub async fn get_wallet_transactions(
        &self,
        address: &str,
        limit: usize,
    ) -> Result<Vec<Transaction>, HeliusError> {
        let raw = self.get_enhanced_transactions(address, limit).await?;
        tracing::debug!("Helius returned {} transactions for {}", raw.len(), address);
        Ok(raw.iter().map(|tx| tx.to_transaction(address)).collect())
    }

    /// Execute request with retry logic and rate limit handling
    async fn execute_with_retry<F, Fut>(&self, request_fn: F) -> Result<reqwest::Response, HeliusError>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<reqwest::Response, HeliusError>>,
    {
        let mut last_error = None;
        let attempts = self.config.max_retries.max(1);

        for attempt in 0..attempts {
            let rate_limited = match request_fn().await {
                Ok(response) if response.status() == StatusCode::TOO_MANY_REQUESTS => {
                    tracing::warn!(
                        "Helius rate limited (429) (attempt {}/{})",
                        attempt + 1,
                        attempts
                    );
                    last_error = Some(HeliusError::RateLimited);
                    true
                }
                Ok(response) if response.status().is_server_error() => {
                    last_error = Some(HeliusError::Status {
                        status: response.status().as_u16(),
                        body: "server error".into(),
                    });
                    false
                }
                Ok(response) => return Ok(response),
                Err(e) => {
                    last_error = Some(e);
                    false
                }
            };

            // No wait after the final attempt
            if attempt + 1 < attempts {
                let backoff = retry_delay(attempt, rate_limited);
                tracing::debug!("Retrying Helius request in {:?}", backoff);
                tokio::time::sleep(backoff).await;
            }
        }

        Err(last_error.unwrap_or_else(|| HeliusError::Request("Max retries exceeded".into())))
    }

    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T, HeliusError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(HeliusError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let text = response
            .text()
            .await
            .map_err(|e| HeliusError::Request(e.to_string()))?;
        serde_json::from_str(&text).map_err(|e| HeliusError::Parse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transactions_url() {
        let client = HeliusClient::new(HeliusConfig {
            base_url: "https://api.helius.xyz/v0/".to_string(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(
            client.transactions_url("Wallet1"),
            "https://api.helius.xyz/v0/addresses/Wallet1/transactions"
        );
    }

    #[test]
    fn test_retry_delay_is_bounded() {
        assert_eq!(retry_delay(0, true), Duration::from_secs(2));
        assert_eq!(retry_delay(2, true), Duration::from_secs(8));
        assert_eq!(retry_delay(63, true), Duration::from_secs(60));
        assert_eq!(retry_delay(u32::MAX, true), Duration::from_secs(60));

        assert_eq!(retry_delay(0, false), Duration::from_millis(500));
        assert_eq!(retry_delay(2, false), Duration::from_millis(1500));
    }

    /// Answers every connection with a bare HTTP 503
    async fn failing_server() -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let mut buf = [0u8; 4096];
                let _ = socket.read(&mut buf).await;
                let _ = socket
                    .write_all(b"HTTP/1.1 503 Service Unavailable\r\ncontent-length: 0\r\nconnection: close\r\n\r\n")
                    .await;
            }
        });
        url
    }

    #[tokio::test]
    async fn test_final_failure_returns_without_waiting() {
        let client = HeliusClient::new(HeliusConfig {
            base_url: failing_server().await,
            api_key: "key".to_string(),
            max_retries: 1,
            ..Default::default()
        })
        .unwrap();

        let started = std::time::Instant::now();
        let result = client.get_enhanced_transactions("Wallet1", 10).await;
        assert!(matches!(result, Err(HeliusError::Status { status: 503, .. })));
        assert!(started.elapsed() < Duration::from_millis(400));
    }

    #[tokio::test]
    async fn test_missing_api_key() {
        let client = HeliusClient::new(HeliusConfig::default()).unwrap();
        assert!(!client.has_api_key());
        let result = client.get_enhanced_transactions("Wallet1", 10).await;
        assert!(matches!(result, Err(HeliusError::MissingApiKey)));
    }
}
