//! Birdeye API Client
//!
//! Token overview and spot price lookups. Primary price source.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

use super::types::{BirdeyeResponse, PriceData, TokenOverview};
use crate::domain::TokenInfo;
use crate::ports::{PriceError, PricePort};

pub const DEFAULT_BASE_URL: &str = "https://public-api.birdeye.so";

#[derive(Debug, Error)]
pub enum BirdeyeError {
    #[error("Birdeye API key is not configured")]
    MissingApiKey,
    #[error("HTTP request failed: {0}")]
    Request(String),
    #[error("Rate limit exceeded")]
    RateLimited,
    #[error("Birdeye returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Birdeye request unsuccessful: {0}")]
    Unsuccessful(String),
    #[error("Failed to parse Birdeye response: {0}")]
    Parse(String),
}

impl From<BirdeyeError> for PriceError {
    fn from(e: BirdeyeError) -> Self {
        match e {
            BirdeyeError::RateLimited => PriceError::RateLimited("birdeye".into()),
            BirdeyeError::Parse(msg) => PriceError::Parse(msg),
            other => PriceError::Api(other.to_string()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BirdeyeConfig {
    pub base_url: String,
    pub api_key: String,
    pub timeout: Duration,
}

impl Default for BirdeyeConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: String::new(),
            timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BirdeyeClient {
    config: BirdeyeConfig,
    http: Client,
}

impl BirdeyeClient {
    pub fn new(config: BirdeyeConfig) -> Result<Self, BirdeyeError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| BirdeyeError::Request(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { config, http })
    }

    pub fn has_api_key(&self) -> bool {
        !self.config.api_key.is_empty()
    }

    pub async fn token_overview(&self, mint: &str) -> Result<TokenInfo, BirdeyeError> {
        let overview: TokenOverview = self.get("/defi/token_overview", mint).await?;
        Ok(overview.into())
    }

    pub async fn price(&self, mint: &str) -> Result<f64, BirdeyeError> {
        let data: PriceData = self.get("/defi/price", mint).await?;
        Ok(data.value)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, address: &str) -> Result<T, BirdeyeError> {
        if !self.has_api_key() {
            return Err(BirdeyeError::MissingApiKey);
        }

        let url = format!("{}{}", self.config.base_url.trim_end_matches('/'), path);
        debug!("Birdeye GET {} address={}", url, address);

        let response = self
            .http
            .get(&url)
            .query(&[("address", address)])
            .header("X-API-KEY", &self.config.api_key)
            .header("x-chain", "solana")
            .header("accept", "application/json")
            .send()
            .await
            .map_err(|e| BirdeyeError::Request(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(BirdeyeError::RateLimited);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BirdeyeError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let text = response
            .text()
            .await
            .map_err(|e| BirdeyeError::Request(e.to_string()))?;
        unwrap_envelope(&text)
    }
}

fn unwrap_envelope<T: DeserializeOwned>(text: &str) -> Result<T, BirdeyeError> {
    let envelope: BirdeyeResponse<T> =
        serde_json::from_str(text).map_err(|e| BirdeyeError::Parse(e.to_string()))?;

    if !envelope.success {
        return Err(BirdeyeError::Unsuccessful(
            envelope.message.unwrap_or_else(|| "success=false".to_string()),
        ));
    }
    envelope
        .data
        .ok_or_else(|| BirdeyeError::Unsuccessful("response has no data".to_string()))
}

#[async_trait]
impl PricePort for BirdeyeClient {
    async fn get_price(&self, mint: &str) -> Result<f64, PriceError> {
        Ok(self.price(mint).await?)
    }

    async fn get_token_info(&self, mint: &str) -> Result<TokenInfo, PriceError> {
        Ok(self.token_overview(mint).await?)
    }
}
