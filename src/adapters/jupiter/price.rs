//! Jupiter Price API client
//!
//! USD prices from `GET /price/v2?ids=a,b`. Used as fallback price source.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::domain::TokenInfo;
use crate::ports::{PriceError, PricePort};

pub const JUPITER_PRICE_API: &str = "https://lite-api.jup.ag/price/v2";

#[derive(Debug, Clone)]
pub struct JupiterPriceClient {
    http: Client,
    base_url: String,
}

impl JupiterPriceClient {
    pub fn new() -> Result<Self, PriceError> {
        Self::with_base_url(JUPITER_PRICE_API, Duration::from_secs(10))
    }

    pub fn with_base_url(base_url: impl Into<String>, timeout: Duration) -> Result<Self, PriceError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PriceError::Api(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }

    /// Prices for a batch of mints; mints without a price are left out
    pub async fn get_prices(&self, mints: &[&str]) -> Result<HashMap<String, f64>, PriceError> {
        if mints.is_empty() {
            return Ok(HashMap::new());
        }

        let ids = mints.join(",");
        let response = self
            .http
            .get(&self.base_url)
            .query(&[("ids", ids.as_str())])
            .send()
            .await
            .map_err(|e| PriceError::Api(e.to_string()))?;

        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            return Err(PriceError::RateLimited("jupiter".into()));
        }
        if !response.status().is_success() {
            return Err(PriceError::Api(format!("Jupiter returned {}", response.status())));
        }

        let body: PriceResponse = response
            .json()
            .await
            .map_err(|e| PriceError::Parse(e.to_string()))?;

        Ok(body.into_prices())
    }

    /// Price for a single token in USD
    pub async fn get_price(&self, mint: &str) -> Result<f64, PriceError> {
        self.get_prices(&[mint])
            .await?
            .remove(mint)
            .ok_or_else(|| PriceError::NotFound(mint.to_string()))
    }

    /// Price of base token in terms of quote token
    pub async fn get_pair_price(&self, base_mint: &str, quote_mint: &str) -> Result<f64, PriceError> {
        let prices = self.get_prices(&[base_mint, quote_mint]).await?;

        let base_price = prices
            .get(base_mint)
            .copied()
            .ok_or_else(|| PriceError::NotFound(base_mint.to_string()))?;
        let quote_price = prices
            .get(quote_mint)
            .copied()
            .filter(|p| *p > 0.0)
            .ok_or_else(|| PriceError::NotFound(quote_mint.to_string()))?;

        Ok(base_price / quote_price)
    }
}

#[async_trait]
impl PricePort for JupiterPriceClient {
    async fn get_price(&self, mint: &str) -> Result<f64, PriceError> {
        JupiterPriceClient::get_price(self, mint).await
    }

    async fn get_token_info(&self, mint: &str) -> Result<TokenInfo, PriceError> {
        let price = JupiterPriceClient::get_price(self, mint).await?;
        Ok(TokenInfo {
            price: Some(price),
            ..TokenInfo::with_address(mint)
        })
    }
}

#[derive(Debug, Deserialize)]
struct PriceResponse {
    #[serde(default)]
    data: HashMap<String, Option<PriceData>>,
}

#[derive(Debug, Deserialize)]
struct PriceData {
    #[serde(default)]
    price: Option<String>,
}

impl PriceResponse {
    fn into_prices(self) -> HashMap<String, f64> {
        self.data
            .into_iter()
            .filter_map(|(mint, data)| {
                let price = data?.price?.parse::<f64>().ok()?;
                Some((mint, price))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        assert!(JupiterPriceClient::new().is_ok());
    }

    #[test]
    fn test_parse_price_response() {
        let raw = r#"{
            "data": {
                "So11111111111111111111111111111111111111112": {
                    "id": "So11111111111111111111111111111111111111112",
                    "type": "derivedPrice",
                    "price": "148.25"
                },
                "NoPrice111": {"id": "NoPrice111", "type": "derivedPrice", "price": null},
                "Missing111": null
            },
            "timeTaken": 0.003
        }"#;
        let prices = serde_json::from_str::<PriceResponse>(raw).unwrap().into_prices();
        assert_eq!(prices.len(), 1);
        assert_eq!(prices["So11111111111111111111111111111111111111112"], 148.25);
    }

    #[tokio::test]
    async fn test_empty_batch_skips_request() {
        let client = JupiterPriceClient::with_base_url("http://127.0.0.1:1", Duration::from_millis(50)).unwrap();
        assert!(client.get_prices(&[]).await.unwrap().is_empty());
    }
}
