use async_trait::async_trait;
use thiserror::Error;

#[cfg(test)]
use mockall::automock;

use crate::domain::TokenInfo;

#[derive(Debug, Error)]
pub enum PriceError {
    #[error("No price available for {0}")]
    NotFound(String),
    #[error("Rate limited by {0}")]
    RateLimited(String),
    #[error("Price API error: {0}")]
    Api(String),
    #[error("Failed to parse price response: {0}")]
    Parse(String),
}

/// USD price and token metadata lookups
#[cfg_attr(test, automock)]
#[async_trait]
pub trait PricePort: Send + Sync {
    async fn get_price(&self, mint: &str) -> Result<f64, PriceError>;

    async fn get_token_info(&self, mint: &str) -> Result<TokenInfo, PriceError>;
}
