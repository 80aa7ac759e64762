//! Price Oracle
//!
//! Chains a primary price source with a fallback. Birdeye carries full token
//! metadata, Jupiter answers for almost any mint.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::domain::TokenInfo;
use crate::ports::{PriceError, PricePort};

pub struct PriceOracle {
    primary: Arc<dyn PricePort>,
    fallback: Option<Arc<dyn PricePort>>,
}

impl PriceOracle {
    pub fn new(primary: Arc<dyn PricePort>) -> Self {
        Self {
            primary,
            fallback: None,
        }
    }

    pub fn with_fallback(mut self, fallback: Arc<dyn PricePort>) -> Self {
        self.fallback = Some(fallback);
        self
    }
}

#[async_trait]
impl PricePort for PriceOracle {
    async fn get_price(&self, mint: &str) -> Result<f64, PriceError> {
        match self.primary.get_price(mint).await {
            Ok(price) => Ok(price),
            Err(e) => match &self.fallback {
                Some(fallback) => {
                    debug!("Primary price source failed for {}: {}", mint, e);
                    fallback.get_price(mint).await
                }
                None => Err(e),
            },
        }
    }

    async fn get_token_info(&self, mint: &str) -> Result<TokenInfo, PriceError> {
        match self.primary.get_token_info(mint).await {
            Ok(info) => Ok(info),
            Err(e) => match &self.fallback {
                Some(fallback) => {
                    warn!("Token info lookup failed for {}, using fallback: {}", mint, e);
                    fallback.get_token_info(mint).await
                }
                None => Err(e),
            },
        }
    }
}
