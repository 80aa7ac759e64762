use async_trait::async_trait;
use thiserror::Error;

#[cfg(test)]
use mockall::automock;

use crate::domain::{Transaction, WalletSummary};

#[derive(Debug, Error)]
pub enum WalletDataError {
    #[error("Wallet not found: {0}")]
    NotFound(String),
    #[error("Invalid address: {0}")]
    InvalidAddress(String),
    #[error("Upstream request failed: {0}")]
    Upstream(String),
    #[error("Failed to parse response: {0}")]
    Parse(String),
}

/// Source of wallet summaries and transaction history
#[cfg_attr(test, automock)]
#[async_trait]
pub trait WalletDataPort: Send + Sync {
    async fn get_wallet_info(&self, address: &str) -> Result<WalletSummary, WalletDataError>;

    /// Most recent transactions first
    async fn get_recent_transactions(
        &self,
        address: &str,
        limit: usize,
    ) -> Result<Vec<Transaction>, WalletDataError>;
}
