//! Wallet data service backed by Solana RPC, with optional Helius history.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::stream::{self, StreamExt};
use thiserror::Error;
use tracing::{debug, warn};

use super::rpc::{SolanaClient, SolanaClientError, TransactionSummary, SYSTEM_PROGRAM_ID, TOKEN_PROGRAM_ID};
use crate::adapters::helius::{HeliusClient, HeliusError};
use crate::domain::{
    risk_score, validate_wallet_address, AddressError, TokenInfo, Transaction, TransactionStatus,
    TransactionType, WalletSummary, LAMPORTS_PER_SOL,
};
use crate::ports::{WalletDataError, WalletDataPort};

/// Signatures sampled for wallet summaries
const SUMMARY_SIGNATURE_LIMIT: usize = 100;
/// Parallel `getTransaction` calls
const FETCH_CONCURRENCY: usize = 8;
pub const DEFAULT_TRANSACTION_LIMIT: usize = 20;

#[derive(Debug, Error)]
pub enum WalletServiceError {
    #[error("Wallet {0} not found")]
    WalletNotFound(String),
    #[error(transparent)]
    InvalidAddress(#[from] AddressError),
    #[error(transparent)]
    Rpc(#[from] SolanaClientError),
    #[error(transparent)]
    Helius(#[from] HeliusError),
}

impl From<WalletServiceError> for WalletDataError {
    fn from(e: WalletServiceError) -> Self {
        match e {
            WalletServiceError::WalletNotFound(address) => WalletDataError::NotFound(address),
            WalletServiceError::InvalidAddress(e) => WalletDataError::InvalidAddress(e.to_string()),
            other => WalletDataError::Upstream(other.to_string()),
        }
    }
}

/// Transaction type from the invoked program
pub fn classify_program(program_id: Option<&str>) -> TransactionType {
    match program_id {
        Some(SYSTEM_PROGRAM_ID) => TransactionType::Transfer,
        Some(TOKEN_PROGRAM_ID) => TransactionType::Swap,
        _ => TransactionType::Unknown,
    }
}

/// Domain transaction from an RPC summary; `None` without a block time
pub fn summary_to_transaction(summary: &TransactionSummary, wallet: &str) -> Option<Transaction> {
    let block_time = summary.block_time?;

    // SOL change is only attributable when the wallet paid for the transaction
    let amount = match (
        summary.fee_payer.as_deref(),
        summary.pre_balances.first(),
        summary.post_balances.first(),
    ) {
        (Some(payer), Some(pre), Some(post)) if payer == wallet => {
            (*post as f64 - *pre as f64) / LAMPORTS_PER_SOL
        }
        _ => 0.0,
    };

    Some(Transaction {
        signature: summary.signature.clone(),
        timestamp: block_time * 1000,
        tx_type: classify_program(summary.program_id.as_deref()),
        amount,
        token: TokenInfo::sol(),
        from: wallet.to_string(),
        to: String::new(),
        fee: summary.fee as f64 / LAMPORTS_PER_SOL,
        status: if summary.failed {
            TransactionStatus::Failed
        } else {
            TransactionStatus::Confirmed
        },
        price: None,
    })
}

#[derive(Clone)]
pub struct SolanaWalletService {
    rpc: SolanaClient,
    history: Option<HeliusClient>,
}

impl SolanaWalletService {
    pub fn new(rpc: SolanaClient) -> Self {
        Self { rpc, history: None }
    }

    /// Prefer Helius enhanced history for transaction listings
    pub fn with_history(mut self, helius: HeliusClient) -> Self {
        if helius.has_api_key() {
            self.history = Some(helius);
        }
        self
    }

    async fn summaries(&self, signatures: Vec<String>) -> Vec<TransactionSummary> {
        let rpc = &self.rpc;
        stream::iter(signatures)
            .map(|sig| async move {
                match rpc.get_transaction_summary(&sig).await {
                    Ok(summary) => summary,
                    Err(e) => {
                        warn!("Failed to fetch transaction {}: {}", sig, e);
                        None
                    }
                }
            })
            .buffered(FETCH_CONCURRENCY)
            .filter_map(|summary| async move { summary })
            .collect()
            .await
    }

    pub async fn wallet_info(&self, address: &str) -> Result<WalletSummary, WalletServiceError> {
        let address = validate_wallet_address(address)?;

        if !self.rpc.account_exists(&address).await? {
            return Err(WalletServiceError::WalletNotFound(address));
        }

        let signatures = self.rpc.get_signatures(&address, SUMMARY_SIGNATURE_LIMIT).await?;
        let last_activity = signatures
            .first()
            .and_then(|s| s.block_time)
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .unwrap_or_else(Utc::now);

        let summaries = self
            .summaries(signatures.iter().map(|s| s.signature.clone()).collect())
            .await;
        let total_volume: f64 = summaries
            .iter()
            .map(|s| s.fee_payer_delta() as f64 / LAMPORTS_PER_SOL)
            .sum();
        let average_transaction_value = if signatures.is_empty() {
            0.0
        } else {
            total_volume / signatures.len() as f64
        };

        let sol_balance = self.rpc.get_balance(&address).await? as f64 / LAMPORTS_PER_SOL;
        let token_balances = self.rpc.get_token_balances(&address).await.unwrap_or_else(|e| {
            warn!("Failed to load token balances for {}: {}", address, e);
            Vec::new()
        });

        debug!(
            "Wallet {}: {} signatures, {:.4} SOL volume",
            address,
            signatures.len(),
            total_volume
        );

        Ok(WalletSummary {
            address,
            label: None,
            is_whitelisted: false,
            last_activity,
            total_transactions: signatures.len(),
            total_volume,
            average_transaction_value,
            risk_score: risk_score(signatures.len()),
            sol_balance,
            token_balances,
            tags: Vec::new(),
        })
    }

    pub async fn recent_transactions(
        &self,
        address: &str,
        limit: usize,
    ) -> Result<Vec<Transaction>, WalletServiceError> {
        let address = validate_wallet_address(address)?;
        let limit = if limit == 0 { DEFAULT_TRANSACTION_LIMIT } else { limit };

        if let Some(helius) = &self.history {
            match helius.get_wallet_transactions(&address, limit).await {
                Ok(txs) => return Ok(txs),
                Err(e) => warn!("Helius history failed for {}, falling back to RPC: {}", address, e),
            }
        }

        let signatures = self.rpc.get_signatures(&address, limit).await?;
        let summaries = self
            .summaries(signatures.into_iter().map(|s| s.signature).collect())
            .await;

        Ok(summaries
            .iter()
            .filter_map(|s| summary_to_transaction(s, &address))
            .collect())
    }
}

#[async_trait]
impl WalletDataPort for SolanaWalletService {
    async fn get_wallet_info(&self, address: &str) -> Result<WalletSummary, WalletDataError> {
        Ok(self.wallet_info(address).await?)
    }

    async fn get_recent_transactions(
        &self,
        address: &str,
        limit: usize,
    ) -> Result<Vec<Transaction>, WalletDataError> {
        Ok(self.recent_transactions(address, limit).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WALLET: &str = "86xCnPeV69n6t3DnyGvkKobf9FdN2H9oiVDdaMpo2MMY";

    fn summary(program: Option<&str>, payer: &str, block_time: Option<i64>) -> TransactionSummary {
        TransactionSummary {
            signature: "sig".to_string(),
            slot: 1,
            block_time,
            fee: 5000,
            failed: false,
            pre_balances: vec![2_000_000_000, 0],
            post_balances: vec![1_500_000_000, 500_000_000],
            program_id: program.map(str::to_string),
            fee_payer: Some(payer.to_string()),
        }
    }

    #[test]
    fn test_classify_program() {
        assert_eq!(classify_program(Some(SYSTEM_PROGRAM_ID)), TransactionType::Transfer);
        assert_eq!(classify_program(Some(TOKEN_PROGRAM_ID)), TransactionType::Swap);
        assert_eq!(
            classify_program(Some("JUP6LkbZbjS1jKKwapdHNy74zcZ3tLUZoi5QNyVTaV4")),
            TransactionType::Unknown
        );
        assert_eq!(classify_program(None), TransactionType::Unknown);
    }

    #[test]
    fn test_summary_to_transaction_for_fee_payer() {
        let tx = summary_to_transaction(&summary(Some(SYSTEM_PROGRAM_ID), WALLET, Some(1_700_000_000)), WALLET)
            .unwrap();
        assert_eq!(tx.tx_type, TransactionType::Transfer);
        assert_eq!(tx.timestamp, 1_700_000_000_000);
        assert_eq!(tx.amount, -0.5);
        assert_eq!(tx.status, TransactionStatus::Confirmed);
        assert_eq!(tx.token.symbol, "SOL");
    }

    #[test]
    fn test_summary_for_other_payer_has_zero_amount() {
        let tx = summary_to_transaction(&summary(None, "SomeoneElse", Some(1)), WALLET).unwrap();
        assert_eq!(tx.amount, 0.0);
        assert_eq!(tx.tx_type, TransactionType::Unknown);
    }

    #[test]
    fn test_summary_without_block_time_skipped() {
        assert!(summary_to_transaction(&summary(None, WALLET, None), WALLET).is_none());
    }

    #[test]
    fn test_failed_summary() {
        let mut s = summary(Some(TOKEN_PROGRAM_ID), WALLET, Some(1));
        s.failed = true;
        let tx = summary_to_transaction(&s, WALLET).unwrap();
        assert_eq!(tx.status, TransactionStatus::Failed);
        assert_eq!(tx.tx_type, TransactionType::Swap);
    }

    #[test]
    fn test_error_mapping() {
        let err: WalletDataError = WalletServiceError::WalletNotFound(WALLET.to_string()).into();
        assert!(matches!(err, WalletDataError::NotFound(a) if a == WALLET));

        let err: WalletDataError =
            WalletServiceError::Rpc(SolanaClientError::RpcError("boom".into())).into();
        assert!(matches!(err, WalletDataError::Upstream(m) if m.contains("boom")));
    }

    #[tokio::test]
    async fn test_invalid_address_rejected() {
        let service = SolanaWalletService::new(SolanaClient::new("http://127.0.0.1:1".to_string()));
        let err = service.get_wallet_info("nope").await.unwrap_err();
        assert!(matches!(err, WalletDataError::InvalidAddress(_)));
    }
}
