//! Helius Types
//!
//! Wire types for the Helius websocket stream and the enhanced transactions REST API.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{TokenInfo, Transaction, TransactionStatus, TransactionType, LAMPORTS_PER_SOL};

/// Envelope of every inbound stream message
#[derive(Debug, Clone, Deserialize)]
pub struct StreamMessage {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub timestamp: Option<i64>,
}

/// Outbound subscribe/unsubscribe frame
#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionFrame<'a> {
    #[serde(rename = "type")]
    pub kind: &'a str,
    pub data: SubscriptionData<'a>,
    pub timestamp: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionData<'a> {
    pub address: &'a str,
}

/// Keepalive frame
#[derive(Debug, Clone, Serialize)]
pub struct PingFrame {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub timestamp: i64,
}

/// Transaction payload pushed by the stream
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionStreamData {
    pub signature: String,
    pub wallet_address: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub amount: f64,
    #[serde(default)]
    pub token_address: String,
    #[serde(default)]
    pub timestamp: i64,
    #[serde(default)]
    pub confirmed: bool,
}

impl TransactionStreamData {
    pub fn into_transaction(self) -> Transaction {
        Transaction {
            signature: self.signature,
            timestamp: self.timestamp,
            tx_type: TransactionType::from_stream_label(&self.kind),
            amount: self.amount,
            token: TokenInfo::with_address(self.token_address),
            from: self.wallet_address,
            to: String::new(),
            fee: 0.0,
            status: if self.confirmed {
                TransactionStatus::Confirmed
            } else {
                TransactionStatus::Pending
            },
            price: None,
        }
    }
}

/// Token movement inside an enhanced transaction
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenTransfer {
    #[serde(default)]
    pub from_user_account: Option<String>,
    #[serde(default)]
    pub to_user_account: Option<String>,
    /// UI amount (already decimal-adjusted)
    #[serde(default)]
    pub token_amount: f64,
    pub mint: String,
}

/// SOL movement inside an enhanced transaction
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NativeTransfer {
    #[serde(default)]
    pub from_user_account: Option<String>,
    #[serde(default)]
    pub to_user_account: Option<String>,
    /// Lamports
    #[serde(default)]
    pub amount: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountData {
    pub account: String,
    #[serde(default)]
    pub native_balance_change: i64,
}

/// Response item of `GET /v0/addresses/{address}/transactions`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnhancedTransaction {
    pub signature: String,
    /// Unix seconds
    #[serde(default)]
    pub timestamp: i64,
    #[serde(default)]
    pub slot: u64,
    /// Lamports
    #[serde(default)]
    pub fee: u64,
    #[serde(default)]
    pub fee_payer: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub token_transfers: Vec<TokenTransfer>,
    #[serde(default)]
    pub native_transfers: Vec<NativeTransfer>,
    #[serde(default)]
    pub account_data: Vec<AccountData>,
    #[serde(default)]
    pub transaction_error: Option<Value>,
}

fn helius_type(kind: &str) -> TransactionType {
    match kind {
        "SWAP" => TransactionType::Swap,
        "TRANSFER" => TransactionType::Transfer,
        "TOKEN_MINT" | "NFT_MINT" | "COMPRESSED_NFT_MINT" => TransactionType::Mint,
        "BURN" | "BURN_NFT" => TransactionType::Burn,
        "STAKE_SOL" | "STAKE_TOKEN" => TransactionType::Stake,
        "UNSTAKE_SOL" | "UNSTAKE_TOKEN" => TransactionType::Unstake,
        _ => TransactionType::Unknown,
    }
}

fn touches(wallet: &str, from: &Option<String>, to: &Option<String>) -> bool {
    from.as_deref() == Some(wallet) || to.as_deref() == Some(wallet)
}

impl EnhancedTransaction {
    /// Convert to a domain transaction seen from `wallet`.
    ///
    /// The first token transfer touching the wallet wins; otherwise the first
    /// native transfer is used. Amounts are negative when leaving the wallet.
    pub fn to_transaction(&self, wallet: &str) -> Transaction {
        let failed = matches!(&self.transaction_error, Some(v) if !v.is_null());

        let mut tx = Transaction {
            signature: self.signature.clone(),
            timestamp: self.timestamp * 1000,
            tx_type: helius_type(&self.kind),
            amount: 0.0,
            token: TokenInfo::sol(),
            from: self.fee_payer.clone(),
            to: String::new(),
            fee: self.fee as f64 / LAMPORTS_PER_SOL,
            status: if failed {
                TransactionStatus::Failed
            } else {
                TransactionStatus::Confirmed
            },
            price: None,
        };

        if let Some(transfer) = self
            .token_transfers
            .iter()
            .find(|t| touches(wallet, &t.from_user_account, &t.to_user_account))
        {
            let incoming = transfer.to_user_account.as_deref() == Some(wallet);
            tx.amount = if incoming {
                transfer.token_amount
            } else {
                -transfer.token_amount
            };
            tx.token = TokenInfo::with_address(transfer.mint.clone());
            tx.from = transfer.from_user_account.clone().unwrap_or_default();
            tx.to = transfer.to_user_account.clone().unwrap_or_default();
        } else if let Some(transfer) = self
            .native_transfers
            .iter()
            .find(|t| touches(wallet, &t.from_user_account, &t.to_user_account))
        {
            let sol = transfer.amount as f64 / LAMPORTS_PER_SOL;
            let incoming = transfer.to_user_account.as_deref() == Some(wallet);
            tx.amount = if incoming { sol } else { -sol };
            tx.from = transfer.from_user_account.clone().unwrap_or_default();
            tx.to = transfer.to_user_account.clone().unwrap_or_default();
        }

        tx
    }
}
