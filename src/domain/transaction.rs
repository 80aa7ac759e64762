//! Transaction and wallet DTOs
//!
//! Plain records mirroring what the Helius, Birdeye and Solana RPC APIs hand back.
//! Field names serialize in camelCase so filter rules can address them with
//! dot paths such as `token.symbol`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lamports per SOL
pub const LAMPORTS_PER_SOL: f64 = 1_000_000_000.0;

/// Kind of on-chain activity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    Swap,
    Transfer,
    Mint,
    Burn,
    Stake,
    Unstake,
    Unknown,
}

impl TransactionType {
    /// Map a lowercase stream label ("swap", "transfer", ...) to a type.
    /// Unrecognised labels are treated as transfers.
    pub fn from_stream_label(label: &str) -> Self {
        match label.to_ascii_lowercase().as_str() {
            "swap" => Self::Swap,
            "transfer" => Self::Transfer,
            "mint" => Self::Mint,
            "burn" => Self::Burn,
            "stake" => Self::Stake,
            "unstake" => Self::Unstake,
            _ => Self::Transfer,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Swap => "SWAP",
            Self::Transfer => "TRANSFER",
            Self::Mint => "MINT",
            Self::Burn => "BURN",
            Self::Stake => "STAKE",
            Self::Unstake => "UNSTAKE",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    Pending,
    Confirmed,
    Failed,
}

/// Token descriptor attached to a transaction
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenInfo {
    pub address: String,
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub decimals: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_cap: Option<f64>,
    #[serde(default, rename = "volume24h", skip_serializing_if = "Option::is_none")]
    pub volume_24h: Option<f64>,
}

impl TokenInfo {
    /// Token known only by its mint address
    pub fn with_address(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            ..Default::default()
        }
    }

    /// Native SOL
    pub fn sol() -> Self {
        Self {
            address: String::new(),
            symbol: "SOL".to_string(),
            name: "Solana".to_string(),
            decimals: 9,
            ..Default::default()
        }
    }
}

/// A wallet transaction as tracked by Lemora
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub signature: String,
    /// Unix timestamp in milliseconds
    pub timestamp: i64,
    #[serde(rename = "type")]
    pub tx_type: TransactionType,
    /// Signed token amount from the tracked wallet's perspective
    pub amount: f64,
    pub token: TokenInfo,
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub to: String,
    #[serde(default)]
    pub fee: f64,
    pub status: TransactionStatus,
    /// USD price per token unit, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
}

impl Transaction {
    pub fn block_time(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.timestamp)
    }

    /// Mint address used for grouping; native SOL has an empty address
    pub fn token_key(&self) -> &str {
        if self.token.address.is_empty() {
            "SOL"
        } else {
            &self.token.address
        }
    }
}

/// SPL token holding of a wallet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenBalance {
    pub mint: String,
    /// Raw amount in base units
    pub amount: u64,
    pub decimals: u8,
    pub ui_amount: f64,
}

/// Summary of a watched wallet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletSummary {
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub is_whitelisted: bool,
    pub last_activity: DateTime<Utc>,
    pub total_transactions: usize,
    /// Total SOL moved across the sampled history
    pub total_volume: f64,
    pub average_transaction_value: f64,
    pub risk_score: f64,
    pub sol_balance: f64,
    #[serde(default)]
    pub token_balances: Vec<TokenBalance>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Heuristic risk score from activity level: fresh wallets score high.
pub fn risk_score(transaction_count: usize) -> f64 {
    match transaction_count {
        0..=9 => 0.9,
        10..=99 => 0.5,
        100..=999 => 0.3,
        _ => 0.1,
    }
}

/// Balance change pushed by the stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceUpdate {
    #[serde(alias = "walletAddress")]
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lamports: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sol: Option<f64>,
    #[serde(default, alias = "tokenAddress", skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(default)]
    pub timestamp: i64,
}

/// Price tick pushed by the stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceUpdate {
    pub token_address: String,
    pub price: f64,
    #[serde(default, rename = "priceChange24h")]
    pub price_change_24h: f64,
    #[serde(default, rename = "volume24h")]
    pub volume_24h: f64,
    #[serde(default)]
    pub market_cap: f64,
    #[serde(default)]
    pub timestamp: i64,
}

impl PriceUpdate {
    pub fn validate(&self) -> Result<(), String> {
        if self.token_address.trim().is_empty() {
            return Err("price update is missing tokenAddress".to_string());
        }
        if !self.price.is_finite() {
            return Err(format!("price update has invalid price {}", self.price));
        }
        Ok(())
    }
}
