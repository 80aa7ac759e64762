//! Domain Layer - Core wallet tracking logic
//!
//! Pure types and rules with no I/O. All external interactions happen
//! through the ports layer.
//!
//! - `transaction`: DTOs mirroring Helius/Birdeye/RPC payloads
//! - `address`: Solana wallet address validation
//! - `filter`: classifier, criteria filter and rules engine
//! - `watchlist`: bounded list of tracked wallets

pub mod address;
pub mod filter;
pub mod transaction;
pub mod watchlist;

pub use address::{is_valid_wallet_address, short_address, validate_wallet_address, AddressError};
pub use filter::{
    FilterOptions, FilterRule, FilterRulesEngine, QuickClassifier, RuleOutcome, TradeClass,
    TradeSize,
};
pub use transaction::{
    risk_score, BalanceUpdate, PriceUpdate, TokenBalance, TokenInfo, Transaction,
    TransactionStatus, TransactionType, WalletSummary, LAMPORTS_PER_SOL,
};
pub use watchlist::{Watchlist, WatchlistError, MAX_WALLETS};
