//! Ports Layer - Trait definitions for external dependencies
//!
//! Following hexagonal architecture, these traits abstract:
//! - Wallet summaries and transaction history (Solana RPC, Helius)
//! - Token prices and metadata (Birdeye, Jupiter)
//! - Notification delivery (console, webhook)

pub mod mocks;
pub mod notifier;
pub mod price;
pub mod wallet_data;

pub use notifier::{Notification, NotifierPort, NotifyError};
pub use price::{PriceError, PricePort};
pub use wallet_data::{WalletDataError, WalletDataPort};
