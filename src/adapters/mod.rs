//! Adapters Layer - External System Implementations
//!
//! This module contains implementations of the port traits:
//! - Helius: websocket wallet stream and enhanced transaction history
//! - Solana: RPC client and wallet data service
//! - Birdeye / Jupiter: token prices and metadata
//! - Store: JSON key-value persistence
//! - Notifier: console and webhook delivery
//! - CLI: Command-line interface definitions

pub mod birdeye;
pub mod cli;
pub mod helius;
pub mod jupiter;
pub mod notifier;
pub mod price_oracle;
pub mod solana;
pub mod store;

pub use birdeye::BirdeyeClient;
pub use cli::CliApp;
pub use helius::{HeliusClient, WalletStream};
pub use jupiter::JupiterPriceClient;
pub use notifier::{ConsoleNotifier, WebhookNotifier};
pub use price_oracle::PriceOracle;
pub use solana::{SolanaClient, SolanaWalletService};
pub use store::JsonStore;
