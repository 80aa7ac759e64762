//! Lemora - Solana Wallet Tracker Library
//!
//! Watches a list of Solana wallets, streams their activity, filters it
//! through a rules engine and surfaces notifications for significant trades.
//!
//! # Modules
//!
//! - `domain`: Core types and logic (Transaction, Watchlist, filter rules, classifier)
//! - `ports`: Trait abstractions (WalletDataPort, PricePort, NotifierPort)
//! - `adapters`: External implementations (Helius, Solana RPC, Birdeye, Jupiter, store, CLI)
//! - `config`: Configuration loading and validation
//! - `application`: Tracker service and runtime message protocol

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
