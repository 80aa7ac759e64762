//! Helius Adapter
//!
//! Real-time wallet activity over websocket plus enhanced transaction
//! history over REST.
//!
//! # Stream protocol
//!
//! Outbound frames are JSON objects `{type, data, timestamp}`:
//! - `subscribe` / `unsubscribe` with `data.address` set to the wallet
//! - `ping` keepalive every heartbeat interval
//!
//! Inbound kinds: `transaction`, `transaction_update`, `balance_update`,
//! `wallet_balance`, `price_update`, `pong`, `heartbeat`, `error`. Anything
//! else is forwarded raw.

mod client;
mod stream;
mod types;

pub use client::{HeliusClient, HeliusConfig, HeliusError, DEFAULT_BASE_URL};
pub use stream::{
    backoff_delay, generate_connection_id, subscription_frame, ConnectionInfo, ConnectionStatus,
    StreamBuilder, StreamConfig, StreamError, StreamEvent, WalletStream, DEFAULT_WS_URL,
};
pub use types::{EnhancedTransaction, NativeTransfer, TokenTransfer, TransactionStreamData};
