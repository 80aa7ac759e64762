pub mod rpc;
pub mod wallet_service;

pub use rpc::{SolanaClient, SolanaClientError, TransactionSummary, SYSTEM_PROGRAM_ID, TOKEN_PROGRAM_ID};
pub use wallet_service::{SolanaWalletService, WalletServiceError, DEFAULT_TRANSACTION_LIMIT};
