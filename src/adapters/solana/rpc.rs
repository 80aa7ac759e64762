use serde_json::Value;
use solana_client::rpc_client::{GetConfirmedSignaturesForAddress2Config, RpcClient};
use solana_client::rpc_config::RpcTransactionConfig;
use solana_client::rpc_request::TokenAccountsFilter;
use solana_sdk::{commitment_config::CommitmentConfig, pubkey::Pubkey, signature::Signature};
use solana_transaction_status::UiTransactionEncoding;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

use crate::domain::TokenBalance;

pub const SYSTEM_PROGRAM_ID: &str = "11111111111111111111111111111111";
pub const TOKEN_PROGRAM_ID: &str = "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA";

#[derive(Debug, Error)]
pub enum SolanaClientError {
    #[error("RPC request failed: {0}")]
    RpcError(String),
    #[error("Invalid signature: {0}")]
    InvalidSignature(String),
    #[error("Invalid public key: {0}")]
    InvalidPublicKey(String),
}

/// Entry of `getSignaturesForAddress`
#[derive(Debug, Clone, PartialEq)]
pub struct SignatureInfo {
    pub signature: String,
    pub block_time: Option<i64>,
    pub failed: bool,
}

/// The parts of a confirmed transaction the tracker looks at
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionSummary {
    pub signature: String,
    pub slot: u64,
    pub block_time: Option<i64>,
    pub fee: u64,
    pub failed: bool,
    pub pre_balances: Vec<u64>,
    pub post_balances: Vec<u64>,
    /// Program invoked by the first instruction
    pub program_id: Option<String>,
    /// First account key (fee payer)
    pub fee_payer: Option<String>,
}

impl TransactionSummary {
    /// Parse the JSON form of `getTransaction`. Returns `None` without meta.
    pub fn from_rpc_json(signature: &str, value: &Value) -> Option<Self> {
        let meta = value.get("meta").filter(|m| !m.is_null())?;

        let balances = |key: &str| -> Vec<u64> {
            meta.get(key)
                .and_then(Value::as_array)
                .map(|items| items.iter().filter_map(Value::as_u64).collect())
                .unwrap_or_default()
        };

        let message = value.get("transaction").and_then(|t| t.get("message"));
        let account_keys: Vec<String> = message
            .and_then(|m| m.get("accountKeys"))
            .and_then(Value::as_array)
            .map(|keys| keys.iter().filter_map(account_key).collect())
            .unwrap_or_default();

        let program_id = message
            .and_then(|m| m.get("instructions"))
            .and_then(Value::as_array)
            .and_then(|ixs| ixs.first())
            .and_then(|ix| {
                ix.get("programId")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .or_else(|| {
                        let index = ix.get("programIdIndex")?.as_u64()? as usize;
                        account_keys.get(index).cloned()
                    })
            });

        Some(Self {
            signature: signature.to_string(),
            slot: value.get("slot").and_then(Value::as_u64).unwrap_or_default(),
            block_time: value.get("blockTime").and_then(Value::as_i64),
            fee: meta.get("fee").and_then(Value::as_u64).unwrap_or_default(),
            failed: meta.get("err").map(|e| !e.is_null()).unwrap_or(false),
            pre_balances: balances("preBalances"),
            post_balances: balances("postBalances"),
            program_id,
            fee_payer: account_keys.first().cloned(),
        })
    }

    /// Absolute lamport change of the fee payer
    pub fn fee_payer_delta(&self) -> u64 {
        match (self.pre_balances.first(), self.post_balances.first()) {
            (Some(pre), Some(post)) => pre.abs_diff(*post),
            _ => 0,
        }
    }
}

/// Account keys are plain strings in `json` and `{pubkey, ...}` objects in `jsonParsed`
fn account_key(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Object(map) => map.get("pubkey").and_then(Value::as_str).map(str::to_string),
        _ => None,
    }
}

/// Parse a `jsonParsed` SPL token account
pub fn parse_token_account(account: &Value) -> Option<TokenBalance> {
    let info = account.get("data")?.get("parsed")?.get("info")?;
    let token_amount = info.get("tokenAmount")?;

    Some(TokenBalance {
        mint: info.get("mint")?.as_str()?.to_string(),
        amount: token_amount.get("amount")?.as_str()?.parse().ok()?,
        decimals: token_amount.get("decimals")?.as_u64()? as u8,
        ui_amount: token_amount
            .get("uiAmount")
            .and_then(Value::as_f64)
            .unwrap_or_default(),
    })
}

fn parse_pubkey(pubkey: &str) -> Result<Pubkey, SolanaClientError> {
    Pubkey::from_str(pubkey).map_err(|e| SolanaClientError::InvalidPublicKey(e.to_string()))
}

/// Wrapper around Solana RPC client with async-compatible methods
#[derive(Clone)]
pub struct SolanaClient {
    client: Arc<RpcClient>,
}

impl SolanaClient {
    pub fn new(rpc_url: String) -> Self {
        let client = Arc::new(RpcClient::new_with_commitment(rpc_url, CommitmentConfig::confirmed()));
        Self { client }
    }

    pub fn url(&self) -> String {
        self.client.url()
    }

    /// SOL balance in lamports
    pub async fn get_balance(&self, pubkey: &str) -> Result<u64, SolanaClientError> {
        let pubkey = parse_pubkey(pubkey)?;

        // Spawn blocking to make sync RPC call async-compatible
        let client = Arc::clone(&self.client);
        tokio::task::spawn_blocking(move || {
            client
                .get_balance(&pubkey)
                .map_err(|e| SolanaClientError::RpcError(e.to_string()))
        })
        .await
        .map_err(|e| SolanaClientError::RpcError(format!("Task join error: {}", e)))?
    }

    pub async fn account_exists(&self, pubkey: &str) -> Result<bool, SolanaClientError> {
        let pubkey = parse_pubkey(pubkey)?;

        let client = Arc::clone(&self.client);
        tokio::task::spawn_blocking(move || {
            client
                .get_account_with_commitment(&pubkey, CommitmentConfig::confirmed())
                .map(|response| response.value.is_some())
                .map_err(|e| SolanaClientError::RpcError(e.to_string()))
        })
        .await
        .map_err(|e| SolanaClientError::RpcError(format!("Task join error: {}", e)))?
    }

    /// Most recent signatures for an address, newest first
    pub async fn get_signatures(
        &self,
        pubkey: &str,
        limit: usize,
    ) -> Result<Vec<SignatureInfo>, SolanaClientError> {
        let pubkey = parse_pubkey(pubkey)?;

        let client = Arc::clone(&self.client);
        tokio::task::spawn_blocking(move || {
            let config = GetConfirmedSignaturesForAddress2Config {
                before: None,
                until: None,
                limit: Some(limit),
                commitment: Some(CommitmentConfig::confirmed()),
            };
            client
                .get_signatures_for_address_with_config(&pubkey, config)
                .map(|statuses| {
                    statuses
                        .into_iter()
                        .map(|s| SignatureInfo {
                            signature: s.signature,
                            block_time: s.block_time,
                            failed: s.err.is_some(),
                        })
                        .collect()
                })
                .map_err(|e| SolanaClientError::RpcError(e.to_string()))
        })
        .await
        .map_err(|e| SolanaClientError::RpcError(format!("Task join error: {}", e)))?
    }

    /// Parsed transaction summary; `None` when the node returns no meta
    pub async fn get_transaction_summary(
        &self,
        signature_str: &str,
    ) -> Result<Option<TransactionSummary>, SolanaClientError> {
        let signature = Signature::from_str(signature_str)
            .map_err(|e| SolanaClientError::InvalidSignature(e.to_string()))?;

        let client = Arc::clone(&self.client);
        let sig = signature_str.to_string();
        tokio::task::spawn_blocking(move || {
            let config = RpcTransactionConfig {
                encoding: Some(UiTransactionEncoding::JsonParsed),
                commitment: Some(CommitmentConfig::confirmed()),
                max_supported_transaction_version: Some(0),
            };
            let tx = client
                .get_transaction_with_config(&signature, config)
                .map_err(|e| SolanaClientError::RpcError(e.to_string()))?;
            let value = serde_json::to_value(&tx)
                .map_err(|e| SolanaClientError::RpcError(format!("Serialize error: {}", e)))?;
            Ok(TransactionSummary::from_rpc_json(&sig, &value))
        })
        .await
        .map_err(|e| SolanaClientError::RpcError(format!("Task join error: {}", e)))?
    }

    /// SPL token holdings of an owner
    pub async fn get_token_balances(&self, owner: &str) -> Result<Vec<TokenBalance>, SolanaClientError> {
        let owner = parse_pubkey(owner)?;
        let token_program = parse_pubkey(TOKEN_PROGRAM_ID)?;

        let client = Arc::clone(&self.client);
        tokio::task::spawn_blocking(move || {
            let accounts = client
                .get_token_accounts_by_owner(&owner, TokenAccountsFilter::ProgramId(token_program))
                .map_err(|e| SolanaClientError::RpcError(e.to_string()))?;

            Ok(accounts
                .iter()
                .filter_map(|keyed| serde_json::to_value(&keyed.account).ok())
                .filter_map(|account| parse_token_account(&account))
                .collect())
        })
        .await
        .map_err(|e| SolanaClientError::RpcError(format!("Task join error: {}", e)))?
    }
}
