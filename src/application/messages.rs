//! Runtime message protocol spoken with front ends.
//!
//! Requests are flat JSON objects tagged by `type`, e.g.
//! `{"type":"ADD_WALLET","address":"..."}`. Every request gets exactly one
//! [`TrackerResponse`]. [`TrackerUpdate`]s are pushed unsolicited.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::oneshot;

use crate::domain::{BalanceUpdate, FilterOptions, Transaction};
use crate::ports::Notification;

pub const UNKNOWN_MESSAGE_TYPE: &str = "Unknown message type";

const REQUEST_TYPES: [&str; 5] = [
    "ADD_WALLET",
    "REMOVE_WALLET",
    "GET_WALLET_INFO",
    "GET_TRANSACTIONS",
    "GET_WATCHED_WALLETS",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrackerRequest {
    AddWallet {
        address: String,
    },
    RemoveWallet {
        address: String,
    },
    GetWalletInfo {
        address: String,
    },
    GetTransactions {
        address: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        limit: Option<usize>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        filter: Option<FilterOptions>,
    },
    GetWatchedWallets,
}

impl TrackerRequest {
    /// Parse one protocol line. The error is the response to send back.
    pub fn parse(raw: &str) -> Result<Self, TrackerResponse> {
        let value: Value = serde_json::from_str(raw)
            .map_err(|e| TrackerResponse::error(format!("Invalid message: {}", e)))?;

        let known = value
            .get("type")
            .and_then(Value::as_str)
            .map_or(false, |kind| REQUEST_TYPES.contains(&kind));
        if !known {
            return Err(TrackerResponse::error(UNKNOWN_MESSAGE_TYPE));
        }

        serde_json::from_value(value)
            .map_err(|e| TrackerResponse::error(format!("Invalid message: {}", e)))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::AddWallet { .. } => "ADD_WALLET",
            Self::RemoveWallet { .. } => "REMOVE_WALLET",
            Self::GetWalletInfo { .. } => "GET_WALLET_INFO",
            Self::GetTransactions { .. } => "GET_TRANSACTIONS",
            Self::GetWatchedWallets => "GET_WATCHED_WALLETS",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackerResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TrackerResponse {
    pub fn ok() -> Self {
        Self {
            success: true,
            data: None,
            error: None,
        }
    }

    /// Success carrying `data`; serialization failures become error responses
    pub fn with_data<T: Serialize>(data: &T) -> Self {
        match serde_json::to_value(data) {
            Ok(value) => Self {
                success: true,
                data: Some(value),
                error: None,
            },
            Err(e) => Self::error(format!("Failed to serialize response: {}", e)),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Pushed to every front end
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrackerUpdate {
    TransactionUpdate {
        transaction: Transaction,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        flags: Vec<String>,
    },
    BalanceUpdate(BalanceUpdate),
    Notification(Notification),
}

/// Request waiting for the tracker loop, answered through `reply`
#[derive(Debug)]
pub struct PendingRequest {
    pub request: TrackerRequest,
    pub reply: oneshot::Sender<TrackerResponse>,
}

impl PendingRequest {
    pub fn new(request: TrackerRequest) -> (Self, oneshot::Receiver<TrackerResponse>) {
        let (reply, rx) = oneshot::channel();
        (Self { request, reply }, rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_add_wallet() {
        let req = TrackerRequest::parse(r#"{"type":"ADD_WALLET","address":"abc"}"#).unwrap();
        assert_eq!(
            req,
            TrackerRequest::AddWallet {
                address: "abc".to_string()
            }
        );
        assert_eq!(req.kind(), "ADD_WALLET");
    }

    #[test]
    fn test_parse_get_transactions_optional_fields() {
        let req = TrackerRequest::parse(r#"{"type":"GET_TRANSACTIONS","address":"abc"}"#).unwrap();
        assert!(matches!(
            req,
            TrackerRequest::GetTransactions { limit: None, filter: None, .. }
        ));

        let req = TrackerRequest::parse(
            r#"{"type":"GET_TRANSACTIONS","address":"abc","limit":5,"filter":{"minAmount":1.5}}"#,
        )
        .unwrap();
        match req {
            TrackerRequest::GetTransactions { limit, filter, .. } => {
                assert_eq!(limit, Some(5));
                assert_eq!(filter.unwrap().min_amount, Some(1.5));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_unit_request() {
        let req = TrackerRequest::parse(r#"{"type":"GET_WATCHED_WALLETS"}"#).unwrap();
        assert_eq!(req, TrackerRequest::GetWatchedWallets);
    }

    #[test]
    fn test_unknown_type() {
        let err = TrackerRequest::parse(r#"{"type":"SELF_DESTRUCT"}"#).unwrap_err();
        assert!(!err.success);
        assert_eq!(err.error.as_deref(), Some(UNKNOWN_MESSAGE_TYPE));

        let err = TrackerRequest::parse(r#"{"address":"abc"}"#).unwrap_err();
        assert_eq!(err.error.as_deref(), Some(UNKNOWN_MESSAGE_TYPE));
    }

    #[test]
    fn test_invalid_messages() {
        let err = TrackerRequest::parse("not json").unwrap_err();
        assert!(err.error.unwrap().starts_with("Invalid message"));

        let err = TrackerRequest::parse(r#"{"type":"ADD_WALLET"}"#).unwrap_err();
        assert!(err.error.unwrap().starts_with("Invalid message"));
    }

    #[test]
    fn test_response_shapes() {
        assert_eq!(serde_json::to_value(TrackerResponse::ok()).unwrap(), json!({"success": true}));
        assert_eq!(
            serde_json::to_value(TrackerResponse::with_data(&vec!["a", "b"])).unwrap(),
            json!({"success": true, "data": ["a", "b"]})
        );
        assert_eq!(
            serde_json::to_value(TrackerResponse::error("boom")).unwrap(),
            json!({"success": false, "error": "boom"})
        );
    }

    #[test]
    fn test_update_shape() {
        let update = TrackerUpdate::BalanceUpdate(BalanceUpdate {
            address: "abc".to_string(),
            lamports: Some(5),
            sol: None,
            token: None,
            amount: None,
            timestamp: 1,
        });
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json["type"], "BALANCE_UPDATE");
        assert_eq!(json["data"]["address"], "abc");
    }
}
