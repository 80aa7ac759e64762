//! Transaction filter options
//!
//! Simple criteria filter used when listing a wallet's transactions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::transaction::{Transaction, TransactionType};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    pub fn contains_ms(&self, timestamp_ms: i64) -> bool {
        timestamp_ms >= self.start.timestamp_millis() && timestamp_ms <= self.end.timestamp_millis()
    }
}

/// All present criteria must match; empty lists are treated as absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_addresses: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wallet_addresses: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_types: Option<Vec<TransactionType>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_range: Option<DateRange>,
}

fn non_empty<T>(list: &Option<Vec<T>>) -> Option<&Vec<T>> {
    list.as_ref().filter(|l| !l.is_empty())
}

impl FilterOptions {
    pub fn is_empty(&self) -> bool {
        self.min_amount.is_none()
            && self.max_amount.is_none()
            && non_empty(&self.token_addresses).is_none()
            && non_empty(&self.wallet_addresses).is_none()
            && non_empty(&self.transaction_types).is_none()
            && self.date_range.is_none()
    }

    pub fn matches(&self, tx: &Transaction) -> bool {
        if let Some(min) = self.min_amount {
            if tx.amount < min {
                return false;
            }
        }

        if let Some(max) = self.max_amount {
            if tx.amount > max {
                return false;
            }
        }

        if let Some(tokens) = non_empty(&self.token_addresses) {
            if !tokens.iter().any(|t| t == &tx.token.address) {
                return false;
            }
        }

        if let Some(wallets) = non_empty(&self.wallet_addresses) {
            if !wallets.iter().any(|w| w == &tx.from || w == &tx.to) {
                return false;
            }
        }

        if let Some(types) = non_empty(&self.transaction_types) {
            if !types.contains(&tx.tx_type) {
                return false;
            }
        }

        if let Some(range) = &self.date_range {
            if !range.contains_ms(tx.timestamp) {
                return false;
            }
        }

        true
    }

    pub fn apply(&self, transactions: Vec<Transaction>) -> Vec<Transaction> {
        if self.is_empty() {
            return transactions;
        }
        transactions.into_iter().filter(|tx| self.matches(tx)).collect()
    }
}
