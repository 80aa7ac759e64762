//! Quick Transaction Classifier
//!
//! Buckets wallet transactions into buy/sell/transfer, sizes them by USD
//! value and computes realized profit/loss with average-cost accounting.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::transaction::{Transaction, TransactionType};

/// Default USD value for a trade to count as significant
pub const DEFAULT_SIGNIFICANT_VALUE: f64 = 100.0;

const MEDIUM_TRADE_VALUE: f64 = 100.0;
const LARGE_TRADE_VALUE: f64 = 1_000.0;
const WHALE_TRADE_VALUE: f64 = 10_000.0;

const MS_PER_HOUR: i64 = 3_600_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradeClass {
    Buy,
    Sell,
    Transfer,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradeSize {
    Small,
    Medium,
    Large,
    Whale,
}

/// Average-cost holding used for P&L
#[derive(Debug, Clone, Copy, Default)]
struct Holding {
    amount: f64,
    avg_price: f64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct QuickClassifier;

impl QuickClassifier {
    pub fn new() -> Self {
        Self
    }

    pub fn classify(&self, tx: &Transaction) -> TradeClass {
        match tx.tx_type {
            TransactionType::Swap if tx.amount > 0.0 => TradeClass::Buy,
            TransactionType::Swap => TradeClass::Sell,
            TransactionType::Transfer => TradeClass::Transfer,
            _ => TradeClass::Other,
        }
    }

    /// USD value of the transaction; unknown prices count as zero
    pub fn trade_value(&self, tx: &Transaction) -> f64 {
        tx.amount.abs() * tx.price.unwrap_or(0.0)
    }

    pub fn is_significant_trade(&self, tx: &Transaction, min_value: f64) -> bool {
        self.trade_value(tx) >= min_value
    }

    pub fn trade_size(&self, tx: &Transaction) -> TradeSize {
        let value = self.trade_value(tx);
        if value < MEDIUM_TRADE_VALUE {
            TradeSize::Small
        } else if value < LARGE_TRADE_VALUE {
            TradeSize::Medium
        } else if value < WHALE_TRADE_VALUE {
            TradeSize::Large
        } else {
            TradeSize::Whale
        }
    }

    /// Transactions no older than `hours` relative to `now_ms`; negative hours count as zero
    pub fn recent_trades<'a>(
        &self,
        transactions: &'a [Transaction],
        hours: i64,
        now_ms: i64,
    ) -> Vec<&'a Transaction> {
        let cutoff = now_ms.saturating_sub(hours.max(0).saturating_mul(MS_PER_HOUR));
        transactions.iter().filter(|tx| tx.timestamp >= cutoff).collect()
    }

    /// Group by token mint, keeping first-seen order of tokens
    pub fn group_by_token<'a>(
        &self,
        transactions: &'a [Transaction],
    ) -> Vec<(String, Vec<&'a Transaction>)> {
        let mut groups: Vec<(String, Vec<&'a Transaction>)> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for tx in transactions {
            let key = tx.token_key().to_string();
            match index.get(&key) {
                Some(&i) => groups[i].1.push(tx),
                None => {
                    index.insert(key.clone(), groups.len());
                    groups.push((key, vec![tx]));
                }
            }
        }

        groups
    }

    /// Realized P&L in USD over a chronological list of trades
    pub fn calculate_profit_loss(&self, trades: &[Transaction]) -> f64 {
        let mut total_pnl = 0.0;
        let mut holdings: HashMap<&str, Holding> = HashMap::new();

        for trade in trades {
            let price = trade.price.unwrap_or(0.0);
            match self.classify(trade) {
                TradeClass::Buy => {
                    let current = holdings.entry(trade.token_key()).or_default();
                    let new_amount = current.amount + trade.amount;
                    if new_amount > 0.0 {
                        current.avg_price =
                            (current.avg_price * current.amount + price * trade.amount) / new_amount;
                    }
                    current.amount = new_amount;
                }
                TradeClass::Sell => {
                    if let Some(current) = holdings.get_mut(trade.token_key()) {
                        if current.amount > 0.0 {
                            let sell_amount = trade.amount.abs().min(current.amount);
                            total_pnl += (price - current.avg_price) * sell_amount;
                            current.amount -= sell_amount;
                        }
                    }
                }
                TradeClass::Transfer | TradeClass::Other => {}
            }
        }

        total_pnl
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::transaction::{TokenInfo, TransactionStatus};
    use approx::assert_relative_eq;

    fn tx(tx_type: TransactionType, amount: f64, price: Option<f64>, mint: &str, ts: i64) -> Transaction {
        Transaction {
            signature: format!("sig-{}-{}", mint, ts),
            timestamp: ts,
            tx_type,
            amount,
            token: TokenInfo::with_address(mint),
            from: "WalletA".to_string(),
            to: String::new(),
            fee: 0.0,
            status: TransactionStatus::Confirmed,
            price,
        }
    }

    #[test]
    fn test_classify() {
        let c = QuickClassifier::new();
        assert_eq!(c.classify(&tx(TransactionType::Swap, 5.0, None, "M", 0)), TradeClass::Buy);
        assert_eq!(c.classify(&tx(TransactionType::Swap, -5.0, None, "M", 0)), TradeClass::Sell);
        assert_eq!(c.classify(&tx(TransactionType::Swap, 0.0, None, "M", 0)), TradeClass::Sell);
        assert_eq!(c.classify(&tx(TransactionType::Transfer, 5.0, None, "M", 0)), TradeClass::Transfer);
        assert_eq!(c.classify(&tx(TransactionType::Mint, 5.0, None, "M", 0)), TradeClass::Other);
    }

    #[test]
    fn test_significance_uses_absolute_value() {
        let c = QuickClassifier::new();
        let sell = tx(TransactionType::Swap, -60.0, Some(2.0), "M", 0);
        assert!(c.is_significant_trade(&sell, DEFAULT_SIGNIFICANT_VALUE));

        let no_price = tx(TransactionType::Swap, 1_000_000.0, None, "M", 0);
        assert!(!c.is_significant_trade(&no_price, DEFAULT_SIGNIFICANT_VALUE));
    }

    #[test]
    fn test_trade_size_boundaries() {
        let c = QuickClassifier::new();
        let sized = |value: f64| c.trade_size(&tx(TransactionType::Swap, value, Some(1.0), "M", 0));
        assert_eq!(sized(99.99), TradeSize::Small);
        assert_eq!(sized(100.0), TradeSize::Medium);
        assert_eq!(sized(999.0), TradeSize::Medium);
        assert_eq!(sized(1_000.0), TradeSize::Large);
        assert_eq!(sized(10_000.0), TradeSize::Whale);
    }

    #[test]
    fn test_recent_trades() {
        let c = QuickClassifier::new();
        let now = 100 * MS_PER_HOUR;
        let txs = vec![
            tx(TransactionType::Swap, 1.0, None, "M", now - 25 * MS_PER_HOUR),
            tx(TransactionType::Swap, 1.0, None, "M", now - 24 * MS_PER_HOUR),
            tx(TransactionType::Swap, 1.0, None, "M", now),
        ];
        let recent = c.recent_trades(&txs, 24, now);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].timestamp, now - 24 * MS_PER_HOUR);
    }

    #[test]
    fn test_recent_trades_window_saturates() {
        let c = QuickClassifier::new();
        let txs = vec![
            tx(TransactionType::Swap, 1.0, None, "M", -1_000_000),
            tx(TransactionType::Swap, 1.0, None, "M", 0),
        ];
        assert!(c.recent_trades(&[], 3_000_000_000_000, 0).is_empty());
        assert_eq!(c.recent_trades(&txs, i64::MAX, 0).len(), 2);
        // negative window keeps only the present
        assert_eq!(c.recent_trades(&txs, -5, 0).len(), 1);
    }

    #[test]
    fn test_group_by_token_keeps_order() {
        let c = QuickClassifier::new();
        let txs = vec![
            tx(TransactionType::Swap, 1.0, None, "B", 1),
            tx(TransactionType::Transfer, 1.0, None, "", 2),
            tx(TransactionType::Swap, 1.0, None, "B", 3),
        ];
        let groups = c.group_by_token(&txs);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0, "B");
        assert_eq!(groups[0].1.len(), 2);
        assert_eq!(groups[1].0, "SOL");
    }

    #[test]
    fn test_profit_loss_average_cost() {
        let c = QuickClassifier::new();
        let trades = vec![
            tx(TransactionType::Swap, 10.0, Some(1.0), "M", 1),
            tx(TransactionType::Swap, 10.0, Some(2.0), "M", 2),
            // avg = 1.5, sell 5 @ 3.0 => +7.5
            tx(TransactionType::Swap, -5.0, Some(3.0), "M", 3),
        ];
        assert_relative_eq!(c.calculate_profit_loss(&trades), 7.5, epsilon = 1e-9);
    }

    #[test]
    fn test_profit_loss_caps_sell_at_holding() {
        let c = QuickClassifier::new();
        let trades = vec![
            tx(TransactionType::Swap, 2.0, Some(1.0), "M", 1),
            tx(TransactionType::Swap, -10.0, Some(0.5), "M", 2),
            // nothing left to sell
            tx(TransactionType::Swap, -10.0, Some(0.5), "M", 3),
        ];
        assert_relative_eq!(c.calculate_profit_loss(&trades), -1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_profit_loss_ignores_sell_without_holding() {
        let c = QuickClassifier::new();
        let trades = vec![tx(TransactionType::Swap, -3.0, Some(4.0), "M", 1)];
        assert_eq!(c.calculate_profit_loss(&trades), 0.0);
    }
}
