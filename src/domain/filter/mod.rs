//! Transaction filtering
//!
//! - `classifier`: buy/sell/transfer classification, trade sizing and P&L
//! - `options`: simple criteria filter for transaction listings
//! - `rules`: declarative rule engine applied to streamed transactions

pub mod classifier;
pub mod options;
pub mod rules;

pub use classifier::{QuickClassifier, TradeClass, TradeSize, DEFAULT_SIGNIFICANT_VALUE};
pub use options::{DateRange, FilterOptions};
pub use rules::{
    default_rules, ActionType, ConditionRule, ConditionType, FilterAction, FilterCondition,
    FilterRule, FilterRulesEngine, Operator, RuleOutcome, RuleUpdate, RulesError,
};
