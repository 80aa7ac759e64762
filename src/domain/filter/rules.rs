//! Filter Rules Engine
//!
//! Declarative rules evaluated against each incoming transaction.
//! A rule is a condition (AND/OR over field comparisons) plus an action:
//! - `exclude`: drop the transaction
//! - `include`: no-op marker, documents intent
//! - `flag`: attach `parameters.flag` to the outcome
//! - `transform`: overwrite fields listed in `parameters` (dot paths)
//!
//! Rules run in ascending priority order. Conditions always see the original
//! transaction while transforms chain on the running copy.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

use crate::domain::transaction::Transaction;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RulesError {
    #[error("Rule already exists: {0}")]
    DuplicateRule(String),
    #[error("Rule not found: {0}")]
    RuleNotFound(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ConditionType {
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Equals,
    NotEquals,
    GreaterThan,
    LessThan,
    Contains,
    NotContains,
}

/// Single field comparison, e.g. `amount greater_than 1000`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionRule {
    /// Dot path into the transaction's JSON form
    pub field: String,
    pub operator: Operator,
    pub value: Value,
}

impl ConditionRule {
    pub fn new(field: impl Into<String>, operator: Operator, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            operator,
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterCondition {
    #[serde(rename = "type")]
    pub kind: ConditionType,
    pub rules: Vec<ConditionRule>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionType {
    Include,
    Exclude,
    Flag,
    Transform,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterAction {
    #[serde(rename = "type")]
    pub kind: ActionType,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub parameters: Map<String, Value>,
}

impl FilterAction {
    pub fn simple(kind: ActionType) -> Self {
        Self {
            kind,
            parameters: Map::new(),
        }
    }

    pub fn flag(name: &str) -> Self {
        let mut parameters = Map::new();
        parameters.insert("flag".to_string(), Value::String(name.to_string()));
        Self {
            kind: ActionType::Flag,
            parameters,
        }
    }
}

fn default_enabled() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterRule {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Lower runs first
    #[serde(default)]
    pub priority: i32,
    pub condition: FilterCondition,
    pub action: FilterAction,
}

/// Partial update applied by [`FilterRulesEngine::update_rule`]
#[derive(Debug, Clone, Default)]
pub struct RuleUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub enabled: Option<bool>,
    pub priority: Option<i32>,
    pub condition: Option<FilterCondition>,
    pub action: Option<FilterAction>,
}

/// Result of running all enabled rules over one transaction
#[derive(Debug, Clone, PartialEq)]
pub struct RuleOutcome {
    pub include: bool,
    pub flags: Vec<String>,
    pub transformed: Transaction,
}

#[derive(Debug, Clone)]
pub struct FilterRulesEngine {
    rules: Vec<FilterRule>,
}

impl Default for FilterRulesEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl FilterRulesEngine {
    /// Engine preloaded with the built-in rules
    pub fn new() -> Self {
        let mut engine = Self::empty();
        for rule in default_rules() {
            // built-in ids are unique
            let _ = engine.add_rule(rule);
        }
        engine
    }

    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    pub fn add_rule(&mut self, rule: FilterRule) -> Result<(), RulesError> {
        if self.rules.iter().any(|r| r.id == rule.id) {
            return Err(RulesError::DuplicateRule(rule.id));
        }
        debug!("Adding filter rule {} (priority {})", rule.id, rule.priority);
        self.rules.push(rule);
        self.sort_by_priority();
        Ok(())
    }

    /// Returns true if a rule was removed
    pub fn remove_rule(&mut self, rule_id: &str) -> bool {
        let before = self.rules.len();
        self.rules.retain(|r| r.id != rule_id);
        self.rules.len() != before
    }

    pub fn update_rule(&mut self, rule_id: &str, update: RuleUpdate) -> Result<(), RulesError> {
        let rule = self
            .rules
            .iter_mut()
            .find(|r| r.id == rule_id)
            .ok_or_else(|| RulesError::RuleNotFound(rule_id.to_string()))?;

        if let Some(name) = update.name {
            rule.name = name;
        }
        if let Some(description) = update.description {
            rule.description = description;
        }
        if let Some(enabled) = update.enabled {
            rule.enabled = enabled;
        }
        if let Some(priority) = update.priority {
            rule.priority = priority;
        }
        if let Some(condition) = update.condition {
            rule.condition = condition;
        }
        if let Some(action) = update.action {
            rule.action = action;
        }

        self.sort_by_priority();
        Ok(())
    }

    pub fn toggle_rule(&mut self, rule_id: &str, enabled: bool) -> Result<(), RulesError> {
        let rule = self
            .rules
            .iter_mut()
            .find(|r| r.id == rule_id)
            .ok_or_else(|| RulesError::RuleNotFound(rule_id.to_string()))?;
        rule.enabled = enabled;
        Ok(())
    }

    pub fn active_rules(&self) -> Vec<&FilterRule> {
        self.rules.iter().filter(|r| r.enabled).collect()
    }

    pub fn all_rules(&self) -> &[FilterRule] {
        &self.rules
    }

    pub fn apply_rules(&self, transaction: &Transaction) -> RuleOutcome {
        let original = serde_json::to_value(transaction).unwrap_or(Value::Null);

        let mut include = true;
        let mut flags = Vec::new();
        let mut transformed = transaction.clone();

        for rule in self.rules.iter().filter(|r| r.enabled) {
            if !evaluate_condition(&rule.condition, &original) {
                continue;
            }

            match rule.action.kind {
                ActionType::Exclude => include = false,
                ActionType::Include => {}
                ActionType::Flag => {
                    if let Some(Value::String(flag)) = rule.action.parameters.get("flag") {
                        flags.push(flag.clone());
                    }
                }
                ActionType::Transform => {
                    transformed = apply_transformation(transformed, &rule.action.parameters, &rule.id);
                }
            }
        }

        RuleOutcome {
            include,
            flags,
            transformed,
        }
    }

    fn sort_by_priority(&mut self) {
        // stable: equal priorities keep insertion order
        self.rules.sort_by_key(|r| r.priority);
    }
}

/// Built-in rules: spam exclusion, large-transaction flag, trading-pair marker
pub fn default_rules() -> Vec<FilterRule> {
    vec![
        FilterRule {
            id: "exclude-spam-tokens".to_string(),
            name: "Exclude Spam Tokens".to_string(),
            description: "Filters out known spam token transactions".to_string(),
            enabled: true,
            priority: 1,
            condition: FilterCondition {
                kind: ConditionType::Or,
                rules: vec![
                    ConditionRule::new("token.symbol", Operator::Contains, "SPAM"),
                    ConditionRule::new("amount", Operator::LessThan, 0.001),
                ],
            },
            action: FilterAction::simple(ActionType::Exclude),
        },
        FilterRule {
            id: "flag-large-transactions".to_string(),
            name: "Flag Large Transactions".to_string(),
            description: "Flags transactions above a certain threshold".to_string(),
            enabled: true,
            priority: 2,
            condition: FilterCondition {
                kind: ConditionType::And,
                rules: vec![ConditionRule::new("amount", Operator::GreaterThan, 1000)],
            },
            action: FilterAction::flag("large_transaction"),
        },
        FilterRule {
            id: "include-trading-pairs".to_string(),
            name: "Include Trading Pairs".to_string(),
            description: "Only includes transactions from known trading pairs".to_string(),
            enabled: true,
            priority: 3,
            condition: FilterCondition {
                kind: ConditionType::Or,
                rules: vec![
                    ConditionRule::new("type", Operator::Equals, "SWAP"),
                    ConditionRule::new("type", Operator::Equals, "TRANSFER"),
                ],
            },
            action: FilterAction::simple(ActionType::Include),
        },
    ]
}

fn evaluate_condition(condition: &FilterCondition, tx: &Value) -> bool {
    match condition.kind {
        ConditionType::And => condition.rules.iter().all(|r| evaluate_rule(r, tx)),
        ConditionType::Or => condition.rules.iter().any(|r| evaluate_rule(r, tx)),
    }
}

fn evaluate_rule(rule: &ConditionRule, tx: &Value) -> bool {
    let field = field_value(tx, &rule.field);

    match rule.operator {
        Operator::Equals => values_equal(field, &rule.value),
        Operator::NotEquals => !values_equal(field, &rule.value),
        Operator::GreaterThan => match (field.and_then(as_number), as_number(&rule.value)) {
            (Some(a), Some(b)) => a > b,
            _ => false,
        },
        Operator::LessThan => match (field.and_then(as_number), as_number(&rule.value)) {
            (Some(a), Some(b)) => a < b,
            _ => false,
        },
        Operator::Contains => string_form(field)
            .to_lowercase()
            .contains(&string_form(Some(&rule.value)).to_lowercase()),
        Operator::NotContains => !string_form(field)
            .to_lowercase()
            .contains(&string_form(Some(&rule.value)).to_lowercase()),
    }
}

/// Resolve a dot path; numeric segments index into arrays
fn field_value<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(root, |value, key| match value {
        Value::Object(map) => map.get(key),
        Value::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

fn values_equal(field: Option<&Value>, expected: &Value) -> bool {
    match field {
        None => false,
        Some(actual) => match (actual.as_f64(), expected.as_f64()) {
            (Some(a), Some(b)) => a == b,
            _ => actual == expected,
        },
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

fn string_form(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn set_field(root: &mut Value, path: &str, new_value: Value) {
    let mut current = root;
    let mut segments = path.split('.').peekable();

    while let Some(key) = segments.next() {
        if !current.is_object() {
            *current = Value::Object(Map::new());
        }
        let Value::Object(map) = current else {
            return;
        };

        if segments.peek().is_none() {
            map.insert(key.to_string(), new_value);
            return;
        }
        current = map
            .entry(key.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }
}

fn apply_transformation(tx: Transaction, parameters: &Map<String, Value>, rule_id: &str) -> Transaction {
    if parameters.is_empty() {
        return tx;
    }

    let mut value = match serde_json::to_value(&tx) {
        Ok(v) => v,
        Err(e) => {
            warn!("Rule {}: cannot serialize transaction for transform: {}", rule_id, e);
            return tx;
        }
    };

    for (path, new_value) in parameters {
        set_field(&mut value, path, new_value.clone());
    }

    match serde_json::from_value::<Transaction>(value) {
        Ok(transformed) => transformed,
        Err(e) => {
            warn!("Rule {}: transform produced an invalid transaction: {}", rule_id, e);
            tx
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::transaction::{TokenInfo, TransactionStatus, TransactionType};
    use serde_json::json;

    fn tx(symbol: &str, amount: f64, tx_type: TransactionType) -> Transaction {
        Transaction {
            signature: "5h6xBEauJ3PK6SWCZ1PGjBvj8vDdWG3KpwATGy1ARAXFSDwt8GFXM7W5Ncn16wmqokgpiKRLuS83KUxyZyv2sUYv".to_string(),
            timestamp: 1_700_000_000_000,
            tx_type,
            amount,
            token: TokenInfo {
                address: "Mint111".to_string(),
                symbol: symbol.to_string(),
                name: format!("{} token", symbol),
                decimals: 6,
                ..Default::default()
            },
            from: "WalletA".to_string(),
            to: "WalletB".to_string(),
            fee: 0.000005,
            status: TransactionStatus::Confirmed,
            price: None,
        }
    }

    fn rule(id: &str, priority: i32, condition: FilterCondition, action: FilterAction) -> FilterRule {
        FilterRule {
            id: id.to_string(),
            name: id.to_string(),
            description: String::new(),
            enabled: true,
            priority,
            condition,
            action,
        }
    }

    fn single(field: &str, operator: Operator, value: Value) -> FilterCondition {
        FilterCondition {
            kind: ConditionType::And,
            rules: vec![ConditionRule::new(field, operator, value)],
        }
    }

    #[test]
    fn test_default_rules_sorted() {
        let engine = FilterRulesEngine::new();
        let ids: Vec<&str> = engine.all_rules().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(
            ids,
            vec!["exclude-spam-tokens", "flag-large-transactions", "include-trading-pairs"]
        );
    }

    #[test]
    fn test_normal_swap_passes_defaults() {
        let engine = FilterRulesEngine::new();
        let outcome = engine.apply_rules(&tx("BONK", 50.0, TransactionType::Swap));
        assert!(outcome.include);
        assert!(outcome.flags.is_empty());
    }

    #[test]
    fn test_spam_symbol_excluded_case_insensitive() {
        let engine = FilterRulesEngine::new();
        let outcome = engine.apply_rules(&tx("FreeSpamCoin", 50.0, TransactionType::Swap));
        assert!(!outcome.include);
    }

    #[test]
    fn test_dust_amount_excluded() {
        let engine = FilterRulesEngine::new();
        let outcome = engine.apply_rules(&tx("BONK", 0.0001, TransactionType::Transfer));
        assert!(!outcome.include);
    }

    #[test]
    fn test_large_transaction_flagged() {
        let engine = FilterRulesEngine::new();
        let outcome = engine.apply_rules(&tx("BONK", 5_000.0, TransactionType::Swap));
        assert!(outcome.include);
        assert_eq!(outcome.flags, vec!["large_transaction".to_string()]);
    }

    #[test]
    fn test_disabled_rule_skipped() {
        let mut engine = FilterRulesEngine::new();
        engine.toggle_rule("exclude-spam-tokens", false).unwrap();
        let outcome = engine.apply_rules(&tx("SPAM", 50.0, TransactionType::Swap));
        assert!(outcome.include);
        assert_eq!(engine.active_rules().len(), 2);
    }

    #[test]
    fn test_duplicate_and_missing_ids() {
        let mut engine = FilterRulesEngine::new();
        let dup = default_rules().remove(0);
        assert_eq!(
            engine.add_rule(dup),
            Err(RulesError::DuplicateRule("exclude-spam-tokens".to_string()))
        );
        assert!(matches!(
            engine.toggle_rule("nope", true),
            Err(RulesError::RuleNotFound(_))
        ));
        assert!(!engine.remove_rule("nope"));
        assert!(engine.remove_rule("include-trading-pairs"));
        assert_eq!(engine.all_rules().len(), 2);
    }

    #[test]
    fn test_update_rule_resorts() {
        let mut engine = FilterRulesEngine::new();
        engine
            .update_rule(
                "include-trading-pairs",
                RuleUpdate {
                    priority: Some(0),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(engine.all_rules()[0].id, "include-trading-pairs");
    }

    #[test]
    fn test_equal_priority_keeps_insertion_order() {
        let mut engine = FilterRulesEngine::empty();
        let cond = single("amount", Operator::GreaterThan, json!(0));
        engine.add_rule(rule("b", 5, cond.clone(), FilterAction::flag("b"))).unwrap();
        engine.add_rule(rule("a", 5, cond.clone(), FilterAction::flag("a"))).unwrap();
        engine.add_rule(rule("first", 1, cond, FilterAction::flag("first"))).unwrap();

        let outcome = engine.apply_rules(&tx("X", 1.0, TransactionType::Swap));
        assert_eq!(outcome.flags, vec!["first", "b", "a"]);
    }

    #[test]
    fn test_operators() {
        let t = serde_json::to_value(tx("BONK", 42.0, TransactionType::Swap)).unwrap();
        let check = |field: &str, op: Operator, value: Value| {
            evaluate_rule(&ConditionRule::new(field, op, value), &t)
        };

        assert!(check("type", Operator::Equals, json!("SWAP")));
        assert!(check("amount", Operator::Equals, json!(42)));
        assert!(check("type", Operator::NotEquals, json!("BURN")));
        assert!(check("amount", Operator::GreaterThan, json!("41.5")));
        assert!(!check("amount", Operator::GreaterThan, json!("abc")));
        assert!(check("fee", Operator::LessThan, json!(0.01)));
        assert!(check("token.name", Operator::Contains, json!("bonk")));
        assert!(check("token.symbol", Operator::NotContains, json!("usdc")));
        // missing fields
        assert!(!check("token.price", Operator::Equals, json!(null)));
        assert!(!check("token.price", Operator::GreaterThan, json!(0)));
        assert!(check("memo", Operator::NotContains, json!("x")));
    }

    #[test]
    fn test_or_and_semantics_with_empty_rules() {
        let t = serde_json::to_value(tx("BONK", 1.0, TransactionType::Swap)).unwrap();
        let and = FilterCondition { kind: ConditionType::And, rules: vec![] };
        let or = FilterCondition { kind: ConditionType::Or, rules: vec![] };
        assert!(evaluate_condition(&and, &t));
        assert!(!evaluate_condition(&or, &t));
    }

    #[test]
    fn test_transform_overwrites_fields() {
        let mut engine = FilterRulesEngine::empty();
        let mut params = Map::new();
        params.insert("token.symbol".to_string(), json!("WSOL"));
        params.insert("to".to_string(), json!("Relabelled"));
        engine
            .add_rule(rule(
                "relabel",
                1,
                single("token.symbol", Operator::Equals, json!("SOL")),
                FilterAction { kind: ActionType::Transform, parameters: params },
            ))
            .unwrap();

        let outcome = engine.apply_rules(&tx("SOL", 1.0, TransactionType::Transfer));
        assert_eq!(outcome.transformed.token.symbol, "WSOL");
        assert_eq!(outcome.transformed.to, "Relabelled");
    }

    #[test]
    fn test_invalid_transform_keeps_transaction() {
        let mut engine = FilterRulesEngine::empty();
        let mut params = Map::new();
        params.insert("amount".to_string(), json!("not a number"));
        engine
            .add_rule(rule(
                "broken",
                1,
                single("amount", Operator::GreaterThan, json!(0)),
                FilterAction { kind: ActionType::Transform, parameters: params },
            ))
            .unwrap();

        let original = tx("SOL", 3.0, TransactionType::Transfer);
        let outcome = engine.apply_rules(&original);
        assert_eq!(outcome.transformed, original);
    }

    #[test]
    fn test_conditions_see_original_transaction() {
        let mut engine = FilterRulesEngine::empty();
        let mut params = Map::new();
        params.insert("amount".to_string(), json!(0.0));
        engine
            .add_rule(rule(
                "zero-out",
                1,
                single("amount", Operator::GreaterThan, json!(0)),
                FilterAction { kind: ActionType::Transform, parameters: params },
            ))
            .unwrap();
        engine
            .add_rule(rule(
                "flag-positive",
                2,
                single("amount", Operator::GreaterThan, json!(0)),
                FilterAction::flag("positive"),
            ))
            .unwrap();

        let outcome = engine.apply_rules(&tx("SOL", 3.0, TransactionType::Transfer));
        assert_eq!(outcome.transformed.amount, 0.0);
        assert_eq!(outcome.flags, vec!["positive"]);
    }

    #[test]
    fn test_rule_deserializes_from_toml_shape() {
        let rule: FilterRule = serde_json::from_value(json!({
            "id": "whale-watch",
            "name": "Whale watch",
            "priority": 4,
            "condition": {
                "type": "AND",
                "rules": [{"field": "amount", "operator": "greater_than", "value": 10000}]
            },
            "action": {"type": "flag", "parameters": {"flag": "whale"}}
        }))
        .unwrap();
        assert!(rule.enabled);
        assert_eq!(rule.condition.rules[0].operator, Operator::GreaterThan);
        assert_eq!(rule.action.kind, ActionType::Flag);
    }
}
