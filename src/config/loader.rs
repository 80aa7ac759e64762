//! Configuration Loader
//!
//! Loads and validates configuration from TOML files matching config/lemora.toml.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::adapters::birdeye::BirdeyeConfig;
use crate::adapters::helius::{HeliusConfig, StreamConfig};
use crate::application::TrackerSettings;
use crate::domain::{FilterRule, FilterRulesEngine};

/// Main configuration structure matching config/lemora.toml
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub helius: HeliusSection,
    #[serde(default)]
    pub birdeye: BirdeyeSection,
    #[serde(default)]
    pub jupiter: JupiterSection,
    #[serde(default)]
    pub solana: SolanaSection,
    #[serde(default)]
    pub websocket: WebsocketSection,
    #[serde(default)]
    pub tracker: TrackerSection,
    #[serde(default)]
    pub logging: LoggingSection,
    #[serde(default)]
    pub alerts: AlertsSection,
    /// Extra rules appended to the engine
    #[serde(default)]
    pub filter_rules: Vec<FilterRule>,
}

/// Helius REST and websocket configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HeliusSection {
    /// API key (prefer HELIUS_API_KEY in .env)
    pub api_key: String,
    pub base_url: String,
    pub ws_url: String,
    pub timeout_secs: u64,
    /// Attempts per REST request
    pub retry_attempts: u32,
}

impl Default for HeliusSection {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: crate::adapters::helius::DEFAULT_BASE_URL.to_string(),
            ws_url: crate::adapters::helius::DEFAULT_WS_URL.to_string(),
            timeout_secs: 10,
            retry_attempts: 3,
        }
    }
}

/// Birdeye API configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BirdeyeSection {
    /// API key (prefer BIRDEYE_API_KEY in .env)
    pub api_key: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for BirdeyeSection {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: crate::adapters::birdeye::DEFAULT_BASE_URL.to_string(),
            timeout_secs: 10,
        }
    }
}

/// Jupiter price API configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct JupiterSection {
    pub price_url: String,
    pub timeout_secs: u64,
}

impl Default for JupiterSection {
    fn default() -> Self {
        Self {
            price_url: crate::adapters::jupiter::JUPITER_PRICE_API.to_string(),
            timeout_secs: 10,
        }
    }
}

/// Solana RPC configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SolanaSection {
    /// RPC endpoint (use private RPC for production)
    pub rpc_url: String,
}

impl Default for SolanaSection {
    fn default() -> Self {
        Self {
            rpc_url: "https://api.mainnet-beta.solana.com".to_string(),
        }
    }
}

/// Websocket stream configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WebsocketSection {
    /// Connect the live stream in `run`
    pub enabled: bool,
    pub auto_reconnect: bool,
    /// Base reconnect delay, doubled per attempt
    pub reconnect_interval_ms: u64,
    /// 0 = unlimited
    pub max_reconnect_attempts: u32,
    pub max_reconnect_delay_ms: u64,
    /// Rounded up to whole seconds (0 = no pings)
    pub heartbeat_interval_ms: u64,
    pub connect_timeout_ms: u64,
    pub message_queue_size: usize,
    pub max_message_size: usize,
}

impl Default for WebsocketSection {
    fn default() -> Self {
        Self {
            enabled: true,
            auto_reconnect: true,
            reconnect_interval_ms: 5000,
            max_reconnect_attempts: 10,
            max_reconnect_delay_ms: 30_000,
            heartbeat_interval_ms: 30_000,
            connect_timeout_ms: 10_000,
            message_queue_size: 1000,
            max_message_size: 1024 * 1024,
        }
    }
}

/// Tracker behavior configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TrackerSection {
    /// Directory holding the JSON store (supports ~)
    pub data_dir: String,
    pub max_wallets: usize,
    pub refresh_interval_secs: u64,
    pub notification_cleanup_secs: u64,
    pub notification_retention_hours: u64,
    /// Streamed transactions below this |amount| are dropped
    pub min_amount_filter: f64,
    /// |amount| above which a transaction is notified
    pub significant_amount: f64,
    /// USD trade value at or above which a transaction is notified
    pub significant_value_usd: f64,
    pub default_transaction_limit: usize,
    /// Install the built-in filter rules
    pub enable_default_rules: bool,
    /// Look up missing prices for streamed transactions
    pub enrich_prices: bool,
}

impl Default for TrackerSection {
    fn default() -> Self {
        Self {
            data_dir: "~/.lemora".to_string(),
            max_wallets: crate::domain::MAX_WALLETS,
            refresh_interval_secs: 300,
            notification_cleanup_secs: 3600,
            notification_retention_hours: 24,
            min_amount_filter: 0.0,
            significant_amount: 100.0,
            significant_value_usd: crate::domain::filter::DEFAULT_SIGNIFICANT_VALUE,
            default_transaction_limit: 20,
            enable_default_rules: true,
            enrich_prices: true,
        }
    }
}

/// Logging configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level: "trace", "debug", "info", "warn", "error"
    pub level: String,
    /// Log to file (in addition to stderr)
    pub log_to_file: bool,
    /// Log file path
    pub log_file: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            log_to_file: false,
            log_file: "logs/lemora.log".to_string(),
        }
    }
}

/// Alerts configuration section (optional)
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AlertsSection {
    /// Post notifications to a Discord-compatible webhook
    #[serde(default)]
    pub webhook_enabled: bool,
    #[serde(default)]
    pub webhook_url: String,
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Upper bound for `helius.retry_attempts`
pub const MAX_RETRY_ATTEMPTS: u32 = 10;

/// Load configuration from a TOML file, apply environment overrides and validate
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut config: Config = toml::from_str(&content)?;
    config.apply_env_overrides(|name| std::env::var(name).ok());
    config.validate()?;
    Ok(config)
}

impl Config {
    /// Fill secrets from the environment.
    ///
    /// API keys are taken from the environment only when the file leaves them
    /// empty. SOLANA_RPC_URL always wins over the file.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if self.helius.api_key.is_empty() {
            if let Some(key) = non_empty("HELIUS_API_KEY") {
                self.helius.api_key = key;
            }
        }
        if self.birdeye.api_key.is_empty() {
            if let Some(key) = non_empty("BIRDEYE_API_KEY") {
                self.birdeye.api_key = key;
            }
        }
        if let Some(url) = non_empty("SOLANA_RPC_URL") {
            self.solana.rpc_url = url;
        }
    }

    /// Validate all configuration parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.solana.rpc_url.is_empty() {
            return Err(ConfigError::ValidationError(
                "rpc_url cannot be empty".to_string(),
            ));
        }

        if self.helius.base_url.is_empty() {
            return Err(ConfigError::ValidationError(
                "helius.base_url cannot be empty".to_string(),
            ));
        }

        if self.helius.retry_attempts == 0 || self.helius.retry_attempts > MAX_RETRY_ATTEMPTS {
            return Err(ConfigError::ValidationError(format!(
                "helius.retry_attempts must be between 1 and {}",
                MAX_RETRY_ATTEMPTS
            )));
        }

        if self.jupiter.price_url.is_empty() {
            return Err(ConfigError::ValidationError(
                "jupiter.price_url cannot be empty".to_string(),
            ));
        }

        // Validate websocket section
        if self.websocket.enabled && self.helius.ws_url.is_empty() {
            return Err(ConfigError::ValidationError(
                "helius.ws_url cannot be empty when the websocket is enabled".to_string(),
            ));
        }

        if self.websocket.reconnect_interval_ms == 0 {
            return Err(ConfigError::ValidationError(
                "reconnect_interval_ms must be > 0".to_string(),
            ));
        }

        if self.websocket.max_reconnect_delay_ms < self.websocket.reconnect_interval_ms {
            return Err(ConfigError::ValidationError(format!(
                "max_reconnect_delay_ms ({}) must be >= reconnect_interval_ms ({})",
                self.websocket.max_reconnect_delay_ms, self.websocket.reconnect_interval_ms
            )));
        }

        if self.websocket.connect_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "connect_timeout_ms must be > 0".to_string(),
            ));
        }

        if self.websocket.message_queue_size == 0 {
            return Err(ConfigError::ValidationError(
                "message_queue_size must be > 0".to_string(),
            ));
        }

        // Validate tracker section
        if self.tracker.max_wallets == 0 {
            return Err(ConfigError::ValidationError(
                "max_wallets must be > 0".to_string(),
            ));
        }

        if self.tracker.refresh_interval_secs == 0 || self.tracker.notification_cleanup_secs == 0 {
            return Err(ConfigError::ValidationError(
                "refresh and cleanup intervals must be > 0".to_string(),
            ));
        }

        if self.tracker.min_amount_filter < 0.0 {
            return Err(ConfigError::ValidationError(format!(
                "min_amount_filter must be >= 0, got {}",
                self.tracker.min_amount_filter
            )));
        }

        if self.tracker.default_transaction_limit == 0 {
            return Err(ConfigError::ValidationError(
                "default_transaction_limit must be > 0".to_string(),
            ));
        }

        // Validate logging
        if !LOG_LEVELS.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "unknown log level '{}'",
                self.logging.level
            )));
        }

        if self.logging.log_to_file && self.logging.log_file.is_empty() {
            return Err(ConfigError::ValidationError(
                "log_file cannot be empty when log_to_file is set".to_string(),
            ));
        }

        // Validate alerts
        if self.alerts.webhook_enabled && self.alerts.webhook_url.is_empty() {
            return Err(ConfigError::ValidationError(
                "webhook_url cannot be empty when webhook_enabled is set".to_string(),
            ));
        }

        // Rules must build into an engine
        self.rules_engine()?;

        Ok(())
    }

    /// Data directory with `~` expanded
    pub fn data_dir(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.tracker.data_dir).to_string())
    }

    /// Log file path with `~` expanded
    pub fn log_file(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.logging.log_file).to_string())
    }

    /// Rules engine with the defaults (unless disabled) plus configured rules
    pub fn rules_engine(&self) -> Result<FilterRulesEngine, ConfigError> {
        let mut engine = if self.tracker.enable_default_rules {
            FilterRulesEngine::new()
        } else {
            FilterRulesEngine::empty()
        };

        for rule in &self.filter_rules {
            if rule.id.trim().is_empty() {
                return Err(ConfigError::ValidationError(
                    "filter rule id cannot be empty".to_string(),
                ));
            }
            engine
                .add_rule(rule.clone())
                .map_err(|e| ConfigError::ValidationError(e.to_string()))?;
        }

        Ok(engine)
    }
}

impl From<&Config> for StreamConfig {
    fn from(config: &Config) -> Self {
        StreamConfig {
            url: config.helius.ws_url.clone(),
            api_key: config.helius.api_key.clone(),
            auto_reconnect: config.websocket.auto_reconnect,
            max_reconnect_attempts: config.websocket.max_reconnect_attempts,
            reconnect_base_delay_ms: config.websocket.reconnect_interval_ms,
            max_reconnect_delay_ms: config.websocket.max_reconnect_delay_ms,
            heartbeat_interval_secs: config.websocket.heartbeat_interval_ms.div_ceil(1000),
            connect_timeout_ms: config.websocket.connect_timeout_ms,
            channel_buffer_size: config.websocket.message_queue_size,
            max_message_size: config.websocket.max_message_size,
        }
    }
}

impl From<&Config> for HeliusConfig {
    fn from(config: &Config) -> Self {
        HeliusConfig {
            base_url: config.helius.base_url.clone(),
            api_key: config.helius.api_key.clone(),
            timeout: Duration::from_secs(config.helius.timeout_secs),
            max_retries: config.helius.retry_attempts,
        }
    }
}

impl From<&Config> for BirdeyeConfig {
    fn from(config: &Config) -> Self {
        BirdeyeConfig {
            base_url: config.birdeye.base_url.clone(),
            api_key: config.birdeye.api_key.clone(),
            timeout: Duration::from_secs(config.birdeye.timeout_secs),
        }
    }
}

impl From<&Config> for TrackerSettings {
    fn from(config: &Config) -> Self {
        let tracker = &config.tracker;
        TrackerSettings {
            max_wallets: tracker.max_wallets,
            default_transaction_limit: tracker.default_transaction_limit,
            min_amount_filter: tracker.min_amount_filter,
            significant_amount: tracker.significant_amount,
            significant_value_usd: tracker.significant_value_usd,
            enrich_prices: tracker.enrich_prices,
            refresh_interval: Duration::from_secs(tracker.refresh_interval_secs),
            cleanup_interval: Duration::from_secs(tracker.notification_cleanup_secs),
            notification_retention: chrono::Duration::hours(
                tracker.notification_retention_hours as i64,
            ),
        }
    }
}
