//! Configuration Module
//!
//! Loads and validates configuration from TOML files.

pub mod loader;

pub use loader::{
    load_config, AlertsSection, BirdeyeSection, Config, ConfigError, HeliusSection,
    JupiterSection, LoggingSection, SolanaSection, TrackerSection, WebsocketSection,
};
