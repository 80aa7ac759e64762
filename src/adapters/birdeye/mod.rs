//! Birdeye Adapter
//!
//! Token metadata and USD prices from the Birdeye public API.

mod client;
mod types;

pub use client::{BirdeyeClient, BirdeyeConfig, BirdeyeError, DEFAULT_BASE_URL};
pub use types::{PriceData, TokenOverview};
