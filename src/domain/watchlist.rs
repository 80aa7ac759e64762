//! Watched wallet list
//!
//! Insertion-ordered set of validated wallet addresses with a capacity limit.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::address::{validate_wallet_address, AddressError};

/// Default number of wallets that can be tracked at once
pub const MAX_WALLETS: usize = 10;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WatchlistError {
    #[error("Maximum number of wallets ({0}) reached")]
    LimitReached(usize),
    #[error(transparent)]
    InvalidAddress(#[from] AddressError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Watchlist {
    #[serde(rename = "watchedWallets", default)]
    wallets: Vec<String>,
    #[serde(skip, default = "default_capacity")]
    capacity: usize,
}

fn default_capacity() -> usize {
    MAX_WALLETS
}

impl Default for Watchlist {
    fn default() -> Self {
        Self::new(MAX_WALLETS)
    }
}

impl Watchlist {
    pub fn new(capacity: usize) -> Self {
        Self {
            wallets: Vec::new(),
            capacity,
        }
    }

    /// Rebuild from persisted addresses. Invalid entries are dropped and
    /// anything past `capacity` is truncated.
    pub fn from_addresses(addresses: Vec<String>, capacity: usize) -> Self {
        let mut list = Self::new(capacity);
        for address in addresses {
            let _ = list.add(&address);
        }
        list
    }

    /// Returns `Ok(false)` when the wallet is already watched
    pub fn add(&mut self, address: &str) -> Result<bool, WatchlistError> {
        let address = validate_wallet_address(address)?;
        if self.contains(&address) {
            return Ok(false);
        }
        if self.wallets.len() >= self.capacity {
            return Err(WatchlistError::LimitReached(self.capacity));
        }
        self.wallets.push(address);
        Ok(true)
    }

    pub fn remove(&mut self, address: &str) -> bool {
        let address = address.trim();
        let before = self.wallets.len();
        self.wallets.retain(|w| w != address);
        self.wallets.len() != before
    }

    pub fn contains(&self, address: &str) -> bool {
        self.wallets.iter().any(|w| w == address.trim())
    }

    pub fn addresses(&self) -> &[String] {
        &self.wallets
    }

    pub fn len(&self) -> usize {
        self.wallets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wallets.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
