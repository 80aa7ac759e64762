//! Hand-written port fakes that record calls and return canned responses.
//! Used by integration tests and the offline CLI paths.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use crate::domain::{TokenInfo, Transaction, WalletSummary};
use crate::ports::{
    Notification, NotifierPort, NotifyError, PriceError, PricePort, WalletDataError,
    WalletDataPort,
};

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Wallet data fake keyed by address
#[derive(Debug, Default, Clone)]
pub struct FakeWalletData {
    calls: Arc<Mutex<Vec<String>>>,
    wallets: Arc<Mutex<HashMap<String, WalletSummary>>>,
    transactions: Arc<Mutex<HashMap<String, Vec<Transaction>>>>,
}

impl FakeWalletData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_wallet(self, summary: WalletSummary) -> Self {
        lock(&self.wallets).insert(summary.address.clone(), summary);
        self
    }

    pub fn with_transactions(self, address: &str, txs: Vec<Transaction>) -> Self {
        lock(&self.transactions).insert(address.to_string(), txs);
        self
    }

    /// Recorded calls as `method:address`
    pub fn get_calls(&self) -> Vec<String> {
        lock(&self.calls).clone()
    }
}

#[async_trait]
impl WalletDataPort for FakeWalletData {
    async fn get_wallet_info(&self, address: &str) -> Result<WalletSummary, WalletDataError> {
        lock(&self.calls).push(format!("get_wallet_info:{}", address));
        lock(&self.wallets)
            .get(address)
            .cloned()
            .ok_or_else(|| WalletDataError::NotFound(address.to_string()))
    }

    async fn get_recent_transactions(
        &self,
        address: &str,
        limit: usize,
    ) -> Result<Vec<Transaction>, WalletDataError> {
        lock(&self.calls).push(format!("get_recent_transactions:{}", address));
        let txs = lock(&self.transactions)
            .get(address)
            .cloned()
            .unwrap_or_default();
        Ok(txs.into_iter().take(limit).collect())
    }
}

/// Price fake; unknown mints return `PriceError::NotFound`
#[derive(Debug, Default, Clone)]
pub struct FakePriceSource {
    calls: Arc<Mutex<Vec<String>>>,
    prices: Arc<Mutex<HashMap<String, f64>>>,
}

impl FakePriceSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_price(self, mint: &str, price: f64) -> Self {
        lock(&self.prices).insert(mint.to_string(), price);
        self
    }

    pub fn get_calls(&self) -> Vec<String> {
        lock(&self.calls).clone()
    }
}

#[async_trait]
impl PricePort for FakePriceSource {
    async fn get_price(&self, mint: &str) -> Result<f64, PriceError> {
        lock(&self.calls).push(mint.to_string());
        lock(&self.prices)
            .get(mint)
            .copied()
            .ok_or_else(|| PriceError::NotFound(mint.to_string()))
    }

    async fn get_token_info(&self, mint: &str) -> Result<TokenInfo, PriceError> {
        let price = self.get_price(mint).await?;
        Ok(TokenInfo {
            price: Some(price),
            ..TokenInfo::with_address(mint)
        })
    }
}

/// Notifier that keeps everything it was asked to deliver
#[derive(Debug, Default, Clone)]
pub struct RecordingNotifier {
    delivered: Arc<Mutex<Vec<Notification>>>,
    fail: bool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Notifier whose deliveries always fail
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn delivered(&self) -> Vec<Notification> {
        lock(&self.delivered).clone()
    }

    pub fn messages(&self) -> Vec<String> {
        lock(&self.delivered).iter().map(|n| n.message.clone()).collect()
    }
}

#[async_trait]
impl NotifierPort for RecordingNotifier {
    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
        if self.fail {
            return Err(NotifyError::Delivery("recording notifier set to fail".to_string()));
        }
        lock(&self.delivered).push(notification.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fake_wallet_data() {
        let fake = FakeWalletData::new();
        let result = fake.get_wallet_info("W1").await;
        assert!(matches!(result, Err(WalletDataError::NotFound(_))));
        assert!(fake.get_recent_transactions("W1", 5).await.unwrap().is_empty());
        assert_eq!(
            fake.get_calls(),
            vec!["get_wallet_info:W1".to_string(), "get_recent_transactions:W1".to_string()]
        );
    }

    #[tokio::test]
    async fn test_fake_price_source() {
        let fake = FakePriceSource::new().with_price("Mint", 1.5);
        assert_eq!(fake.get_price("Mint").await.unwrap(), 1.5);
        assert_eq!(fake.get_token_info("Mint").await.unwrap().price, Some(1.5));
        assert!(fake.get_price("Other").await.is_err());
    }
}
