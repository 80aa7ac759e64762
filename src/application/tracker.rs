//! Tracker Service
//!
//! Background service behind the runtime protocol. Owns the watchlist, keeps
//! the stream subscribed, filters streamed transactions through the rules
//! engine and surfaces notifications.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use super::messages::{PendingRequest, TrackerRequest, TrackerResponse, TrackerUpdate};
use super::notifications::{default_retention, NotificationCenter};
use crate::adapters::helius::{StreamEvent, WalletStream};
use crate::adapters::store::{wallet_key, CachedWalletInfo, JsonStore, StoreError, WATCHED_WALLETS_KEY};
use crate::domain::{
    short_address, validate_wallet_address, AddressError, FilterRulesEngine, QuickClassifier,
    Transaction, TransactionType, Watchlist, WatchlistError, MAX_WALLETS,
};
use crate::ports::{NotifierPort, PricePort, WalletDataError, WalletDataPort};

/// Mint used to price native SOL
pub const WRAPPED_SOL_MINT: &str = "So11111111111111111111111111111111111111112";

const UPDATE_CHANNEL_SIZE: usize = 256;

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error(transparent)]
    InvalidAddress(#[from] AddressError),
    #[error(transparent)]
    Watchlist(#[from] WatchlistError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    WalletData(#[from] WalletDataError),
}

/// Tunables for the tracker loop
#[derive(Debug, Clone)]
pub struct TrackerSettings {
    pub max_wallets: usize,
    pub default_transaction_limit: usize,
    /// Streamed transactions with |amount| below this are dropped (0 = off)
    pub min_amount_filter: f64,
    pub significant_amount: f64,
    pub significant_value_usd: f64,
    pub enrich_prices: bool,
    pub refresh_interval: Duration,
    pub cleanup_interval: Duration,
    pub notification_retention: chrono::Duration,
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            max_wallets: MAX_WALLETS,
            default_transaction_limit: 20,
            min_amount_filter: 0.0,
            significant_amount: 100.0,
            significant_value_usd: crate::domain::filter::DEFAULT_SIGNIFICANT_VALUE,
            enrich_prices: true,
            refresh_interval: Duration::from_secs(5 * 60),
            cleanup_interval: Duration::from_secs(60 * 60),
            notification_retention: default_retention(),
        }
    }
}

pub struct TrackerService {
    settings: TrackerSettings,
    watchlist: Watchlist,
    store: JsonStore,
    wallet_data: Arc<dyn WalletDataPort>,
    prices: Option<Arc<dyn PricePort>>,
    notifications: NotificationCenter,
    rules: FilterRulesEngine,
    classifier: QuickClassifier,
    stream: Option<WalletStream>,
    updates: broadcast::Sender<TrackerUpdate>,
}

impl TrackerService {
    pub fn new(settings: TrackerSettings, store: JsonStore, wallet_data: Arc<dyn WalletDataPort>) -> Self {
        let (updates, _) = broadcast::channel(UPDATE_CHANNEL_SIZE);
        let mut notifications = NotificationCenter::new(settings.notification_retention);
        notifications.set_updates(updates.clone());

        Self {
            watchlist: Watchlist::new(settings.max_wallets),
            settings,
            store,
            wallet_data,
            prices: None,
            notifications,
            rules: FilterRulesEngine::new(),
            classifier: QuickClassifier::new(),
            stream: None,
            updates,
        }
    }

    pub fn with_prices(mut self, prices: Arc<dyn PricePort>) -> Self {
        self.prices = Some(prices);
        self
    }

    pub fn with_rules(mut self, rules: FilterRulesEngine) -> Self {
        self.rules = rules;
        self
    }

    pub fn with_stream(mut self, stream: WalletStream) -> Self {
        self.stream = Some(stream);
        self
    }

    pub fn with_notifier(mut self, sink: Arc<dyn NotifierPort>) -> Self {
        self.notifications.add_sink(sink);
        self
    }

    pub fn subscribe_updates(&self) -> broadcast::Receiver<TrackerUpdate> {
        self.updates.subscribe()
    }

    pub fn watchlist(&self) -> &Watchlist {
        &self.watchlist
    }

    pub fn notifications(&self) -> &NotificationCenter {
        &self.notifications
    }

    pub fn rules(&self) -> &FilterRulesEngine {
        &self.rules
    }

    pub fn settings(&self) -> &TrackerSettings {
        &self.settings
    }

    /// Load the persisted watchlist and queue stream subscriptions.
    /// Returns the number of watched wallets.
    pub async fn initialize(&mut self) -> Result<usize, TrackerError> {
        let stored: Vec<String> = self.store.get(WATCHED_WALLETS_KEY)?.unwrap_or_default();
        let stored_count = stored.len();
        self.watchlist = Watchlist::from_addresses(stored, self.settings.max_wallets);

        if self.watchlist.len() < stored_count {
            warn!(
                "Dropped {} invalid or excess stored wallets",
                stored_count - self.watchlist.len()
            );
        }

        for address in self.watchlist.addresses().to_vec() {
            self.subscribe_stream(&address).await;
        }

        info!("Tracker initialized with {} wallets", self.watchlist.len());
        Ok(self.watchlist.len())
    }

    pub async fn handle_request(&mut self, request: TrackerRequest) -> TrackerResponse {
        let kind = request.kind();
        match self.dispatch(request).await {
            Ok(response) => response,
            Err(e) => {
                warn!("{} failed: {}", kind, e);
                TrackerResponse::error(e.to_string())
            }
        }
    }

    async fn dispatch(&mut self, request: TrackerRequest) -> Result<TrackerResponse, TrackerError> {
        match request {
            TrackerRequest::AddWallet { address } => {
                self.add_wallet(&address).await?;
                Ok(TrackerResponse::ok())
            }
            TrackerRequest::RemoveWallet { address } => {
                self.remove_wallet(&address).await?;
                Ok(TrackerResponse::ok())
            }
            TrackerRequest::GetWalletInfo { address } => {
                let info = self.wallet_data.get_wallet_info(&address).await?;
                Ok(TrackerResponse::with_data(&info))
            }
            TrackerRequest::GetTransactions {
                address,
                limit,
                filter,
            } => {
                let limit = limit.unwrap_or(self.settings.default_transaction_limit);
                let mut transactions = self
                    .wallet_data
                    .get_recent_transactions(&address, limit)
                    .await?;
                if let Some(filter) = filter {
                    transactions = filter.apply(transactions);
                }
                Ok(TrackerResponse::with_data(&transactions))
            }
            TrackerRequest::GetWatchedWallets => {
                Ok(TrackerResponse::with_data(&self.watchlist.addresses()))
            }
        }
    }

    /// Returns false when the wallet was already watched
    pub async fn add_wallet(&mut self, address: &str) -> Result<bool, TrackerError> {
        let address = validate_wallet_address(address)?;
        if !self.watchlist.add(&address)? {
            debug!("Wallet {} already tracked", address);
            return Ok(false);
        }

        if let Err(e) = self.persist_watchlist() {
            self.watchlist.remove(&address);
            return Err(e);
        }

        self.subscribe_stream(&address).await;
        self.notifications
            .notify(
                format!("Started tracking wallet: {}", short_address(&address)),
                Vec::new(),
            )
            .await;
        Ok(true)
    }

    /// Returns false when the wallet was not watched
    pub async fn remove_wallet(&mut self, address: &str) -> Result<bool, TrackerError> {
        let address = address.trim().to_string();
        if !self.watchlist.remove(&address) {
            debug!("Wallet {} was not tracked", address);
            return Ok(false);
        }

        self.persist_watchlist()?;

        if let Some(stream) = &self.stream {
            if let Err(e) = stream.unsubscribe(&address).await {
                warn!("Failed to unsubscribe {}: {}", address, e);
            }
        }

        self.notifications
            .notify(
                format!("Stopped tracking wallet: {}", short_address(&address)),
                Vec::new(),
            )
            .await;
        Ok(true)
    }

    fn persist_watchlist(&self) -> Result<(), TrackerError> {
        self.store
            .set(WATCHED_WALLETS_KEY, &self.watchlist.addresses())?;
        Ok(())
    }

    async fn subscribe_stream(&self, address: &str) {
        if let Some(stream) = &self.stream {
            if let Err(e) = stream.subscribe(address).await {
                warn!("Failed to subscribe {}: {}", address, e);
            }
        }
    }

    pub async fn handle_stream_event(&mut self, event: StreamEvent) {
        match event {
            StreamEvent::Connected { connection_id } => {
                info!("Stream connected ({})", connection_id);
                for address in self.watchlist.addresses().to_vec() {
                    self.subscribe_stream(&address).await;
                }
            }
            StreamEvent::Disconnected {
                reconnect_count,
                clean,
            } => {
                debug!(
                    "Stream disconnected (clean: {}, reconnects: {})",
                    clean, reconnect_count
                );
            }
            StreamEvent::Transaction(tx) => {
                self.process_transaction(tx).await;
            }
            StreamEvent::BalanceUpdate(update) => {
                debug!("Balance update for {}", update.address);
                let _ = self.updates.send(TrackerUpdate::BalanceUpdate(update));
            }
            StreamEvent::PriceUpdate(update) => {
                debug!("Price update {} = {}", update.token_address, update.price);
            }
            StreamEvent::Error { message } => {
                warn!("Stream error: {}", message);
            }
            StreamEvent::Message(raw) => {
                debug!("Unhandled stream message: {}", raw);
            }
            StreamEvent::GaveUp { attempts } => {
                error!("Stream gave up after {} reconnect attempts", attempts);
                self.notifications
                    .notify(
                        format!(
                            "Live updates stopped after {} reconnect attempts",
                            attempts
                        ),
                        Vec::new(),
                    )
                    .await;
            }
        }
    }

    /// Run a streamed transaction through enrichment, rules and thresholds.
    /// Returns the transaction and its flags when it was surfaced.
    pub async fn process_transaction(&mut self, mut tx: Transaction) -> Option<(Transaction, Vec<String>)> {
        self.enrich_price(&mut tx).await;

        let outcome = self.rules.apply_rules(&tx);
        if !outcome.include {
            debug!("Transaction {} excluded by rules", tx.signature);
            return None;
        }
        let tx = outcome.transformed;
        let flags = outcome.flags;

        if self.settings.min_amount_filter > 0.0 && tx.amount.abs() < self.settings.min_amount_filter {
            debug!("Transaction {} below minimum amount", tx.signature);
            return None;
        }

        if !self.is_significant(&tx, &flags) {
            return None;
        }

        self.notifications
            .notify(
                format!("Significant transaction detected on {}", short_address(&tx.from)),
                flags.clone(),
            )
            .await;

        let _ = self.updates.send(TrackerUpdate::TransactionUpdate {
            transaction: tx.clone(),
            flags: flags.clone(),
        });

        Some((tx, flags))
    }

    fn is_significant(&self, tx: &Transaction, flags: &[String]) -> bool {
        tx.amount.abs() > self.settings.significant_amount
            || tx.tx_type == TransactionType::Swap
            || !flags.is_empty()
            || self
                .classifier
                .is_significant_trade(tx, self.settings.significant_value_usd)
    }

    async fn enrich_price(&self, tx: &mut Transaction) {
        if !self.settings.enrich_prices || tx.price.is_some() {
            return;
        }
        let Some(prices) = &self.prices else {
            return;
        };

        let mint = if tx.token.address.is_empty() {
            WRAPPED_SOL_MINT
        } else {
            tx.token.address.as_str()
        };

        match prices.get_price(mint).await {
            Ok(price) => tx.price = Some(price),
            Err(e) => debug!("No price for {}: {}", mint, e),
        }
    }

    /// Refresh and cache summaries for every watched wallet.
    /// Returns how many were refreshed.
    pub async fn refresh_wallet_data(&mut self) -> usize {
        let mut refreshed = 0;

        for address in self.watchlist.addresses().to_vec() {
            let info = match self.wallet_data.get_wallet_info(&address).await {
                Ok(info) => info,
                Err(e) => {
                    warn!("Failed to refresh data for wallet {}: {}", address, e);
                    continue;
                }
            };

            match self
                .store
                .set(&wallet_key(&address), &CachedWalletInfo::new(info, Utc::now()))
            {
                Ok(()) => refreshed += 1,
                Err(e) => warn!("Failed to cache data for wallet {}: {}", address, e),
            }
        }

        debug!("Refreshed {} wallets", refreshed);
        refreshed
    }

    pub fn cleanup_notifications(&mut self) -> usize {
        self.notifications.cleanup(Utc::now())
    }

    /// Event loop. Ends on shutdown or when the request channel closes.
    pub async fn run(
        &mut self,
        mut events: Option<mpsc::Receiver<StreamEvent>>,
        mut requests: mpsc::Receiver<PendingRequest>,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<(), TrackerError> {
        let mut refresh = interval_at(
            Instant::now() + self.settings.refresh_interval,
            self.settings.refresh_interval,
        );
        refresh.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut cleanup = interval_at(
            Instant::now() + self.settings.cleanup_interval,
            self.settings.cleanup_interval,
        );
        cleanup.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!("Tracker running with {} wallets", self.watchlist.len());

        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    info!("Tracker shutting down");
                    break;
                }
                event = next_event(&mut events) => match event {
                    Some(event) => self.handle_stream_event(event).await,
                    None => {
                        warn!("Stream event channel closed");
                        events = None;
                    }
                },
                pending = requests.recv() => match pending {
                    Some(PendingRequest { request, reply }) => {
                        let response = self.handle_request(request).await;
                        if reply.send(response).is_err() {
                            debug!("Requester went away before the reply");
                        }
                    }
                    None => {
                        info!("Request channel closed");
                        break;
                    }
                },
                _ = refresh.tick() => {
                    self.refresh_wallet_data().await;
                }
                _ = cleanup.tick() => {
                    self.cleanup_notifications();
                }
            }
        }

        Ok(())
    }
}

async fn next_event(events: &mut Option<mpsc::Receiver<StreamEvent>>) -> Option<StreamEvent> {
    match events {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}
