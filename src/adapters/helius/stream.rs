//! Helius WebSocket Stream
//!
//! Reconnecting websocket client for real-time wallet activity.
//! Tracks wallet subscriptions and replays them after every reconnect.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures_util::{SinkExt, StreamExt};
use rand::Rng;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::{mpsc, RwLock};
use tokio::time::{interval_at, timeout, Instant, MissedTickBehavior};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, warn};

use super::types::{PingFrame, StreamMessage, SubscriptionData, SubscriptionFrame, TransactionStreamData};
use crate::domain::{BalanceUpdate, PriceUpdate, Transaction};

/// Default Helius websocket endpoint
pub const DEFAULT_WS_URL: &str = "wss://api.helius.xyz/v0/websocket";

const DEFAULT_MAX_RECONNECT_ATTEMPTS: u32 = 5;
const RECONNECT_BASE_DELAY_MS: u64 = 1000;
const MAX_RECONNECT_DELAY_MS: u64 = 30000;
const HEARTBEAT_INTERVAL_SECS: u64 = 30;
const CONNECT_TIMEOUT_MS: u64 = 10_000;
const COMMAND_BUFFER_SIZE: usize = 100;
/// Maximum message size in bytes (prevent memory exhaustion)
const MAX_MESSAGE_SIZE: usize = 1_048_576; // 1 MB

const CONNECTION_ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

#[derive(Debug, Error)]
pub enum StreamError {
    #[error("WebSocket connection failed: {0}")]
    ConnectionFailed(String),

    #[error("WebSocket error: {0}")]
    WebSocketError(String),

    #[error("Connection lost and auto-reconnect is disabled")]
    ConnectionLost,

    #[error("Gave up after {0} reconnect attempts")]
    ReconnectExhausted(u32),

    #[error("Failed to parse message: {0}")]
    ParseError(String),

    #[error("Invalid message format: {0}")]
    InvalidMessageFormat(String),

    #[error("Send channel closed")]
    ChannelClosed,

    #[error("Stream already running")]
    AlreadyRunning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    Connecting,
    Connected,
    Disconnected,
    Reconnecting,
    Error,
}

/// Snapshot of the connection
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionInfo {
    pub id: String,
    pub status: ConnectionStatus,
    pub connected_at: Option<DateTime<Utc>>,
    pub last_heartbeat: Option<DateTime<Utc>>,
    /// Watched addresses in subscription order
    pub subscriptions: Vec<String>,
}

/// Events emitted by the WalletStream
#[derive(Debug, Clone)]
pub enum StreamEvent {
    Connected { connection_id: String },
    Disconnected { reconnect_count: u32, clean: bool },
    Transaction(Transaction),
    BalanceUpdate(BalanceUpdate),
    PriceUpdate(PriceUpdate),
    Error { message: String },
    /// Any message kind without a dedicated handler
    Message(Value),
    GaveUp { attempts: u32 },
}

#[derive(Debug, Clone)]
pub struct StreamConfig {
    pub url: String,
    /// Appended as `api-key` query parameter when non-empty
    pub api_key: String,
    pub auto_reconnect: bool,
    /// Maximum reconnection attempts (0 = unlimited)
    pub max_reconnect_attempts: u32,
    pub reconnect_base_delay_ms: u64,
    pub max_reconnect_delay_ms: u64,
    /// Ping interval (0 = no pings)
    pub heartbeat_interval_secs: u64,
    /// Upper bound on the TCP + websocket handshake
    pub connect_timeout_ms: u64,
    pub channel_buffer_size: usize,
    pub max_message_size: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_WS_URL.to_string(),
            api_key: String::new(),
            auto_reconnect: true,
            max_reconnect_attempts: DEFAULT_MAX_RECONNECT_ATTEMPTS,
            reconnect_base_delay_ms: RECONNECT_BASE_DELAY_MS,
            max_reconnect_delay_ms: MAX_RECONNECT_DELAY_MS,
            heartbeat_interval_secs: HEARTBEAT_INTERVAL_SECS,
            connect_timeout_ms: CONNECT_TIMEOUT_MS,
            channel_buffer_size: 1000,
            max_message_size: MAX_MESSAGE_SIZE,
        }
    }
}

impl StreamConfig {
    pub fn connection_url(&self) -> String {
        if self.api_key.is_empty() {
            return self.url.clone();
        }
        let separator = if self.url.contains('?') { '&' } else { '?' };
        format!("{}{}api-key={}", self.url, separator, self.api_key)
    }
}

/// Delay before reconnect attempt `attempt` (1-based): `min(base * 2^(n-1), max)`
pub fn backoff_delay(attempt: u32, base_ms: u64, max_ms: u64) -> Duration {
    let exponent = attempt.saturating_sub(1).min(32);
    let delay = base_ms.saturating_mul(1u64 << exponent);
    Duration::from_millis(delay.min(max_ms))
}

/// `lemora-ws-<unix ms>-<9 random base36 chars>`
pub fn generate_connection_id() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..9)
        .map(|_| CONNECTION_ID_ALPHABET[rng.gen_range(0..CONNECTION_ID_ALPHABET.len())] as char)
        .collect();
    format!("lemora-ws-{}-{}", Utc::now().timestamp_millis(), suffix)
}

pub fn subscription_frame(kind: &str, address: &str) -> String {
    let frame = SubscriptionFrame {
        kind,
        data: SubscriptionData { address },
        timestamp: Utc::now().timestamp_millis(),
    };
    serde_json::to_string(&frame).unwrap_or_default()
}

fn ping_frame() -> String {
    let frame = PingFrame {
        kind: "ping",
        timestamp: Utc::now().timestamp_millis(),
    };
    serde_json::to_string(&frame).unwrap_or_default()
}

enum StreamCommand {
    Subscribe(String),
    Unsubscribe(String),
    Send(Value),
    Shutdown,
}

/// How a connected session ended
enum SessionEnd {
    Shutdown,
    Closed { clean: bool },
}

/// Reconnecting Helius websocket client
///
/// # Example
/// ```ignore
/// let (stream, mut events) = StreamBuilder::new().api_key(key).build();
///
/// let runner = stream.clone();
/// tokio::spawn(async move { runner.run().await });
///
/// stream.subscribe("86xCnPeV69n6t3DnyGvkKobf9FdN2H9oiVDdaMpo2MMY").await?;
/// while let Some(event) = events.recv().await {
///     if let StreamEvent::Transaction(tx) = event {
///         println!("{} {}", tx.signature, tx.amount);
///     }
/// }
/// ```
#[derive(Clone)]
pub struct WalletStream {
    config: StreamConfig,
    event_tx: mpsc::Sender<StreamEvent>,
    command_tx: mpsc::Sender<StreamCommand>,
    command_rx: Arc<RwLock<Option<mpsc::Receiver<StreamCommand>>>>,
    state: Arc<RwLock<ConnectionInfo>>,
    reconnect_count: Arc<RwLock<u32>>,
    is_running: Arc<RwLock<bool>>,
}

impl WalletStream {
    pub fn new(config: StreamConfig) -> (Self, mpsc::Receiver<StreamEvent>) {
        let (event_tx, event_rx) = mpsc::channel(config.channel_buffer_size.max(1));
        let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER_SIZE);

        let state = ConnectionInfo {
            id: generate_connection_id(),
            status: ConnectionStatus::Disconnected,
            connected_at: None,
            last_heartbeat: None,
            subscriptions: Vec::new(),
        };

        let stream = Self {
            config,
            event_tx,
            command_tx,
            command_rx: Arc::new(RwLock::new(Some(command_rx))),
            state: Arc::new(RwLock::new(state)),
            reconnect_count: Arc::new(RwLock::new(0)),
            is_running: Arc::new(RwLock::new(false)),
        };

        (stream, event_rx)
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    /// Track a wallet; subscribing twice sends nothing
    pub async fn subscribe(&self, address: &str) -> Result<(), StreamError> {
        self.command(StreamCommand::Subscribe(address.to_string())).await
    }

    pub async fn unsubscribe(&self, address: &str) -> Result<(), StreamError> {
        self.command(StreamCommand::Unsubscribe(address.to_string())).await
    }

    /// Send an arbitrary JSON frame; dropped with a warning while disconnected
    pub async fn send(&self, payload: Value) -> Result<(), StreamError> {
        self.command(StreamCommand::Send(payload)).await
    }

    /// Close with code 1000 and stop `run`
    pub async fn shutdown(&self) -> Result<(), StreamError> {
        self.command(StreamCommand::Shutdown).await
    }

    async fn command(&self, cmd: StreamCommand) -> Result<(), StreamError> {
        self.command_tx
            .send(cmd)
            .await
            .map_err(|_| StreamError::ChannelClosed)
    }

    pub async fn status(&self) -> ConnectionStatus {
        self.state.read().await.status
    }

    pub async fn connection_info(&self) -> ConnectionInfo {
        self.state.read().await.clone()
    }

    pub async fn subscriptions(&self) -> Vec<String> {
        self.state.read().await.subscriptions.clone()
    }

    pub async fn reconnect_count(&self) -> u32 {
        *self.reconnect_count.read().await
    }

    pub async fn is_running(&self) -> bool {
        *self.is_running.read().await
    }

    /// Main event loop. Returns on shutdown, on a clean server close, or
    /// when reconnecting is no longer allowed.
    pub async fn run(&self) -> Result<(), StreamError> {
        let command_rx = {
            let mut rx_guard = self.command_rx.write().await;
            rx_guard.take().ok_or(StreamError::AlreadyRunning)?
        };

        *self.is_running.write().await = true;
        info!("WalletStream starting, connecting to {}", self.config.url);

        let result = self.run_loop(command_rx).await;

        *self.is_running.write().await = false;
        self.set_status(ConnectionStatus::Disconnected).await;
        info!("WalletStream stopped");

        result
    }

    async fn run_loop(&self, mut command_rx: mpsc::Receiver<StreamCommand>) -> Result<(), StreamError> {
        let mut attempts = 0u32;

        loop {
            self.set_status(if attempts == 0 {
                ConnectionStatus::Connecting
            } else {
                ConnectionStatus::Reconnecting
            })
            .await;

            match self.connect_and_process(&mut command_rx, &mut attempts).await {
                Ok(SessionEnd::Shutdown) => {
                    info!("Shutdown requested, exiting stream loop");
                    return Ok(());
                }
                Ok(SessionEnd::Closed { clean: true }) => {
                    info!("Server closed the connection cleanly");
                    self.emit_state(StreamEvent::Disconnected {
                        reconnect_count: attempts,
                        clean: true,
                    })
                    .await;
                    return Ok(());
                }
                Ok(SessionEnd::Closed { clean: false }) => {
                    warn!("Connection closed uncleanly");
                    self.set_status(ConnectionStatus::Disconnected).await;
                    self.emit_state(StreamEvent::Disconnected {
                        reconnect_count: attempts,
                        clean: false,
                    })
                    .await;
                }
                Err(e) => {
                    error!("WebSocket error: {}", e);
                    self.set_status(ConnectionStatus::Error).await;
                    self.emit_state(StreamEvent::Error {
                        message: e.to_string(),
                    })
                    .await;
                    // A transport failure inside a live session is an unclean disconnect
                    if matches!(e, StreamError::WebSocketError(_)) {
                        self.emit_state(StreamEvent::Disconnected {
                            reconnect_count: attempts,
                            clean: false,
                        })
                        .await;
                    }
                }
            }

            if !self.config.auto_reconnect {
                return Err(StreamError::ConnectionLost);
            }

            if self.config.max_reconnect_attempts > 0 && attempts >= self.config.max_reconnect_attempts {
                error!("Maximum reconnection attempts ({}) reached", attempts);
                self.emit_state(StreamEvent::GaveUp { attempts }).await;
                return Err(StreamError::ReconnectExhausted(attempts));
            }

            attempts += 1;
            *self.reconnect_count.write().await = attempts;

            let delay = backoff_delay(
                attempts,
                self.config.reconnect_base_delay_ms,
                self.config.max_reconnect_delay_ms,
            );
            self.set_status(ConnectionStatus::Reconnecting).await;
            warn!("Reconnecting in {:?} (attempt {})", delay, attempts);

            // Wait before reconnecting, still tracking subscriptions and honoring shutdown
            let sleep = tokio::time::sleep(delay);
            tokio::pin!(sleep);
            loop {
                tokio::select! {
                    _ = &mut sleep => break,
                    cmd = command_rx.recv() => {
                        if self.handle_offline_command(cmd).await {
                            return Ok(());
                        }
                    }
                }
            }
        }
    }

    /// Apply a command while no socket is open. Returns true on shutdown.
    async fn handle_offline_command(&self, cmd: Option<StreamCommand>) -> bool {
        match cmd {
            None | Some(StreamCommand::Shutdown) => return true,
            Some(StreamCommand::Subscribe(address)) => {
                self.track(address).await;
            }
            Some(StreamCommand::Unsubscribe(address)) => {
                self.untrack(&address).await;
            }
            Some(StreamCommand::Send(_)) => {
                warn!("Cannot send data: WebSocket is not connected");
            }
        }
        false
    }

    async fn connect_and_process(
        &self,
        command_rx: &mut mpsc::Receiver<StreamCommand>,
        attempts: &mut u32,
    ) -> Result<SessionEnd, StreamError> {
        let url = self.config.connection_url();
        let connect = timeout(
            Duration::from_millis(self.config.connect_timeout_ms),
            connect_async(url.as_str()),
        );
        tokio::pin!(connect);
        let ws_stream = loop {
            tokio::select! {
                result = &mut connect => {
                    let (ws_stream, _) = result
                        .map_err(|_| {
                            StreamError::ConnectionFailed(format!(
                                "handshake timed out after {} ms",
                                self.config.connect_timeout_ms
                            ))
                        })?
                        .map_err(|e| StreamError::ConnectionFailed(e.to_string()))?;
                    break ws_stream;
                }
                cmd = command_rx.recv() => {
                    if self.handle_offline_command(cmd).await {
                        info!("Shutdown requested while connecting");
                        return Ok(SessionEnd::Shutdown);
                    }
                }
            }
        };

        *attempts = 0;
        *self.reconnect_count.write().await = 0;

        let (mut write, mut read) = ws_stream.split();

        let (connection_id, subscriptions) = {
            let mut state = self.state.write().await;
            state.status = ConnectionStatus::Connected;
            state.connected_at = Some(Utc::now());
            (state.id.clone(), state.subscriptions.clone())
        };
        info!("WebSocket connection established ({})", connection_id);

        for address in &subscriptions {
            write
                .send(Message::Text(subscription_frame("subscribe", address)))
                .await
                .map_err(|e| StreamError::WebSocketError(e.to_string()))?;
        }
        if !subscriptions.is_empty() {
            debug!("Resubscribed {} wallet(s)", subscriptions.len());
        }

        self.emit_state(StreamEvent::Connected { connection_id }).await;

        let period = Duration::from_secs(self.config.heartbeat_interval_secs.max(1));
        let mut heartbeat = interval_at(Instant::now() + period, period);
        heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let heartbeat_enabled = self.config.heartbeat_interval_secs > 0;

        loop {
            tokio::select! {
                cmd = command_rx.recv() => match cmd {
                    None | Some(StreamCommand::Shutdown) => {
                        info!("Shutdown command received");
                        let close = Message::Close(Some(CloseFrame {
                            code: CloseCode::Normal,
                            reason: "Client initiated disconnect".into(),
                        }));
                        if let Err(e) = write.send(close).await {
                            debug!("Close frame not delivered: {}", e);
                        }
                        return Ok(SessionEnd::Shutdown);
                    }
                    Some(StreamCommand::Subscribe(address)) => {
                        if self.track(address.clone()).await {
                            write
                                .send(Message::Text(subscription_frame("subscribe", &address)))
                                .await
                                .map_err(|e| StreamError::WebSocketError(e.to_string()))?;
                            debug!("Subscribed to {}", address);
                        }
                    }
                    Some(StreamCommand::Unsubscribe(address)) => {
                        if self.untrack(&address).await {
                            write
                                .send(Message::Text(subscription_frame("unsubscribe", &address)))
                                .await
                                .map_err(|e| StreamError::WebSocketError(e.to_string()))?;
                            debug!("Unsubscribed from {}", address);
                        }
                    }
                    Some(StreamCommand::Send(payload)) => {
                        write
                            .send(Message::Text(payload.to_string()))
                            .await
                            .map_err(|e| StreamError::WebSocketError(e.to_string()))?;
                    }
                },
                message = read.next() => match message {
                    Some(Ok(Message::Text(text))) => {
                        if let Some(end) = self.handle_text(&text).await {
                            return Ok(end);
                        }
                    }
                    Some(Ok(Message::Binary(bytes))) => match String::from_utf8(bytes) {
                        Ok(text) => {
                            if let Some(end) = self.handle_text(&text).await {
                                return Ok(end);
                            }
                        }
                        Err(_) => warn!("Ignoring non UTF-8 binary message"),
                    },
                    Some(Ok(Message::Pong(_))) => {
                        self.state.write().await.last_heartbeat = Some(Utc::now());
                    }
                    Some(Ok(Message::Close(frame))) => {
                        let clean = frame
                            .as_ref()
                            .map(|f| f.code == CloseCode::Normal)
                            .unwrap_or(true);
                        info!(
                            "WebSocket connection closed. Code: {:?}, Reason: {}",
                            frame.as_ref().map(|f| f.code),
                            frame.as_ref().map(|f| f.reason.to_string()).unwrap_or_default()
                        );
                        return Ok(SessionEnd::Closed { clean });
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => return Err(StreamError::WebSocketError(e.to_string())),
                    None => return Ok(SessionEnd::Closed { clean: false }),
                },
                _ = heartbeat.tick(), if heartbeat_enabled => {
                    write
                        .send(Message::Text(ping_frame()))
                        .await
                        .map_err(|e| StreamError::WebSocketError(e.to_string()))?;
                    debug!("Heartbeat ping");
                }
            }
        }
    }

    /// Process a text frame. Returns a session end when nobody is listening anymore.
    async fn handle_text(&self, text: &str) -> Option<SessionEnd> {
        match self.process_message(text).await {
            Ok(()) => None,
            Err(StreamError::ChannelClosed) => {
                warn!("Event receiver dropped, closing stream");
                Some(SessionEnd::Shutdown)
            }
            Err(e) => {
                self.emit_state(StreamEvent::Error {
                    message: e.to_string(),
                })
                .await;
                None
            }
        }
    }

    /// Process a raw stream message and emit the matching event
    pub async fn process_message(&self, raw_message: &str) -> Result<(), StreamError> {
        if raw_message.len() > self.config.max_message_size {
            warn!(
                "Message exceeds max size: {} > {} bytes",
                raw_message.len(),
                self.config.max_message_size
            );
            return Err(StreamError::InvalidMessageFormat(format!(
                "Message too large: {} bytes",
                raw_message.len()
            )));
        }

        let trimmed = raw_message.trim();
        if trimmed.is_empty() {
            debug!("Ignoring empty message");
            return Ok(());
        }

        if !trimmed.starts_with('{') && !trimmed.starts_with('[') {
            warn!("Invalid JSON structure: does not start with {{ or [");
            return Err(StreamError::InvalidMessageFormat(
                "Message is not valid JSON object or array".to_string(),
            ));
        }

        let value: Value = serde_json::from_str(trimmed).map_err(|e| {
            let preview: String = trimmed.chars().take(200).collect();
            warn!("Failed to parse message: {} - preview: {}", e, preview);
            StreamError::ParseError(format!(
                "JSON parse error at line {}, column {}: {:?}",
                e.line(),
                e.column(),
                e.classify()
            ))
        })?;

        match value {
            Value::Array(items) => {
                for item in items {
                    self.dispatch(item).await?;
                }
                Ok(())
            }
            other => self.dispatch(other).await,
        }
    }

    async fn dispatch(&self, value: Value) -> Result<(), StreamError> {
        let message: StreamMessage = match serde_json::from_value(value.clone()) {
            Ok(m) => m,
            Err(_) => return self.emit(StreamEvent::Message(value)).await,
        };

        match message.kind.to_ascii_lowercase().as_str() {
            "transaction" | "transaction_update" => {
                let data: TransactionStreamData = serde_json::from_value(message.data)
                    .map_err(|e| StreamError::ParseError(format!("transaction: {}", e)))?;
                let tx = data.into_transaction();
                debug!("Transaction {} ({} {})", tx.signature, tx.tx_type, tx.amount);
                self.emit(StreamEvent::Transaction(tx)).await
            }
            "balance_update" | "wallet_balance" => {
                let update: BalanceUpdate = serde_json::from_value(message.data)
                    .map_err(|e| StreamError::ParseError(format!("balance update: {}", e)))?;
                self.emit(StreamEvent::BalanceUpdate(update)).await
            }
            "price_update" => {
                let update: PriceUpdate = serde_json::from_value(message.data)
                    .map_err(|e| StreamError::ParseError(format!("price update: {}", e)))?;
                update.validate().map_err(StreamError::InvalidMessageFormat)?;
                self.emit(StreamEvent::PriceUpdate(update)).await
            }
            "pong" | "heartbeat" => {
                self.state.write().await.last_heartbeat = Some(Utc::now());
                Ok(())
            }
            "error" => {
                let text = match &message.data {
                    Value::String(s) => s.clone(),
                    data => data
                        .get("message")
                        .and_then(Value::as_str)
                        .unwrap_or("Unknown WebSocket error")
                        .to_string(),
                };
                warn!("Server error: {}", text);
                self.emit(StreamEvent::Error { message: text }).await
            }
            other => {
                debug!("No handler registered for message type: {}", other);
                self.emit(StreamEvent::Message(value)).await
            }
        }
    }

    async fn emit(&self, event: StreamEvent) -> Result<(), StreamError> {
        self.event_tx
            .send(event)
            .await
            .map_err(|_| StreamError::ChannelClosed)
    }

    /// Best-effort emit for state changes
    async fn emit_state(&self, event: StreamEvent) {
        let _ = self.event_tx.send(event).await;
    }

    async fn set_status(&self, status: ConnectionStatus) {
        let mut state = self.state.write().await;
        if state.status != status {
            debug!("Connection status updated: {:?}", status);
            state.status = status;
        }
    }

    /// Returns true if the address was newly tracked
    async fn track(&self, address: String) -> bool {
        let mut state = self.state.write().await;
        if state.subscriptions.contains(&address) {
            return false;
        }
        state.subscriptions.push(address);
        true
    }

    /// Returns true if the address was tracked
    async fn untrack(&self, address: &str) -> bool {
        let mut state = self.state.write().await;
        let before = state.subscriptions.len();
        state.subscriptions.retain(|a| a != address);
        state.subscriptions.len() != before
    }
}

/// Builder for WalletStream configuration
#[derive(Debug, Default)]
pub struct StreamBuilder {
    config: StreamConfig,
}

impl StreamBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.config.url = url.into();
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = key.into();
        self
    }

    pub fn auto_reconnect(mut self, enabled: bool) -> Self {
        self.config.auto_reconnect = enabled;
        self
    }

    /// Set maximum reconnection attempts (0 = unlimited)
    pub fn max_reconnect_attempts(mut self, attempts: u32) -> Self {
        self.config.max_reconnect_attempts = attempts;
        self
    }

    pub fn reconnect_delays(mut self, base_ms: u64, max_ms: u64) -> Self {
        self.config.reconnect_base_delay_ms = base_ms;
        self.config.max_reconnect_delay_ms = max_ms;
        self
    }

    pub fn heartbeat_interval_secs(mut self, secs: u64) -> Self {
        self.config.heartbeat_interval_secs = secs;
        self
    }

    pub fn connect_timeout_ms(mut self, ms: u64) -> Self {
        self.config.connect_timeout_ms = ms;
        self
    }

    pub fn channel_buffer_size(mut self, size: usize) -> Self {
        self.config.channel_buffer_size = size;
        self
    }

    pub fn max_message_size(mut self, size: usize) -> Self {
        self.config.max_message_size = size;
        self
    }

    pub fn build(self) -> (WalletStream, mpsc::Receiver<StreamEvent>) {
        WalletStream::new(self.config)
    }
}
