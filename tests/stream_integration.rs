//! Wallet Stream Integration Tests
//!
//! Runs the websocket client against an in-process tokio-tungstenite server:
//! 1. Subscribe frames go out and pushed transactions come back as events
//! 2. Subscriptions are replayed after the server drops the connection
//! 3. The stream gives up once the reconnect budget is spent
//! 4. A normal close from the server ends the stream without reconnecting
//! 5. Abnormal closes, unlimited retries, disabled reconnects and shutdown while offline
//! 6. Streamed transactions flow through the tracker into front-end updates

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, watch};
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{accept_async, WebSocketStream};

use lemora_tracker::adapters::helius::{
    ConnectionStatus, StreamBuilder, StreamError, StreamEvent, WalletStream,
};
use lemora_tracker::adapters::store::JsonStore;
use lemora_tracker::application::{TrackerService, TrackerSettings, TrackerUpdate};
use lemora_tracker::ports::mocks::FakeWalletData;

const WALLET: &str = "86xCnPeV69n6t3DnyGvkKobf9FdN2H9oiVDdaMpo2MMY";
const WAIT: Duration = Duration::from_secs(5);

// ============================================================================
// Test Fixtures
// ============================================================================

async fn bind() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}", listener.local_addr().unwrap());
    (listener, url)
}

async fn accept(listener: &TcpListener) -> WebSocketStream<TcpStream> {
    let (tcp, _) = timeout(WAIT, listener.accept()).await.unwrap().unwrap();
    accept_async(tcp).await.unwrap()
}

/// Next text frame as JSON, skipping pings
async fn next_json(ws: &mut WebSocketStream<TcpStream>) -> Value {
    loop {
        let msg = timeout(WAIT, ws.next()).await.unwrap().unwrap().unwrap();
        if let Message::Text(text) = msg {
            return serde_json::from_str(&text).unwrap();
        }
    }
}

fn fast_stream(url: &str) -> (WalletStream, mpsc::Receiver<StreamEvent>) {
    StreamBuilder::new()
        .url(url)
        .heartbeat_interval_secs(0)
        .reconnect_delays(10, 40)
        .max_reconnect_attempts(3)
        .build()
}

fn transaction_frame(amount: f64) -> String {
    json!({
        "type": "transaction",
        "data": {
            "signature": format!("sig-{}", amount),
            "walletAddress": WALLET,
            "type": "swap",
            "amount": amount,
            "tokenAddress": "BonkMint",
            "timestamp": 1_700_000_000_000i64,
            "confirmed": true
        }
    })
    .to_string()
}

async fn wait_for<F>(events: &mut mpsc::Receiver<StreamEvent>, mut pred: F) -> StreamEvent
where
    F: FnMut(&StreamEvent) -> bool,
{
    loop {
        let event = timeout(WAIT, events.recv()).await.unwrap().unwrap();
        if pred(&event) {
            return event;
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

mod stream_flow {
    use super::*;

    #[tokio::test]
    async fn test_subscribe_and_receive_transaction() {
        let (listener, url) = bind().await;
        let (stream, mut events) = fast_stream(&url);

        let runner = stream.clone();
        let handle = tokio::spawn(async move { runner.run().await });
        stream.subscribe(WALLET).await.unwrap();

        let mut ws = accept(&listener).await;
        let frame = next_json(&mut ws).await;
        assert_eq!(frame["type"], "subscribe");
        assert_eq!(frame["data"]["address"], WALLET);
        assert!(frame["timestamp"].as_i64().unwrap() > 0);

        ws.send(Message::Text(transaction_frame(42.0))).await.unwrap();

        wait_for(&mut events, |e| matches!(e, StreamEvent::Connected { .. })).await;
        match wait_for(&mut events, |e| matches!(e, StreamEvent::Transaction(_))).await {
            StreamEvent::Transaction(tx) => {
                assert_eq!(tx.signature, "sig-42");
                assert_eq!(tx.amount, 42.0);
                assert_eq!(tx.from, WALLET);
            }
            other => panic!("unexpected event {:?}", other),
        }

        assert_eq!(stream.status().await, ConnectionStatus::Connected);
        assert_eq!(stream.subscriptions().await, vec![WALLET.to_string()]);

        stream.shutdown().await.unwrap();
        let result = timeout(WAIT, handle).await.unwrap().unwrap();
        assert!(result.is_ok());
        assert!(!stream.is_running().await);
    }

    #[tokio::test]
    async fn test_unsubscribe_frame() {
        let (listener, url) = bind().await;
        let (stream, mut events) = fast_stream(&url);

        let runner = stream.clone();
        let handle = tokio::spawn(async move { runner.run().await });
        let mut ws = accept(&listener).await;
        wait_for(&mut events, |e| matches!(e, StreamEvent::Connected { .. })).await;

        stream.subscribe(WALLET).await.unwrap();
        // duplicate subscribe sends nothing
        stream.subscribe(WALLET).await.unwrap();
        stream.unsubscribe(WALLET).await.unwrap();

        assert_eq!(next_json(&mut ws).await["type"], "subscribe");
        let frame = next_json(&mut ws).await;
        assert_eq!(frame["type"], "unsubscribe");
        assert_eq!(frame["data"]["address"], WALLET);

        stream.shutdown().await.unwrap();
        timeout(WAIT, handle).await.unwrap().unwrap().unwrap();
        assert!(stream.subscriptions().await.is_empty());
    }

    #[tokio::test]
    async fn test_resubscribes_after_drop() {
        let (listener, url) = bind().await;
        let (stream, mut events) = fast_stream(&url);

        let runner = stream.clone();
        let handle = tokio::spawn(async move { runner.run().await });
        stream.subscribe(WALLET).await.unwrap();

        let mut first = accept(&listener).await;
        assert_eq!(next_json(&mut first).await["type"], "subscribe");
        wait_for(&mut events, |e| matches!(e, StreamEvent::Connected { .. })).await;

        // vanish without a close handshake
        drop(first);
        match wait_for(&mut events, |e| matches!(e, StreamEvent::Disconnected { .. })).await {
            StreamEvent::Disconnected { clean, .. } => assert!(!clean),
            other => panic!("unexpected event {:?}", other),
        }

        let mut second = accept(&listener).await;
        let frame = next_json(&mut second).await;
        assert_eq!(frame["type"], "subscribe");
        assert_eq!(frame["data"]["address"], WALLET);

        wait_for(&mut events, |e| matches!(e, StreamEvent::Connected { .. })).await;
        assert_eq!(stream.reconnect_count().await, 0);

        stream.shutdown().await.unwrap();
        timeout(WAIT, handle).await.unwrap().unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        // Reserve a port, then free it so nothing is listening
        let (listener, url) = bind().await;
        drop(listener);

        let (stream, mut events) = StreamBuilder::new()
            .url(url)
            .heartbeat_interval_secs(0)
            .reconnect_delays(5, 10)
            .max_reconnect_attempts(2)
            .build();

        let result = timeout(WAIT, stream.run()).await.unwrap();
        assert!(matches!(result, Err(StreamError::ReconnectExhausted(2))));

        match wait_for(&mut events, |e| matches!(e, StreamEvent::GaveUp { .. })).await {
            StreamEvent::GaveUp { attempts } => assert_eq!(attempts, 2),
            other => panic!("unexpected event {:?}", other),
        }
        assert_eq!(stream.status().await, ConnectionStatus::Disconnected);
    }

    #[tokio::test]
    async fn test_clean_close_stops_stream() {
        let (listener, url) = bind().await;
        let (stream, mut events) = fast_stream(&url);

        let runner = stream.clone();
        let handle = tokio::spawn(async move { runner.run().await });

        let mut ws = accept(&listener).await;
        ws.send(Message::Close(Some(CloseFrame {
            code: CloseCode::Normal,
            reason: "maintenance".into(),
        })))
        .await
        .unwrap();

        let result = timeout(WAIT, handle).await.unwrap().unwrap();
        assert!(result.is_ok());

        match wait_for(&mut events, |e| matches!(e, StreamEvent::Disconnected { .. })).await {
            StreamEvent::Disconnected { clean, .. } => assert!(clean),
            other => panic!("unexpected event {:?}", other),
        }
    }
}

mod reconnect_policy {
    use super::*;

    #[tokio::test]
    async fn test_abnormal_close_reconnects() {
        let (listener, url) = bind().await;
        let (stream, mut events) = fast_stream(&url);

        let runner = stream.clone();
        let handle = tokio::spawn(async move { runner.run().await });
        stream.subscribe(WALLET).await.unwrap();

        let mut first = accept(&listener).await;
        assert_eq!(next_json(&mut first).await["type"], "subscribe");
        first
            .send(Message::Close(Some(CloseFrame {
                code: CloseCode::Error,
                reason: "internal error".into(),
            })))
            .await
            .unwrap();

        match wait_for(&mut events, |e| matches!(e, StreamEvent::Disconnected { .. })).await {
            StreamEvent::Disconnected { clean, .. } => assert!(!clean),
            other => panic!("unexpected event {:?}", other),
        }

        let mut second = accept(&listener).await;
        assert_eq!(next_json(&mut second).await["data"]["address"], WALLET);
        assert!(stream.is_running().await);

        stream.shutdown().await.unwrap();
        timeout(WAIT, handle).await.unwrap().unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_shutdown_during_backoff() {
        let (listener, url) = bind().await;
        drop(listener);

        let (stream, mut events) = StreamBuilder::new()
            .url(url)
            .heartbeat_interval_secs(0)
            .reconnect_delays(20_000, 20_000)
            .max_reconnect_attempts(3)
            .build();

        let runner = stream.clone();
        let handle = tokio::spawn(async move { runner.run().await });

        wait_for(&mut events, |e| matches!(e, StreamEvent::Error { .. })).await;
        timeout(WAIT, async {
            while stream.reconnect_count().await == 0
                || stream.status().await != ConnectionStatus::Reconnecting
            {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();

        // tracked while offline, no socket needed
        stream.subscribe(WALLET).await.unwrap();
        stream.shutdown().await.unwrap();

        let result = timeout(Duration::from_secs(2), handle).await.unwrap().unwrap();
        assert!(result.is_ok());
        assert_eq!(stream.subscriptions().await, vec![WALLET.to_string()]);
        assert!(!stream.is_running().await);
    }

    #[tokio::test]
    async fn test_zero_max_attempts_retries_without_limit() {
        let (listener, url) = bind().await;
        drop(listener);

        let (stream, mut events) = StreamBuilder::new()
            .url(url)
            .heartbeat_interval_secs(0)
            .reconnect_delays(1, 2)
            .max_reconnect_attempts(0)
            .build();

        let runner = stream.clone();
        let handle = tokio::spawn(async move { runner.run().await });

        // well past the default budget of five
        timeout(WAIT, async {
            while stream.reconnect_count().await < 8 {
                tokio::time::sleep(Duration::from_millis(2)).await;
            }
        })
        .await
        .unwrap();
        assert!(stream.is_running().await);

        stream.shutdown().await.unwrap();
        timeout(WAIT, handle).await.unwrap().unwrap().unwrap();

        while let Ok(event) = events.try_recv() {
            assert!(!matches!(event, StreamEvent::GaveUp { .. }));
        }
    }

    #[tokio::test]
    async fn test_disabled_reconnect_reports_connection_lost() {
        let (listener, url) = bind().await;
        let (stream, mut events) = StreamBuilder::new()
            .url(&url)
            .heartbeat_interval_secs(0)
            .auto_reconnect(false)
            .build();

        let runner = stream.clone();
        let handle = tokio::spawn(async move { runner.run().await });

        let ws = accept(&listener).await;
        wait_for(&mut events, |e| matches!(e, StreamEvent::Connected { .. })).await;
        drop(ws);

        let result = timeout(WAIT, handle).await.unwrap().unwrap();
        assert!(matches!(result, Err(StreamError::ConnectionLost)));
        assert_eq!(stream.reconnect_count().await, 0);

        // no second connection attempt
        assert!(timeout(Duration::from_millis(200), listener.accept()).await.is_err());
    }

    #[tokio::test]
    async fn test_stalled_handshake_times_out() {
        // accepts TCP (kernel backlog) but never answers the upgrade
        let (_listener, url) = bind().await;
        let (stream, mut events) = StreamBuilder::new()
            .url(url)
            .heartbeat_interval_secs(0)
            .connect_timeout_ms(100)
            .auto_reconnect(false)
            .build();

        let result = timeout(WAIT, stream.run()).await.unwrap();
        assert!(matches!(result, Err(StreamError::ConnectionLost)));

        match wait_for(&mut events, |e| matches!(e, StreamEvent::Error { .. })).await {
            StreamEvent::Error { message } => assert!(message.contains("timed out"), "{}", message),
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_shutdown_while_handshake_pending() {
        let (_listener, url) = bind().await;
        let (stream, _events) = StreamBuilder::new()
            .url(url)
            .heartbeat_interval_secs(0)
            .connect_timeout_ms(60_000)
            .build();

        let runner = stream.clone();
        let handle = tokio::spawn(async move { runner.run().await });
        timeout(WAIT, async {
            while stream.status().await != ConnectionStatus::Connecting {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();

        stream.shutdown().await.unwrap();
        let result = timeout(Duration::from_secs(2), handle).await.unwrap().unwrap();
        assert!(result.is_ok());
    }
}

mod stream_to_tracker {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_large_streamed_trade_reaches_front_end() {
        let (listener, url) = bind().await;
        let (stream, events) = fast_stream(&url);
        let dir = TempDir::new().unwrap();

        let mut tracker = TrackerService::new(
            TrackerSettings::default(),
            JsonStore::in_dir(dir.path()),
            Arc::new(FakeWalletData::new()),
        )
        .with_stream(stream.clone());
        tracker.add_wallet(WALLET).await.unwrap();
        let mut updates = tracker.subscribe_updates();

        let runner = stream.clone();
        let stream_handle = tokio::spawn(async move { runner.run().await });

        let (_req_tx, req_rx) = mpsc::channel(4);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let tracker_handle =
            tokio::spawn(async move { tracker.run(Some(events), req_rx, shutdown_rx).await });

        let mut ws = accept(&listener).await;
        assert_eq!(next_json(&mut ws).await["data"]["address"], WALLET);

        // filtered out: below the default spam threshold
        ws.send(Message::Text(transaction_frame(0.0001))).await.unwrap();
        ws.send(Message::Text(transaction_frame(2500.0))).await.unwrap();

        let update = loop {
            let update = timeout(WAIT, updates.recv()).await.unwrap().unwrap();
            if matches!(update, TrackerUpdate::TransactionUpdate { .. }) {
                break update;
            }
        };
        match update {
            TrackerUpdate::TransactionUpdate { transaction, flags } => {
                assert_eq!(transaction.signature, "sig-2500");
                assert_eq!(flags, vec!["large_transaction".to_string()]);
            }
            other => panic!("unexpected update {:?}", other),
        }

        shutdown_tx.send(true).unwrap();
        timeout(WAIT, tracker_handle).await.unwrap().unwrap().unwrap();
        stream.shutdown().await.unwrap();
        timeout(WAIT, stream_handle).await.unwrap().unwrap().unwrap();
    }
}
