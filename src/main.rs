//! Lemora - Solana Wallet Tracker
//!
//! Runs the tracker daemon or answers one-shot queries from the command line.

use std::collections::HashMap;
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{TimeZone, Utc};
use clap::Parser;
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::{broadcast, mpsc, watch};
use tracing_subscriber::{fmt, EnvFilter};

use lemora_tracker::adapters::birdeye::{BirdeyeClient, BirdeyeConfig};
use lemora_tracker::adapters::cli::{
    AddCmd, CliApp, Command, InfoCmd, ListCmd, RemoveCmd, RulesCmd, RunCmd, TokenCmd, TxsCmd,
};
use lemora_tracker::adapters::helius::{HeliusClient, HeliusConfig, StreamConfig, WalletStream};
use lemora_tracker::adapters::jupiter::JupiterPriceClient;
use lemora_tracker::adapters::notifier::{ConsoleNotifier, WebhookNotifier};
use lemora_tracker::adapters::price_oracle::PriceOracle;
use lemora_tracker::adapters::solana::{SolanaClient, SolanaWalletService};
use lemora_tracker::adapters::store::JsonStore;
use lemora_tracker::application::{
    PendingRequest, TrackerRequest, TrackerResponse, TrackerService, TrackerSettings,
    TrackerUpdate,
};
use lemora_tracker::config::{load_config, Config};
use lemora_tracker::domain::{short_address, FilterOptions, QuickClassifier, Transaction};
use lemora_tracker::ports::{PricePort, WalletDataPort};

const REQUEST_QUEUE_SIZE: usize = 64;
const OUTPUT_QUEUE_SIZE: usize = 256;
const STREAM_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (API keys go here, not in the config file)
    dotenvy::dotenv().ok();

    let app = CliApp::parse();
    let config_path = match &app.command {
        Command::Run(cmd) => &cmd.config,
        Command::Add(cmd) => &cmd.config,
        Command::Remove(cmd) => &cmd.config,
        Command::List(cmd) => &cmd.config,
        Command::Info(cmd) => &cmd.config,
        Command::Txs(cmd) => &cmd.config,
        Command::Token(cmd) => &cmd.config,
        Command::Rules(cmd) => &cmd.config,
    };
    let (config, from_file) = load_or_default(config_path)?;

    init_logging(app.verbose, app.debug, &config)?;
    if !from_file {
        tracing::warn!(
            "Config file {} not found, using defaults",
            config_path.display()
        );
    }

    match app.command {
        Command::Run(cmd) => run_command(cmd, config).await,
        Command::Add(cmd) => add_command(cmd, config).await,
        Command::Remove(cmd) => remove_command(cmd, config).await,
        Command::List(cmd) => list_command(cmd, config).await,
        Command::Info(cmd) => info_command(cmd, config).await,
        Command::Txs(cmd) => txs_command(cmd, config).await,
        Command::Token(cmd) => token_command(cmd, config).await,
        Command::Rules(cmd) => rules_command(cmd, config),
    }
}

/// Missing config files fall back to defaults plus environment overrides
fn load_or_default(path: &Path) -> Result<(Config, bool)> {
    if path.exists() {
        let config = load_config(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
        return Ok((config, true));
    }

    let mut config = Config::default();
    config.apply_env_overrides(|name| std::env::var(name).ok());
    config.validate().context("Invalid default configuration")?;
    Ok((config, false))
}

/// Logs go to stderr (stdout carries the daemon protocol) or to the
/// configured log file.
fn init_logging(verbose: bool, debug: bool, config: &Config) -> Result<()> {
    let filter = if debug {
        EnvFilter::new("debug")
    } else if verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level))
    };

    if config.logging.log_to_file {
        let path = config.log_file();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create log directory {}", parent.display()))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open log file {}", path.display()))?;

        fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init();
    } else {
        fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    Ok(())
}

fn build_wallet_data(config: &Config) -> Result<Arc<dyn WalletDataPort>> {
    let rpc = SolanaClient::new(config.solana.rpc_url.clone());
    let helius = HeliusClient::new(HeliusConfig::from(config))
        .context("Failed to create Helius client")?;
    Ok(Arc::new(SolanaWalletService::new(rpc).with_history(helius)))
}

/// Birdeye first when keyed, Jupiter otherwise or as fallback
fn build_prices(config: &Config) -> Result<Arc<dyn PricePort>> {
    let jupiter = Arc::new(
        JupiterPriceClient::with_base_url(
            config.jupiter.price_url.clone(),
            Duration::from_secs(config.jupiter.timeout_secs),
        )
        .context("Failed to create Jupiter price client")?,
    );

    if config.birdeye.api_key.is_empty() {
        return Ok(Arc::new(PriceOracle::new(jupiter)));
    }

    let birdeye = Arc::new(
        BirdeyeClient::new(BirdeyeConfig::from(config)).context("Failed to create Birdeye client")?,
    );
    Ok(Arc::new(PriceOracle::new(birdeye).with_fallback(jupiter)))
}

fn build_tracker(config: &Config) -> Result<TrackerService> {
    let store = JsonStore::in_dir(&config.data_dir());
    let rules = config.rules_engine().context("Invalid filter rules")?;

    let mut tracker = TrackerService::new(TrackerSettings::from(config), store, build_wallet_data(config)?)
        .with_prices(build_prices(config)?)
        .with_rules(rules)
        .with_notifier(Arc::new(ConsoleNotifier::new()));

    if config.alerts.webhook_enabled {
        let webhook = WebhookNotifier::new(config.alerts.webhook_url.clone())
            .context("Failed to create webhook notifier")?;
        tracker = tracker.with_notifier(Arc::new(webhook));
    }

    Ok(tracker)
}

fn to_line<T: Serialize>(value: &T) -> Option<String> {
    match serde_json::to_string(value) {
        Ok(line) => Some(line),
        Err(e) => {
            tracing::error!("Failed to serialize output: {}", e);
            None
        }
    }
}

async fn run_command(cmd: RunCmd, config: Config) -> Result<()> {
    tracing::info!("Starting Lemora wallet tracker...");

    let mut tracker = build_tracker(&config)?;
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let mut events = None;
    let mut stream_task = None;
    let mut stream = None;
    if config.websocket.enabled && !cmd.no_stream {
        if config.helius.api_key.is_empty() {
            tracing::warn!("HELIUS_API_KEY not set, the live feed will likely be rejected");
        }
        let (wallet_stream, rx) = WalletStream::new(StreamConfig::from(&config));
        tracker = tracker.with_stream(wallet_stream.clone());

        let runner = wallet_stream.clone();
        stream_task = Some(tokio::spawn(async move {
            if let Err(e) = runner.run().await {
                tracing::error!("Wallet stream stopped: {}", e);
            }
        }));
        events = Some(rx);
        stream = Some(wallet_stream);
    } else {
        tracing::warn!("Live feed disabled, only periodic refreshes will run");
    }

    let watched = tracker
        .initialize()
        .await
        .context("Failed to load watched wallets")?;
    tracing::info!("Watching {} wallets", watched);

    // Single stdout writer keeps lines whole
    let (out_tx, mut out_rx) = mpsc::channel::<String>(OUTPUT_QUEUE_SIZE);
    let writer = tokio::spawn(async move {
        let mut stdout = tokio::io::stdout();
        while let Some(line) = out_rx.recv().await {
            if stdout.write_all(line.as_bytes()).await.is_err()
                || stdout.write_all(b"\n").await.is_err()
                || stdout.flush().await.is_err()
            {
                tracing::warn!("stdout closed");
                break;
            }
        }
    });

    let mut updates = tracker.subscribe_updates();
    let update_out = out_tx.clone();
    let forwarder = tokio::spawn(async move {
        loop {
            match updates.recv().await {
                Ok(update) => {
                    let Some(line) = to_line::<TrackerUpdate>(&update) else {
                        continue;
                    };
                    if update_out.send(line).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!("Dropped {} updates for a slow reader", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    let (req_tx, req_rx) = mpsc::channel::<PendingRequest>(REQUEST_QUEUE_SIZE);
    let reader_out = out_tx;
    let reader = tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => {
                    tracing::info!("stdin closed");
                    break;
                }
                Err(e) => {
                    tracing::error!("Failed to read stdin: {}", e);
                    break;
                }
            };
            if line.trim().is_empty() {
                continue;
            }

            let response = match TrackerRequest::parse(&line) {
                Err(response) => response,
                Ok(request) => {
                    let (pending, reply) = PendingRequest::new(request);
                    if req_tx.send(pending).await.is_err() {
                        break;
                    }
                    reply
                        .await
                        .unwrap_or_else(|_| TrackerResponse::error("Tracker stopped"))
                }
            };

            if let Some(line) = to_line(&response) {
                if reader_out.send(line).await.is_err() {
                    break;
                }
            }
        }
    });

    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        tracing::info!("Shutdown signal received");
        let _ = shutdown_tx.send(true);
    });

    tracker.run(events, req_rx, shutdown_rx).await?;

    if let Some(stream) = stream {
        if let Err(e) = stream.shutdown().await {
            tracing::debug!("Stream already stopped: {}", e);
        }
    }
    if let Some(task) = stream_task {
        if tokio::time::timeout(STREAM_SHUTDOWN_TIMEOUT, task).await.is_err() {
            tracing::warn!("Wallet stream did not stop in time");
        }
    }

    reader.abort();
    drop(tracker);
    let _ = forwarder.await;
    let _ = writer.await;

    tracing::info!("Lemora stopped");
    Ok(())
}

fn print_response(response: TrackerResponse) -> Result<()> {
    match (response.success, response.error) {
        (true, _) => Ok(()),
        (false, Some(error)) => anyhow::bail!(error),
        (false, None) => anyhow::bail!("request failed"),
    }
}

async fn add_command(cmd: AddCmd, config: Config) -> Result<()> {
    let mut tracker = build_tracker(&config)?;
    tracker.initialize().await?;

    let response = tracker
        .handle_request(TrackerRequest::AddWallet {
            address: cmd.address.clone(),
        })
        .await;
    print_response(response)?;

    println!(
        "Watching {} ({}/{} wallets)",
        short_address(cmd.address.trim()),
        tracker.watchlist().len(),
        tracker.watchlist().capacity()
    );
    Ok(())
}

async fn remove_command(cmd: RemoveCmd, config: Config) -> Result<()> {
    let mut tracker = build_tracker(&config)?;
    tracker.initialize().await?;

    let was_watched = tracker.watchlist().contains(cmd.address.trim());
    let response = tracker
        .handle_request(TrackerRequest::RemoveWallet {
            address: cmd.address.clone(),
        })
        .await;
    print_response(response)?;

    if was_watched {
        println!("Stopped watching {}", short_address(cmd.address.trim()));
    } else {
        println!("{} was not being watched", short_address(cmd.address.trim()));
    }
    Ok(())
}

async fn list_command(_cmd: ListCmd, config: Config) -> Result<()> {
    let mut tracker = build_tracker(&config)?;
    tracker.initialize().await?;

    let watchlist = tracker.watchlist();
    if watchlist.is_empty() {
        println!("No wallets watched. Add one with: lemora add <ADDRESS>");
        return Ok(());
    }

    println!("Watched wallets ({}/{}):", watchlist.len(), watchlist.capacity());
    for address in watchlist.addresses() {
        println!("  {}", address);
    }
    Ok(())
}

async fn info_command(cmd: InfoCmd, config: Config) -> Result<()> {
    let wallet_data = build_wallet_data(&config)?;
    let info = wallet_data
        .get_wallet_info(cmd.address.trim())
        .await
        .context("Failed to fetch wallet info")?;

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    println!("Wallet:        {}", info.address);
    println!("Balance:       {:.4} SOL", info.sol_balance);
    println!("Transactions:  {}", info.total_transactions);
    println!("Volume:        {:.4} SOL", info.total_volume);
    println!("Avg value:     {:.4} SOL", info.average_transaction_value);
    println!("Risk score:    {:.2}", info.risk_score);
    println!("Last activity: {}", info.last_activity.format("%Y-%m-%d %H:%M:%S UTC"));

    if !info.token_balances.is_empty() {
        println!("Tokens:");
        for balance in &info.token_balances {
            println!("  {}  {}", balance.mint, balance.ui_amount);
        }
    }
    Ok(())
}

/// Fill missing prices, one lookup per token
async fn enrich_prices(prices: &dyn PricePort, transactions: &mut [Transaction]) {
    let mut cache: HashMap<String, Option<f64>> = HashMap::new();

    for tx in transactions.iter_mut().filter(|tx| tx.price.is_none()) {
        let mint = if tx.token.address.is_empty() {
            lemora_tracker::application::WRAPPED_SOL_MINT.to_string()
        } else {
            tx.token.address.clone()
        };

        if !cache.contains_key(&mint) {
            let price = match prices.get_price(&mint).await {
                Ok(price) => Some(price),
                Err(e) => {
                    tracing::debug!("No price for {}: {}", mint, e);
                    None
                }
            };
            cache.insert(mint.clone(), price);
        }
        tx.price = cache.get(&mint).copied().flatten();
    }
}

fn format_time(timestamp_ms: i64) -> String {
    match Utc.timestamp_millis_opt(timestamp_ms).single() {
        Some(t) => t.format("%Y-%m-%d %H:%M").to_string(),
        None => "-".to_string(),
    }
}

async fn txs_command(cmd: TxsCmd, config: Config) -> Result<()> {
    let wallet_data = build_wallet_data(&config)?;
    let limit = cmd.limit.unwrap_or(config.tracker.default_transaction_limit);

    let mut transactions = wallet_data
        .get_recent_transactions(cmd.address.trim(), limit)
        .await
        .context("Failed to fetch transactions")?;

    if let Some(min_amount) = cmd.min_amount {
        let filter = FilterOptions {
            min_amount: Some(min_amount),
            ..Default::default()
        };
        transactions = filter.apply(transactions);
    }

    if config.tracker.enrich_prices {
        let prices = build_prices(&config)?;
        enrich_prices(prices.as_ref(), &mut transactions).await;
    }

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&transactions)?);
        return Ok(());
    }

    if transactions.is_empty() {
        println!("No transactions found for {}", short_address(cmd.address.trim()));
        return Ok(());
    }

    let classifier = QuickClassifier::new();
    println!(
        "{:<16}  {:<8}  {:<8}  {:>14}  {:<8}  {:<6}  {}",
        "TIME", "TYPE", "CLASS", "AMOUNT", "TOKEN", "SIZE", "SIGNATURE"
    );
    for tx in &transactions {
        println!(
            "{:<16}  {:<8}  {:<8}  {:>14.6}  {:<8}  {:<6}  {}",
            format_time(tx.timestamp),
            tx.tx_type.as_str(),
            format!("{:?}", classifier.classify(tx)),
            tx.amount,
            if tx.token.symbol.is_empty() { "?" } else { tx.token.symbol.as_str() },
            format!("{:?}", classifier.trade_size(tx)),
            short_address(&tx.signature),
        );
    }

    // P&L runs oldest first
    let recent = classifier.recent_trades(&transactions, i64::from(cmd.hours), Utc::now().timestamp_millis());
    let mut chronological: Vec<Transaction> = recent.into_iter().cloned().collect();
    chronological.sort_by_key(|tx| tx.timestamp);

    println!();
    println!(
        "Last {}h: {} transactions, {} tokens, realized P&L ${:.2}",
        cmd.hours,
        chronological.len(),
        classifier.group_by_token(&chronological).len(),
        classifier.calculate_profit_loss(&chronological)
    );
    Ok(())
}

async fn token_command(cmd: TokenCmd, config: Config) -> Result<()> {
    let prices = build_prices(&config)?;
    let info = prices
        .get_token_info(cmd.mint.trim())
        .await
        .context("Failed to fetch token info")?;

    println!("Mint:       {}", info.address);
    println!("Symbol:     {}", if info.symbol.is_empty() { "?" } else { info.symbol.as_str() });
    if !info.name.is_empty() {
        println!("Name:       {}", info.name);
    }
    println!("Decimals:   {}", info.decimals);
    match info.price {
        Some(price) => println!("Price:      ${}", price),
        None => println!("Price:      unknown"),
    }
    if let Some(market_cap) = info.market_cap {
        println!("Market cap: ${:.0}", market_cap);
    }
    if let Some(volume) = info.volume_24h {
        println!("Volume 24h: ${:.0}", volume);
    }
    Ok(())
}

fn rules_command(cmd: RulesCmd, config: Config) -> Result<()> {
    let engine = config.rules_engine().context("Invalid filter rules")?;
    let rules: Vec<_> = if cmd.all {
        engine.all_rules().iter().collect()
    } else {
        engine.active_rules()
    };

    if rules.is_empty() {
        println!("No filter rules configured");
        return Ok(());
    }

    println!("{:<4}  {:<8}  {:<9}  {:<28}  {}", "PRI", "ENABLED", "ACTION", "ID", "NAME");
    for rule in rules {
        println!(
            "{:<4}  {:<8}  {:<9}  {:<28}  {}",
            rule.priority,
            rule.enabled,
            format!("{:?}", rule.action.kind).to_lowercase(),
            rule.id,
            rule.name
        );
    }
    Ok(())
}
