//! CLI Command Definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub const DEFAULT_CONFIG_PATH: &str = "config/lemora.toml";

/// Lemora - Solana wallet tracker
#[derive(Parser, Debug)]
#[command(
    name = "lemora",
    version = env!("CARGO_PKG_VERSION"),
    about = "Track Solana wallets and surface significant activity",
    long_about = "Lemora watches a list of Solana wallets over a live websocket feed, \
                  filters their transactions through configurable rules and raises \
                  notifications for significant activity."
)]
pub struct CliApp {
    /// The command to execute
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the tracker daemon (JSON lines on stdin/stdout)
    Run(RunCmd),

    /// Start watching a wallet
    Add(AddCmd),

    /// Stop watching a wallet
    Remove(RemoveCmd),

    /// List watched wallets
    List(ListCmd),

    /// Show a wallet summary
    Info(InfoCmd),

    /// Show recent transactions for a wallet
    Txs(TxsCmd),

    /// Look up token metadata and price
    Token(TokenCmd),

    /// List the active filter rules
    Rules(RulesCmd),
}

/// Run the tracker daemon
#[derive(Parser, Debug)]
pub struct RunCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Disable the live websocket feed
    #[arg(long)]
    pub no_stream: bool,
}

#[derive(Parser, Debug)]
pub struct AddCmd {
    /// Wallet address (base58)
    #[arg(value_name = "ADDRESS")]
    pub address: String,

    #[arg(short, long, value_name = "FILE", default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,
}

#[derive(Parser, Debug)]
pub struct RemoveCmd {
    #[arg(value_name = "ADDRESS")]
    pub address: String,

    #[arg(short, long, value_name = "FILE", default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,
}

#[derive(Parser, Debug)]
pub struct ListCmd {
    #[arg(short, long, value_name = "FILE", default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,
}

#[derive(Parser, Debug)]
pub struct InfoCmd {
    #[arg(value_name = "ADDRESS")]
    pub address: String,

    #[arg(short, long, value_name = "FILE", default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Print raw JSON
    #[arg(long)]
    pub json: bool,
}

/// Recent transactions with trade classification
#[derive(Parser, Debug)]
pub struct TxsCmd {
    #[arg(value_name = "ADDRESS")]
    pub address: String,

    #[arg(short, long, value_name = "FILE", default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Number of transactions to fetch
    #[arg(short, long, value_name = "N")]
    pub limit: Option<usize>,

    /// Hide transactions with an amount below this
    #[arg(long, value_name = "AMOUNT")]
    pub min_amount: Option<f64>,

    /// Window for the P&L summary
    #[arg(long, value_name = "HOURS", default_value = "24")]
    pub hours: u32,

    /// Print raw JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser, Debug)]
pub struct TokenCmd {
    /// Token mint address
    #[arg(value_name = "MINT")]
    pub mint: String,

    #[arg(short, long, value_name = "FILE", default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,
}

#[derive(Parser, Debug)]
pub struct RulesCmd {
    #[arg(short, long, value_name = "FILE", default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Include disabled rules
    #[arg(short, long)]
    pub all: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    const WALLET: &str = "86xCnPeV69n6t3DnyGvkKobf9FdN2H9oiVDdaMpo2MMY";

    #[test]
    fn test_cli_app_parse_run() {
        let args = vec!["lemora", "run", "--config", "test.toml"];
        let app = CliApp::try_parse_from(args).unwrap();

        match app.command {
            Command::Run(cmd) => {
                assert_eq!(cmd.config, PathBuf::from("test.toml"));
                assert!(!cmd.no_stream);
            }
            _ => panic!("Expected Run command"),
        }
    }

    #[test]
    fn test_default_config_path() {
        let app = CliApp::try_parse_from(vec!["lemora", "run"]).unwrap();

        match app.command {
            Command::Run(cmd) => {
                assert_eq!(cmd.config, PathBuf::from("config/lemora.toml"));
            }
            _ => panic!("Expected Run command"),
        }
    }

    #[test]
    fn test_cli_app_parse_add_remove() {
        let app = CliApp::try_parse_from(vec!["lemora", "add", WALLET]).unwrap();
        match app.command {
            Command::Add(cmd) => assert_eq!(cmd.address, WALLET),
            _ => panic!("Expected Add command"),
        }

        let app = CliApp::try_parse_from(vec!["lemora", "remove", WALLET, "-c", "x.toml"]).unwrap();
        match app.command {
            Command::Remove(cmd) => {
                assert_eq!(cmd.address, WALLET);
                assert_eq!(cmd.config, PathBuf::from("x.toml"));
            }
            _ => panic!("Expected Remove command"),
        }
    }

    #[test]
    fn test_add_requires_address() {
        assert!(CliApp::try_parse_from(vec!["lemora", "add"]).is_err());
    }

    #[test]
    fn test_cli_app_parse_txs() {
        let args = vec![
            "lemora", "txs", WALLET,
            "--limit", "50",
            "--min-amount", "0.5",
            "--hours", "48",
        ];
        let app = CliApp::try_parse_from(args).unwrap();

        match app.command {
            Command::Txs(cmd) => {
                assert_eq!(cmd.limit, Some(50));
                assert_eq!(cmd.min_amount, Some(0.5));
                assert_eq!(cmd.hours, 48);
                assert!(!cmd.json);
            }
            _ => panic!("Expected Txs command"),
        }
    }

    #[test]
    fn test_txs_hours_must_be_non_negative_and_bounded() {
        assert!(CliApp::try_parse_from(vec!["lemora", "txs", WALLET, "--hours", "-1"]).is_err());
        assert!(
            CliApp::try_parse_from(vec!["lemora", "txs", WALLET, "--hours", "3000000000000"]).is_err()
        );
    }

    #[test]
    fn test_cli_app_parse_txs_defaults() {
        let app = CliApp::try_parse_from(vec!["lemora", "txs", WALLET]).unwrap();

        match app.command {
            Command::Txs(cmd) => {
                assert_eq!(cmd.limit, None);
                assert_eq!(cmd.min_amount, None);
                assert_eq!(cmd.hours, 24);
            }
            _ => panic!("Expected Txs command"),
        }
    }

    #[test]
    fn test_cli_app_parse_token_and_rules() {
        let app = CliApp::try_parse_from(vec![
            "lemora",
            "token",
            "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v",
        ])
        .unwrap();
        assert!(matches!(app.command, Command::Token(_)));

        let app = CliApp::try_parse_from(vec!["lemora", "rules", "--all"]).unwrap();
        match app.command {
            Command::Rules(cmd) => assert!(cmd.all),
            _ => panic!("Expected Rules command"),
        }
    }

    #[test]
    fn test_global_flags() {
        let args = vec!["lemora", "-v", "--debug", "list"];
        let app = CliApp::try_parse_from(args).unwrap();

        assert!(app.verbose);
        assert!(app.debug);
    }
}
