//! CLI Adapter
//!
//! Command-line interface for the Lemora wallet tracker.
//! Uses clap derive macros for argument parsing.

mod commands;

pub use commands::{
    AddCmd, CliApp, Command, InfoCmd, ListCmd, RemoveCmd, RulesCmd, RunCmd, TokenCmd, TxsCmd,
    DEFAULT_CONFIG_PATH,
};
