//! CLI module for admitq - command-line interface and subcommands.
//!
//! Provides the main entry point with subcommands for running a simulation,
//! editing the bonus ledger, and managing configuration.

pub mod commands;

pub use commands::Cli;
