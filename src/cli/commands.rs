//! CLI command definitions using clap.
//!
//! Defines the main CLI structure and subcommands:
//! - simulate: run the admission loops against an in-memory target
//! - bonus: inspect and edit the bonus ledger
//! - config: show or create the configuration file

use admitq::id::PlayerId;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Admitq - priority-queue admission for a capacity-limited target
#[derive(Parser, Debug)]
#[command(name = "admitq")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// Main subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the accrual, admission, and status loops against a simulated target
    Simulate {
        /// Number of players to queue
        #[arg(short, long, default_value_t = 10)]
        players: usize,

        /// Target capacity
        #[arg(long, default_value_t = 3)]
        capacity: i64,

        /// Slots already in use on the target
        #[arg(long, default_value_t = 0)]
        used: i64,

        /// How long to run, in seconds (Ctrl-C stops early)
        #[arg(short, long, default_value_t = 30)]
        seconds: u64,

        /// Free one target slot every N seconds
        #[arg(long)]
        release_every: Option<u64>,

        /// Ledger file to read bonuses from (defaults to the configured one)
        #[arg(long)]
        ledger: Option<PathBuf>,
    },

    /// Bonus ledger commands
    Bonus {
        #[command(subcommand)]
        command: BonusCommands,
    },

    /// Configuration commands
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

/// Bonus ledger subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum BonusCommands {
    /// Show a player's bonus
    Get {
        /// Player id (UUID)
        player: PlayerId,
    },

    /// Set a player's bonus (must be non-negative)
    Set {
        /// Player id (UUID)
        player: PlayerId,
        #[arg(allow_negative_numbers = true)]
        points: i64,
    },

    /// Add to a player's bonus
    Add {
        /// Player id (UUID)
        player: PlayerId,
        #[arg(allow_negative_numbers = true)]
        points: i64,
    },

    /// Subtract from a player's bonus, flooring at zero
    Remove {
        /// Player id (UUID)
        player: PlayerId,
        #[arg(allow_negative_numbers = true)]
        points: i64,
    },

    /// Remove a player from the ledger
    Reset {
        /// Player id (UUID)
        player: PlayerId,
    },

    /// List every stored bonus
    List,
}

/// Configuration subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ConfigCommands {
    /// Print the effective configuration
    Show,

    /// Write a commented default config file
    Init {
        /// Destination (defaults to the user config directory)
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_requires_subcommand() {
        assert!(Cli::try_parse_from(["admitq"]).is_err());
    }

    #[test]
    fn test_cli_verbose_flag() {
        let cli = Cli::try_parse_from(["admitq", "-v", "bonus", "list"]).unwrap();
        assert!(cli.is_verbose());
    }

    #[test]
    fn test_cli_config_option() {
        let cli = Cli::try_parse_from(["admitq", "bonus", "list", "-c", "/path/to/admitq.yml"]).unwrap();
        assert_eq!(cli.config.as_ref(), Some(&PathBuf::from("/path/to/admitq.yml")));
    }

    #[test]
    fn test_simulate_defaults() {
        let cli = Cli::try_parse_from(["admitq", "simulate"]).unwrap();
        match cli.command {
            Commands::Simulate {
                players,
                capacity,
                used,
                seconds,
                release_every,
                ledger,
            } => {
                assert_eq!(players, 10);
                assert_eq!(capacity, 3);
                assert_eq!(used, 0);
                assert_eq!(seconds, 30);
                assert!(release_every.is_none());
                assert!(ledger.is_none());
            }
            _ => panic!("Expected simulate command"),
        }
    }

    #[test]
    fn test_bonus_add_negative() {
        let cli = Cli::try_parse_from([
            "admitq",
            "bonus",
            "add",
            "00000000-0000-0000-0000-000000000007",
            "-3",
        ])
        .unwrap();
        match cli.command {
            Commands::Bonus {
                command: BonusCommands::Add { player, points },
            } => {
                assert_eq!(player, PlayerId::from_u128(7));
                assert_eq!(points, -3);
            }
            _ => panic!("Expected bonus add command"),
        }
    }

    #[test]
    fn test_bonus_rejects_bad_id() {
        assert!(Cli::try_parse_from(["admitq", "bonus", "get", "steve"]).is_err());
    }

    #[test]
    fn test_config_init_force() {
        let cli = Cli::try_parse_from(["admitq", "config", "init", "--force", "/tmp/admitq.yml"]).unwrap();
        match cli.command {
            Commands::Config {
                command: ConfigCommands::Init { path, force },
            } => {
                assert!(force);
                assert_eq!(path, Some(PathBuf::from("/tmp/admitq.yml")));
            }
            _ => panic!("Expected config init command"),
        }
    }

    #[test]
    fn test_cli_debug_assert() {
        Cli::command().debug_assert();
    }
}
