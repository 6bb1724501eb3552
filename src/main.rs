use admitq::config::Config;
use admitq::daemon::{Daemon, Intervals, TickState};
use admitq::downstream::InMemoryTarget;
use admitq::id::PlayerId;
use admitq::manager::QueueManager;
use admitq::notify::LogNotifier;
use admitq::storage::LedgerStore;
use clap::Parser;
use colored::*;
use eyre::{Context, Result, bail};
use log::info;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

mod cli;

use cli::Cli;
use cli::commands::{BonusCommands, Commands, ConfigCommands};

fn setup_logging(level: log::LevelFilter) -> Result<()> {
    // Create log directory
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(env!("CARGO_PKG_NAME"))
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join(format!("{}.log", env!("CARGO_PKG_NAME")));

    // Setup env_logger with file output
    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    // RUST_LOG, when set, overrides the configured level
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

async fn run_application(cli: &Cli, config: &Config) -> Result<()> {
    info!("Starting application");

    if cli.is_verbose() {
        println!("{}", "Verbose mode enabled".yellow());
        println!("  target: {}", config.target_server);
        println!("  ledger: {}", config.bonus_points_file.display());
    }

    match &cli.command {
        Commands::Simulate {
            players,
            capacity,
            used,
            seconds,
            release_every,
            ledger,
        } => {
            let sim = Simulation {
                players: *players,
                capacity: *capacity,
                used: *used,
                duration: Duration::from_secs(*seconds),
                release_every: release_every.map(|secs| Intervals::bounded(Duration::from_secs(secs))),
                ledger: ledger.clone().unwrap_or_else(|| config.bonus_points_file.clone()),
            };
            run_simulation(&sim, config).await
        }
        Commands::Bonus { command } => handle_bonus_command(command, config),
        Commands::Config { command } => handle_config_command(command, cli, config),
    }
}

struct Simulation {
    players: usize,
    capacity: i64,
    used: i64,
    duration: Duration,
    release_every: Option<Duration>,
    ledger: PathBuf,
}

async fn run_simulation(sim: &Simulation, config: &Config) -> Result<()> {
    if sim.capacity < 0 || sim.used < 0 {
        bail!("capacity and used must be non-negative");
    }
    info!(
        "Simulating {} players against {} ({}/{})",
        sim.players, config.target_server, sim.used, sim.capacity
    );

    let manager = Arc::new(QueueManager::open(LedgerStore::new(&sim.ledger)));
    let target = Arc::new(InMemoryTarget::new(config.target_server.clone(), sim.used, sim.capacity));

    for _ in 0..sim.players {
        manager.join(PlayerId::random()).context("Failed to queue simulated player")?;
    }
    println!(
        "{} {} players queued for {} ({}/{} slots used)",
        "Simulating:".green(),
        sim.players,
        config.target_server.cyan(),
        sim.used,
        sim.capacity
    );

    let daemon = Daemon::from_config(
        config,
        Arc::clone(&manager),
        target.clone(),
        target.clone(),
        Arc::new(LogNotifier),
    );

    let releaser = sim.release_every.map(|period| {
        let target = Arc::clone(&target);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            loop {
                interval.tick().await;
                target.release();
            }
        })
    });

    tokio::select! {
        _ = tokio::time::sleep(sim.duration) => {}
        _ = tokio::signal::ctrl_c() => {
            println!("{}", "Interrupted".yellow());
        }
    }

    if let Some(releaser) = releaser {
        releaser.abort();
    }
    let summary = daemon.shutdown().await;
    print_summary(&summary, &manager, &target);
    Ok(())
}

fn print_summary(summary: &TickState, manager: &QueueManager, target: &InMemoryTarget) {
    println!();
    println!("{}", "Summary".bold());
    println!("  admitted:        {}", summary.admitted.to_string().green());
    println!("  target full:     {}", summary.target_full);
    println!("  probe failures:  {}", summary.probe_failures.to_string().red());
    println!("  accrual ticks:   {}", summary.accrual_ticks);
    println!("  leaderboards:    {}", summary.leaderboards);
    println!("  target usage:    {}", target.used());
    println!("  still queued:    {}", manager.len());

    for row in manager.snapshot(5) {
        println!(
            "  {:>3}. {} {} pts ({} queue + {} bonus)",
            row.rank,
            row.player.short().cyan(),
            row.total,
            row.queue_points,
            row.bonus
        );
    }
}

fn handle_bonus_command(command: &BonusCommands, config: &Config) -> Result<()> {
    info!("Handling bonus command: {:?}", command);
    let manager = QueueManager::open(LedgerStore::new(&config.bonus_points_file));

    let update = match command {
        BonusCommands::Get { player } => {
            println!("{} {}", player, manager.bonus(player));
            return Ok(());
        }
        BonusCommands::List => {
            let entries = manager.bonus_entries();
            if entries.is_empty() {
                println!("{}", "No bonus points stored".yellow());
            }
            for (player, bonus) in entries {
                println!("{} {}", player, bonus);
            }
            return Ok(());
        }
        BonusCommands::Set { player, points } => manager.set_bonus(*player, *points),
        BonusCommands::Add { player, points } => manager.add_bonus(*player, *points),
        BonusCommands::Remove { player, points } => manager.remove_bonus(*player, *points),
        BonusCommands::Reset { player } => manager.reset_bonus(*player),
    }
    .context("Bonus update failed")?;

    println!("{} {} now has {} bonus points", "Updated:".green(), update.player, update.bonus);
    Ok(())
}

fn handle_config_command(command: &ConfigCommands, cli: &Cli, config: &Config) -> Result<()> {
    match command {
        ConfigCommands::Show => {
            let yaml = serde_yaml::to_string(config).context("Failed to serialize config")?;
            print!("{}", yaml);
        }
        ConfigCommands::Init { path, force } => {
            let path = match path.clone().or_else(|| cli.config.clone()) {
                Some(path) => path,
                None => dirs::config_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join(env!("CARGO_PKG_NAME"))
                    .join(format!("{}.yml", env!("CARGO_PKG_NAME"))),
            };
            if path.exists() && !force {
                bail!("{} already exists (use --force to overwrite)", path.display());
            }
            Config::write_default(&path)?;
            println!("{} {}", "Wrote:".green(), path.display());
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // `config init` must work even when the target path holds a broken file
    let config = match &cli.command {
        Commands::Config {
            command: ConfigCommands::Init { .. },
        } => Config::default(),
        _ => Config::load(cli.config.as_ref()).context("Failed to load configuration")?,
    };

    // Logging level comes from the config, so it is set up second
    setup_logging(config.log_filter()?).context("Failed to setup logging")?;

    info!("Starting with config from: {:?}", cli.config);

    // Run the main application logic
    run_application(&cli, &config).await.context("Application failed")?;

    Ok(())
}
