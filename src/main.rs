//! limitguard - replay transfer scenarios against the time transfers limits module
//!
//! Reads a JSON scenario of compliance bindings and timestamped transfers,
//! checks each transfer against its binding's windows and records the ones
//! that pass.
//!
//! # Usage
//!
//! ```bash
//! limitguard scenario.json
//!
//! # Or with a config file
//! limitguard --config /etc/limitguard/limitguard.toml scenario.json
//! ```

use clap::Parser;
use limitguard::config::Config;
use limitguard::errors::{LimitGuardError, Result};
use limitguard::replay::{ReplayReport, Replayer, Scenario};
use std::path::PathBuf;
use tracing::{error, info};

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser, Debug)]
#[command(name = "limitguard", version, about = "Replay transfers against time-window limits")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// Scenario file to replay; falls back to `replay.scenario_path`
    scenario: Option<PathBuf>,
}

fn main() {
    if let Err(e) = run() {
        error!("{}", e);
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref())?;
    config.validate()?;

    init_logging(&config);
    info!("Starting limitguard v{}", VERSION);

    let scenario_path = cli
        .scenario
        .or_else(|| config.replay.scenario_path.clone())
        .ok_or_else(|| LimitGuardError::ConfigError("No scenario file given".to_string()))?;

    info!("Loading scenario from {:?}", scenario_path);
    let scenario = Scenario::load(&scenario_path)?;

    let report = Replayer::new(config.owner()?)
        .record_exempt_transfers(config.module.record_exempt_transfers)
        .run(&scenario)?;

    print_report(&report, &config.replay.output)
}

/// Initialize logging
fn init_logging(config: &Config) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    let registry = tracing_subscriber::registry().with(filter);
    if config.logging.format == "json" {
        registry.with(fmt::layer().json().with_writer(std::io::stderr)).init();
    } else {
        registry.with(fmt::layer().with_writer(std::io::stderr)).init();
    }
}

fn print_report(report: &ReplayReport, output: &str) -> Result<()> {
    if output == "json" {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    for outcome in &report.outcomes {
        println!(
            "#{:<4} t={} {} -> {} amount={} {}",
            outcome.index,
            outcome.at,
            outcome.from,
            outcome.to,
            outcome.amount,
            if outcome.allowed { "ALLOWED" } else { "REJECTED" }
        );
    }
    for snapshot in &report.counters {
        println!(
            "counter {} {} window={}s value={} ends={}",
            snapshot.compliance,
            snapshot.identity,
            snapshot.limit_time,
            snapshot.counter.value,
            snapshot.counter.timer
        );
    }
    println!(
        "{} transfers: {} allowed, {} rejected",
        report.outcomes.len(),
        report.allowed(),
        report.rejected()
    );
    Ok(())
}
