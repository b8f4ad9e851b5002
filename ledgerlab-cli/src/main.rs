//! LedgerLab CLI — run backtests from TOML config files.
//!
//! Commands:
//! - `run`: execute a backtest, print the report, optionally save artifacts
//! - `holdings`: execute a backtest and list open positions with holding periods

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use ledgerlab_runner::{run_from_config, save_artifacts, BacktestConfig, RunOutcome};

#[derive(Parser)]
#[command(
    name = "ledgerlab",
    about = "LedgerLab CLI: callback-driven backtests over a cash ledger"
)]
struct Cli {
    /// Raise log verbosity (-v info, -vv debug, -vvv trace). `RUST_LOG` wins if set.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a backtest and print its report.
    Run {
        /// Path to a TOML config file.
        #[arg(long)]
        config: PathBuf,

        /// Input CSV. Overrides `backtest.data` from the config.
        #[arg(long)]
        data: Option<PathBuf>,

        /// Save report, ledger and summary into a new directory here.
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// Execute a backtest and list open positions with days held.
    Holdings {
        /// Path to a TOML config file.
        #[arg(long)]
        config: PathBuf,

        /// Input CSV. Overrides `backtest.data` from the config.
        #[arg(long)]
        data: Option<PathBuf>,

        /// Date to measure holding periods against (YYYY-MM-DD).
        #[arg(long, value_parser = parse_date)]
        as_of: NaiveDate,

        /// Ignore trades after this date (YYYY-MM-DD).
        #[arg(long, value_parser = parse_date)]
        cutoff: Option<NaiveDate>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Run {
            config,
            data,
            output_dir,
        } => run_cmd(config, data, output_dir),
        Commands::Holdings {
            config,
            data,
            as_of,
            cutoff,
        } => holdings_cmd(config, data, as_of, cutoff),
    }
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn parse_date(s: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
}

fn load_and_run(config_path: &Path, data: Option<PathBuf>) -> Result<RunOutcome> {
    let config = BacktestConfig::from_file(config_path)
        .with_context(|| format!("failed to load config {}", config_path.display()))?;
    tracing::info!(
        callbacks = config.callbacks.as_ref().map_or(1, Vec::len),
        initial_cash = config.backtest.initial_cash,
        "loaded config"
    );
    Ok(run_from_config(&config, data.as_deref())?)
}

fn run_cmd(config_path: PathBuf, data: Option<PathBuf>, output_dir: Option<PathBuf>) -> Result<()> {
    let outcome = load_and_run(&config_path, data)?;

    println!("{}", outcome.result.report);
    println!();
    println!("Fingerprint: {}", outcome.result.fingerprint);

    if let Some(dir) = output_dir {
        let run_dir = save_artifacts(&outcome.result, &dir)?;
        println!("Artifacts saved to: {}", run_dir.display());
    }

    Ok(())
}

fn holdings_cmd(
    config_path: PathBuf,
    data: Option<PathBuf>,
    as_of: NaiveDate,
    cutoff: Option<NaiveDate>,
) -> Result<()> {
    let outcome = load_and_run(&config_path, data)?;
    let ledger = outcome.engine.ledger();

    let positions = ledger.open_positions();
    if positions.is_empty() {
        println!("No open positions.");
    } else {
        println!("{:<12} {:>12}", "code", "quantity");
        for (code, amount) in &positions {
            println!("{code:<12} {amount:>12}");
        }
    }

    let periods = ledger.holding_periods(as_of, cutoff);
    println!();
    match cutoff {
        Some(limit) => println!("Holding periods as of {as_of} (trades up to {limit}):"),
        None => println!("Holding periods as of {as_of}:"),
    }
    if periods.is_empty() {
        println!("  none");
    }
    for (code, days) in &periods {
        println!("  {code:<12} {days:>6} days");
    }

    Ok(())
}
