//! Note CLI - Operator Commands for Structured Note Settlement
//!
//! This is the operational entry point for the structured note workspace.
//! Every command runs against a scenario file describing the oracle clock,
//! directories, reported prices and named instruments.
//!
//! # Commands
//!
//! - `note encode-barrier` / `note decode-barrier` - Barrier codec
//! - `note id` - Fingerprint scenario instruments without registering
//! - `note register` - Register scenario instruments and list them
//! - `note breaches` - Breach record of one barrier
//! - `note payout` - Per-component payouts without settling
//! - `note settle` - Burn units and route payouts
//! - `note check` - Validate configuration and scenario
//!
//! # Architecture
//!
//! As the operator layer of the workspace, this crate wires `note_core`
//! and `note_settlement` to files, terminals and logs.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::debug;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;
mod config;
mod error;
mod scenario;

pub use error::{CliError, Result};

use commands::Context;
use config::{build_config, CliArgs};

/// Structured note settlement CLI
#[derive(Parser)]
#[command(name = "note")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file path (TOML format)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Scenario file path [default: note.toml]
    #[arg(short, long, global = true, value_name = "FILE")]
    scenario: Option<PathBuf>,

    /// Output format (table, json)
    #[arg(short, long, global = true)]
    format: Option<String>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Pack barrier fields into a barrier id
    EncodeBarrier {
        /// Threshold relative to the initial spot (10000 = 100%)
        #[arg(short, long)]
        pct: u16,

        /// Observation frequency (none, 1s, 1d, 1w, 2w, 1m, 2m, 3m, 6m, 9m, 1y)
        #[arg(short = 'q', long, default_value = "none")]
        frequency: String,

        /// Trigger role (autocall, ko, ki)
        #[arg(short, long)]
        trigger: String,
    },

    /// Unpack a barrier id (decimal or 0x hex)
    DecodeBarrier {
        /// Barrier id
        id: String,
    },

    /// Fingerprint scenario instruments without registering them
    Id {
        /// Only this instrument
        #[arg(short, long)]
        instrument: Option<String>,
    },

    /// Register scenario instruments and list the registry
    Register,

    /// Breach record of one barrier
    Breaches {
        /// Instrument name
        #[arg(short, long)]
        instrument: String,

        /// Barrier: autocall, coupon:N, option:N or a raw id
        #[arg(short, long)]
        barrier: String,
    },

    /// Per-component payouts without settling
    Payout {
        /// Instrument name
        #[arg(short, long)]
        instrument: String,

        /// Units held, in whole units (e.g. 10 or 2.5)
        #[arg(short, long)]
        amount: String,

        /// Accept prices still inside their dispute window
        #[arg(long)]
        preview: bool,
    },

    /// Burn units and route payouts to the margin engine
    Settle {
        /// Instrument name
        #[arg(short, long)]
        instrument: String,

        /// Account holding the units
        #[arg(long)]
        account: String,

        /// Units settled, in whole units
        #[arg(short, long)]
        amount: String,
    },

    /// Check configuration and scenario
    Check,
}

fn init_tracing(log_level: LevelFilter) {
    // RUST_LOG directives refine the configured default
    let filter = EnvFilter::builder()
        .with_default_directive(log_level.into())
        .from_env_lossy();
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = build_config(&CliArgs {
        config_file: cli.config.clone(),
        scenario: cli.scenario.clone(),
        log_level: cli.log_level.clone(),
        format: cli.format.clone(),
        verbose: cli.verbose,
    })?;

    init_tracing(config.log_level);
    debug!(
        log_level = %config.log_level,
        format = %config.output_format,
        require_final_prices = config.settlement.require_final_prices,
        "Configuration loaded"
    );

    let context = Context::new(config);
    match cli.command {
        Commands::EncodeBarrier {
            pct,
            frequency,
            trigger,
        } => commands::barrier::encode(&context, pct, &frequency, &trigger),
        Commands::DecodeBarrier { id } => commands::barrier::decode(&context, &id),
        Commands::Id { instrument } => commands::instrument::run_id(&context, instrument.as_deref()),
        Commands::Register => commands::instrument::run_register(&context),
        Commands::Breaches {
            instrument,
            barrier,
        } => commands::breaches::run(&context, &instrument, &barrier),
        Commands::Payout {
            instrument,
            amount,
            preview,
        } => commands::payout::run(&context, &instrument, &amount, preview),
        Commands::Settle {
            instrument,
            account,
            amount,
        } => commands::settle::run(&context, &instrument, &account, &amount),
        Commands::Check => commands::check::run(&context),
    }
}
