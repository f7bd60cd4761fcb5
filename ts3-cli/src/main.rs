//! # ts3bridge
//!
//! CLI tool for exercising the TeamSpeak 3 synchronous bridge against the
//! simulated client library.
//!
//! ## Commands
//!
//! - `demo`: Walk one connection through its whole life
//! - `race`: Concurrent connect vs disconnect on fresh handles
//! - `stress`: Many concurrent correlated requests
//! - `codes`: List known result codes
//!
//! ## Example
//!
//! ```bash
//! # One connection, every step's final code
//! ts3bridge demo
//!
//! # 200 rounds of connect/disconnect races
//! ts3bridge race --rounds 200
//!
//! # 2000 requests on 16 threads, 5% of events lost
//! ts3bridge stress --requests 2000 --threads 16 --drop-rate 0.05
//!
//! # Channel-related result codes
//! ts3bridge codes channel
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

use commands::{codes, demo, race, stress};
use config::CliConfig;

/// CLI tool for exercising the TeamSpeak 3 synchronous bridge.
#[derive(Parser, Debug)]
#[command(name = "ts3bridge")]
#[command(version, about, long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    /// Log bridge internals (debug level)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Connect, move, kick, delete and disconnect, printing each final code
    Demo,

    /// Race connect against disconnect on fresh handles
    Race {
        /// Number of rounds
        #[arg(long, default_value = "100")]
        rounds: usize,
    },

    /// Fire concurrent correlated requests and print an outcome histogram
    Stress {
        /// Total number of requests
        #[arg(long, default_value = "1000")]
        requests: usize,

        /// Caller threads
        #[arg(long, default_value = "8")]
        threads: usize,

        /// Probability that an outcome event is lost (0.0 - 1.0)
        #[arg(long, default_value = "0.0")]
        drop_rate: f64,

        /// Override the simulated event jitter in milliseconds
        #[arg(long)]
        jitter_ms: Option<u64>,

        /// Print the histogram as JSON
        #[arg(long)]
        json: bool,
    },

    /// List known result codes
    Codes {
        /// Only codes whose name contains this text (case-insensitive)
        filter: Option<String>,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = CliConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Demo => {
            demo::run(config).await?;
        }
        Commands::Race { rounds } => {
            race::run(config, rounds).await?;
        }
        Commands::Stress {
            requests,
            threads,
            drop_rate,
            jitter_ms,
            json,
        } => {
            let options = stress::StressOptions {
                requests,
                threads,
                drop_rate,
                jitter_ms,
            };
            stress::run(config, options, json).await?;
        }
        Commands::Codes { filter, json } => {
            codes::run(filter.as_deref(), json)?;
        }
    }

    Ok(())
}
