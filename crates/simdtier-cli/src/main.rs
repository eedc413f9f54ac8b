//! `simdtier` - report what the dispatcher detected and time the built-in
//! kernels on every tier this host can run.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

/// simdtier - CPU feature detection and SIMD dispatch diagnostics
#[derive(Parser, Debug)]
#[command(name = "simdtier")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show detected features, compiled tiers and the selected tier
    Info {
        /// Print JSON instead of tables
        #[arg(long)]
        json: bool,

        /// Validate a TOML file layered under the SIMDTIER_ environment variables
        /// (reported only; the selector reads the environment)
        #[arg(long, env = "SIMDTIER_CONFIG")]
        config: Option<PathBuf>,
    },

    /// Time every built-in kernel on every host-supported tier
    Bench {
        /// Elements per slice
        #[arg(long, default_value = "4096")]
        len: usize,

        /// Timed calls per kernel and tier
        #[arg(long, default_value = "200")]
        iters: u32,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| default.into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Info { json, config } => commands::info(json, config.as_deref()),
        Commands::Bench { len, iters, json } => commands::bench(len, iters, json),
    }
}
