// SPDX-FileCopyrightText: 2026 Shipwright Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shipwright - operator tooling for agent run checkpoints.
//!
//! This is the binary entry point. It inspects and maintains the
//! checkpoints written by the agent loop and checks whether a run can be
//! resumed.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod backend;
mod checkpoint;
mod resume_check;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use shipwright_config::ShipwrightConfig;
use shipwright_core::ShipwrightError;

/// Shipwright - inspect and maintain coding-agent checkpoints.
#[derive(Parser, Debug)]
#[command(name = "shipwright", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Disable colored output.
    #[arg(long, global = true)]
    plain: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Inspect and manage stored checkpoints.
    Checkpoint {
        #[command(subcommand)]
        action: CheckpointCommands,
    },
    /// Check whether a run can be resumed from its checkpoint.
    ResumeCheck {
        run_id: String,
        /// Print the result as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Configuration utilities.
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[derive(Subcommand, Debug)]
enum CheckpointCommands {
    /// List run IDs with an unexpired checkpoint.
    List {
        #[arg(long)]
        json: bool,
    },
    /// Show one checkpoint's progress and metadata.
    Show {
        run_id: String,
        #[arg(long)]
        json: bool,
    },
    /// Delete a checkpoint.
    Delete { run_id: String },
    /// Remove expired checkpoints from storage.
    Prune,
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Validate configuration and print the effective values.
    Check,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => shipwright_config::load_and_validate_path(path),
        None => shipwright_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            shipwright_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.agent.log_level);

    if let Err(e) = run(cli, config).await {
        eprintln!("shipwright: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: ShipwrightConfig) -> Result<(), ShipwrightError> {
    let plain = cli.plain;
    match cli.command {
        Some(Commands::Checkpoint { action }) => {
            let store = backend::open_store(&config).await?;
            match action {
                CheckpointCommands::List { json } => checkpoint::run_list(&store, json).await,
                CheckpointCommands::Show { run_id, json } => {
                    checkpoint::run_show(&store, &run_id, json, plain).await
                }
                CheckpointCommands::Delete { run_id } => {
                    checkpoint::run_delete(&store, &run_id).await
                }
                CheckpointCommands::Prune => checkpoint::run_prune(&store).await,
            }
        }
        Some(Commands::ResumeCheck { run_id, json }) => {
            let store = backend::open_store(&config).await?;
            resume_check::run_resume_check(store, &run_id, json, plain).await
        }
        Some(Commands::Config {
            action: ConfigCommands::Check,
        }) => {
            print_config(&config);
            Ok(())
        }
        None => {
            println!("shipwright: use --help for available commands");
            Ok(())
        }
    }
}

fn print_config(config: &ShipwrightConfig) {
    println!("configuration OK");
    println!("  agent.name                = {}", config.agent.name);
    println!("  agent.max_turns           = {}", config.agent.max_turns);
    println!("  retry.max_attempts        = {}", config.retry.max_attempts);
    println!("  retry.initial_delay_ms    = {}", config.retry.initial_delay_ms);
    println!("  checkpoint.backend        = {:?}", config.checkpoint.backend);
    println!("  checkpoint.key_prefix     = {}", config.checkpoint.key_prefix);
    println!("  checkpoint.ttl_secs       = {}", config.checkpoint.ttl_secs);
    println!("  storage.database_path     = {}", config.storage.database_path);
}

/// Install the global tracing subscriber. `RUST_LOG` wins over the configured level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("shipwright={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .init();
}
