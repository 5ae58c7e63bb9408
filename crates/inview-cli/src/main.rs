use std::fs::{self, File};
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use inview_core::AppConfig;

mod commands;

#[derive(Parser)]
#[command(name = "inview")]
#[command(author, version, about = "Viewport-driven activation and animation runtime")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Use this config file instead of ~/.config/inview/config.toml
    #[arg(short = 'c', long = "config", global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the terminal demo page
    Demo,
    /// Replay a scenario file and print its trace as JSON lines
    Replay {
        /// Path to the scenario TOML file
        path: PathBuf,
        /// Print a readable summary of the final state instead of the trace
        #[arg(short = 's', long)]
        summary: bool,
    },
    /// Show the effective configuration
    Config {
        /// Print only the config file path
        #[arg(long)]
        path: bool,
        /// Write the defaults to the config file if it does not exist
        #[arg(long)]
        init: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = match &cli.config {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load()?,
    };

    match cli.command.unwrap_or(Commands::Demo) {
        Commands::Demo => {
            // The demo owns the terminal, so logs go to a file
            init_file_logging(&config)?;
            commands::demo::run(config)
        }
        Commands::Replay { path, summary } => {
            init_stderr_logging(&config);
            commands::replay::run(&config, &path, summary)
        }
        Commands::Config { path, init } => {
            init_stderr_logging(&config);
            commands::config::run(&config, cli.config.as_deref(), path, init)
        }
    }
}

fn env_filter(config: &AppConfig) -> tracing_subscriber::EnvFilter {
    tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| config.general.log_level.clone()),
    )
}

fn init_stderr_logging(config: &AppConfig) {
    tracing_subscriber::registry()
        .with(env_filter(config))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

fn init_file_logging(config: &AppConfig) -> Result<()> {
    let log_path = config.log_path();
    if let Some(parent) = log_path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = File::create(&log_path)
        .with_context(|| format!("Failed to create log file {}", log_path.display()))?;

    tracing_subscriber::registry()
        .with(env_filter(config))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .init();
    Ok(())
}
