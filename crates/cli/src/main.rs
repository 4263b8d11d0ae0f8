mod cli;
mod commands;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use seatgrab_core::{load_config, validate_config, Config, ConfigError, SanitizedConfig};

use cli::{Cli, Command};

/// Default config file, used when neither `--config` nor `SEATGRAB_CONFIG` is set.
const DEFAULT_CONFIG: &str = "seatgrab.toml";

#[tokio::main]
async fn main() {
    match run().await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            error!("Fatal error: {:#}", e);
            std::process::exit(1);
        }
    }
}

async fn run() -> Result<i32> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());
    let registry = tracing_subscriber::registry().with(filter);
    if cli.json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    let config = load(cli.config.clone())?;
    validate_config(&config).context("Configuration validation failed")?;

    match cli.command {
        Command::Login(args) => commands::login::run(&config, args).await,
        Command::Catalog(args) => commands::catalog::run(&config, args).await,
        Command::Targets(args) => commands::targets::run(&config, args),
        Command::Run(args) => commands::run::run(&config, args).await,
        Command::Config => {
            let sanitized = SanitizedConfig::from(&config);
            println!("{}", serde_json::to_string_pretty(&sanitized)?);
            Ok(0)
        }
    }
}

/// Load configuration; a missing default file falls back to built-in defaults.
fn load(explicit: Option<PathBuf>) -> Result<Config> {
    let (config_path, explicit) = match explicit.or_else(|| {
        std::env::var("SEATGRAB_CONFIG").ok().map(PathBuf::from)
    }) {
        Some(path) => (path, true),
        None => (PathBuf::from(DEFAULT_CONFIG), false),
    };

    info!("Loading configuration from {:?}", config_path);
    match load_config(&config_path) {
        Ok(config) => Ok(config),
        Err(ConfigError::FileNotFound(_)) if !explicit => {
            warn!("No configuration file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => Err(e).with_context(|| format!("Failed to load config from {:?}", config_path)),
    }
}
