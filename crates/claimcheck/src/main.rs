//! claimcheck CLI - fake-news classification of a text claim paired with an image.
//!
//! claimcheck encodes the claim with a transformer text encoder, detects the
//! objects in the image, fuses the two with cross-attention and asks a trained
//! classifier whether the pair is real or fake. It runs as an HTTP inference
//! server or as a one-shot command.
//!
//! # Usage
//!
//! ```bash
//! # Start the inference server on 127.0.0.1:5000
//! claimcheck serve
//!
//! # Classify a single pair
//! claimcheck predict --text "Flooding closes the bridge" --image photo.jpg
//!
//! # Manage models
//! claimcheck models download
//! ```

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use claimcheck_core::Config;

mod cli;
mod logging;
mod server;

/// claimcheck - classify a claim and image pair as real or fake.
#[derive(Parser, Debug)]
#[command(name = "claimcheck")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    /// Use this config file instead of the default location
    #[arg(long, global = true, env = "CLAIMCHECK_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP inference server
    Serve(cli::serve::ServeArgs),

    /// Classify one claim and image from the command line
    Predict(cli::predict::PredictArgs),

    /// Manage model artifacts (download, list, etc.)
    Models(cli::models::ModelsArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

/// Load the explicit config file, or the default one with a fallback to defaults.
///
/// Logging isn't initialized yet, so warnings go through eprintln.
fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    if let Some(path) = path {
        return Config::load_from(path)
            .map_err(|e| anyhow::anyhow!("Failed to load config {}: {e}", path.display()));
    }

    match Config::load() {
        Ok(config) => Ok(config),
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `claimcheck config path`."
            );
            Ok(Config::default())
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref())?;
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("claimcheck v{}", claimcheck_core::VERSION);

    match cli.command {
        Commands::Serve(args) => cli::serve::execute(args, config).await,
        Commands::Predict(args) => cli::predict::execute(args, config).await,
        Commands::Models(args) => cli::models::execute(args, &config).await,
        Commands::Config(args) => cli::config::execute(args, &config, cli.config.as_deref()),
    }
}
