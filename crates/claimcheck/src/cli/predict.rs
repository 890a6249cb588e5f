//! The `claimcheck predict` command: classify one claim and image offline.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Args;
use claimcheck_core::{Config, Predictor};

/// Arguments for the `predict` command.
#[derive(Args, Debug)]
pub struct PredictArgs {
    /// The claim text to check
    #[arg(short, long)]
    pub text: String,

    /// Path to the image paired with the claim
    #[arg(short, long, value_name = "PATH")]
    pub image: PathBuf,

    /// Pretty-print the JSON result
    #[arg(long)]
    pub pretty: bool,
}

/// Execute the predict command, printing the analysis JSON to stdout.
pub async fn execute(args: PredictArgs, config: Config) -> anyhow::Result<()> {
    if args.text.is_empty() {
        anyhow::bail!("Missing input: --text must not be empty");
    }

    let image_bytes = tokio::fs::read(&args.image)
        .await
        .with_context(|| format!("Failed to read image {}", args.image.display()))?;
    if image_bytes.is_empty() {
        anyhow::bail!("Missing input: {} is empty", args.image.display());
    }

    let predictor = tokio::task::spawn_blocking(move || Predictor::load(&config))
        .await?
        .context("Failed to load models. Run `claimcheck models download` first")?;

    let analysis = Arc::new(predictor)
        .predict_blocking(args.text, image_bytes)
        .await?;

    let json = if args.pretty {
        serde_json::to_string_pretty(&analysis)?
    } else {
        serde_json::to_string(&analysis)?
    };
    println!("{json}");

    Ok(())
}
