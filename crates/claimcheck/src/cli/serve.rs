//! The `claimcheck serve` command: load the models and run the HTTP server.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use clap::Args;
use claimcheck_core::{Config, Predictor};

use crate::server::{self, AppState};

/// Arguments for the `serve` command.
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Address to listen on (overrides `server.listen_addr`)
    #[arg(short, long, value_name = "ADDR")]
    pub listen: Option<String>,
}

/// Execute the serve command.
pub async fn execute(args: ServeArgs, mut config: Config) -> anyhow::Result<()> {
    if let Some(listen) = args.listen {
        config.server.listen_addr = listen;
    }
    let listen_addr: SocketAddr = config
        .server
        .listen_addr
        .parse()
        .with_context(|| format!("Invalid listen address: {}", config.server.listen_addr))?;

    let model_config = config.clone();
    let predictor = tokio::task::spawn_blocking(move || Predictor::load(&model_config))
        .await?
        .context("Failed to load models. Run `claimcheck models download` first")?;

    let state = Arc::new(AppState {
        predictor: Arc::new(predictor),
    });
    let app = server::build_router(state, &config)?;

    let listener = tokio::net::TcpListener::bind(listen_addr)
        .await
        .with_context(|| format!("Failed to bind {listen_addr}"))?;
    tracing::info!(%listen_addr, "claimcheck server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(server::shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}
