use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;

use toolgate::api::{AppState, create_router};
use toolgate::config::CONFIG;

#[derive(Debug, Parser)]
#[command(about = "HTTP adapters for web search, RAG retrieval and DOCX generation")]
struct Args {
    /// Listen address, overrides HOST
    #[arg(long)]
    host: Option<String>,
    /// Listen port, overrides PORT
    #[arg(long)]
    port: Option<u16>,
    #[arg(long, default_value = "info")]
    log_level: tracing::Level,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize tracing subscriber (handles both tracing and log crate)
    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .with_target(true)
        .init();

    let mut config = CONFIG.clone();
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }

    if config.rag_allowed_hosts.is_empty() {
        log::warn!("RAG_ALLOWED_HOSTS is empty: retrieval requests may reach any host");
    }

    let addr = config.bind_addr();
    let sweep_interval = config.sweep_interval;
    let state = Arc::new(AppState::new(config)?);
    let sweeper = state.files.clone().spawn_sweeper(sweep_interval);

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    log::info!("listening on http://{addr}");

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            log::info!("shutting down");
        })
        .await
        .context("HTTP server error")?;

    sweeper.abort();
    Ok(())
}
