//! Scorecast feed server
//!
//! Serves the HTTP surface and runs the match clock ticker on the same
//! `SimulationService` until Ctrl-C.

use anyhow::{Context, Result};
use clap::Parser;
use scorecast_api::{serve, AppState};
use scorecast_core::{FeedConfig, SimulationService};
use scorecast_env::{FeedContext, TokioContext};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Live fantasy-scoring feed server
#[derive(Parser, Debug)]
#[command(name = "scorecast-server")]
#[command(about = "Serve the simulated live fantasy-scoring feed", long_about = None)]
struct Args {
    /// Address to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value = "3001")]
    port: u16,

    /// JSON feed configuration (defaults apply to anything it leaves out)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Seed the feed for a reproducible run (default: OS entropy)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = match &args.config {
        Some(path) => FeedConfig::from_json_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => FeedConfig::default(),
    };

    let ctx = Arc::new(match args.seed {
        Some(seed) => TokioContext::seeded(seed),
        None => TokioContext::new(),
    });

    let service = SimulationService::new(Arc::clone(&ctx), config).context("building feed")?;
    let service = Arc::new(service);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let ticker = Arc::clone(&service);
    ctx.spawn("match-clock", async move { ticker.run_clock(shutdown_rx).await });

    let addr: SocketAddr = format!("{}:{}", args.host, args.port)
        .parse()
        .with_context(|| format!("invalid bind address {}:{}", args.host, args.port))?;

    info!("Scorecast feed server v{}", env!("CARGO_PKG_VERSION"));
    info!(players = service.roster().len(), "Roster loaded");

    serve(addr, AppState::new(service), async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl-C; running until killed");
            std::future::pending::<()>().await;
        }
        info!("Shutting down");
        let _ = shutdown_tx.send(true);
    })
    .await?;

    Ok(())
}
