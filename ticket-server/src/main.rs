use std::net::SocketAddr;

use anyhow::{bail, Context};
use clap::Parser;
use mimalloc::MiMalloc;
use ticket_server::{serve, AppState, TicketService, DEFAULT_MAX_CONCURRENCY};
use tracing_subscriber::EnvFilter;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// In-memory ticketing API.
#[derive(Debug, Parser)]
#[command(name = "ticket-server", version)]
struct Cli {
    /// Address to listen on
    #[arg(long, env = "TICKET_SERVER_LISTEN", default_value = "0.0.0.0:8000")]
    listen: SocketAddr,

    /// Requests processed at the same time
    #[arg(long, env = "TICKET_SERVER_MAX_CONCURRENCY", default_value_t = DEFAULT_MAX_CONCURRENCY)]
    max_concurrency: usize,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to build tokio runtime")?;
    let _g = rt.enter();
    rt.block_on(run_server(cli))
}

async fn run_server(cli: Cli) -> anyhow::Result<()> {
    if cli.max_concurrency == 0 {
        bail!("--max-concurrency must be at least 1");
    }
    let listener = tokio::net::TcpListener::bind(cli.listen)
        .await
        .with_context(|| format!("Failed to bind {}", cli.listen))?;
    tracing::info!("listening on {}", cli.listen);
    let state = AppState::new(TicketService::new(), cli.max_concurrency);
    serve(listener, state, async {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("shutting down");
    })
    .await
}
