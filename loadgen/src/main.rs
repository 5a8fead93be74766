use anyhow::Context;
use clap::Parser;
use loadgen::cli::Cli;
use loadgen::{logging, CreateEventTask, HttpClient, Runner};
use tokio::sync::watch;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init();
    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to build tokio runtime")?;
    let _guard = rt.enter();
    rt.block_on(run_loadgen(cli))
}

async fn run_loadgen(cli: Cli) -> anyhow::Result<()> {
    let config = cli.run_config()?;
    let client = HttpClient::new(&cli.host)?.with_timeout(cli.request_timeout);
    let task = CreateEventTask::new()?.requests_per_task(cli.requests_per_task);
    let runner = Runner::new(client, task, config)?;

    let (stop_tx, stop_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("received Ctrl-C, stopping users");
            let _ = stop_tx.send(true);
        }
    });

    let summary = runner.run(stop_rx).await?;
    println!("{summary}");
    Ok(())
}
