use clap::Parser;
use ivescripts::{config::Config, logging::init_tracing, start_server_with_config};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "ivescripts-server", version, about = "Interactive script directory server")]
struct Args {
    /// TOML or YAML configuration file
    #[arg(short, long, env = "IVESCRIPTS_CONFIG")]
    config: Option<PathBuf>,

    /// Override the bind host
    #[arg(long)]
    host: Option<String>,

    /// Override the bind port
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = Config::load(args.config.as_deref())?;
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    config.validate()?;

    init_tracing(&config.logging)?;

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    let port = start_server_with_config(config, shutdown_rx).await?;
    info!(port, "server started");

    tokio::signal::ctrl_c().await?;
    info!("shutdown requested, stopping server...");

    let _ = shutdown_tx.send(());
    tokio::time::sleep(Duration::from_millis(200)).await;

    info!("server stopped");
    Ok(())
}
