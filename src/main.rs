use anyhow::{Context, Result};
use clap::Parser;
use quire::build::build_site;
use quire::config::Config;
use quire::{logger, server};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "quire", about = "Serve a directory of articles as a blog")]
struct Cli {
    /// The project directory; `quire.yaml` is searched for here and in every
    /// parent directory.
    #[arg(long, default_value = ".")]
    project: PathBuf,

    /// The listen address, overriding `Address` from the project file.
    #[arg(long)]
    address: Option<String>,

    /// The log filter, overriding `LogLevel` from the project file. `RUST_LOG`
    /// still takes precedence.
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::from_directory(&cli.project)?;
    if let Some(address) = cli.address {
        config.address = address;
    }
    if let Some(log_level) = cli.log_level {
        config.log_level = log_level;
    }
    logger::init(&config.log_level)?;

    let site = build_site(&config).context("Building site")?;
    let app = server::router(Arc::new(site));

    let listener = tokio::net::TcpListener::bind(&config.address)
        .await
        .with_context(|| format!("Binding to {}", config.address))?;
    info!(address = %config.address, base_url = %config.base_url, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Serving")?;
    info!("shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(%err, "listening for ctrl-c");
        std::future::pending::<()>().await;
    }
}
