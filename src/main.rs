//! HTTP server for the tax engine.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use tax_engine::api::{AppState, create_router};
use tax_engine::config::ConfigLoader;

#[derive(Debug, Parser)]
#[command(name = "tax-engine", version, about = "UK, EU and US tax calculation server")]
struct Args {
    /// Directory of YAML rule tables. Uses the built-in tables when omitted.
    #[arg(long, env = "TAX_ENGINE_CONFIG")]
    config: Option<PathBuf>,

    /// Address to listen on.
    #[arg(long, env = "TAX_ENGINE_BIND", default_value = "127.0.0.1:3000")]
    bind: SocketAddr,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let loader = match &args.config {
        Some(dir) => ConfigLoader::load(dir)
            .with_context(|| format!("loading rule tables from {}", dir.display()))?,
        None => ConfigLoader::builtin().context("loading built-in rule tables")?,
    };

    let app = create_router(AppState::new(loader));

    let listener = tokio::net::TcpListener::bind(args.bind)
        .await
        .with_context(|| format!("binding {}", args.bind))?;
    info!(addr = %args.bind, "tax-engine listening");

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
