use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use floorplan_forge::{ServerConfig, ServerContext};
use tracing_subscriber::EnvFilter;

/// Multi-agent iterative floor plan design server.
#[derive(Parser, Debug)]
#[command(name = "floorplan-forge", version, about)]
struct Cli {
    /// Path to a YAML config file. Falls back to built-in defaults if omitted.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Override the configured bind address.
    #[arg(long, value_name = "ADDR")]
    bind_addr: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let mut config = ServerConfig::load_with_env(cli.config.as_deref())?;
    if let Some(bind_addr) = cli.bind_addr {
        config.bind_addr = bind_addr;
    }

    let api_key = std::env::var(&config.llm.api_key_env).map_err(|_| {
        anyhow::anyhow!(
            "missing LLM credential: environment variable '{}' is not set",
            config.llm.api_key_env
        )
    })?;

    let bind_addr = config.bind_addr;
    let ctx = ServerContext::new(config, api_key);
    let app = floorplan_forge::server::build_router(ctx);

    tracing::info!(%bind_addr, "starting floorplan-forge server");
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
