//! Microbial-Risk Service - Main Entry Point

use api::{init_logging, run_server, AppConfig};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load()?;
    init_logging(&config.logging)?;

    info!("=== Microbial-Risk Service v{} ===", env!("CARGO_PKG_VERSION"));
    info!("Training classifier from {}...", config.model.dataset_path.display());

    run_server(config).await
}
