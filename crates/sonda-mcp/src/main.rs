//! Sonda MCP server binary.
//!
//! This binary runs the MCP server using stdio transport. Configuration comes
//! from `$SONDA_CONFIG` and the `SONDA_*` environment variables.

use anyhow::Context as _;
use sonda::{Sonda, SondaConfig};
use sonda_mcp::SondaMcpServer;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing; stdout belongs to the protocol
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let config = SondaConfig::discover(None).context("failed to load sonda configuration")?;
    tracing::info!(
        staging = ?config.roots.staging,
        production = ?config.roots.production,
        standard = ?config.roots.standard,
        "Starting sonda-mcp server"
    );

    // Create and run the server
    let server = SondaMcpServer::new(Sonda::new(config));
    server.run().await?;

    Ok(())
}
