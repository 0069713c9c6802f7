//! MCP Server Entry Point
//!
//! Loads configuration from the environment, applies command-line
//! overrides, initializes logging and starts the configured transport.

use anyhow::Result;
use clap::Parser;
use tracing::{Level, info};
use tracing_subscriber::{EnvFilter, fmt};

use spec_driven_mcp_server::cli::Cli;
use spec_driven_mcp_server::core::{Config, McpServer, TransportService};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Environment first, flags on top
    let mut config = Config::from_env();
    cli.apply(&mut config)?;

    init_logging(config.logging.tracing_level(), config.logging.with_timestamps);

    info!("Starting {} v{}", config.server.name, config.server.version);
    if config.security.root_path.is_none() {
        info!("No workspace root configured; file tools are unrestricted");
    }

    let server = McpServer::new(config.clone());

    info!("Server initialized");

    let transport = TransportService::new(config.transport);
    transport.run(server).await?;

    info!("Server shutting down");

    Ok(())
}

/// Initialize the logging subsystem.
///
/// Logs go to stderr; stdout carries the STDIO transport.
fn init_logging(level: Level, with_timestamps: bool) {
    let filter = EnvFilter::from_default_env().add_directive(level.into());

    let builder = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr);

    if with_timestamps {
        builder.init();
    } else {
        builder.without_time().init();
    }
}
