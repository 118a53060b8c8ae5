//! MCP stdio server for the Meshy AI generative-3D API.

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use meshy::mcp::tools::register_meshy_tools;
use meshy::mcp::MCPServer;
use meshy::{MeshyClient, MeshyConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "meshy-mcp")]
#[command(about = "MCP server exposing the Meshy AI API as tools")]
struct Args {
    /// Meshy API key
    #[arg(long, env = "MESHY_API_KEY", hide_env_values = true)]
    api_key: String,

    /// Base URL of the Meshy OpenAPI
    #[arg(long, env = "MESHY_API_BASE", default_value = meshy::config::DEFAULT_API_BASE)]
    api_base: String,

    /// Default timeout for task streaming in milliseconds (0 disables it)
    #[arg(
        long,
        env = "MESHY_STREAM_TIMEOUT_MS",
        default_value_t = meshy::config::DEFAULT_STREAM_TIMEOUT_MS
    )]
    stream_timeout_ms: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // stdout carries the protocol, so logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = MeshyConfig::new(&args.api_key, &args.api_base, args.stream_timeout_ms)
        .context("invalid Meshy configuration")?;
    let client = Arc::new(MeshyClient::new(config).context("failed to build HTTP client")?);

    let mut server = MCPServer::new("meshy", env!("CARGO_PKG_VERSION"));
    register_meshy_tools(&mut server, client.clone());
    info!(
        tools = server.tool_count(),
        api_base = client.config().base_url(),
        stream_timeout_ms = client.config().stream_timeout_ms(),
        "starting MCP server on stdio"
    );

    server.run_stdio().await.context("MCP server failed")?;
    Ok(())
}
