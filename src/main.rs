//! Havona MCP Server - Rust Implementation
//!
//! A Model Context Protocol (MCP) server for the Havona trade finance API.
//! Serves tools over stdio by default, or over SSE with `--sse`.

use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};

use havona_mcp::config::Config;
use havona_mcp::havona::client::HavonaClient;
use havona_mcp::mcp::server::McpServer;
use havona_mcp::mcp::sse::run_sse;
use havona_mcp::mcp::tools::ToolHandler;
use tracing_subscriber::EnvFilter;

/// Havona MCP Server
#[derive(Parser)]
#[command(name = "havona-mcp")]
#[command(author, version, about = "Havona MCP Server - A Model Context Protocol server for Havona trade finance")]
struct Cli {
    /// Serve over SSE (web clients) instead of stdio
    #[arg(long)]
    sse: bool,

    /// Address to bind the SSE server to
    #[arg(long, env = "HAVONA_MCP_HOST", default_value = "127.0.0.1")]
    host: String,

    /// Port for the SSE server
    #[arg(long, env = "HAVONA_MCP_PORT", default_value_t = 8000)]
    port: u16,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the configured credentials can obtain an access token
    Auth,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(std::env::var(EnvFilter::DEFAULT_ENV).ok()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // Load configuration
    let config = Config::from_env();

    match cli.command {
        Some(Commands::Auth) => {
            let settings = config.client_settings()?;
            let client = HavonaClient::new(settings)?;
            client
                .verify()
                .await
                .with_context(|| format!("Authentication against {} failed", client.base_url()))?;
            eprintln!("Authentication succeeded for {}", client.base_url());
        }
        None => {
            let server = McpServer::new(ToolHandler::new(config));
            if cli.sse {
                run_sse(Arc::new(server), &cli.host, cli.port).await?;
            } else {
                server.run_stdio().await?;
            }
        }
    }

    Ok(())
}

/// `RUST_LOG` directives when set and valid, INFO otherwise
fn log_filter(directives: Option<String>) -> EnvFilter {
    directives
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_filter_defaults_to_info() {
        assert_eq!(log_filter(None).to_string(), "info");
    }

    #[test]
    fn test_log_filter_honours_rust_log() {
        assert_eq!(log_filter(Some("debug".to_string())).to_string(), "debug");
        assert_eq!(
            log_filter(Some("havona_mcp=trace".to_string())).to_string(),
            "havona_mcp=trace"
        );
    }
}
