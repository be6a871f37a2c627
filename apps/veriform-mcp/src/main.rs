//! # Veriform MCP Server
//!
//! Entry point for the MCP (Model Context Protocol) host of veriform-core.
//!
//! Configuration comes from `VERIFORM_CONFIG` / `./veriform.toml` and the
//! `VERIFORM_*` overrides (see `config`). Logging:
//! - `RUST_LOG` filter (default: `veriform=info`)
//! - `VERIFORM_LOG_FORMAT=json` for machine-parseable output
//!
//! Communicates with AI clients (Claude, GPT) via MCP over stdio. The
//! connection owns one session, destroyed when the client disconnects.

mod config;
mod server;

use rmcp::{ServiceExt, transport::stdio};
use server::VeriformMcp;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use veriform_core::{SessionManager, SolveOrchestrator, SystemStatus, ToolFacade, smoke_check};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let config = config::load()?;
    let orchestrator = Arc::new(SolveOrchestrator::from_config(config));

    let probe = Arc::clone(&orchestrator);
    let (status, check) = tokio::task::spawn_blocking(move || {
        (
            SystemStatus::collect(probe.registry()),
            smoke_check(&probe),
        )
    })
    .await?;
    tracing::info!(
        version = %status.version,
        default_backend = ?status.default_backend,
        available = ?status.backends.iter().filter(|b| b.available).map(|b| b.name.as_str()).collect::<Vec<_>>(),
        "Veriform MCP server starting"
    );
    tracing::info!(
        passed = check.passed,
        backend = ?check.backend,
        elapsed_ms = check.elapsed_ms,
        "smoke check: {}",
        check.message
    );

    let sessions = SessionManager::new();
    let session = sessions.create();
    let mcp = VeriformMcp::new(ToolFacade::new(orchestrator), Arc::clone(&session));

    let service = mcp.serve(stdio()).await.inspect_err(|e| {
        tracing::error!("MCP serve error: {:?}", e);
    })?;

    let waited = service.waiting().await;
    sessions.destroy(session.id());
    tracing::info!(session = %session.id(), "client disconnected, session closed");
    waited?;
    Ok(())
}

/// Logging to stderr only; stdout is reserved for MCP stdio transport.
fn init_tracing() {
    let log_format = std::env::var("VERIFORM_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "veriform=info".into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(std::io::stderr),
                )
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(std::io::stderr)
                        .with_ansi(false),
                )
                .init();
        }
    }
}
