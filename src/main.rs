use rmcp::ServiceExt;
use std::sync::Arc;
use tokio::io::{stdin, stdout};

use rag_mcp::config;
use rag_mcp::initialization::initialize_background_services;
use rag_mcp::server::handler::RagServerHandler;

use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    // stdout carries the MCP transport, so logs go to stderr.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();
    log::info!("rag-mcp server (MCP over stdio) started.");

    let config = config::load_config()?;
    log::info!("Configuration loaded: {:?}", config);
    let config_arc = Arc::new(config);

    let handler = RagServerHandler::new(config_arc.clone());
    let document_service_state = handler.document_service_state.clone();

    // Serve immediately; tools report "still initializing" until the model and store are up.
    let transport = (stdin(), stdout());
    log::info!("Starting MCP server listener...");
    let serve_future = handler.serve(transport);

    let init_config = config_arc.clone();
    tokio::spawn(async move {
        log::info!("Background initialization task started.");
        match initialize_background_services(init_config, document_service_state).await {
            Ok(()) => log::info!("Background initialization completed successfully."),
            Err(e) => log::error!("Background initialization failed: {:#}", e),
        }
    });

    let server_handle = serve_future.await.inspect_err(|e| {
        log::error!("serving error: {:?}", e);
    })?;

    log::info!("rag-mcp server running, waiting for completion...");
    let shutdown_reason = server_handle.waiting().await?;
    log::info!("rag-mcp server finished. Reason: {:?}", shutdown_reason);

    Ok(())
}
