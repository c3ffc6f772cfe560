use anyhow::{bail, Context, Result};
use std::env;
use std::path::PathBuf;

use rag_mcp::application::bulk_ingest::ingest_directory;
use rag_mcp::config::load_config;
use rag_mcp::initialization::build_document_service;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() != 2 {
        eprintln!("Usage: ingest_dir <directory>");
        std::process::exit(2);
    }
    let dir = PathBuf::from(&args[1]);

    let config = load_config()?;
    let service = build_document_service(&config)
        .await
        .context("Failed to initialize the document service")?;

    let report = ingest_directory(service, &dir, config.embedding.max_concurrent).await?;

    println!("Ingested {} documents from {:?}", report.ingested.len(), dir);
    for (path, reason) in &report.failed {
        println!("  FAILED {}: {}", path.display(), reason);
    }
    if !report.is_success() {
        bail!("{} of {} files failed", report.failed.len(), report.failed.len() + report.ingested.len());
    }
    Ok(())
}
