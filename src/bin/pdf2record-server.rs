//! HTTP server binary for pdf2record.
//!
//! Run with: MISTRAL_API_KEY=… cargo run --bin pdf2record-server

use anyhow::Context;
use pdf2record::server::ExtractServer;
use pdf2record::{PipelineConfig, ServerConfig};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pdf2record=info,tower_http=debug".into()),
        )
        .init();

    // Missing credential is a fatal startup error by design.
    let pipeline_config =
        PipelineConfig::from_env().context("cannot start without an API credential")?;
    let server_config = ServerConfig::from_env();

    tracing::info!("configuration loaded");
    tracing::info!("  - OCR model:  {}", pipeline_config.ocr_model);
    tracing::info!("  - chat model: {}", pipeline_config.chat_model);
    if let Some(ref schema) = pipeline_config.schema_path {
        tracing::info!("  - schema:     {}", schema.display());
    }

    let server = ExtractServer::new(pipeline_config, server_config)?;

    println!("pdf2record server listening on http://{}", server.address());
    println!("  POST /summarize/  - upload a PDF, get the structured record");
    println!("  GET  /results/    - re-read a previous run (?filename=<stem>)");
    println!("  GET  /health      - liveness probe");

    server.start().await?;
    Ok(())
}
