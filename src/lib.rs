//! # pdf2record
//!
//! Extract structured records from PDF reports using hosted OCR and LLM
//! services.
//!
//! ## Why this crate?
//!
//! Scanned medical reports arrive as PDFs that downstream systems cannot
//! query. This crate forwards the PDF to a hosted OCR service to obtain
//! per-page Markdown, asks a hosted chat model to pull a small structured
//! record out of that text (name/sex/age/summary by default, or fields from
//! a caller-supplied schema), and persists both artifacts next to the input
//! file. There is no local parsing: the hard work happens on the remote
//! side, and this crate owns the data contract and error handling around it.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. OCR      upload → signed URL → per-page markdown
//!  ├─ 2. Persist  <stem>.md (heading + blocks, or placeholder)
//!  ├─ 3. Prompt   default four-field or schema-derived
//!  ├─ 4. Extract  chat completion → scrape first {…} → JSON record
//!  └─ 5. Persist  <stem>_structured.json (4-space indent, UTF-8 verbatim)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf2record::{pipeline, MistralClient, PipelineConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = PipelineConfig::from_env()?; // requires MISTRAL_API_KEY
//!     let client = MistralClient::new(&config)?;
//!     let outcome =
//!         pipeline::process(&client, "report.pdf".as_ref(), None).await?;
//!     if let Some(record) = outcome.record() {
//!         println!("{}", serde_json::to_string_pretty(record)?);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature  | Default | Description |
//! |----------|---------|-------------|
//! | `server` | on      | Axum HTTP surface (`POST /summarize/`, `GET /results/`) and the `pdf2record-server` binary |
//! | `cli`    | on      | The `pdf2record` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable both when using only the library:
//! ```toml
//! pdf2record = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod client;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod prompts;
#[cfg(feature = "server")]
pub mod server;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use client::MistralClient;
pub use config::{PipelineConfig, PipelineConfigBuilder, ServerConfig};
pub use error::{ApiStage, ExtractError};
pub use pipeline::{
    process, process_bytes, Extraction, PipelineOutcome, PipelineOutput, StructuredRecord,
};
