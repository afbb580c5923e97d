//! CLI binary for pdf2record.
//!
//! A thin shim over the library crate that runs one extraction pipeline
//! from the command line and prints the structured record.

use anyhow::{bail, Context, Result};
use clap::Parser;
use pdf2record::pipeline::{self, PipelineOutcome};
use pdf2record::{MistralClient, PipelineConfig};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Extract a structured record from a PDF report via hosted OCR and LLM.
#[derive(Parser, Debug)]
#[command(name = "pdf2record", version, about)]
struct Cli {
    /// Path to the input PDF.
    input: PathBuf,

    /// Optional JSON schema file (field name → example value) shaping the
    /// extraction prompt.
    #[arg(long, value_name = "FILE")]
    schema: Option<PathBuf>,

    /// Chat model identifier.
    #[arg(long, default_value = "mistral-medium")]
    chat_model: String,

    /// OCR model identifier.
    #[arg(long, default_value = "mistral-ocr-latest")]
    ocr_model: String,

    /// Reply-length cap for the chat completion, in tokens.
    #[arg(long, default_value_t = 300)]
    max_tokens: u32,

    /// API credential; read from the environment when not passed.
    #[arg(long, env = "MISTRAL_API_KEY", hide_env_values = true)]
    api_key: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .init();

    let cli = Cli::parse();

    let mut builder = PipelineConfig::builder(cli.api_key)
        .chat_model(cli.chat_model)
        .ocr_model(cli.ocr_model)
        .max_tokens(cli.max_tokens);
    if let Some(schema) = cli.schema {
        builder = builder.schema_path(schema);
    }
    let config = builder.build()?;
    let client = MistralClient::new(&config)?;

    let outcome = pipeline::process(&client, &cli.input, config.schema_path.as_deref())
        .await
        .with_context(|| format!("extraction failed for '{}'", cli.input.display()))?;

    match outcome {
        PipelineOutcome::Complete(output) => {
            eprintln!("markdown summary: {}", output.markdown_path.display());
            eprintln!("structured record: {}", output.structured_path.display());
            println!(
                "{}",
                serde_json::to_string_pretty(&output.record)
                    .context("failed to render record")?
            );
            Ok(())
        }
        PipelineOutcome::ExtractionFailed { markdown_path } => {
            eprintln!("markdown summary: {}", markdown_path.display());
            bail!("no structured record could be parsed from the model reply");
        }
    }
}
