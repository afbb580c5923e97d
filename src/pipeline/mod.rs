//! Pipeline stages for PDF-to-structured-record extraction.
//!
//! Each submodule implements exactly one transformation step. Keeping stages
//! separate makes each independently testable and lets us swap
//! implementations (e.g. point at a different OCR backend) without touching
//! other stages.
//!
//! ## Data Flow
//!
//! ```text
//! PDF bytes ──▶ ocr ──▶ persist (.md) ──▶ prompt ──▶ extract ──▶ persist (.json)
//!             (remote)   (disk)                      (remote)      (disk)
//! ```
//!
//! 1. [`ocr`]     — upload the document, obtain a signed URL, and fetch
//!    per-page markdown from the OCR service
//! 2. [`persist`] — write the markdown summary (or placeholder) and, later,
//!    the structured-record JSON under the run's output prefix
//! 3. [`extract`] — drive the chat completion and scrape a JSON object out
//!    of the free-text reply
//!
//! [`process`] sequences the stages. One run is strictly linear: each remote
//! call completes before the next stage starts, and runs share no mutable
//! state, so concurrent runs over different documents need no locking.

pub mod extract;
pub mod ocr;
pub mod persist;

pub use extract::{Extraction, StructuredRecord};

use crate::client::MistralClient;
use crate::error::ExtractError;
use crate::prompts;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Paths and record produced by a fully successful run.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// The persisted markdown summary (`<stem>.md`).
    pub markdown_path: PathBuf,
    /// The persisted structured record (`<stem>_structured.json`).
    pub structured_path: PathBuf,
    /// The record parsed from the model reply.
    pub record: StructuredRecord,
}

/// Result of a pipeline run that did not error.
///
/// A reply the extractor could not parse is an expected degraded outcome,
/// not an error: the markdown summary is already on disk, no JSON file is
/// written, and the caller decides how to surface it (the HTTP layer reports
/// `{"error": "Extraction failed"}` with a 200).
#[derive(Debug, Clone)]
pub enum PipelineOutcome {
    /// Both artifacts written.
    Complete(PipelineOutput),
    /// OCR and markdown persistence succeeded, but no structured record
    /// could be parsed from the model reply.
    ExtractionFailed {
        /// The markdown summary, which is written regardless.
        markdown_path: PathBuf,
    },
}

impl PipelineOutcome {
    /// The record, if the run completed.
    pub fn record(&self) -> Option<&StructuredRecord> {
        match self {
            PipelineOutcome::Complete(output) => Some(&output.record),
            PipelineOutcome::ExtractionFailed { .. } => None,
        }
    }
}

/// Run the full extraction pipeline over one document on disk.
///
/// Validates that `document_path` references an existing, readable file,
/// then hands the bytes to [`process_bytes`]; the artifact pair lands next
/// to the input (`<stem>.md` and `<stem>_structured.json`).
///
/// # Errors
/// Returns `Err(ExtractError)` only for hard failures: missing or unreadable
/// input file, remote API errors, and output write failures. An unparseable
/// reply is reported as [`PipelineOutcome::ExtractionFailed`], and an empty
/// OCR result is not an error at all.
pub async fn process(
    client: &MistralClient,
    document_path: &Path,
    schema_path: Option<&Path>,
) -> Result<PipelineOutcome, ExtractError> {
    if !document_path.is_file() {
        return Err(ExtractError::FileNotFound {
            path: document_path.to_path_buf(),
        });
    }
    let bytes = tokio::fs::read(document_path)
        .await
        .map_err(|e| ExtractError::InputReadFailed {
            path: document_path.to_path_buf(),
            source: e,
        })?;

    let document_name = document_path
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());

    process_bytes(
        client,
        bytes,
        &document_name,
        &document_path.with_extension(""),
        schema_path,
    )
    .await
}

/// Run the full extraction pipeline over in-memory document bytes.
///
/// `output_prefix` names the artifact pair: the markdown summary is written
/// to `<prefix>.md` and the structured record to `<prefix>_structured.json`.
/// [`process`] derives the prefix from the input path; the HTTP layer passes
/// a per-request prefix so concurrent uploads never share files.
///
/// Stages, in order:
///
/// 1. **OCR** — fetch per-page markdown; persist to `<prefix>.md`
///    (placeholder text when zero non-blank pages came back).
/// 2. **Prompt** — schema-derived when `schema_path` is given and loadable,
///    default otherwise.
/// 3. **Extract** — chat completion; scrape the reply for a JSON object.
/// 4. **Persist** — write `<prefix>_structured.json` (skipped when
///    extraction failed).
pub async fn process_bytes(
    client: &MistralClient,
    bytes: Vec<u8>,
    document_name: &str,
    output_prefix: &Path,
    schema_path: Option<&Path>,
) -> Result<PipelineOutcome, ExtractError> {
    let stem = Path::new(document_name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    info!("processing '{}' ({} bytes)", document_name, bytes.len());

    // ── Step 1: OCR + markdown persistence ──────────────────────────────
    let blocks = ocr::extract_markdown(client, bytes, &stem).await?;
    info!("OCR produced {} markdown block(s)", blocks.len());

    let markdown_path = PathBuf::from(format!("{}.md", output_prefix.display()));
    persist::write_markdown(&markdown_path, document_name, &blocks).await?;
    info!("markdown summary saved to {}", markdown_path.display());

    // ── Step 2: Prompt ──────────────────────────────────────────────────
    // The prompt joins blocks with plain newlines; the `---` separator is
    // presentation for the persisted file only.
    let full_markdown = blocks.join("\n");
    let prompt = prompts::build_prompt(&full_markdown, schema_path);

    // ── Step 3: Extract ─────────────────────────────────────────────────
    let extraction = extract::extract_structured(client, &prompt).await?;
    let record = match extraction {
        Extraction::Success(record) => record,
        Extraction::Failed => {
            warn!("no structured record could be parsed from the model reply; aborting run");
            return Ok(PipelineOutcome::ExtractionFailed { markdown_path });
        }
    };

    // ── Step 4: Persist ─────────────────────────────────────────────────
    let structured_path = PathBuf::from(format!("{}_structured.json", output_prefix.display()));
    persist::write_structured(&structured_path, &record).await?;
    info!("structured record saved to {}", structured_path.display());

    Ok(PipelineOutcome::Complete(PipelineOutput {
        markdown_path,
        structured_path,
        record,
    }))
}
