//! Persistence: the two on-disk artifacts of a pipeline run.
//!
//! Both files are keyed by the run's output prefix: `<prefix>.md` for the
//! markdown summary and `<prefix>_structured.json` for the record. The JSON uses 4-space indentation with non-ASCII
//! characters preserved verbatim so the artifacts diff cleanly and stay
//! readable for the humans who open them.

use crate::error::ExtractError;
use crate::pipeline::StructuredRecord;
use serde::Serialize;
use std::path::Path;

/// Written in place of the blocks when OCR produced no text.
pub const EMPTY_PLACEHOLDER: &str = "No markdown content extracted from the PDF.";

/// Separator between page blocks in the persisted markdown file.
pub const BLOCK_SEPARATOR: &str = "\n\n---\n\n";

/// Render the markdown summary: a full-document heading followed by the
/// page blocks joined with a horizontal rule, or the placeholder when no
/// page produced text.
pub fn render_markdown(document_name: &str, blocks: &[String]) -> String {
    let mut out = format!("# Summary of {document_name}\n\n");
    if blocks.is_empty() {
        out.push_str(EMPTY_PLACEHOLDER);
    } else {
        out.push_str(&blocks.join(BLOCK_SEPARATOR));
    }
    out
}

/// Write the markdown summary to `path`.
pub async fn write_markdown(
    path: &Path,
    document_name: &str,
    blocks: &[String],
) -> Result<(), ExtractError> {
    tokio::fs::write(path, render_markdown(document_name, blocks))
        .await
        .map_err(|e| ExtractError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })
}

/// Serialise the record with stable 4-space indentation.
///
/// serde_json writes UTF-8 without escaping non-ASCII, which is exactly the
/// persisted format: `"Müller"` stays `"Müller"`.
pub fn render_structured(record: &StructuredRecord) -> Result<String, ExtractError> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    record
        .serialize(&mut serializer)
        .map_err(|e| ExtractError::Internal(format!("failed to serialise record: {e}")))?;
    String::from_utf8(buf)
        .map_err(|e| ExtractError::Internal(format!("record serialised to invalid UTF-8: {e}")))
}

/// Write the structured record to `path`.
pub async fn write_structured(path: &Path, record: &StructuredRecord) -> Result<(), ExtractError> {
    let rendered = render_structured(record)?;
    tokio::fs::write(path, rendered)
        .await
        .map_err(|e| ExtractError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })
}
