//! Request handlers for the summarize and results endpoints.
//!
//! Handlers stay thin: request parsing and status mapping here, everything
//! else in [`crate::pipeline`]. The status contract is deliberate and a
//! little unusual — a reply the extractor could not parse is an expected
//! outcome, so it returns 200 with `{"error": "Extraction failed"}` rather
//! than a 5xx; only remote-service and truly unexpected errors become 500s,
//! carrying the error's message text.
//!
//! Every summarize request runs inside its own directory under the output
//! root, so concurrent uploads sharing a client filename never touch the
//! same files. The results endpoint resolves a filename to the newest run
//! that produced a complete artifact pair.

use crate::pipeline::{self, PipelineOutcome};
use crate::server::AppState;
use axum::extract::{Multipart, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{error, info};

/// Per-process tiebreaker for run-directory names.
static RUN_SEQ: AtomicU64 = AtomicU64::new(0);

/// A unique directory name for one summarize request. Fixed-width fields
/// keep the names lexicographically chronological, which is what the
/// newest-run resolution in [`load_results`] relies on.
fn run_dir_name() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let seq = RUN_SEQ.fetch_add(1, Ordering::Relaxed);
    format!("run-{nanos:030}-{seq:06}")
}

/// POST /summarize/ — upload a PDF, run the pipeline, return the record.
pub async fn summarize(
    State(state): State<AppState>,
    multipart: Multipart,
) -> (StatusCode, Json<Value>) {
    match run_summarize(&state, multipart).await {
        Ok(PipelineOutcome::Complete(output)) => (StatusCode::OK, Json(Value::Object(output.record))),
        Ok(PipelineOutcome::ExtractionFailed { .. }) => {
            (StatusCode::OK, Json(json!({"error": "Extraction failed"})))
        }
        Err(message) => {
            error!("summarize request failed: {message}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": message})),
            )
        }
    }
}

/// Receive the upload, persist it into a fresh run directory, and run one
/// pipeline over the bytes already in memory. Any failure collapses to its
/// message text for the 500 body.
async fn run_summarize(
    state: &AppState,
    mut multipart: Multipart,
) -> Result<PipelineOutcome, String> {
    let mut upload: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| format!("failed to read multipart field: {e}"))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or("upload.pdf").to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| format!("failed to read upload: {e}"))?;
        upload = Some((file_name, bytes.to_vec()));
        break;
    }

    let (file_name, bytes) = upload.ok_or_else(|| "missing multipart field 'file'".to_string())?;
    info!("received upload '{}' ({} bytes)", file_name, bytes.len());

    // file_stem of the client-supplied name also discards any directory
    // components, so uploads cannot escape the output directory.
    let stem = Path::new(&file_name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "upload".to_string());

    // Each request gets a directory of its own, so two concurrent uploads
    // carrying the same client filename never share an upload path or an
    // artifact pair.
    let run_dir = state.output_dir().join(run_dir_name());
    tokio::fs::create_dir_all(&run_dir)
        .await
        .map_err(|e| format!("failed to create output directory: {e}"))?;

    let document_name = format!("{stem}.pdf");
    tokio::fs::write(run_dir.join(&document_name), &bytes)
        .await
        .map_err(|e| format!("failed to persist upload: {e}"))?;

    // The upload is kept on disk for traceability, but the pipeline takes
    // the in-memory bytes directly rather than re-reading the file.
    pipeline::process_bytes(
        state.client(),
        bytes,
        &document_name,
        &run_dir.join(&stem),
        state.schema_path(),
    )
    .await
    .map_err(|e| e.to_string())
}

/// Query parameters of the results endpoint.
#[derive(Debug, Deserialize)]
pub struct ResultsParams {
    /// Path of the artifact pair, without extension. Resolved against the
    /// server's output directory, newest run first.
    pub filename: String,
}

/// A previously produced artifact pair.
#[derive(Debug, Serialize)]
pub struct ResultsResponse {
    pub filename: String,
    pub markdown_summary: String,
    pub structured_json: Value,
}

/// GET /results/?filename=… — re-read a previously written artifact pair.
pub async fn results(
    State(state): State<AppState>,
    Query(params): Query<ResultsParams>,
) -> (StatusCode, Json<Value>) {
    // Only plain names under the output directory are served over HTTP;
    // absolute paths and parent components are treated as unknown.
    let found = if is_plain_relative(&params.filename) {
        load_results(state.output_dir(), &params.filename).await
    } else {
        None
    };
    match found {
        Some(found) => (StatusCode::OK, Json(json!(found))),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({"error": "Files not found."})),
        ),
    }
}

/// True when `filename` is relative and free of `..` (and other non-normal)
/// components.
fn is_plain_relative(filename: &str) -> bool {
    let path = Path::new(filename);
    !path.is_absolute() && path.components().all(|c| matches!(c, Component::Normal(_)))
}

/// Load `<filename>.md` and `<filename>_structured.json`.
///
/// Relative names resolve against `base_dir`: the newest run subdirectory
/// holding the complete pair wins, with a pair directly under `base_dir` as
/// fallback. Absolute names are honoured as-is. `None` when either file is
/// missing or unreadable.
pub async fn load_results(base_dir: &Path, filename: &str) -> Option<ResultsResponse> {
    let given = Path::new(filename);
    if given.is_absolute() {
        return read_pair(given, filename).await;
    }

    let mut newest: Option<(String, ResultsResponse)> = None;
    if let Ok(mut entries) = tokio::fs::read_dir(base_dir).await {
        while let Ok(Some(entry)) = entries.next_entry().await {
            let is_dir = entry
                .file_type()
                .await
                .map(|t| t.is_dir())
                .unwrap_or(false);
            if !is_dir {
                continue;
            }
            if let Some(found) = read_pair(&entry.path().join(given), filename).await {
                let name = entry.file_name().to_string_lossy().into_owned();
                if newest.as_ref().map_or(true, |(n, _)| name > *n) {
                    newest = Some((name, found));
                }
            }
        }
    }
    if let Some((_, found)) = newest {
        return Some(found);
    }
    read_pair(&base_dir.join(given), filename).await
}

/// Read one artifact pair at `prefix`.
async fn read_pair(prefix: &Path, filename: &str) -> Option<ResultsResponse> {
    // The query value carries no extension, so suffixes are appended to the
    // raw path rather than via `with_extension`.
    let markdown_path = PathBuf::from(format!("{}.md", prefix.display()));
    let structured_path = PathBuf::from(format!("{}_structured.json", prefix.display()));

    let markdown_summary = tokio::fs::read_to_string(markdown_path).await.ok()?;
    let structured_raw = tokio::fs::read_to_string(structured_path).await.ok()?;
    let structured_json = serde_json::from_str(&structured_raw).ok()?;

    Some(ResultsResponse {
        filename: filename.to_string(),
        markdown_summary,
        structured_json,
    })
}
