//! Error types for the pdf2record library.
//!
//! The taxonomy separates failures that abort a pipeline run from degraded
//! conditions that do not:
//!
//! * [`ExtractError`] — **Hard**: the run cannot proceed (missing credential,
//!   missing input file, remote API failure, output write failure). Returned
//!   as `Err(ExtractError)` from [`crate::pipeline::process`] and surfaced by
//!   the HTTP layer as a 500 carrying the message text.
//!
//! * An unparseable model reply is **not** an error. It is modelled as
//!   [`crate::pipeline::Extraction::Failed`] so callers cannot mistake
//!   "no data" for an exception-worthy failure. Likewise an unreadable
//!   schema file falls back to the default prompt, and an empty OCR result
//!   produces a placeholder markdown file — both logged, neither fatal.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// All hard errors returned by the pdf2record library.
#[derive(Debug, Error)]
pub enum ExtractError {
    // ── Startup errors ────────────────────────────────────────────────────
    /// The API credential is absent from the environment.
    #[error("MISTRAL_API_KEY is not set.\nExport it before starting: export MISTRAL_API_KEY=<key>")]
    MissingApiKey,

    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path. The pipeline never starts.
    #[error("input file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Input file exists but reading it failed (permissions, I/O).
    #[error("failed to read input file '{path}': {source}")]
    InputReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Remote API errors ─────────────────────────────────────────────────
    /// The request never produced a response (network, TLS, timeout).
    #[error("{stage} request failed: {source}")]
    Http {
        stage: ApiStage,
        #[source]
        source: reqwest::Error,
    },

    /// The remote service answered with a non-success status (auth, quota, …).
    #[error("{stage} returned HTTP {status}: {message}")]
    Api {
        stage: ApiStage,
        status: u16,
        message: String,
    },

    /// The response decoded but did not carry the fields we rely on.
    #[error("unexpected {stage} response: {detail}")]
    UnexpectedResponse { stage: ApiStage, detail: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not write one of the output artifacts.
    #[error("failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Which remote call an [`ExtractError`] originated from.
///
/// The four stages map one-to-one to the remote round-trips the pipeline
/// makes, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiStage {
    /// Multipart upload of the PDF to the files endpoint.
    Upload,
    /// Retrieval of the short-lived signed URL for the uploaded object.
    SignedUrl,
    /// OCR processing of the signed URL.
    Ocr,
    /// Chat completion that produces the structured-record reply.
    Chat,
}

impl fmt::Display for ApiStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ApiStage::Upload => "file upload",
            ApiStage::SignedUrl => "signed URL",
            ApiStage::Ocr => "OCR",
            ApiStage::Chat => "chat completion",
        };
        f.write_str(name)
    }
}
