//! Configuration types for the extraction pipeline and HTTP server.
//!
//! All pipeline behaviour is controlled through [`PipelineConfig`], built via
//! its [`PipelineConfigBuilder`]. Keeping every knob in one struct makes it
//! trivial to share the config across requests and diff two runs to
//! understand why their outputs differ.
//!
//! The API credential is the only required field. It is deliberately NOT
//! ambient module state: the config (and the [`crate::client::MistralClient`]
//! built from it) is constructed once at process start, is immutable
//! thereafter, and is passed explicitly into the pipeline.

use crate::error::ExtractError;
use std::fmt;
use std::net::IpAddr;
use std::path::PathBuf;

/// Configuration for a PDF-to-structured-record extraction run.
///
/// Built via [`PipelineConfig::builder()`] or [`PipelineConfig::from_env()`].
///
/// # Example
/// ```rust
/// use pdf2record::PipelineConfig;
///
/// let config = PipelineConfig::builder("sk-test")
///     .chat_model("mistral-medium")
///     .max_tokens(300)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct PipelineConfig {
    /// API credential for the hosted OCR and chat services. Required.
    pub api_key: String,

    /// Base URL of the hosted API. Default: `https://api.mistral.ai`.
    ///
    /// Overridable so tests and self-hosted gateways can point the client at
    /// a different origin without touching the request code.
    pub api_base_url: String,

    /// Model identifier for the OCR endpoint. Default: `mistral-ocr-latest`.
    pub ocr_model: String,

    /// Model identifier for the chat completion. Default: `mistral-medium`.
    pub chat_model: String,

    /// Reply-length cap for the chat completion, in tokens. Default: 300.
    ///
    /// The structured record is a handful of short fields; 300 tokens bounds
    /// the reply well above what a valid record needs while keeping the cost
    /// of a rambling reply capped.
    pub max_tokens: u32,

    /// Expiry of the signed upload URL, in hours. Minimum and default: 1.
    ///
    /// The URL is consumed by the OCR request immediately after it is
    /// obtained, so one hour is ample. No refresh is attempted if it lapses.
    pub signed_url_expiry_hours: u32,

    /// Per-request timeout for remote calls, in seconds. Default: 120.
    pub api_timeout_secs: u64,

    /// Optional path to a JSON schema file (field name → example value)
    /// that shapes the extraction prompt. `None` uses the default
    /// four-field prompt (name, sex, age, summary).
    pub schema_path: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base_url: "https://api.mistral.ai".to_string(),
            ocr_model: "mistral-ocr-latest".to_string(),
            chat_model: "mistral-medium".to_string(),
            max_tokens: 300,
            signed_url_expiry_hours: 1,
            api_timeout_secs: 120,
            schema_path: None,
        }
    }
}

impl fmt::Debug for PipelineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineConfig")
            .field("api_key", &"<redacted>")
            .field("api_base_url", &self.api_base_url)
            .field("ocr_model", &self.ocr_model)
            .field("chat_model", &self.chat_model)
            .field("max_tokens", &self.max_tokens)
            .field("signed_url_expiry_hours", &self.signed_url_expiry_hours)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("schema_path", &self.schema_path)
            .finish()
    }
}

impl PipelineConfig {
    /// Create a new builder with the given API credential.
    pub fn builder(api_key: impl Into<String>) -> PipelineConfigBuilder {
        PipelineConfigBuilder {
            config: Self {
                api_key: api_key.into(),
                ..Self::default()
            },
        }
    }

    /// Build a configuration from the process environment.
    ///
    /// Reads the required `MISTRAL_API_KEY` and the optional
    /// `PDF2RECORD_SCHEMA` (path to a schema file). A missing or empty
    /// credential is a fatal startup error.
    pub fn from_env() -> Result<Self, ExtractError> {
        let api_key = std::env::var("MISTRAL_API_KEY")
            .ok()
            .filter(|k| !k.is_empty())
            .ok_or(ExtractError::MissingApiKey)?;

        let mut builder = Self::builder(api_key);
        if let Ok(schema) = std::env::var("PDF2RECORD_SCHEMA") {
            if !schema.is_empty() {
                builder = builder.schema_path(schema);
            }
        }
        builder.build()
    }
}

/// Builder for [`PipelineConfig`].
#[derive(Debug)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    pub fn api_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.api_base_url = url.into();
        self
    }

    pub fn ocr_model(mut self, model: impl Into<String>) -> Self {
        self.config.ocr_model = model.into();
        self
    }

    pub fn chat_model(mut self, model: impl Into<String>) -> Self {
        self.config.chat_model = model.into();
        self
    }

    pub fn max_tokens(mut self, n: u32) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn signed_url_expiry_hours(mut self, hours: u32) -> Self {
        self.config.signed_url_expiry_hours = hours.max(1);
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn schema_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.schema_path = Some(path.into());
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<PipelineConfig, ExtractError> {
        let c = &self.config;
        if c.api_key.is_empty() {
            return Err(ExtractError::MissingApiKey);
        }
        if c.api_base_url.is_empty() {
            return Err(ExtractError::InvalidConfig(
                "api_base_url must not be empty".into(),
            ));
        }
        if c.max_tokens == 0 {
            return Err(ExtractError::InvalidConfig(
                "max_tokens must be ≥ 1".into(),
            ));
        }
        Ok(self.config)
    }
}

/// Configuration for the HTTP server surface.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address. Default: 127.0.0.1.
    pub host: IpAddr,

    /// Bind port. Default: 8000.
    pub port: u16,

    /// Root under which each summarize request creates its own run
    /// directory holding the upload and its `.md` / `_structured.json`
    /// artifacts. `filename` values passed to the results endpoint
    /// resolve against this root, newest run first.
    /// Default: the system temp directory.
    pub output_dir: PathBuf,

    /// Maximum accepted multipart upload size in bytes. Default: 50 MiB.
    pub max_upload_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::from([127, 0, 0, 1]),
            port: 8000,
            output_dir: std::env::temp_dir(),
            max_upload_size: 50 * 1024 * 1024,
        }
    }
}

impl ServerConfig {
    /// Build a server configuration from the process environment, falling
    /// back to defaults for anything unset or unparseable.
    ///
    /// Reads `PDF2RECORD_HOST`, `PDF2RECORD_PORT`, and `PDF2RECORD_OUTPUT_DIR`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(host) = std::env::var("PDF2RECORD_HOST")
            .ok()
            .and_then(|h| h.parse().ok())
        {
            config.host = host;
        }
        if let Some(port) = std::env::var("PDF2RECORD_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
        {
            config.port = port;
        }
        if let Ok(dir) = std::env::var("PDF2RECORD_OUTPUT_DIR") {
            if !dir.is_empty() {
                config.output_dir = PathBuf::from(dir);
            }
        }
        config
    }
}
