//! HTTP server exposing the extraction pipeline.
//!
//! Two endpoints mirror the surface callers integrate against:
//!
//! * `POST /summarize/` — multipart upload field `file`; runs one pipeline
//!   and replies with the structured record.
//! * `GET /results/?filename=…` — re-read a previously produced artifact
//!   pair.
//!
//! Plus a `GET /health` liveness probe. The client and configs live in a
//! shared immutable [`AppState`]; requests may run concurrently but each
//! summarize request works inside its own run directory, so no locking
//! happens here.

pub mod routes;

use crate::client::MistralClient;
use crate::config::{PipelineConfig, ServerConfig};
use crate::error::ExtractError;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared, immutable per-process state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    client: Arc<MistralClient>,
    output_dir: Arc<PathBuf>,
    schema_path: Option<Arc<PathBuf>>,
}

impl AppState {
    pub fn client(&self) -> &MistralClient {
        &self.client
    }

    pub fn output_dir(&self) -> &std::path::Path {
        &self.output_dir
    }

    pub fn schema_path(&self) -> Option<&std::path::Path> {
        self.schema_path.as_deref().map(|p| p.as_path())
    }
}

/// The extraction HTTP server.
pub struct ExtractServer {
    server_config: ServerConfig,
    state: AppState,
}

impl ExtractServer {
    /// Create a server from the two configs. Builds the API client once;
    /// fails fast on a missing credential.
    pub fn new(
        pipeline_config: PipelineConfig,
        server_config: ServerConfig,
    ) -> Result<Self, ExtractError> {
        let client = MistralClient::new(&pipeline_config)?;
        let state = AppState {
            client: Arc::new(client),
            output_dir: Arc::new(server_config.output_dir.clone()),
            schema_path: pipeline_config.schema_path.map(Arc::new),
        };
        Ok(Self {
            server_config,
            state,
        })
    }

    /// Build the router with all routes and middleware.
    pub fn build_router(&self) -> Router {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        Router::new()
            .route("/health", get(health))
            .route(
                "/summarize/",
                post(routes::summarize)
                    .layer(DefaultBodyLimit::max(self.server_config.max_upload_size)),
            )
            .route("/results/", get(routes::results))
            .with_state(self.state.clone())
            .layer(TraceLayer::new_for_http())
            .layer(cors)
    }

    /// Bind and serve until the process is stopped.
    pub async fn start(self) -> Result<(), ExtractError> {
        let addr = SocketAddr::new(self.server_config.host, self.server_config.port);
        let router = self.build_router();

        tracing::info!("starting pdf2record server on http://{}", addr);
        tracing::info!("output directory: {}", self.state.output_dir().display());

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| ExtractError::Internal(format!("failed to bind {addr}: {e}")))?;

        axum::serve(listener, router)
            .await
            .map_err(|e| ExtractError::Internal(format!("server error: {e}")))
    }

    /// The address the server will bind to.
    pub fn address(&self) -> SocketAddr {
        SocketAddr::new(self.server_config.host, self.server_config.port)
    }
}

/// Liveness probe.
async fn health() -> &'static str {
    "OK"
}
