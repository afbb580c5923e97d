//! Integration tests for the HTTP surface, run entirely offline.
//!
//! A stub of the hosted API (files, signed URL, OCR, chat completion) is
//! bound to a loopback port and the pipeline config points at it, so the
//! full summarize status contract is exercised without network access:
//! 200 with the record, 200 with `{"error": "Extraction failed"}`, and 500
//! carrying the error message.

#![cfg(feature = "server")]

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use pdf2record::server::ExtractServer;
use pdf2record::{PipelineConfig, ServerConfig};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tower::ServiceExt;

/// What the stubbed chat-completion endpoint replies with.
#[derive(Clone, Copy)]
enum ChatStub {
    /// Prose wrapping a JSON object; the reply also carries a per-call
    /// counter so consecutive runs produce distinguishable records.
    Record,
    /// Prose with no JSON object at all.
    Prose,
    /// HTTP 503 with a plain error body.
    Unavailable,
}

/// Bind a stub of the remote API on a loopback port.
async fn spawn_stub(chat: ChatStub) -> SocketAddr {
    let calls = Arc::new(AtomicU64::new(0));
    let chat_handler = move || {
        let calls = calls.clone();
        async move {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            match chat {
                ChatStub::Record => (
                    StatusCode::OK,
                    Json(json!({"choices": [{"message": {"content": format!(
                        "Here is the record:\n{{\"name\": \"Jo\", \"age\": 63, \"run\": {n}}}"
                    )}}]})),
                ),
                ChatStub::Prose => (
                    StatusCode::OK,
                    Json(json!({"choices": [{"message": {"content":
                        "I could not find any structured data in this text."
                    }}]})),
                ),
                ChatStub::Unavailable => (
                    StatusCode::SERVICE_UNAVAILABLE,
                    Json(json!({"message": "model overloaded"})),
                ),
            }
        }
    };

    let router = Router::new()
        .route("/v1/files", post(|| async { Json(json!({"id": "file-123"})) }))
        .route(
            "/v1/files/:id/url",
            get(|| async { Json(json!({"url": "https://signed.invalid/doc"})) }),
        )
        .route(
            "/v1/ocr",
            post(|| async { Json(json!({"pages": [{"markdown": "# Report\n\nFindings."}]})) }),
        )
        .route("/v1/chat/completions", post(chat_handler));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

/// The application router under test, with its pipeline pointed at the stub.
fn app(stub: SocketAddr, output_dir: &Path) -> Router {
    let pipeline = PipelineConfig::builder("sk-test")
        .api_base_url(format!("http://{stub}"))
        .build()
        .unwrap();
    let server = ServerConfig {
        output_dir: output_dir.to_path_buf(),
        ..ServerConfig::default()
    };
    ExtractServer::new(pipeline, server).unwrap().build_router()
}

fn upload_request(file_name: &str) -> Request<Body> {
    let boundary = "pdf2record-test-boundary";
    let body = format!(
        "--{boundary}\r\n\
         Content-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\n\
         Content-Type: application/pdf\r\n\
         \r\n\
         %PDF-1.4 stub document\r\n\
         --{boundary}--\r\n"
    );
    Request::builder()
        .method("POST")
        .uri("/summarize/")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn summarize_returns_the_extracted_record() {
    let stub = spawn_stub(ChatStub::Record).await;
    let dir = tempfile::tempdir().unwrap();
    let app = app(stub, dir.path());

    let response = app.oneshot(upload_request("report.pdf")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["name"], "Jo");
    assert_eq!(body["age"], 63);
}

#[tokio::test]
async fn unparseable_model_reply_is_a_soft_error_with_status_200() {
    let stub = spawn_stub(ChatStub::Prose).await;
    let dir = tempfile::tempdir().unwrap();
    let app = app(stub, dir.path());

    let response = app.oneshot(upload_request("report.pdf")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, json!({"error": "Extraction failed"}));
}

#[tokio::test]
async fn remote_chat_failure_maps_to_500_with_the_message() {
    let stub = spawn_stub(ChatStub::Unavailable).await;
    let dir = tempfile::tempdir().unwrap();
    let app = app(stub, dir.path());

    let response = app.oneshot(upload_request("report.pdf")).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response).await;
    let message = body["error"].as_str().unwrap();
    assert!(message.contains("chat completion"), "got: {message}");
    assert!(message.contains("503"), "got: {message}");
}

#[tokio::test]
async fn missing_file_field_is_a_500() {
    let stub = spawn_stub(ChatStub::Record).await;
    let dir = tempfile::tempdir().unwrap();
    let app = app(stub, dir.path());

    let boundary = "pdf2record-test-boundary";
    let body = format!(
        "--{boundary}\r\n\
         Content-Disposition: form-data; name=\"other\"\r\n\
         \r\n\
         not a file\r\n\
         --{boundary}--\r\n"
    );
    let request = Request::builder()
        .method("POST")
        .uri("/summarize/")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response).await;
    assert!(body["error"].as_str().unwrap().contains("missing multipart field"));
}

#[tokio::test]
async fn repeated_uploads_of_the_same_filename_keep_separate_artifacts() {
    let stub = spawn_stub(ChatStub::Record).await;
    let dir = tempfile::tempdir().unwrap();
    let app = app(stub, dir.path());

    let first = app.clone().oneshot(upload_request("report.pdf")).await.unwrap();
    let second = app.clone().oneshot(upload_request("report.pdf")).await.unwrap();
    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(second.status(), StatusCode::OK);
    assert_eq!(json_body(first).await["run"], 1);
    assert_eq!(json_body(second).await["run"], 2);

    // Each request ran in its own directory with its own artifact pair.
    let run_dirs: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_dir())
        .collect();
    assert_eq!(run_dirs.len(), 2);
    for run in &run_dirs {
        assert!(run.path().join("report.pdf").is_file());
        assert!(run.path().join("report.md").is_file());
        assert!(run.path().join("report_structured.json").is_file());
    }

    // The results endpoint serves the newest of the two runs.
    let response = app
        .oneshot(
            Request::builder()
                .uri("/results/?filename=report")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["structured_json"]["run"], 2);
    assert!(body["markdown_summary"]
        .as_str()
        .unwrap()
        .contains("# Summary of report.pdf"));
}

#[tokio::test]
async fn results_rejects_escaping_filenames() {
    let stub = spawn_stub(ChatStub::Record).await;
    let dir = tempfile::tempdir().unwrap();
    let app = app(stub, dir.path());

    for filename in ["../outside", "/etc/hostname"] {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri(format!("/results/?filename={filename}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "for {filename}");
        assert_eq!(json_body(response).await, json!({"error": "Files not found."}));
    }
}
