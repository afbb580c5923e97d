//! Integration tests for the artifact contract: markdown summary, structured
//! JSON, and the results-endpoint read path.
//!
//! Everything here runs offline against a temp directory. Live-API runs are
//! gated behind the `E2E_ENABLED` environment variable (plus a real
//! `MISTRAL_API_KEY` and a test PDF) so they never fire in CI unless
//! explicitly requested:
//!
//!   E2E_ENABLED=1 E2E_PDF=./report.pdf cargo test --test pipeline -- --nocapture

use pdf2record::pipeline::persist::{
    render_markdown, write_markdown, write_structured, BLOCK_SEPARATOR, EMPTY_PLACEHOLDER,
};
use pdf2record::prompts;
use pdf2record::server::routes::load_results;
use pdf2record::StructuredRecord;
use serde_json::{json, Value};
use std::path::PathBuf;

fn record(value: Value) -> StructuredRecord {
    match value {
        Value::Object(map) => map,
        _ => panic!("test record must be an object"),
    }
}

// ── Markdown artifact ────────────────────────────────────────────────────

#[tokio::test]
async fn markdown_file_contains_n_blocks_in_page_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scan.md");
    let blocks: Vec<String> = (1..=4).map(|i| format!("page {i}")).collect();

    write_markdown(&path, "scan.pdf", &blocks).await.unwrap();

    let written = std::fs::read_to_string(&path).unwrap();
    assert_eq!(written.matches("---").count(), 3, "N blocks need N-1 rules");
    let body = written.strip_prefix("# Summary of scan.pdf\n\n").unwrap();
    let parts: Vec<&str> = body.split(BLOCK_SEPARATOR).collect();
    assert_eq!(parts, vec!["page 1", "page 2", "page 3", "page 4"]);
}

#[tokio::test]
async fn empty_document_writes_placeholder_and_prompts_on_empty_text() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("blank.md");

    write_markdown(&path, "blank.pdf", &[]).await.unwrap();
    let written = std::fs::read_to_string(&path).unwrap();
    assert!(written.contains(EMPTY_PLACEHOLDER));

    // The pipeline still builds a prompt from the (empty) joined text and
    // proceeds to the extraction stage.
    let prompt = prompts::build_prompt("", None);
    assert!(prompt.ends_with("Text:\n"));
    assert!(prompt.contains("- name (string)"));
}

#[test]
fn render_markdown_keeps_source_page_order() {
    let blocks = vec!["z-last-alphabetically".to_string(), "a-first".to_string()];
    let md = render_markdown("scan.pdf", &blocks);
    let z = md.find("z-last-alphabetically").unwrap();
    let a = md.find("a-first").unwrap();
    assert!(z < a, "blocks must stay in page order, not sort order");
}

// ── Structured artifact + results read path ──────────────────────────────

#[tokio::test]
async fn structured_round_trip_through_results_is_semantically_equal() {
    let dir = tempfile::tempdir().unwrap();
    let original = record(json!({
        "name": "Jörg Müller",
        "sex": "Male",
        "age": 63,
        "summary": "Unremarkable follow-up — no new findings."
    }));

    write_markdown(
        &dir.path().join("scan.md"),
        "scan.pdf",
        &["block".to_string()],
    )
    .await
    .unwrap();
    write_structured(&dir.path().join("scan_structured.json"), &original)
        .await
        .unwrap();

    let found = load_results(dir.path(), "scan").await.unwrap();
    assert_eq!(found.structured_json, Value::Object(original));
}

#[tokio::test]
async fn structured_file_is_four_space_indented_with_verbatim_utf8() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scan_structured.json");
    write_structured(&path, &record(json!({"name": "Jörg"})))
        .await
        .unwrap();

    let raw = std::fs::read_to_string(&path).unwrap();
    assert!(raw.starts_with("{\n    \"name\""), "got: {raw}");
    assert!(raw.contains("Jörg"));
    assert!(!raw.contains("\\u"));
}

#[tokio::test]
async fn results_for_unknown_filename_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    assert!(load_results(dir.path(), "never-processed").await.is_none());
}

#[tokio::test]
async fn results_with_only_markdown_present_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    write_markdown(
        &dir.path().join("half.md"),
        "half.pdf",
        &["block".to_string()],
    )
    .await
    .unwrap();
    assert!(load_results(dir.path(), "half").await.is_none());
}

// ── Live end-to-end (opt-in) ─────────────────────────────────────────────

/// Skip unless E2E_ENABLED is set and a test PDF exists.
macro_rules! e2e_skip_unless_ready {
    () => {{
        if std::env::var("E2E_ENABLED").is_err() {
            println!("SKIP — set E2E_ENABLED=1 to run live e2e tests");
            return;
        }
        let path = PathBuf::from(std::env::var("E2E_PDF").unwrap_or_default());
        if !path.is_file() {
            println!("SKIP — set E2E_PDF to an existing PDF file");
            return;
        }
        path
    }};
}

#[tokio::test]
async fn e2e_full_pipeline_against_live_api() {
    let pdf = e2e_skip_unless_ready!();

    let config = pdf2record::PipelineConfig::from_env().expect("MISTRAL_API_KEY must be set");
    let client = pdf2record::MistralClient::new(&config).unwrap();

    // Copy into a temp dir so artifacts never land next to the source file.
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join(pdf.file_name().unwrap());
    std::fs::copy(&pdf, &input).unwrap();

    let outcome = pdf2record::pipeline::process(&client, &input, None)
        .await
        .expect("pipeline must not hard-fail");

    match outcome {
        pdf2record::PipelineOutcome::Complete(output) => {
            assert!(output.markdown_path.is_file());
            assert!(output.structured_path.is_file());
            println!("extracted record: {:?}", output.record);
        }
        pdf2record::PipelineOutcome::ExtractionFailed { markdown_path } => {
            // Soft failure is a legal outcome; the markdown must still exist.
            assert!(markdown_path.is_file());
            println!("extraction failed softly; markdown written");
        }
    }
}
