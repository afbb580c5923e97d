//! OCR stage: remote markdown extraction for one document.
//!
//! Three round-trips against the hosted service, in order: upload the raw
//! bytes tagged for OCR purpose, obtain a short-lived signed URL for the
//! uploaded object, and submit that URL to the OCR endpoint requesting
//! page-level markdown. The signed URL is consumed immediately, well inside
//! its one-hour minimum expiry.
//!
//! Remote failures at any of the three steps propagate as hard errors — no
//! local retry. An empty result is not an error at this layer: zero blocks
//! is a valid answer the orchestrator turns into a placeholder file.

use crate::client::{MistralClient, OcrPage};
use crate::error::ExtractError;
use tracing::debug;

/// Extract the ordered markdown blocks for a document.
///
/// Returns one block per source page that produced text, trimmed, with
/// blank pages dropped, preserving page order.
pub async fn extract_markdown(
    client: &MistralClient,
    bytes: Vec<u8>,
    document_name: &str,
) -> Result<Vec<String>, ExtractError> {
    let uploaded = client.upload_for_ocr(document_name, bytes).await?;
    let signed = client.signed_url(&uploaded.id).await?;
    debug!("obtained signed URL for file {}", uploaded.id);
    let response = client.ocr(&signed.url).await?;
    Ok(collect_blocks(response.pages))
}

/// Keep each page's markdown only if present and non-blank after trimming,
/// in page order.
fn collect_blocks(pages: Vec<OcrPage>) -> Vec<String> {
    pages
        .into_iter()
        .filter_map(|page| page.markdown)
        .map(|markdown| markdown.trim().to_string())
        .filter(|markdown| !markdown.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(markdown: Option<&str>) -> OcrPage {
        serde_json::from_value(match markdown {
            Some(m) => serde_json::json!({ "markdown": m }),
            None => serde_json::json!({}),
        })
        .unwrap()
    }

    #[test]
    fn blocks_preserve_page_order() {
        let pages = vec![page(Some("# One")), page(Some("# Two")), page(Some("# Three"))];
        assert_eq!(collect_blocks(pages), vec!["# One", "# Two", "# Three"]);
    }

    #[test]
    fn blank_and_missing_pages_are_dropped() {
        let pages = vec![
            page(Some("  \n\t ")),
            page(None),
            page(Some("content")),
            page(Some("")),
        ];
        assert_eq!(collect_blocks(pages), vec!["content"]);
    }

    #[test]
    fn blocks_are_trimmed() {
        let pages = vec![page(Some("  # Heading\n\n"))];
        assert_eq!(collect_blocks(pages), vec!["# Heading"]);
    }

    #[test]
    fn zero_pages_yield_an_empty_sequence() {
        assert!(collect_blocks(vec![]).is_empty());
    }
}
