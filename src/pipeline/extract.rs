//! Extraction stage: chat completion and JSON scraping.
//!
//! The model is instructed to respond with only a JSON object, but replies
//! routinely arrive wrapped in prose ("Sure, here it is: {…}"). Rather than
//! reject those, this stage scans the reply for the first greedy
//! brace-delimited span and parses it as JSON.
//!
//! The scan is a best-effort heuristic, not a brace-depth-aware parser: the
//! greedy match runs from the first `{` to the last `}`, so a reply carrying
//! several disjoint brace groups produces a span that fails to parse and is
//! reported as a failed extraction. Accepted as-is — tightening it would
//! change observable behaviour for replies current callers rely on.

use crate::client::MistralClient;
use crate::error::ExtractError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::warn;

/// The mapping of extracted fields parsed from the model's reply.
///
/// Field presence and types are advisory only; nothing is validated against
/// the prompt's schema.
pub type StructuredRecord = serde_json::Map<String, Value>;

/// Outcome of the extraction stage.
///
/// A reply with no parseable JSON object is an expected soft failure, kept
/// distinct from `Err` so callers cannot mistake "no data" for an
/// exception-worthy error.
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    /// A JSON object was found and parsed.
    Success(StructuredRecord),
    /// No parseable JSON object in the reply.
    Failed,
}

impl Extraction {
    pub fn is_failed(&self) -> bool {
        matches!(self, Extraction::Failed)
    }
}

/// Send the prompt as the sole user message and scrape the reply.
///
/// Remote failures (network, auth, quota) propagate as `Err`; an
/// unparseable reply is `Ok(Extraction::Failed)`.
pub async fn extract_structured(
    client: &MistralClient,
    prompt: &str,
) -> Result<Extraction, ExtractError> {
    let reply = client.complete(prompt).await?;
    Ok(scrape_record(&reply))
}

// Greedy, newline-spanning: first `{` through last `}`.
static RE_JSON_OBJECT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\{.*\}").unwrap());

/// Find and parse the first greedy `{…}` span in a free-text reply.
pub fn scrape_record(reply: &str) -> Extraction {
    let Some(found) = RE_JSON_OBJECT.find(reply) else {
        warn!("no JSON object found in model reply");
        return Extraction::Failed;
    };

    match serde_json::from_str::<Value>(found.as_str()) {
        Ok(Value::Object(record)) => Extraction::Success(record),
        Ok(other) => {
            warn!(
                "scraped span parsed to non-object JSON ({})",
                crate::prompts::json_type_name(&other)
            );
            Extraction::Failed
        }
        Err(e) => {
            warn!("failed to parse JSON object from model reply: {e}");
            Extraction::Failed
        }
    }
}
