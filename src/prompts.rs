//! Prompt construction for the structured-extraction chat call.
//!
//! Centralising every prompt here serves two purposes:
//!
//! 1. **Single source of truth** — changing the instruction wording or the
//!    default field list requires editing exactly one place.
//!
//! 2. **Testability** — unit tests can inspect generated prompts directly
//!    without a live model call, making prompt regressions easy to catch.
//!
//! Two prompt shapes exist. The default names four fixed fields. When a
//! schema file (JSON mapping of field name → example value) is supplied, the
//! prompt instead lists `<field> (<type-name>)` per entry, with the type
//! name derived from the example value's JSON type. The type is advisory
//! metadata shown to the model only — nothing validates the parsed record
//! against it.

use serde_json::Value;
use std::path::Path;
use tracing::warn;

/// Instruction header shared by both prompt shapes.
const PROMPT_HEADER: &str = "You are an assistant extracting structured information from a medical PET/CT scan report.\n\
Respond ONLY with valid JSON. Do not include explanations or comments.\n";

/// Build the prompt for the extraction call.
///
/// When `schema_path` is given and loadable, produces the schema-derived
/// prompt; on any load failure (missing file, malformed JSON, non-object
/// root) a warning is logged and the default prompt is used instead. Never
/// fails — callers always get a usable prompt.
pub fn build_prompt(markdown_text: &str, schema_path: Option<&Path>) -> String {
    let Some(path) = schema_path else {
        return default_prompt(markdown_text);
    };

    match load_schema(path) {
        Ok(schema) => schema_prompt(markdown_text, &schema),
        Err(reason) => {
            warn!(
                "failed to load schema from '{}': {reason}; using default prompt",
                path.display()
            );
            default_prompt(markdown_text)
        }
    }
}

/// The fixed four-field prompt used when no schema is supplied.
pub fn default_prompt(markdown_text: &str) -> String {
    format!(
        "{PROMPT_HEADER}\
         Please extract and return the following fields in strict JSON format:\n\
         \x20 - name (string)\n\
         \x20 - sex (Male/Female/Other)\n\
         \x20 - age (integer)\n\
         \x20 - summary (a brief summary of diagnosis or findings)\n\n\
         Text:\n{markdown_text}"
    )
}

/// Prompt listing `<field> (<type-name>)` for each schema entry.
pub fn schema_prompt(markdown_text: &str, schema: &serde_json::Map<String, Value>) -> String {
    let fields = schema
        .iter()
        .map(|(name, example)| format!("  - {name} ({})", json_type_name(example)))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "{PROMPT_HEADER}\
         Please extract and return the following fields in valid JSON format:\n\
         {fields}\n\n\
         Text:\n{markdown_text}"
    )
}

/// Read and parse a schema file into a field → example-value mapping.
fn load_schema(path: &Path) -> Result<serde_json::Map<String, Value>, String> {
    let raw = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
    match serde_json::from_str::<Value>(&raw) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(format!(
            "schema root must be a JSON object, got {}",
            json_type_name(&other)
        )),
        Err(e) => Err(e.to_string()),
    }
}

/// Type label shown to the model for a schema example value.
///
/// Labels follow the names callers writing schemas by hand expect from the
/// original tooling: `str`, `int`, `float`, `bool`, `list`, `dict`,
/// `NoneType`.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::String(_) => "str",
        Value::Number(n) if n.is_i64() || n.is_u64() => "int",
        Value::Number(_) => "float",
        Value::Bool(_) => "bool",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
        Value::Null => "NoneType",
    }
}
