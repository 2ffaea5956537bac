use serde_json::Value;

use super::ClassifyError;

/// Characters of the rendered document kept in the sample.
const SAMPLE_CHARS: usize = 200;

#[derive(Debug)]
pub(crate) struct JsonSummary {
    pub structure: &'static str,
    pub size: usize,
    pub sample: String,
}

/// Parse a JSON document and report its top-level shape.
pub(crate) fn summarize(content: &[u8]) -> Result<JsonSummary, ClassifyError> {
    let value: Value = serde_json::from_slice(content)?;

    let (structure, size) = match &value {
        Value::Array(items) => ("list", items.len()),
        Value::Object(fields) => ("dict", fields.len()),
        other => return Err(ClassifyError::UnsizedJson { found: kind(other) }),
    };

    let rendered = serde_json::to_string_pretty(&value)?;

    Ok(JsonSummary {
        structure,
        size,
        sample: truncate(rendered),
    })
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn truncate(text: String) -> String {
    match text.char_indices().nth(SAMPLE_CHARS) {
        Some((end, _)) => format!("{}...", &text[..end]),
        None => text,
    }
}
