//! Tag field parser.
//!
//! The `tag` field arrives in many shapes: a JSON array, a JSON array
//! serialized into a CSV cell, a comma-separated string, a bare scalar or the
//! `-` placeholder. [`parse_tags`] reduces all of them to a list of strings.

use thiserror::Error;

use crate::types::FieldValue;

/// Placeholder some exporters write for "no tags".
pub const NO_TAGS_SENTINEL: &str = "-";

/// A bracketed tag string that is not a valid JSON array.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("tag value {raw:?} looks like a JSON array but does not parse: {reason}")]
pub struct TagParseError {
    pub raw: String,
    pub reason: String,
}

/// Normalize a raw `tag` value into a list of strings.
///
/// Rules, first match wins:
///
/// 1. already a list → returned as is;
/// 2. `null` → empty list;
/// 3. scalars are coerced to text;
/// 4. `[...]` → parsed as a JSON array, non-string elements stringified;
/// 5. `-` → empty list;
/// 6. contains `,` → split on `,`;
/// 7. otherwise a single-element list.
///
/// Empty entries are kept; pipelines filter them before emitting.
pub fn parse_tags(value: &FieldValue) -> Result<Vec<String>, TagParseError> {
    let text = match value {
        FieldValue::Tags(tags) => return Ok(tags.clone()),
        FieldValue::Nested(serde_json::Value::Array(items)) => {
            return Ok(items.iter().map(json_to_tag).collect());
        }
        FieldValue::Null => return Ok(Vec::new()),
        FieldValue::Text(s) => s.clone(),
        other => other.to_text(),
    };

    if text.starts_with('[') && text.ends_with(']') {
        return serde_json::from_str::<Vec<serde_json::Value>>(&text)
            .map(|items| items.iter().map(json_to_tag).collect())
            .map_err(|e| TagParseError {
                raw: text.clone(),
                reason: e.to_string(),
            });
    }

    if text == NO_TAGS_SENTINEL {
        return Ok(Vec::new());
    }

    if text.contains(',') {
        return Ok(text.split(',').map(str::to_string).collect());
    }

    Ok(vec![text])
}

/// Drop empty and whitespace-only entries.
pub fn retain_non_empty(tags: Vec<String>) -> Vec<String> {
    tags.into_iter().filter(|t| !t.trim().is_empty()).collect()
}

fn json_to_tag(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}
