//! Field validator: mandatory-field checks and the final scrub step.

use phf::phf_set;

use crate::error::ValidationError;
use crate::types::EventRecord;

/// Datastore-internal fields that must never reach the index.
pub static SCRUB_FIELDS: phf::Set<&'static str> = phf_set! {
    "_id",
    "_type",
    "_index",
    "_source",
    "__ts_timeline_id",
};

/// Fields every CSV/JSONL event must carry.
pub const DEFAULT_MANDATORY_FIELDS: [&str; 3] = ["message", "datetime", "timestamp_desc"];

/// Columns every Redline export must carry.
pub const REDLINE_FIELDS: [&str; 5] = ["Alert", "Tag", "Timestamp", "Field", "Summary"];

/// Drop `datetime` from the mandatory set when the input has no `datetime`
/// but does have a `timestamp` it can be derived from.
pub fn effective_mandatory(headers: &[String], mandatory: &[String]) -> Vec<String> {
    let has = |name: &str| headers.iter().any(|h| h == name);
    if !has("datetime") && has("timestamp") {
        mandatory
            .iter()
            .filter(|f| f.as_str() != "datetime")
            .cloned()
            .collect()
    } else {
        mandatory.to_vec()
    }
}

/// Fail if any mandatory field is neither in `found` nor produced by a
/// mapping rule (`mapped`). The error carries all four sets.
pub fn check_mandatory(
    found: &[String],
    mandatory: &[String],
    mapped: &[String],
) -> Result<(), ValidationError> {
    let missing: Vec<String> = mandatory
        .iter()
        .filter(|m| !found.contains(m) && !mapped.contains(m))
        .cloned()
        .collect();

    if missing.is_empty() {
        return Ok(());
    }

    Err(ValidationError::MissingMandatory {
        mandatory: mandatory.to_vec(),
        found: found.to_vec(),
        mapped: mapped.to_vec(),
        missing,
    })
}

/// Remove datastore-internal fields and every null or non-finite value.
pub fn scrub(record: &mut EventRecord) {
    record.retain(|key, value| !SCRUB_FIELDS.contains(key) && !value.is_null());
}
