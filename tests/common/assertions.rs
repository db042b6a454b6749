//! Domain-specific assertion macros for evingest harnesses.
//!
//! These wrap `pretty_assertions` and add context-rich failure messages that
//! make it clear which record and which field broke the canonical shape.

use evingest::{EventRecord, FieldValue};

// ---------------------------------------------------------------------------
// Field assertions
// ---------------------------------------------------------------------------

/// Assert that an `EventRecord` has a field equal to a JSON-literal value.
///
/// ```rust
/// assert_field!(record, "message", "Service started");
/// assert_field!(record, "timestamp", 1_705_312_800_000_000i64);
/// ```
#[macro_export]
macro_rules! assert_field {
    ($record:expr, $key:expr, $value:tt) => {{
        let record: &evingest::EventRecord = &$record;
        let key: &str = $key;
        let expected = serde_json::json!($value);
        match record.get(key) {
            Some(actual) if serde_json::to_value(actual).unwrap() == expected => {}
            Some(actual) => panic!(
                "assert_field! failed:\n  record[{:?}]\n  expected: {}\n  actual:   {:?}",
                key, expected, actual
            ),
            None => panic!(
                "assert_field! failed: field {:?} not found in record.\n  Available fields: {:?}",
                key,
                record.key_list()
            ),
        }
    }};
}

/// Assert that an `EventRecord` does not carry `key`.
#[macro_export]
macro_rules! assert_no_field {
    ($record:expr, $key:expr) => {{
        let record: &evingest::EventRecord = &$record;
        let key: &str = $key;
        if let Some(value) = record.get(key) {
            panic!("assert_no_field! failed: {:?} present with value {:?}", key, value);
        }
    }};
}

// ---------------------------------------------------------------------------
// Canonical shape
// ---------------------------------------------------------------------------

/// Check the invariants every emitted record must satisfy:
///
/// - `message`, `datetime`, `timestamp_desc` present;
/// - `datetime` is canonical ISO-8601 with a `+00:00` offset;
/// - `timestamp` is the microsecond epoch of `datetime`;
/// - no null values, no datastore-internal fields;
/// - `tag`, when present, is a list of non-empty strings.
pub fn assert_canonical(record: &EventRecord) {
    for key in ["message", "datetime", "timestamp_desc", "timestamp"] {
        assert!(record.contains(key), "missing {key:?} in {:?}", record.key_list());
    }

    let datetime = match record.get("datetime") {
        Some(FieldValue::Text(s)) => s.clone(),
        other => panic!("datetime is not text: {other:?}"),
    };
    assert!(datetime.ends_with("+00:00"), "datetime not UTC-canonical: {datetime}");
    let parsed = chrono::DateTime::parse_from_rfc3339(&datetime)
        .unwrap_or_else(|e| panic!("datetime {datetime:?} is not RFC 3339: {e}"));
    let micros = parsed.timestamp_micros();
    assert_eq!(
        record.get("timestamp"),
        Some(&FieldValue::Integer(micros)),
        "timestamp does not match datetime {datetime}"
    );

    for (key, value) in record.iter() {
        assert!(!value.is_null(), "null value left in {key:?}");
        assert!(
            !["_id", "_type", "_index", "_source", "__ts_timeline_id"].contains(&key),
            "internal field {key:?} not scrubbed"
        );
    }

    if let Some(tag) = record.get("tag") {
        match tag {
            FieldValue::Tags(tags) => {
                assert!(tags.iter().all(|t| !t.is_empty()), "empty tag in {tags:?}")
            }
            other => panic!("tag is not a list: {other:?}"),
        }
    }
}

/// [`assert_canonical`] over every record.
pub fn assert_all_canonical(records: &[EventRecord]) {
    for record in records {
        assert_canonical(record);
    }
}

/// Pull one field from every record as text, for order/content checks.
pub fn column(records: &[EventRecord], key: &str) -> Vec<String> {
    records
        .iter()
        .map(|r| r.get(key).map(FieldValue::to_text).unwrap_or_default())
        .collect()
}
