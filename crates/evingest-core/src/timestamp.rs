//! Timestamp normalizer.
//!
//! Turns the two raw shapes a log file uses for time into a UTC instant:
//!
//! - **numeric epochs of unknown unit**, resolved by magnitude
//!   ([`EpochUnit::infer`]);
//! - **textual datetimes**, resolved by [`parse_datetime_text`], which tries a
//!   list of common layouts and treats naive values as UTC.
//!
//! Values that cannot be resolved become `None`, the "not available"
//! sentinel; callers drop those rows. Resolved instants leave the pipeline as
//! [`to_canonical_string`] and [`to_micros`], so `datetime` and `timestamp`
//! are always derived from the same instant.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Timelike, Utc};
use regex::Regex;
use std::sync::OnceLock;

use crate::types::FieldValue;

/// Above this an epoch is read as nanoseconds.
pub const NANOS_THRESHOLD: f64 = 1e17;
/// Above this (and not nanoseconds) an epoch is read as microseconds.
pub const MICROS_THRESHOLD: f64 = 1e14;
/// Above this (and not finer) an epoch is read as milliseconds.
pub const MILLIS_THRESHOLD: f64 = 1e11;
/// A numeric `datetime` column with any value above this is read as
/// microseconds as a whole.
pub const DATETIME_COLUMN_MICROS_THRESHOLD: f64 = 1e15;

/// Unit of a numeric epoch value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpochUnit {
    Seconds,
    Milliseconds,
    Microseconds,
    Nanoseconds,
}

impl EpochUnit {
    /// Guess the unit from the magnitude. Thresholds are exclusive.
    pub fn infer(value: f64) -> Self {
        if value > NANOS_THRESHOLD {
            EpochUnit::Nanoseconds
        } else if value > MICROS_THRESHOLD {
            EpochUnit::Microseconds
        } else if value > MILLIS_THRESHOLD {
            EpochUnit::Milliseconds
        } else {
            EpochUnit::Seconds
        }
    }

    fn per_second(self) -> i64 {
        match self {
            EpochUnit::Seconds => 1,
            EpochUnit::Milliseconds => 1_000,
            EpochUnit::Microseconds => 1_000_000,
            EpochUnit::Nanoseconds => 1_000_000_000,
        }
    }
}

// ---------------------------------------------------------------------------
// Numeric epochs
// ---------------------------------------------------------------------------

/// Convert an integer epoch in `unit` to an instant.
pub fn from_epoch_int(value: i64, unit: EpochUnit) -> Option<DateTime<Utc>> {
    let per_second = unit.per_second();
    let secs = value.div_euclid(per_second);
    let rem = value.rem_euclid(per_second);
    let nanos = rem * (1_000_000_000 / per_second);
    DateTime::from_timestamp(secs, u32::try_from(nanos).ok()?)
}

/// Convert a floating-point epoch in `unit` to an instant.
pub fn from_epoch_float(value: f64, unit: EpochUnit) -> Option<DateTime<Utc>> {
    if !value.is_finite() {
        return None;
    }
    let seconds = value / unit.per_second() as f64;
    let whole = seconds.floor();
    if whole < i64::MIN as f64 || whole > i64::MAX as f64 {
        return None;
    }
    let nanos = ((seconds - whole) * 1e9).round().clamp(0.0, 999_999_999.0);
    DateTime::from_timestamp(whole as i64, nanos as u32)
}

/// Resolve one numeric cell with the magnitude heuristic. Null and
/// non-numeric values give `None`.
pub fn epoch_to_datetime(value: &FieldValue) -> Option<DateTime<Utc>> {
    match value {
        FieldValue::Integer(i) => from_epoch_int(*i, EpochUnit::infer(*i as f64)),
        FieldValue::Float(f) if !f.is_nan() => from_epoch_float(*f, EpochUnit::infer(*f)),
        _ => None,
    }
}

/// Whether every non-null cell is numeric. A column of nulls counts as
/// numeric, the same as an all-missing float column.
pub fn column_is_numeric<'a, I>(cells: I) -> bool
where
    I: IntoIterator<Item = &'a FieldValue>,
{
    cells
        .into_iter()
        .filter(|c| !c.is_null())
        .all(FieldValue::is_numeric)
}

/// Derive a `datetime` column from a numeric `timestamp` column, one cell at
/// a time.
pub fn datetimes_from_epochs(cells: &[&FieldValue]) -> Vec<Option<DateTime<Utc>>> {
    cells.iter().map(|c| epoch_to_datetime(c)).collect()
}

/// Resolve an existing `datetime` column.
///
/// A numeric column holding any value above
/// [`DATETIME_COLUMN_MICROS_THRESHOLD`] is read as microseconds throughout;
/// anything else is parsed as text, cell by cell.
pub fn resolve_datetime_column(cells: &[&FieldValue]) -> Vec<Option<DateTime<Utc>>> {
    let numeric = column_is_numeric(cells.iter().copied());
    let has_large = cells
        .iter()
        .filter_map(|c| c.as_f64())
        .any(|v| v > DATETIME_COLUMN_MICROS_THRESHOLD);

    if numeric && has_large {
        return cells
            .iter()
            .map(|c| match c {
                FieldValue::Integer(i) => from_epoch_int(*i, EpochUnit::Microseconds),
                FieldValue::Float(f) => from_epoch_float(*f, EpochUnit::Microseconds),
                _ => None,
            })
            .collect();
    }

    cells.iter().map(|c| parse_datetime_value(c)).collect()
}

/// Parse a single value as a textual datetime. Only text is accepted.
pub fn parse_datetime_value(value: &FieldValue) -> Option<DateTime<Utc>> {
    match value {
        FieldValue::Text(s) => parse_datetime_text(s),
        FieldValue::Integer(_) | FieldValue::Unsigned(_) | FieldValue::Float(_) => {
            parse_datetime_text(&value.to_text())
        }
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Text
// ---------------------------------------------------------------------------

const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f %z",
    "%Y-%m-%d %H:%M:%S%.f %:z",
    "%Y-%m-%dT%H:%M%z",
    "%Y-%m-%dT%H:%M%:z",
    "%Y/%m/%d %H:%M:%S%.f %z",
    "%d/%b/%Y:%H:%M:%S %z",
    "%a %b %d %H:%M:%S %z %Y",
];

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S%.f",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M:%S%.f",
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %I:%M %p",
    "%d %b %Y %H:%M:%S%.f",
    "%b %d %Y %H:%M:%S%.f",
    "%b %d, %Y %H:%M:%S%.f",
    "%b %d, %Y %I:%M:%S %p",
    "%a %b %d %H:%M:%S%.f %Y",
    "%a, %d %b %Y %H:%M:%S%.f",
    "%d/%b/%Y:%H:%M:%S",
    "%Y%m%dT%H%M%S",
];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d %b %Y",
    "%b %d %Y",
    "%b %d, %Y",
    "%Y%m%d",
];

fn comma_fraction() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(\d{2}:\d{2}:\d{2}),(\d+)").expect("comma fraction pattern is valid")
    })
}

fn utc_suffix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)(\d)\s*(?:z|utc|gmt)$").expect("utc suffix pattern is valid")
    })
}

fn whitespace_runs() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("whitespace pattern is valid"))
}

/// Parse a free-form date/time string into a UTC instant.
///
/// Accepts RFC 3339 and RFC 2822, ISO-like layouts with `T` or a space,
/// optional fractions (`.` or `,`), `Z`/`UTC`/`GMT` or numeric offsets,
/// slash dates, month names, and bare dates (midnight). Values without an
/// offset are taken as UTC. Returns `None` for anything else.
pub fn parse_datetime_text(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }

    let text = whitespace_runs().replace_all(trimmed, " ");
    let text = comma_fraction().replace(&text, "$1.$2");
    let text = utc_suffix().replace(&text, "$1");
    let text = text.as_ref();

    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(text, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, fmt) {
            return date.and_hms_opt(0, 0, 0).map(|naive| Utc.from_utc_datetime(&naive));
        }
    }
    None
}

// ---------------------------------------------------------------------------
// Canonical output
// ---------------------------------------------------------------------------

/// ISO-8601 with an explicit `+00:00` offset. The fraction is printed only
/// when non-zero: six digits, or nine when there are sub-microsecond digits.
pub fn to_canonical_string(dt: &DateTime<Utc>) -> String {
    let nanos = dt.nanosecond() % 1_000_000_000;
    let format = if nanos == 0 {
        SecondsFormat::Secs
    } else if nanos % 1_000 == 0 {
        SecondsFormat::Micros
    } else {
        SecondsFormat::Nanos
    };
    dt.to_rfc3339_opts(format, false)
}

/// Microseconds since the epoch, rounded half-up from the nanosecond value.
pub fn to_micros(dt: &DateTime<Utc>) -> i64 {
    let micros = dt.timestamp_micros();
    if dt.timestamp_subsec_nanos() % 1_000 >= 500 {
        micros + 1
    } else {
        micros
    }
}
