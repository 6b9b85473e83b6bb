//! Field-level validation errors.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::error::DomainError;

/// Validation failures keyed by field name (camelCase, as clients send them).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_insert_with(|| message.into());
    }

    /// Record `message` for `field` when `value` is missing or blank.
    pub fn require(&mut self, field: &str, value: Option<&str>, message: &str) {
        if value.is_none_or(|v| v.trim().is_empty()) {
            self.add(field, message);
        }
    }

    /// Parse an optional date, recording `message` when it is present but unparseable.
    pub fn optional_date(&mut self, field: &str, raw: Option<String>, message: &str) -> Option<DateTime<Utc>> {
        let raw = clean(raw)?;
        let parsed = parse_date(&raw);
        if parsed.is_none() {
            self.add(field, message);
        }
        parsed
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// `Ok(())` when nothing was recorded, otherwise `DomainError::Fields`.
    pub fn into_result(self) -> Result<(), DomainError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(DomainError::Fields(self))
        }
    }
}

/// Trim a text field, mapping blank input to `None`.
pub fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse a client-supplied date.
///
/// Accepts RFC 3339 timestamps as well as bare `YYYY-MM-DD` dates (midnight UTC),
/// which is what HTML date inputs submit.
pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

/// Read a number from JSON input, accepting numeric strings as HTML forms send them.
///
/// `None` for null, blank or non-numeric values.
pub fn number(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        _ => None,
    }
}

/// Like [`number`], but only for whole numbers that fit an `i64`.
pub fn integer(value: Option<&Value>) -> Option<i64> {
    // 2^63 is exact as an f64; anything at or past it would saturate.
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    number(value)
        .filter(|n| n.fract() == 0.0 && *n >= -LIMIT && *n < LIMIT)
        .map(|n| n as i64)
}

/// True when the value is numeric but larger than `max`.
pub fn exceeds(value: Option<&Value>, max: u32) -> bool {
    number(value).is_some_and(|n| n > f64::from(max))
}

/// True when the client sent something other than null/blank.
pub fn is_present(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.trim().is_empty(),
        Some(_) => true,
    }
}
