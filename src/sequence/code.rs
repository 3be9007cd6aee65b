//! Business codes: `PREFIX + YY-MM- + zero-padded counter`, rendered at read time.

use crate::error::AppError;
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use serde_json::Value;
use std::fmt;
use std::num::NonZeroU64;

/// A counter value handed out by the allocator. Always positive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SequenceValue(NonZeroU64);

impl SequenceValue {
    /// None for zero or negative input.
    pub fn new(raw: i64) -> Option<Self> {
        u64::try_from(raw).ok().and_then(NonZeroU64::new).map(SequenceValue)
    }

    pub fn get(self) -> u64 {
        self.0.get()
    }
}

impl TryFrom<i64> for SequenceValue {
    type Error = AppError;

    fn try_from(raw: i64) -> Result<Self, Self::Error> {
        SequenceValue::new(raw).ok_or_else(|| AppError::Fatal(format!("sequence value must be positive, got {}", raw)))
    }
}

impl fmt::Display for SequenceValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// `format_business_code("BI", 7, 2025-01-15) == "BI25-01-0007"`. Values past 9999 print in full.
pub fn format_business_code(prefix: &str, value: SequenceValue, created_at: &impl Datelike) -> String {
    format!(
        "{}{:02}-{:02}-{:04}",
        prefix,
        created_at.year().rem_euclid(100),
        created_at.month(),
        value.get()
    )
}

/// How one entity renders its code into a decoded row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BusinessCodeSpec {
    pub prefix: String,
    /// Row field holding the raw counter.
    pub value_field: String,
    /// Row field holding the creation timestamp.
    pub created_at_field: String,
    /// Field the code is written to, e.g. `bill_id`.
    pub code_field: String,
}

impl BusinessCodeSpec {
    /// Insert the code into a JSON row. Rows without a counter or timestamp get `null`.
    pub fn render(&self, row: &mut Value) -> Result<(), AppError> {
        let Some(obj) = row.as_object_mut() else {
            return Ok(());
        };
        let raw = obj.get(&self.value_field).and_then(Value::as_i64);
        let created = obj
            .get(&self.created_at_field)
            .and_then(Value::as_str)
            .and_then(parse_row_date);
        let code = match (raw, created) {
            (Some(raw), Some(date)) => {
                let value = SequenceValue::try_from(raw)?;
                Value::String(format_business_code(&self.prefix, value, &date))
            }
            _ => Value::Null,
        };
        obj.insert(self.code_field.clone(), code);
        Ok(())
    }

    pub fn render_all(&self, rows: &mut [Value]) -> Result<(), AppError> {
        for row in rows {
            self.render(row)?;
        }
        Ok(())
    }
}

/// Dates as the row decoder writes them: RFC 3339, naive timestamp, or plain date.
fn parse_row_date(s: &str) -> Option<NaiveDate> {
    DateTime::parse_from_rfc3339(s)
        .map(|d| d.date_naive())
        .ok()
        .or_else(|| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f").map(|d| d.date()).ok())
        .or_else(|| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
}
