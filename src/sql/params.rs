//! Values bound to generated queries.

use crate::error::AppError;
use crate::sql::{ColumnKind, ColumnRef};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use sqlx::encode::{Encode, IsNull};
use sqlx::postgres::{PgTypeInfo, Postgres};
use sqlx::{Database, Type};

/// A value that can be bound to a PostgreSQL query.
#[derive(Clone, Debug, PartialEq)]
pub enum PgBindValue {
    Bool(bool),
    I64(i64),
    String(String),
    Uuid(uuid::Uuid),
}

impl PgBindValue {
    /// Coerce a raw query-string value for an equality match on `column`.
    /// Timestamp, date and numeric values are checked here, then bound as text and cast in SQL.
    pub fn for_column(column: &ColumnRef, raw: &str) -> Result<Self, AppError> {
        let raw = raw.trim();
        Ok(match column.kind() {
            ColumnKind::Integer => PgBindValue::I64(raw.parse().map_err(|_| {
                AppError::invalid_param("field_value", format!("'{}' expects an integer", column.name()))
            })?),
            ColumnKind::Boolean => {
                if raw.eq_ignore_ascii_case("true") {
                    PgBindValue::Bool(true)
                } else if raw.eq_ignore_ascii_case("false") {
                    PgBindValue::Bool(false)
                } else {
                    return Err(AppError::invalid_param(
                        "field_value",
                        format!("'{}' expects true or false", column.name()),
                    ));
                }
            }
            ColumnKind::Uuid => PgBindValue::Uuid(uuid::Uuid::parse_str(raw).map_err(|_| {
                AppError::invalid_param("field_value", format!("'{}' expects a uuid", column.name()))
            })?),
            ColumnKind::Numeric => {
                if !raw.parse::<f64>().is_ok_and(f64::is_finite) {
                    return Err(AppError::invalid_param(
                        "field_value",
                        format!("'{}' expects a number", column.name()),
                    ));
                }
                PgBindValue::String(raw.to_string())
            }
            ColumnKind::Timestamp => {
                if !is_timestamp(raw) {
                    return Err(AppError::invalid_param(
                        "field_value",
                        format!("'{}' expects an RFC 3339 timestamp or YYYY-MM-DD", column.name()),
                    ));
                }
                PgBindValue::String(raw.to_string())
            }
            ColumnKind::Date => {
                if NaiveDate::parse_from_str(raw, "%Y-%m-%d").is_err() {
                    return Err(AppError::invalid_param(
                        "field_value",
                        format!("'{}' expects YYYY-MM-DD", column.name()),
                    ));
                }
                PgBindValue::String(raw.to_string())
            }
            ColumnKind::Text => PgBindValue::String(raw.to_string()),
        })
    }
}

/// RFC 3339, a naive `YYYY-MM-DD[T ]HH:MM:SS[.f]`, or a plain date.
fn is_timestamp(raw: &str) -> bool {
    DateTime::parse_from_rfc3339(raw).is_ok()
        || NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").is_ok()
        || NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f").is_ok()
        || NaiveDate::parse_from_str(raw, "%Y-%m-%d").is_ok()
}

impl From<&str> for PgBindValue {
    fn from(s: &str) -> Self {
        PgBindValue::String(s.to_string())
    }
}

impl From<String> for PgBindValue {
    fn from(s: String) -> Self {
        PgBindValue::String(s)
    }
}

impl From<i64> for PgBindValue {
    fn from(n: i64) -> Self {
        PgBindValue::I64(n)
    }
}

impl From<bool> for PgBindValue {
    fn from(b: bool) -> Self {
        PgBindValue::Bool(b)
    }
}

impl From<uuid::Uuid> for PgBindValue {
    fn from(u: uuid::Uuid) -> Self {
        PgBindValue::Uuid(u)
    }
}

impl<'q> Encode<'q, Postgres> for PgBindValue {
    fn encode_by_ref(
        &self,
        buf: &mut <Postgres as Database>::ArgumentBuffer<'q>,
    ) -> Result<IsNull, Box<dyn std::error::Error + Send + Sync>> {
        Ok(match self {
            PgBindValue::Bool(b) => <bool as Encode<Postgres>>::encode_by_ref(b, buf)?,
            PgBindValue::I64(n) => <i64 as Encode<Postgres>>::encode_by_ref(n, buf)?,
            PgBindValue::String(s) => {
                let s_ref: &str = s.as_str();
                <&str as Encode<Postgres>>::encode_by_ref(&s_ref, buf)?
            }
            PgBindValue::Uuid(u) => <uuid::Uuid as Encode<Postgres>>::encode_by_ref(u, buf)?,
        })
    }

    fn produces(&self) -> Option<PgTypeInfo> {
        Some(match self {
            PgBindValue::String(_) => <String as Type<Postgres>>::type_info(),
            PgBindValue::Bool(_) => <bool as Type<Postgres>>::type_info(),
            PgBindValue::I64(_) => <i64 as Type<Postgres>>::type_info(),
            PgBindValue::Uuid(_) => <uuid::Uuid as Type<Postgres>>::type_info(),
        })
    }
}

impl Type<Postgres> for PgBindValue {
    fn type_info() -> PgTypeInfo {
        PgTypeInfo::with_name("TEXT")
    }

    fn compatible(_ty: &PgTypeInfo) -> bool {
        true
    }
}
