//! Column descriptors: the only way a column name reaches generated SQL.

use crate::error::ConfigError;
use regex::Regex;

const IDENTIFIER_PATTERN: &str = "^[A-Za-z_][A-Za-z0-9_]*$";

/// Quote identifier for PostgreSQL (safe: only from validated descriptors).
pub(crate) fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

/// Full qualified table name.
pub(crate) fn qualified_table(schema: &str, table: &str) -> String {
    format!("{}.{}", quoted(schema), quoted(table))
}

/// Reject anything that is not a plain SQL identifier.
pub fn validate_identifier(name: &str) -> Result<(), ConfigError> {
    let re = Regex::new(IDENTIFIER_PATTERN).map_err(|e| ConfigError::Validation(e.to_string()))?;
    if name.len() > 63 || !re.is_match(name) {
        return Err(ConfigError::InvalidIdentifier(name.to_string()));
    }
    Ok(())
}

/// Value class of a column; drives filter coercion and search casts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Integer,
    Numeric,
    Boolean,
    Uuid,
    Timestamp,
    Date,
}

impl ColumnKind {
    /// Map a PostgreSQL type name from the catalog. Unknown and enum types are text-like.
    pub fn from_pg_type(pg_type: &str) -> Self {
        let t = pg_type.trim().to_lowercase();
        match t.as_str() {
            "smallint" | "integer" | "int" | "int2" | "int4" | "int8" | "bigint" | "serial" | "bigserial"
            | "smallserial" => ColumnKind::Integer,
            "numeric" | "decimal" | "real" | "float4" | "float8" | "double precision" | "money" => ColumnKind::Numeric,
            "bool" | "boolean" => ColumnKind::Boolean,
            "uuid" => ColumnKind::Uuid,
            "date" => ColumnKind::Date,
            _ if t.starts_with("timestamp") => ColumnKind::Timestamp,
            _ if t.starts_with("numeric(") || t.starts_with("decimal(") => ColumnKind::Numeric,
            _ => ColumnKind::Text,
        }
    }

    pub fn is_integer(self) -> bool {
        matches!(self, ColumnKind::Integer)
    }
}

/// A declared, validated column reference.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColumnRef {
    name: String,
    kind: ColumnKind,
}

impl ColumnRef {
    pub fn new(name: impl Into<String>, kind: ColumnKind) -> Result<Self, ConfigError> {
        let name = name.into();
        validate_identifier(&name)?;
        Ok(ColumnRef { name, kind })
    }

    pub fn text(name: impl Into<String>) -> Result<Self, ConfigError> {
        Self::new(name, ColumnKind::Text)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ColumnKind {
        self.kind
    }

    /// Column of the wrapped base query, e.g. `"base"."created_at"`.
    pub(crate) fn qualified(&self, alias: &str) -> String {
        format!("{}.{}", quoted(alias), quoted(&self.name))
    }
}
