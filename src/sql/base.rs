//! Caller-provided base query. The list engine wraps it as a subquery and never edits it.

use crate::error::ConfigError;
use crate::sql::column::{qualified_table, quoted, validate_identifier};
use crate::sql::PgBindValue;

/// One selected column of a table-backed base query.
#[derive(Clone, Debug)]
pub struct SelectColumn {
    pub name: String,
    /// PostgreSQL type name; custom enum (schema.typename) and numeric are selected as text.
    pub pg_type: Option<String>,
}

/// A complete SELECT using `$1..$n` placeholders for its own parameters.
#[derive(Clone, Debug)]
pub struct BaseQuery {
    sql: String,
    params: Vec<PgBindValue>,
}

impl BaseQuery {
    /// Wrap raw SQL. Trailing semicolons are dropped so the statement nests as a subquery.
    pub fn new(sql: impl Into<String>) -> Result<Self, ConfigError> {
        let sql = sql.into();
        let sql = sql.trim().trim_end_matches(';').trim_end().to_string();
        if sql.is_empty() {
            return Err(ConfigError::Validation("base query must not be empty".into()));
        }
        Ok(BaseQuery {
            sql,
            params: Vec::new(),
        })
    }

    /// `SELECT <columns> FROM schema.table`.
    pub fn table(schema: &str, table: &str, columns: &[SelectColumn]) -> Result<Self, ConfigError> {
        validate_identifier(schema)?;
        validate_identifier(table)?;
        if columns.is_empty() {
            return Err(ConfigError::Validation(format!("{}.{}: no columns to select", schema, table)));
        }
        for c in columns {
            validate_identifier(&c.name)?;
        }
        let cols = select_column_list(columns);
        Self::new(format!("SELECT {} FROM {}", cols, qualified_table(schema, table)))
    }

    /// Bind the next `$n` parameter of the base SQL.
    pub fn bind(mut self, value: impl Into<PgBindValue>) -> Self {
        self.params.push(value.into());
        self
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn params(&self) -> &[PgBindValue] {
        &self.params
    }
}

/// SELECT list: each column as-is, except custom enum (schema.typename) and numeric as col::text.
fn select_column_list(columns: &[SelectColumn]) -> String {
    columns
        .iter()
        .map(|c| {
            let q = quoted(&c.name);
            let pg_type = c.pg_type.as_deref().unwrap_or("").to_lowercase();
            if pg_type.contains('.') || pg_type.starts_with("numeric") || pg_type.starts_with("decimal") {
                format!("{}::text AS {}", q, q)
            } else {
                q
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(name: &str, pg_type: &str) -> SelectColumn {
        SelectColumn {
            name: name.into(),
            pg_type: Some(pg_type.into()),
        }
    }

    #[test]
    fn table_query_casts_enums_and_numerics() {
        let q = BaseQuery::table(
            "finance",
            "bills",
            &[column("id", "bigint"), column("amount", "numeric(12,2)"), column("status", "finance.bill_status")],
        )
        .unwrap();
        assert_eq!(
            q.sql(),
            "SELECT \"id\", \"amount\"::text AS \"amount\", \"status\"::text AS \"status\" FROM \"finance\".\"bills\""
        );
        assert!(q.params().is_empty());
    }

    #[test]
    fn raw_sql_is_trimmed_and_keeps_params() {
        let q = BaseQuery::new("SELECT * FROM bills WHERE campus_id = $1 ;  ").unwrap().bind(4_i64);
        assert_eq!(q.sql(), "SELECT * FROM bills WHERE campus_id = $1");
        assert_eq!(q.params(), &[PgBindValue::I64(4)]);
        assert!(BaseQuery::new(" ; ").is_err());
    }

    #[test]
    fn table_query_rejects_bad_identifiers() {
        assert!(BaseQuery::table("finance", "bills; --", &[column("id", "bigint")]).is_err());
        assert!(BaseQuery::table("finance", "bills", &[]).is_err());
    }
}
