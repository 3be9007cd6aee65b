use crate::error::ConfigError;
use crate::sql::{qualified_table, validate_identifier, ColumnRef};

/// Which counter: one per entity table. The created-at column only feeds
/// display formatting; it never partitions the counter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SequenceScope {
    schema: String,
    table: String,
    id_column: ColumnRef,
    created_at_column: ColumnRef,
}

impl SequenceScope {
    pub fn new(
        schema: impl Into<String>,
        table: impl Into<String>,
        id_column: ColumnRef,
        created_at_column: ColumnRef,
    ) -> Result<Self, ConfigError> {
        let schema = schema.into();
        let table = table.into();
        validate_identifier(&schema)?;
        validate_identifier(&table)?;
        if !id_column.kind().is_integer() {
            return Err(ConfigError::Validation(format!(
                "{}.{}: sequence column '{}' must be an integer column",
                schema,
                table,
                id_column.name()
            )));
        }
        Ok(SequenceScope {
            schema,
            table,
            id_column,
            created_at_column,
        })
    }

    /// Counter row key, e.g. `finance.bills`.
    pub fn key(&self) -> String {
        format!("{}.{}", self.schema, self.table)
    }

    pub fn id_column(&self) -> &ColumnRef {
        &self.id_column
    }

    pub fn created_at_column(&self) -> &ColumnRef {
        &self.created_at_column
    }

    pub(crate) fn qualified_table(&self) -> String {
        qualified_table(&self.schema, &self.table)
    }
}
