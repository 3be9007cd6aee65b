//! Raw entity-catalog types as they appear in the JSON file.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ColumnConfig {
    pub name: String,
    /// PostgreSQL type name (e.g. "bigint", "timestamptz", "finance.bill_status").
    #[serde(rename = "type")]
    pub type_: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ListConfig {
    pub default_sort: Option<String>,
    #[serde(default)]
    pub searchable: Vec<String>,
    #[serde(default)]
    pub sortable: Vec<String>,
    #[serde(default)]
    pub filterable: Vec<String>,
    #[serde(default = "default_true")]
    pub paginate_by_default: bool,
    #[serde(default)]
    pub default_limit: Option<u32>,
}

fn default_true() -> bool {
    true
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SequenceConfig {
    /// Code prefix, e.g. "BI" for bills.
    pub prefix: String,
    /// Integer column storing the allocated value.
    pub id_column: String,
    #[serde(default = "default_created_at")]
    pub created_at_column: String,
    /// Response field the rendered code is written to.
    pub code_field: String,
}

fn default_created_at() -> String {
    "created_at".into()
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EntityConfig {
    pub id: String,
    pub path_segment: String,
    #[serde(default = "default_schema")]
    pub schema: String,
    pub table: String,
    #[serde(default = "default_pk")]
    pub primary_key: String,
    pub columns: Vec<ColumnConfig>,
    /// Replaces `SELECT <columns> FROM schema.table`, e.g. to join display names.
    #[serde(default)]
    pub source_sql: Option<String>,
    #[serde(default)]
    pub list: ListConfig,
    #[serde(default)]
    pub sequence: Option<SequenceConfig>,
}

fn default_schema() -> String {
    "public".into()
}

fn default_pk() -> String {
    "id".into()
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CatalogConfig {
    pub entities: Vec<EntityConfig>,
}
