//! Campus SDK: list-query engine and race-free sequence allocation for PostgreSQL-backed axum services.

pub mod config;
pub mod error;
pub mod extractors;
pub mod list;
pub mod response;
pub mod sequence;
pub mod settings;
pub mod sql;
pub mod store;

pub use config::{load_from_path, load_from_str, resolve, CatalogConfig, ResolvedEntity, ResolvedModel};
pub use error::{AppError, ConfigError};
pub use extractors::ListParams;
pub use list::{ListQueryEngine, ListSpec, PaginationResult, QueryRequest, SortOrder};
pub use response::{success_one, ListOutcome, Page};
pub use sequence::{
    format_business_code, BusinessCodeSpec, CounterStore, PgCounterStore, RetryPolicy, SequenceAllocator,
    SequenceScope, SequenceValue,
};
pub use settings::{CountStrategy, ListSettings, Settings};
pub use sql::{BaseQuery, ColumnKind, ColumnRef};
pub use store::{ensure_database_exists, ensure_sequence_table, peek_sequence};
