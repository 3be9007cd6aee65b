//! Safe SQL building: identifiers from validated descriptors only, values as parameters.

mod base;
mod builder;
mod column;
pub mod counter;
pub mod params;
pub mod row;

pub use base::{BaseQuery, SelectColumn};
pub use builder::{select_all, select_count, select_page, QueryBuf};
pub(crate) use builder::TOTAL_COLUMN;
pub use column::{validate_identifier, ColumnKind, ColumnRef};
pub(crate) use column::{qualified_table, quoted};
pub use params::*;
