//! List-query engine: search, filter, sort and paginate over a base query.

mod engine;
mod pagination;
mod plan;
mod request;
mod spec;

pub use engine::ListQueryEngine;
pub use pagination::{PageWindow, PaginationResult};
pub use plan::{FilterClause, ListPlan, OrderClause, SearchClause};
pub use request::{QueryRequest, SortOrder};
pub use spec::ListSpec;
