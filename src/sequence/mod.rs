//! Sequential business identifiers: atomic per-table counters and their display codes.

mod allocator;
mod code;
mod retry;
mod scope;
mod store;

pub use allocator::SequenceAllocator;
pub use code::{format_business_code, BusinessCodeSpec, SequenceValue};
pub use retry::RetryPolicy;
pub use scope::SequenceScope;
pub use store::{CounterStore, PgCounterStore};
