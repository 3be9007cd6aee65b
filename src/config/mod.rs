//! Entity catalog: JSON types, validation, and resolution into list/sequence descriptors.

pub mod types;
pub mod loader;
pub mod validator;
pub mod resolved;

pub use types::*;
pub use loader::*;
pub use validator::*;
pub use resolved::*;
