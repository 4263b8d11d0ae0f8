//! Acquisition targets (course sections) and their durable descriptors.

mod json_store;
mod sqlite_store;
mod store;
mod types;

pub use json_store::JsonDirTargetStore;
pub use sqlite_store::SqliteTargetStore;
pub use store::{TargetError, TargetStore};
pub use types::{ClazzType, Target};
