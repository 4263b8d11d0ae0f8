//! Course catalog - the offerings open to the student in a batch.
//!
//! Offerings are listed page by page from the service and flattened into one
//! entry per teaching class, ready to be saved as acquisition targets.

mod client;
mod types;

pub use client::CatalogClient;
pub use types::*;
