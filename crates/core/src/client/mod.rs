//! Remote service adapter.
//!
//! [`ResourceClient`] performs one acquisition attempt and classifies the
//! response; [`SessionProbe`] checks session validity without touching the
//! contested resource.

mod classifier;
mod http;
mod types;
pub(crate) mod wire;

pub use classifier::{classify_heartbeat, classify_listing_probe, ResponseClassifier, XkClassifier};
pub use http::{HeartbeatProbe, HttpResourceClient, ListingProbe};
pub use types::*;
