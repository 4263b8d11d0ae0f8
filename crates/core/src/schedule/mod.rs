//! Release-time scheduling.
//!
//! The phase clock derives the scheduling regime from the current instant:
//! - **Waiting**: before the advance window; sleep once until it opens.
//! - **PreOpen**: inside the advance window; poll at the tight pre-open interval.
//! - **Open**: at or after the release instant; poll at the steady interval.

mod clock;
mod parse;
mod types;

pub use clock::current_phase;
pub(crate) use clock::backoff_interval;
pub use parse::parse_release_time;
pub use types::{Phase, PhaseDecision, RetryPolicy, ScheduleConfig};

use thiserror::Error;

/// Invalid scheduling input. Rejected before any worker starts.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("Unrecognized time format: {0}")]
    InvalidFormat(String),

    #[error("Release time is not in the future: {0}")]
    InPast(String),
}
