//! Scheduled concurrent acquisition engine.
//!
//! - **Worker**: one per target; attempts sequentially until success or cancellation.
//! - **Coordinator**: fans workers out, bounds in-flight calls with a shared pool.
//! - **Session monitor**: independent periodic probe sharing only the auth context.

mod cancel;
mod coordinator;
mod monitor;
mod types;
mod worker;

pub use cancel::{CancelReason, CancelSignal};
pub use coordinator::AcquisitionCoordinator;
pub use monitor::{MonitorHandle, MonitorPlan, SessionMonitor};
pub use types::{CoordinatorStatus, EngineError, RunReport, TargetReport, WorkerState};
pub use worker::AcquisitionWorker;
