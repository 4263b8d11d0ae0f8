pub mod auth;
pub mod catalog;
pub mod client;
pub mod config;
pub mod engine;
pub mod metrics;
pub mod schedule;
pub mod target;
pub mod testing;

pub use auth::{AuthContext, AuthError, LoginClient, LoginSession, SessionFile};
pub use catalog::{CatalogClient, CatalogError, ClassOffering};
pub use client::{
    AttemptOutcome, HeartbeatProbe, HttpResourceClient, ListingProbe, ProbeStatus,
    ResourceClient, SessionProbe,
};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, SanitizedConfig,
};
pub use engine::{
    AcquisitionCoordinator, CancelReason, CancelSignal, EngineError, MonitorHandle, MonitorPlan,
    RunReport, SessionMonitor, WorkerState,
};
pub use schedule::{parse_release_time, Phase, ScheduleConfig, ScheduleError};
pub use target::{
    ClazzType, JsonDirTargetStore, SqliteTargetStore, Target, TargetError, TargetStore,
};
