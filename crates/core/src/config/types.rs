use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub account: AccountConfig,
    #[serde(default)]
    pub schedule: ScheduleSettings,
    #[serde(default)]
    pub monitor: MonitorSettings,
    #[serde(default)]
    pub store: StoreConfig,
}

/// Remote course-selection service configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceConfig {
    /// Service root (e.g., "http://jwxk.ctgu.edu.cn")
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request timeout in seconds (default: 10)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_base_url() -> String {
    "http://jwxk.ctgu.edu.cn".to_string()
}

fn default_timeout() -> u32 {
    10
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/137.0.0.0 Safari/537.36"
        .to_string()
}

/// Student account used by the login flow
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AccountConfig {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    /// Campus code sent with catalog queries
    #[serde(default = "default_campus")]
    pub campus: String,
}

impl Default for AccountConfig {
    fn default() -> Self {
        Self {
            username: String::new(),
            password: String::new(),
            campus: default_campus(),
        }
    }
}

fn default_campus() -> String {
    "01".to_string()
}

/// Acquisition cadence and pool sizing.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScheduleSettings {
    /// Steady-state interval between attempts once the release instant has passed.
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    /// How long before the release instant polling tightens.
    #[serde(default = "default_advance_window")]
    pub advance_window_secs: u64,
    /// Interval used inside the advance window.
    #[serde(default = "default_pre_open_interval_ms")]
    pub pre_open_interval_ms: u64,
    /// Maximum number of attempts in flight at once.
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,
    #[serde(default)]
    pub retry: RetrySettings,
}

impl Default for ScheduleSettings {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            advance_window_secs: default_advance_window(),
            pre_open_interval_ms: default_pre_open_interval_ms(),
            max_workers: default_max_workers(),
            retry: RetrySettings::default(),
        }
    }
}

fn default_interval_ms() -> u64 {
    1000
}

fn default_advance_window() -> u64 {
    30
}

fn default_pre_open_interval_ms() -> u64 {
    1000
}

fn default_max_workers() -> usize {
    5
}

/// Optional bounds on the retry-forever policy. Both unset by default.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RetrySettings {
    /// Give up on a target after this long in the active phases.
    #[serde(default)]
    pub max_duration_secs: Option<u64>,
    /// Cap for exponential backoff on consecutive transient errors.
    #[serde(default)]
    pub transient_backoff_max_ms: Option<u64>,
}

/// Session monitor configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MonitorSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Delay before the first validity probe.
    #[serde(default = "default_warmup")]
    pub warmup_secs: u64,
    /// Period between validity probes.
    #[serde(default = "default_period")]
    pub period_secs: u64,
    /// Period between keep-alive heartbeats (0 = disabled).
    #[serde(default = "default_keepalive")]
    pub keepalive_secs: u64,
    /// Raise the run-wide cancellation when a probe reports the session invalid.
    #[serde(default)]
    pub cancel_on_invalid: bool,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            warmup_secs: default_warmup(),
            period_secs: default_period(),
            keepalive_secs: default_keepalive(),
            cancel_on_invalid: false,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_warmup() -> u64 {
    30
}

fn default_period() -> u64 {
    180
}

fn default_keepalive() -> u64 {
    300
}

/// Target descriptor persistence.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,
    /// Directory (json_dir) or database file (sqlite).
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
    #[serde(default = "default_session_file")]
    pub session_file: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            path: default_store_path(),
            session_file: default_session_file(),
        }
    }
}

fn default_store_path() -> PathBuf {
    PathBuf::from("selected_courses")
}

fn default_session_file() -> PathBuf {
    PathBuf::from("session_info.json")
}

/// Available target store backends
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    #[default]
    JsonDir,
    Sqlite,
}

/// Sanitized config for display (password redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub service: ServiceConfig,
    pub account: SanitizedAccountConfig,
    pub schedule: ScheduleSettings,
    pub monitor: MonitorSettings,
    pub store: StoreConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedAccountConfig {
    pub username: String,
    pub password_configured: bool,
    pub campus: String,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            service: config.service.clone(),
            account: SanitizedAccountConfig {
                username: config.account.username.clone(),
                password_configured: !config.account.password.is_empty(),
                campus: config.account.campus.clone(),
            },
            schedule: config.schedule.clone(),
            monitor: config.monitor.clone(),
            store: config.store.clone(),
        }
    }
}
