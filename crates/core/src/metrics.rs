//! Prometheus metrics for the acquisition engine.
//!
//! This module provides metrics for:
//! - Acquisition attempts (outcomes, latency, in-flight calls)
//! - Run-wide cancellation
//! - Session probes

use once_cell::sync::Lazy;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};

// =============================================================================
// Acquisition Metrics
// =============================================================================

/// Acquisition attempts total by outcome and phase.
pub static ATTEMPTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("seatgrab_attempts_total", "Total acquisition attempts"),
        &["outcome", "phase"], // "success", "rejected", "transient_error", "auth_expired"
    )
    .unwrap()
});

/// Attempt round-trip latency in seconds.
pub static ATTEMPT_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "seatgrab_attempt_duration_seconds",
            "Duration of a single acquisition call",
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
        &["outcome"],
    )
    .unwrap()
});

/// Targets acquired.
pub static TARGETS_ACQUIRED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("seatgrab_targets_acquired_total", "Targets successfully acquired").unwrap()
});

/// Targets given up after the retry budget ran out.
pub static TARGETS_EXHAUSTED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "seatgrab_targets_exhausted_total",
        "Targets abandoned after the retry budget ran out",
    )
    .unwrap()
});

/// Acquisition calls currently in flight.
pub static ATTEMPTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "seatgrab_attempts_in_flight",
        "Acquisition calls currently awaiting a response",
    )
    .unwrap()
});

/// Run-wide cancellations by reason.
pub static CANCELLATIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("seatgrab_cancellations_total", "Run-wide cancellations raised"),
        &["reason"], // "auth_expired", "session_invalid", "operator"
    )
    .unwrap()
});

// =============================================================================
// Session Monitor Metrics
// =============================================================================

/// Session probe results by probe and status.
pub static SESSION_PROBES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("seatgrab_session_probes_total", "Session probe results"),
        &["probe", "status"], // "valid", "invalid", "unreachable"
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all engine metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(ATTEMPTS_TOTAL.clone()),
        Box::new(ATTEMPT_DURATION.clone()),
        Box::new(TARGETS_ACQUIRED.clone()),
        Box::new(TARGETS_EXHAUSTED.clone()),
        Box::new(ATTEMPTS_IN_FLIGHT.clone()),
        Box::new(CANCELLATIONS_TOTAL.clone()),
        Box::new(SESSION_PROBES_TOTAL.clone()),
    ]
}

/// Register every engine metric in `registry`.
pub fn register_metrics(registry: &Registry) -> Result<(), prometheus::Error> {
    for metric in all_metrics() {
        registry.register(metric)?;
    }
    Ok(())
}

/// A fresh registry holding every engine metric.
pub fn engine_registry() -> Result<Registry, prometheus::Error> {
    let registry = Registry::new();
    register_metrics(&registry)?;
    Ok(registry)
}

/// Encode the registry's metrics in Prometheus text format.
pub fn gather_text(registry: &Registry) -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder.encode(&registry.gather(), &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}
