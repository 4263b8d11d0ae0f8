//! `seatgrab run`

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Local;
use tracing::info;

use seatgrab_core::{
    metrics, parse_release_time, AcquisitionCoordinator, CancelReason, Config, HeartbeatProbe,
    HttpResourceClient, ListingProbe, MonitorPlan, ResourceClient, RunReport, ScheduleConfig,
    SessionMonitor, SessionProbe,
};

use super::{load_session, open_store};
use crate::cli::RunArgs;

/// Exit code when some targets were not acquired.
const EXIT_REMAINING: i32 = 2;
/// Exit code when the session expired during the run.
const EXIT_AUTH_EXPIRED: i32 = 3;

pub async fn run(config: &Config, args: RunArgs) -> Result<i32> {
    let release_at = match &args.at {
        Some(input) => Some(parse_release_time(input, Local::now()).context("Invalid release time")?),
        None => None,
    };
    let schedule = ScheduleConfig::from_settings(&config.schedule, release_at)
        .context("Invalid release time")?;

    let store = open_store(config)?;
    let targets = store.list()?;
    let auth = load_session(config)?;

    for target in &targets {
        info!(
            course = %target.display_name(),
            category = %target.category,
            id = %target.id,
            "Target loaded"
        );
    }
    match release_at {
        Some(at) => info!(release = %at.format("%Y-%m-%d %H:%M:%S"), "Release scheduled"),
        None => info!("No release time, attempting immediately"),
    }

    let client: Arc<dyn ResourceClient> = Arc::new(
        HttpResourceClient::new(&config.service).context("Failed to create HTTP client")?,
    );
    let coordinator = Arc::new(AcquisitionCoordinator::new(
        client,
        Arc::clone(&store),
        schedule,
    ));

    let mut monitors = Vec::new();
    if config.monitor.enabled {
        let listing: Arc<dyn SessionProbe> = Arc::new(
            ListingProbe::new(&config.service, config.account.campus.clone())
                .context("Failed to create HTTP client")?,
        );
        monitors.push(SessionMonitor::spawn(
            listing,
            Arc::clone(&auth),
            MonitorPlan::validity(&config.monitor),
            Some(coordinator.signal()),
        ));

        if let Some(plan) = MonitorPlan::keepalive(&config.monitor) {
            let heartbeat: Arc<dyn SessionProbe> = Arc::new(
                HeartbeatProbe::new(&config.service).context("Failed to create HTTP client")?,
            );
            monitors.push(SessionMonitor::spawn(heartbeat, Arc::clone(&auth), plan, None));
        }
    }

    let interrupt = {
        let coordinator = Arc::clone(&coordinator);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                coordinator.cancel();
            }
        })
    };

    let result = coordinator.run_all(targets, auth).await;
    interrupt.abort();
    for monitor in monitors {
        monitor.shutdown().await;
    }
    let report = result?;

    print_report(&report);
    if args.metrics {
        let registry = metrics::engine_registry()?;
        print!("{}", metrics::gather_text(&registry)?);
    }
    Ok(exit_code(&report))
}

fn print_report(report: &RunReport) {
    for outcome in &report.outcomes {
        println!(
            "{:<10} {:<24} {:<20} {} attempts",
            outcome.state,
            outcome.target.display_name(),
            outcome.target.id,
            outcome.attempts,
        );
    }
    println!("{}", report.summary());
}

fn exit_code(report: &RunReport) -> i32 {
    if report.all_succeeded() {
        return 0;
    }
    match report.cancel_reason {
        Some(CancelReason::AuthExpired { .. }) | Some(CancelReason::SessionInvalid { .. }) => {
            EXIT_AUTH_EXPIRED
        }
        _ => EXIT_REMAINING,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use seatgrab_core::{engine::TargetReport, ClazzType, Target, WorkerState};

    fn report(states: &[WorkerState], cancel_reason: Option<CancelReason>) -> RunReport {
        RunReport {
            outcomes: states
                .iter()
                .enumerate()
                .map(|(i, state)| TargetReport {
                    target: Target::new(format!("T{}", i), "s", "Course", ClazzType::InPlan),
                    state: *state,
                    attempts: 1,
                })
                .collect(),
            cancel_reason,
        }
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(exit_code(&report(&[WorkerState::Succeeded], None)), 0);
        assert_eq!(
            exit_code(&report(&[WorkerState::Succeeded, WorkerState::Exhausted], None)),
            EXIT_REMAINING
        );
        assert_eq!(
            exit_code(&report(
                &[WorkerState::Cancelled],
                Some(CancelReason::Operator)
            )),
            EXIT_REMAINING
        );
        assert_eq!(
            exit_code(&report(
                &[WorkerState::Cancelled],
                Some(CancelReason::AuthExpired {
                    target: "T0".to_string()
                })
            )),
            EXIT_AUTH_EXPIRED
        );
    }
}
