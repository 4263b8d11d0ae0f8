//! Mapping of raw service responses to outcomes.
//!
//! The response schema belongs to the remote service, so classification sits
//! behind [`ResponseClassifier`] and can be swapped for other endpoints.

use serde::Deserialize;

use super::wire::{snippet, ApiEnvelope};
use super::{AttemptOutcome, Heartbeat, ProbeStatus};

/// Message the listing endpoint returns before a selection round opens.
/// The session is still valid in that case.
const ROUND_NOT_STARTED: &str = "本轮次选课暂未开始";

/// Turns an HTTP status and response body into an [`AttemptOutcome`].
pub trait ResponseClassifier: Send + Sync {
    fn classify(&self, http_status: u16, body: &str) -> AttemptOutcome;
}

/// Classifier for the `{code, msg}` envelope used by the selection service.
#[derive(Debug, Clone, Copy, Default)]
pub struct XkClassifier;

impl ResponseClassifier for XkClassifier {
    fn classify(&self, http_status: u16, body: &str) -> AttemptOutcome {
        if http_status == 401 {
            return AttemptOutcome::AuthExpired;
        }

        let envelope: ApiEnvelope<serde_json::Value> = match serde_json::from_str(body) {
            Ok(envelope) => envelope,
            Err(e) => {
                return AttemptOutcome::TransientError(format!(
                    "HTTP {}: unparseable body ({}): {}",
                    http_status,
                    e,
                    snippet(body, 120)
                ))
            }
        };

        match envelope.code {
            200 => AttemptOutcome::Success,
            401 => AttemptOutcome::AuthExpired,
            500 => AttemptOutcome::Rejected(if envelope.message().is_empty() {
                "rejected".to_string()
            } else {
                envelope.message().to_string()
            }),
            other => AttemptOutcome::Rejected(format!(
                "unexpected response code {}: {}",
                other,
                envelope.message()
            )),
        }
    }
}

/// Classify a response from the read-only listing endpoint used as a probe.
pub fn classify_listing_probe(http_status: u16, body: &str) -> ProbeStatus {
    if http_status == 401 {
        return ProbeStatus::Invalid("HTTP 401".to_string());
    }

    let envelope: ApiEnvelope<serde_json::Value> = match serde_json::from_str(body) {
        Ok(envelope) => envelope,
        Err(_) => {
            return ProbeStatus::Invalid(format!(
                "HTTP {}: non-JSON response: {}",
                http_status,
                snippet(body, 120)
            ))
        }
    };

    match envelope.code {
        200 => ProbeStatus::Valid(None),
        500 if envelope.message().contains(ROUND_NOT_STARTED) => ProbeStatus::Valid(None),
        code => ProbeStatus::Invalid(format!("code {}: {}", code, envelope.message())),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HeartbeatData {
    #[serde(default)]
    current_time: Option<serde_json::Value>,
    #[serde(default)]
    online_count: Option<serde_json::Value>,
}

/// Classify a response from the keep-alive endpoint.
pub fn classify_heartbeat(http_status: u16, body: &str) -> ProbeStatus {
    if http_status == 401 {
        return ProbeStatus::Invalid("HTTP 401".to_string());
    }

    let envelope: ApiEnvelope<HeartbeatData> = match serde_json::from_str(body) {
        Ok(envelope) => envelope,
        Err(_) => {
            return ProbeStatus::Invalid(format!(
                "HTTP {}: non-JSON response: {}",
                http_status,
                snippet(body, 120)
            ))
        }
    };

    if envelope.code != 200 {
        return ProbeStatus::Invalid(format!(
            "code {}: {}",
            envelope.code,
            envelope.message()
        ));
    }

    let heartbeat = envelope.data.map(|data| Heartbeat {
        server_time: data.current_time.map(|v| match v {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        }),
        online_count: data.online_count.and_then(|v| match v {
            serde_json::Value::Number(n) => n.as_u64(),
            serde_json::Value::String(s) => s.parse().ok(),
            _ => None,
        }),
    });
    ProbeStatus::Valid(Some(heartbeat.unwrap_or_default()))
}
