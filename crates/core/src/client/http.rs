//! reqwest-backed implementations of [`ResourceClient`] and [`SessionProbe`].

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use crate::auth::AuthContext;
use crate::config::ServiceConfig;
use crate::target::{ClazzType, Target};

use super::classifier::{classify_heartbeat, classify_listing_probe, ResponseClassifier, XkClassifier};
use super::wire::{describe_transport_error, XkHttp, ADD_PATH, HEARTBEAT_PATH, LIST_PATH};
use super::{AttemptOutcome, ProbeStatus, ResourceClient, SessionProbe};

/// Acquisition client for the `clazz/add` endpoint.
pub struct HttpResourceClient {
    http: XkHttp,
    classifier: Arc<dyn ResponseClassifier>,
}

impl HttpResourceClient {
    /// Create a client using the default response classifier.
    pub fn new(service: &ServiceConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            http: XkHttp::new(service)?,
            classifier: Arc::new(XkClassifier),
        })
    }

    /// Replace the response classifier.
    pub fn with_classifier(mut self, classifier: Arc<dyn ResponseClassifier>) -> Self {
        self.classifier = classifier;
        self
    }
}

#[async_trait]
impl ResourceClient for HttpResourceClient {
    fn name(&self) -> &str {
        "xk-http"
    }

    async fn attempt(&self, target: &Target, auth: &AuthContext) -> AttemptOutcome {
        let form = [
            ("clazzType", target.category.code()),
            ("clazzId", target.id.as_str()),
            ("secretVal", target.secret.as_str()),
        ];

        let response = match self.http.authed_post(ADD_PATH, auth).form(&form).send().await {
            Ok(response) => response,
            Err(e) => return AttemptOutcome::TransientError(describe_transport_error(&e)),
        };

        let status = response.status().as_u16();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => return AttemptOutcome::TransientError(describe_transport_error(&e)),
        };

        debug!(course = %target.display_name(), status, body = %body, "Acquisition response");
        self.classifier.classify(status, &body)
    }
}

/// Session probe using a one-row catalog query. Read-only.
pub struct ListingProbe {
    http: XkHttp,
    campus: String,
}

impl ListingProbe {
    pub fn new(service: &ServiceConfig, campus: impl Into<String>) -> Result<Self, reqwest::Error> {
        Ok(Self {
            http: XkHttp::new(service)?,
            campus: campus.into(),
        })
    }
}

#[async_trait]
impl SessionProbe for ListingProbe {
    fn name(&self) -> &str {
        "listing"
    }

    async fn probe(&self, auth: &AuthContext) -> ProbeStatus {
        let body = json!({
            "teachingClassType": ClazzType::InPlan.code(),
            "pageNumber": 1,
            "pageSize": 1,
            "orderBy": "",
            "campus": self.campus,
        });

        let response = match self.http.authed_post(LIST_PATH, auth).json(&body).send().await {
            Ok(response) => response,
            Err(e) => return ProbeStatus::Unreachable(describe_transport_error(&e)),
        };
        let status = response.status().as_u16();
        match response.text().await {
            Ok(text) => classify_listing_probe(status, &text),
            Err(e) => ProbeStatus::Unreachable(describe_transport_error(&e)),
        }
    }
}

/// Keep-alive probe against the server clock endpoint.
pub struct HeartbeatProbe {
    http: XkHttp,
}

impl HeartbeatProbe {
    pub fn new(service: &ServiceConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            http: XkHttp::new(service)?,
        })
    }
}

#[async_trait]
impl SessionProbe for HeartbeatProbe {
    fn name(&self) -> &str {
        "heartbeat"
    }

    async fn probe(&self, auth: &AuthContext) -> ProbeStatus {
        let response = match self
            .http
            .authed_post(HEARTBEAT_PATH, auth)
            .header("Content-Type", "application/x-www-form-urlencoded")
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return ProbeStatus::Unreachable(describe_transport_error(&e)),
        };
        let status = response.status().as_u16();
        match response.text().await {
            Ok(text) => classify_heartbeat(status, &text),
            Err(e) => ProbeStatus::Unreachable(describe_transport_error(&e)),
        }
    }
}
