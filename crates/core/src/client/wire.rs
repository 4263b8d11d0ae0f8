//! Shared HTTP plumbing for the remote course-selection service.

use std::time::Duration;

use reqwest::{Client, RequestBuilder};
use serde::Deserialize;

use crate::auth::AuthContext;
use crate::config::ServiceConfig;

/// Endpoint paths relative to the service root.
pub(crate) const ADD_PATH: &str = "/xsxk/elective/clazz/add";
pub(crate) const LIST_PATH: &str = "/xsxk/elective/clazz/list";
pub(crate) const HEARTBEAT_PATH: &str = "/xsxk/web/now";
pub(crate) const CAPTCHA_PATH: &str = "/xsxk/auth/captcha";
pub(crate) const LOGIN_PATH: &str = "/xsxk/auth/login";
const GRAB_PAGE_PATH: &str = "/xsxk/elective/grablessons";

/// Every response body from the service is wrapped in `{code, msg, data}`.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiEnvelope<T> {
    pub code: i64,
    #[serde(default)]
    pub msg: Option<String>,
    pub data: Option<T>,
}

impl<T> ApiEnvelope<T> {
    pub fn message(&self) -> &str {
        self.msg.as_deref().unwrap_or("")
    }
}

/// reqwest client bound to one service root.
#[derive(Debug, Clone)]
pub(crate) struct XkHttp {
    client: Client,
    base_url: String,
}

impl XkHttp {
    pub fn new(service: &ServiceConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(service.timeout_secs as u64))
            .user_agent(service.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            base_url: service.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// POST to `path` carrying the session's credentials.
    pub fn authed_post(&self, path: &str, auth: &AuthContext) -> RequestBuilder {
        let referer = format!(
            "{}?batchId={}",
            self.url(GRAB_PAGE_PATH),
            urlencoding::encode(&auth.batch_id)
        );

        let mut builder = self
            .client
            .post(self.url(path))
            .header("Accept", "application/json, text/plain, */*")
            .header("Authorization", auth.bearer())
            .header("batchId", auth.batch_id.as_str())
            .header("Origin", self.base_url.as_str())
            .header("Referer", referer);

        if let Some(cookie) = auth.cookie_header() {
            builder = builder.header("Cookie", cookie);
        }
        builder
    }
}

/// Short human-readable description of a transport failure.
pub(crate) fn describe_transport_error(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        "request timed out".to_string()
    } else if e.is_connect() {
        format!("connection failed: {}", e)
    } else {
        e.to_string()
    }
}

/// First `max` characters of a body, for log lines.
pub(crate) fn snippet(body: &str, max: usize) -> String {
    body.chars().take(max).collect()
}
