//! Captcha + password login against the selection service.

use std::collections::BTreeMap;
use std::path::Path;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Deserialize;
use tracing::{debug, info};

use crate::client::wire::{snippet, ApiEnvelope, XkHttp, CAPTCHA_PATH, LOGIN_PATH};
use crate::config::ServiceConfig;

use super::{AuthError, Batch, LoginSession};

/// Captcha image plus the uuid that must accompany the answer.
#[derive(Debug, Clone)]
pub struct Captcha {
    pub image: Vec<u8>,
    pub uuid: String,
}

impl Captcha {
    /// Write the image so the operator can read it.
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        std::fs::write(path, &self.image)
    }
}

#[derive(Debug, Deserialize)]
struct CaptchaData {
    captcha: String,
    uuid: String,
}

#[derive(Debug, Deserialize)]
struct LoginData {
    #[serde(default)]
    token: String,
    #[serde(default)]
    student: Option<StudentData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StudentData {
    #[serde(default)]
    elective_batch_list: Vec<Batch>,
}

/// Client for the captcha and login endpoints.
pub struct LoginClient {
    http: XkHttp,
}

impl LoginClient {
    pub fn new(service: &ServiceConfig) -> Result<Self, AuthError> {
        Ok(Self {
            http: XkHttp::new(service)?,
        })
    }

    /// Request a fresh captcha.
    pub async fn fetch_captcha(&self) -> Result<Captcha, AuthError> {
        let response = self.http.client().post(self.http.url(CAPTCHA_PATH)).send().await?;
        if !response.status().is_success() {
            return Err(AuthError::Captcha(format!("HTTP {}", response.status())));
        }

        let envelope: ApiEnvelope<CaptchaData> = response
            .json()
            .await
            .map_err(|e| AuthError::InvalidResponse(e.to_string()))?;
        if envelope.code != 200 {
            return Err(AuthError::Captcha(envelope.message().to_string()));
        }
        let data = envelope
            .data
            .ok_or_else(|| AuthError::InvalidResponse("captcha response without data".into()))?;

        Ok(Captcha {
            image: decode_data_url(&data.captcha)?,
            uuid: data.uuid,
        })
    }

    /// Log in with the answer to a captcha obtained from [`fetch_captcha`](Self::fetch_captcha).
    pub async fn login(
        &self,
        username: &str,
        password: &str,
        captcha_answer: &str,
        captcha_uuid: &str,
    ) -> Result<LoginSession, AuthError> {
        let form = [
            ("loginname", username),
            ("password", password),
            ("captcha", captcha_answer),
            ("uuid", captcha_uuid),
        ];

        debug!(username, "Submitting login");
        let response = self
            .http
            .client()
            .post(self.http.url(LOGIN_PATH))
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        let cookies: BTreeMap<String, String> = response
            .cookies()
            .map(|c| (c.name().to_string(), c.value().to_string()))
            .collect();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(AuthError::Http(format!("HTTP {}: {}", status, snippet(&body, 200))));
        }

        let envelope: ApiEnvelope<LoginData> = serde_json::from_str(&body)
            .map_err(|e| AuthError::InvalidResponse(format!("{}: {}", e, snippet(&body, 200))))?;
        if envelope.code != 200 {
            return Err(AuthError::LoginRejected(envelope.message().to_string()));
        }

        let data = envelope
            .data
            .ok_or_else(|| AuthError::InvalidResponse("login response without data".into()))?;
        if data.token.is_empty() {
            return Err(AuthError::InvalidResponse("login response without token".into()));
        }

        let batches = data
            .student
            .map(|s| s.elective_batch_list)
            .unwrap_or_default();
        info!(batches = batches.len(), "Login successful");

        Ok(LoginSession {
            token: data.token,
            cookies,
            batches,
        })
    }
}

/// Decode `data:image/png;base64,....`; a bare base64 payload is accepted too.
fn decode_data_url(data_url: &str) -> Result<Vec<u8>, AuthError> {
    let payload = match data_url.split_once(',') {
        Some((_, payload)) => payload,
        None => data_url,
    };
    STANDARD
        .decode(payload.trim())
        .map_err(|e| AuthError::Captcha(format!("invalid captcha image: {}", e)))
}
