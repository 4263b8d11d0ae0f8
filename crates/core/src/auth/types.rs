use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::AuthError;

/// Credentials shared read-only by every worker and monitor for one run.
///
/// Replaced wholesale on re-login, never mutated in place.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    /// Bearer token issued at login.
    pub token: String,
    /// Session cookies issued at login.
    #[serde(default)]
    pub cookies: BTreeMap<String, String>,
    /// Selected selection-round (batch) id.
    #[serde(default)]
    pub batch_id: String,
}

impl AuthContext {
    pub fn new(
        token: impl Into<String>,
        cookies: BTreeMap<String, String>,
        batch_id: impl Into<String>,
    ) -> Self {
        Self {
            token: token.into(),
            cookies,
            batch_id: batch_id.into(),
        }
    }

    /// Value of the `Authorization` header.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }

    /// Value of the `Cookie` header, or `None` when no cookies were issued.
    pub fn cookie_header(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }
        Some(
            self.cookies
                .iter()
                .map(|(name, value)| format!("{}={}", name, value))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }
}

impl fmt::Debug for AuthContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthContext")
            .field("token", &"<redacted>")
            .field("cookies", &self.cookies.keys().collect::<Vec<_>>())
            .field("batch_id", &self.batch_id)
            .finish()
    }
}

/// A selection round offered to the student.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Batch {
    pub code: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub begin_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
}

/// Result of a successful login, before a batch is chosen.
#[derive(Debug, Clone)]
pub struct LoginSession {
    pub token: String,
    pub cookies: BTreeMap<String, String>,
    pub batches: Vec<Batch>,
}

impl LoginSession {
    /// Bind the session to one of its batches.
    pub fn into_context(self, batch_code: &str) -> Result<AuthContext, AuthError> {
        if !self.batches.iter().any(|b| b.code == batch_code) {
            return Err(AuthError::UnknownBatch(batch_code.to_string()));
        }
        Ok(AuthContext::new(self.token, self.cookies, batch_code))
    }
}
