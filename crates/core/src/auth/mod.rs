//! Session credentials and the login flow that produces them.

mod login;
mod session_file;
mod types;

pub use login::{Captcha, LoginClient};
pub use session_file::SessionFile;
pub use types::*;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Captcha request failed: {0}")]
    Captcha(String),

    #[error("Login rejected: {0}")]
    LoginRejected(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Unexpected response: {0}")]
    InvalidResponse(String),

    #[error("Session file {path}: {reason}")]
    SessionFile { path: String, reason: String },

    #[error("Unknown batch: {0}")]
    UnknownBatch(String),
}

impl From<reqwest::Error> for AuthError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            AuthError::Timeout
        } else {
            AuthError::Http(e.to_string())
        }
    }
}
