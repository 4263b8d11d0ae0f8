//! Explicit load/store boundary for a captured session.

use std::fs;
use std::path::{Path, PathBuf};

use super::{AuthContext, AuthError};

/// JSON file holding the [`AuthContext`] between invocations.
#[derive(Debug, Clone)]
pub struct SessionFile {
    path: PathBuf,
}

impl SessionFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    pub fn load(&self) -> Result<AuthContext, AuthError> {
        let raw = fs::read_to_string(&self.path).map_err(|e| self.error(e))?;
        serde_json::from_str(&raw).map_err(|e| self.error(e))
    }

    pub fn store(&self, auth: &AuthContext) -> Result<(), AuthError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.error(e))?;
        }
        let json = serde_json::to_string_pretty(auth).map_err(|e| self.error(e))?;
        fs::write(&self.path, json).map_err(|e| self.error(e))
    }

    fn error(&self, reason: impl std::fmt::Display) -> AuthError {
        AuthError::SessionFile {
            path: self.path.display().to_string(),
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    #[test]
    fn test_store_then_load() {
        let temp_dir = TempDir::new().unwrap();
        let file = SessionFile::new(temp_dir.path().join("nested/session_info.json"));
        assert!(!file.exists());

        let mut cookies = BTreeMap::new();
        cookies.insert("JSESSIONID".to_string(), "abc".to_string());
        let auth = AuthContext::new("tok", cookies, "B1");

        file.store(&auth).unwrap();
        assert!(file.exists());
        assert_eq!(file.load().unwrap(), auth);
    }

    #[test]
    fn test_load_missing_file() {
        let file = SessionFile::new("/nonexistent/session_info.json");
        assert!(matches!(file.load(), Err(AuthError::SessionFile { .. })));
    }

    #[test]
    fn test_load_corrupt_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("session_info.json");
        fs::write(&path, "{oops").unwrap();
        let err = SessionFile::new(&path).load().unwrap_err();
        assert!(err.to_string().contains("session_info.json"));
    }
}
