//! Subcommand implementations.

pub mod catalog;
pub mod login;
pub mod run;
pub mod targets;

use std::io::{BufRead, Write};
use std::sync::Arc;

use anyhow::{Context, Result};

use seatgrab_core::{
    config::StoreBackend, AuthContext, Config, JsonDirTargetStore, SessionFile, SqliteTargetStore,
    TargetStore,
};

/// Open the configured target store.
pub fn open_store(config: &Config) -> Result<Arc<dyn TargetStore>> {
    let store: Arc<dyn TargetStore> = match config.store.backend {
        StoreBackend::JsonDir => Arc::new(
            JsonDirTargetStore::new(&config.store.path)
                .with_context(|| format!("Failed to open target directory {:?}", config.store.path))?,
        ),
        StoreBackend::Sqlite => Arc::new(
            SqliteTargetStore::new(&config.store.path)
                .with_context(|| format!("Failed to open target database {:?}", config.store.path))?,
        ),
    };
    Ok(store)
}

/// Load the saved session.
pub fn load_session(config: &Config) -> Result<Arc<AuthContext>> {
    let file = SessionFile::new(&config.store.session_file);
    let auth = file
        .load()
        .context("No usable session, run `seatgrab login` first")?;
    Ok(Arc::new(auth))
}

/// Print `message` and read one trimmed line from stdin.
pub async fn prompt(message: &str) -> Result<String> {
    let message = message.to_string();
    tokio::task::spawn_blocking(move || -> Result<String> {
        let mut stdout = std::io::stdout();
        write!(stdout, "{}", message)?;
        stdout.flush()?;
        let mut line = String::new();
        std::io::stdin().lock().read_line(&mut line)?;
        Ok(line.trim().to_string())
    })
    .await
    .context("Prompt task failed")?
}
