//! `seatgrab login`

use anyhow::{bail, Context, Result};
use tracing::info;

use seatgrab_core::{Config, LoginClient, SessionFile};

use super::prompt;
use crate::cli::LoginArgs;

pub async fn run(config: &Config, args: LoginArgs) -> Result<i32> {
    let username = match config.account.username.as_str() {
        "" => prompt("Student number: ").await?,
        name => name.to_string(),
    };
    let password = match config.account.password.as_str() {
        "" => prompt("Password: ").await?,
        password => password.to_string(),
    };

    let client = LoginClient::new(&config.service).context("Failed to create HTTP client")?;

    let captcha = client.fetch_captcha().await.context("Failed to fetch captcha")?;
    captcha
        .save(&args.captcha_out)
        .with_context(|| format!("Failed to write {:?}", args.captcha_out))?;
    println!("Captcha saved to {}", args.captcha_out.display());
    let answer = prompt("Captcha: ").await?;

    let session = client
        .login(&username, &password, &answer, &captcha.uuid)
        .await
        .context("Login failed")?;

    if session.batches.is_empty() {
        bail!("The account has no elective batches");
    }

    let batch = match args.batch {
        Some(batch) => batch,
        None => {
            for (i, batch) in session.batches.iter().enumerate() {
                println!(
                    "{:>2}. {} [{}] {} - {}",
                    i + 1,
                    batch.name,
                    batch.code,
                    batch.begin_time.as_deref().unwrap_or("?"),
                    batch.end_time.as_deref().unwrap_or("?"),
                );
            }
            let choice = prompt("Batch number: ").await?;
            let index: usize = choice.parse().context("Not a number")?;
            match index.checked_sub(1).and_then(|i| session.batches.get(i)) {
                Some(batch) => batch.code.clone(),
                None => bail!("No batch numbered {}", index),
            }
        }
    };

    let auth = session.into_context(&batch)?;
    let file = SessionFile::new(&config.store.session_file);
    file.store(&auth)?;
    info!(batch = %auth.batch_id, path = %file.path().display(), "Session saved");
    Ok(0)
}
