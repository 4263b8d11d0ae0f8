//! `seatgrab targets`

use anyhow::Result;
use tracing::{info, warn};

use seatgrab_core::{Config, TargetError};

use super::open_store;
use crate::cli::TargetsArgs;

pub fn run(config: &Config, args: TargetsArgs) -> Result<i32> {
    let store = open_store(config)?;

    let ids: Vec<String> = if args.clear {
        store.list()?.into_iter().map(|t| t.id).collect()
    } else {
        args.remove
    };
    for id in &ids {
        match store.remove(id) {
            Ok(()) => info!(id = %id, "Removed target"),
            Err(TargetError::NotFound(_)) => warn!(id = %id, "No such target"),
            Err(e) => return Err(e.into()),
        }
    }

    let targets = store.list()?;
    if targets.is_empty() {
        println!("No saved targets");
    }
    for target in targets {
        println!(
            "{:<20} {:<24} {:<10} {}",
            target.id,
            target.display_name(),
            target.teacher,
            target.category.label(),
        );
    }
    Ok(0)
}
