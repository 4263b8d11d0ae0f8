//! `seatgrab catalog`

use anyhow::{anyhow, Context, Result};
use tracing::{info, warn};

use seatgrab_core::{CatalogClient, ClazzType, Config};

use super::{load_session, open_store};
use crate::cli::CatalogArgs;

pub async fn run(config: &Config, args: CatalogArgs) -> Result<i32> {
    let category = parse_category(&args.category)?;
    let auth = load_session(config)?;
    let store = open_store(config)?;

    let client = CatalogClient::new(&config.service).context("Failed to create HTTP client")?;
    let offerings = client
        .list_classes(&auth, &config.account.campus, &category)
        .await
        .context("Failed to list catalog")?;

    for offering in offerings
        .iter()
        .filter(|o| !args.available || !o.is_full())
    {
        let seats = match (offering.enrolled, offering.capacity) {
            (Some(n), Some(cap)) => format!("{}/{}", n, cap),
            _ => "?".to_string(),
        };
        println!(
            "{:<20} {:<24} {:<10} {:<4} {:>9}  {}",
            offering.clazz_id,
            offering.course_name,
            offering.teacher,
            offering.class_no,
            seats,
            offering.place,
        );
    }

    for id in &args.add {
        match offerings.iter().find(|o| &o.clazz_id == id) {
            Some(offering) => {
                let target = offering.clone().into_target(category.clone());
                store.save(&target)?;
                info!(course = %target.display_name(), id = %target.id, "Saved target");
            }
            None => warn!(id = %id, "Class not in this catalog, skipped"),
        }
    }

    Ok(0)
}

fn parse_category(input: &str) -> Result<ClazzType> {
    if let Some(kind) = ClazzType::from_menu_index(input) {
        return Ok(kind);
    }
    let upper = input.to_ascii_uppercase();
    ClazzType::KNOWN
        .iter()
        .find(|k| k.code() == upper)
        .cloned()
        .ok_or_else(|| anyhow!("Unknown course category: {}", input))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_category() {
        assert_eq!(parse_category("1").unwrap(), ClazzType::InPlan);
        assert_eq!(parse_category("4").unwrap(), ClazzType::QualityElective);
        assert_eq!(parse_category("cxkc").unwrap(), ClazzType::Retake);
        assert!(parse_category("9").is_err());
        assert!(parse_category("XYZ").is_err());
    }
}
