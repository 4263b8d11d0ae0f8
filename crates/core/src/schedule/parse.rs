//! Release-time input parsing.
//!
//! Accepts a unix timestamp (seconds), a full date-time, or a time of day
//! meaning "today". Results not strictly in the future are rejected.

use chrono::{DateTime, Local, NaiveDateTime, NaiveTime, TimeZone};

use super::ScheduleError;

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y/%m/%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M",
];

const TIME_FORMATS: &[&str] = &["%H:%M:%S", "%H:%M"];

/// Parse a user-supplied release time relative to `now`.
pub fn parse_release_time(
    input: &str,
    now: DateTime<Local>,
) -> Result<DateTime<Local>, ScheduleError> {
    let input = input.trim();
    let parsed = parse_absolute(input, now)
        .ok_or_else(|| ScheduleError::InvalidFormat(input.to_string()))?;

    if parsed <= now {
        return Err(ScheduleError::InPast(
            parsed.format("%Y-%m-%d %H:%M:%S").to_string(),
        ));
    }
    Ok(parsed)
}

fn parse_absolute(input: &str, now: DateTime<Local>) -> Option<DateTime<Local>> {
    if !input.is_empty() && input.chars().all(|c| c.is_ascii_digit()) {
        let secs: i64 = input.parse().ok()?;
        return Local.timestamp_opt(secs, 0).earliest();
    }

    for format in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, format) {
            return Local.from_local_datetime(&naive).earliest();
        }
    }

    for format in TIME_FORMATS {
        if let Ok(time) = NaiveTime::parse_from_str(input, format) {
            let naive = now.date_naive().and_time(time);
            return Local.from_local_datetime(&naive).earliest();
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    fn now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 6, 1, 10, 0, 0).earliest().unwrap()
    }

    #[test]
    fn test_full_datetime_formats() {
        let expected = Local.with_ymd_and_hms(2025, 6, 1, 12, 30, 15).earliest().unwrap();
        assert_eq!(parse_release_time("2025-06-01 12:30:15", now()), Ok(expected));
        assert_eq!(parse_release_time("2025/06/01 12:30:15", now()), Ok(expected));

        let minutes = Local.with_ymd_and_hms(2025, 6, 2, 8, 0, 0).earliest().unwrap();
        assert_eq!(parse_release_time("2025-06-02 08:00", now()), Ok(minutes));
        assert_eq!(parse_release_time("2025/06/02 08:00", now()), Ok(minutes));
    }

    #[test]
    fn test_time_of_day_means_today() {
        let parsed = parse_release_time("13:05", now()).unwrap();
        assert_eq!(parsed.date_naive(), now().date_naive());
        assert_eq!((parsed.hour(), parsed.minute(), parsed.second()), (13, 5, 0));

        let parsed = parse_release_time("10:00:01", now()).unwrap();
        assert_eq!(parsed.second(), 1);
    }

    #[test]
    fn test_unix_timestamp() {
        let target = now().timestamp() + 3600;
        let parsed = parse_release_time(&target.to_string(), now()).unwrap();
        assert_eq!(parsed.timestamp(), target);
    }

    #[test]
    fn test_surrounding_whitespace_is_ignored() {
        assert!(parse_release_time("  11:00 ", now()).is_ok());
    }

    #[test]
    fn test_past_times_are_rejected() {
        assert!(matches!(
            parse_release_time("09:59", now()),
            Err(ScheduleError::InPast(_))
        ));
        assert!(matches!(
            parse_release_time("10:00:00", now()),
            Err(ScheduleError::InPast(_))
        ));
        assert!(matches!(
            parse_release_time("2024-01-01 00:00", now()),
            Err(ScheduleError::InPast(_))
        ));
    }

    #[test]
    fn test_invalid_formats() {
        for input in ["", "tomorrow", "25:00", "2025-13-01 00:00", "12.30"] {
            assert!(
                matches!(
                    parse_release_time(input, now()),
                    Err(ScheduleError::InvalidFormat(_))
                ),
                "expected InvalidFormat for {:?}",
                input
            );
        }
    }
}
