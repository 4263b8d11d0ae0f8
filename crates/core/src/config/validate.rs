use super::{types::Config, ConfigError};

/// Longest accepted advance window (one week).
pub const MAX_ADVANCE_WINDOW_SECS: u64 = 7 * 24 * 60 * 60;

/// Validate configuration
/// Currently validates:
/// - service.base_url is an http(s) URL
/// - timeouts, intervals and pool size are non-zero
/// - schedule.advance_window_secs is at most one week
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let url = url::Url::parse(&config.service.base_url).map_err(|e| {
        ConfigError::ValidationError(format!("service.base_url is not a valid URL: {}", e))
    })?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::ValidationError(format!(
            "service.base_url must be http or https, got {}",
            url.scheme()
        )));
    }

    if config.service.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "service.timeout_secs cannot be 0".to_string(),
        ));
    }

    let schedule = &config.schedule;
    if schedule.max_workers == 0 {
        return Err(ConfigError::ValidationError(
            "schedule.max_workers cannot be 0".to_string(),
        ));
    }
    if schedule.interval_ms == 0 {
        return Err(ConfigError::ValidationError(
            "schedule.interval_ms cannot be 0".to_string(),
        ));
    }
    if schedule.pre_open_interval_ms == 0 {
        return Err(ConfigError::ValidationError(
            "schedule.pre_open_interval_ms cannot be 0".to_string(),
        ));
    }

    if schedule.advance_window_secs > MAX_ADVANCE_WINDOW_SECS {
        return Err(ConfigError::ValidationError(format!(
            "schedule.advance_window_secs cannot exceed {}",
            MAX_ADVANCE_WINDOW_SECS
        )));
    }

    if config.monitor.enabled && config.monitor.period_secs == 0 {
        return Err(ConfigError::ValidationError(
            "monitor.period_secs cannot be 0".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_default_config() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_zero_workers_fails() {
        let mut config = Config::default();
        config.schedule.max_workers = 0;
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
        assert!(err.to_string().contains("max_workers"));
    }

    #[test]
    fn test_validate_zero_interval_fails() {
        let mut config = Config::default();
        config.schedule.interval_ms = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_advance_window_bound() {
        let mut config = Config::default();
        config.schedule.advance_window_secs = MAX_ADVANCE_WINDOW_SECS;
        assert!(validate_config(&config).is_ok());

        config.schedule.advance_window_secs = u64::MAX / 2;
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("advance_window_secs"));
    }

    #[test]
    fn test_validate_bad_base_url_fails() {
        let mut config = Config::default();
        config.service.base_url = "not a url".to_string();
        assert!(validate_config(&config).is_err());

        config.service.base_url = "ftp://jwxk.example.edu".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_disabled_monitor_ignores_period() {
        let mut config = Config::default();
        config.monitor.enabled = false;
        config.monitor.period_secs = 0;
        assert!(validate_config(&config).is_ok());
    }
}
