use super::{types::Config, ConfigError};

/// Slack added on top of the job timeout when checking the TTL.
pub const TTL_SAFETY_MARGIN_SECS: u64 = 60;

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Timeouts, concurrency and sweep interval are non-zero
/// - TTL exceeds the job timeout plus `TTL_SAFETY_MARGIN_SECS`, so the
///   sweeper can never see a file that a running job is still writing
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    let fetcher = &config.fetcher;
    if fetcher.timeout_secs == 0
        || fetcher.search_timeout_secs == 0
        || fetcher.info_timeout_secs == 0
    {
        return Err(ConfigError::ValidationError(
            "fetcher timeouts must be greater than 0".to_string(),
        ));
    }
    if fetcher.max_concurrent_jobs == 0 {
        return Err(ConfigError::ValidationError(
            "fetcher.max_concurrent_jobs must be at least 1".to_string(),
        ));
    }
    if fetcher.max_search_results == 0 {
        return Err(ConfigError::ValidationError(
            "fetcher.max_search_results must be at least 1".to_string(),
        ));
    }

    let storage = &config.storage;
    if storage.sweep_interval_secs == 0 {
        return Err(ConfigError::ValidationError(
            "storage.sweep_interval_secs cannot be 0".to_string(),
        ));
    }
    let floor = fetcher
        .timeout_secs
        .checked_add(TTL_SAFETY_MARGIN_SECS)
        .ok_or_else(|| {
            ConfigError::ValidationError(format!(
                "fetcher.timeout_secs ({}) is too large",
                fetcher.timeout_secs
            ))
        })?;
    if storage.ttl_secs <= floor {
        return Err(ConfigError::ValidationError(format!(
            "storage.ttl_secs ({}) must exceed fetcher.timeout_secs + {} ({})",
            storage.ttl_secs, TTL_SAFETY_MARGIN_SECS, floor
        )));
    }
    if storage.size_warning_mb.checked_mul(1024 * 1024).is_none() {
        return Err(ConfigError::ValidationError(format!(
            "storage.size_warning_mb ({}) is too large",
            storage.size_warning_mb
        )));
    }

    Ok(())
}
