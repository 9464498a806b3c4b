//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `max_bytes` is 0 or exceeds 50MB
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `user_agent` is empty
    /// - any TTL or size bound is not positive
    /// - the eviction weights are negative or do not sum to 1.0
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_bytes == 0 {
            return Err(ConfigError::Invalid { field: "max_bytes".into(), reason: "must be greater than 0".into() });
        }
        if self.max_bytes > 50 * 1024 * 1024 {
            return Err(ConfigError::Invalid { field: "max_bytes".into(), reason: "must not exceed 50MB".into() });
        }

        if self.timeout_ms < 100 {
            return Err(ConfigError::Invalid { field: "timeout_ms".into(), reason: "must be at least 100ms".into() });
        }
        if self.timeout_ms > 300_000 {
            return Err(ConfigError::Invalid {
                field: "timeout_ms".into(),
                reason: "must not exceed 5 minutes (300000ms)".into(),
            });
        }

        if self.user_agent.is_empty() {
            return Err(ConfigError::Invalid { field: "user_agent".into(), reason: "must not be empty".into() });
        }

        if self.sheet_ttl_days <= 0 {
            return Err(ConfigError::Invalid { field: "sheet_ttl_days".into(), reason: "must be positive".into() });
        }
        if self.search_ttl_minutes <= 0 {
            return Err(ConfigError::Invalid {
                field: "search_ttl_minutes".into(),
                reason: "must be positive".into(),
            });
        }
        if self.artist_ttl_hours <= 0 {
            return Err(ConfigError::Invalid { field: "artist_ttl_hours".into(), reason: "must be positive".into() });
        }

        if self.max_unsaved_sheets == 0 {
            return Err(ConfigError::Invalid {
                field: "max_unsaved_sheets".into(),
                reason: "must be greater than 0".into(),
            });
        }
        if self.max_search_entries == 0 || self.max_artist_entries == 0 {
            return Err(ConfigError::Invalid {
                field: "max_search_entries".into(),
                reason: "result cache bounds must be greater than 0".into(),
            });
        }

        if self.eviction_access_weight < 0.0 || self.eviction_recency_weight < 0.0 {
            return Err(ConfigError::Invalid {
                field: "eviction_access_weight".into(),
                reason: "weights must not be negative".into(),
            });
        }
        let weight_sum = self.eviction_access_weight + self.eviction_recency_weight;
        if (weight_sum - 1.0).abs() > 1e-6 {
            return Err(ConfigError::Invalid {
                field: "eviction_access_weight".into(),
                reason: format!("weights must sum to 1.0, got {weight_sum}"),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_default_config() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_max_bytes_zero() {
        let config = AppConfig { max_bytes: 0, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "max_bytes"));
    }

    #[test]
    fn test_validate_timeout_too_small() {
        let config = AppConfig { timeout_ms: 50, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "timeout_ms"));
    }

    #[test]
    fn test_validate_empty_user_agent() {
        let config = AppConfig { user_agent: String::new(), ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "user_agent"));
    }

    #[test]
    fn test_validate_zero_ttl() {
        let config = AppConfig { sheet_ttl_days: 0, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "sheet_ttl_days"));
    }

    #[test]
    fn test_validate_zero_bound() {
        let config = AppConfig { max_unsaved_sheets: 0, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "max_unsaved_sheets"));
    }

    #[test]
    fn test_validate_weights_must_sum_to_one() {
        let config = AppConfig {
            eviction_access_weight: 0.7,
            eviction_recency_weight: 0.5,
            ..Default::default()
        };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "eviction_access_weight"));
    }

    #[test]
    fn test_validate_negative_weight() {
        let config = AppConfig {
            eviction_access_weight: 1.3,
            eviction_recency_weight: -0.3,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_custom_weights() {
        let config = AppConfig {
            eviction_access_weight: 0.5,
            eviction_recency_weight: 0.5,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }
}
