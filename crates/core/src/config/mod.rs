//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (CHORDSTASH_*)
//! 2. TOML config file (if CHORDSTASH_CONFIG_FILE set)
//! 3. Built-in defaults
//!
//! Every cache tunable lives here: per-namespace TTLs, size bounds, and the
//! eviction scoring weights. The spec-level defaults are deliberately
//! conservative; deployments override them through the environment.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::cache::sweep::{CachePolicy, EvictionWeights};

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (CHORDSTASH_*)
/// 2. TOML config file (if CHORDSTASH_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the SQLite cache database.
    ///
    /// Set via CHORDSTASH_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Base URL of the chord-sheet site the scraper talks to.
    ///
    /// Set via CHORDSTASH_SITE_BASE_URL environment variable.
    #[serde(default = "default_site_base_url")]
    pub site_base_url: String,

    /// User-Agent string for HTTP requests.
    ///
    /// Set via CHORDSTASH_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// HTTP request timeout in milliseconds.
    ///
    /// Set via CHORDSTASH_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Maximum bytes to fetch per request.
    ///
    /// Set via CHORDSTASH_MAX_BYTES environment variable.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// TTL for unsaved chord-sheet records, in days.
    #[serde(default = "default_sheet_ttl_days")]
    pub sheet_ttl_days: i64,

    /// TTL for cached search results, in minutes.
    #[serde(default = "default_search_ttl_minutes")]
    pub search_ttl_minutes: i64,

    /// TTL for cached per-artist song lists, in hours.
    #[serde(default = "default_artist_ttl_hours")]
    pub artist_ttl_hours: i64,

    /// Maximum number of unsaved chord-sheet records before eviction.
    ///
    /// Saved records never count against this bound.
    #[serde(default = "default_max_unsaved_sheets")]
    pub max_unsaved_sheets: usize,

    /// Maximum number of cached search-result entries.
    #[serde(default = "default_max_result_entries")]
    pub max_search_entries: usize,

    /// Maximum number of cached artist-song entries.
    #[serde(default = "default_max_result_entries")]
    pub max_artist_entries: usize,

    /// Weight of the access-frequency term in the eviction score.
    ///
    /// Must sum to 1.0 with `eviction_recency_weight`.
    #[serde(default = "default_access_weight")]
    pub eviction_access_weight: f64,

    /// Weight of the recency term in the eviction score.
    #[serde(default = "default_recency_weight")]
    pub eviction_recency_weight: f64,

    /// Whether to insert the built-in sample library on startup when the
    /// user has no saved chord sheets yet.
    #[serde(default)]
    pub seed_samples: bool,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./chordstash.sqlite")
}

fn default_site_base_url() -> String {
    "https://www.e-chords.com".into()
}

fn default_user_agent() -> String {
    "chordstash/0.1".into()
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_max_bytes() -> usize {
    2_097_152 // 2MB
}

fn default_sheet_ttl_days() -> i64 {
    30
}

fn default_search_ttl_minutes() -> i64 {
    30
}

fn default_artist_ttl_hours() -> i64 {
    6
}

fn default_max_unsaved_sheets() -> usize {
    100
}

fn default_max_result_entries() -> usize {
    200
}

fn default_access_weight() -> f64 {
    0.7
}

fn default_recency_weight() -> f64 {
    0.3
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            site_base_url: default_site_base_url(),
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
            max_bytes: default_max_bytes(),
            sheet_ttl_days: default_sheet_ttl_days(),
            search_ttl_minutes: default_search_ttl_minutes(),
            artist_ttl_hours: default_artist_ttl_hours(),
            max_unsaved_sheets: default_max_unsaved_sheets(),
            max_search_entries: default_max_result_entries(),
            max_artist_entries: default_max_result_entries(),
            eviction_access_weight: default_access_weight(),
            eviction_recency_weight: default_recency_weight(),
            seed_samples: false,
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    fn weights(&self) -> EvictionWeights {
        EvictionWeights { access: self.eviction_access_weight, recency: self.eviction_recency_weight }
    }

    /// Cache policy for the chord-sheet table.
    pub fn sheet_policy(&self) -> CachePolicy {
        CachePolicy {
            ttl_ms: self.sheet_ttl_days * 24 * 60 * 60 * 1000,
            max_entries: self.max_unsaved_sheets,
            weights: self.weights(),
        }
    }

    /// Cache policy for the search-result table.
    pub fn search_policy(&self) -> CachePolicy {
        CachePolicy {
            ttl_ms: self.search_ttl_minutes * 60 * 1000,
            max_entries: self.max_search_entries,
            weights: self.weights(),
        }
    }

    /// Cache policy for the artist-songs table.
    pub fn artist_policy(&self) -> CachePolicy {
        CachePolicy {
            ttl_ms: self.artist_ttl_hours * 60 * 60 * 1000,
            max_entries: self.max_artist_entries,
            weights: self.weights(),
        }
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `CHORDSTASH_`
    /// 2. TOML file from `CHORDSTASH_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("CHORDSTASH_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("CHORDSTASH_")
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.db_path, PathBuf::from("./chordstash.sqlite"));
        assert_eq!(config.user_agent, "chordstash/0.1");
        assert_eq!(config.timeout_ms, 10_000);
        assert_eq!(config.sheet_ttl_days, 30);
        assert_eq!(config.max_unsaved_sheets, 100);
        assert!(!config.seed_samples);
    }

    #[test]
    fn test_timeout_duration() {
        let config = AppConfig::default();
        assert_eq!(config.timeout(), Duration::from_millis(10_000));
    }

    #[test]
    fn test_sheet_policy_ttl() {
        let config = AppConfig { sheet_ttl_days: 1, ..Default::default() };
        assert_eq!(config.sheet_policy().ttl_ms, 86_400_000);
    }

    #[test]
    fn test_policies_share_weights() {
        let config = AppConfig::default();
        let sheet = config.sheet_policy();
        let search = config.search_policy();
        assert_eq!(sheet.weights.access, search.weights.access);
        assert_eq!(sheet.weights.recency, search.weights.recency);
    }
}
