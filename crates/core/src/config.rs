//! Ingest job configuration via `keyhunt.toml`
//!
//! Both periodic intervals (index commit and keyword search) derive from a
//! single update frequency setting. Either interval can be overridden in
//! milliseconds, which is mostly useful for tests and very small jobs.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Config file name placed next to the case data.
pub const CONFIG_FILE_NAME: &str = "keyhunt.toml";

/// How often the index is committed and keyword lists are re-searched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateFrequency {
    /// Every 20 minutes
    Fast,
    /// Every 10 minutes
    Avg,
    /// Every 5 minutes
    Slow,
    /// Every minute
    Slowest,
    /// Every 5 minutes
    #[default]
    Default,
}

impl UpdateFrequency {
    /// Interval length in minutes
    pub fn minutes(&self) -> u64 {
        match self {
            UpdateFrequency::Fast => 20,
            UpdateFrequency::Avg => 10,
            UpdateFrequency::Slow => 5,
            UpdateFrequency::Slowest => 1,
            UpdateFrequency::Default => 5,
        }
    }

    /// Interval length
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.minutes() * 60)
    }
}

/// Ingest job configuration loaded from `keyhunt.toml`.
///
/// # Example
///
/// ```toml
/// # Update frequency: "fast", "avg", "slow", "slowest" or "default"
/// update_frequency = "default"
///
/// # Index known-good files by metadata only
/// skip_known_files = true
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Commit and search cadence
    #[serde(default)]
    pub update_frequency: UpdateFrequency,
    /// Route files matching a known-good hash set to metadata-only indexing
    #[serde(default = "default_skip_known")]
    pub skip_known_files: bool,
    /// Commit interval override in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit_interval_ms: Option<u64>,
    /// Search interval override in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_interval_ms: Option<u64>,
}

fn default_skip_known() -> bool {
    true
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            update_frequency: UpdateFrequency::default(),
            skip_known_files: default_skip_known(),
            commit_interval_ms: None,
            search_interval_ms: None,
        }
    }
}

impl IngestConfig {
    /// Config with both intervals overridden
    pub fn with_intervals(commit: Duration, search: Duration) -> Self {
        Self {
            commit_interval_ms: Some(commit.as_millis() as u64),
            search_interval_ms: Some(search.as_millis() as u64),
            ..Self::default()
        }
    }

    /// Time between commit-due marks
    pub fn commit_interval(&self) -> Duration {
        self.commit_interval_ms
            .map(Duration::from_millis)
            .unwrap_or_else(|| self.update_frequency.interval())
    }

    /// Time between search-due marks
    pub fn search_interval(&self) -> Duration {
        self.search_interval_ms
            .map(Duration::from_millis)
            .unwrap_or_else(|| self.update_frequency.interval())
    }

    /// Check that the intervals are usable.
    ///
    /// # Errors
    ///
    /// Returns an error if an interval override is zero.
    pub fn validate(&self) -> Result<()> {
        if self.commit_interval_ms == Some(0) {
            return Err(Error::Config(
                "commit_interval_ms must be greater than zero".to_string(),
            ));
        }
        if self.search_interval_ms == Some(0) {
            return Err(Error::Config(
                "search_interval_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# keyhunt ingest configuration
#
# How often the index is committed and keyword lists are searched:
#   "fast" = 20 min, "avg" = 10 min, "slow" = 5 min,
#   "slowest" = 1 min, "default" = 5 min
update_frequency = "default"

# Index files from known-good hash sets by metadata only (default: true)
skip_known_files = true

# Optional overrides in milliseconds
# commit_interval_ms = 300000
# search_interval_ms = 300000
"#
    }

    /// Parse config from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text cannot be parsed or fails validation.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: IngestConfig = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml_str(&content).map_err(|e| match e {
            Error::Config(msg) => Error::Config(format!("{} ({})", msg, path.display())),
            other => other,
        })
    }

    /// Write the default config file if it does not already exist.
    ///
    /// Returns `Ok(())` whether the file was created or already existed.
    pub fn write_default_if_missing(path: &Path) -> Result<()> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml())?;
        }
        Ok(())
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
