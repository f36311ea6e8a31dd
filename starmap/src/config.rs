//! Viewer configuration.
//!
//! Stored as JSON in `~/.starmap/viewer.json` by default. Every field has a
//! default, so a partial or missing file is fine.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::catalog::{CatalogSource, RetryPolicy};
use crate::error::{Result, StarmapError};
use crate::point_set::DEFAULT_PARALLEL_THRESHOLD;

/// Settings for catalog loading, rebuilding and picking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Catalog file or URL
    pub catalog: CatalogSource,
    /// Pick tolerance in world units (perpendicular distance from the click ray)
    pub pick_threshold: f32,
    /// Point count at which point cloud rebuilds go parallel
    pub parallel_threshold: usize,
    /// Retry schedule for remote catalog fetches
    pub retry: RetryPolicy,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            catalog: CatalogSource::default(),
            pick_threshold: 1.0,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
            retry: RetryPolicy::default(),
        }
    }
}

impl ViewerConfig {
    /// Default location: `$HOME/.starmap/viewer.json`
    pub fn default_path() -> Result<PathBuf> {
        let home = std::env::var("HOME")
            .map_err(|_| StarmapError::Config("HOME not set".to_string()))?;
        Ok(PathBuf::from(home).join(".starmap").join("viewer.json"))
    }

    /// Check values that would make the viewer misbehave.
    pub fn validate(&self) -> Result<()> {
        if !(self.pick_threshold.is_finite() && self.pick_threshold > 0.0) {
            return Err(StarmapError::Config(format!(
                "pick_threshold must be positive, got {}",
                self.pick_threshold
            )));
        }
        if self.parallel_threshold == 0 {
            return Err(StarmapError::Config(
                "parallel_threshold must be at least 1".to_string(),
            ));
        }
        if self.retry.max_attempts == 0 {
            return Err(StarmapError::Config(
                "retry.max_attempts must be at least 1".to_string(),
            ));
        }
        if !(self.retry.backoff_multiplier.is_finite() && self.retry.backoff_multiplier >= 1.0) {
            return Err(StarmapError::Config(format!(
                "retry.backoff_multiplier must be >= 1.0, got {}",
                self.retry.backoff_multiplier
            )));
        }
        Ok(())
    }

    /// Save to JSON file, creating the parent directory if needed
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| StarmapError::Config(e.to_string()))?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load from JSON file and validate
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&json)
            .map_err(|e| StarmapError::Config(format!("{}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` if it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("No viewer config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::load_from_file(path)
    }
}
