//! Service configuration, layered on top of the engine's
//! [`PawprintConfig`].
//!
//! ```toml
//! default_personality = "playful"
//!
//! [history]
//! capacity = 500
//!
//! [engine.registry]
//! capacity = 2000
//! ```

use serde::{Deserialize, Serialize};

use pawprint_core::PawprintConfig;

use crate::error::{Result, ServiceError};
use crate::personality::Personality;

// ---------------------------------------------------------------------------
// Deployment sizes
// ---------------------------------------------------------------------------

/// Rough deployment scale, used to pick capacity presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentSize {
    /// A handful of pets, e.g. a single-player client.
    Small,
    /// Defaults.
    #[default]
    Standard,
    /// A shared server with many concurrent pets.
    Large,
}

// ---------------------------------------------------------------------------
// Service configuration
// ---------------------------------------------------------------------------

/// Top-level service configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Engine configuration.
    #[serde(default)]
    pub engine: PawprintConfig,
    /// Action history sink.
    #[serde(default)]
    pub history: HistoryConfig,
    /// Per-cat profiles.
    #[serde(default)]
    pub profiles: ProfileConfig,
    /// Policy prediction cache.
    #[serde(default)]
    pub policy: PolicyConfig,
    /// Personality used when neither the request nor a profile names one.
    #[serde(default)]
    pub default_personality: Personality,
}

/// Action history settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Entries kept per cat.
    #[serde(default = "default_history_capacity")]
    pub capacity: usize,
    /// Cats with a log; the least recently logged is dropped beyond this.
    #[serde(default = "default_history_max_cats")]
    pub max_cats: usize,
}

fn default_history_capacity() -> usize {
    1000
}
fn default_history_max_cats() -> usize {
    10_000
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            capacity: default_history_capacity(),
            max_cats: default_history_max_cats(),
        }
    }
}

/// Profile modifier range.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileConfig {
    /// Smallest modifier.
    #[serde(default = "default_modifier_min")]
    pub modifier_min: f64,
    /// Largest modifier.
    #[serde(default = "default_modifier_max")]
    pub modifier_max: f64,
}

fn default_modifier_min() -> f64 {
    0.92
}
fn default_modifier_max() -> f64 {
    1.08
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            modifier_min: default_modifier_min(),
            modifier_max: default_modifier_max(),
        }
    }
}

/// Policy cache settings, used by [`crate::PetService::with_cache`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Cached predictions.
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
}

fn default_cache_capacity() -> usize {
    1024
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            cache_capacity: default_cache_capacity(),
        }
    }
}

impl ServiceConfig {
    /// Preset capacities for a deployment size.
    #[must_use]
    pub fn for_size(size: DeploymentSize) -> Self {
        let mut config = Self::default();
        match size {
            DeploymentSize::Small => {
                config.engine.registry.capacity = 64;
                config.history.capacity = 200;
                config.history.max_cats = 64;
                config.policy.cache_capacity = 128;
            }
            DeploymentSize::Standard => {}
            DeploymentSize::Large => {
                config.engine.registry.capacity = 100_000;
                config.history.capacity = 250;
                config.history.max_cats = 100_000;
                config.policy.cache_capacity = 16_384;
            }
        }
        config
    }

    /// Parse and validate a TOML document.
    ///
    /// # Errors
    /// `ServiceError::Config` for malformed TOML or out-of-range values.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(toml_str).map_err(|e| ServiceError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file.
    ///
    /// # Errors
    /// I/O failures, or anything [`Self::from_toml`] rejects.
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml(&content)?;
        tracing::info!(path = %path.display(), "loaded service configuration");
        Ok(config)
    }

    /// Range checks, including the engine's own.
    ///
    /// # Errors
    /// `ServiceError::Config` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        self.engine
            .validate()
            .map_err(|e| ServiceError::Config(e.to_string()))?;
        if self.history.capacity == 0 || self.history.max_cats == 0 {
            return Err(ServiceError::Config(
                "history.capacity and history.max_cats must be at least 1".into(),
            ));
        }
        let p = &self.profiles;
        let ordered = p.modifier_min > 0.0 && p.modifier_min <= p.modifier_max;
        if !(ordered && p.modifier_max.is_finite()) {
            return Err(ServiceError::Config(
                "profiles.modifier_min must be positive and at most a finite modifier_max".into(),
            ));
        }
        Ok(())
    }
}
