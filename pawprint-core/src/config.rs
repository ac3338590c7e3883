//! Configuration for the PAWPRINT behavior engine.
//!
//! Maps directly to `pawprint.toml`. Every field has a default, and the
//! defaults reproduce the tuned constants the engine ships with, so an
//! empty file is a valid configuration.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{PawprintError, Result};
use crate::types::{EmotionType, Seconds};

/// Top-level PAWPRINT configuration, loadable from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PawprintConfig {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,
    /// Per-pet state registry.
    #[serde(default)]
    pub registry: RegistryConfig,
    /// Emotional hysteresis.
    #[serde(default)]
    pub stabilization: StabilizationConfig,
    /// Mood smoothing.
    #[serde(default)]
    pub mood: MoodConfig,
    /// Reaction overlay timing.
    #[serde(default)]
    pub reactions: ReactionConfig,
    /// Noise and distraction tuning.
    #[serde(default)]
    pub stochastic: StochasticConfig,
    /// Visual layer weights.
    #[serde(default)]
    pub visual: VisualConfig,
    /// Random source seeding.
    #[serde(default)]
    pub randomness: RandomnessConfig,
}

impl PawprintConfig {
    /// Load configuration from a TOML string.
    ///
    /// # Errors
    /// Returns `PawprintError::Config` if the TOML is invalid or a value is
    /// out of range.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(toml_str).map_err(|e| PawprintError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml(&content)?;
        tracing::info!(path = %path.display(), "loaded pawprint configuration");
        Ok(config)
    }

    /// Check value ranges that serde cannot express. NaN and infinities
    /// are rejected everywhere.
    ///
    /// # Errors
    /// Returns `PawprintError::Config` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        let fail = |msg: &str| Err(PawprintError::Config(msg.to_string()));
        let non_negative = |x: f64| x.is_finite() && x >= 0.0;
        let unit = |x: f64| (0.0..=1.0).contains(&x);

        if self.registry.capacity == 0 {
            return fail("registry.capacity must be at least 1");
        }
        if self.registry.memory_capacity == 0 {
            return fail("registry.memory_capacity must be at least 1");
        }
        if !non_negative(self.registry.idle_ttl_seconds) {
            return fail("registry.idle_ttl_seconds must be finite and non-negative");
        }

        let st = &self.stabilization;
        if st.base_required_votes == 0 || st.mood_required_votes == 0 {
            return fail("stabilization vote counts must be at least 1");
        }
        if !non_negative(st.base_hold_multiplier) {
            return fail("stabilization.base_hold_multiplier must be finite and non-negative");
        }
        if !unit(st.urgent_intensity) {
            return fail("stabilization.urgent_intensity must be in [0, 1]");
        }
        if !st.hold_overrides.values().all(|s| non_negative(*s)) {
            return fail("stabilization.hold_overrides must be finite and non-negative");
        }

        if !(self.mood.smoothing > 0.0 && self.mood.smoothing <= 1.0) {
            return fail("mood.smoothing must be in (0, 1]");
        }
        let r = &self.reactions;
        if !non_negative(r.base_duration) || !non_negative(r.duration_per_intensity) {
            return fail("reaction durations must be finite and non-negative");
        }
        if !unit(self.stochastic.noise_confidence) {
            return fail("stochastic.noise_confidence must be in [0, 1]");
        }
        if !non_negative(self.stochastic.distraction_richness) {
            return fail("stochastic.distraction_richness must be finite and non-negative");
        }

        let v = &self.visual;
        if ![v.base_weight, v.mood_weight, v.reaction_weight].into_iter().all(non_negative) {
            return fail("visual weights must be finite and non-negative");
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// General system settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// Per-pet state registry sizing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Maximum pets kept in memory; least recently used are evicted.
    #[serde(default = "default_capacity")]
    pub capacity: usize,
    /// Pets idle for longer than this are dropped and start fresh.
    #[serde(default = "default_idle_ttl")]
    pub idle_ttl_seconds: Seconds,
    /// Entries kept in each pet's action memory.
    #[serde(default = "default_memory_capacity")]
    pub memory_capacity: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            idle_ttl_seconds: default_idle_ttl(),
            memory_capacity: default_memory_capacity(),
        }
    }
}

/// Hold-time and voting hysteresis for the emotion axes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StabilizationConfig {
    /// Consecutive votes the base axis needs to switch.
    #[serde(default = "default_3")]
    pub base_required_votes: u32,
    /// Consecutive votes the mood axis needs to switch.
    #[serde(default = "default_2")]
    pub mood_required_votes: u32,
    /// Base-axis hold times are the mood-axis table scaled by this.
    #[serde(default = "default_2_0")]
    pub base_hold_multiplier: f64,
    /// Stimulus intensity at which urgent stimuli bypass hysteresis.
    #[serde(default = "default_0_6")]
    pub urgent_intensity: f64,
    /// Mood-axis hold overrides in seconds, keyed by emotion.
    #[serde(default)]
    pub hold_overrides: HashMap<EmotionType, Seconds>,
}

impl Default for StabilizationConfig {
    fn default() -> Self {
        Self {
            base_required_votes: 3,
            mood_required_votes: 2,
            base_hold_multiplier: 2.0,
            urgent_intensity: 0.6,
            hold_overrides: HashMap::new(),
        }
    }
}

impl StabilizationConfig {
    /// Mood-axis hold time for `emotion`, honouring overrides.
    #[must_use]
    pub fn mood_hold(&self, emotion: EmotionType) -> Seconds {
        self.hold_overrides
            .get(&emotion)
            .copied()
            .unwrap_or_else(|| default_mood_hold(emotion))
    }
}

/// Default mood-axis hold times. Calm and low-energy states are sticky;
/// startle states pass quickly.
#[must_use]
pub fn default_mood_hold(emotion: EmotionType) -> Seconds {
    match emotion {
        EmotionType::Excited | EmotionType::Scared => 30.0,
        EmotionType::Playful | EmotionType::Curious => 45.0,
        EmotionType::Content
        | EmotionType::Annoyed
        | EmotionType::Anxious
        | EmotionType::Demanding => 60.0,
        EmotionType::Happy | EmotionType::Grumpy | EmotionType::Affectionate => 90.0,
        EmotionType::Relaxed | EmotionType::Hungry => 120.0,
        EmotionType::Sleepy => 240.0,
    }
}

/// Mood exponential moving average.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoodConfig {
    /// Weight of the newest mood sample.
    #[serde(default = "default_0_2")]
    pub smoothing: f64,
}

impl Default for MoodConfig {
    fn default() -> Self {
        Self { smoothing: 0.2 }
    }
}

/// Reaction overlay lifetime when a reaction names none.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReactionConfig {
    /// Fixed part of the lifetime, in seconds.
    #[serde(default = "default_3_0")]
    pub base_duration: Seconds,
    /// Seconds added per unit of stimulus intensity.
    #[serde(default = "default_2_0")]
    pub duration_per_intensity: Seconds,
}

impl Default for ReactionConfig {
    fn default() -> Self {
        Self {
            base_duration: 3.0,
            duration_per_intensity: 2.0,
        }
    }
}

/// Noise and distraction tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StochasticConfig {
    /// Confidence assumed for policy output when applying noise.
    #[serde(default = "default_0_75")]
    pub noise_confidence: f64,
    /// Environment richness used for distraction injection.
    #[serde(default = "default_0_6")]
    pub distraction_richness: f64,
}

impl Default for StochasticConfig {
    fn default() -> Self {
        Self {
            noise_confidence: 0.75,
            distraction_richness: 0.6,
        }
    }
}

/// Visual layer base weights per axis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisualConfig {
    /// Base (needs) axis.
    #[serde(default = "default_0_4")]
    pub base_weight: f64,
    /// Smoothed mood axis.
    #[serde(default = "default_0_6")]
    pub mood_weight: f64,
    /// Reaction overlay.
    #[serde(default = "default_1_0")]
    pub reaction_weight: f64,
}

impl Default for VisualConfig {
    fn default() -> Self {
        Self {
            base_weight: 0.4,
            mood_weight: 0.6,
            reaction_weight: 1.0,
        }
    }
}

/// Random source seeding.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RandomnessConfig {
    /// Master seed. `None` seeds from OS entropy.
    #[serde(default)]
    pub seed: Option<u64>,
}

// ---------------------------------------------------------------------------
// Serde default helpers
// ---------------------------------------------------------------------------

fn default_log_level() -> String { "info".to_string() }
fn default_capacity() -> usize { 10_000 }
fn default_idle_ttl() -> Seconds { 3600.0 }
fn default_memory_capacity() -> usize { crate::memory::DEFAULT_CAPACITY }
fn default_2() -> u32 { 2 }
fn default_3() -> u32 { 3 }
fn default_0_2() -> f64 { 0.2 }
fn default_0_4() -> f64 { 0.4 }
fn default_0_6() -> f64 { 0.6 }
fn default_0_75() -> f64 { 0.75 }
fn default_1_0() -> f64 { 1.0 }
fn default_2_0() -> f64 { 2.0 }
fn default_3_0() -> f64 { 3.0 }

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_gives_defaults() {
        let config = PawprintConfig::from_toml("").unwrap_or_default();
        assert_eq!(config.stabilization.base_required_votes, 3);
        assert_eq!(config.stabilization.mood_required_votes, 2);
        assert!((config.mood.smoothing - 0.2).abs() < f64::EPSILON);
        assert_eq!(config.registry.memory_capacity, 50);
        assert!(config.randomness.seed.is_none());
    }

    #[test]
    fn sleepy_holds_four_minutes_on_mood_axis() {
        let config = StabilizationConfig::default();
        assert!((config.mood_hold(EmotionType::Sleepy) - 240.0).abs() < f64::EPSILON);
    }

    #[test]
    fn partial_toml_overrides_selected_fields() {
        let toml = r#"
            [registry]
            capacity = 16

            [stabilization]
            mood_required_votes = 4

            [stabilization.hold_overrides]
            sleepy = 10.0

            [randomness]
            seed = 1234
        "#;
        let config = PawprintConfig::from_toml(toml);
        assert!(config.is_ok(), "{config:?}");
        let config = config.unwrap_or_default();
        assert_eq!(config.registry.capacity, 16);
        assert!((config.registry.idle_ttl_seconds - 3600.0).abs() < f64::EPSILON);
        assert_eq!(config.stabilization.mood_required_votes, 4);
        assert_eq!(config.stabilization.base_required_votes, 3);
        assert!((config.stabilization.mood_hold(EmotionType::Sleepy) - 10.0).abs() < f64::EPSILON);
        assert!((config.stabilization.mood_hold(EmotionType::Happy) - 90.0).abs() < f64::EPSILON);
        assert_eq!(config.randomness.seed, Some(1234));
    }

    #[test]
    fn unknown_emotion_in_overrides_is_rejected() {
        let toml = "[stabilization.hold_overrides]\nmelancholy = 5.0\n";
        assert!(matches!(
            PawprintConfig::from_toml(toml),
            Err(PawprintError::Config(_))
        ));
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        for toml in [
            "[mood]\nsmoothing = 0.0\n",
            "[stabilization]\nbase_required_votes = 0\n",
            "[registry]\ncapacity = 0\n",
            "[stochastic]\nnoise_confidence = 1.5\n",
            "[visual]\nreaction_weight = -1.0\n",
            "[visual]\nmood_weight = nan\n",
            "[stochastic]\ndistraction_richness = nan\n",
            "[stochastic]\nnoise_confidence = nan\n",
            "[stabilization]\nbase_hold_multiplier = inf\n",
            "[stabilization]\nurgent_intensity = 1.5\n",
            "[stabilization]\nurgent_intensity = nan\n",
            "[stabilization.hold_overrides]\nsleepy = nan\n",
            "[mood]\nsmoothing = nan\n",
            "[reactions]\nbase_duration = -inf\n",
            "[registry]\nidle_ttl_seconds = nan\n",
        ] {
            assert!(
                matches!(PawprintConfig::from_toml(toml), Err(PawprintError::Config(_))),
                "accepted {toml}"
            );
        }
    }
}
