//! Visual composition of the emotion axes.
//!
//! The base and mood axes are always shown; a reaction overlay is shown
//! only until it expires. Each becomes a [`VisualLayer`] whose weight is
//! `axis weight × intensity weight`, and the layer with the largest
//! `(priority, weight)` decides what the client displays.

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::config::{ReactionConfig, VisualConfig};
use crate::reaction::{ReactionModifier, Stimulus};
use crate::types::{EmotionType, EmotionalState, Intensity, Seconds};

/// Where a visual layer comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerSource {
    /// Instantaneous hunger/energy axis.
    Base,
    /// Smoothed mood axis.
    Mood,
    /// Short-lived reaction overlay.
    Reaction,
}

impl LayerSource {
    /// Fixed display priority. Higher wins.
    #[must_use]
    pub fn priority(self) -> u8 {
        match self {
            Self::Base => 1,
            Self::Mood => 2,
            Self::Reaction => 3,
        }
    }

    /// Configured axis weight.
    #[must_use]
    pub fn axis_weight(self, config: &VisualConfig) -> f64 {
        match self {
            Self::Base => config.base_weight,
            Self::Mood => config.mood_weight,
            Self::Reaction => config.reaction_weight,
        }
    }
}

/// The time-boxed emotion opened when a reaction fires.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReactionAxisState {
    /// Displayed emotion.
    pub emotion: EmotionType,
    /// Displayed intensity.
    pub intensity: Intensity,
    /// Mood-axis arousal plus the reaction's boost, capped at 1.
    pub arousal: f64,
    /// Fixed valence of `emotion`.
    pub valence: f64,
    /// When the overlay was opened.
    pub updated_at: Seconds,
    /// When the overlay stops being shown.
    pub expires_at: Seconds,
}

impl ReactionAxisState {
    /// Open an overlay for a reaction that just fired.
    #[must_use]
    pub fn open(
        stimulus: &Stimulus,
        reaction: &ReactionModifier,
        mood_axis: &EmotionalState,
        now: Seconds,
        config: &ReactionConfig,
    ) -> Self {
        let emotion = reaction
            .reaction_emotion
            .unwrap_or_else(|| stimulus.kind.default_emotion());
        let intensity = reaction
            .reaction_intensity
            .unwrap_or_else(|| Intensity::from_stimulus(stimulus.intensity));
        let duration = if reaction.reaction_duration > 0.0 {
            reaction.reaction_duration
        } else {
            config.base_duration + config.duration_per_intensity * stimulus.intensity
        };

        Self {
            emotion,
            intensity,
            arousal: (mood_axis.arousal_level + reaction.arousal_boost).min(1.0),
            valence: emotion.valence(),
            updated_at: now,
            expires_at: now + duration,
        }
    }

    /// Whether the overlay is still showing at `now`.
    #[must_use]
    pub fn is_active(&self, now: Seconds) -> bool {
        now < self.expires_at
    }
}

/// One weighted layer of the displayed emotion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VisualLayer {
    /// Axis the layer comes from.
    pub source: LayerSource,
    /// Emotion shown.
    pub emotion: EmotionType,
    /// Intensity shown.
    pub intensity: Intensity,
    /// Fixed priority of the source.
    pub priority: u8,
    /// Blend weight in `[0, 1]`.
    pub weight: f64,
    /// Expiry, reaction layers only.
    pub expires_at: Option<Seconds>,
}

impl VisualLayer {
    fn new(
        source: LayerSource,
        emotion: EmotionType,
        intensity: Intensity,
        expires_at: Option<Seconds>,
        config: &VisualConfig,
    ) -> Self {
        Self {
            source,
            emotion,
            intensity,
            priority: source.priority(),
            weight: (source.axis_weight(config) * intensity.visual_weight()).clamp(0.0, 1.0),
            expires_at,
        }
    }
}

/// The three emotion axes as returned to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EmotionAxes {
    /// Stabilized hunger/energy reading.
    pub base: EmotionalState,
    /// Stabilized smoothed-mood reading.
    pub mood: EmotionalState,
    /// Active reaction overlay, if any.
    pub reaction: Option<ReactionAxisState>,
}

impl EmotionAxes {
    /// Build the visual layers, lowest priority first.
    #[must_use]
    pub fn layers(&self, config: &VisualConfig) -> Vec<VisualLayer> {
        let mut layers = vec![
            VisualLayer::new(
                LayerSource::Base,
                self.base.primary_emotion,
                self.base.intensity,
                None,
                config,
            ),
            VisualLayer::new(
                LayerSource::Mood,
                self.mood.primary_emotion,
                self.mood.intensity,
                None,
                config,
            ),
        ];
        if let Some(reaction) = &self.reaction {
            layers.push(VisualLayer::new(
                LayerSource::Reaction,
                reaction.emotion,
                reaction.intensity,
                Some(reaction.expires_at),
                config,
            ));
        }
        layers.sort_by_key(|l| l.priority);
        layers
    }
}

/// Emotion of the layer with the largest `(priority, weight)`.
#[must_use]
pub fn primary_emotion(layers: &[VisualLayer]) -> Option<EmotionType> {
    layers
        .iter()
        .max_by_key(|l| (l.priority, OrderedFloat(l.weight)))
        .map(|l| l.emotion)
}
