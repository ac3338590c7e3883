//! Emotion Engine: from needs to feelings.
//!
//! Maps a pet's (mood, hunger, energy, arousal) reading onto one of the
//! fourteen [`EmotionType`]s plus an [`Intensity`]. Everything here is a
//! pure function of its arguments: calling twice with the same inputs
//! yields bit-identical results.
//!
//! Classification walks a fixed ordered table and returns the first emotion
//! whose thresholds all hold. The order matters: negative, urgent states
//! (scared, anxious, grumpy) are checked before the calmer positive ones,
//! so a frightened but otherwise happy cat still reads as scared.

use crate::rules::{Rule, first_match};
use crate::types::{EmotionType, EmotionalState, Intensity};

/// Inputs to the classifier.
#[derive(Debug, Clone, Copy)]
pub struct EmotionInputs {
    /// Mood, 0–100.
    pub mood: f64,
    /// Hunger, 0–100.
    pub hunger: f64,
    /// Energy, 0–100.
    pub energy: f64,
    /// Arousal, 0–1.
    pub arousal: f64,
}

/// One row of the classification table. Absent bounds are not checked.
#[derive(Debug, Clone, Copy)]
pub struct EmotionRule {
    /// Emotion produced when every present bound holds.
    pub emotion: EmotionType,
    /// Minimum mood.
    pub mood_min: Option<f64>,
    /// Maximum mood.
    pub mood_max: Option<f64>,
    /// Minimum hunger.
    pub hunger_min: Option<f64>,
    /// Minimum energy.
    pub energy_min: Option<f64>,
    /// Maximum energy.
    pub energy_max: Option<f64>,
    /// Minimum arousal.
    pub arousal_min: Option<f64>,
    /// Maximum arousal.
    pub arousal_max: Option<f64>,
}

impl EmotionRule {
    const fn new(emotion: EmotionType) -> Self {
        Self {
            emotion,
            mood_min: None,
            mood_max: None,
            hunger_min: None,
            energy_min: None,
            energy_max: None,
            arousal_min: None,
            arousal_max: None,
        }
    }

    const fn mood_min(mut self, v: f64) -> Self {
        self.mood_min = Some(v);
        self
    }

    const fn mood_max(mut self, v: f64) -> Self {
        self.mood_max = Some(v);
        self
    }

    const fn hunger_min(mut self, v: f64) -> Self {
        self.hunger_min = Some(v);
        self
    }

    const fn energy_min(mut self, v: f64) -> Self {
        self.energy_min = Some(v);
        self
    }

    const fn energy_max(mut self, v: f64) -> Self {
        self.energy_max = Some(v);
        self
    }

    const fn arousal_min(mut self, v: f64) -> Self {
        self.arousal_min = Some(v);
        self
    }

    const fn arousal_max(mut self, v: f64) -> Self {
        self.arousal_max = Some(v);
        self
    }
}

impl Rule<EmotionInputs> for EmotionRule {
    type Output = EmotionType;

    fn matches(&self, i: &EmotionInputs) -> bool {
        let above = |bound: Option<f64>, v: f64| bound.is_none_or(|b| v >= b);
        let below = |bound: Option<f64>, v: f64| bound.is_none_or(|b| v <= b);

        above(self.mood_min, i.mood)
            && below(self.mood_max, i.mood)
            && above(self.hunger_min, i.hunger)
            && above(self.energy_min, i.energy)
            && below(self.energy_max, i.energy)
            && above(self.arousal_min, i.arousal)
            && below(self.arousal_max, i.arousal)
    }

    fn output(&self) -> EmotionType {
        self.emotion
    }
}

/// The ordered classification table. First match wins.
pub const EMOTION_RULES: [EmotionRule; 14] = [
    EmotionRule::new(EmotionType::Scared).mood_max(30.0).arousal_min(0.7),
    EmotionRule::new(EmotionType::Anxious).mood_max(40.0).arousal_min(0.5),
    EmotionRule::new(EmotionType::Grumpy)
        .mood_max(35.0)
        .hunger_min(60.0)
        .energy_max(40.0),
    EmotionRule::new(EmotionType::Annoyed).mood_max(45.0).arousal_min(0.4),
    EmotionRule::new(EmotionType::Hungry).hunger_min(70.0).mood_max(50.0),
    EmotionRule::new(EmotionType::Demanding).hunger_min(75.0).energy_min(40.0),
    EmotionRule::new(EmotionType::Sleepy).energy_max(30.0).mood_min(30.0),
    EmotionRule::new(EmotionType::Relaxed)
        .mood_min(60.0)
        .energy_min(40.0)
        .arousal_max(0.3),
    EmotionRule::new(EmotionType::Content).mood_min(55.0).arousal_max(0.4),
    EmotionRule::new(EmotionType::Affectionate).mood_min(70.0).arousal_max(0.5),
    EmotionRule::new(EmotionType::Curious)
        .mood_min(50.0)
        .arousal_min(0.4)
        .arousal_max(0.7),
    EmotionRule::new(EmotionType::Playful)
        .mood_min(65.0)
        .energy_min(50.0)
        .arousal_min(0.5),
    EmotionRule::new(EmotionType::Excited).mood_min(75.0).arousal_min(0.7),
    EmotionRule::new(EmotionType::Happy).mood_min(70.0).energy_min(45.0),
];

/// Arousal from needs, recent activity and ambient noise, clamped to `[0, 1]`.
#[must_use]
pub fn calculate_arousal(hunger: f64, energy: f64, recent_activity: f64, noise_level: f64) -> f64 {
    let hunger_arousal = (100.0 - hunger) / 100.0 * 0.3;
    let energy_arousal = energy / 100.0 * 0.4;
    let activity_arousal = recent_activity * 0.2;
    let noise_arousal = noise_level * 0.1;

    (hunger_arousal + energy_arousal + activity_arousal + noise_arousal).clamp(0.0, 1.0)
}

/// Classify a reading. Falls back to [`EmotionType::Content`].
#[must_use]
pub fn determine_emotion(mood: f64, hunger: f64, energy: f64, arousal: f64) -> EmotionType {
    let inputs = EmotionInputs {
        mood,
        hunger,
        energy,
        arousal,
    };
    first_match(&EMOTION_RULES, &inputs).unwrap_or(EmotionType::Content)
}

/// How strongly the current emotion is expressed.
#[must_use]
pub fn calculate_intensity(mood: f64, arousal: f64, hunger: f64, energy: f64) -> Intensity {
    let mut score = 0.0;

    if hunger > 80.0 || hunger < 20.0 {
        score += 0.3;
    }
    if energy < 20.0 || energy > 80.0 {
        score += 0.2;
    }

    score += arousal * 0.3;
    score += (mood - 50.0).abs() / 50.0 * 0.2;

    if score > 0.75 {
        Intensity::Intense
    } else if score > 0.5 {
        Intensity::Strong
    } else if score > 0.25 {
        Intensity::Moderate
    } else {
        Intensity::Subtle
    }
}

/// Valence derived from mood: 0 → -1, 50 → 0, 100 → +1.
#[must_use]
pub fn mood_valence(mood: f64) -> f64 {
    (mood / 100.0 - 0.5) * 2.0
}

/// Full emotional reading for a set of needs.
#[must_use]
pub fn emotional_state(
    mood: f64,
    hunger: f64,
    energy: f64,
    recent_activity: f64,
    noise_level: f64,
) -> EmotionalState {
    let arousal = calculate_arousal(hunger, energy, recent_activity, noise_level);
    EmotionalState {
        primary_emotion: determine_emotion(mood, hunger, energy, arousal),
        intensity: calculate_intensity(mood, arousal, hunger, energy),
        mood_value: mood,
        arousal_level: arousal,
        valence: mood_valence(mood),
    }
}
