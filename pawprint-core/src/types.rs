//! Core type definitions for the PAWPRINT behavior engine.
//!
//! All types are serializable so a decision can be shipped to the
//! rendering client as-is.

use std::fmt;
use std::str::FromStr;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::{PawprintError, Result};

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// Wall-clock time in seconds since the Unix epoch.
///
/// Hold timers, reaction expiry and registry TTLs are all measured in this
/// unit so callers (and tests) can drive the engine with explicit times.
pub type Seconds = f64;

/// Current wall-clock time as [`Seconds`].
#[must_use]
pub fn unix_now() -> Seconds {
    Utc::now().timestamp_millis() as f64 / 1000.0
}

/// Coarse time of day reported by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeOfDay {
    /// Early hours.
    Morning,
    /// Midday (default).
    #[default]
    Afternoon,
    /// Dusk.
    Evening,
    /// Dark hours.
    Night,
    /// Anything the client sent that we do not recognise.
    #[serde(other)]
    Unknown,
}

impl TimeOfDay {
    /// Energy multiplier associated with this part of the day.
    #[must_use]
    pub fn energy_modifier(self) -> f64 {
        match self {
            Self::Morning => 1.1,
            Self::Afternoon | Self::Unknown => 1.0,
            Self::Evening => 0.9,
            Self::Night => 0.7,
        }
    }
}

impl FromStr for TimeOfDay {
    type Err = std::convert::Infallible;

    /// Lenient parse; unrecognised labels map to [`TimeOfDay::Unknown`].
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s.trim().to_lowercase().as_str() {
            "morning" => Self::Morning,
            "afternoon" => Self::Afternoon,
            "evening" => Self::Evening,
            "night" => Self::Night,
            _ => Self::Unknown,
        })
    }
}

// ---------------------------------------------------------------------------
// Actions
// ---------------------------------------------------------------------------

/// The discrete actions a pet can take. Discriminants are the wire ids
/// shared with the policy model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
#[repr(u8)]
pub enum PetAction {
    /// Stay put.
    Idle = 0,
    /// Walk toward the food bowl.
    MoveToFood = 1,
    /// Walk toward the toy.
    MoveToToy = 2,
    /// Nap.
    Sleep = 3,
    /// Self-grooming.
    Groom = 4,
    /// Play in place.
    Play = 5,
    /// Wander around.
    Explore = 6,
    /// Complain at the bowl.
    MeowAtBowl = 7,
}

impl PetAction {
    /// Number of distinct actions.
    pub const COUNT: usize = 8;

    /// Every action, in id order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::Idle,
        Self::MoveToFood,
        Self::MoveToToy,
        Self::Sleep,
        Self::Groom,
        Self::Play,
        Self::Explore,
        Self::MeowAtBowl,
    ];

    /// Wire id of this action.
    #[must_use]
    pub fn id(self) -> u8 {
        self as u8
    }

    /// Resolve a wire id.
    ///
    /// # Errors
    /// Returns [`PawprintError::InvalidAction`] for ids outside the catalogue.
    pub fn from_id(id: u8) -> Result<Self> {
        Self::ALL
            .get(usize::from(id))
            .copied()
            .ok_or(PawprintError::InvalidAction(id))
    }

    /// Snake-case name, as shown to clients.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::MoveToFood => "move_to_food",
            Self::MoveToToy => "move_to_toy",
            Self::Sleep => "sleep",
            Self::Groom => "groom",
            Self::Play => "play",
            Self::Explore => "explore",
            Self::MeowAtBowl => "meow_at_bowl",
        }
    }

    /// Whether this action counts toward the recent activity level.
    #[must_use]
    pub fn is_active(self) -> bool {
        matches!(
            self,
            Self::MoveToFood | Self::MoveToToy | Self::Play | Self::Explore
        )
    }
}

impl From<PetAction> for u8 {
    fn from(action: PetAction) -> Self {
        action.id()
    }
}

impl TryFrom<u8> for PetAction {
    type Error = PawprintError;

    fn try_from(id: u8) -> Result<Self> {
        Self::from_id(id)
    }
}

impl fmt::Display for PetAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Emotions
// ---------------------------------------------------------------------------

/// The closed set of emotions a pet can display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmotionType {
    /// Default, settled state.
    Content,
    /// Cheerful.
    Happy,
    /// Highly aroused and positive.
    Excited,
    /// Wants to play.
    Playful,
    /// Interested in something new.
    Curious,
    /// Calm and at ease.
    Relaxed,
    /// Low energy.
    Sleepy,
    /// Wants food.
    Hungry,
    /// Tired, hungry and fed up.
    Grumpy,
    /// Mildly irritated.
    Annoyed,
    /// Frightened.
    Scared,
    /// Uneasy.
    Anxious,
    /// Seeking contact.
    Affectionate,
    /// Insisting on food, now.
    Demanding,
}

impl EmotionType {
    /// Every emotion in declaration order.
    pub const ALL: [Self; 14] = [
        Self::Content,
        Self::Happy,
        Self::Excited,
        Self::Playful,
        Self::Curious,
        Self::Relaxed,
        Self::Sleepy,
        Self::Hungry,
        Self::Grumpy,
        Self::Annoyed,
        Self::Scared,
        Self::Anxious,
        Self::Affectionate,
        Self::Demanding,
    ];

    /// Lowercase label used on the wire.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Content => "content",
            Self::Happy => "happy",
            Self::Excited => "excited",
            Self::Playful => "playful",
            Self::Curious => "curious",
            Self::Relaxed => "relaxed",
            Self::Sleepy => "sleepy",
            Self::Hungry => "hungry",
            Self::Grumpy => "grumpy",
            Self::Annoyed => "annoyed",
            Self::Scared => "scared",
            Self::Anxious => "anxious",
            Self::Affectionate => "affectionate",
            Self::Demanding => "demanding",
        }
    }

    /// Fixed valence used when an emotion is imposed by a reaction rather
    /// than derived from mood.
    #[must_use]
    pub fn valence(self) -> f64 {
        match self {
            Self::Content => 0.3,
            Self::Happy => 0.7,
            Self::Excited => 0.8,
            Self::Playful => 0.6,
            Self::Curious => 0.3,
            Self::Relaxed => 0.4,
            Self::Sleepy => 0.1,
            Self::Hungry => -0.2,
            Self::Grumpy => -0.5,
            Self::Annoyed => -0.4,
            Self::Scared => -0.8,
            Self::Anxious => -0.6,
            Self::Affectionate => 0.8,
            Self::Demanding => -0.1,
        }
    }
}

impl FromStr for EmotionType {
    type Err = PawprintError;

    fn from_str(s: &str) -> Result<Self> {
        let needle = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|e| e.label() == needle)
            .ok_or_else(|| PawprintError::unknown_label("emotion", s))
    }
}

impl fmt::Display for EmotionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// How strongly an emotion is expressed. Ordered weakest to strongest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intensity {
    /// Barely visible.
    Subtle,
    /// Noticeable.
    Moderate,
    /// Clearly expressed.
    Strong,
    /// Overwhelming.
    Intense,
}

impl Intensity {
    /// Lowercase label used on the wire.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Subtle => "subtle",
            Self::Moderate => "moderate",
            Self::Strong => "strong",
            Self::Intense => "intense",
        }
    }

    /// Visual weight multiplier for layer composition.
    #[must_use]
    pub fn visual_weight(self) -> f64 {
        match self {
            Self::Subtle => 0.4,
            Self::Moderate => 0.6,
            Self::Strong => 0.8,
            Self::Intense => 1.0,
        }
    }

    /// Bucket a stimulus intensity in `[0, 1]` into an expression level.
    #[must_use]
    pub fn from_stimulus(intensity: f64) -> Self {
        match intensity {
            i if i >= 0.85 => Self::Intense,
            i if i >= 0.6 => Self::Strong,
            i if i >= 0.35 => Self::Moderate,
            _ => Self::Subtle,
        }
    }
}

impl FromStr for Intensity {
    type Err = PawprintError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "subtle" => Ok(Self::Subtle),
            "moderate" => Ok(Self::Moderate),
            "strong" => Ok(Self::Strong),
            "intense" => Ok(Self::Intense),
            _ => Err(PawprintError::unknown_label("intensity", s)),
        }
    }
}

impl fmt::Display for Intensity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A fully resolved emotional reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EmotionalState {
    /// Categorical emotion.
    #[serde(rename = "emotion")]
    pub primary_emotion: EmotionType,
    /// Expression strength.
    pub intensity: Intensity,
    /// Mood value the reading was derived from (0–100).
    #[serde(rename = "mood")]
    pub mood_value: f64,
    /// Arousal in `[0, 1]`.
    #[serde(rename = "arousal")]
    pub arousal_level: f64,
    /// Valence in `[-1, 1]`.
    pub valence: f64,
}

impl EmotionalState {
    /// Same numeric reading with a different categorical label.
    #[must_use]
    pub fn with_label(&self, emotion: EmotionType, intensity: Intensity) -> Self {
        Self {
            primary_emotion: emotion,
            intensity,
            ..*self
        }
    }

    /// Relabel from wire strings. Unrecognised labels leave the
    /// corresponding field unchanged.
    #[must_use]
    pub fn relabeled(&self, emotion: &str, intensity: &str) -> Self {
        self.with_label(
            emotion.parse().unwrap_or(self.primary_emotion),
            intensity.parse().unwrap_or(self.intensity),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_ids_round_trip_through_catalogue() {
        for (i, action) in PetAction::ALL.iter().enumerate() {
            assert_eq!(usize::from(action.id()), i);
            assert_eq!(PetAction::from_id(action.id()).ok(), Some(*action));
        }
        assert!(matches!(
            PetAction::from_id(8),
            Err(PawprintError::InvalidAction(8))
        ));
    }

    #[test]
    fn action_serializes_as_wire_id() {
        let json = serde_json::to_string(&PetAction::Groom).unwrap_or_default();
        assert_eq!(json, "4");
        let back: PetAction = serde_json::from_str("7").unwrap_or(PetAction::Idle);
        assert_eq!(back, PetAction::MeowAtBowl);
        assert!(serde_json::from_str::<PetAction>("9").is_err());
    }

    #[test]
    fn emotion_labels_parse_case_insensitively() {
        assert_eq!("Sleepy".parse::<EmotionType>().ok(), Some(EmotionType::Sleepy));
        assert_eq!(" scared ".parse::<EmotionType>().ok(), Some(EmotionType::Scared));
        assert!("melancholy".parse::<EmotionType>().is_err());
    }

    #[test]
    fn relabel_falls_back_on_unknown_labels() {
        let state = EmotionalState {
            primary_emotion: EmotionType::Happy,
            intensity: Intensity::Strong,
            mood_value: 80.0,
            arousal_level: 0.5,
            valence: 0.6,
        };
        let relabeled = state.relabeled("sleepy", "nonsense");
        assert_eq!(relabeled.primary_emotion, EmotionType::Sleepy);
        assert_eq!(relabeled.intensity, Intensity::Strong);
        assert!((relabeled.mood_value - 80.0).abs() < f64::EPSILON);

        let untouched = state.relabeled("grumbly", "intense");
        assert_eq!(untouched.primary_emotion, EmotionType::Happy);
        assert_eq!(untouched.intensity, Intensity::Intense);
    }

    #[test]
    fn stimulus_intensity_buckets() {
        assert_eq!(Intensity::from_stimulus(0.9), Intensity::Intense);
        assert_eq!(Intensity::from_stimulus(0.85), Intensity::Intense);
        assert_eq!(Intensity::from_stimulus(0.6), Intensity::Strong);
        assert_eq!(Intensity::from_stimulus(0.35), Intensity::Moderate);
        assert_eq!(Intensity::from_stimulus(0.2), Intensity::Subtle);
    }

    #[test]
    fn time_of_day_parses_leniently() {
        assert_eq!("NIGHT".parse::<TimeOfDay>().ok(), Some(TimeOfDay::Night));
        assert_eq!("brunch".parse::<TimeOfDay>().ok(), Some(TimeOfDay::Unknown));
        assert!((TimeOfDay::Night.energy_modifier() - 0.7).abs() < f64::EPSILON);
        assert!((TimeOfDay::Unknown.energy_modifier() - 1.0).abs() < f64::EPSILON);
    }
}
