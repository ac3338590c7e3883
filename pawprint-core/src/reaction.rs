//! Reaction System: scripted responses to the outside world.
//!
//! A [`Stimulus`] (being petted, a loud noise, a bowl refill...) meeting the
//! pet's current emotion may produce a [`ReactionModifier`]: an action bias
//! or hard override, a mood delta, and animation/sound hints for the client.
//!
//! Lookup is two-stage: an exact `(stimulus, emotion)` rule first, then a
//! generic per-stimulus fallback. A found reaction only fires if a uniform
//! roll clears `probability × stimulus.intensity`; not firing is the normal
//! case, not an error.

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use rand::distributions::{Distribution, WeightedIndex};
use serde::{Deserialize, Serialize};

use crate::error::{PawprintError, Result};
use crate::rules::{Rule, first_match};
use crate::types::{EmotionType, EmotionalState, Intensity, PetAction, Seconds};

/// Chance that a weighted reaction actually resamples the action.
pub const WEIGHTED_RESAMPLE_CHANCE: f64 = 0.8;

// ---------------------------------------------------------------------------
// Stimuli
// ---------------------------------------------------------------------------

/// Kinds of environmental events a pet can react to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StimulusType {
    /// Player walks toward the pet.
    PlayerApproach,
    /// Player is petting the pet.
    PlayerPet,
    /// Player is calling the pet.
    PlayerCall,
    /// Something loud happened.
    LoudNoise,
    /// A new toy appeared.
    NewToy,
    /// The food bowl was refilled.
    FoodRefill,
    /// A door opened.
    DoorOpen,
    /// Something moved suddenly.
    SuddenMovement,
    /// A stranger is around.
    UnknownPerson,
}

impl StimulusType {
    /// Every stimulus kind.
    pub const ALL: [Self; 9] = [
        Self::PlayerApproach,
        Self::PlayerPet,
        Self::PlayerCall,
        Self::LoudNoise,
        Self::NewToy,
        Self::FoodRefill,
        Self::DoorOpen,
        Self::SuddenMovement,
        Self::UnknownPerson,
    ];

    /// Wire label.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::PlayerApproach => "player_approach",
            Self::PlayerPet => "player_pet",
            Self::PlayerCall => "player_call",
            Self::LoudNoise => "loud_noise",
            Self::NewToy => "new_toy",
            Self::FoodRefill => "food_refill",
            Self::DoorOpen => "door_open",
            Self::SuddenMovement => "sudden_movement",
            Self::UnknownPerson => "unknown_person",
        }
    }

    /// Emotion shown on the reaction axis when the reaction names none.
    #[must_use]
    pub fn default_emotion(self) -> EmotionType {
        match self {
            Self::PlayerPet => EmotionType::Affectionate,
            Self::PlayerCall | Self::PlayerApproach | Self::DoorOpen => EmotionType::Curious,
            Self::LoudNoise => EmotionType::Scared,
            Self::NewToy => EmotionType::Playful,
            Self::FoodRefill => EmotionType::Excited,
            Self::SuddenMovement | Self::UnknownPerson => EmotionType::Anxious,
        }
    }

    /// Stimuli that may bypass emotional hysteresis when strong enough.
    #[must_use]
    pub fn is_urgent_kind(self) -> bool {
        matches!(
            self,
            Self::LoudNoise | Self::SuddenMovement | Self::FoodRefill
        )
    }
}

impl FromStr for StimulusType {
    type Err = PawprintError;

    fn from_str(s: &str) -> Result<Self> {
        let needle = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|t| t.label() == needle)
            .ok_or_else(|| PawprintError::unknown_label("stimulus", s))
    }
}

impl fmt::Display for StimulusType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single event extracted from a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Stimulus {
    /// What happened.
    #[serde(rename = "type")]
    pub kind: StimulusType,
    /// How strongly, in `[0, 1]`.
    pub intensity: f64,
    /// When it was observed.
    pub timestamp: Seconds,
}

impl Stimulus {
    /// Create a stimulus, clamping intensity to `[0, 1]`.
    #[must_use]
    pub fn new(kind: StimulusType, intensity: f64, timestamp: Seconds) -> Self {
        let intensity = if intensity.is_finite() {
            intensity.clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self {
            kind,
            intensity,
            timestamp,
        }
    }
}

// ---------------------------------------------------------------------------
// Reaction modifiers
// ---------------------------------------------------------------------------

/// What a fired reaction does to the pet.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReactionModifier {
    /// Hard action override; wins unconditionally.
    pub action_override: Option<PetAction>,
    /// Weighted action bias, resampled with [`WEIGHTED_RESAMPLE_CHANCE`].
    pub action_probabilities: &'static [(PetAction, f64)],
    /// Change applied to mood by the caller.
    pub mood_delta: f64,
    /// Change applied to energy by the caller.
    pub energy_delta: f64,
    /// Added to the mood-axis arousal on the reaction overlay.
    pub arousal_boost: f64,
    /// Animation the client should play.
    pub animation_hint: Option<&'static str>,
    /// Sound the client should play.
    pub sound_hint: Option<&'static str>,
    /// Base firing probability before intensity scaling.
    pub probability: f64,
    /// Emotion forced onto the reaction axis.
    pub reaction_emotion: Option<EmotionType>,
    /// Intensity forced onto the reaction axis.
    pub reaction_intensity: Option<Intensity>,
    /// Overlay lifetime in seconds; zero derives it from stimulus intensity.
    pub reaction_duration: Seconds,
}

impl ReactionModifier {
    /// A reaction that does nothing but fire with `probability`.
    #[must_use]
    pub const fn new(probability: f64) -> Self {
        Self {
            action_override: None,
            action_probabilities: &[],
            mood_delta: 0.0,
            energy_delta: 0.0,
            arousal_boost: 0.0,
            animation_hint: None,
            sound_hint: None,
            probability,
            reaction_emotion: None,
            reaction_intensity: None,
            reaction_duration: 0.0,
        }
    }

    /// Force a specific action.
    #[must_use]
    pub const fn overriding(mut self, action: PetAction) -> Self {
        self.action_override = Some(action);
        self
    }

    /// Bias toward weighted actions.
    #[must_use]
    pub const fn weighted(mut self, weights: &'static [(PetAction, f64)]) -> Self {
        self.action_probabilities = weights;
        self
    }

    /// Mood change.
    #[must_use]
    pub const fn mood(mut self, delta: f64) -> Self {
        self.mood_delta = delta;
        self
    }

    /// Energy change.
    #[must_use]
    pub const fn energy(mut self, delta: f64) -> Self {
        self.energy_delta = delta;
        self
    }

    /// Arousal boost for the overlay.
    #[must_use]
    pub const fn arousal(mut self, boost: f64) -> Self {
        self.arousal_boost = boost;
        self
    }

    /// Animation hint.
    #[must_use]
    pub const fn animation(mut self, hint: &'static str) -> Self {
        self.animation_hint = Some(hint);
        self
    }

    /// Sound hint.
    #[must_use]
    pub const fn sound(mut self, hint: &'static str) -> Self {
        self.sound_hint = Some(hint);
        self
    }

    /// Overlay emotion, intensity and lifetime.
    #[must_use]
    pub const fn overlay(
        mut self,
        emotion: EmotionType,
        intensity: Option<Intensity>,
        duration: Seconds,
    ) -> Self {
        self.reaction_emotion = Some(emotion);
        self.reaction_intensity = intensity;
        self.reaction_duration = duration;
        self
    }
}

/// One row of a reaction table. `emotion: None` marks a per-stimulus fallback.
#[derive(Debug, Clone, Copy)]
pub struct ReactionRule {
    /// Stimulus this rule answers.
    pub stimulus: StimulusType,
    /// Emotion this rule requires, if any.
    pub emotion: Option<EmotionType>,
    /// Reaction produced.
    pub reaction: ReactionModifier,
}

impl ReactionRule {
    const fn exact(
        stimulus: StimulusType,
        emotion: EmotionType,
        reaction: ReactionModifier,
    ) -> Self {
        Self {
            stimulus,
            emotion: Some(emotion),
            reaction,
        }
    }

    const fn fallback(stimulus: StimulusType, reaction: ReactionModifier) -> Self {
        Self {
            stimulus,
            emotion: None,
            reaction,
        }
    }
}

impl Rule<(StimulusType, EmotionType)> for ReactionRule {
    type Output = ReactionModifier;

    fn matches(&self, &(stimulus, emotion): &(StimulusType, EmotionType)) -> bool {
        self.stimulus == stimulus && self.emotion.is_none_or(|e| e == emotion)
    }

    fn output(&self) -> ReactionModifier {
        self.reaction
    }
}

use EmotionType as E;
use PetAction as A;
use StimulusType as S;

/// Exact `(stimulus, emotion)` reactions.
pub const REACTION_RULES: [ReactionRule; 19] = [
    ReactionRule::exact(
        S::PlayerPet,
        E::Happy,
        ReactionModifier::new(0.85)
            .weighted(&[(A::Groom, 0.6), (A::Idle, 0.3)])
            .mood(15.0)
            .animation("purr")
            .sound("purr"),
    ),
    ReactionRule::exact(
        S::PlayerPet,
        E::Content,
        ReactionModifier::new(0.7)
            .weighted(&[(A::Groom, 0.5), (A::Idle, 0.4)])
            .mood(10.0)
            .animation("purr")
            .sound("purr_soft"),
    ),
    ReactionRule::exact(
        S::PlayerPet,
        E::Grumpy,
        ReactionModifier::new(0.6)
            .weighted(&[(A::Idle, 0.5)])
            .mood(-5.0)
            .animation("tail_flick")
            .sound("meow_annoyed"),
    ),
    ReactionRule::exact(
        S::PlayerPet,
        E::Sleepy,
        ReactionModifier::new(0.8)
            .weighted(&[(A::Idle, 0.7), (A::Sleep, 0.2)])
            .mood(-2.0)
            .animation("ear_twitch"),
    ),
    ReactionRule::exact(
        S::LoudNoise,
        E::Content,
        ReactionModifier::new(0.9)
            .weighted(&[(A::Idle, 0.7)])
            .mood(-15.0)
            .energy(-5.0)
            .arousal(0.3)
            .animation("startle"),
    ),
    ReactionRule::exact(
        S::LoudNoise,
        E::Anxious,
        ReactionModifier::new(0.95)
            .weighted(&[(A::Idle, 0.5)])
            .mood(-25.0)
            .energy(-10.0)
            .arousal(0.5)
            .animation("hide")
            .sound("hiss"),
    ),
    ReactionRule::exact(
        S::LoudNoise,
        E::Scared,
        ReactionModifier::new(1.0)
            .overriding(A::Idle)
            .mood(-30.0)
            .arousal(0.7)
            .animation("run_hide"),
    ),
    ReactionRule::exact(
        S::NewToy,
        E::Playful,
        ReactionModifier::new(0.8)
            .weighted(&[(A::MoveToToy, 0.7), (A::Play, 0.2)])
            .mood(20.0)
            .arousal(0.3)
            .animation("excited")
            .sound("meow_excited"),
    ),
    ReactionRule::exact(
        S::NewToy,
        E::Curious,
        ReactionModifier::new(0.7)
            .weighted(&[(A::Explore, 0.5), (A::MoveToToy, 0.3)])
            .mood(10.0)
            .arousal(0.2)
            .animation("investigate"),
    ),
    ReactionRule::exact(
        S::NewToy,
        E::Sleepy,
        ReactionModifier::new(0.3)
            .weighted(&[(A::Idle, 0.6), (A::Sleep, 0.3)])
            .mood(2.0)
            .animation("lazy_look"),
    ),
    ReactionRule::exact(
        S::FoodRefill,
        E::Hungry,
        ReactionModifier::new(0.95)
            .weighted(&[(A::MoveToFood, 0.8), (A::MeowAtBowl, 0.1)])
            .mood(25.0)
            .arousal(0.4)
            .animation("run_to_food")
            .sound("meow_happy"),
    ),
    ReactionRule::exact(
        S::FoodRefill,
        E::Demanding,
        ReactionModifier::new(1.0)
            .weighted(&[(A::MoveToFood, 0.9)])
            .mood(20.0)
            .arousal(0.5)
            .animation("rush_food")
            .sound("meow_urgent"),
    ),
    ReactionRule::exact(
        S::FoodRefill,
        E::Content,
        ReactionModifier::new(0.5)
            .weighted(&[(A::MoveToFood, 0.4), (A::Idle, 0.4)])
            .mood(5.0)
            .animation("casual_approach"),
    ),
    ReactionRule::exact(
        S::PlayerCall,
        E::Affectionate,
        ReactionModifier::new(0.8)
            .weighted(&[(A::Idle, 0.5)])
            .mood(10.0)
            .animation("come_running")
            .sound("meow_response"),
    ),
    ReactionRule::exact(
        S::PlayerCall,
        E::Playful,
        ReactionModifier::new(0.7)
            .weighted(&[(A::Play, 0.4), (A::Idle, 0.3)])
            .mood(12.0)
            .animation("playful_approach")
            .sound("chirp"),
    ),
    ReactionRule::exact(
        S::PlayerCall,
        E::Grumpy,
        ReactionModifier::new(0.6)
            .weighted(&[(A::Idle, 0.7)])
            .mood(-3.0)
            .animation("ignore"),
    ),
    ReactionRule::exact(
        S::PlayerApproach,
        E::Affectionate,
        ReactionModifier::new(0.7)
            .weighted(&[(A::Idle, 0.5), (A::Groom, 0.3)])
            .mood(8.0)
            .animation("rub_legs")
            .sound("purr"),
    ),
    ReactionRule::exact(
        S::PlayerApproach,
        E::Scared,
        ReactionModifier::new(0.8)
            .weighted(&[(A::Idle, 0.8)])
            .mood(-10.0)
            .animation("back_away"),
    ),
    ReactionRule::exact(
        S::SuddenMovement,
        E::Anxious,
        ReactionModifier::new(0.8)
            .weighted(&[(A::Idle, 0.7)])
            .mood(-12.0)
            .arousal(0.3)
            .animation("alert"),
    ),
];

/// Generic per-stimulus reactions used when no exact rule matches.
pub const FALLBACK_REACTIONS: [ReactionRule; 4] = [
    ReactionRule::fallback(
        S::PlayerPet,
        ReactionModifier::new(0.5).mood(5.0).animation("acknowledge"),
    ),
    ReactionRule::fallback(
        S::LoudNoise,
        ReactionModifier::new(0.7)
            .mood(-10.0)
            .arousal(0.2)
            .animation("ears_back"),
    ),
    ReactionRule::fallback(
        S::NewToy,
        ReactionModifier::new(0.4).mood(5.0).animation("glance"),
    ),
    ReactionRule::fallback(
        S::FoodRefill,
        ReactionModifier::new(0.6).mood(8.0).animation("look_at_food"),
    ),
];

/// Table lookup without the probability gate.
#[must_use]
pub fn lookup(stimulus: StimulusType, emotion: EmotionType) -> Option<ReactionModifier> {
    let key = (stimulus, emotion);
    first_match(&REACTION_RULES, &key).or_else(|| first_match(&FALLBACK_REACTIONS, &key))
}

/// Roll the firing gate for `reaction` under `stimulus`.
pub fn fires<R: Rng + ?Sized>(
    reaction: &ReactionModifier,
    stimulus: &Stimulus,
    rng: &mut R,
) -> bool {
    let p = reaction.probability * stimulus.intensity;
    if !p.is_finite() {
        return false;
    }
    rng.gen_bool(p.clamp(0.0, 1.0))
}

/// Find and roll the reaction for `stimulus` given the current emotion.
pub fn get_reaction<R: Rng + ?Sized>(
    stimulus: &Stimulus,
    emotional_state: &EmotionalState,
    rng: &mut R,
) -> Option<ReactionModifier> {
    let reaction = lookup(stimulus.kind, emotional_state.primary_emotion)?;
    fires(&reaction, stimulus, rng).then_some(reaction)
}

/// Resolve the action a fired reaction leads to.
pub fn apply_reaction<R: Rng + ?Sized>(
    base_action: PetAction,
    reaction: &ReactionModifier,
    rng: &mut R,
) -> PetAction {
    if let Some(action) = reaction.action_override {
        return action;
    }

    if reaction.action_probabilities.is_empty() || !rng.gen_bool(WEIGHTED_RESAMPLE_CHANCE) {
        return base_action;
    }

    // WeightedIndex normalises the weights itself.
    match WeightedIndex::new(reaction.action_probabilities.iter().map(|(_, w)| *w)) {
        Ok(dist) => reaction.action_probabilities[dist.sample(rng)].0,
        Err(_) => base_action,
    }
}
