//! Pet Behavior Modification: the noise model on top of the policy.
//!
//! A trained policy is deterministic and a deterministic cat is a boring
//! cat. This module layers small, bounded randomness over the policy's
//! choice:
//!
//! - **Quirks**: occasional grooming, wandering or bowl-meowing out of nowhere
//! - **Noise**: low-confidence predictions get swapped for another action
//! - **Mind changes**: a cat may abandon what it was doing
//! - **Attention span**: how long a cat sticks with an activity
//! - **Distractions**: breaking up repetitive loops
//! - **Patterns**: named behavioral moods ("zoomies", "lazy sunday")
//!
//! Every random decision goes through a caller-supplied [`rand::Rng`] so
//! tests can seed it.

use rand::Rng;
use rand::distributions::{Distribution, WeightedIndex};
use rand::seq::SliceRandom;

use crate::types::{PetAction, TimeOfDay};

// ---------------------------------------------------------------------------
// Quirks
// ---------------------------------------------------------------------------

/// Maybe inject an idle quirk. Candidates are tried in order, each with its
/// own independent roll; the first success wins.
pub fn random_quirk_action<R: Rng + ?Sized>(
    mood: f64,
    energy: f64,
    rng: &mut R,
) -> Option<PetAction> {
    let mut quirks = vec![
        (PetAction::Groom, 0.05),
        (PetAction::Explore, 0.03),
        (PetAction::MeowAtBowl, 0.02),
    ];

    if mood > 70.0 {
        quirks.push((PetAction::Play, 0.04));
    }
    if energy < 40.0 {
        quirks.push((PetAction::Sleep, 0.06));
    }

    quirks
        .into_iter()
        .find(|&(_, probability)| rng.gen_bool(probability))
        .map(|(action, _)| action)
}

// ---------------------------------------------------------------------------
// Stochastic adjustments
// ---------------------------------------------------------------------------

/// Randomness applied before confidence scaling.
fn base_randomness(mood: f64) -> f64 {
    if mood < 30.0 {
        0.3
    } else if mood > 80.0 {
        0.25
    } else {
        0.2
    }
}

/// Probability that [`add_noise_to_prediction`] swaps the action.
#[must_use]
pub fn effective_randomness(confidence: f64, mood: f64) -> f64 {
    let p = base_randomness(mood) * (1.0 - confidence);
    if p.is_nan() {
        0.0
    } else {
        p.clamp(0.0, 1.0)
    }
}

/// With a small mood- and confidence-dependent chance, replace the action
/// with a uniformly random *different* one.
pub fn add_noise_to_prediction<R: Rng + ?Sized>(
    base_action: PetAction,
    confidence: f64,
    mood: f64,
    rng: &mut R,
) -> PetAction {
    if !rng.gen_bool(effective_randomness(confidence, mood)) {
        return base_action;
    }

    let others: Vec<PetAction> = PetAction::ALL
        .into_iter()
        .filter(|a| *a != base_action)
        .collect();
    others.choose(rng).copied().unwrap_or(base_action)
}

/// Whether a cat drops `current_action` in favour of `new_action`.
pub fn should_change_mind<R: Rng + ?Sized>(
    current_action: PetAction,
    new_action: PetAction,
    mood: f64,
    personality_playful: f64,
    rng: &mut R,
) -> bool {
    if current_action == new_action {
        return false;
    }

    let mut chance = 0.05;
    if mood > 70.0 {
        chance += 0.05;
    }
    chance += personality_playful / 100.0 * 0.1;

    rng.gen_bool(chance.clamp(0.0, 1.0))
}

/// Multiplier on how long the cat sticks with an activity (1.0 = normal).
#[must_use]
pub fn attention_span_modifier(energy: f64, mood: f64, personality_lazy: f64) -> f64 {
    let mut span = 1.0;

    if energy < 30.0 {
        span *= 0.7;
    } else if energy > 70.0 {
        span *= 1.2;
    }

    if mood < 40.0 {
        span *= 0.8;
    }

    let lazy_factor = personality_lazy / 100.0 * 0.3;
    span * (1.0 - lazy_factor)
}

/// Actions a distracted cat falls back to.
pub const DISTRACTION_ACTIONS: [PetAction; 3] =
    [PetAction::Explore, PetAction::Idle, PetAction::Groom];

/// In a rich environment, sometimes get distracted into exploring, idling
/// or grooming. Fires with probability `environment_richness × 0.1`.
pub fn introduce_distraction<R: Rng + ?Sized>(
    base_action: PetAction,
    environment_richness: f64,
    rng: &mut R,
) -> PetAction {
    let chance = environment_richness * 0.1;
    if chance.is_nan() || !rng.gen_bool(chance.clamp(0.0, 1.0)) {
        return base_action;
    }
    DISTRACTION_ACTIONS.choose(rng).copied().unwrap_or(base_action)
}

// ---------------------------------------------------------------------------
// Behavior patterns
// ---------------------------------------------------------------------------

/// A named behavioral mood with gates and a weighted action mix.
#[derive(Debug, Clone, Copy)]
pub struct BehaviorPattern {
    /// Pattern name.
    pub name: &'static str,
    /// Actions and their relative weights.
    pub actions: &'static [(PetAction, f64)],
    /// Minimum mood.
    pub min_mood: f64,
    /// Maximum mood.
    pub max_mood: f64,
    /// Minimum energy.
    pub min_energy: f64,
    /// Part of the day the pattern belongs to, if any.
    pub time_preference: Option<TimeOfDay>,
}

impl BehaviorPattern {
    /// Whether the pattern applies right now.
    #[must_use]
    pub fn applies(&self, mood: f64, energy: f64, time_of_day: TimeOfDay) -> bool {
        mood >= self.min_mood
            && mood <= self.max_mood
            && energy >= self.min_energy
            && self.time_preference.is_none_or(|t| t == time_of_day)
    }
}

/// The pattern library.
pub const PATTERNS: [BehaviorPattern; 5] = [
    BehaviorPattern {
        name: "zoomies",
        actions: &[
            (PetAction::Explore, 0.5),
            (PetAction::Play, 0.3),
            (PetAction::MoveToToy, 0.2),
        ],
        min_mood: 60.0,
        max_mood: 100.0,
        min_energy: 60.0,
        time_preference: None,
    },
    BehaviorPattern {
        name: "lazy_sunday",
        actions: &[
            (PetAction::Sleep, 0.5),
            (PetAction::Idle, 0.3),
            (PetAction::Groom, 0.2),
        ],
        min_mood: 0.0,
        max_mood: 50.0,
        min_energy: 0.0,
        time_preference: Some(TimeOfDay::Afternoon),
    },
    BehaviorPattern {
        name: "midnight_madness",
        actions: &[
            (PetAction::Explore, 0.4),
            (PetAction::MeowAtBowl, 0.3),
            (PetAction::Play, 0.3),
        ],
        min_mood: 0.0,
        max_mood: 100.0,
        min_energy: 40.0,
        time_preference: Some(TimeOfDay::Night),
    },
    BehaviorPattern {
        name: "morning_routine",
        actions: &[
            (PetAction::MeowAtBowl, 0.4),
            (PetAction::Groom, 0.3),
            (PetAction::MoveToFood, 0.3),
        ],
        min_mood: 0.0,
        max_mood: 100.0,
        min_energy: 0.0,
        time_preference: Some(TimeOfDay::Morning),
    },
    BehaviorPattern {
        name: "food_obsession",
        actions: &[
            (PetAction::MoveToFood, 0.6),
            (PetAction::MeowAtBowl, 0.3),
            (PetAction::Idle, 0.1),
        ],
        min_mood: 30.0,
        max_mood: 100.0,
        min_energy: 0.0,
        time_preference: None,
    },
];

/// Patterns whose gates pass, in library order.
#[must_use]
pub fn matching_patterns(
    mood: f64,
    energy: f64,
    time_of_day: TimeOfDay,
) -> Vec<&'static BehaviorPattern> {
    PATTERNS
        .iter()
        .filter(|p| p.applies(mood, energy, time_of_day))
        .collect()
}

/// Draw one action from a pattern's weighted mix.
pub fn sample_pattern_action<R: Rng + ?Sized>(
    pattern: &BehaviorPattern,
    rng: &mut R,
) -> Option<PetAction> {
    let dist = WeightedIndex::new(pattern.actions.iter().map(|(_, w)| *w)).ok()?;
    Some(pattern.actions[dist.sample(rng)].0)
}
