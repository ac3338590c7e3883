//! The fixed-layout observation vector the policy consumes.
//!
//! ```text
//!  0 hunger          5 lazy_score
//!  1 energy          6 foodie_score
//!  2 distance_food   7 playful_score
//!  3 distance_toy    8 bowl_empty   (0/1)
//!  4 mood            9 bowl_tipped  (0/1)
//! ```

use pawprint_core::PetSnapshot;
use serde::{Deserialize, Serialize};

use crate::personality::Personality;
use crate::profile::ProfileModifiers;

/// Slot indices into an [`Observation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(usize)]
pub enum ObservationIndex {
    /// Hunger.
    Hunger = 0,
    /// Energy.
    Energy = 1,
    /// Distance to food.
    DistanceFood = 2,
    /// Distance to toy.
    DistanceToy = 3,
    /// Mood.
    Mood = 4,
    /// Laziness drift.
    LazyScore = 5,
    /// Food-focus drift.
    FoodieScore = 6,
    /// Playfulness drift.
    PlayfulScore = 7,
    /// Bowl empty flag.
    IsBowlEmpty = 8,
    /// Bowl tipped flag.
    IsBowlTipped = 9,
}

/// Number of slots in an observation.
pub const OBSERVATION_LEN: usize = 10;

/// Policy input.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation(pub [f32; OBSERVATION_LEN]);

impl Observation {
    /// Lay out a snapshot.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn from_snapshot(snapshot: &PetSnapshot) -> Self {
        let flag = |b: bool| if b { 1.0 } else { 0.0 };
        Self([
            snapshot.hunger as f32,
            snapshot.energy as f32,
            snapshot.distance_to_food as f32,
            snapshot.distance_to_toy as f32,
            snapshot.mood as f32,
            snapshot.lazy_score as f32,
            snapshot.foodie_score as f32,
            snapshot.playful_score as f32,
            flag(snapshot.is_bowl_empty),
            flag(snapshot.is_bowl_tipped),
        ])
    }

    /// Read one slot.
    #[must_use]
    pub fn get(&self, index: ObservationIndex) -> f32 {
        self.0[index as usize]
    }

    fn scale(&mut self, index: ObservationIndex, by: f32) {
        self.0[index as usize] *= by;
    }

    /// Scale needs and distances by the personality's multipliers.
    #[must_use]
    pub fn with_personality(mut self, personality: Personality) -> Self {
        let m = personality.multipliers();
        self.scale(ObservationIndex::Hunger, m.hunger);
        self.scale(ObservationIndex::Energy, m.energy);
        self.scale(ObservationIndex::DistanceFood, m.distance_food);
        self.scale(ObservationIndex::DistanceToy, m.distance_toy);
        self
    }

    /// Scale by a cat's individual profile modifiers.
    #[must_use]
    pub fn with_profile(mut self, modifiers: &ProfileModifiers) -> Self {
        self.scale(ObservationIndex::Hunger, modifiers.hunger);
        self.scale(ObservationIndex::Energy, modifiers.energy);
        self.scale(ObservationIndex::DistanceFood, modifiers.distance_food);
        self.scale(ObservationIndex::DistanceToy, modifiers.distance_toy);
        self.scale(ObservationIndex::Mood, modifiers.mood);
        self.scale(ObservationIndex::LazyScore, modifiers.lazy_score);
        self.scale(ObservationIndex::FoodieScore, modifiers.foodie_score);
        self.scale(ObservationIndex::PlayfulScore, modifiers.playful_score);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> PetSnapshot {
        PetSnapshot {
            hunger: 40.0,
            energy: 60.0,
            distance_to_food: 2.0,
            distance_to_toy: 8.0,
            mood: 70.0,
            is_bowl_tipped: true,
            ..PetSnapshot::default()
        }
    }

    #[test]
    fn slots_follow_fixed_layout() {
        let obs = Observation::from_snapshot(&snapshot());
        assert!((obs.get(ObservationIndex::Hunger) - 40.0).abs() < f32::EPSILON);
        assert!((obs.get(ObservationIndex::DistanceToy) - 8.0).abs() < f32::EPSILON);
        assert!((obs.get(ObservationIndex::Mood) - 70.0).abs() < f32::EPSILON);
        assert!(obs.get(ObservationIndex::IsBowlEmpty).abs() < f32::EPSILON);
        assert!((obs.get(ObservationIndex::IsBowlTipped) - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn foodie_feels_hungrier_and_closer_to_food() {
        let obs = Observation::from_snapshot(&snapshot()).with_personality(Personality::Foodie);
        assert!((obs.get(ObservationIndex::Hunger) - 56.0).abs() < 1e-4);
        assert!((obs.get(ObservationIndex::DistanceFood) - 1.4).abs() < 1e-4);
        assert!((obs.get(ObservationIndex::Mood) - 70.0).abs() < f32::EPSILON);
    }

    #[test]
    fn profile_scales_every_continuous_slot() {
        let modifiers = ProfileModifiers::uniform(1.05);
        let obs = Observation::from_snapshot(&snapshot()).with_profile(&modifiers);
        assert!((obs.get(ObservationIndex::Energy) - 63.0).abs() < 1e-4);
        assert!((obs.get(ObservationIndex::Mood) - 73.5).abs() < 1e-4);
        assert!((obs.get(ObservationIndex::IsBowlTipped) - 1.0).abs() < f32::EPSILON);
    }
}
