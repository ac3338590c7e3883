//! Personality archetypes and the observation multipliers they imply.

use std::fmt;
use std::str::FromStr;

use pawprint_core::PawprintError;
use serde::{Deserialize, Serialize};

/// Coarse personality a cat is created with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Personality {
    /// No bias.
    #[default]
    Balanced,
    /// Feels less hungry and more tired; toys seem closer.
    Lazy,
    /// Food dominates.
    Foodie,
    /// Toys dominate.
    Playful,
}

/// Per-slot scalars applied to an observation before the policy sees it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PersonalityMultipliers {
    /// Hunger scale.
    pub hunger: f32,
    /// Energy scale.
    pub energy: f32,
    /// Food-distance scale.
    pub distance_food: f32,
    /// Toy-distance scale.
    pub distance_toy: f32,
}

impl Personality {
    /// Every personality.
    pub const ALL: [Self; 4] = [Self::Balanced, Self::Lazy, Self::Foodie, Self::Playful];

    /// Wire label.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Balanced => "balanced",
            Self::Lazy => "lazy",
            Self::Foodie => "foodie",
            Self::Playful => "playful",
        }
    }

    /// Observation multipliers for this personality.
    #[must_use]
    pub fn multipliers(self) -> PersonalityMultipliers {
        let (hunger, energy, distance_food, distance_toy) = match self {
            Self::Balanced => (1.0, 1.0, 1.0, 1.0),
            Self::Lazy => (0.8, 1.5, 1.1, 0.7),
            Self::Foodie => (1.4, 0.7, 0.7, 1.3),
            Self::Playful => (0.7, 0.9, 1.2, 0.6),
        };
        PersonalityMultipliers {
            hunger,
            energy,
            distance_food,
            distance_toy,
        }
    }
}

impl FromStr for Personality {
    type Err = PawprintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|p| p.label() == needle)
            .ok_or_else(|| PawprintError::UnknownLabel {
                kind: "personality",
                label: s.to_string(),
            })
    }
}

impl fmt::Display for Personality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn balanced_is_identity() {
        let m = Personality::Balanced.multipliers();
        assert_eq!((m.hunger, m.energy, m.distance_food, m.distance_toy), (1.0, 1.0, 1.0, 1.0));
    }

    #[test]
    fn lazy_cats_feel_tired() {
        let m = Personality::Lazy.multipliers();
        assert!(m.energy > 1.0);
        assert!(m.hunger < 1.0);
    }

    #[test]
    fn labels_parse_case_insensitively() {
        assert_eq!("Foodie".parse::<Personality>().ok(), Some(Personality::Foodie));
        assert_eq!(" playful ".parse::<Personality>().ok(), Some(Personality::Playful));
        assert!("grumpy".parse::<Personality>().is_err());
    }
}
