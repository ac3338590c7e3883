//! Per-cat profiles: small, stable individual differences.
//!
//! Two cats with the same personality should still not behave identically.
//! Each profile carries a handful of scalars near 1.0 that are derived
//! deterministically from the cat id, so recreating a cat reproduces the
//! same individual.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::{Result, ServiceError};
use crate::personality::Personality;

/// Longest accepted cat id.
pub const MAX_CAT_ID_LEN: usize = 100;

/// Individual observation scalars.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProfileModifiers {
    /// Hunger scale.
    pub hunger: f32,
    /// Energy scale.
    pub energy: f32,
    /// Food-distance scale.
    pub distance_food: f32,
    /// Toy-distance scale.
    pub distance_toy: f32,
    /// Bed-distance scale.
    pub distance_bed: f32,
    /// Mood scale.
    pub mood: f32,
    /// Laziness scale.
    pub lazy_score: f32,
    /// Food-focus scale.
    pub foodie_score: f32,
    /// Playfulness scale.
    pub playful_score: f32,
}

impl ProfileModifiers {
    /// Every scalar set to `value`.
    #[must_use]
    pub fn uniform(value: f32) -> Self {
        Self {
            hunger: value,
            energy: value,
            distance_food: value,
            distance_toy: value,
            distance_bed: value,
            mood: value,
            lazy_score: value,
            foodie_score: value,
            playful_score: value,
        }
    }

    /// Draw every scalar uniformly from `[min, max]`, rounded to three
    /// decimals, from a generator seeded with `seed`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn generate(seed: u64, min: f64, max: f64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let (lo, hi) = if min <= max { (min, max) } else { (max, min) };
        let mut scale = || ((rng.gen_range(lo..=hi) * 1000.0).round() / 1000.0) as f32;
        Self {
            hunger: scale(),
            energy: scale(),
            distance_food: scale(),
            distance_toy: scale(),
            distance_bed: scale(),
            mood: scale(),
            lazy_score: scale(),
            foodie_score: scale(),
            playful_score: scale(),
        }
    }

    fn values(&self) -> [f32; 9] {
        [
            self.hunger,
            self.energy,
            self.distance_food,
            self.distance_toy,
            self.distance_bed,
            self.mood,
            self.lazy_score,
            self.foodie_score,
            self.playful_score,
        ]
    }
}

/// A cat's persistent identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatProfile {
    /// Cat id.
    pub cat_id: String,
    /// Personality chosen at creation.
    pub personality: Personality,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Seed the modifiers were drawn from.
    pub seed: u64,
    /// Individual scalars.
    pub modifiers: ProfileModifiers,
}

// ---------------------------------------------------------------------------
// Seed derivation (FNV-1a, 64-bit)
// ---------------------------------------------------------------------------

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Stable seed for a cat id.
#[must_use]
pub fn seed_from_cat_id(cat_id: &str) -> u64 {
    cat_id
        .as_bytes()
        .iter()
        .fold(FNV_OFFSET, |hash, byte| (hash ^ u64::from(*byte)).wrapping_mul(FNV_PRIME))
}

/// Reject empty and overlong ids.
///
/// # Errors
/// Returns `ServiceError::InvalidCatId`.
pub fn validate_cat_id(cat_id: &str) -> Result<()> {
    if cat_id.is_empty() || cat_id.chars().count() > MAX_CAT_ID_LEN {
        return Err(ServiceError::InvalidCatId(cat_id.to_string()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// In-memory profile store, safe to share across request handlers.
#[derive(Debug)]
pub struct ProfileStore {
    profiles: DashMap<String, CatProfile>,
    modifier_min: f64,
    modifier_max: f64,
}

impl ProfileStore {
    /// Empty store drawing modifiers from `[modifier_min, modifier_max]`.
    #[must_use]
    pub fn new(modifier_min: f64, modifier_max: f64) -> Self {
        Self {
            profiles: DashMap::new(),
            modifier_min,
            modifier_max,
        }
    }

    /// Whether `cat_id` has a profile.
    #[must_use]
    pub fn exists(&self, cat_id: &str) -> bool {
        self.profiles.contains_key(cat_id)
    }

    /// Profile for `cat_id`, if any.
    #[must_use]
    pub fn get(&self, cat_id: &str) -> Option<CatProfile> {
        self.profiles.get(cat_id).map(|p| p.clone())
    }

    /// Number of profiles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    fn build(&self, cat_id: &str, personality: Personality) -> CatProfile {
        let seed = seed_from_cat_id(cat_id);
        CatProfile {
            cat_id: cat_id.to_string(),
            personality,
            created_at: Utc::now(),
            seed,
            modifiers: ProfileModifiers::generate(seed, self.modifier_min, self.modifier_max),
        }
    }

    /// Create a profile.
    ///
    /// # Errors
    /// `InvalidCatId` for a bad id, `CatAlreadyExists` if one exists.
    pub fn create(&self, cat_id: &str, personality: Personality) -> Result<CatProfile> {
        validate_cat_id(cat_id)?;
        match self.profiles.entry(cat_id.to_string()) {
            Entry::Occupied(_) => Err(ServiceError::CatAlreadyExists(cat_id.to_string())),
            Entry::Vacant(slot) => {
                let profile = self.build(cat_id, personality);
                slot.insert(profile.clone());
                tracing::info!(
                    cat_id,
                    personality = %personality,
                    seed = profile.seed,
                    "cat profile created",
                );
                Ok(profile)
            }
        }
    }

    /// Existing profile, or a new one with `personality`.
    ///
    /// # Errors
    /// `InvalidCatId` for a bad id.
    pub fn ensure(&self, cat_id: &str, personality: Personality) -> Result<CatProfile> {
        validate_cat_id(cat_id)?;
        let profile = self
            .profiles
            .entry(cat_id.to_string())
            .or_insert_with(|| self.build(cat_id, personality));
        Ok(profile.clone())
    }

    /// Drop a profile. Returns whether one existed.
    pub fn remove(&self, cat_id: &str) -> bool {
        self.profiles.remove(cat_id).is_some()
    }

    /// Every profile as a JSON array, sorted by id.
    ///
    /// # Errors
    /// Fails only if serialization fails.
    pub fn export_json(&self) -> serde_json::Result<String> {
        let mut all: Vec<CatProfile> = self.profiles.iter().map(|p| p.value().clone()).collect();
        all.sort_by(|a, b| a.cat_id.cmp(&b.cat_id));
        serde_json::to_string_pretty(&all)
    }

    /// Load profiles from [`Self::export_json`] output, replacing any with
    /// the same id. Returns how many were loaded.
    ///
    /// # Errors
    /// `Config` if the JSON is malformed or an entry has a bad id.
    pub fn import_json(&self, json: &str) -> Result<usize> {
        let profiles: Vec<CatProfile> =
            serde_json::from_str(json).map_err(|e| ServiceError::Config(e.to_string()))?;
        for profile in &profiles {
            validate_cat_id(&profile.cat_id).map_err(|e| ServiceError::Config(e.to_string()))?;
        }
        let count = profiles.len();
        for profile in profiles {
            self.profiles.insert(profile.cat_id.clone(), profile);
        }
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> ProfileStore {
        ProfileStore::new(0.92, 1.08)
    }

    #[test]
    fn seed_is_stable_and_distinct() {
        assert_eq!(seed_from_cat_id("whiskers"), seed_from_cat_id("whiskers"));
        assert_ne!(seed_from_cat_id("whiskers"), seed_from_cat_id("whiskerz"));
        assert_eq!(seed_from_cat_id(""), FNV_OFFSET);
    }

    #[test]
    fn modifiers_stay_in_range_with_three_decimals() {
        for seed in 0..200 {
            let m = ProfileModifiers::generate(seed, 0.92, 1.08);
            for v in m.values() {
                assert!((0.919..=1.081).contains(&v), "{v}");
                let milli = f64::from(v) * 1000.0;
                assert!((milli - milli.round()).abs() < 1e-2, "{v}");
            }
        }
    }

    #[test]
    fn same_id_same_individual() {
        let a = store().create("tom", Personality::Lazy);
        let b = store().create("tom", Personality::Foodie);
        let (Ok(a), Ok(b)) = (a, b) else {
            panic!("profiles not created");
        };
        assert_eq!(a.seed, b.seed);
        assert_eq!(a.modifiers, b.modifiers);
        assert_ne!(a.personality, b.personality);
    }

    #[test]
    fn duplicate_create_is_rejected() {
        let s = store();
        assert!(s.create("tom", Personality::Balanced).is_ok());
        assert!(matches!(
            s.create("tom", Personality::Playful),
            Err(ServiceError::CatAlreadyExists(_))
        ));
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn ensure_keeps_existing_personality() {
        let s = store();
        let _ = s.create("tom", Personality::Foodie);
        let p = s.ensure("tom", Personality::Lazy).ok();
        assert_eq!(p.map(|p| p.personality), Some(Personality::Foodie));
    }

    #[test]
    fn bad_ids_are_rejected() {
        let s = store();
        assert!(matches!(s.create("", Personality::Balanced), Err(ServiceError::InvalidCatId(_))));
        let long = "x".repeat(MAX_CAT_ID_LEN + 1);
        assert!(matches!(
            s.ensure(&long, Personality::Balanced),
            Err(ServiceError::InvalidCatId(_))
        ));
    }

    #[test]
    fn export_then_import_restores_profiles() {
        let s = store();
        let _ = s.create("tom", Personality::Lazy);
        let _ = s.create("felix", Personality::Playful);
        let json = s.export_json().unwrap_or_default();

        let restored = store();
        assert_eq!(restored.import_json(&json).ok(), Some(2));
        assert_eq!(restored.get("tom"), s.get("tom"));
        assert!(restored.remove("felix"));
        assert!(!restored.exists("felix"));
    }
}
