//! Pet State Registry: one evictable bundle of mutable state per pet.
//!
//! The engine only asks for "the state of pet X" through [`PetStateStore`].
//! The default [`LruPetRegistry`] bounds memory with an LRU capacity and
//! drops pets that have been idle longer than the configured TTL.
//!
//! Locking: the registry lock is held only for lookup and insert. Each
//! bundle has its own `parking_lot::Mutex`, so two pets are processed in
//! parallel while two requests for the same pet serialize.

use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use parking_lot::Mutex;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::config::RegistryConfig;
use crate::memory::CatMemory;
use crate::stabilizer::AxisPersistenceState;
use crate::types::Seconds;
use crate::visual::ReactionAxisState;

/// Everything the engine mutates for one pet.
#[derive(Debug)]
pub struct PetState {
    /// Recent actions, moods and interactions.
    pub memory: CatMemory,
    /// Hysteresis for the base axis.
    pub base_axis: AxisPersistenceState,
    /// Hysteresis for the mood axis.
    pub mood_axis: AxisPersistenceState,
    /// Open reaction overlay, if any.
    pub reaction: Option<ReactionAxisState>,
    /// Smoothed mood, `None` before the first request.
    pub mood_ema: Option<f64>,
    /// This pet's random source.
    pub rng: StdRng,
}

impl PetState {
    /// Fresh state for a pet seen for the first time.
    #[must_use]
    pub fn new(memory_capacity: usize, seed: u64) -> Self {
        Self {
            memory: CatMemory::new(memory_capacity),
            base_axis: AxisPersistenceState::default(),
            mood_axis: AxisPersistenceState::default(),
            reaction: None,
            mood_ema: None,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Fold `mood` into the EMA and return the smoothed value.
    pub fn smooth_mood(&mut self, mood: f64, smoothing: f64) -> f64 {
        let ema = match self.mood_ema {
            Some(prev) => prev * (1.0 - smoothing) + mood * smoothing,
            None => mood,
        };
        self.mood_ema = Some(ema);
        ema
    }

    /// The reaction overlay if it is still showing at `now`. Expired
    /// overlays are dropped.
    pub fn active_reaction(&mut self, now: Seconds) -> Option<ReactionAxisState> {
        if self.reaction.is_some_and(|r| !r.is_active(now)) {
            self.reaction = None;
        }
        self.reaction
    }
}

/// Shared handle to one pet's state.
pub type SharedPetState = Arc<Mutex<PetState>>;

/// Result of a registry lookup.
#[derive(Debug)]
pub struct PetLookup {
    /// The pet's state.
    pub state: SharedPetState,
    /// Whether the state was created by this lookup.
    pub created: bool,
    /// Other bundles dropped to make room, or the stale bundle replaced.
    pub evicted: usize,
}

/// Where the engine keeps per-pet state.
pub trait PetStateStore: Send + Sync {
    /// State for `pet_id`, creating it with `init` if absent or expired.
    fn get_or_create(&self, pet_id: &str, now: Seconds, init: &dyn Fn() -> PetState) -> PetLookup;

    /// Drop every pet idle past the TTL. Returns how many were dropped.
    fn evict_idle(&self, now: Seconds) -> usize;

    /// Pets currently held.
    fn len(&self) -> usize;

    /// Whether no pets are held.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ---------------------------------------------------------------------------
// LRU + idle TTL
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct Slot {
    state: SharedPetState,
    last_seen: Seconds,
}

/// Bounded LRU registry with an idle TTL.
#[derive(Debug)]
pub struct LruPetRegistry {
    slots: Mutex<LruCache<String, Slot>>,
    idle_ttl: Seconds,
}

impl LruPetRegistry {
    /// Empty registry sized by `config`.
    #[must_use]
    pub fn new(config: &RegistryConfig) -> Self {
        let capacity = NonZeroUsize::new(config.capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            slots: Mutex::new(LruCache::new(capacity)),
            idle_ttl: config.idle_ttl_seconds,
        }
    }

    fn is_stale(&self, slot: &Slot, now: Seconds) -> bool {
        now - slot.last_seen > self.idle_ttl
    }
}

impl PetStateStore for LruPetRegistry {
    fn get_or_create(&self, pet_id: &str, now: Seconds, init: &dyn Fn() -> PetState) -> PetLookup {
        let mut slots = self.slots.lock();

        let mut evicted = 0;
        if let Some(slot) = slots.get_mut(pet_id) {
            if self.is_stale(slot, now) {
                slots.pop(pet_id);
                evicted += 1;
                tracing::debug!(pet_id, "idle pet state expired, starting fresh");
            } else {
                slot.last_seen = slot.last_seen.max(now);
                return PetLookup {
                    state: Arc::clone(&slot.state),
                    created: false,
                    evicted: 0,
                };
            }
        }

        let state = Arc::new(Mutex::new(init()));
        let slot = Slot {
            state: Arc::clone(&state),
            last_seen: now,
        };
        if let Some((dropped, _)) = slots.push(pet_id.to_string(), slot) {
            evicted += 1;
            tracing::debug!(pet_id = %dropped, "registry full, evicted least recently used pet");
        }

        PetLookup {
            state,
            created: true,
            evicted,
        }
    }

    fn evict_idle(&self, now: Seconds) -> usize {
        let mut slots = self.slots.lock();
        let stale: Vec<String> = slots
            .iter()
            .filter(|(_, slot)| self.is_stale(slot, now))
            .map(|(id, _)| id.clone())
            .collect();
        for id in &stale {
            slots.pop(id);
        }
        if !stale.is_empty() {
            tracing::info!(evicted = stale.len(), remaining = slots.len(), "evicted idle pets");
        }
        stale.len()
    }

    fn len(&self) -> usize {
        self.slots.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry(capacity: usize, ttl: Seconds) -> LruPetRegistry {
        LruPetRegistry::new(&RegistryConfig {
            capacity,
            idle_ttl_seconds: ttl,
            ..RegistryConfig::default()
        })
    }

    fn fresh() -> PetState {
        PetState::new(50, 7)
    }

    #[test]
    fn same_id_returns_same_state() {
        let reg = registry(4, 100.0);
        let a = reg.get_or_create("tom", 0.0, &fresh);
        let b = reg.get_or_create("tom", 1.0, &fresh);
        assert!(a.created);
        assert!(!b.created);
        assert!(Arc::ptr_eq(&a.state, &b.state));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn capacity_evicts_least_recently_used() {
        let reg = registry(2, 1_000.0);
        let tom = reg.get_or_create("tom", 0.0, &fresh);
        reg.get_or_create("felix", 1.0, &fresh);
        // Touch tom so felix becomes least recently used.
        reg.get_or_create("tom", 2.0, &fresh);
        let garfield = reg.get_or_create("garfield", 3.0, &fresh);
        assert_eq!(garfield.evicted, 1);
        assert_eq!(reg.len(), 2);

        let tom_again = reg.get_or_create("tom", 4.0, &fresh);
        assert!(Arc::ptr_eq(&tom.state, &tom_again.state));
        assert!(reg.get_or_create("felix", 5.0, &fresh).created);
    }

    #[test]
    fn idle_pet_starts_fresh() {
        let reg = registry(4, 10.0);
        let first = reg.get_or_create("tom", 0.0, &fresh);
        first.state.lock().mood_ema = Some(80.0);

        let kept = reg.get_or_create("tom", 10.0, &fresh);
        assert!(!kept.created);

        let renewed = reg.get_or_create("tom", 25.0, &fresh);
        assert!(renewed.created);
        assert_eq!(renewed.evicted, 1);
        assert!(renewed.state.lock().mood_ema.is_none());
    }

    #[test]
    fn sweep_drops_only_idle_pets() {
        let reg = registry(8, 10.0);
        reg.get_or_create("tom", 0.0, &fresh);
        reg.get_or_create("felix", 15.0, &fresh);
        assert_eq!(reg.evict_idle(20.0), 1);
        assert_eq!(reg.len(), 1);
        assert!(!reg.is_empty());
    }

    #[test]
    fn mood_ema_seeds_then_smooths() {
        let mut pet = fresh();
        assert!((pet.smooth_mood(50.0, 0.2) - 50.0).abs() < f64::EPSILON);
        assert!((pet.smooth_mood(100.0, 0.2) - 60.0).abs() < 1e-9);
    }

    #[test]
    fn expired_reaction_is_dropped() {
        let mut pet = fresh();
        pet.reaction = Some(ReactionAxisState {
            emotion: crate::types::EmotionType::Scared,
            intensity: crate::types::Intensity::Strong,
            arousal: 0.9,
            valence: -0.8,
            updated_at: 0.0,
            expires_at: 5.0,
        });
        assert!(pet.active_reaction(4.0).is_some());
        assert!(pet.active_reaction(5.0).is_none());
        assert!(pet.reaction.is_none());
    }
}
