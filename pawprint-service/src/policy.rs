//! Policy seam: the black box that turns an observation into a base action.
//!
//! The engine never sees the policy; the service asks it for an action id and
//! hands the result to [`pawprint_core::ContextualBehaviorEngine`]. A trained
//! model lives behind this trait in production. [`RuleBasedPolicy`] is the
//! always-available fallback, [`UnavailablePolicy`] models a missing model,
//! and [`CachedPolicy`] memoizes any policy by observation.

use std::future::Future;
use std::num::NonZeroUsize;

use lru::LruCache;
use parking_lot::Mutex;
use pawprint_core::PetAction;

use crate::error::PolicyError;
use crate::observation::{Observation, ObservationIndex, OBSERVATION_LEN};
use crate::personality::Personality;

/// Something that picks a base action id for an observation.
pub trait Policy: Send + Sync {
    /// Predict an action id. Ids outside the catalogue are rejected by the
    /// caller.
    fn predict(
        &self,
        observation: &Observation,
        cat_id: Option<&str>,
        personality: Personality,
    ) -> impl Future<Output = Result<u8, PolicyError>> + Send;
}

// ---------------------------------------------------------------------------
// Rule-based fallback
// ---------------------------------------------------------------------------

/// Hand-tuned thresholds over the observation. Deterministic.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleBasedPolicy;

impl RuleBasedPolicy {
    /// Synchronous core of [`Policy::predict`].
    #[must_use]
    pub fn choose(observation: &Observation) -> PetAction {
        use ObservationIndex as I;
        let hunger = observation.get(I::Hunger);
        let energy = observation.get(I::Energy);
        let bowl_unusable =
            observation.get(I::IsBowlEmpty) > 0.5 || observation.get(I::IsBowlTipped) > 0.5;

        if hunger > 60.0 && bowl_unusable {
            PetAction::MeowAtBowl
        } else if hunger > 70.0 {
            PetAction::MoveToFood
        } else if energy < 25.0 {
            PetAction::Sleep
        } else if observation.get(I::PlayfulScore) > 60.0 && energy > 50.0 {
            if observation.get(I::DistanceToy) < 1.5 {
                PetAction::Play
            } else {
                PetAction::MoveToToy
            }
        } else if observation.get(I::Mood) < 30.0 {
            PetAction::Groom
        } else if energy > 70.0 {
            PetAction::Explore
        } else {
            PetAction::Idle
        }
    }
}

impl Policy for RuleBasedPolicy {
    async fn predict(
        &self,
        observation: &Observation,
        _cat_id: Option<&str>,
        _personality: Personality,
    ) -> Result<u8, PolicyError> {
        Ok(Self::choose(observation).id())
    }
}

/// A policy whose model never loaded. Every call fails.
#[derive(Debug, Clone, Default)]
pub struct UnavailablePolicy {
    /// Reported reason.
    pub reason: String,
}

impl Policy for UnavailablePolicy {
    async fn predict(
        &self,
        _observation: &Observation,
        _cat_id: Option<&str>,
        _personality: Personality,
    ) -> Result<u8, PolicyError> {
        Err(PolicyError::Unavailable(self.reason.clone()))
    }
}

// ---------------------------------------------------------------------------
// Prediction cache
// ---------------------------------------------------------------------------

type CacheKey = ([u32; OBSERVATION_LEN], Personality);

/// Memoizes an inner policy, keyed by the exact observation bits and the
/// personality. Errors are never cached.
pub struct CachedPolicy<P> {
    inner: P,
    cache: Mutex<LruCache<CacheKey, u8>>,
}

impl<P> std::fmt::Debug for CachedPolicy<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedPolicy")
            .field("entries", &self.cache.lock().len())
            .finish_non_exhaustive()
    }
}

impl<P: Policy> CachedPolicy<P> {
    /// Wrap `inner` with room for `capacity` predictions (at least one).
    #[must_use]
    pub fn new(inner: P, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner,
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Cached predictions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cache.lock().len()
    }

    /// Whether nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn key(observation: &Observation, personality: Personality) -> CacheKey {
        (observation.0.map(f32::to_bits), personality)
    }
}

impl<P: Policy> Policy for CachedPolicy<P> {
    async fn predict(
        &self,
        observation: &Observation,
        cat_id: Option<&str>,
        personality: Personality,
    ) -> Result<u8, PolicyError> {
        let key = Self::key(observation, personality);
        if let Some(hit) = self.cache.lock().get(&key).copied() {
            return Ok(hit);
        }
        let action = self.inner.predict(observation, cat_id, personality).await?;
        self.cache.lock().put(key, action);
        Ok(action)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use pawprint_core::PetSnapshot;

    use super::*;

    fn obs(snapshot: PetSnapshot) -> Observation {
        Observation::from_snapshot(&snapshot)
    }

    #[test]
    fn hungry_cat_with_empty_bowl_meows() {
        let o = obs(PetSnapshot {
            hunger: 80.0,
            is_bowl_empty: true,
            ..PetSnapshot::default()
        });
        assert_eq!(RuleBasedPolicy::choose(&o), PetAction::MeowAtBowl);
    }

    #[test]
    fn needs_take_precedence_over_play() {
        let hungry = obs(PetSnapshot {
            hunger: 90.0,
            playful_score: 90.0,
            energy: 90.0,
            ..PetSnapshot::default()
        });
        assert_eq!(RuleBasedPolicy::choose(&hungry), PetAction::MoveToFood);

        let tired = obs(PetSnapshot {
            energy: 10.0,
            ..PetSnapshot::default()
        });
        assert_eq!(RuleBasedPolicy::choose(&tired), PetAction::Sleep);
    }

    #[test]
    fn playful_cat_next_to_toy_plays() {
        let o = obs(PetSnapshot {
            playful_score: 80.0,
            energy: 60.0,
            distance_to_toy: 1.0,
            ..PetSnapshot::default()
        });
        assert_eq!(RuleBasedPolicy::choose(&o), PetAction::Play);
    }

    #[test]
    fn defaults_idle() {
        assert_eq!(RuleBasedPolicy::choose(&obs(PetSnapshot::default())), PetAction::Idle);
    }

    struct Counting(AtomicUsize);

    impl Policy for Counting {
        async fn predict(
            &self,
            _: &Observation,
            _: Option<&str>,
            _: Personality,
        ) -> Result<u8, PolicyError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(PetAction::Groom.id())
        }
    }

    #[tokio::test]
    async fn cache_short_circuits_repeat_observations() {
        let policy = CachedPolicy::new(Counting(AtomicUsize::new(0)), 4);
        let o = obs(PetSnapshot::default());

        for _ in 0..3 {
            let action = policy.predict(&o, None, Personality::Lazy).await;
            assert_eq!(action.ok(), Some(PetAction::Groom.id()));
        }
        assert_eq!(policy.inner.0.load(Ordering::SeqCst), 1);

        let _ = policy.predict(&o, None, Personality::Playful).await;
        assert_eq!(policy.inner.0.load(Ordering::SeqCst), 2);
        assert_eq!(policy.len(), 2);
    }

    #[tokio::test]
    async fn unavailable_policy_fails_and_is_not_cached() {
        let policy = CachedPolicy::new(
            UnavailablePolicy {
                reason: "no checkpoint".into(),
            },
            4,
        );
        let result =
            policy.predict(&obs(PetSnapshot::default()), None, Personality::Balanced).await;
        assert!(matches!(result, Err(PolicyError::Unavailable(_))));
        assert!(policy.is_empty());
    }
}
