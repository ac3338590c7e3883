//! Pet service: one request end to end.
//!
//! ```text
//!   DecisionRequest
//!        │
//!        ▼
//!   Observation ── personality ── profile modifiers
//!        │
//!        ▼
//!   Policy::predict ──► base action id
//!        │
//!        ▼
//!   ContextualBehaviorEngine::process_action_at
//!        │
//!        ▼
//!   ActionHistory::log_action ──► ServiceDecision
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::Instrument;

use pawprint_core::behavior::matching_patterns;
use pawprint_core::metrics::spans;
use pawprint_core::{
    BehaviorDecision, ContextualBehaviorEngine, DEFAULT_PET_ID, PetAction, PetSnapshot, Seconds,
    unix_now,
};

use crate::config::ServiceConfig;
use crate::error::{Result, ServiceError};
use crate::history::{ActionHistory, HistoryEntry, HistoryStats};
use crate::observation::Observation;
use crate::personality::Personality;
use crate::policy::{CachedPolicy, Policy};
use crate::profile::{CatProfile, ProfileStore, validate_cat_id};

/// Incoming request: the world snapshot plus who is asking.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DecisionRequest {
    /// Pet and world state.
    #[serde(flatten)]
    pub snapshot: PetSnapshot,
    /// Cat id. Anonymous requests share the default pet.
    #[serde(default)]
    pub cat_id: Option<String>,
    /// Personality override for this request.
    #[serde(default)]
    pub personality: Option<Personality>,
}

/// The engine's decision plus service-level annotations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceDecision {
    /// Engine output.
    #[serde(flatten)]
    pub decision: BehaviorDecision,
    /// Snake-case name of the final action.
    pub action_name: String,
    /// What the policy proposed before post-processing.
    pub base_action: PetAction,
    /// Personality the observation was shaped with.
    pub personality: Personality,
    /// Behavior patterns whose gates pass right now.
    pub patterns: Vec<String>,
}

/// Summary returned by [`PetService::cat_info`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatInfo {
    /// Cat id.
    pub cat_id: String,
    /// Personality.
    pub personality: Personality,
    /// Profile creation time.
    pub created_at: DateTime<Utc>,
    /// Actions logged for this cat.
    pub total_actions: u64,
}

/// Owns the engine, the policy, profiles and history.
pub struct PetService<P> {
    config: ServiceConfig,
    engine: ContextualBehaviorEngine,
    policy: P,
    profiles: ProfileStore,
    history: ActionHistory,
}

impl<P> std::fmt::Debug for PetService<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PetService")
            .field("engine", &self.engine)
            .field("profiles", &self.profiles.len())
            .field("history_cats", &self.history.cat_count())
            .finish_non_exhaustive()
    }
}

impl<P: Policy> PetService<CachedPolicy<P>> {
    /// Service whose policy is memoized with `config.policy.cache_capacity`
    /// slots.
    #[must_use]
    pub fn with_cache(config: ServiceConfig, policy: P) -> Self {
        let capacity = config.policy.cache_capacity;
        Self::new(config, CachedPolicy::new(policy, capacity))
    }
}

impl<P: Policy> PetService<P> {
    /// Build a service around `policy`.
    #[must_use]
    pub fn new(config: ServiceConfig, policy: P) -> Self {
        let engine = ContextualBehaviorEngine::new(config.engine.clone());
        let profiles =
            ProfileStore::new(config.profiles.modifier_min, config.profiles.modifier_max);
        let history = ActionHistory::new(config.history.capacity, config.history.max_cats);
        Self {
            config,
            engine,
            policy,
            profiles,
            history,
        }
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// The behavior engine.
    #[must_use]
    pub fn engine(&self) -> &ContextualBehaviorEngine {
        &self.engine
    }

    /// The policy.
    #[must_use]
    pub fn policy(&self) -> &P {
        &self.policy
    }

    /// Profile store.
    #[must_use]
    pub fn profiles(&self) -> &ProfileStore {
        &self.profiles
    }

    /// Action history.
    #[must_use]
    pub fn history(&self) -> &ActionHistory {
        &self.history
    }

    // -- Cats ---------------------------------------------------------------

    /// Register a new cat.
    ///
    /// # Errors
    /// `InvalidCatId` or `CatAlreadyExists`.
    pub fn create_cat(&self, cat_id: &str, personality: Personality) -> Result<CatProfile> {
        self.profiles.create(cat_id, personality)
    }

    /// Whether a cat is registered.
    #[must_use]
    pub fn cat_exists(&self, cat_id: &str) -> bool {
        self.profiles.exists(cat_id)
    }

    /// Full profile.
    ///
    /// # Errors
    /// `CatNotFound`.
    pub fn profile(&self, cat_id: &str) -> Result<CatProfile> {
        self.profiles
            .get(cat_id)
            .ok_or_else(|| ServiceError::CatNotFound(cat_id.to_string()))
    }

    /// Profile summary with the logged action count.
    ///
    /// # Errors
    /// `CatNotFound`.
    pub fn cat_info(&self, cat_id: &str) -> Result<CatInfo> {
        let profile = self.profile(cat_id)?;
        Ok(CatInfo {
            cat_id: profile.cat_id,
            personality: profile.personality,
            created_at: profile.created_at,
            total_actions: self.history.stats(cat_id).total_actions,
        })
    }

    /// Newest `limit` history entries for a registered cat.
    ///
    /// # Errors
    /// `CatNotFound`.
    pub fn cat_history(&self, cat_id: &str, limit: Option<usize>) -> Result<Vec<HistoryEntry>> {
        self.profile(cat_id)?;
        Ok(self.history.history(cat_id, limit))
    }

    /// History summary for a registered cat.
    ///
    /// # Errors
    /// `CatNotFound`.
    pub fn cat_stats(&self, cat_id: &str) -> Result<HistoryStats> {
        self.profile(cat_id)?;
        Ok(self.history.stats(cat_id))
    }

    // -- Decisions ----------------------------------------------------------

    /// Decide at the current wall-clock time.
    ///
    /// # Errors
    /// See [`Self::decide_at`].
    pub async fn decide(&self, request: &DecisionRequest) -> Result<ServiceDecision> {
        self.decide_at(request, unix_now()).await
    }

    /// Run one request through policy, engine and history at time `now`.
    ///
    /// Cats without a profile are served with personality multipliers only.
    ///
    /// # Errors
    /// `InvalidCatId` for a malformed id, `InvalidSnapshot` for a NaN or
    /// out-of-range reading, `Policy` when the policy fails and
    /// `Core(InvalidAction)` when it answers outside the catalogue.
    pub async fn decide_at(
        &self,
        request: &DecisionRequest,
        now: Seconds,
    ) -> Result<ServiceDecision> {
        let cat_id = request.cat_id.as_deref();
        let span = tracing::span!(
            tracing::Level::DEBUG,
            spans::SERVICE_DECIDE,
            cat_id = cat_id.unwrap_or(DEFAULT_PET_ID)
        );
        self.decide_inner(request, cat_id, now).instrument(span).await
    }

    async fn decide_inner(
        &self,
        request: &DecisionRequest,
        cat_id: Option<&str>,
        now: Seconds,
    ) -> Result<ServiceDecision> {
        Self::check(request)?;
        let (profile, personality) = self.resolve(request);
        let observation = self.observe(&request.snapshot, personality, profile.as_ref());
        let base_action = self.predict(&observation, cat_id, personality).await?;

        let decision = self
            .engine
            .process_action_at(&request.snapshot, base_action, cat_id, now);
        self.history.log_action(
            cat_id.unwrap_or(DEFAULT_PET_ID),
            observation,
            decision.action,
            None,
        );

        let snapshot = &request.snapshot;
        let energy = snapshot.energy * snapshot.time_of_day.energy_modifier();
        let patterns = matching_patterns(snapshot.mood, energy, snapshot.time_of_day)
            .into_iter()
            .map(|p| p.name.to_string())
            .collect();

        Ok(ServiceDecision {
            action_name: decision.action.name().to_string(),
            base_action,
            personality,
            patterns,
            decision,
        })
    }

    fn check(request: &DecisionRequest) -> Result<()> {
        if let Some(id) = request.cat_id.as_deref() {
            validate_cat_id(id)?;
        }
        request
            .snapshot
            .validate()
            .inspect_err(|e| tracing::warn!(error = %e, "rejected snapshot"))
            .map_err(ServiceError::InvalidSnapshot)
    }

    /// Request override, then the cat's own personality, then the default.
    fn resolve(&self, request: &DecisionRequest) -> (Option<CatProfile>, Personality) {
        let profile = request.cat_id.as_deref().and_then(|id| self.profiles.get(id));
        let personality = request
            .personality
            .or(profile.as_ref().map(|p| p.personality))
            .unwrap_or(self.config.default_personality);
        (profile, personality)
    }

    fn observe(
        &self,
        snapshot: &PetSnapshot,
        personality: Personality,
        profile: Option<&CatProfile>,
    ) -> Observation {
        let observation = Observation::from_snapshot(snapshot).with_personality(personality);
        match profile {
            Some(p) => observation.with_profile(&p.modifiers),
            None => observation,
        }
    }

    async fn predict(
        &self,
        observation: &Observation,
        cat_id: Option<&str>,
        personality: Personality,
    ) -> Result<PetAction> {
        let id = self
            .policy
            .predict(observation, cat_id, personality)
            .await
            .inspect_err(|e| tracing::warn!(error = %e, "policy prediction failed"))?;
        PetAction::from_id(id)
            .inspect_err(|e| tracing::warn!(error = %e, "policy answered outside the catalogue"))
            .map_err(ServiceError::from)
    }

    /// Policy actions for several requests, without post-processing or
    /// history.
    ///
    /// # Errors
    /// The first failing request's error.
    pub async fn predict_batch(&self, requests: &[DecisionRequest]) -> Result<Vec<PetAction>> {
        let mut actions = Vec::with_capacity(requests.len());
        for request in requests {
            Self::check(request)?;
            let (profile, personality) = self.resolve(request);
            let observation = self.observe(&request.snapshot, personality, profile.as_ref());
            actions.push(self.predict(&observation, request.cat_id.as_deref(), personality).await?);
        }
        Ok(actions)
    }
}
