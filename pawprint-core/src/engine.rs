//! Contextual Behavior Engine: the per-request pipeline.
//!
//! Given a pet snapshot and the action the policy chose, the engine:
//!
//! 1. extracts stimuli from the snapshot
//! 2. reads two candidate emotions: **base** (hunger/energy right now) and
//!    **mood** (EMA of the reported mood)
//! 3. stabilizes both axes against hold time and vote count
//! 4. rolls reactions against the mood axis; the first to fire may
//!    override the action and opens a short reaction overlay
//! 5. without a reaction, lets idle quirks and noise perturb the action
//! 6. breaks up repetitive behavior with a distraction
//! 7. records the outcome and composes the visual layers
//!
//! All per-pet state lives in a [`PetStateStore`]; the engine itself holds
//! only configuration, the seed source and counters.

use std::sync::Arc;
use std::sync::atomic::Ordering;

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::behavior;
use crate::config::PawprintConfig;
use crate::emotion::emotional_state;
use crate::error::{PawprintError, Result};
use crate::memory::InteractionKind;
use crate::metrics::{EngineCounters, LatencyTracker, spans};
use crate::reaction::{self, ReactionModifier, Stimulus, StimulusType};
use crate::registry::{LruPetRegistry, PetState, PetStateStore};
use crate::stabilizer::{AxisPersistenceState, EmotionAxis};
use crate::types::{EmotionType, EmotionalState, PetAction, Seconds, TimeOfDay, unix_now};
use crate::visual::{EmotionAxes, ReactionAxisState, VisualLayer, primary_emotion};

/// Pet id used when the caller does not name one.
pub const DEFAULT_PET_ID: &str = "default";

/// Loud noise below this level is ignored.
const LOUD_NOISE_THRESHOLD: f64 = 0.3;

/// Players further away than this do not count as approaching.
const APPROACH_RADIUS: f64 = 20.0;

/// Intensity of a sudden-movement stimulus.
const SUDDEN_MOVEMENT_INTENSITY: f64 = 0.8;

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// Everything the client reports about a pet for one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PetSnapshot {
    /// Hunger, 0 (full) to 100 (starving).
    pub hunger: f64,
    /// Energy, 0 to 100.
    pub energy: f64,
    /// Distance to the food bowl.
    pub distance_to_food: f64,
    /// Distance to the nearest toy.
    pub distance_to_toy: f64,
    /// Distance to the bed.
    pub distance_to_bed: f64,
    /// Reported mood, 0 to 100.
    pub mood: f64,
    /// Drifted laziness, 0 to 100.
    pub lazy_score: f64,
    /// Drifted food focus, 0 to 100.
    pub foodie_score: f64,
    /// Drifted playfulness, 0 to 100.
    pub playful_score: f64,
    /// The bowl is empty.
    pub is_bowl_empty: bool,
    /// The bowl is knocked over.
    pub is_bowl_tipped: bool,
    /// A player is around.
    pub player_nearby: bool,
    /// Distance to the player.
    pub player_distance: f64,
    /// The player is petting the cat.
    pub is_being_petted: bool,
    /// The player is calling the cat.
    pub is_player_calling: bool,
    /// Something moved suddenly.
    pub sudden_movement: bool,
    /// A new toy showed up.
    pub new_toy_appeared: bool,
    /// The bowl was just refilled.
    pub food_bowl_refilled: bool,
    /// Ambient noise, 0 to 1.
    pub loud_noise_level: f64,
    /// Coarse time of day.
    pub time_of_day: TimeOfDay,
}

impl Default for PetSnapshot {
    fn default() -> Self {
        Self {
            hunger: 50.0,
            energy: 50.0,
            distance_to_food: 5.0,
            distance_to_toy: 5.0,
            distance_to_bed: 5.0,
            mood: 50.0,
            lazy_score: 50.0,
            foodie_score: 50.0,
            playful_score: 50.0,
            is_bowl_empty: false,
            is_bowl_tipped: false,
            player_nearby: false,
            player_distance: 100.0,
            is_being_petted: false,
            is_player_calling: false,
            sudden_movement: false,
            new_toy_appeared: false,
            food_bowl_refilled: false,
            loud_noise_level: 0.0,
            time_of_day: TimeOfDay::default(),
        }
    }
}

impl PetSnapshot {
    /// Mood implied by needs alone: high energy and low hunger feel good.
    #[must_use]
    pub fn base_mood(&self) -> f64 {
        ((self.energy + (100.0 - self.hunger)) / 2.0).clamp(0.0, 100.0)
    }

    /// Reject NaN, infinite and out-of-range readings.
    ///
    /// Needs and personality scores live in `[0, 100]`, distances are
    /// non-negative and the noise level is in `[0, 1]`. The engine does not
    /// call this; request handlers do.
    ///
    /// # Errors
    /// `PawprintError::InvalidSnapshot` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        let scores = [
            ("hunger", self.hunger),
            ("energy", self.energy),
            ("mood", self.mood),
            ("lazy_score", self.lazy_score),
            ("foodie_score", self.foodie_score),
            ("playful_score", self.playful_score),
        ];
        let distances = [
            ("distance_to_food", self.distance_to_food),
            ("distance_to_toy", self.distance_to_toy),
            ("distance_to_bed", self.distance_to_bed),
            ("player_distance", self.player_distance),
        ];

        let invalid = |field, value, expected| {
            Err(PawprintError::InvalidSnapshot {
                field,
                value,
                expected,
            })
        };

        for (field, value) in scores {
            if !(0.0..=100.0).contains(&value) {
                return invalid(field, value, "0 to 100");
            }
        }
        for (field, value) in distances {
            if !(value.is_finite() && value >= 0.0) {
                return invalid(field, value, "finite and non-negative");
            }
        }
        if !(0.0..=1.0).contains(&self.loud_noise_level) {
            return invalid("loud_noise_level", self.loud_noise_level, "0 to 1");
        }
        Ok(())
    }
}

/// Stimuli present in `snapshot`, in reaction priority order.
#[must_use]
pub fn extract_stimuli(snapshot: &PetSnapshot, now: Seconds) -> Vec<Stimulus> {
    let mut stimuli = Vec::new();
    let mut push = |kind, intensity| stimuli.push(Stimulus::new(kind, intensity, now));

    if snapshot.is_being_petted {
        push(StimulusType::PlayerPet, 1.0);
    }
    if snapshot.is_player_calling {
        push(StimulusType::PlayerCall, 1.0);
    }
    if snapshot.loud_noise_level > LOUD_NOISE_THRESHOLD {
        push(StimulusType::LoudNoise, snapshot.loud_noise_level);
    }
    if snapshot.new_toy_appeared {
        push(StimulusType::NewToy, 1.0);
    }
    if snapshot.food_bowl_refilled {
        push(StimulusType::FoodRefill, 1.0);
    }
    if snapshot.player_nearby && snapshot.player_distance < APPROACH_RADIUS {
        push(
            StimulusType::PlayerApproach,
            1.0 - snapshot.player_distance / APPROACH_RADIUS,
        );
    }
    if snapshot.sudden_movement {
        push(StimulusType::SuddenMovement, SUDDEN_MOVEMENT_INTENSITY);
    }
    stimuli
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// The engine's answer for one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BehaviorDecision {
    /// Final action.
    pub action: PetAction,
    /// Stabilized mood-axis reading.
    pub emotional_state: EmotionalState,
    /// Mood change requested by a fired reaction.
    pub mood_delta: f64,
    /// Animation requested by a fired reaction.
    pub animation_hint: Option<String>,
    /// Sound requested by a fired reaction.
    pub sound_hint: Option<String>,
    /// Whether a reaction fired this request.
    pub reaction_triggered: bool,
    /// Fraction of recent actions that were active, before this one.
    pub activity_level: f64,
    /// All three axes.
    pub emotion_axes: EmotionAxes,
    /// Weighted layers, lowest priority first.
    pub visual_layers: Vec<VisualLayer>,
    /// Emotion to display.
    pub visual_primary: Option<EmotionType>,
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Post-processes policy actions into believable, emotionally annotated
/// behavior.
pub struct ContextualBehaviorEngine {
    config: PawprintConfig,
    store: Arc<dyn PetStateStore>,
    seeder: Mutex<StdRng>,
    counters: EngineCounters,
    latency: LatencyTracker,
}

impl std::fmt::Debug for ContextualBehaviorEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextualBehaviorEngine")
            .field("pets", &self.store.len())
            .field("counters", &self.counters)
            .finish_non_exhaustive()
    }
}

impl Default for ContextualBehaviorEngine {
    fn default() -> Self {
        Self::new(PawprintConfig::default())
    }
}

impl ContextualBehaviorEngine {
    /// Engine with the default LRU registry.
    #[must_use]
    pub fn new(config: PawprintConfig) -> Self {
        let store = Arc::new(LruPetRegistry::new(&config.registry));
        Self::with_store(config, store)
    }

    /// Engine backed by a caller-provided state store.
    #[must_use]
    pub fn with_store(config: PawprintConfig, store: Arc<dyn PetStateStore>) -> Self {
        let seeder = match config.randomness.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            config,
            store,
            seeder: Mutex::new(seeder),
            counters: EngineCounters::new(),
            latency: LatencyTracker::new(),
        }
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &PawprintConfig {
        &self.config
    }

    /// Event counters.
    #[must_use]
    pub fn counters(&self) -> &EngineCounters {
        &self.counters
    }

    /// Per-decision latency.
    #[must_use]
    pub fn latency(&self) -> &LatencyTracker {
        &self.latency
    }

    /// Pets currently held in the store.
    #[must_use]
    pub fn pet_count(&self) -> usize {
        self.store.len()
    }

    /// Drop pets idle past the registry TTL.
    pub fn evict_idle(&self, now: Seconds) -> usize {
        let _span = tracing::span!(tracing::Level::DEBUG, spans::EVICTION_PASS).entered();
        let evicted = self.store.evict_idle(now);
        self.counters
            .pets_evicted
            .fetch_add(evicted as u64, Ordering::Relaxed);
        evicted
    }

    /// Process one request at the current wall-clock time.
    pub fn process_action(
        &self,
        snapshot: &PetSnapshot,
        base_action: PetAction,
        cat_id: Option<&str>,
    ) -> BehaviorDecision {
        self.process_action_at(snapshot, base_action, cat_id, unix_now())
    }

    /// Process one request at an explicit time.
    ///
    /// Never fails: an unknown pet id gets fresh state.
    pub fn process_action_at(
        &self,
        snapshot: &PetSnapshot,
        base_action: PetAction,
        cat_id: Option<&str>,
        now: Seconds,
    ) -> BehaviorDecision {
        let _timer = self.latency.start();
        let pet_id = cat_id.unwrap_or(DEFAULT_PET_ID);
        let _span = tracing::span!(tracing::Level::DEBUG, spans::DECIDE, pet_id).entered();

        let lookup = self
            .store
            .get_or_create(pet_id, now, &|| self.fresh_pet_state());
        if lookup.created {
            EngineCounters::incr(&self.counters.pets_created);
        }
        if lookup.evicted > 0 {
            self.counters
                .pets_evicted
                .fetch_add(lookup.evicted as u64, Ordering::Relaxed);
        }

        let mut guard = lookup.state.lock();
        let decision = self.decide(&mut guard, snapshot, base_action, now);
        drop(guard);

        EngineCounters::incr(&self.counters.decisions);
        tracing::debug!(
            pet_id,
            base_action = %base_action,
            action = %decision.action,
            emotion = %decision.emotional_state.primary_emotion,
            reaction = decision.reaction_triggered,
            "behavior decided"
        );
        decision
    }

    fn fresh_pet_state(&self) -> PetState {
        let seed = self.seeder.lock().next_u64();
        PetState::new(self.config.registry.memory_capacity, seed)
    }

    fn decide(
        &self,
        pet: &mut PetState,
        snapshot: &PetSnapshot,
        base_action: PetAction,
        now: Seconds,
    ) -> BehaviorDecision {
        let activity_level = pet.memory.recent_activity_level();
        let stimuli = extract_stimuli(snapshot, now);
        let urgent = stimuli.iter().any(|s| {
            s.kind.is_urgent_kind() && s.intensity >= self.config.stabilization.urgent_intensity
        });

        let reading = |mood: f64| {
            emotional_state(
                mood,
                snapshot.hunger,
                snapshot.energy,
                activity_level,
                snapshot.loud_noise_level,
            )
        };
        let base_candidate = reading(snapshot.base_mood());
        let mood_candidate = reading(pet.smooth_mood(snapshot.mood, self.config.mood.smoothing));

        let mut base =
            self.stabilize(&mut pet.base_axis, EmotionAxis::Base, base_candidate, urgent, now);
        let mut mood =
            self.stabilize(&mut pet.mood_axis, EmotionAxis::Mood, mood_candidate, urgent, now);

        // Reactions are judged against the mood axis.
        let mut action = base_action;
        let mut fired: Option<(Stimulus, ReactionModifier)> = None;
        {
            let _span = tracing::span!(tracing::Level::TRACE, spans::REACTIONS).entered();
            for stimulus in &stimuli {
                if let Some(modifier) = reaction::get_reaction(stimulus, &mood, &mut pet.rng) {
                    action = reaction::apply_reaction(action, &modifier, &mut pet.rng);
                    fired = Some((*stimulus, modifier));
                    break;
                }
            }
        }

        if let Some((stimulus, modifier)) = &fired {
            EngineCounters::incr(&self.counters.reactions_fired);
            tracing::debug!(
                stimulus = %stimulus.kind,
                against = %mood.primary_emotion,
                mood_delta = modifier.mood_delta,
                "reaction fired"
            );
            if !urgent {
                base = self.stabilize(
                    &mut pet.base_axis,
                    EmotionAxis::Base,
                    base_candidate,
                    true,
                    now,
                );
                mood = self.stabilize(
                    &mut pet.mood_axis,
                    EmotionAxis::Mood,
                    mood_candidate,
                    true,
                    now,
                );
            }
            pet.reaction = Some(ReactionAxisState::open(
                stimulus,
                modifier,
                &mood,
                now,
                &self.config.reactions,
            ));
        } else {
            let quirk = behavior::random_quirk_action(snapshot.mood, snapshot.energy, &mut pet.rng);
            if let Some(quirk) = quirk {
                EngineCounters::incr(&self.counters.quirks);
                action = quirk;
            }
            let noisy = behavior::add_noise_to_prediction(
                action,
                self.config.stochastic.noise_confidence,
                snapshot.mood,
                &mut pet.rng,
            );
            if noisy != action {
                EngineCounters::incr(&self.counters.noise_substitutions);
                action = noisy;
            }
        }

        if pet.memory.is_repeating_behavior() {
            let distracted = behavior::introduce_distraction(
                action,
                self.config.stochastic.distraction_richness,
                &mut pet.rng,
            );
            if distracted != action {
                EngineCounters::incr(&self.counters.distractions);
                action = distracted;
            }
        }

        pet.memory.record_action(action, snapshot.mood, 0.0);
        if snapshot.is_being_petted {
            pet.memory.record_interaction(InteractionKind::Pet, now);
        }
        if snapshot.food_bowl_refilled {
            pet.memory.record_interaction(InteractionKind::Food, now);
        }

        let emotion_axes = EmotionAxes {
            base,
            mood,
            reaction: pet.active_reaction(now),
        };
        let visual_layers = emotion_axes.layers(&self.config.visual);
        let visual_primary = primary_emotion(&visual_layers);

        let modifier = fired.map(|(_, m)| m);
        BehaviorDecision {
            action,
            emotional_state: mood,
            mood_delta: modifier.map_or(0.0, |m| m.mood_delta),
            animation_hint: modifier.and_then(|m| m.animation_hint).map(str::to_string),
            sound_hint: modifier.and_then(|m| m.sound_hint).map(str::to_string),
            reaction_triggered: modifier.is_some(),
            activity_level,
            emotion_axes,
            visual_layers,
            visual_primary,
        }
    }

    fn stabilize(
        &self,
        axis_state: &mut AxisPersistenceState,
        axis: EmotionAxis,
        candidate: EmotionalState,
        urgent: bool,
        now: Seconds,
    ) -> EmotionalState {
        let (state, outcome) =
            axis_state.stabilize(axis, candidate, urgent, now, &self.config.stabilization);
        if outcome.changed() {
            let counter = match axis {
                EmotionAxis::Base => &self.counters.base_transitions,
                EmotionAxis::Mood => &self.counters.mood_transitions,
            };
            EngineCounters::incr(counter);
            tracing::debug!(
                axis = axis.label(),
                emotion = %state.primary_emotion,
                forced = urgent,
                "emotion axis transitioned"
            );
        }
        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RandomnessConfig;

    fn seeded(seed: u64) -> ContextualBehaviorEngine {
        ContextualBehaviorEngine::new(PawprintConfig {
            randomness: RandomnessConfig { seed: Some(seed) },
            ..PawprintConfig::default()
        })
    }

    #[test]
    fn quiet_snapshot_has_no_stimuli() {
        assert!(extract_stimuli(&PetSnapshot::default(), 0.0).is_empty());
    }

    #[test]
    fn stimuli_come_out_in_priority_order() {
        let snapshot = PetSnapshot {
            is_being_petted: true,
            is_player_calling: true,
            loud_noise_level: 0.5,
            new_toy_appeared: true,
            food_bowl_refilled: true,
            player_nearby: true,
            player_distance: 5.0,
            sudden_movement: true,
            ..PetSnapshot::default()
        };
        let stimuli = extract_stimuli(&snapshot, 1.0);
        let kinds: Vec<StimulusType> = stimuli.iter().map(|s| s.kind).collect();
        assert_eq!(
            kinds,
            vec![
                StimulusType::PlayerPet,
                StimulusType::PlayerCall,
                StimulusType::LoudNoise,
                StimulusType::NewToy,
                StimulusType::FoodRefill,
                StimulusType::PlayerApproach,
                StimulusType::SuddenMovement,
            ]
        );
        assert!((stimuli[2].intensity - 0.5).abs() < f64::EPSILON);
        assert!((stimuli[5].intensity - 0.75).abs() < 1e-9);
        assert!((stimuli[6].intensity - 0.8).abs() < f64::EPSILON);
    }

    #[test]
    fn weak_noise_and_far_players_are_ignored() {
        let snapshot = PetSnapshot {
            loud_noise_level: 0.3,
            player_nearby: true,
            player_distance: 20.0,
            ..PetSnapshot::default()
        };
        assert!(extract_stimuli(&snapshot, 0.0).is_empty());
    }

    #[test]
    fn base_mood_averages_energy_and_satiety() {
        let snapshot = PetSnapshot {
            hunger: 20.0,
            energy: 80.0,
            ..PetSnapshot::default()
        };
        assert!((snapshot.base_mood() - 80.0).abs() < f64::EPSILON);
    }

    #[test]
    fn snapshot_ranges_are_checked() {
        assert!(PetSnapshot::default().validate().is_ok());
        let edges = PetSnapshot {
            hunger: 0.0,
            energy: 100.0,
            distance_to_toy: 0.0,
            loud_noise_level: 1.0,
            ..PetSnapshot::default()
        };
        assert!(edges.validate().is_ok());

        let with = |edit: fn(&mut PetSnapshot)| {
            let mut snapshot = PetSnapshot::default();
            edit(&mut snapshot);
            snapshot
        };
        let cases = [
            ("mood", with(|s| s.mood = f64::NAN)),
            ("hunger", with(|s| s.hunger = -500.0)),
            ("energy", with(|s| s.energy = 900.0)),
            ("playful_score", with(|s| s.playful_score = 100.5)),
            ("distance_to_bed", with(|s| s.distance_to_bed = -1.0)),
            ("player_distance", with(|s| s.player_distance = f64::INFINITY)),
            ("loud_noise_level", with(|s| s.loud_noise_level = 1.2)),
        ];
        for (expected, snapshot) in cases {
            match snapshot.validate() {
                Err(PawprintError::InvalidSnapshot { field, .. }) => assert_eq!(field, expected),
                other => panic!("{expected}: {other:?}"),
            }
        }
    }

    #[test]
    fn unknown_pet_gets_fresh_state() {
        let engine = seeded(1);
        assert_eq!(engine.pet_count(), 0);
        let decision =
            engine.process_action_at(&PetSnapshot::default(), PetAction::Idle, Some("tom"), 0.0);
        assert!(decision.activity_level.abs() < f64::EPSILON);
        assert_eq!(engine.pet_count(), 1);
        engine.process_action_at(&PetSnapshot::default(), PetAction::Idle, None, 0.0);
        assert_eq!(engine.pet_count(), 2);
        assert_eq!(engine.counters().snapshot().pets_created, 2);
        assert_eq!(engine.counters().snapshot().decisions, 2);
    }

    #[test]
    fn same_seed_same_decisions() {
        let a = seeded(99);
        let b = seeded(99);
        let snapshot = PetSnapshot {
            is_being_petted: true,
            mood: 75.0,
            ..PetSnapshot::default()
        };
        for t in 0..50 {
            let now = f64::from(t);
            let da = a.process_action_at(&snapshot, PetAction::Play, Some("tom"), now);
            let db = b.process_action_at(&snapshot, PetAction::Play, Some("tom"), now);
            assert_eq!(da, db);
        }
    }

    #[test]
    fn without_stimuli_no_reaction_fires() {
        let engine = seeded(5);
        for t in 0..100 {
            let d = engine.process_action_at(
                &PetSnapshot::default(),
                PetAction::Idle,
                Some("tom"),
                f64::from(t),
            );
            assert!(!d.reaction_triggered);
            assert!(d.mood_delta.abs() < f64::EPSILON);
            assert!(d.animation_hint.is_none());
            assert!(d.emotion_axes.reaction.is_none());
            assert_eq!(d.visual_layers.len(), 2);
        }
    }
}
