//! Cat Memory: "What have I been up to?"
//!
//! A short rolling window of a pet's recent actions, moods and rewards.
//! Three parallel FIFO buffers stay length-synchronized: recording one
//! action appends to all three and, once over capacity, evicts the oldest
//! entry of each.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::types::{PetAction, Seconds};

/// Default number of entries kept per buffer.
pub const DEFAULT_CAPACITY: usize = 50;

/// Window used by the activity and diversity readings.
const RECENT_WINDOW: usize = 10;

/// Window used by repetition detection.
const REPEAT_WINDOW: usize = 5;

/// Kinds of player interaction the memory keeps timestamps for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionKind {
    /// Being petted.
    Pet,
    /// Being fed.
    Food,
    /// Anything else worth counting.
    Other,
}

/// Bounded per-pet behavioral history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatMemory {
    capacity: usize,
    recent_actions: VecDeque<PetAction>,
    recent_moods: VecDeque<f64>,
    recent_rewards: VecDeque<f64>,
    /// Total interactions recorded.
    pub interaction_count: u64,
    /// When the pet was last petted.
    pub last_pet_time: Option<Seconds>,
    /// When the pet was last fed.
    pub last_food_time: Option<Seconds>,
}

impl Default for CatMemory {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl CatMemory {
    /// Create an empty memory holding at most `capacity` entries per buffer.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            recent_actions: VecDeque::with_capacity(capacity + 1),
            recent_moods: VecDeque::with_capacity(capacity + 1),
            recent_rewards: VecDeque::with_capacity(capacity + 1),
            interaction_count: 0,
            last_pet_time: None,
            last_food_time: None,
        }
    }

    /// Maximum entries per buffer.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of recorded actions currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.recent_actions.len()
    }

    /// Whether nothing has been recorded yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.recent_actions.is_empty()
    }

    /// Recent actions, oldest first.
    pub fn actions(&self) -> impl Iterator<Item = PetAction> + '_ {
        self.recent_actions.iter().copied()
    }

    /// Recent moods, oldest first.
    pub fn moods(&self) -> impl Iterator<Item = f64> + '_ {
        self.recent_moods.iter().copied()
    }

    /// Recent rewards, oldest first.
    pub fn rewards(&self) -> impl Iterator<Item = f64> + '_ {
        self.recent_rewards.iter().copied()
    }

    /// Record an action with the mood it was taken in.
    pub fn record_action(&mut self, action: PetAction, mood: f64, reward: f64) {
        self.recent_actions.push_back(action);
        self.recent_moods.push_back(mood);
        self.recent_rewards.push_back(reward);

        while self.recent_actions.len() > self.capacity {
            self.recent_actions.pop_front();
            self.recent_moods.pop_front();
            self.recent_rewards.pop_front();
        }
    }

    fn last_n(&self, n: usize) -> impl Iterator<Item = PetAction> + '_ {
        let skip = self.recent_actions.len().saturating_sub(n);
        self.recent_actions.iter().skip(skip).copied()
    }

    /// Fraction of the last ten actions that were "active". Zero if empty.
    #[must_use]
    pub fn recent_activity_level(&self) -> f64 {
        let window: Vec<PetAction> = self.last_n(RECENT_WINDOW).collect();
        if window.is_empty() {
            return 0.0;
        }
        let active = window.iter().filter(|a| a.is_active()).count();
        active as f64 / window.len() as f64
    }

    /// Distinct actions among the last ten, over the size of the catalogue.
    #[must_use]
    pub fn action_diversity(&self) -> f64 {
        let mut seen = [false; PetAction::COUNT];
        for action in self.last_n(RECENT_WINDOW) {
            seen[usize::from(action.id())] = true;
        }
        seen.iter().filter(|s| **s).count() as f64 / PetAction::COUNT as f64
    }

    /// True iff at least five actions were recorded and the last five use
    /// at most two distinct actions.
    #[must_use]
    pub fn is_repeating_behavior(&self) -> bool {
        if self.recent_actions.len() < REPEAT_WINDOW {
            return false;
        }
        let mut distinct: Vec<PetAction> = self.last_n(REPEAT_WINDOW).collect();
        distinct.sort_unstable();
        distinct.dedup();
        distinct.len() <= 2
    }

    /// Count an interaction and stamp its time.
    pub fn record_interaction(&mut self, kind: InteractionKind, timestamp: Seconds) {
        self.interaction_count += 1;
        match kind {
            InteractionKind::Pet => self.last_pet_time = Some(timestamp),
            InteractionKind::Food => self.last_food_time = Some(timestamp),
            InteractionKind::Other => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_memory_reads_zero() {
        let mem = CatMemory::default();
        assert!(mem.is_empty());
        assert!(mem.recent_activity_level().abs() < f64::EPSILON);
        assert!(mem.action_diversity().abs() < f64::EPSILON);
        assert!(!mem.is_repeating_behavior());
    }

    #[test]
    fn buffers_evict_oldest_first_and_stay_in_sync() {
        let mut mem = CatMemory::new(50);
        for i in 0..60 {
            let action = PetAction::ALL[i % PetAction::COUNT];
            mem.record_action(action, i as f64, -(i as f64));
        }
        assert_eq!(mem.len(), 50);
        assert_eq!(mem.moods().count(), 50);
        assert_eq!(mem.rewards().count(), 50);
        // Entries 0..10 were evicted.
        assert_eq!(mem.moods().next(), Some(10.0));
        assert_eq!(mem.rewards().next(), Some(-10.0));
        assert_eq!(mem.actions().next(), Some(PetAction::ALL[10 % PetAction::COUNT]));
        assert_eq!(mem.moods().last(), Some(59.0));
    }

    #[test]
    fn activity_level_uses_last_ten() {
        let mut mem = CatMemory::default();
        for _ in 0..10 {
            mem.record_action(PetAction::Play, 50.0, 0.0);
        }
        for _ in 0..5 {
            mem.record_action(PetAction::Sleep, 50.0, 0.0);
        }
        assert!((mem.recent_activity_level() - 0.5).abs() < f64::EPSILON);

        let mut short = CatMemory::default();
        short.record_action(PetAction::Explore, 50.0, 0.0);
        short.record_action(PetAction::Idle, 50.0, 0.0);
        assert!((short.recent_activity_level() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn diversity_counts_unique_over_eight() {
        let mut mem = CatMemory::default();
        for action in [PetAction::Idle, PetAction::Idle, PetAction::Groom, PetAction::Play] {
            mem.record_action(action, 50.0, 0.0);
        }
        assert!((mem.action_diversity() - 3.0 / 8.0).abs() < f64::EPSILON);
    }

    #[test]
    fn repetition_needs_five_actions() {
        let mut mem = CatMemory::default();
        for _ in 0..4 {
            mem.record_action(PetAction::Sleep, 50.0, 0.0);
        }
        assert!(!mem.is_repeating_behavior());
        mem.record_action(PetAction::Sleep, 50.0, 0.0);
        assert!(mem.is_repeating_behavior());
    }

    #[test]
    fn two_alternating_actions_still_repeat() {
        let mut mem = CatMemory::default();
        for i in 0..5 {
            let a = if i % 2 == 0 { PetAction::Sleep } else { PetAction::Idle };
            mem.record_action(a, 50.0, 0.0);
        }
        assert!(mem.is_repeating_behavior());
        mem.record_action(PetAction::Play, 50.0, 0.0);
        assert!(!mem.is_repeating_behavior());
    }

    #[test]
    fn interactions_are_stamped() {
        let mut mem = CatMemory::default();
        mem.record_interaction(InteractionKind::Pet, 10.0);
        mem.record_interaction(InteractionKind::Food, 20.0);
        mem.record_interaction(InteractionKind::Other, 30.0);
        assert_eq!(mem.interaction_count, 3);
        assert_eq!(mem.last_pet_time, Some(10.0));
        assert_eq!(mem.last_food_time, Some(20.0));
    }
}
