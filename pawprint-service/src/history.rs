//! Action history sink: a bounded per-cat log of what the service decided.

use std::collections::VecDeque;
use std::num::NonZeroUsize;

use chrono::{DateTime, Utc};
use lru::LruCache;
use parking_lot::Mutex;
use pawprint_core::PetAction;
use serde::{Deserialize, Serialize};

use crate::observation::Observation;

/// One logged decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// When the decision was logged.
    pub timestamp: DateTime<Utc>,
    /// Observation the policy saw.
    pub observation: Observation,
    /// Final action after post-processing.
    pub action: PetAction,
    /// Reward, when one was reported.
    pub reward: Option<f64>,
}

/// Summary of one cat's log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryStats {
    /// Cat id.
    pub cat_id: String,
    /// Actions ever logged, including those rotated out.
    pub total_actions: u64,
    /// Oldest retained entry.
    pub first_action: Option<DateTime<Utc>>,
    /// Newest entry.
    pub last_action: Option<DateTime<Utc>>,
}

#[derive(Debug, Default)]
struct CatLog {
    entries: VecDeque<HistoryEntry>,
    total: u64,
}

impl CatLog {
    fn push(&mut self, entry: HistoryEntry, capacity: usize) {
        if self.entries.len() == capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
        self.total += 1;
    }
}

/// Concurrent per-cat action log.
///
/// Each cat keeps at most `capacity` entries, oldest dropped first. At most
/// `max_cats` logs are kept; logging for a new cat beyond that drops the
/// least recently logged cat.
pub struct ActionHistory {
    logs: Mutex<LruCache<String, CatLog>>,
    capacity: usize,
}

impl std::fmt::Debug for ActionHistory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let logs = self.logs.lock();
        f.debug_struct("ActionHistory")
            .field("cats", &logs.len())
            .field("max_cats", &logs.cap())
            .field("capacity", &self.capacity)
            .finish()
    }
}

impl ActionHistory {
    /// Empty history keeping `capacity` entries for each of at most
    /// `max_cats` cats (both at least one).
    #[must_use]
    pub fn new(capacity: usize, max_cats: usize) -> Self {
        let max_cats = NonZeroUsize::new(max_cats).unwrap_or(NonZeroUsize::MIN);
        Self {
            logs: Mutex::new(LruCache::new(max_cats)),
            capacity: capacity.max(1),
        }
    }

    /// Append an entry for `cat_id`.
    pub fn log_action(
        &self,
        cat_id: &str,
        observation: Observation,
        action: PetAction,
        reward: Option<f64>,
    ) {
        let entry = HistoryEntry {
            timestamp: Utc::now(),
            observation,
            action,
            reward,
        };
        let mut logs = self.logs.lock();
        if let Some(log) = logs.get_mut(cat_id) {
            log.push(entry, self.capacity);
            return;
        }
        let mut log = CatLog::default();
        log.push(entry, self.capacity);
        if let Some((evicted, _)) = logs.push(cat_id.to_string(), log) {
            tracing::debug!(cat_id = %evicted, "action history evicted");
        }
    }

    /// Attach a reward to the newest entry. Returns `false` if the cat has
    /// no entries.
    pub fn record_reward(&self, cat_id: &str, reward: f64) -> bool {
        self.logs
            .lock()
            .get_mut(cat_id)
            .and_then(|log| log.entries.back_mut())
            .map(|e| e.reward = Some(reward))
            .is_some()
    }

    /// The newest `limit` entries (all when `None`), oldest first.
    #[must_use]
    pub fn history(&self, cat_id: &str, limit: Option<usize>) -> Vec<HistoryEntry> {
        let logs = self.logs.lock();
        let Some(log) = logs.peek(cat_id) else {
            return Vec::new();
        };
        let skip = limit.map_or(0, |n| log.entries.len().saturating_sub(n));
        log.entries.iter().skip(skip).cloned().collect()
    }

    /// Forget a cat's log. Returns how many entries were dropped.
    pub fn clear(&self, cat_id: &str) -> usize {
        self.logs.lock().pop(cat_id).map_or(0, |log| log.entries.len())
    }

    /// Summary for `cat_id`; zeroed for an unknown or evicted cat.
    #[must_use]
    pub fn stats(&self, cat_id: &str) -> HistoryStats {
        let logs = self.logs.lock();
        let log = logs.peek(cat_id);
        HistoryStats {
            cat_id: cat_id.to_string(),
            total_actions: log.map_or(0, |l| l.total),
            first_action: log.and_then(|l| l.entries.front().map(|e| e.timestamp)),
            last_action: log.and_then(|l| l.entries.back().map(|e| e.timestamp)),
        }
    }

    /// Cats with at least one entry.
    #[must_use]
    pub fn cat_count(&self) -> usize {
        self.logs.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use pawprint_core::PetSnapshot;

    use super::*;

    fn obs() -> Observation {
        Observation::from_snapshot(&PetSnapshot::default())
    }

    #[test]
    fn log_is_bounded_but_total_keeps_counting() {
        let h = ActionHistory::new(3, 10);
        for action in [PetAction::Idle, PetAction::Play, PetAction::Sleep, PetAction::Groom] {
            h.log_action("tom", obs(), action, None);
        }
        let kept: Vec<PetAction> = h.history("tom", None).iter().map(|e| e.action).collect();
        assert_eq!(kept, vec![PetAction::Play, PetAction::Sleep, PetAction::Groom]);
        assert_eq!(h.stats("tom").total_actions, 4);
    }

    #[test]
    fn limit_returns_newest() {
        let h = ActionHistory::new(10, 10);
        for action in PetAction::ALL {
            h.log_action("tom", obs(), action, None);
        }
        let last: Vec<PetAction> = h.history("tom", Some(2)).iter().map(|e| e.action).collect();
        assert_eq!(last, vec![PetAction::Explore, PetAction::MeowAtBowl]);
        assert_eq!(h.history("tom", Some(100)).len(), PetAction::COUNT);
    }

    #[test]
    fn reward_attaches_to_newest_entry() {
        let h = ActionHistory::new(10, 10);
        assert!(!h.record_reward("tom", 1.0));
        h.log_action("tom", obs(), PetAction::Idle, None);
        h.log_action("tom", obs(), PetAction::Play, None);
        assert!(h.record_reward("tom", 0.5));
        let entries = h.history("tom", None);
        assert_eq!(entries[0].reward, None);
        assert_eq!(entries[1].reward, Some(0.5));
    }

    #[test]
    fn least_recently_logged_cat_is_dropped() {
        let h = ActionHistory::new(10, 2);
        h.log_action("tom", obs(), PetAction::Idle, None);
        h.log_action("felix", obs(), PetAction::Idle, None);
        h.log_action("tom", obs(), PetAction::Play, None);
        h.log_action("luna", obs(), PetAction::Sleep, None);

        assert_eq!(h.cat_count(), 2);
        assert_eq!(h.stats("felix").total_actions, 0);
        assert_eq!(h.stats("tom").total_actions, 2);
        assert_eq!(h.stats("luna").total_actions, 1);
    }

    #[test]
    fn unknown_cat_and_clear() {
        let h = ActionHistory::new(10, 10);
        let stats = h.stats("ghost");
        assert_eq!(stats.total_actions, 0);
        assert!(stats.first_action.is_none());

        h.log_action("tom", obs(), PetAction::Idle, None);
        h.log_action("tom", obs(), PetAction::Idle, None);
        let stats = h.stats("tom");
        assert!(stats.first_action <= stats.last_action);
        assert_eq!(h.clear("tom"), 2);
        assert!(h.history("tom", None).is_empty());
        assert_eq!(h.cat_count(), 0);
    }
}
