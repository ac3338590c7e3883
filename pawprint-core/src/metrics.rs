//! Engine counters and decision latency.
//!
//! Counters are plain `AtomicU64`s bumped on the request path and read on
//! export. Latency samples go into a small ring buffer behind a
//! `parking_lot::Mutex`, which is only contended when someone reads
//! percentiles.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use parking_lot::Mutex;

// ---------------------------------------------------------------------------
// Counters
// ---------------------------------------------------------------------------

/// Lock-free counters for engine events.
#[derive(Debug)]
pub struct EngineCounters {
    /// Decisions produced.
    pub decisions: AtomicU64,
    /// Reactions that cleared their probability gate.
    pub reactions_fired: AtomicU64,
    /// Idle quirks that replaced the policy action.
    pub quirks: AtomicU64,
    /// Noise substitutions.
    pub noise_substitutions: AtomicU64,
    /// Distraction overrides.
    pub distractions: AtomicU64,
    /// Stabilized emotion changes on the base axis.
    pub base_transitions: AtomicU64,
    /// Stabilized emotion changes on the mood axis.
    pub mood_transitions: AtomicU64,
    /// Fresh per-pet states created.
    pub pets_created: AtomicU64,
    /// Per-pet states dropped by LRU or idle TTL.
    pub pets_evicted: AtomicU64,
}

impl EngineCounters {
    /// Zeroed counters.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            decisions: AtomicU64::new(0),
            reactions_fired: AtomicU64::new(0),
            quirks: AtomicU64::new(0),
            noise_substitutions: AtomicU64::new(0),
            distractions: AtomicU64::new(0),
            base_transitions: AtomicU64::new(0),
            mood_transitions: AtomicU64::new(0),
            pets_created: AtomicU64::new(0),
            pets_evicted: AtomicU64::new(0),
        }
    }

    /// Bump `counter` by one.
    pub fn incr(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Read every counter.
    #[must_use]
    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            decisions: self.decisions.load(Ordering::Relaxed),
            reactions_fired: self.reactions_fired.load(Ordering::Relaxed),
            quirks: self.quirks.load(Ordering::Relaxed),
            noise_substitutions: self.noise_substitutions.load(Ordering::Relaxed),
            distractions: self.distractions.load(Ordering::Relaxed),
            axis_transitions: [
                self.base_transitions.load(Ordering::Relaxed),
                self.mood_transitions.load(Ordering::Relaxed),
            ],
            pets_created: self.pets_created.load(Ordering::Relaxed),
            pets_evicted: self.pets_evicted.load(Ordering::Relaxed),
        }
    }
}

impl Default for EngineCounters {
    fn default() -> Self {
        Self::new()
    }
}

/// Counter values at one point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CounterSnapshot {
    /// Decisions produced.
    pub decisions: u64,
    /// Reactions fired.
    pub reactions_fired: u64,
    /// Quirk overrides.
    pub quirks: u64,
    /// Noise substitutions.
    pub noise_substitutions: u64,
    /// Distraction overrides.
    pub distractions: u64,
    /// Axis transitions `[base, mood]`.
    pub axis_transitions: [u64; 2],
    /// Pet states created.
    pub pets_created: u64,
    /// Pet states evicted.
    pub pets_evicted: u64,
}

impl CounterSnapshot {
    /// Prometheus text exposition.
    #[must_use]
    pub fn to_prometheus(&self) -> String {
        format!(
            "# HELP pawprint_decisions_total Behavior decisions produced\n\
             # TYPE pawprint_decisions_total counter\n\
             pawprint_decisions_total {}\n\
             # HELP pawprint_reactions_fired_total Reactions that fired\n\
             # TYPE pawprint_reactions_fired_total counter\n\
             pawprint_reactions_fired_total {}\n\
             # HELP pawprint_quirks_total Idle quirk overrides\n\
             # TYPE pawprint_quirks_total counter\n\
             pawprint_quirks_total {}\n\
             # HELP pawprint_noise_substitutions_total Actions replaced by noise\n\
             # TYPE pawprint_noise_substitutions_total counter\n\
             pawprint_noise_substitutions_total {}\n\
             # HELP pawprint_distractions_total Distraction overrides\n\
             # TYPE pawprint_distractions_total counter\n\
             pawprint_distractions_total {}\n\
             # HELP pawprint_axis_transitions_total Stabilized emotion changes by axis\n\
             # TYPE pawprint_axis_transitions_total counter\n\
             pawprint_axis_transitions_total{{axis=\"base\"}} {}\n\
             pawprint_axis_transitions_total{{axis=\"mood\"}} {}\n\
             # HELP pawprint_pets_created_total Per-pet states created\n\
             # TYPE pawprint_pets_created_total counter\n\
             pawprint_pets_created_total {}\n\
             # HELP pawprint_pets_evicted_total Per-pet states evicted\n\
             # TYPE pawprint_pets_evicted_total counter\n\
             pawprint_pets_evicted_total {}\n",
            self.decisions,
            self.reactions_fired,
            self.quirks,
            self.noise_substitutions,
            self.distractions,
            self.axis_transitions[0],
            self.axis_transitions[1],
            self.pets_created,
            self.pets_evicted,
        )
    }
}

// ---------------------------------------------------------------------------
// Decision latency
// ---------------------------------------------------------------------------

const LATENCY_WINDOW: usize = 256;

/// Rolling window of per-decision wall time.
#[derive(Debug)]
pub struct LatencyTracker {
    window: Mutex<LatencyWindow>,
}

#[derive(Debug)]
struct LatencyWindow {
    samples_us: Vec<f64>,
    write_idx: usize,
    count: u64,
}

impl LatencyTracker {
    /// Empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self {
            window: Mutex::new(LatencyWindow {
                samples_us: vec![0.0; LATENCY_WINDOW],
                write_idx: 0,
                count: 0,
            }),
        }
    }

    /// Start timing; the sample is recorded when the guard drops.
    pub fn start(&self) -> LatencyGuard<'_> {
        LatencyGuard {
            tracker: self,
            start: Instant::now(),
        }
    }

    /// Record one sample in microseconds.
    pub fn record(&self, micros: f64) {
        let mut w = self.window.lock();
        let idx = w.write_idx;
        w.samples_us[idx] = micros;
        w.write_idx = (idx + 1) % LATENCY_WINDOW;
        w.count += 1;
    }

    /// Samples recorded since creation.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.window.lock().count
    }

    /// P50 / P99 / max over the window, in microseconds.
    #[must_use]
    pub fn percentiles(&self) -> LatencyPercentiles {
        let w = self.window.lock();
        let n = usize::try_from(w.count).unwrap_or(usize::MAX).min(LATENCY_WINDOW);
        if n == 0 {
            return LatencyPercentiles::default();
        }
        let mut sorted = w.samples_us[..n].to_vec();
        sorted.sort_by(f64::total_cmp);
        LatencyPercentiles {
            p50_us: sorted[n / 2],
            p99_us: sorted[(n * 99 / 100).min(n - 1)],
            max_us: sorted[n - 1],
        }
    }
}

impl Default for LatencyTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Records elapsed time into its tracker on drop.
pub struct LatencyGuard<'a> {
    tracker: &'a LatencyTracker,
    start: Instant,
}

impl Drop for LatencyGuard<'_> {
    fn drop(&mut self) {
        self.tracker.record(self.start.elapsed().as_secs_f64() * 1_000_000.0);
    }
}

/// Latency summary in microseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LatencyPercentiles {
    /// Median.
    pub p50_us: f64,
    /// 99th percentile.
    pub p99_us: f64,
    /// Slowest sample in the window.
    pub max_us: f64,
}

// ---------------------------------------------------------------------------
// Tracing span names
// ---------------------------------------------------------------------------

/// Span names used with `tracing::span!`.
pub mod spans {
    /// One `process_action` call.
    pub const DECIDE: &str = "pawprint::decide";
    /// Axis stabilization.
    pub const STABILIZE: &str = "pawprint::stabilize";
    /// Reaction evaluation.
    pub const REACTIONS: &str = "pawprint::reactions";
    /// Registry idle sweep.
    pub const EVICTION_PASS: &str = "pawprint::eviction";
    /// Service request, policy included.
    pub const SERVICE_DECIDE: &str = "pawprint::service::decide";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_start_at_zero() {
        let snap = EngineCounters::new().snapshot();
        assert_eq!(snap.decisions, 0);
        assert_eq!(snap.axis_transitions, [0, 0]);
    }

    #[test]
    fn incr_shows_in_snapshot() {
        let c = EngineCounters::new();
        EngineCounters::incr(&c.decisions);
        EngineCounters::incr(&c.decisions);
        EngineCounters::incr(&c.mood_transitions);
        c.pets_evicted.fetch_add(4, Ordering::Relaxed);

        let snap = c.snapshot();
        assert_eq!(snap.decisions, 2);
        assert_eq!(snap.axis_transitions, [0, 1]);
        assert_eq!(snap.pets_evicted, 4);
    }

    #[test]
    fn prometheus_export_has_labels() {
        let c = EngineCounters::new();
        c.reactions_fired.fetch_add(7, Ordering::Relaxed);
        let prom = c.snapshot().to_prometheus();
        assert!(prom.contains("pawprint_reactions_fired_total 7"));
        assert!(prom.contains("pawprint_axis_transitions_total{axis=\"mood\"} 0"));
        assert!(prom.contains("# TYPE"));
    }

    #[test]
    fn latency_window_percentiles() {
        let t = LatencyTracker::new();
        assert_eq!(t.percentiles(), LatencyPercentiles::default());
        for i in 1..=100 {
            t.record(f64::from(i));
        }
        let p = t.percentiles();
        assert_eq!(t.count(), 100);
        assert!((p.max_us - 100.0).abs() < f64::EPSILON);
        assert!(p.p50_us <= p.p99_us);
    }

    #[test]
    fn latency_window_wraps() {
        let t = LatencyTracker::new();
        for _ in 0..(LATENCY_WINDOW * 2) {
            t.record(1.0);
        }
        t.record(9.0);
        assert!((t.percentiles().max_us - 9.0).abs() < f64::EPSILON);
    }

    #[test]
    fn guard_records_on_drop() {
        let t = LatencyTracker::new();
        {
            let _g = t.start();
        }
        assert_eq!(t.count(), 1);
    }
}
