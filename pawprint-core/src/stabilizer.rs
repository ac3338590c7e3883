//! Emotional hysteresis: keeping the cat's face from flickering.
//!
//! Raw emotion classification jumps whenever a reading crosses a threshold.
//! Each emotion axis therefore keeps an [`AxisPersistenceState`] and only
//! lets the displayed emotion change when:
//!
//! 1. the axis has never been set (first observation), or
//! 2. the call is urgent (a reaction fired or a strong startle stimulus), or
//! 3. the current emotion's hold time has elapsed **and** the same new
//!    candidate was then seen on `required_votes` consecutive calls.
//!
//! ```text
//!            candidate == current           hold elapsed, votes < N
//!           ┌──────────────┐               ┌───────────────┐
//!           ▼              │               ▼               │
//!      ┌─────────┐  differs, hold   ┌─────────┐  votes == N  ┌─────────────┐
//!  ───▶│ Stable  │─────────────────▶│ Pending │─────────────▶│ Transition  │
//!      └─────────┘  not elapsed     └─────────┘              └─────────────┘
//!           ▲          (held)             │ urgent                  │
//!           └─────────────────────────────┴─────────────────────────┘
//! ```
//!
//! While a transition is blocked the axis reports the stable emotion and
//! intensity, but the candidate's mood, arousal and valence.

use serde::{Deserialize, Serialize};

use crate::config::StabilizationConfig;
use crate::types::{EmotionType, EmotionalState, Intensity, Seconds};

/// The independently stabilized emotion tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmotionAxis {
    /// Instantaneous reading from hunger and energy.
    Base,
    /// Smoothed reading from the mood EMA.
    Mood,
}

impl EmotionAxis {
    /// Wire label.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Base => "base",
            Self::Mood => "mood",
        }
    }

    /// Consecutive votes needed to switch emotion on this axis.
    #[must_use]
    pub fn required_votes(self, config: &StabilizationConfig) -> u32 {
        match self {
            Self::Base => config.base_required_votes,
            Self::Mood => config.mood_required_votes,
        }
    }

    /// Minimum time `emotion` is held on this axis before votes count.
    #[must_use]
    pub fn hold_seconds(self, emotion: EmotionType, config: &StabilizationConfig) -> Seconds {
        let hold = config.mood_hold(emotion);
        match self {
            Self::Base => hold * config.base_hold_multiplier,
            Self::Mood => hold,
        }
    }
}

/// What a stabilization call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StabilizeOutcome {
    /// First observation; candidate adopted.
    Initialized,
    /// Candidate equals the stable emotion.
    Unchanged,
    /// Hold time not yet elapsed; stable emotion reported.
    Held,
    /// Hold elapsed, collecting votes; stable emotion reported.
    Voting,
    /// Enough votes; candidate adopted.
    Transitioned,
    /// Urgent call; candidate adopted immediately.
    Forced,
}

impl StabilizeOutcome {
    /// Whether the reported emotion changed on this call.
    #[must_use]
    pub fn changed(self) -> bool {
        matches!(self, Self::Transitioned | Self::Forced)
    }
}

/// Per-pet, per-axis hysteresis state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AxisPersistenceState {
    /// Stable emotion, `None` until first observation.
    pub current_emotion: Option<EmotionType>,
    /// Stable intensity.
    pub current_intensity: Option<Intensity>,
    /// When the stable emotion last changed.
    pub changed_at: Seconds,
    /// Candidate currently collecting votes.
    pub pending_emotion: Option<EmotionType>,
    /// Consecutive votes for `pending_emotion`.
    pub pending_votes: u32,
}

impl AxisPersistenceState {
    /// Feed a candidate reading and get the stabilized one back.
    pub fn stabilize(
        &mut self,
        axis: EmotionAxis,
        candidate: EmotionalState,
        urgent: bool,
        now: Seconds,
        config: &StabilizationConfig,
    ) -> (EmotionalState, StabilizeOutcome) {
        let Some(current) = self.current_emotion else {
            self.adopt(&candidate, now);
            return (candidate, StabilizeOutcome::Initialized);
        };

        if current == candidate.primary_emotion {
            self.current_intensity = Some(candidate.intensity);
            self.clear_pending();
            return (candidate, StabilizeOutcome::Unchanged);
        }

        if urgent {
            self.adopt(&candidate, now);
            return (candidate, StabilizeOutcome::Forced);
        }

        let held =
            candidate.with_label(current, self.current_intensity.unwrap_or(candidate.intensity));

        if now - self.changed_at < axis.hold_seconds(current, config) {
            self.pending_emotion = Some(candidate.primary_emotion);
            self.pending_votes = 0;
            return (held, StabilizeOutcome::Held);
        }

        if self.pending_emotion == Some(candidate.primary_emotion) {
            self.pending_votes += 1;
        } else {
            self.pending_emotion = Some(candidate.primary_emotion);
            self.pending_votes = 1;
        }

        if self.pending_votes >= axis.required_votes(config) {
            self.adopt(&candidate, now);
            (candidate, StabilizeOutcome::Transitioned)
        } else {
            (held, StabilizeOutcome::Voting)
        }
    }

    fn adopt(&mut self, candidate: &EmotionalState, now: Seconds) {
        self.current_emotion = Some(candidate.primary_emotion);
        self.current_intensity = Some(candidate.intensity);
        self.changed_at = now;
        self.clear_pending();
    }

    fn clear_pending(&mut self) {
        self.pending_emotion = None;
        self.pending_votes = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(emotion: EmotionType, mood: f64) -> EmotionalState {
        EmotionalState {
            primary_emotion: emotion,
            intensity: Intensity::Moderate,
            mood_value: mood,
            arousal_level: 0.4,
            valence: 0.0,
        }
    }

    fn config() -> StabilizationConfig {
        StabilizationConfig::default()
    }

    #[test]
    fn first_observation_is_adopted() {
        let mut axis = AxisPersistenceState::default();
        let (out, outcome) = axis.stabilize(
            EmotionAxis::Mood,
            reading(EmotionType::Happy, 70.0),
            false,
            0.0,
            &config(),
        );
        assert_eq!(outcome, StabilizeOutcome::Initialized);
        assert_eq!(out.primary_emotion, EmotionType::Happy);
        assert_eq!(axis.current_emotion, Some(EmotionType::Happy));
    }

    #[test]
    fn identical_candidates_never_vote() {
        let mut axis = AxisPersistenceState::default();
        for t in 0..100 {
            let (out, _) = axis.stabilize(
                EmotionAxis::Base,
                reading(EmotionType::Content, 60.0),
                false,
                f64::from(t) * 10.0,
                &config(),
            );
            assert_eq!(out.primary_emotion, EmotionType::Content);
            assert_eq!(axis.pending_votes, 0);
        }
    }

    #[test]
    fn hold_reports_previous_emotion_with_live_numbers() {
        let cfg = config();
        let mut axis = AxisPersistenceState::default();
        axis.stabilize(EmotionAxis::Mood, reading(EmotionType::Sleepy, 40.0), false, 0.0, &cfg);

        for t in [1.0, 50.0, 120.0, 239.0] {
            let (out, outcome) = axis.stabilize(
                EmotionAxis::Mood,
                reading(EmotionType::Happy, 77.0),
                false,
                t,
                &cfg,
            );
            assert_eq!(outcome, StabilizeOutcome::Held);
            assert_eq!(out.primary_emotion, EmotionType::Sleepy);
            assert!((out.mood_value - 77.0).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn votes_count_only_after_hold() {
        let cfg = config();
        let mut axis = AxisPersistenceState::default();
        axis.stabilize(EmotionAxis::Mood, reading(EmotionType::Sleepy, 40.0), false, 0.0, &cfg);

        let (out, outcome) = axis.stabilize(
            EmotionAxis::Mood,
            reading(EmotionType::Happy, 77.0),
            false,
            240.0,
            &cfg,
        );
        assert_eq!(outcome, StabilizeOutcome::Voting);
        assert_eq!(out.primary_emotion, EmotionType::Sleepy);
        assert_eq!(axis.pending_votes, 1);

        let (out, outcome) = axis.stabilize(
            EmotionAxis::Mood,
            reading(EmotionType::Happy, 77.0),
            false,
            241.0,
            &cfg,
        );
        assert_eq!(outcome, StabilizeOutcome::Transitioned);
        assert_eq!(out.primary_emotion, EmotionType::Happy);
        assert_eq!(axis.pending_votes, 0);
        assert!((axis.changed_at - 241.0).abs() < f64::EPSILON);
    }

    #[test]
    fn base_axis_needs_double_hold_and_three_votes() {
        let cfg = config();
        let mut axis = AxisPersistenceState::default();
        axis.stabilize(EmotionAxis::Base, reading(EmotionType::Sleepy, 40.0), false, 0.0, &cfg);

        let (_, outcome) = axis.stabilize(
            EmotionAxis::Base,
            reading(EmotionType::Happy, 77.0),
            false,
            300.0,
            &cfg,
        );
        assert_eq!(outcome, StabilizeOutcome::Held);

        for t in [480.0, 481.0] {
            let (out, outcome) = axis.stabilize(
                EmotionAxis::Base,
                reading(EmotionType::Happy, 77.0),
                false,
                t,
                &cfg,
            );
            assert_eq!(outcome, StabilizeOutcome::Voting);
            assert_eq!(out.primary_emotion, EmotionType::Sleepy);
        }
        let (out, outcome) = axis.stabilize(
            EmotionAxis::Base,
            reading(EmotionType::Happy, 77.0),
            false,
            482.0,
            &cfg,
        );
        assert_eq!(outcome, StabilizeOutcome::Transitioned);
        assert_eq!(out.primary_emotion, EmotionType::Happy);
    }

    #[test]
    fn interleaved_candidate_resets_votes_to_one() {
        let cfg = config();
        let mut axis = AxisPersistenceState::default();
        axis.stabilize(EmotionAxis::Base, reading(EmotionType::Content, 60.0), false, 0.0, &cfg);

        let t0 = 1_000.0;
        axis.stabilize(EmotionAxis::Base, reading(EmotionType::Happy, 75.0), false, t0, &cfg);
        axis.stabilize(EmotionAxis::Base, reading(EmotionType::Happy, 75.0), false, t0 + 1.0, &cfg);
        assert_eq!(axis.pending_votes, 2);

        axis.stabilize(
            EmotionAxis::Base,
            reading(EmotionType::Playful, 75.0),
            false,
            t0 + 2.0,
            &cfg,
        );
        assert_eq!(axis.pending_emotion, Some(EmotionType::Playful));
        assert_eq!(axis.pending_votes, 1);
    }

    #[test]
    fn returning_to_stable_emotion_clears_votes() {
        let cfg = config();
        let mut axis = AxisPersistenceState::default();
        axis.stabilize(EmotionAxis::Mood, reading(EmotionType::Content, 60.0), false, 0.0, &cfg);
        axis.stabilize(EmotionAxis::Mood, reading(EmotionType::Happy, 75.0), false, 500.0, &cfg);
        assert_eq!(axis.pending_votes, 1);
        axis.stabilize(EmotionAxis::Mood, reading(EmotionType::Content, 60.0), false, 501.0, &cfg);
        assert_eq!(axis.pending_votes, 0);
        assert_eq!(axis.pending_emotion, None);
    }

    #[test]
    fn urgent_call_switches_immediately_and_restarts_hold() {
        let cfg = config();
        let mut axis = AxisPersistenceState::default();
        axis.stabilize(EmotionAxis::Mood, reading(EmotionType::Sleepy, 40.0), false, 0.0, &cfg);

        let (out, outcome) =
            axis.stabilize(EmotionAxis::Mood, reading(EmotionType::Scared, 20.0), true, 5.0, &cfg);
        assert_eq!(outcome, StabilizeOutcome::Forced);
        assert_eq!(out.primary_emotion, EmotionType::Scared);
        assert!((axis.changed_at - 5.0).abs() < f64::EPSILON);

        // Scared now holds for 30 s.
        let (out, outcome) = axis.stabilize(
            EmotionAxis::Mood,
            reading(EmotionType::Content, 60.0),
            false,
            20.0,
            &cfg,
        );
        assert_eq!(outcome, StabilizeOutcome::Held);
        assert_eq!(out.primary_emotion, EmotionType::Scared);
    }
}
