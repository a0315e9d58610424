//! Navigation loop detection.
//!
//! A sliding window of recent navigation timestamps drives a four-phase state
//! machine:
//!
//! ```text
//! NORMAL -> WARNING -> EMERGENCY -> RECOVERING -> NORMAL
//!    ^         |           |
//!    +---------+-----------+   (window emptied without recovery)
//! ```
//!
//! The detector only reports transitions. Acting on EMERGENCY is the
//! recovery controller's job.

use std::collections::VecDeque;

use navsync_config::LoopDetectionConfig;
use serde::{Deserialize, Serialize};

use crate::clock::Millis;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoopPhase {
    Normal,
    Warning,
    Emergency,
    Recovering,
}

impl std::fmt::Display for LoopPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoopPhase::Normal => write!(f, "normal"),
            LoopPhase::Warning => write!(f, "warning"),
            LoopPhase::Emergency => write!(f, "emergency"),
            LoopPhase::Recovering => write!(f, "recovering"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PhaseTransition {
    pub from: LoopPhase,
    pub to: LoopPhase,
    pub at: Millis,
    /// Events in the window when the transition happened.
    pub count: usize,
}

#[derive(Debug, Clone)]
pub struct LoopDetector {
    recent_events: VecDeque<Millis>,
    window_ms: u64,
    warning_threshold: usize,
    emergency_threshold: usize,
    phase: LoopPhase,
}

impl LoopDetector {
    pub fn new(window_ms: u64, warning_threshold: usize, emergency_threshold: usize) -> Self {
        Self {
            recent_events: VecDeque::new(),
            window_ms,
            warning_threshold,
            emergency_threshold,
            phase: LoopPhase::Normal,
        }
    }

    pub fn from_config(config: &LoopDetectionConfig) -> Self {
        Self::new(
            config.window_ms(),
            config.warning_threshold(),
            config.emergency_threshold(),
        )
    }

    pub fn phase(&self) -> LoopPhase {
        self.phase
    }

    /// Events currently inside the window.
    pub fn count(&self) -> usize {
        self.recent_events.len()
    }

    pub fn window_ms(&self) -> u64 {
        self.window_ms
    }

    /// Count one navigation event.
    ///
    /// An event that crosses both thresholds at once reports NORMAL→WARNING
    /// and WARNING→EMERGENCY in that order. While recovering, events are
    /// counted but never cause a transition.
    pub fn record(&mut self, at: Millis) -> Vec<PhaseTransition> {
        self.recent_events.push_back(at);
        self.prune(at);

        let mut transitions = Vec::new();
        let count = self.count();

        if self.phase == LoopPhase::Normal && count >= self.warning_threshold {
            transitions.push(self.transition(LoopPhase::Warning, at));
        }
        if self.phase == LoopPhase::Warning && count >= self.emergency_threshold {
            transitions.push(self.transition(LoopPhase::Emergency, at));
        }

        transitions
    }

    /// Drop events that left the window. A spike that drains completely
    /// without recovery returns the detector to NORMAL.
    pub fn expire(&mut self, now: Millis) -> Option<PhaseTransition> {
        self.prune(now);
        let healable = matches!(self.phase, LoopPhase::Warning | LoopPhase::Emergency);
        if healable && self.recent_events.is_empty() {
            return Some(self.transition(LoopPhase::Normal, now));
        }
        None
    }

    /// EMERGENCY → RECOVERING. Clears the window. No-op in any other phase.
    pub fn begin_recovery(&mut self, at: Millis) -> Option<PhaseTransition> {
        if self.phase != LoopPhase::Emergency {
            return None;
        }
        let transition = self.transition(LoopPhase::Recovering, at);
        self.recent_events.clear();
        Some(transition)
    }

    /// RECOVERING → NORMAL. Clears the window. No-op in any other phase.
    pub fn finish_recovery(&mut self, at: Millis) -> Option<PhaseTransition> {
        if self.phase != LoopPhase::Recovering {
            return None;
        }
        self.recent_events.clear();
        Some(self.transition(LoopPhase::Normal, at))
    }

    pub fn clear_window(&mut self) {
        self.recent_events.clear();
    }

    fn prune(&mut self, now: Millis) {
        while let Some(&oldest) = self.recent_events.front() {
            if now.saturating_sub(oldest) > self.window_ms {
                self.recent_events.pop_front();
            } else {
                break;
            }
        }
    }

    fn transition(&mut self, to: LoopPhase, at: Millis) -> PhaseTransition {
        let transition = PhaseTransition {
            from: self.phase,
            to,
            at,
            count: self.count(),
        };
        self.phase = to;
        transition
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detector() -> LoopDetector {
        LoopDetector::from_config(&LoopDetectionConfig::default())
    }

    fn record_many(detector: &mut LoopDetector, times: &[Millis]) -> Vec<PhaseTransition> {
        times.iter().flat_map(|&t| detector.record(t)).collect()
    }

    #[test]
    fn test_four_events_stay_normal() {
        let mut detector = detector();
        let transitions = record_many(&mut detector, &[0, 500, 1000, 1500]);
        assert!(transitions.is_empty());
        assert_eq!(detector.phase(), LoopPhase::Normal);
    }

    #[test]
    fn test_fifth_event_in_window_enters_warning() {
        let mut detector = detector();
        record_many(&mut detector, &[0, 800, 1600, 2400]);
        let transitions = detector.record(3200);
        assert_eq!(transitions.len(), 1);
        assert_eq!(transitions[0].from, LoopPhase::Normal);
        assert_eq!(transitions[0].to, LoopPhase::Warning);
        assert_eq!(transitions[0].count, 5);
    }

    #[test]
    fn test_seventh_event_in_window_enters_emergency() {
        let mut detector = detector();
        record_many(&mut detector, &[0, 500, 1000, 1500, 2000, 2500]);
        assert_eq!(detector.phase(), LoopPhase::Warning);

        let transitions = detector.record(3000);
        assert_eq!(
            transitions,
            vec![PhaseTransition {
                from: LoopPhase::Warning,
                to: LoopPhase::Emergency,
                at: 3000,
                count: 7,
            }]
        );
    }

    #[test]
    fn test_slow_events_never_warn() {
        let mut detector = detector();
        let times: Vec<Millis> = (0..20).map(|i| i * 1_500).collect();
        let transitions = record_many(&mut detector, &times);
        assert!(transitions.is_empty());
        assert!(detector.count() <= 4);
    }

    #[test]
    fn test_crossing_both_thresholds_reports_both_in_order() {
        let mut detector = LoopDetector::new(5_000, 1, 1);
        let transitions = detector.record(0);
        let phases: Vec<(LoopPhase, LoopPhase)> =
            transitions.iter().map(|t| (t.from, t.to)).collect();
        assert_eq!(
            phases,
            vec![
                (LoopPhase::Normal, LoopPhase::Warning),
                (LoopPhase::Warning, LoopPhase::Emergency)
            ]
        );
    }

    #[test]
    fn test_warning_self_heals_when_window_empties() {
        let mut detector = detector();
        record_many(&mut detector, &[0, 100, 200, 300, 400]);
        assert_eq!(detector.phase(), LoopPhase::Warning);

        assert!(detector.expire(4_000).is_none(), "window not yet empty");
        let healed = detector.expire(5_401).unwrap();
        assert_eq!(healed.from, LoopPhase::Warning);
        assert_eq!(healed.to, LoopPhase::Normal);
        assert_eq!(detector.count(), 0);
    }

    #[test]
    fn test_emergency_self_heals_when_window_empties() {
        let mut detector = detector();
        record_many(&mut detector, &[0, 100, 200, 300, 400, 500, 600]);
        assert_eq!(detector.phase(), LoopPhase::Emergency);

        let healed = detector.expire(10_000).unwrap();
        assert_eq!(healed.to, LoopPhase::Normal);
    }

    #[test]
    fn test_warning_persists_while_window_partially_full() {
        let mut detector = detector();
        record_many(&mut detector, &[0, 100, 200, 300, 400]);
        detector.record(4_000);
        assert!(detector.expire(5_200).is_none());
        assert_eq!(detector.phase(), LoopPhase::Warning);
    }

    #[test]
    fn test_recovery_cycle() {
        let mut detector = detector();
        record_many(&mut detector, &[0, 100, 200, 300, 400, 500, 600]);

        let begin = detector.begin_recovery(700).unwrap();
        assert_eq!(begin.to, LoopPhase::Recovering);
        assert_eq!(detector.count(), 0);

        // Events during recovery are counted but cause no transitions.
        let during = record_many(&mut detector, &[800, 900, 1000, 1100, 1200, 1300, 1400]);
        assert!(during.is_empty());
        assert_eq!(detector.phase(), LoopPhase::Recovering);
        assert!(detector.expire(20_000).is_none());

        let finish = detector.finish_recovery(10_700).unwrap();
        assert_eq!(finish.from, LoopPhase::Recovering);
        assert_eq!(finish.to, LoopPhase::Normal);
    }

    #[test]
    fn test_begin_recovery_outside_emergency_is_noop() {
        let mut detector = detector();
        assert!(detector.begin_recovery(0).is_none());
        record_many(&mut detector, &[0, 100, 200, 300, 400]);
        assert!(detector.begin_recovery(500).is_none());
        assert_eq!(detector.phase(), LoopPhase::Warning);
    }

    #[test]
    fn test_finish_recovery_outside_recovering_is_noop() {
        let mut detector = detector();
        assert!(detector.finish_recovery(0).is_none());
        assert_eq!(detector.phase(), LoopPhase::Normal);
    }
}
