//! Smart rewind policy
//!
//! On resume, playback is nudged backwards proportionally to how long the
//! book sat paused: a short pause rewinds almost nothing, a pause at or
//! beyond the threshold rewinds the full amount. The curve is cubic so the
//! effect stays negligible for quick pauses.

use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Elapsed pause time at which the rewind saturates
pub const REWIND_THRESHOLD_SECS: f64 = 599.0;

/// Maximum rewind applied, in seconds
pub const MAX_REWIND_SECS: f64 = 30.0;

/// Rewind offset in seconds for a given elapsed pause duration
///
/// Saturating and monotonically non-decreasing: 0 at `elapsed = 0`,
/// `MAX_REWIND_SECS` at or beyond the threshold.
pub fn rewind_offset(elapsed_secs: f64) -> f64 {
    let clamped = elapsed_secs.clamp(0.0, REWIND_THRESHOLD_SECS);
    let delta = clamped / REWIND_THRESHOLD_SECS;
    delta.powi(3) * MAX_REWIND_SECS
}

/// Per-item last-pause bookkeeping for smart rewind
///
/// Timestamps are recorded on pause and consumed exactly once on the next
/// resume; a finished book's timestamp is cleared so completion never
/// triggers a rewind.
#[derive(Debug, Default)]
pub struct SmartRewind {
    last_pause: HashMap<String, DateTime<Utc>>,
}

impl SmartRewind {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the pause time for an item
    pub fn record_pause(&mut self, relative_path: &str, at: DateTime<Utc>) {
        self.last_pause.insert(relative_path.to_string(), at);
    }

    /// Clear the recorded pause time for an item
    pub fn clear(&mut self, relative_path: &str) {
        self.last_pause.remove(relative_path);
    }

    /// Consume the recorded pause time and compute the rewind offset
    ///
    /// Returns `None` when no pause is recorded. One-shot: the timestamp
    /// is removed whether or not the caller applies the offset.
    pub fn take_offset(&mut self, relative_path: &str, now: DateTime<Utc>) -> Option<f64> {
        let paused_at = self.last_pause.remove(relative_path)?;
        let elapsed = (now - paused_at).num_milliseconds() as f64 / 1000.0;
        Some(rewind_offset(elapsed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;

    #[test]
    fn zero_elapsed_means_zero_rewind() {
        assert_eq!(rewind_offset(0.0), 0.0);
    }

    #[test]
    fn threshold_elapsed_means_max_rewind() {
        assert_eq!(rewind_offset(REWIND_THRESHOLD_SECS), MAX_REWIND_SECS);
        assert_eq!(rewind_offset(REWIND_THRESHOLD_SECS * 10.0), MAX_REWIND_SECS);
    }

    #[test]
    fn curve_is_monotone_and_bounded() {
        let mut previous = 0.0;
        for i in 0..=1000 {
            let elapsed = i as f64;
            let offset = rewind_offset(elapsed);
            assert!(offset >= previous, "curve decreased at {elapsed}");
            assert!(offset <= MAX_REWIND_SECS);
            previous = offset;
        }
    }

    #[test]
    fn negative_elapsed_clamps_to_zero() {
        assert_eq!(rewind_offset(-5.0), 0.0);
    }

    #[test]
    fn short_pause_rewinds_very_little() {
        // one minute paused out of a ~ten minute threshold
        let offset = rewind_offset(60.0);
        assert!(offset < 0.05, "cubic easing should stay tiny, got {offset}");
    }

    #[test]
    fn take_offset_is_one_shot() {
        let mut rewind = SmartRewind::new();
        let paused_at = Utc::now();
        rewind.record_pause("book", paused_at);

        let now = paused_at + ChronoDuration::seconds(600);
        let offset = rewind.take_offset("book", now).unwrap();
        assert_eq!(offset, MAX_REWIND_SECS);

        // consumed: second resume has nothing to apply
        assert!(rewind.take_offset("book", now).is_none());
    }

    #[test]
    fn clear_removes_recorded_pause() {
        let mut rewind = SmartRewind::new();
        rewind.record_pause("book", Utc::now());
        rewind.clear("book");
        assert!(rewind.take_offset("book", Utc::now()).is_none());
    }
}
