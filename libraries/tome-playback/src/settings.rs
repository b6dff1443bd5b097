//! Playback settings
//!
//! An explicit value passed into the player at construction and updated
//! through a setter, instead of ambient process-wide state.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Settings consumed by the playback engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackSettings {
    /// Apply smart rewind when resuming playback (default: false)
    pub smart_rewind_enabled: bool,

    /// Advance to the next item when a book finishes (default: true)
    pub autoplay_enabled: bool,

    /// One speed for the whole library instead of per-item (default: false)
    pub global_speed_enabled: bool,

    /// Boost output volume for quiet recordings (default: false)
    pub boost_volume_enabled: bool,

    /// Skip-back interval for `rewind()` in seconds (default: 30)
    pub rewind_interval: f64,

    /// Skip-forward interval for `forward()` in seconds (default: 30)
    pub forward_interval: f64,

    /// Duration of the optional pause fade-out (default: 5s)
    pub fade_out: Duration,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            smart_rewind_enabled: false,
            autoplay_enabled: true,
            global_speed_enabled: false,
            boost_volume_enabled: false,
            rewind_interval: 30.0,
            forward_interval: 30.0,
            fade_out: Duration::from_secs(5),
        }
    }
}

/// Normal output volume
pub const VOLUME_NORMAL: f32 = 1.0;

/// Boosted output volume for quiet recordings
pub const VOLUME_BOOSTED: f32 = 2.0;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings() {
        let settings = PlaybackSettings::default();
        assert!(!settings.smart_rewind_enabled);
        assert!(settings.autoplay_enabled);
        assert!(!settings.global_speed_enabled);
        assert_eq!(settings.rewind_interval, 30.0);
        assert_eq!(settings.forward_interval, 30.0);
        assert_eq!(settings.fade_out, Duration::from_secs(5));
    }
}
