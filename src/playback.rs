//! Playback configuration shared between the coordinator and its callers.

/// Shortest accepted slideshow interval; also the floor applied when the
/// scheduler evaluates whether a switch is due.
pub const MIN_INTERVAL_MILLIS: u64 = 1_000;
/// Longest accepted slideshow interval (10 minutes).
pub const MAX_INTERVAL_MILLIS: u64 = 600_000;

const DEFAULT_INTERVAL_MILLIS: u64 = 10_000;

/// Snapshot of the playback controls. The coordinator owns the live copy;
/// callers receive clones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackState {
    pub paused: bool,
    pub interval_millis: u64,
    /// Absolute-priority override; served before any rotation tier.
    pub forced_path: Option<String>,
    /// Normalized `"yyyy/mm/dd/"` prefix restricting rotation, or `None`.
    pub date_filter_prefix: Option<String>,
    pub loop_video: bool,
    pub video_paused: bool,
    pub muted: bool,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self {
            paused: false,
            interval_millis: DEFAULT_INTERVAL_MILLIS,
            forced_path: None,
            date_filter_prefix: None,
            loop_video: false,
            video_paused: false,
            muted: false,
        }
    }
}

impl PlaybackState {
    /// Apply a new interval if it is within range. Out-of-range values are
    /// ignored and the prior interval is retained; returns whether the
    /// value was accepted.
    pub fn set_interval_millis(&mut self, ms: u64) -> bool {
        if (MIN_INTERVAL_MILLIS..=MAX_INTERVAL_MILLIS).contains(&ms) {
            self.interval_millis = ms;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_defaults_to_ten_seconds() {
        assert_eq!(PlaybackState::default().interval_millis, 10_000);
    }

    #[test]
    fn out_of_range_intervals_are_ignored() {
        let mut state = PlaybackState::default();
        assert!(!state.set_interval_millis(500));
        assert_eq!(state.interval_millis, 10_000);
        assert!(!state.set_interval_millis(700_000));
        assert_eq!(state.interval_millis, 10_000);
        assert!(state.set_interval_millis(1_000));
        assert_eq!(state.interval_millis, 1_000);
        assert!(state.set_interval_millis(600_000));
        assert_eq!(state.interval_millis, 600_000);
    }
}
