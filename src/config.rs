use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Result, ensure};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct Configuration {
    /// Root directory holding the `year/month/day` media tree and the two
    /// index tables.
    pub media_root: PathBuf,
    /// Playback defaults applied at startup; all of them remain adjustable
    /// at runtime through the control surface.
    pub playback: PlaybackOptions,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            media_root: PathBuf::new(),
            playback: PlaybackOptions::default(),
        }
    }
}

impl Configuration {
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let s = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&s)?)
    }

    /// Validate runtime invariants that cannot be expressed via serde
    /// defaults alone.
    pub fn validated(self) -> Result<Self> {
        ensure!(
            !self.media_root.as_os_str().is_empty(),
            "media-root must not be empty"
        );
        ensure!(
            self.playback.interval >= Duration::from_secs(1)
                && self.playback.interval <= Duration::from_secs(600),
            "playback.interval must be between 1s and 600s"
        );
        Ok(self)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct PlaybackOptions {
    /// Time between slideshow switches.
    #[serde(with = "humantime_serde")]
    pub interval: Duration,
    /// Whether videos repeat instead of holding their last frame.
    pub loop_video: bool,
    /// Whether video playback starts muted.
    pub muted: bool,
}

impl Default for PlaybackOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
            loop_video: false,
            muted: false,
        }
    }
}
