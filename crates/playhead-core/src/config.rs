//! Player configuration

use crate::timecode::DEFAULT_FRAME_RATE;
use crate::types::PlaybackRateOption;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Player configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Initial frame rate for timecodes and frame stepping
    pub frame_rate: f64,
    /// Selectable playback speeds; sorted ascending on load
    pub playback_rate_options: Vec<PlaybackRateOption>,
    /// Timing loop period in milliseconds
    pub tick_interval_ms: u64,
    /// Enable keyboard shortcuts from the start
    pub keyboard_shortcuts: bool,
    /// Buffered media commands per listener before the slowest one lags
    pub command_capacity: usize,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            frame_rate: DEFAULT_FRAME_RATE,
            playback_rate_options: PlaybackRateOption::defaults(),
            tick_interval_ms: 33,
            keyboard_shortcuts: false,
            command_capacity: 64,
        }
    }
}

impl PlayerConfig {
    /// Parse and validate a JSON configuration
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: PlayerConfig = serde_json::from_str(json)?;
        config.validated()
    }

    /// Load and validate a JSON configuration file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Check invariants and sort the rate options
    pub fn validated(mut self) -> Result<Self> {
        if !(self.frame_rate.is_finite() && self.frame_rate > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "frame_rate must be positive, got {}",
                self.frame_rate
            )));
        }
        if self.playback_rate_options.is_empty() {
            return Err(Error::InvalidConfig(
                "playback_rate_options must not be empty".into(),
            ));
        }
        if let Some(bad) = self
            .playback_rate_options
            .iter()
            .find(|option| !(option.value.is_finite() && option.value > 0.0))
        {
            return Err(Error::InvalidConfig(format!(
                "playback rate option {} must be positive, got {}",
                bad.label, bad.value
            )));
        }
        if self.tick_interval_ms == 0 {
            return Err(Error::InvalidConfig("tick_interval_ms must be > 0".into()));
        }

        // The first and last options bound the rate range
        self.playback_rate_options
            .sort_by(|a, b| a.value.total_cmp(&b.value));
        Ok(self)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn min_playback_rate(&self) -> f64 {
        self.playback_rate_options.first().map_or(1.0, |o| o.value)
    }

    pub fn max_playback_rate(&self) -> f64 {
        self.playback_rate_options.last().map_or(1.0, |o| o.value)
    }
}
