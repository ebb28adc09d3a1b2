//! Adaptive-streaming adapter boundary
//!
//! The DASH player is an external black box. The core never holds on to it:
//! whoever owns the adapter samples it into a [`StreamSnapshot`] and the
//! snapshot travels with the media-signal action into the reducers.

use crate::types::BitrateInfo;
use serde::{Deserialize, Serialize};

/// Track the core samples metrics for
pub const VIDEO_TRACK: &str = "video";

/// Read-only view of an adaptive-streaming player
pub trait StreamAdapter: Send + Sync {
    /// False until playback has been initialized; other calls may fail before that
    fn is_ready(&self) -> bool;

    /// Player volume (0..1)
    fn volume(&self) -> f64;

    /// Stream duration in seconds
    fn duration(&self) -> f64;

    /// Seconds buffered ahead for a track
    fn buffer_length(&self, track: &str) -> f64;

    /// Bitrate ladder for a track
    fn bitrate_info_list(&self, track: &str) -> Vec<BitrateInfo>;

    /// Bandwidth in bits per second of the representation currently playing
    /// in the given period, `None` if no representation switch has happened
    fn representation_bandwidth(&self, track: &str, period_index: u32) -> Option<f64>;
}

/// Values sampled from a [`StreamAdapter`] at one instant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamSnapshot {
    pub ready: bool,
    #[serde(default)]
    pub volume: f64,
    #[serde(default)]
    pub duration: f64,
    #[serde(default)]
    pub buffer_length: f64,
    #[serde(default)]
    pub bitrates: Vec<BitrateInfo>,
    /// Bits per second of the active representation
    #[serde(default)]
    pub bandwidth: Option<f64>,
}

impl StreamSnapshot {
    /// Snapshot of an adapter that is not ready yet
    pub fn not_ready() -> Self {
        Self {
            ready: false,
            volume: 0.0,
            duration: 0.0,
            buffer_length: 0.0,
            bitrates: Vec::new(),
            bandwidth: None,
        }
    }

    /// Sample an adapter. `period_index` is the index of the current stream
    /// period, when one is known.
    pub fn capture(adapter: &dyn StreamAdapter, period_index: Option<u32>) -> Self {
        if !adapter.is_ready() {
            return Self::not_ready();
        }

        Self {
            ready: true,
            volume: adapter.volume(),
            duration: adapter.duration(),
            buffer_length: adapter.buffer_length(VIDEO_TRACK),
            bitrates: adapter.bitrate_info_list(VIDEO_TRACK),
            bandwidth: period_index
                .and_then(|index| adapter.representation_bandwidth(VIDEO_TRACK, index)),
        }
    }

    /// Current bitrate in kbps
    pub fn bitrate_kbps(&self) -> Option<u64> {
        self.bandwidth.map(|bps| (bps / 1000.0).round() as u64)
    }
}
