//! Core types for Playhead

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a player session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A raw buffered time range in seconds, as reported by the media element
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: f64,
    pub end: f64,
}

impl TimeRange {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }
}

/// Error reported by the media element
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaError {
    /// Media error code (1 = aborted, 2 = network, 3 = decode, 4 = unsupported)
    pub code: u16,
    #[serde(default)]
    pub message: String,
}

/// Snapshot of the raw signals exposed by a media element.
///
/// The core only ever reads these values. Whatever drives the element
/// (a browser, a native decoder, [`crate::SimulatedMedia`]) produces a fresh
/// snapshot for every update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaSignal {
    /// Playback position in seconds
    pub current_time: f64,
    /// Media duration in seconds, NaN while unknown
    pub duration: f64,
    pub paused: bool,
    pub ended: bool,
    /// HTMLMediaElement readyState (0..=4)
    pub ready_state: u8,
    /// HTMLMediaElement networkState (0..=3)
    pub network_state: u8,
    pub muted: bool,
    pub autoplay: bool,
    #[serde(rename = "loop")]
    pub looping: bool,
    pub playback_rate: f64,
    pub volume: f64,
    pub video_width: u32,
    pub video_height: u32,
    /// Buffered ranges in seconds, in the order the element reports them
    pub buffered: Vec<TimeRange>,
    pub current_src: Option<String>,
    pub error: Option<MediaError>,
}

impl Default for MediaSignal {
    fn default() -> Self {
        Self {
            current_time: 0.0,
            duration: f64::NAN,
            paused: true,
            ended: false,
            ready_state: 0,
            network_state: 0,
            muted: false,
            autoplay: false,
            looping: false,
            playback_rate: 1.0,
            volume: 1.0,
            video_width: 0,
            video_height: 0,
            buffered: Vec::new(),
            current_src: None,
            error: None,
        }
    }
}

/// Opaque stream/period handle handed over by the adaptive-streaming adapter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamInfo {
    pub id: String,
    /// Period index, used to look up representation bandwidth
    pub index: u32,
    #[serde(default)]
    pub start: f64,
    #[serde(default)]
    pub duration: f64,
}

/// One entry of the adaptive-streaming bitrate ladder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BitrateInfo {
    pub media_type: String,
    /// Bitrate in bits per second
    pub bitrate: u64,
    pub width: u32,
    pub height: u32,
    pub quality_index: u32,
}

/// A selectable playback speed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackRateOption {
    pub label: String,
    pub value: f64,
}

impl PlaybackRateOption {
    pub fn new(label: impl Into<String>, value: f64) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }

    /// Default speed ladder, ascending
    pub fn defaults() -> Vec<PlaybackRateOption> {
        vec![
            Self::new("1/8", 0.125),
            Self::new("1/4", 0.25),
            Self::new("1/2", 0.5),
            Self::new("1", 1.0),
            Self::new("2", 2.0),
            Self::new("4", 4.0),
            Self::new("8", 8.0),
        ]
    }
}

/// Float equality that treats NaN as equal to NaN.
///
/// State slices carry NaN for unknown durations and aspect ratios, and an
/// update that keeps them unknown must still count as "unchanged".
pub(crate) fn same_f64(a: f64, b: f64) -> bool {
    a == b || (a.is_nan() && b.is_nan())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_signal_defaults() {
        let signal = MediaSignal::default();
        assert!(signal.paused);
        assert!(signal.duration.is_nan());
        assert_eq!(signal.playback_rate, 1.0);
        assert!(signal.buffered.is_empty());
    }

    #[test]
    fn test_media_signal_partial_json() {
        let signal: MediaSignal = serde_json::from_str(
            r#"{"current_time": 5, "paused": false, "ready_state": 4, "loop": true}"#,
        )
        .unwrap();
        assert_eq!(signal.current_time, 5.0);
        assert!(!signal.paused);
        assert!(signal.looping);
        assert_eq!(signal.volume, 1.0);
    }

    #[test]
    fn test_default_rate_options_sorted() {
        let options = PlaybackRateOption::defaults();
        assert!(options.windows(2).all(|w| w[0].value < w[1].value));
        assert_eq!(options.first().unwrap().value, 0.125);
        assert_eq!(options.last().unwrap().value, 8.0);
    }

    #[test]
    fn test_same_f64() {
        assert!(same_f64(f64::NAN, f64::NAN));
        assert!(same_f64(1.5, 1.5));
        assert!(!same_f64(f64::NAN, 0.0));
    }
}
