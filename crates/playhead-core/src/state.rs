//! Player state slices
//!
//! Two slices are kept apart on purpose: [`PlaybackState`] changes rarely
//! (play/pause, volume, quality) while [`TimingState`] changes on every tick
//! of the timing loop. Consumers subscribe to the one they render from.

use crate::buffered::BufferedRange;
use crate::timecode::DEFAULT_FRAME_RATE;
use crate::types::{same_f64, BitrateInfo, MediaError, StreamInfo};
use crate::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::sync::Arc;

/// Player configuration options that survive a reset
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerOptions {
    /// Enable the keyboard shortcut table
    pub keyboard_shortcuts: bool,
}

/// Partial update of [`PlayerOptions`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OptionsPatch {
    pub keyboard_shortcuts: Option<bool>,
}

impl PlayerOptions {
    /// Apply a patch, leaving unset fields untouched
    pub fn merged(&self, patch: &OptionsPatch) -> Self {
        Self {
            keyboard_shortcuts: patch.keyboard_shortcuts.unwrap_or(self.keyboard_shortcuts),
        }
    }
}

/// Low-frequency player state
#[derive(Debug, Clone, Serialize)]
pub struct PlaybackState {
    pub is_playing: bool,
    pub is_scrubbing: bool,
    pub is_muted: bool,
    pub is_auto_play: bool,
    pub is_ended: bool,
    pub is_looping: bool,
    pub can_play: bool,
    pub current_src: Option<String>,
    pub error: Option<MediaError>,
    pub network_state: u8,
    pub ready_state: u8,
    pub playback_rate: f64,
    pub video_width: u32,
    pub video_height: u32,
    pub volume: f64,
    pub aspect_ratio: f64,
    pub frame_rate: f64,
    pub options: Arc<PlayerOptions>,

    // Adaptive streaming
    pub bitrates: Option<Vec<BitrateInfo>>,
    /// Current bitrate in kbps
    pub bitrate: Option<u64>,
    pub stream_initialized: Option<bool>,
    pub quality_index: Option<u32>,
    pub stream_info: Option<StreamInfo>,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self {
            is_playing: false,
            is_scrubbing: false,
            is_muted: false,
            is_auto_play: false,
            is_ended: false,
            is_looping: false,
            can_play: false,
            current_src: None,
            error: None,
            network_state: 0,
            ready_state: 0,
            playback_rate: 1.0,
            video_width: 0,
            video_height: 0,
            volume: 1.0,
            aspect_ratio: 16.0 / 9.0,
            frame_rate: DEFAULT_FRAME_RATE,
            options: Arc::new(PlayerOptions::default()),
            bitrates: None,
            bitrate: None,
            stream_initialized: None,
            quality_index: None,
            stream_info: None,
        }
    }
}

impl PartialEq for PlaybackState {
    fn eq(&self, other: &Self) -> bool {
        self.is_playing == other.is_playing
            && self.is_scrubbing == other.is_scrubbing
            && self.is_muted == other.is_muted
            && self.is_auto_play == other.is_auto_play
            && self.is_ended == other.is_ended
            && self.is_looping == other.is_looping
            && self.can_play == other.can_play
            && self.current_src == other.current_src
            && self.error == other.error
            && self.network_state == other.network_state
            && self.ready_state == other.ready_state
            && same_f64(self.playback_rate, other.playback_rate)
            && self.video_width == other.video_width
            && self.video_height == other.video_height
            && same_f64(self.volume, other.volume)
            && same_f64(self.aspect_ratio, other.aspect_ratio)
            && same_f64(self.frame_rate, other.frame_rate)
            && self.options == other.options
            && self.bitrates == other.bitrates
            && self.bitrate == other.bitrate
            && self.stream_initialized == other.stream_initialized
            && self.quality_index == other.quality_index
            && self.stream_info == other.stream_info
    }
}

impl PlaybackState {
    /// Length of one frame in milliseconds
    pub fn frame_duration_ms(&self) -> f64 {
        (1.0 / self.frame_rate) * 1000.0
    }

    /// Apply a shallow patch
    pub fn merged(&self, patch: &PlaybackPatch) -> Self {
        let mut next = self.clone();

        macro_rules! merge {
            ($($field:ident),* $(,)?) => {
                $(
                    if let Some(value) = &patch.$field {
                        next.$field = value.clone();
                    }
                )*
            };
        }

        merge!(
            is_playing,
            is_scrubbing,
            is_muted,
            is_auto_play,
            is_ended,
            is_looping,
            can_play,
            current_src,
            error,
            network_state,
            ready_state,
            playback_rate,
            video_width,
            video_height,
            volume,
            aspect_ratio,
            frame_rate,
            bitrates,
            bitrate,
            stream_initialized,
            quality_index,
            stream_info,
        );
        next
    }
}

/// Partial update of [`PlaybackState`].
///
/// Nullable fields use a double `Option`: absent leaves the field alone,
/// `null` clears it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlaybackPatch {
    pub is_playing: Option<bool>,
    pub is_scrubbing: Option<bool>,
    pub is_muted: Option<bool>,
    pub is_auto_play: Option<bool>,
    pub is_ended: Option<bool>,
    pub is_looping: Option<bool>,
    pub can_play: Option<bool>,
    #[serde(deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub current_src: Option<Option<String>>,
    #[serde(deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub error: Option<Option<MediaError>>,
    pub network_state: Option<u8>,
    pub ready_state: Option<u8>,
    pub playback_rate: Option<f64>,
    pub video_width: Option<u32>,
    pub video_height: Option<u32>,
    pub volume: Option<f64>,
    pub aspect_ratio: Option<f64>,
    pub frame_rate: Option<f64>,
    #[serde(deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub bitrates: Option<Option<Vec<BitrateInfo>>>,
    #[serde(deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub bitrate: Option<Option<u64>>,
    #[serde(deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub stream_initialized: Option<Option<bool>>,
    #[serde(deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub quality_index: Option<Option<u32>>,
    #[serde(deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub stream_info: Option<Option<StreamInfo>>,
}

impl PlaybackPatch {
    /// Patch that only toggles the scrubbing flag
    pub fn scrubbing(is_scrubbing: bool) -> Self {
        Self {
            is_scrubbing: Some(is_scrubbing),
            ..Default::default()
        }
    }

    /// Check the numeric invariants of the fields being set
    pub fn validate(&self) -> Result<()> {
        if let Some(volume) = self.volume {
            if !(0.0..=1.0).contains(&volume) {
                return Err(Error::InvalidVolume(volume));
            }
        }
        if let Some(rate) = self.playback_rate {
            if !(rate.is_finite() && rate > 0.0) {
                return Err(Error::InvalidPlaybackRate(rate));
            }
        }
        if let Some(frame_rate) = self.frame_rate {
            if !(frame_rate.is_finite() && frame_rate > 0.0) {
                return Err(Error::InvalidFrameRate(frame_rate));
            }
        }
        Ok(())
    }
}

fn double_option<'de, T, D>(deserializer: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

/// High-frequency timing state
#[derive(Debug, Clone, Serialize)]
pub struct TimingState {
    /// Seconds
    pub current_time: f64,
    /// Seconds, NaN when unknown
    pub duration: f64,
    /// Percent played
    pub progress: f64,
    /// Percent buffered up to the end of the last buffered range
    pub buffered: f64,
    pub buffered_sections: Vec<BufferedRange>,
    /// Seconds of media buffered ahead (adaptive streaming only)
    pub buffer_length: f64,
}

impl Default for TimingState {
    fn default() -> Self {
        Self {
            current_time: 0.0,
            duration: 0.0,
            progress: 0.0,
            buffered: 0.0,
            buffered_sections: Vec::new(),
            buffer_length: 0.0,
        }
    }
}

impl PartialEq for TimingState {
    fn eq(&self, other: &Self) -> bool {
        same_f64(self.current_time, other.current_time)
            && same_f64(self.duration, other.duration)
            && same_f64(self.progress, other.progress)
            && same_f64(self.buffered, other.buffered)
            && self.buffered_sections == other.buffered_sections
            && same_f64(self.buffer_length, other.buffer_length)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_playback_defaults() {
        let state = PlaybackState::default();
        assert_eq!(state.playback_rate, 1.0);
        assert_eq!(state.volume, 1.0);
        assert_eq!(state.frame_rate, 30.0);
        assert_eq!(state.aspect_ratio, 16.0 / 9.0);
        assert!(!state.options.keyboard_shortcuts);
    }

    #[test]
    fn test_frame_duration() {
        let state = PlaybackState {
            frame_rate: 25.0,
            ..Default::default()
        };
        assert_eq!(state.frame_duration_ms(), 40.0);
    }

    #[test]
    fn test_patch_merge() {
        let state = PlaybackState {
            current_src: Some("a.mp4".into()),
            ..Default::default()
        };
        let patch: PlaybackPatch =
            serde_json::from_str(r#"{"is_scrubbing": true, "current_src": null}"#).unwrap();
        let next = state.merged(&patch);
        assert!(next.is_scrubbing);
        assert_eq!(next.current_src, None);
        assert_eq!(next.volume, state.volume);
    }

    #[test]
    fn test_patch_absent_field_untouched() {
        let state = PlaybackState {
            current_src: Some("a.mp4".into()),
            ..Default::default()
        };
        let patch: PlaybackPatch = serde_json::from_str(r#"{"volume": 0.25}"#).unwrap();
        let next = state.merged(&patch);
        assert_eq!(next.current_src.as_deref(), Some("a.mp4"));
        assert_eq!(next.volume, 0.25);
    }

    #[test]
    fn test_patch_validation() {
        assert!(PlaybackPatch::default().validate().is_ok());
        let patch = PlaybackPatch {
            volume: Some(1.5),
            ..Default::default()
        };
        assert!(matches!(patch.validate(), Err(Error::InvalidVolume(_))));
        let patch = PlaybackPatch {
            playback_rate: Some(0.0),
            ..Default::default()
        };
        assert!(matches!(patch.validate(), Err(Error::InvalidPlaybackRate(_))));
    }

    #[test]
    fn test_unknown_patch_field_rejected() {
        assert!(serde_json::from_str::<PlaybackPatch>(r#"{"colour": "red"}"#).is_err());
    }

    #[test]
    fn test_timing_equality_with_nan() {
        let a = TimingState {
            duration: f64::NAN,
            progress: f64::NAN,
            ..Default::default()
        };
        assert_eq!(a, a.clone());
    }

    #[test]
    fn test_options_merge() {
        let options = PlayerOptions::default();
        let merged = options.merged(&OptionsPatch {
            keyboard_shortcuts: Some(true),
        });
        assert!(merged.keyboard_shortcuts);
        assert_eq!(options.merged(&OptionsPatch::default()), options);
    }
}
