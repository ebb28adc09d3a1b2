//! Pure reducers for the playback and timing slices
//!
//! Every reducer takes the current `Arc` and an [`Action`] and returns the
//! next `Arc`. When the merged value equals the input the *same* `Arc` is
//! returned, so subscribers can skip work with [`Arc::ptr_eq`].

use crate::buffered::{buffered_percent, compute_buffered_sections};
use crate::state::{OptionsPatch, PlaybackPatch, PlaybackState, TimingState};
use crate::stream::StreamSnapshot;
use crate::types::{BitrateInfo, MediaSignal, StreamInfo};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::trace;

/// State actions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    /// Derive state from a media element snapshot, and optionally from the
    /// adaptive-streaming adapter
    UpdateFromMediaSignal {
        video: MediaSignal,
        #[serde(default)]
        stream: Option<StreamSnapshot>,
    },
    /// Shallow merge into the playback slice
    UpdateFields { body: PlaybackPatch },
    /// Merge into the options record only
    UpdateOptions { body: OptionsPatch },
    /// Restore playback defaults, keeping the options
    Reset,
    StreamInitialized,
    PeriodSwitch { stream_info: Option<StreamInfo> },
    UpdateQualityIndex { bitrate: Option<BitrateInfo> },
}

impl Action {
    /// Wire name of the action kind
    pub fn kind(&self) -> &'static str {
        match self {
            Action::UpdateFromMediaSignal { .. } => "update_from_media_signal",
            Action::UpdateFields { .. } => "update_fields",
            Action::UpdateOptions { .. } => "update_options",
            Action::Reset => "reset",
            Action::StreamInitialized => "stream_initialized",
            Action::PeriodSwitch { .. } => "period_switch",
            Action::UpdateQualityIndex { .. } => "update_quality_index",
        }
    }

    /// Check payload invariants before the action is queued
    pub fn validate(&self) -> Result<()> {
        match self {
            Action::UpdateFields { body } => body.validate(),
            _ => Ok(()),
        }
    }
}

/// Decode an action from loosely-typed JSON.
///
/// Fails when the `type` discriminant is missing, not a string, or unknown,
/// when a required payload is absent, or when a body is not an object.
pub fn decode_action(value: &Value) -> Result<Action> {
    let kind = value
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| Error::action("action.type is not a string"))?;

    match kind {
        "update_from_media_signal" => {
            if value.get("video").map_or(true, Value::is_null) {
                return Err(Error::action("action.video is not defined"));
            }
        }
        "update_fields" | "update_options" => {
            if !value.get("body").is_some_and(Value::is_object) {
                return Err(Error::action("action.body is not an object"));
            }
        }
        "reset" | "stream_initialized" | "period_switch" | "update_quality_index" => {}
        other => return Err(Error::action(format!("unknown action type: {other}"))),
    }

    let action: Action =
        serde_json::from_value(value.clone()).map_err(|e| Error::action(e.to_string()))?;
    action.validate()?;
    Ok(action)
}

/// Whether a media element is actually playing
pub fn is_playing(video: &MediaSignal) -> bool {
    video.current_time > 0.0 && !video.paused && !video.ended && video.ready_state > 2
}

/// Reduce the playback slice
pub fn reduce_playback(state: &Arc<PlaybackState>, action: &Action) -> Arc<PlaybackState> {
    let next = match action {
        Action::UpdateFromMediaSignal { video, stream } => {
            from_media_signal(state, video, stream.as_ref())
        }
        Action::UpdateFields { body } => state.merged(body),
        Action::UpdateOptions { body } => {
            let options = state.options.merged(body);
            if options == *state.options {
                return Arc::clone(state);
            }
            PlaybackState {
                options: Arc::new(options),
                ..(**state).clone()
            }
        }
        Action::Reset => PlaybackState {
            options: Arc::clone(&state.options),
            ..Default::default()
        },
        Action::StreamInitialized => PlaybackState {
            stream_initialized: Some(true),
            ..(**state).clone()
        },
        Action::PeriodSwitch { stream_info } => PlaybackState {
            stream_info: stream_info.clone(),
            ..(**state).clone()
        },
        Action::UpdateQualityIndex { bitrate } => PlaybackState {
            quality_index: bitrate.as_ref().map(|b| b.quality_index),
            ..(**state).clone()
        },
    };

    settle(state, next, action)
}

/// Reduce the timing slice. Only media-signal updates touch it.
pub fn reduce_timing(state: &Arc<TimingState>, action: &Action) -> Arc<TimingState> {
    let Action::UpdateFromMediaSignal { video, stream } = action else {
        return Arc::clone(state);
    };

    let mut next = TimingState {
        current_time: video.current_time,
        duration: video.duration,
        progress: video.current_time / video.duration * 100.0,
        buffered: buffered_percent(&video.buffered, video.duration),
        buffered_sections: compute_buffered_sections(&video.buffered, video.duration),
        buffer_length: state.buffer_length,
    };

    if let Some(snapshot) = stream.as_ref().filter(|s| s.ready) {
        next.duration = snapshot.duration;
        next.buffer_length = snapshot.buffer_length;
    }

    settle(state, next, action)
}

fn from_media_signal(
    state: &PlaybackState,
    video: &MediaSignal,
    stream: Option<&StreamSnapshot>,
) -> PlaybackState {
    let mut next = PlaybackState {
        is_playing: is_playing(video),
        is_muted: video.muted,
        is_auto_play: video.autoplay,
        is_ended: video.ended,
        is_looping: video.looping,
        // Elements briefly report 0 while switching sources
        playback_rate: if video.playback_rate != 0.0 {
            video.playback_rate
        } else {
            state.playback_rate
        },
        current_src: video.current_src.clone(),
        error: video.error.clone(),
        network_state: video.network_state,
        ready_state: video.ready_state,
        can_play: video.ready_state >= 3,
        video_height: video.video_height,
        video_width: video.video_width,
        volume: video.volume,
        aspect_ratio: video.video_width as f64 / video.video_height as f64,
        ..state.clone()
    };

    if let Some(snapshot) = stream.filter(|s| s.ready) {
        next.bitrates = if state.stream_initialized == Some(true) {
            Some(snapshot.bitrates.clone())
        } else {
            None
        };
        next.bitrate = state.stream_info.as_ref().and(snapshot.bitrate_kbps());
        next.volume = snapshot.volume;
    }

    next
}

/// Keep the original `Arc` when nothing changed
fn settle<T: PartialEq>(state: &Arc<T>, next: T, action: &Action) -> Arc<T> {
    if next == **state {
        trace!(action = action.kind(), "State unchanged");
        Arc::clone(state)
    } else {
        Arc::new(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TimeRange;
    use serde_json::json;

    fn playing_signal() -> MediaSignal {
        MediaSignal {
            current_time: 5.0,
            duration: 10.0,
            paused: false,
            ended: false,
            ready_state: 4,
            video_width: 1920,
            video_height: 1080,
            ..Default::default()
        }
    }

    #[test]
    fn test_is_playing() {
        let base = MediaSignal {
            current_time: 1.0,
            paused: false,
            ended: false,
            ready_state: 4,
            ..Default::default()
        };
        assert!(is_playing(&base));
        assert!(!is_playing(&MediaSignal { current_time: 0.0, ..base.clone() }));
        assert!(!is_playing(&MediaSignal { paused: true, ..base.clone() }));
        assert!(!is_playing(&MediaSignal { ended: true, ..base.clone() }));
        assert!(!is_playing(&MediaSignal { ready_state: 2, ..base.clone() }));
    }

    #[test]
    fn test_media_signal_derives_fields() {
        let state = Arc::new(PlaybackState::default());
        let action = Action::UpdateFromMediaSignal {
            video: playing_signal(),
            stream: None,
        };
        let next = reduce_playback(&state, &action);
        assert!(next.is_playing);
        assert!(next.can_play);
        assert_eq!(next.aspect_ratio, 1920.0 / 1080.0);
    }

    #[test]
    fn test_zero_playback_rate_keeps_previous() {
        let state = Arc::new(PlaybackState {
            playback_rate: 2.0,
            ..Default::default()
        });
        let action = Action::UpdateFromMediaSignal {
            video: MediaSignal {
                playback_rate: 0.0,
                ..playing_signal()
            },
            stream: None,
        };
        assert_eq!(reduce_playback(&state, &action).playback_rate, 2.0);

        let action = Action::UpdateFromMediaSignal {
            video: MediaSignal {
                playback_rate: 0.5,
                ..playing_signal()
            },
            stream: None,
        };
        assert_eq!(reduce_playback(&state, &action).playback_rate, 0.5);
    }

    #[test]
    fn test_empty_patch_keeps_reference() {
        let state = Arc::new(PlaybackState::default());
        let next = reduce_playback(
            &state,
            &Action::UpdateFields {
                body: PlaybackPatch::default(),
            },
        );
        assert!(Arc::ptr_eq(&state, &next));
    }

    #[test]
    fn test_repeated_signal_keeps_reference() {
        // Unknown dimensions give a NaN aspect ratio, which must still compare equal
        let state = Arc::new(PlaybackState::default());
        let action = Action::UpdateFromMediaSignal {
            video: MediaSignal::default(),
            stream: None,
        };
        let first = reduce_playback(&state, &action);
        assert!(first.aspect_ratio.is_nan());
        let second = reduce_playback(&first, &action);
        assert!(Arc::ptr_eq(&first, &second));

        let timing = Arc::new(TimingState::default());
        let first = reduce_timing(&timing, &action);
        let second = reduce_timing(&first, &action);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_reset_keeps_options() {
        let state = Arc::new(PlaybackState::default());
        let state = reduce_playback(
            &state,
            &Action::UpdateOptions {
                body: OptionsPatch {
                    keyboard_shortcuts: Some(true),
                },
            },
        );
        let state = reduce_playback(
            &state,
            &Action::UpdateFields {
                body: PlaybackPatch {
                    volume: Some(0.2),
                    is_scrubbing: Some(true),
                    ..Default::default()
                },
            },
        );

        let reset = reduce_playback(&state, &Action::Reset);
        assert!(Arc::ptr_eq(&reset.options, &state.options));
        assert!(reset.options.keyboard_shortcuts);
        assert_eq!(reset.volume, 1.0);
        assert!(!reset.is_scrubbing);
    }

    #[test]
    fn test_unchanged_options_keep_reference() {
        let state = Arc::new(PlaybackState::default());
        let next = reduce_playback(
            &state,
            &Action::UpdateOptions {
                body: OptionsPatch {
                    keyboard_shortcuts: Some(false),
                },
            },
        );
        assert!(Arc::ptr_eq(&state, &next));
    }

    #[test]
    fn test_stream_actions() {
        let state = Arc::new(PlaybackState::default());
        let state = reduce_playback(&state, &Action::StreamInitialized);
        assert_eq!(state.stream_initialized, Some(true));

        let info = StreamInfo {
            id: "period-0".into(),
            index: 0,
            start: 0.0,
            duration: 60.0,
        };
        let state = reduce_playback(
            &state,
            &Action::PeriodSwitch {
                stream_info: Some(info.clone()),
            },
        );
        assert_eq!(state.stream_info, Some(info));

        let bitrate = BitrateInfo {
            media_type: "video".into(),
            bitrate: 2_500_000,
            width: 1280,
            height: 720,
            quality_index: 3,
        };
        let state = reduce_playback(
            &state,
            &Action::UpdateQualityIndex {
                bitrate: Some(bitrate),
            },
        );
        assert_eq!(state.quality_index, Some(3));
        let state = reduce_playback(&state, &Action::UpdateQualityIndex { bitrate: None });
        assert_eq!(state.quality_index, None);
    }

    #[test]
    fn test_stream_snapshot_fields() {
        let snapshot = StreamSnapshot {
            ready: true,
            volume: 0.4,
            duration: 60.0,
            buffer_length: 8.0,
            bitrates: vec![],
            bandwidth: Some(1_234_567.0),
        };
        let action = Action::UpdateFromMediaSignal {
            video: playing_signal(),
            stream: Some(snapshot),
        };

        // No stream info and not initialized: no bitrate data
        let state = Arc::new(PlaybackState::default());
        let next = reduce_playback(&state, &action);
        assert_eq!(next.bitrate, None);
        assert_eq!(next.bitrates, None);
        assert_eq!(next.volume, 0.4);

        let state = Arc::new(PlaybackState {
            stream_initialized: Some(true),
            stream_info: Some(StreamInfo {
                id: "p".into(),
                index: 0,
                start: 0.0,
                duration: 60.0,
            }),
            ..Default::default()
        });
        let next = reduce_playback(&state, &action);
        assert_eq!(next.bitrate, Some(1235));
        assert_eq!(next.bitrates, Some(vec![]));

        let timing = reduce_timing(&Arc::new(TimingState::default()), &action);
        assert_eq!(timing.duration, 60.0);
        assert_eq!(timing.buffer_length, 8.0);
        // Progress uses the element's own duration
        assert_eq!(timing.progress, 50.0);
    }

    #[test]
    fn test_stream_not_ready_ignored() {
        let action = Action::UpdateFromMediaSignal {
            video: playing_signal(),
            stream: Some(StreamSnapshot::not_ready()),
        };
        let timing = reduce_timing(&Arc::new(TimingState::default()), &action);
        assert_eq!(timing.duration, 10.0);
        assert_eq!(timing.buffer_length, 0.0);
    }

    #[test]
    fn test_timing_update() {
        let state = Arc::new(TimingState::default());
        let action = Action::UpdateFromMediaSignal {
            video: MediaSignal {
                buffered: vec![TimeRange::new(0.0, 1.0), TimeRange::new(2.0, 4.0)],
                ..playing_signal()
            },
            stream: None,
        };
        let next = reduce_timing(&state, &action);
        assert_eq!(next.current_time, 5.0);
        assert_eq!(next.progress, 50.0);
        assert_eq!(next.buffered, 40.0);
        assert_eq!(next.buffered_sections.len(), 2);
        assert_eq!(next.buffered_sections[1].key, "2-4");
    }

    #[test]
    fn test_timing_ignores_other_actions() {
        let state = Arc::new(TimingState::default());
        assert!(Arc::ptr_eq(&state, &reduce_timing(&state, &Action::Reset)));
    }

    #[test]
    fn test_decode_action() {
        let action = decode_action(&json!({
            "type": "update_fields",
            "body": {"is_scrubbing": true}
        }))
        .unwrap();
        assert_eq!(
            action,
            Action::UpdateFields {
                body: PlaybackPatch::scrubbing(true)
            }
        );

        let action = decode_action(&json!({
            "type": "update_from_media_signal",
            "video": {"current_time": 5, "paused": false, "ready_state": 4}
        }))
        .unwrap();
        assert!(matches!(action, Action::UpdateFromMediaSignal { stream: None, .. }));

        assert_eq!(decode_action(&json!({"type": "reset"})).unwrap(), Action::Reset);
    }

    #[test]
    fn test_decode_action_rejects_malformed() {
        let cases = [
            json!({}),
            json!({"type": 7}),
            json!({"type": "explode"}),
            json!({"type": "update_from_media_signal"}),
            json!({"type": "update_fields", "body": null}),
            json!({"type": "update_fields", "body": "volume=1"}),
            json!({"type": "update_options"}),
            json!({"type": "update_fields", "body": {"volume": 3.0}}),
        ];
        for case in cases {
            let err = decode_action(&case).unwrap_err();
            assert!(err.is_contract_violation(), "{case} -> {err}");
        }
    }
}
