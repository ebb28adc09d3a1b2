//! In-process media element
//!
//! Applies [`MediaCommand`]s to a [`MediaSignal`] and advances the clock the
//! way a media element would. Used for scripted replays and tests where no
//! real decoder is attached.

use crate::commands::MediaCommand;
use crate::ticker::MediaSource;
use crate::types::{MediaSignal, TimeRange};
use std::sync::Mutex;
use tracing::trace;

/// A media element without a decoder
#[derive(Debug, Clone, Default)]
pub struct SimulatedMedia {
    signal: MediaSignal,
}

impl SimulatedMedia {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load media of a known duration and size; ready to play afterwards
    pub fn load(&mut self, src: impl Into<String>, duration: f64, width: u32, height: u32) {
        self.signal = MediaSignal {
            current_src: Some(src.into()),
            duration,
            video_width: width,
            video_height: height,
            ready_state: 4,
            network_state: 1,
            volume: self.signal.volume,
            muted: self.signal.muted,
            ..Default::default()
        };
    }

    /// Current signals
    pub fn signal(&self) -> &MediaSignal {
        &self.signal
    }

    pub fn set_buffered(&mut self, ranges: Vec<TimeRange>) {
        self.signal.buffered = ranges;
    }

    /// Apply a command the way a media element would
    pub fn apply(&mut self, command: &MediaCommand) {
        trace!(?command, "Simulated media command");
        match command {
            MediaCommand::Play => {
                if self.signal.ended {
                    self.signal.current_time = 0.0;
                    self.signal.ended = false;
                }
                self.signal.paused = false;
            }
            MediaCommand::Pause => self.signal.paused = true,
            MediaCommand::Mute => self.signal.muted = true,
            MediaCommand::Unmute => self.signal.muted = false,
            MediaCommand::PlaybackRate(rate) => self.signal.playback_rate = *rate,
            MediaCommand::Volume(volume) => self.signal.volume = *volume,
            MediaCommand::Seek(seconds) => self.seek(*seconds),
            MediaCommand::SeekByPercent(percent) => self.seek(self.signal.duration * percent),
            MediaCommand::SeekByMilliseconds(millis) => self.seek(millis / 1000.0),
            MediaCommand::Reset => *self = Self::default(),
            MediaCommand::ToggleFullscreen | MediaCommand::RetrieveManifest(_) => {}
        }
    }

    /// Advance the clock by `seconds` of wall time
    pub fn advance(&mut self, seconds: f64) {
        if self.signal.paused || self.signal.ended || self.signal.ready_state < 3 {
            return;
        }
        let next = self.signal.current_time + seconds * self.signal.playback_rate;
        if self.signal.duration.is_finite() && next >= self.signal.duration {
            if self.signal.looping {
                self.signal.current_time = next % self.signal.duration;
            } else {
                self.signal.current_time = self.signal.duration;
                self.signal.ended = true;
                self.signal.paused = true;
            }
        } else {
            self.signal.current_time = next;
        }
    }

    fn seek(&mut self, seconds: f64) {
        if seconds.is_nan() {
            return;
        }
        let upper = if self.signal.duration.is_finite() {
            self.signal.duration
        } else {
            f64::INFINITY
        };
        self.signal.current_time = seconds.clamp(0.0, upper);
        self.signal.ended = false;
    }
}

impl MediaSource for Mutex<SimulatedMedia> {
    fn signal(&self) -> MediaSignal {
        self.lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .signal
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loaded() -> SimulatedMedia {
        let mut media = SimulatedMedia::new();
        media.load("clip.mp4", 10.0, 1280, 720);
        media
    }

    #[test]
    fn test_play_and_advance() {
        let mut media = loaded();
        media.advance(1.0);
        assert_eq!(media.signal().current_time, 0.0);

        media.apply(&MediaCommand::Play);
        media.apply(&MediaCommand::PlaybackRate(2.0));
        media.advance(1.5);
        assert_eq!(media.signal().current_time, 3.0);
    }

    #[test]
    fn test_ends_at_duration() {
        let mut media = loaded();
        media.apply(&MediaCommand::Play);
        media.advance(20.0);
        assert_eq!(media.signal().current_time, 10.0);
        assert!(media.signal().ended);
        assert!(media.signal().paused);

        // Playing again restarts
        media.apply(&MediaCommand::Play);
        assert_eq!(media.signal().current_time, 0.0);
    }

    #[test]
    fn test_seek_clamps() {
        let mut media = loaded();
        media.apply(&MediaCommand::SeekByMilliseconds(-500.0));
        assert_eq!(media.signal().current_time, 0.0);
        media.apply(&MediaCommand::SeekByPercent(0.25));
        assert_eq!(media.signal().current_time, 2.5);
        media.apply(&MediaCommand::Seek(99.0));
        assert_eq!(media.signal().current_time, 10.0);
    }

    #[test]
    fn test_volume_and_mute() {
        let mut media = loaded();
        media.apply(&MediaCommand::Mute);
        media.apply(&MediaCommand::Volume(0.4));
        assert!(media.signal().muted);
        assert_eq!(media.signal().volume, 0.4);
        media.apply(&MediaCommand::Unmute);
        assert!(!media.signal().muted);
    }
}
