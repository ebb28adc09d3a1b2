//! Command surface
//!
//! Validates and normalizes commands coming from the UI before they reach
//! the media element (as [`MediaCommand`]s on a broadcast channel) or the
//! state slices (as queued [`Action`]s).

use crate::dispatcher::Dispatcher;
use crate::reducer::Action;
use crate::state::{OptionsPatch, PlaybackPatch, PlaybackState, TimingState};
use crate::stream::{StreamAdapter, StreamSnapshot};
use crate::types::{BitrateInfo, MediaSignal, PlaybackRateOption, StreamInfo};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tracing::{debug, warn};

/// Commands for the media element adapter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", content = "value", rename_all = "snake_case")]
pub enum MediaCommand {
    Play,
    Pause,
    Mute,
    Unmute,
    PlaybackRate(f64),
    Volume(f64),
    /// Absolute position in seconds
    Seek(f64),
    /// Fraction of the duration (0..1)
    SeekByPercent(f64),
    /// Absolute position in milliseconds
    SeekByMilliseconds(f64),
    ToggleFullscreen,
    RetrieveManifest(String),
    Reset,
}

/// Listener handle returned by [`CommandSurface::subscribe`].
///
/// Dropping it, or calling [`CommandSubscription::remove`], detaches the
/// listener.
#[derive(Debug)]
pub struct CommandSubscription {
    rx: broadcast::Receiver<MediaCommand>,
}

impl CommandSubscription {
    /// Wait for the next command. `None` once the surface is gone.
    pub async fn recv(&mut self) -> Option<MediaCommand> {
        loop {
            match self.rx.recv().await {
                Ok(command) => return Some(command),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Command listener lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Next already-emitted command, if any
    pub fn try_recv(&mut self) -> Option<MediaCommand> {
        loop {
            match self.rx.try_recv() {
                Ok(command) => return Some(command),
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    warn!(skipped, "Command listener lagged");
                }
                Err(_) => return None,
            }
        }
    }

    /// Every command emitted since the last call
    pub fn drain(&mut self) -> Vec<MediaCommand> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }

    /// Detach the listener
    pub fn remove(self) {}
}

/// Keyboard shortcuts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Shortcut {
    TogglePlay,
    ToggleMute,
    StepBack,
    StepForward,
    IncreasePlaybackRate,
    DecreasePlaybackRate,
    ResetPlaybackRate,
}

impl Shortcut {
    /// Key code table
    pub const ALL: [(u32, Shortcut); 7] = [
        (32, Shortcut::TogglePlay),
        (77, Shortcut::ToggleMute),
        (37, Shortcut::StepBack),
        (39, Shortcut::StepForward),
        (190, Shortcut::IncreasePlaybackRate),
        (188, Shortcut::DecreasePlaybackRate),
        (191, Shortcut::ResetPlaybackRate),
    ];

    pub fn from_key_code(key_code: u32) -> Option<Self> {
        Self::ALL
            .iter()
            .find(|(code, _)| *code == key_code)
            .map(|(_, shortcut)| *shortcut)
    }

    /// Human-readable key name
    pub fn key_label(&self) -> &'static str {
        match self {
            Shortcut::TogglePlay => "space",
            Shortcut::ToggleMute => "m",
            Shortcut::StepBack => "left",
            Shortcut::StepForward => "right",
            Shortcut::IncreasePlaybackRate => ">",
            Shortcut::DecreasePlaybackRate => "<",
            Shortcut::ResetPlaybackRate => "/",
        }
    }
}

/// A key-down event as seen by the shortcut handler
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyEvent {
    pub key_code: u32,
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
    pub meta: bool,
}

impl KeyEvent {
    /// Unmodified key press
    pub fn new(key_code: u32) -> Self {
        Self {
            key_code,
            ..Default::default()
        }
    }

    pub fn has_modifier(&self) -> bool {
        self.ctrl || self.shift || self.alt || self.meta
    }
}

/// Validating front door for player commands
#[derive(Debug, Clone)]
pub struct CommandSurface {
    commands: broadcast::Sender<MediaCommand>,
    dispatcher: Dispatcher,
    playback: watch::Receiver<Arc<PlaybackState>>,
    timing: watch::Receiver<Arc<TimingState>>,
    /// Sorted ascending, never empty
    rate_options: Arc<[PlaybackRateOption]>,
}

impl CommandSurface {
    /// Create a surface. `rate_options` must be non-empty; it is sorted
    /// ascending here.
    pub fn new(
        dispatcher: Dispatcher,
        playback: watch::Receiver<Arc<PlaybackState>>,
        timing: watch::Receiver<Arc<TimingState>>,
        mut rate_options: Vec<PlaybackRateOption>,
        capacity: usize,
    ) -> Result<Self> {
        if rate_options.is_empty() {
            return Err(Error::InvalidConfig("playback rate options are empty".into()));
        }
        rate_options.sort_by(|a, b| a.value.total_cmp(&b.value));
        let (commands, _) = broadcast::channel(capacity.max(1));
        Ok(Self {
            commands,
            dispatcher,
            playback,
            timing,
            rate_options: rate_options.into(),
        })
    }

    /// Listen to media commands
    pub fn subscribe(&self) -> CommandSubscription {
        CommandSubscription {
            rx: self.commands.subscribe(),
        }
    }

    /// Deliver a command to listeners. Nothing is delivered once the owning
    /// session has been disposed.
    fn emit(&self, command: MediaCommand) {
        if self.dispatcher.is_closed() {
            debug!(?command, "Session closed, dropping media command");
            return;
        }
        debug!(?command, "Emitting media command");
        if self.commands.send(command).is_err() {
            debug!("No media command listeners");
        }
    }

    fn playback(&self) -> Arc<PlaybackState> {
        Arc::clone(&*self.playback.borrow())
    }

    pub fn play(&self) {
        self.emit(MediaCommand::Play);
    }

    pub fn pause(&self) {
        self.emit(MediaCommand::Pause);
    }

    pub fn mute(&self) {
        self.emit(MediaCommand::Mute);
    }

    pub fn unmute(&self) {
        self.emit(MediaCommand::Unmute);
    }

    pub fn toggle_fullscreen(&self) {
        self.emit(MediaCommand::ToggleFullscreen);
    }

    pub fn retrieve_manifest(&self, url: impl Into<String>) {
        self.emit(MediaCommand::RetrieveManifest(url.into()));
    }

    /// Set the volume (0..1), unmuting first when muted
    pub fn set_volume(&self, volume: f64) -> Result<()> {
        if !(0.0..=1.0).contains(&volume) {
            warn!(volume, "Rejected volume");
            return Err(Error::InvalidVolume(volume));
        }
        if self.playback().is_muted && volume > 0.0 {
            self.unmute();
        }
        self.emit(MediaCommand::Volume(volume));
        Ok(())
    }

    /// Set the playback speed
    pub fn set_playback_rate(&self, rate: f64) -> Result<()> {
        if !(rate.is_finite() && rate > 0.0) {
            warn!(rate, "Rejected playback rate");
            return Err(Error::InvalidPlaybackRate(rate));
        }
        self.emit(MediaCommand::PlaybackRate(rate));
        Ok(())
    }

    /// Seek to an absolute position in seconds
    pub fn seek(&self, seconds: f64) -> Result<()> {
        if seconds.is_nan() {
            return Err(Error::InvalidTime(seconds));
        }
        self.emit(MediaCommand::Seek(seconds));
        Ok(())
    }

    /// Seek to a fraction (0..1) of the duration
    pub fn seek_by_percent(&self, percent: f64) -> Result<()> {
        if !(0.0..=1.0).contains(&percent) {
            warn!(percent, "Rejected seek percent");
            return Err(Error::InvalidPercent(percent));
        }
        self.emit(MediaCommand::SeekByPercent(percent));
        Ok(())
    }

    /// Seek to an absolute position in milliseconds. Clamping is left to the
    /// media adapter.
    pub fn seek_by_milliseconds(&self, millis: f64) -> Result<()> {
        if millis.is_nan() {
            return Err(Error::InvalidTime(millis));
        }
        self.emit(MediaCommand::SeekByMilliseconds(millis));
        Ok(())
    }

    /// Jump relative to the current time
    pub fn step(&self, millis: f64) -> Result<()> {
        if millis.is_nan() {
            return Err(Error::InvalidTime(millis));
        }
        let current_time = self.timing.borrow().current_time;
        self.seek_by_milliseconds(current_time * 1000.0 + millis)
    }

    /// One frame back
    pub fn step_back(&self) -> Result<()> {
        self.step(-self.playback().frame_duration_ms())
    }

    /// One frame forward
    pub fn step_forward(&self) -> Result<()> {
        self.step(self.playback().frame_duration_ms())
    }

    /// Double the playback rate, up to the fastest option
    pub fn increase_playback_rate(&self) -> Result<()> {
        let max = self.rate_options[self.rate_options.len() - 1].value;
        self.set_playback_rate(max.min(self.playback().playback_rate * 2.0))
    }

    /// Halve the playback rate, down to the slowest option
    pub fn decrease_playback_rate(&self) -> Result<()> {
        let min = self.rate_options[0].value;
        self.set_playback_rate(min.max(self.playback().playback_rate / 2.0))
    }

    pub fn reset_playback_rate(&self) -> Result<()> {
        self.set_playback_rate(1.0)
    }

    pub fn toggle_play(&self) {
        if self.playback().is_playing {
            self.pause();
        } else {
            self.play();
        }
    }

    pub fn toggle_mute(&self) {
        if self.playback().is_muted {
            self.unmute();
        } else {
            self.mute();
        }
    }

    /// Start scrubbing: always pauses
    pub fn scrub_start(&self) -> Result<()> {
        self.pause();
        self.update(PlaybackPatch::scrubbing(true))
    }

    /// Stop scrubbing and optionally resume playback
    pub fn scrub_stop(&self, resume: bool) -> Result<()> {
        self.update(PlaybackPatch::scrubbing(false))?;
        if resume {
            self.play();
        }
        Ok(())
    }

    /// Run a shortcut command
    pub fn run_shortcut(&self, shortcut: Shortcut) -> Result<()> {
        match shortcut {
            Shortcut::TogglePlay => {
                self.toggle_play();
                Ok(())
            }
            Shortcut::ToggleMute => {
                self.toggle_mute();
                Ok(())
            }
            Shortcut::StepBack => self.step_back(),
            Shortcut::StepForward => self.step_forward(),
            Shortcut::IncreasePlaybackRate => self.increase_playback_rate(),
            Shortcut::DecreasePlaybackRate => self.decrease_playback_rate(),
            Shortcut::ResetPlaybackRate => self.reset_playback_rate(),
        }
    }

    /// Handle a key-down event.
    ///
    /// Returns `true` when a shortcut fired; the caller should then prevent
    /// the default key handling.
    pub fn handle_key_down(&self, event: &KeyEvent) -> Result<bool> {
        if !self.playback().options.keyboard_shortcuts || event.has_modifier() {
            return Ok(false);
        }
        match Shortcut::from_key_code(event.key_code) {
            Some(shortcut) => {
                debug!(?shortcut, key_code = event.key_code, "Keyboard shortcut");
                self.run_shortcut(shortcut)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    // State actions

    /// Queue a state update from a media element snapshot
    pub fn update_state(&self, video: MediaSignal) -> Result<()> {
        self.dispatcher
            .dispatch(Action::UpdateFromMediaSignal { video, stream: None })
    }

    /// Queue a state update from a media element and the streaming adapter
    pub fn update_stream_state(
        &self,
        video: MediaSignal,
        adapter: &dyn StreamAdapter,
    ) -> Result<()> {
        let period_index = self.playback().stream_info.as_ref().map(|info| info.index);
        let stream = StreamSnapshot::capture(adapter, period_index);
        self.dispatcher.dispatch(Action::UpdateFromMediaSignal {
            video,
            stream: Some(stream),
        })
    }

    /// Queue a direct field update
    pub fn update(&self, body: PlaybackPatch) -> Result<()> {
        self.dispatcher.dispatch(Action::UpdateFields { body })
    }

    pub fn update_options(&self, body: OptionsPatch) -> Result<()> {
        self.dispatcher.dispatch(Action::UpdateOptions { body })
    }

    pub fn stream_initialized(&self) -> Result<()> {
        self.dispatcher.dispatch(Action::StreamInitialized)
    }

    /// Reset the media adapter and the playback state
    pub fn reset(&self) -> Result<()> {
        self.emit(MediaCommand::Reset);
        self.dispatcher.dispatch(Action::Reset)
    }

    pub fn period_switch(&self, stream_info: Option<StreamInfo>) -> Result<()> {
        self.dispatcher.dispatch(Action::PeriodSwitch { stream_info })
    }

    pub fn update_quality_index(&self, bitrate: Option<BitrateInfo>) -> Result<()> {
        self.dispatcher.dispatch(Action::UpdateQualityIndex { bitrate })
    }
}
