//! Playhead Core - Video Player Logic without a UI
//!
//! This crate provides the framework-independent parts of a video player:
//! - Frame-accurate timecode conversion and start-time parsing
//! - Buffered range display math
//! - Pure reducers for the playback and timing state slices
//! - Command validation and keyboard shortcuts
//! - Deferred dispatch, state subscriptions, and the timing loop
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        Playhead Core                            │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                                                                 │
//! │   UI events ──► ┌──────────────┐ ──► MediaCommand ──► media     │
//! │                 │   Command    │                       element  │
//! │                 │   Surface    │                         │      │
//! │                 └──────┬───────┘                         │      │
//! │                        │ Action          MediaSignal     │      │
//! │                        ▼                 (timing loop)   │      │
//! │                 ┌──────────────┐ ◄───────────────────────┘      │
//! │                 │  Dispatcher  │                                │
//! │                 │   (queue)    │                                │
//! │                 └──────┬───────┘                                │
//! │                        │ next turn                              │
//! │          ┌─────────────┴─────────────┐                          │
//! │          ▼                           ▼                          │
//! │  ┌──────────────┐           ┌──────────────┐                    │
//! │  │   Playback   │           │    Timing    │ ◄── Timecode,      │
//! │  │   reducer    │           │   reducer    │     Buffered       │
//! │  └──────┬───────┘           └──────┬───────┘                    │
//! │         └──────── watch ───────────┘──► subscribers             │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod buffered;
pub mod commands;
pub mod config;
pub mod dispatcher;
pub mod duration;
pub mod error;
pub mod query;
pub mod reducer;
pub mod session;
pub mod simulate;
pub mod state;
pub mod stream;
pub mod ticker;
pub mod timecode;
pub mod types;

pub use buffered::{buffered_percent, compute_buffered_sections, BufferedRange};
pub use commands::{CommandSubscription, CommandSurface, KeyEvent, MediaCommand, Shortcut};
pub use config::PlayerConfig;
pub use dispatcher::{action_channel, ActionQueue, Dispatcher};
pub use duration::parse_duration;
pub use error::{Error, Result};
pub use query::{parse_query_string, start_time_from_query, QueryParams, QueryValue};
pub use reducer::{decode_action, is_playing, reduce_playback, reduce_timing, Action};
pub use session::PlayerSession;
pub use simulate::SimulatedMedia;
pub use state::{OptionsPatch, PlaybackPatch, PlaybackState, PlayerOptions, TimingState};
pub use stream::{StreamAdapter, StreamSnapshot};
pub use ticker::{MediaSource, TimingLoop};
pub use timecode::{
    format_basic_time, parse_duration_to_millis, seconds_to_timecode, timecode_to_seconds,
    validate_timecode, Timecode, DEFAULT_FRAME_RATE,
};
pub use types::*;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Log library initialization
pub fn init() {
    tracing::info!(version = VERSION, "Playhead Core initialized");
}
