//! Periodic timing updates
//!
//! The timing slice needs roughly 30 updates per second. A [`TimingLoop`]
//! samples a [`MediaSource`] on a tokio interval and queues one media-signal
//! action per tick. Dropping the loop aborts it.

use crate::dispatcher::Dispatcher;
use crate::reducer::Action;
use crate::state::PlaybackState;
use crate::stream::{StreamAdapter, StreamSnapshot};
use crate::types::MediaSignal;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

/// Something the timing loop can sample
pub trait MediaSource: Send + Sync + 'static {
    /// Current media element signals
    fn signal(&self) -> MediaSignal;

    /// Adaptive-streaming adapter, when the media is streamed
    fn stream_adapter(&self) -> Option<&dyn StreamAdapter> {
        None
    }
}

/// Handle to a running timing loop
#[derive(Debug)]
pub struct TimingLoop {
    handle: JoinHandle<()>,
}

impl TimingLoop {
    /// Spawn the loop on the current tokio runtime
    pub fn spawn(
        source: Arc<dyn MediaSource>,
        dispatcher: Dispatcher,
        playback: watch::Receiver<Arc<PlaybackState>>,
        period: Duration,
    ) -> Self {
        info!(period_ms = period.as_millis() as u64, "Starting timing loop");
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;

                let stream = source.stream_adapter().map(|adapter| {
                    let period_index = playback.borrow().stream_info.as_ref().map(|i| i.index);
                    StreamSnapshot::capture(adapter, period_index)
                });
                let action = Action::UpdateFromMediaSignal {
                    video: source.signal(),
                    stream,
                };
                if dispatcher.dispatch(action).is_err() {
                    debug!("Action queue closed, stopping timing loop");
                    break;
                }
            }
        });
        Self { handle }
    }

    /// Abort the loop
    pub fn stop(&self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for TimingLoop {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
