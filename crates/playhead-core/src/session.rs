//! Player Session - owner of the player state
//!
//! Coordinates:
//! - The playback and timing slices and their subscribers
//! - The deferred action queue
//! - The command surface
//! - The timing loop and teardown

use crate::{
    commands::{CommandSubscription, CommandSurface},
    config::PlayerConfig,
    dispatcher::{action_channel, ActionQueue, Dispatcher},
    reducer::{reduce_playback, reduce_timing},
    state::{PlaybackState, PlayerOptions, TimingState},
    ticker::{MediaSource, TimingLoop},
    types::SessionId,
    Error, Result,
};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, instrument};

/// A single player instance
pub struct PlayerSession {
    /// Unique session ID
    id: SessionId,
    /// Session configuration
    config: PlayerConfig,
    /// Playback slice broadcaster
    playback_tx: watch::Sender<Arc<PlaybackState>>,
    /// Timing slice broadcaster
    timing_tx: watch::Sender<Arc<TimingState>>,
    /// Producer side of the action queue
    dispatcher: Dispatcher,
    /// Pending actions
    queue: ActionQueue,
    /// Command validation and emission
    commands: CommandSurface,
    /// Running timing loop, at most one
    timing_loop: Option<TimingLoop>,
    disposed: bool,
}

impl PlayerSession {
    /// Create a new player session
    pub fn new(config: PlayerConfig) -> Result<Self> {
        let config = config.validated()?;

        let playback = PlaybackState {
            frame_rate: config.frame_rate,
            options: Arc::new(PlayerOptions {
                keyboard_shortcuts: config.keyboard_shortcuts,
            }),
            ..Default::default()
        };
        let (playback_tx, playback_rx) = watch::channel(Arc::new(playback));
        let (timing_tx, timing_rx) = watch::channel(Arc::new(TimingState::default()));
        let (dispatcher, queue) = action_channel();

        let commands = CommandSurface::new(
            dispatcher.clone(),
            playback_rx,
            timing_rx,
            config.playback_rate_options.clone(),
            config.command_capacity,
        )?;

        let id = SessionId::new();
        info!(session_id = %id, frame_rate = config.frame_rate, "Player session created");

        Ok(Self {
            id,
            config,
            playback_tx,
            timing_tx,
            dispatcher,
            queue,
            commands,
            timing_loop: None,
            disposed: false,
        })
    }

    /// Get session ID
    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    /// Current playback slice
    pub fn playback(&self) -> Arc<PlaybackState> {
        Arc::clone(&*self.playback_tx.borrow())
    }

    /// Current timing slice
    pub fn timing(&self) -> Arc<TimingState> {
        Arc::clone(&*self.timing_tx.borrow())
    }

    /// Subscribe to playback slice changes
    pub fn subscribe_playback(&self) -> watch::Receiver<Arc<PlaybackState>> {
        self.playback_tx.subscribe()
    }

    /// Subscribe to timing slice changes
    pub fn subscribe_timing(&self) -> watch::Receiver<Arc<TimingState>> {
        self.timing_tx.subscribe()
    }

    /// Listen to commands for the media element
    pub fn subscribe_commands(&self) -> CommandSubscription {
        self.commands.subscribe()
    }

    /// Command surface for UI interaction
    pub fn commands(&self) -> &CommandSurface {
        &self.commands
    }

    /// Handle for queueing actions from elsewhere
    pub fn dispatcher(&self) -> Dispatcher {
        self.dispatcher.clone()
    }

    /// Apply every queued action, in order. Returns how many were applied.
    ///
    /// Subscribers are only notified for slices whose state actually changed.
    pub fn process_pending(&mut self) -> usize {
        if self.disposed {
            return 0;
        }

        let actions = self.queue.drain();
        for action in &actions {
            let playback = self.playback();
            let next = reduce_playback(&playback, action);
            if !Arc::ptr_eq(&playback, &next) {
                self.playback_tx.send_replace(next);
            }

            let timing = self.timing();
            let next = reduce_timing(&timing, action);
            if !Arc::ptr_eq(&timing, &next) {
                self.timing_tx.send_replace(next);
            }
        }

        if !actions.is_empty() {
            debug!(count = actions.len(), "Processed actions");
        }
        actions.len()
    }

    /// Start the timing loop, replacing any loop already running.
    ///
    /// Must be called from within a tokio runtime.
    #[instrument(skip(self, source))]
    pub fn start_timing_loop(&mut self, source: Arc<dyn MediaSource>) -> Result<()> {
        if self.disposed {
            return Err(Error::SessionClosed);
        }
        if let Some(previous) = self.timing_loop.take() {
            debug!("Restarting timing loop");
            previous.stop();
        }
        self.timing_loop = Some(TimingLoop::spawn(
            source,
            self.dispatcher.clone(),
            self.playback_tx.subscribe(),
            self.config.tick_interval(),
        ));
        Ok(())
    }

    /// Stop the timing loop if one is running
    pub fn stop_timing_loop(&mut self) {
        if let Some(timing_loop) = self.timing_loop.take() {
            timing_loop.stop();
        }
    }

    pub fn is_timing_loop_running(&self) -> bool {
        self.timing_loop
            .as_ref()
            .is_some_and(|timing_loop| !timing_loop.is_finished())
    }

    /// Tear the session down. Afterwards no queued action is applied and
    /// dispatching fails with [`Error::SessionClosed`].
    #[instrument(skip(self), fields(session_id = %self.id))]
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.stop_timing_loop();
        self.queue.close();
        self.disposed = true;
        info!("Player session disposed");
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}

impl Drop for PlayerSession {
    fn drop(&mut self) {
        self.dispose();
    }
}
