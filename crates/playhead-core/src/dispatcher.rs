//! Deferred action dispatch
//!
//! Dispatching only enqueues. Actions become visible in state when the owner
//! of the [`ActionQueue`] drains it on its next turn, in FIFO order.

use crate::reducer::Action;
use crate::{Error, Result};
use tokio::sync::mpsc;
use tracing::debug;

/// Cloneable handle used to enqueue actions
#[derive(Debug, Clone)]
pub struct Dispatcher {
    tx: mpsc::UnboundedSender<Action>,
}

/// Receiving end of the action queue
#[derive(Debug)]
pub struct ActionQueue {
    rx: mpsc::UnboundedReceiver<Action>,
}

/// Create a connected dispatcher and queue
pub fn action_channel() -> (Dispatcher, ActionQueue) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Dispatcher { tx }, ActionQueue { rx })
}

impl Dispatcher {
    /// Validate and enqueue an action
    pub fn dispatch(&self, action: Action) -> Result<()> {
        action.validate()?;
        debug!(action = action.kind(), "Dispatching action");
        self.tx.send(action).map_err(|_| Error::SessionClosed)
    }

    /// True once the queue has been closed or dropped
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

impl ActionQueue {
    /// Take every action queued so far
    pub fn drain(&mut self) -> Vec<Action> {
        let mut actions = Vec::new();
        while let Ok(action) = self.rx.try_recv() {
            actions.push(action);
        }
        actions
    }

    /// Stop accepting actions and discard anything still queued
    pub fn close(&mut self) {
        self.rx.close();
        while self.rx.try_recv().is_ok() {}
    }
}
