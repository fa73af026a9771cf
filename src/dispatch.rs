//! Marshals actions from listener threads onto the UI loop.

use crate::event::Action;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;

/// Called after an action is queued so the UI loop wakes up to drain it.
pub type Waker = Arc<dyn Fn() + Send + Sync>;

/// Create a connected dispatcher and queue.
pub fn channel() -> (Dispatcher, ActionQueue) {
    let (tx, rx) = mpsc::channel();
    (Dispatcher { tx, waker: None }, ActionQueue { rx })
}

/// Sending half, cloned into every key listener.
#[derive(Clone)]
pub struct Dispatcher {
    tx: Sender<Action>,
    waker: Option<Waker>,
}

impl Dispatcher {
    /// Return a dispatcher that calls `waker` after every queued action.
    pub fn with_waker(mut self, waker: Waker) -> Self {
        self.waker = Some(waker);
        self
    }

    /// Queue an action for the UI loop.
    ///
    /// Returns false if the UI side is gone.
    pub fn dispatch(&self, action: Action) -> bool {
        if self.tx.send(action).is_err() {
            log::debug!("Dropping {} action: UI queue closed", action);
            return false;
        }
        if let Some(waker) = &self.waker {
            waker();
        }
        true
    }
}

/// Receiving half, owned by the UI loop.
pub struct ActionQueue {
    rx: Receiver<Action>,
}

impl ActionQueue {
    /// Take every pending action in arrival order without blocking.
    pub fn drain(&self) -> Vec<Action> {
        self.rx.try_iter().collect()
    }
}
