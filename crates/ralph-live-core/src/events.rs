//! Multi-subscriber event fan-out over `tokio::sync::broadcast`.
//!
//! Each subscriber owns an [`EventReceiver`]; dropping it unsubscribes.
//! Events are delivered in emit order. A subscriber that falls more than
//! the channel capacity behind skips the oldest events and keeps going.

use tokio::sync::broadcast::{
    self,
    error::{RecvError, TryRecvError},
};
use tracing::warn;

/// Events buffered per subscriber before it starts lagging.
pub const DEFAULT_CAPACITY: usize = 1024;

/// A typed event source that any number of receivers can subscribe to.
#[derive(Debug, Clone)]
pub struct EventEmitter<T> {
    tx: broadcast::Sender<T>,
}

impl<T: Clone> Default for EventEmitter<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> EventEmitter<T> {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Register a receiver. It sees every event emitted from now on.
    pub fn subscribe(&self) -> EventReceiver<T> {
        EventReceiver {
            rx: self.tx.subscribe(),
        }
    }

    /// Deliver a value to every current receiver.
    pub fn emit(&self, value: T) {
        // Err only means nobody is listening
        let _ = self.tx.send(value);
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

/// Scoped subscription to an [`EventEmitter`].
#[derive(Debug)]
#[must_use = "dropping an EventReceiver immediately unsubscribes"]
pub struct EventReceiver<T> {
    rx: broadcast::Receiver<T>,
}

impl<T: Clone> EventReceiver<T> {
    /// Wait for the next event. `None` once the emitter is gone and the
    /// queue is drained.
    pub async fn recv(&mut self) -> Option<T> {
        loop {
            match self.rx.recv().await {
                Ok(value) => return Some(value),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Event subscriber lagged; oldest events dropped");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Next event if one is already queued.
    pub fn try_recv(&mut self) -> Option<T> {
        loop {
            match self.rx.try_recv() {
                Ok(value) => return Some(value),
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!(skipped, "Event subscriber lagged; oldest events dropped");
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return None,
            }
        }
    }

    /// Stop receiving now.
    pub fn unsubscribe(self) {}
}
