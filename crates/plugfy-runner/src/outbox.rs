//! Ordered delivery of lifecycle events.
//!
//! Events are queued on a bounded channel and written to the transport by a
//! dedicated flush thread. [`Outbox::drain`] blocks until every event queued
//! before it has been written, which keeps the terminal response of an
//! invocation behind its events.

use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, SyncSender};
use std::thread::{self, JoinHandle};

use plugfy_sdk::Transport;
use serde_json::Value;
use tracing::{debug, warn};

/// Number of events buffered before producers block.
pub const OUTBOX_CAPACITY: usize = 64;

const OUTBOX_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::outbox");

enum OutboxMessage {
    Event(Value),
    Flush(SyncSender<()>),
    Shutdown,
}

/// Cloneable producer side of an [`Outbox`].
#[derive(Clone)]
pub struct OutboxSender {
    sender: SyncSender<OutboxMessage>,
}

impl OutboxSender {
    /// Queues `payload`. Returns `false` once the outbox has shut down.
    #[must_use]
    pub fn push(&self, payload: Value) -> bool {
        self.sender.send(OutboxMessage::Event(payload)).is_ok()
    }
}

impl std::fmt::Debug for OutboxSender {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.debug_struct("OutboxSender").finish_non_exhaustive()
    }
}

/// Bounded FIFO with a flush thread writing to one transport.
#[derive(Debug)]
pub struct Outbox {
    sender: OutboxSender,
    worker: Option<JoinHandle<()>>,
}

impl Outbox {
    /// Starts a flush thread writing to `transport`.
    ///
    /// When the thread cannot be spawned the outbox starts closed and every
    /// push is refused.
    #[must_use]
    pub fn spawn(transport: Arc<dyn Transport>) -> Self {
        let (sender, receiver) = mpsc::sync_channel(OUTBOX_CAPACITY);
        let worker = thread::Builder::new()
            .name("plugfy-outbox".into())
            .spawn(move || flush_loop(&receiver, transport.as_ref()));
        match worker {
            Ok(handle) => Self {
                sender: OutboxSender { sender },
                worker: Some(handle),
            },
            Err(error) => {
                warn!(target: OUTBOX_TARGET, %error, "cannot start flush thread");
                Self::closed()
            }
        }
    }

    fn closed() -> Self {
        let (sender, _) = mpsc::sync_channel(0);
        Self {
            sender: OutboxSender { sender },
            worker: None,
        }
    }

    /// Producer handle for event relays.
    #[must_use]
    pub fn sender(&self) -> OutboxSender {
        self.sender.clone()
    }

    /// Queues `payload`.
    #[must_use]
    pub fn push(&self, payload: Value) -> bool {
        self.sender.push(payload)
    }

    /// Blocks until every event queued so far has been written.
    pub fn drain(&self) {
        let (ack, done) = mpsc::sync_channel(1);
        if self.sender.sender.send(OutboxMessage::Flush(ack)).is_err() || done.recv().is_err() {
            debug!(target: OUTBOX_TARGET, "outbox already stopped");
        }
    }

    /// Writes the remaining events and stops the flush thread.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        if let Some(worker) = self.worker.take() {
            if self.sender.sender.send(OutboxMessage::Shutdown).is_err() {
                debug!(target: OUTBOX_TARGET, "flush thread already stopped");
            }
            if worker.join().is_err() {
                warn!(target: OUTBOX_TARGET, "flush thread panicked");
            }
        }
    }
}

impl Drop for Outbox {
    fn drop(&mut self) {
        self.stop();
    }
}

fn flush_loop(receiver: &Receiver<OutboxMessage>, transport: &dyn Transport) {
    while let Ok(message) = receiver.recv() {
        match message {
            OutboxMessage::Event(payload) => {
                if let Err(error) = transport.send(&payload) {
                    warn!(target: OUTBOX_TARGET, %error, "dropping lifecycle event");
                }
            }
            OutboxMessage::Flush(ack) => {
                if ack.send(()).is_err() {
                    debug!(target: OUTBOX_TARGET, "flush requester went away");
                }
            }
            OutboxMessage::Shutdown => break,
        }
    }
    debug!(target: OUTBOX_TARGET, "flush thread stopped");
}
