//! Single-shot and interactive execution.
//!
//! A single-shot session dispatches one command and closes the channel. An
//! interactive session keeps the channel open: inbound messages are queued by
//! the transport's handler and executed one at a time by a dispatch worker
//! until the channel closes.

use std::sync::mpsc::{self, Receiver, SyncSender, TrySendError};
use std::sync::{Arc, Weak};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use plugfy_sdk::Transport;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::dispatch::{CommandEnvelope, Dispatcher, send, send_failure};
use crate::error::RunnerError;

/// Notice sent when interactive mode starts.
pub const READY_NOTICE: &str = "Interactive mode started. Awaiting commands...";

/// Notice sent once the channel has closed.
pub const ENDED_NOTICE: &str = "Interactive mode ended.";

/// Inbound messages buffered before the runner reports itself busy.
pub const QUEUE_CAPACITY: usize = 32;

/// Interval between checks of the channel's closed flag.
pub const POLL_INTERVAL: Duration = Duration::from_millis(500);

const SESSION_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::session");

enum Job {
    Raw(String),
    Command(CommandEnvelope),
    Stop,
}

/// Drives a dispatcher over one transport.
#[derive(Clone)]
pub struct Session {
    dispatcher: Dispatcher,
    transport: Arc<dyn Transport>,
    poll_interval: Duration,
}

impl Session {
    /// Creates a session polling every [`POLL_INTERVAL`].
    #[must_use]
    pub fn new(dispatcher: Dispatcher, transport: Arc<dyn Transport>) -> Self {
        Self {
            dispatcher,
            transport,
            poll_interval: POLL_INTERVAL,
        }
    }

    /// Overrides the closed-flag polling interval.
    #[must_use]
    pub const fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Dispatches `envelope` and closes the channel.
    pub fn run_once(&self, envelope: &CommandEnvelope) {
        self.dispatcher.dispatch(envelope, &self.transport);
        self.transport.close();
    }

    /// Runs `initial`, if any, then every inbound command, until the channel
    /// closes.
    ///
    /// # Errors
    ///
    /// Returns an error when the dispatch worker cannot start or the
    /// transport refuses the inbound handler.
    pub fn run_interactive(&self, initial: Option<CommandEnvelope>) -> Result<(), RunnerError> {
        let (queue, jobs) = mpsc::sync_channel(QUEUE_CAPACITY);
        let dispatcher = self.dispatcher.clone();
        let transport = Arc::clone(&self.transport);
        let worker = thread::Builder::new()
            .name("plugfy-dispatch".into())
            .spawn(move || work(&jobs, &dispatcher, &transport))
            .map_err(|error| {
                RunnerError::configuration(format!("cannot start dispatch worker: {error}"))
            })?;

        info!(target: SESSION_TARGET, "interactive mode started");
        send(&self.transport, &Value::from(READY_NOTICE));
        if let Some(envelope) = initial {
            submit(&queue, Job::Command(envelope));
        }

        let inbound = queue.clone();
        let channel = Arc::downgrade(&self.transport);
        let subscribed = self.transport.subscribe(Arc::new(move |text: String| {
            enqueue(&inbound, &channel, text);
        }));

        if let Err(error) = subscribed {
            submit(&queue, Job::Stop);
            join(worker);
            return Err(error.into());
        }

        while !self.transport.is_closed() {
            thread::sleep(self.poll_interval);
        }

        submit(&queue, Job::Stop);
        join(worker);
        send(&self.transport, &Value::from(ENDED_NOTICE));
        info!(target: SESSION_TARGET, "interactive mode ended");
        Ok(())
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("Session")
            .field("dispatcher", &self.dispatcher)
            .field("transport", &self.transport.name())
            .field("poll_interval", &self.poll_interval)
            .finish()
    }
}

/// Queues inbound `text` without blocking; a full queue is answered with a
/// busy failure.
fn enqueue(queue: &SyncSender<Job>, channel: &Weak<dyn Transport>, text: String) {
    match queue.try_send(Job::Raw(text)) {
        Ok(()) => {}
        Err(TrySendError::Full(_)) => {
            if let Some(transport) = channel.upgrade() {
                send_failure(
                    &transport,
                    &RunnerError::Busy {
                        pending: QUEUE_CAPACITY,
                    },
                );
            }
        }
        Err(TrySendError::Disconnected(_)) => {
            debug!(target: SESSION_TARGET, "message arrived after shutdown");
        }
    }
}

fn submit(queue: &SyncSender<Job>, job: Job) {
    if queue.send(job).is_err() {
        warn!(target: SESSION_TARGET, "dispatch worker stopped early");
    }
}

fn join(worker: JoinHandle<()>) {
    if worker.join().is_err() {
        warn!(target: SESSION_TARGET, "dispatch worker panicked");
    }
}

fn work(jobs: &Receiver<Job>, dispatcher: &Dispatcher, transport: &Arc<dyn Transport>) {
    while let Ok(job) = jobs.recv() {
        match job {
            Job::Command(envelope) => dispatcher.dispatch(&envelope, transport),
            Job::Raw(text) => {
                if transport.is_closed() {
                    debug!(target: SESSION_TARGET, "channel closed; discarding message");
                } else {
                    dispatcher.dispatch_text(&text, transport);
                }
            }
            Job::Stop => break,
        }
    }
}

#[cfg(test)]
mod tests;
