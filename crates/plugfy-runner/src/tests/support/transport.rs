//! In-memory transport recording every payload sent to it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use plugfy_sdk::{MessageHandler, Transport, TransportError};
use serde_json::Value;

/// Transport double: payloads are recorded, inbound text is injected with
/// [`RecordingTransport::deliver`].
#[derive(Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<Value>>,
    handler: Mutex<Option<MessageHandler>>,
    initialised_with: Mutex<Option<Option<String>>>,
    closed: AtomicBool,
}

impl RecordingTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Payloads sent so far.
    pub fn sent(&self) -> Vec<Value> {
        self.sent.lock().expect("transport mutex poisoned").clone()
    }

    /// Names of the lifecycle events sent so far.
    pub fn event_names(&self) -> Vec<String> {
        self.sent()
            .iter()
            .filter_map(|payload| payload.get("eventName").and_then(Value::as_str))
            .map(str::to_owned)
            .collect()
    }

    /// Parameters passed to `initialize`, if it was called.
    pub fn initialised_with(&self) -> Option<Option<String>> {
        self.initialised_with
            .lock()
            .expect("transport mutex poisoned")
            .clone()
    }

    /// Hands `text` to the subscribed inbound handler.
    pub fn deliver(&self, text: &str) -> bool {
        let handler = self
            .handler
            .lock()
            .expect("transport mutex poisoned")
            .clone();
        handler.is_some_and(|handler| {
            handler(text.to_owned());
            true
        })
    }

    /// Whether an inbound handler is registered.
    pub fn is_subscribed(&self) -> bool {
        self.handler
            .lock()
            .expect("transport mutex poisoned")
            .is_some()
    }
}

impl Transport for RecordingTransport {
    fn name(&self) -> &str {
        "Recording"
    }

    fn initialize(&self, parameters: Option<&str>) -> Result<(), TransportError> {
        *self
            .initialised_with
            .lock()
            .expect("transport mutex poisoned") = Some(parameters.map(str::to_owned));
        Ok(())
    }

    fn send(&self, payload: &Value) -> Result<(), TransportError> {
        self.sent
            .lock()
            .expect("transport mutex poisoned")
            .push(payload.clone());
        Ok(())
    }

    fn subscribe(&self, handler: MessageHandler) -> Result<(), TransportError> {
        *self.handler.lock().expect("transport mutex poisoned") = Some(handler);
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}
