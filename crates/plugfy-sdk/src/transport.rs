//! Transport contract implemented by channel plugins.
//!
//! A transport carries JSON payloads from the host to its controller and
//! delivers raw inbound text back. Transport plugins register a
//! [`TransportFactory`]; the host instantiates each factory and keeps the one
//! whose [`Transport::name`] matches the requested communication type.

use std::sync::Arc;

use serde_json::Value;

use crate::error::TransportError;

/// Callback receiving raw inbound message text.
pub type MessageHandler = Arc<dyn Fn(String) + Send + Sync>;

/// No-argument constructor registered by a transport plugin.
///
/// The host calls factories and transport methods directly, so neither may
/// panic.
pub type TransportFactory = fn() -> Box<dyn Transport>;

/// Bidirectional message channel between the host and its controller.
pub trait Transport: Send + Sync {
    /// Self-reported name, matched case-insensitively.
    fn name(&self) -> &str;

    /// Prepares the channel with optional caller parameters (JSON text).
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] when the parameters are rejected or the
    /// channel cannot be opened.
    fn initialize(&self, parameters: Option<&str>) -> Result<(), TransportError>;

    /// Sends one payload.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] when the channel is closed or the write
    /// fails.
    fn send(&self, payload: &Value) -> Result<(), TransportError>;

    /// Registers the inbound handler. Handlers must return promptly.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] when inbound delivery cannot be started.
    fn subscribe(&self, handler: MessageHandler) -> Result<(), TransportError>;

    /// Whether the channel has closed.
    fn is_closed(&self) -> bool;

    /// Closes the channel. Closing twice is a no-op.
    fn close(&self);
}
