//! Dynamic execution host for Plugfy modules.
//!
//! The runner discovers modules in a libraries directory, describes their
//! public surface, and invokes their methods on request. Requests and
//! results travel over a pluggable [`plugfy_sdk::Transport`]; lifecycle
//! events raised while an invocation runs are delivered over the same
//! channel ahead of the invocation's result.
//!
//! The binary entry point is [`run`]. The remaining modules are usable on
//! their own: a [`Dispatcher`] routes [`CommandEnvelope`]s to an
//! [`Introspector`] and an [`InvocationEngine`], and a [`Session`] drives a
//! dispatcher in single-shot or interactive mode.

mod cli;
pub mod dispatch;
pub mod error;
pub mod extension;
pub mod introspect;
pub mod invoke;
pub mod library;
pub mod lifecycle;
pub mod outbox;
pub mod request;
pub mod session;
pub mod telemetry;

pub use cli::run;
pub use dispatch::{CommandEnvelope, CommandKind, Dispatcher};
pub use error::RunnerError;
pub use introspect::Introspector;
pub use invoke::InvocationEngine;
pub use library::{DynamicLibraryLoader, ModuleDirectory, ModuleLoader};
pub use lifecycle::{LifecycleObserver, RuntimeLifecycleEvent};
pub use request::MethodCallRequest;
pub use session::Session;

#[cfg(test)]
mod tests;
