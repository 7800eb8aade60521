//! Shared doubles for runner tests.

mod host;
mod loader;
mod modules;
mod observer;
mod transport;

pub use host::{StaticConfigLoader, TestHost};
pub use loader::{LibraryFolder, StaticModuleLoader, module_file_name};
pub use modules::{WIDGET_CLASS, transport_declaration, widget_declaration};
pub use observer::RecordingObserver;
pub use transport::RecordingTransport;
