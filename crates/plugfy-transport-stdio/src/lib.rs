//! `STDInOut` transport plugin.
//!
//! Outbound payloads are written to standard output as JSON lines. Once a
//! handler subscribes, standard input is read line by line on a background
//! thread and every non-blank line is delivered as it arrives. End of input
//! closes the channel.
//!
//! Loaded as a plugin, the transport logs through its own copy of `tracing`,
//! which the runner's subscriber does not see. Initialisation parameters may
//! carry a `logFilter` directive; the transport then writes its diagnostics
//! to standard error with that filter.

use std::io::{self, BufRead, BufReader, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;

use plugfy_sdk::{MessageHandler, ModuleRegistrar, Transport, TransportError};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

/// Name the transport reports.
pub const TRANSPORT_NAME: &str = "STDInOut";

const STDIO_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::stdio");

/// Keys read from the initialisation parameters; others are ignored.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StdioParameters {
    log_filter: Option<String>,
}

type Input = Box<dyn BufRead + Send>;
type Output = Box<dyn Write + Send>;

/// JSON-lines channel over a pair of byte streams.
pub struct StdioTransport {
    input: Mutex<Option<Input>>,
    output: Mutex<Output>,
    closed: Arc<AtomicBool>,
}

impl StdioTransport {
    /// Transport over the process's standard streams.
    #[must_use]
    pub fn new() -> Self {
        Self::with_streams(BufReader::new(io::stdin()), io::stdout())
    }

    /// Transport over arbitrary streams.
    #[must_use]
    pub fn with_streams(
        input: impl BufRead + Send + 'static,
        output: impl Write + Send + 'static,
    ) -> Self {
        Self {
            input: Mutex::new(Some(Box::new(input))),
            output: Mutex::new(Box::new(output)),
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    fn write_line(&self, payload: &Value) -> Result<(), TransportError> {
        let line = serde_json::to_string(payload).map_err(|error| TransportError::Serialize {
            name: TRANSPORT_NAME.to_owned(),
            message: error.to_string(),
        })?;
        let mut output = self.output.lock().unwrap_or_else(PoisonError::into_inner);
        writeln!(output, "{line}")
            .and_then(|()| output.flush())
            .map_err(|error| TransportError::io(TRANSPORT_NAME, error))
    }
}

impl Default for StdioTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for StdioTransport {
    fn name(&self) -> &str {
        TRANSPORT_NAME
    }

    fn initialize(&self, parameters: Option<&str>) -> Result<(), TransportError> {
        let Some(text) = parameters.filter(|text| !text.trim().is_empty()) else {
            return Ok(());
        };
        let value: Value = serde_json::from_str(text).map_err(invalid_parameters)?;
        let parameters = if value.is_object() {
            StdioParameters::deserialize(value).map_err(invalid_parameters)?
        } else {
            StdioParameters::default()
        };
        parameters
            .log_filter
            .as_deref()
            .map_or(Ok(()), install_logging)
    }

    fn send(&self, payload: &Value) -> Result<(), TransportError> {
        self.write_line(payload)
    }

    fn subscribe(&self, handler: MessageHandler) -> Result<(), TransportError> {
        let input = self
            .input
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .ok_or_else(|| {
                TransportError::io(
                    TRANSPORT_NAME,
                    io::Error::new(io::ErrorKind::AlreadyExists, "input is already being read"),
                )
            })?;
        let closed = Arc::clone(&self.closed);
        thread::Builder::new()
            .name("plugfy-stdin".into())
            .spawn(move || read_lines(input, &handler, &closed))
            .map(|_| ())
            .map_err(|error| TransportError::io(TRANSPORT_NAME, error))
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            debug!(target: STDIO_TARGET, "channel closed");
        }
    }
}

fn read_lines(input: Input, handler: &MessageHandler, closed: &AtomicBool) {
    for line in input.lines() {
        if closed.load(Ordering::SeqCst) {
            return;
        }
        match line {
            Ok(text) if text.trim().is_empty() => {}
            Ok(text) => handler(text),
            Err(error) => {
                warn!(target: STDIO_TARGET, %error, "cannot read standard input");
                break;
            }
        }
    }
    debug!(target: STDIO_TARGET, "end of input");
    closed.store(true, Ordering::SeqCst);
}

fn invalid_parameters(error: impl std::fmt::Display) -> TransportError {
    TransportError::InvalidParameters {
        name: TRANSPORT_NAME.to_owned(),
        message: error.to_string(),
    }
}

/// Sends this library's diagnostics to standard error.
///
/// Only the first subscriber installed in the library's `tracing` globals
/// takes effect.
fn install_logging(directive: &str) -> Result<(), TransportError> {
    let filter = EnvFilter::try_new(directive).map_err(invalid_parameters)?;
    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(false)
        .try_init()
        .is_ok();
    if !installed {
        debug!(target: STDIO_TARGET, "log subscriber already installed");
    }
    Ok(())
}

fn create() -> Box<dyn Transport> {
    Box::new(StdioTransport::new())
}

/// Registers the `STDInOut` transport.
pub fn register(registrar: &mut dyn ModuleRegistrar) {
    registrar.register_transport(create);
}

plugfy_sdk::export_module!(
    name: env!("CARGO_PKG_NAME"),
    version: env!("CARGO_PKG_VERSION"),
    register: register,
);

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::time::{Duration, Instant};

    use plugfy_sdk::registry::Registrations;
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl SharedBuffer {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().expect("buffer").clone()).expect("utf8")
        }
    }

    impl Write for SharedBuffer {
        fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
            self.0.lock().expect("buffer").extend_from_slice(bytes);
            Ok(bytes.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn transport(input: &str) -> (StdioTransport, SharedBuffer) {
        let output = SharedBuffer::default();
        let transport =
            StdioTransport::with_streams(Cursor::new(input.as_bytes().to_vec()), output.clone());
        (transport, output)
    }

    fn wait_until(condition: impl Fn() -> bool) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !condition() {
            assert!(Instant::now() < deadline, "condition not met in time");
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn payloads_are_written_as_json_lines() {
        let (channel, output) = transport("");
        channel.send(&json!({"eventName": "execute"})).expect("send");
        channel.send(&json!("done")).expect("send");
        assert_eq!(output.text(), "{\"eventName\":\"execute\"}\n\"done\"\n");
    }

    #[test]
    fn send_after_close_still_writes() {
        let (channel, output) = transport("");
        channel.close();
        channel.send(&json!("Interactive mode ended.")).expect("send");
        assert!(channel.is_closed());
        assert_eq!(output.text(), "\"Interactive mode ended.\"\n");
    }

    #[test]
    fn inbound_lines_are_delivered_until_end_of_input() {
        let (channel, _) = transport("{\"Type\":\"list\"}\n\n   \n{\"Type\":\"exit\"}\n");
        let received = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&received);
        channel
            .subscribe(Arc::new(move |text: String| {
                sink.lock().expect("sink").push(text);
            }))
            .expect("subscribe");

        wait_until(|| channel.is_closed());
        assert_eq!(
            *received.lock().expect("sink"),
            ["{\"Type\":\"list\"}", "{\"Type\":\"exit\"}"]
        );
    }

    #[test]
    fn input_is_read_once() {
        let (channel, _) = transport("");
        channel.subscribe(Arc::new(|_: String| {})).expect("first subscribe");
        assert!(channel.subscribe(Arc::new(|_: String| {})).is_err());
    }

    #[rstest]
    #[case(None)]
    #[case(Some(""))]
    #[case(Some("{\"ignored\": true}"))]
    #[case(Some("[1, 2]"))]
    #[case(Some("{\"logFilter\": \"plugfy_transport_stdio=debug\"}"))]
    fn initialisation_accepts_json_parameters(#[case] parameters: Option<&str>) {
        let (channel, _) = transport("");
        assert!(channel.initialize(parameters).is_ok());
    }

    #[rstest]
    #[case("{ nope")]
    #[case("{\"logFilter\": 3}")]
    #[case("{\"logFilter\": \"plugfy=loudest\"}")]
    fn initialisation_rejects_malformed_parameters(#[case] parameters: &str) {
        let (channel, _) = transport("");
        let error = channel
            .initialize(Some(parameters))
            .expect_err("invalid parameters");
        assert!(matches!(error, TransportError::InvalidParameters { .. }));
    }

    #[test]
    fn module_registers_one_transport() {
        let declaration = plugfy_sdk::ModuleDeclaration::new("stdio", "0.0.0", register);
        let registrations = Registrations::collect(&declaration);
        let names: Vec<String> = registrations
            .transports()
            .iter()
            .map(|factory| factory().name().to_owned())
            .collect();
        assert_eq!(names, [TRANSPORT_NAME]);
    }
}
