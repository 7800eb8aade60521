//! Unit tests for single-shot and interactive sessions.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use plugfy_sdk::Transport;
use rstest::{fixture, rstest};
use serde_json::{Value, json};

use super::*;
use crate::dispatch::{CommandKind, CommandParameters, EXIT_ACKNOWLEDGEMENT};
use crate::introspect::Introspector;
use crate::invoke::InvocationEngine;
use crate::tests::support::{
    LibraryFolder, RecordingTransport, StaticModuleLoader, WIDGET_CLASS, module_file_name,
    widget_declaration,
};

const FAST_POLL: Duration = Duration::from_millis(10);

struct Harness {
    _folder: LibraryFolder,
    session: Session,
    transport: Arc<RecordingTransport>,
}

#[fixture]
fn harness() -> Harness {
    let folder = LibraryFolder::new();
    folder.touch(&module_file_name("widgets"));
    let loader =
        StaticModuleLoader::new().with_module(&module_file_name("widgets"), widget_declaration());
    let directory = folder.directory(loader);
    let dispatcher = Dispatcher::new(
        Introspector::new(directory.clone()),
        InvocationEngine::new(directory),
    );
    let transport = RecordingTransport::new();
    let channel: Arc<dyn Transport> = transport.clone();
    Harness {
        _folder: folder,
        session: Session::new(dispatcher, channel).with_poll_interval(FAST_POLL),
        transport,
    }
}

fn command(kind: CommandKind) -> CommandEnvelope {
    CommandEnvelope::new(kind, CommandParameters::default())
}

fn wait_until(condition: impl Fn() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !condition() {
        assert!(Instant::now() < deadline, "condition not met in time");
        thread::sleep(Duration::from_millis(5));
    }
}

#[rstest]
fn single_shot_dispatches_then_closes(harness: Harness) {
    harness.session.run_once(&command(CommandKind::List));
    assert_eq!(
        harness.transport.sent(),
        vec![json!([module_file_name("widgets")])]
    );
    assert!(harness.transport.is_closed());
}

#[rstest]
fn interactive_exit_sends_one_acknowledgement(harness: Harness) {
    harness
        .session
        .run_interactive(Some(command(CommandKind::Exit)))
        .expect("interactive session");

    assert_eq!(
        harness.transport.sent(),
        vec![
            json!(READY_NOTICE),
            json!(EXIT_ACKNOWLEDGEMENT),
            json!(ENDED_NOTICE)
        ]
    );
    assert!(harness.transport.is_closed());
}

#[rstest]
fn interactive_mode_serves_inbound_commands_in_order(harness: Harness) {
    let Harness {
        _folder,
        session,
        transport,
    } = harness;
    let runner = thread::spawn(move || session.run_interactive(Some(command(CommandKind::List))));

    wait_until(|| transport.is_subscribed());
    let run = json!({
        "Type": "run",
        "Parameters": {
            "Assembly": module_file_name("widgets"),
            "Class": WIDGET_CLASS,
            "Method": "Count",
            "Parameters": [7]
        }
    });
    assert!(transport.deliver(&run.to_string()));
    assert!(transport.deliver("{ not json"));
    assert!(transport.deliver(r#"{"Type": "exit"}"#));

    runner
        .join()
        .expect("session thread")
        .expect("interactive session");

    let sent = transport.sent();
    let expected: Vec<Value> = vec![
        json!(READY_NOTICE),
        json!([module_file_name("widgets")]),
    ];
    assert_eq!(sent.get(..2), Some(&expected[..]));
    assert_eq!(
        transport.event_names(),
        ["execute", "finality"],
        "run produced its lifecycle events"
    );
    let tail: Vec<&Value> = sent.iter().skip(4).collect();
    assert_eq!(tail.first().copied(), Some(&json!(7)));
    assert_eq!(
        tail.get(1).map(|failure| &failure["kind"]),
        Some(&json!("InvalidCommandError"))
    );
    assert_eq!(tail.get(2).copied(), Some(&json!(EXIT_ACKNOWLEDGEMENT)));
    assert_eq!(tail.get(3).copied(), Some(&json!(ENDED_NOTICE)));
    assert_eq!(tail.len(), 4);
}

#[test]
fn full_queue_answers_with_busy_failure() {
    let transport = RecordingTransport::new();
    let channel: Arc<dyn Transport> = transport.clone();
    let (queue, _jobs) = mpsc::sync_channel(0);

    enqueue(&queue, &Arc::downgrade(&channel), "{}".to_owned());

    let reply = transport.sent().pop().expect("busy reply");
    assert_eq!(reply["kind"], "RunnerBusyError");
}

#[test]
fn messages_after_shutdown_are_discarded() {
    let transport = RecordingTransport::new();
    let channel: Arc<dyn Transport> = transport.clone();
    let (queue, jobs) = mpsc::sync_channel(1);
    drop(jobs);

    enqueue(&queue, &Arc::downgrade(&channel), "{}".to_owned());

    assert!(transport.sent().is_empty());
}
