#![forbid(unsafe_code)]

//! The runtime loop on a real thread with real timers.
//!
//! Timing assertions only require that things happen eventually within a
//! generous bound; the capture interval is a target, not a guarantee.
//!
//! Run:
//!   cargo test -p quill-runtime --test runtime_loop

use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use web_time::Instant;

use quill_runtime::command::{CommandOutcome, EditorCommand};
use quill_runtime::config::EditorConfig;
use quill_runtime::notification::{NotificationId, NotificationSink, Severity};
use quill_runtime::persistence::{MemoryStorage, StorageBackend};
use quill_runtime::runtime::{EditorRuntime, RuntimeHost};
use quill_runtime::session::{EditorSession, SessionEvent};
use quill_runtime::surface::MemorySurface;

#[derive(Clone, Default)]
struct SharedHost {
    notes: Arc<Mutex<Vec<(String, Severity)>>>,
    outcomes: Arc<Mutex<Vec<CommandOutcome>>>,
    dismissed: Arc<Mutex<Vec<NotificationId>>>,
}

impl NotificationSink for SharedHost {
    fn notify(&mut self, message: &str, severity: Severity) {
        self.notes.lock().unwrap().push((message.to_string(), severity));
    }

    fn dismiss(&mut self, id: NotificationId) {
        self.dismissed.lock().unwrap().push(id);
    }
}

impl RuntimeHost for SharedHost {
    fn on_outcome(&mut self, outcome: &CommandOutcome) {
        self.outcomes.lock().unwrap().push(outcome.clone());
    }
}

fn fast_config() -> EditorConfig {
    EditorConfig {
        capture_interval_ms: 20,
        autosave_delay_ms: 50,
        placeholder: "<p></p>".into(),
        ..EditorConfig::default()
    }
}

fn wait_until(timeout: Duration, mut done: impl FnMut() -> bool) -> bool {
    let deadline = std::time::Instant::now() + timeout;
    while std::time::Instant::now() < deadline {
        if done() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    done()
}

#[test]
fn typed_edits_are_autosaved_and_undoable() {
    let store = Arc::new(MemoryStorage::new());
    let surface = MemorySurface::default();
    let session = EditorSession::init(surface.clone(), Arc::clone(&store), fast_config(), Instant::now());
    let host = SharedHost::default();
    let mut runtime = EditorRuntime::new(session, host.clone());
    runtime.start();
    let handle = runtime.handle();
    let worker = thread::spawn(move || runtime.run());

    // Typing reports Input through the observer, re-arming the autosave.
    surface.type_text("typed");
    assert!(wait_until(Duration::from_secs(5), || {
        store.load("autosavedContent").unwrap().as_deref() == Some("<p>typed</p>")
    }));

    handle.send(SessionEvent::Tick);
    handle.command(EditorCommand::Undo);
    assert!(wait_until(Duration::from_secs(5), || surface.content() == "<p></p>"));

    handle.shutdown();
    let (stats, _) = worker.join().unwrap();
    assert_eq!(stats.undos, 1);
    assert!(host.outcomes.lock().unwrap().contains(&CommandOutcome::Restored("<p></p>".into())));
}

#[test]
fn capture_tick_eventually_sees_changes() {
    let store = Arc::new(MemoryStorage::new());
    let surface = MemorySurface::default();
    let session = EditorSession::init(surface.clone(), store, fast_config(), Instant::now());
    let mut runtime = EditorRuntime::new(session, SharedHost::default());
    runtime.start();
    let handle = runtime.handle();
    let worker = thread::spawn(move || runtime.run());

    surface.type_text("a");
    thread::sleep(Duration::from_millis(500));
    handle.shutdown();
    let (stats, _) = worker.join().unwrap();
    assert!(stats.captures >= 1);
}

#[test]
fn shutdown_flushes_pending_autosave() {
    let store = Arc::new(MemoryStorage::new());
    let surface = MemorySurface::default();
    let config = EditorConfig {
        autosave_delay_ms: 60_000,
        ..fast_config()
    };
    let session = EditorSession::init(surface.clone(), Arc::clone(&store), config, Instant::now());
    let runtime = EditorRuntime::new(session, SharedHost::default());
    let handle = runtime.handle();
    let worker = thread::spawn(move || runtime.run());

    surface.type_text("late");
    handle.shutdown();
    let (stats, _) = worker.join().unwrap();
    assert_eq!(stats.autosaves, 1);
    assert_eq!(store.load("autosavedContent").unwrap().as_deref(), Some("<p>late</p>"));
}

#[test]
fn notifications_are_shown_and_dismissed() {
    let store = Arc::new(MemoryStorage::new());
    let config = EditorConfig {
        notification_duration_ms: 30,
        ..fast_config()
    };
    let session = EditorSession::init(MemorySurface::default(), store, config, Instant::now());
    let host = SharedHost::default();
    let runtime = EditorRuntime::new(session, host.clone());
    let handle = runtime.handle();
    let worker = thread::spawn(move || runtime.run());

    handle.command(EditorCommand::Save);
    assert!(wait_until(Duration::from_secs(5), || {
        host.notes
            .lock()
            .unwrap()
            .contains(&("Document saved successfully".to_string(), Severity::Success))
    }));
    assert!(wait_until(Duration::from_secs(5), || {
        !host.dismissed.lock().unwrap().is_empty()
    }));
    handle.shutdown();
    worker.join().unwrap();
}
