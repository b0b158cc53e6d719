#![forbid(unsafe_code)]

//! End-to-end editing flows through [`EditorSession`] with real storage.
//!
//! Covers:
//!   1. Autosave to a file, then recovery in a fresh session
//!   2. Unreadable or blank autosaves fall back to the placeholder
//!   3. Storage failures surface as notifications and never touch history
//!   4. Formatting, table and link commands are individually undoable
//!   5. Config loaded from disk drives history depth and timing
//!
//! Run:
//!   cargo test -p quill-runtime --test session_flows

use std::sync::Arc;
use std::time::Duration;

use web_time::Instant;

use quill_core::event::{KeyCode, KeyEvent, Modifiers};
use quill_core::format::{Alignment, FormatCommand};
use quill_runtime::command::{CommandOutcome, EditorCommand};
use quill_runtime::config::{DEFAULT_PLACEHOLDER, EditorConfig};
use quill_runtime::notification::{QueueAction, Severity};
use quill_runtime::persistence::{FileStorage, MemoryStorage, StorageBackend};
use quill_runtime::session::{EditorSession, SessionEvent};
use quill_runtime::surface::MemorySurface;

const KEY: &str = "autosavedContent";

fn shown(actions: &[QueueAction]) -> Vec<(String, Severity)> {
    actions
        .iter()
        .filter_map(|a| match a {
            QueueAction::Show(n) => Some((n.message.clone(), n.severity)),
            QueueAction::Hide(_) => None,
        })
        .collect()
}

// ============================================================================
// Recovery
// ============================================================================

#[test]
fn autosave_survives_a_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("quill-storage.json");
    let t0 = Instant::now();

    let surface = MemorySurface::default();
    let mut session = EditorSession::init(
        surface.clone(),
        FileStorage::new(&path),
        EditorConfig::default(),
        t0,
    );
    surface.type_text(" Hello");
    session.handle(SessionEvent::Input, t0);
    session.poll(t0 + Duration::from_secs(5));
    let stats = session.dispose(t0 + Duration::from_secs(6));
    assert_eq!(stats.autosaves, 1);

    let reopened = EditorSession::init(
        MemorySurface::default(),
        FileStorage::new(&path),
        EditorConfig::default(),
        Instant::now(),
    );
    assert_eq!(
        reopened.surface().content(),
        "<p>Start typing your document here... Hello</p>"
    );
    assert!(!reopened.history().can_undo());
}

#[test]
fn corrupted_file_falls_back_to_placeholder() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("quill-storage.json");
    std::fs::write(&path, "{ not json").unwrap();

    let session = EditorSession::init(
        MemorySurface::default(),
        FileStorage::new(&path),
        EditorConfig::default(),
        Instant::now(),
    );
    assert_eq!(session.surface().content(), DEFAULT_PLACEHOLDER);
}

#[test]
fn custom_key_and_placeholder() {
    let store = Arc::new(MemoryStorage::new().with_entry(KEY, "<p>default key</p>"));
    let config = EditorConfig {
        autosave_key: "draft".into(),
        placeholder: "<p>empty</p>".into(),
        ..EditorConfig::default()
    };
    let t0 = Instant::now();
    let mut session = EditorSession::init(MemorySurface::default(), Arc::clone(&store), config, t0);
    assert_eq!(session.surface().content(), "<p>empty</p>");

    session.execute(EditorCommand::Save, t0);
    assert_eq!(store.load("draft").unwrap().as_deref(), Some("<p>empty</p>"));
    assert_eq!(store.load(KEY).unwrap().as_deref(), Some("<p>default key</p>"));
}

// ============================================================================
// Storage failure
// ============================================================================

#[test]
fn quota_exceeded_is_reported_not_fatal() {
    let store = Arc::new(MemoryStorage::with_quota(32));
    let t0 = Instant::now();
    let surface = MemorySurface::default();
    let mut session = EditorSession::init(surface.clone(), Arc::clone(&store), EditorConfig::default(), t0);

    surface.type_text(" more text");
    session.handle(SessionEvent::KeyUp(KeyEvent::new(KeyCode::Char(' '))), t0);
    let depth = session.history().undo_depth();
    let before = surface.content();

    let actions = session.poll(t0 + Duration::from_secs(5));
    assert_eq!(
        shown(&actions),
        vec![("Error autosaving document".to_string(), Severity::Error)]
    );
    assert_eq!(surface.content(), before);
    assert_eq!(session.history().undo_depth(), depth);
    assert!(store.is_empty());

    // The session keeps working after the failure.
    let outcome = session.execute(EditorCommand::Undo, t0 + Duration::from_secs(6));
    assert!(matches!(outcome, CommandOutcome::Restored(_)));
}

#[test]
fn notifications_expire_after_three_seconds() {
    let store = Arc::new(MemoryStorage::new());
    let t0 = Instant::now();
    let mut session = EditorSession::init(MemorySurface::default(), Arc::clone(&store), EditorConfig::default(), t0);
    session.execute(EditorCommand::Save, t0);
    let show = session.poll(t0);
    let id = match &show[..] {
        [QueueAction::Show(n)] => n.id,
        other => panic!("unexpected actions: {other:?}"),
    };
    assert!(session.poll(t0 + Duration::from_millis(2900)).is_empty());
    assert_eq!(
        session.poll(t0 + Duration::from_secs(3)),
        vec![QueueAction::Hide(id)]
    );
}

// ============================================================================
// Commands
// ============================================================================

#[test]
fn each_command_edit_is_one_undo_step() {
    let store = Arc::new(MemoryStorage::new());
    let t0 = Instant::now();
    let config = EditorConfig {
        placeholder: "<p>title body</p>".into(),
        ..EditorConfig::default()
    };
    let surface = MemorySurface::default();
    let mut session = EditorSession::init(surface.clone(), Arc::clone(&store), config, t0);

    surface.select("title");
    session.execute(FormatCommand::Bold.into(), t0);
    surface.select("body");
    session.execute(FormatCommand::Align(Alignment::Center).into(), t0);
    surface.clear_selection();
    session.execute(
        EditorCommand::InsertTable {
            rows: 1,
            cols: 2,
            header: false,
        },
        t0,
    );
    assert_eq!(session.history().undo_depth(), 3);

    let mut steps = Vec::new();
    while let CommandOutcome::Restored(snapshot) = session.execute(EditorCommand::Undo, t0) {
        steps.push(snapshot.to_string());
    }
    assert_eq!(steps.len(), 3);
    assert_eq!(steps.last().map(String::as_str), Some("<p>title body</p>"));
    assert_eq!(surface.content(), "<p>title body</p>");
}

#[test]
fn keyboard_shortcuts_cover_every_binding() {
    let store = Arc::new(MemoryStorage::new());
    let t0 = Instant::now();
    let surface = MemorySurface::default();
    let mut session = EditorSession::init(surface.clone(), Arc::clone(&store), EditorConfig::default(), t0);
    let ctrl = |c: char| {
        SessionEvent::KeyDown(KeyEvent::new(KeyCode::Char(c)).with_modifiers(Modifiers::CTRL))
    };

    surface.select("typing");
    assert_eq!(session.handle(ctrl('b'), t0), Some(CommandOutcome::Applied));
    assert_eq!(session.handle(ctrl('i'), t0), Some(CommandOutcome::Applied));
    assert_eq!(session.handle(ctrl('u'), t0), Some(CommandOutcome::Applied));
    assert!(surface.content().contains("<u><i><b>typing</b></i></u>"));

    assert!(matches!(session.handle(ctrl('s'), t0), Some(CommandOutcome::Export { .. })));
    assert!(matches!(session.handle(ctrl('p'), t0), Some(CommandOutcome::Print(_))));
    assert!(matches!(session.handle(ctrl('z'), t0), Some(CommandOutcome::Restored(_))));
    assert!(matches!(session.handle(ctrl('y'), t0), Some(CommandOutcome::Restored(_))));
    // Upper-case letters resolve the same way.
    assert!(matches!(session.handle(ctrl('Z'), t0), Some(CommandOutcome::Restored(_))));
}

#[test]
fn pointer_release_captures_mouse_edits() {
    let store = Arc::new(MemoryStorage::new());
    let t0 = Instant::now();
    let surface = MemorySurface::default();
    let mut session = EditorSession::init(surface.clone(), Arc::clone(&store), EditorConfig::default(), t0);
    surface.type_text("!");
    surface.click();
    session.handle(
        SessionEvent::PointerUp(quill_core::event::PointerButton::Primary),
        t0,
    );
    assert_eq!(session.history().undo_depth(), 1);
}

// ============================================================================
// Config
// ============================================================================

#[test]
fn config_file_limits_history() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("quill.toml");
    std::fs::write(&path, "max_undo = 2\n").unwrap();
    let config = EditorConfig::load(&path).unwrap();

    let store = Arc::new(MemoryStorage::new());
    let t0 = Instant::now();
    let surface = MemorySurface::default();
    let mut session = EditorSession::init(surface.clone(), Arc::clone(&store), config, t0);
    for word in ["a", "b", "c", "d"] {
        surface.type_text(word);
        session.handle(SessionEvent::Tick, t0);
    }
    assert_eq!(session.history().undo_depth(), 2);
}
