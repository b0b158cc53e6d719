#![forbid(unsafe_code)]

//! Quill public facade crate.
//!
//! Re-exports the editor vocabulary from `quill-core` and the stateful
//! runtime from `quill-runtime`, plus the `quill` command-line host built on
//! top of them.

pub mod cli;
pub mod edit;
pub mod error;

// --- Core re-exports -------------------------------------------------------

pub use quill_core::{
    Alignment, DocumentMetrics, FormatCommand, KeyCode, KeyEvent, KeyEventKind, Keymap, Modifiers,
    PointerButton, Shortcut, Snapshot, TableSpec,
};

// --- Runtime re-exports ----------------------------------------------------

pub use quill_runtime::{
    CommandOutcome, EditorCommand, EditorConfig, EditorRuntime, EditorSession, EditorSurface,
    FileStorage, MemoryStorage, MemorySurface, NotificationSink, RuntimeHandle, RuntimeHost,
    SaveKind, SaveRecord, SessionEvent, SessionStats, Severity, StorageBackend,
};

// --- CLI -------------------------------------------------------------------

pub use cli::run_from_env;
pub use error::{QuillError, Result};

pub mod prelude {
    pub use crate::{
        CommandOutcome, EditorCommand, EditorConfig, EditorRuntime, EditorSession, EditorSurface,
        FormatCommand, KeyCode, KeyEvent, MemorySurface, Modifiers, SessionEvent, Snapshot,
        StorageBackend,
    };

    pub use crate::{core, runtime};
}

pub use quill_core as core;
pub use quill_runtime as runtime;
