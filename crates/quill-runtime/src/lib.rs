#![forbid(unsafe_code)]

//! Quill Runtime
//!
//! The stateful half of the editor: history, scheduling, persistence and
//! the loop that ties them to an editing surface.
//!
//! # Key Components
//!
//! - [`HistoryManager`] - Bounded undo/redo over whole-document snapshots
//! - [`ChangeScheduler`] - Capture triggers and the debounced autosave
//! - [`StorageBackend`] - Key-value persistence ([`MemoryStorage`], [`FileStorage`])
//! - [`NotificationQueue`] - Transient, auto-dismissed user messages
//! - [`SpellChecker`] - Spell-check toggle and suggestion menu
//! - [`EditorSurface`] - The seam to whatever holds the document
//! - [`EditorSession`] - One open document and everything around it
//! - [`EditorRuntime`] - Single-threaded message loop driving a session
//!
//! # Role in Quill
//! `quill-runtime` consumes the vocabulary of `quill-core` (events,
//! shortcuts, format commands, markup builders) and owns all mutable
//! editor state. The `quill` crate re-exports it and adds the command-line
//! host.

pub mod command;
pub mod config;
pub mod history;
pub mod notification;
pub mod persistence;
pub mod runtime;
pub mod scheduler;
pub mod session;
pub mod spellcheck;
pub mod subscription;
pub mod surface;

pub use command::{CommandOutcome, EditorCommand};
pub use config::{ConfigError, EditorConfig};
pub use history::{HistoryConfig, HistoryManager};
pub use notification::{
    Notification, NotificationQueue, NotificationSink, QueueAction, QueueConfig, Severity,
};
pub use persistence::{
    FileStorage, MemoryStorage, RestoreError, StorageBackend, StorageError, StorageResult,
};
pub use runtime::{EditorRuntime, RuntimeHandle, RuntimeHost, RuntimeMsg};
pub use scheduler::{ChangeScheduler, ChangeTrigger, DebounceState, Debouncer};
pub use session::{EditorSession, SaveKind, SaveRecord, SessionEvent, SessionStats};
pub use spellcheck::{
    SpellChecker, StaticDictionary, SuggestionItem, SuggestionMenu, SuggestionProvider,
};
pub use subscription::{Every, StopSignal, SubId, Subscription, SubscriptionManager};
pub use surface::{EditorSurface, MemorySurface, SurfaceObserver};
