#![forbid(unsafe_code)]

//! Core: document snapshots, input events, and the editor's command vocabulary.
//!
//! # Role in Quill
//! `quill-core` is the input layer. It owns the types the editing surface
//! hands to the session (key and pointer events), the vocabulary of
//! formatting commands and keyboard shortcuts, and the small pure helpers
//! that build markup fragments and measure text.
//!
//! # Primary responsibilities
//! - **Snapshot**: opaque, cheaply clonable document content.
//! - **Events**: canonical key and pointer events.
//! - **Keymap**: chord to shortcut resolution.
//! - **FormatCommand**: formatting delegated to the surface.
//! - **Markup**: table, link, and print document builders.
//!
//! # How it fits in the system
//! The runtime (`quill-runtime`) consumes these types and drives the editor
//! session. Nothing here performs I/O or keeps state between calls.

pub mod event;
pub mod format;
pub mod keybinding;
pub mod markup;
pub mod metrics;
pub mod snapshot;

pub use event::{KeyCode, KeyEvent, KeyEventKind, Modifiers, PointerButton};
pub use format::{Alignment, FormatCommand};
pub use keybinding::{Binding, Keymap, Shortcut};
pub use markup::TableSpec;
pub use metrics::DocumentMetrics;
pub use snapshot::Snapshot;
