#![forbid(unsafe_code)]

//! Keyboard shortcut resolution.
//!
//! A [`Keymap`] maps key chords to editor [`Shortcut`]s. The default map
//! binds the usual word-processor chords:
//!
//! | chord    | shortcut    |
//! |----------|-------------|
//! | Ctrl+B   | `Bold`      |
//! | Ctrl+I   | `Italic`    |
//! | Ctrl+U   | `Underline` |
//! | Ctrl+S   | `Save`      |
//! | Ctrl+P   | `Print`     |
//! | Ctrl+Z   | `Undo`      |
//! | Ctrl+Y   | `Redo`      |
//!
//! Lookups only consider key presses; releases and repeats never resolve.
//!
//! # Example
//!
//! ```
//! use quill_core::event::{KeyCode, KeyEvent, Modifiers};
//! use quill_core::keybinding::{Keymap, Shortcut};
//!
//! let keymap = Keymap::default();
//! let ctrl_z = KeyEvent::new(KeyCode::Char('z')).with_modifiers(Modifiers::CTRL);
//! assert_eq!(keymap.resolve(&ctrl_z), Some(Shortcut::Undo));
//! assert_eq!(keymap.resolve(&KeyEvent::new(KeyCode::Char('z'))), None);
//! ```

use crate::event::{KeyCode, KeyEvent, KeyEventKind, Modifiers};

/// High-level actions reachable from the keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shortcut {
    Bold,
    Italic,
    Underline,
    Save,
    Print,
    Undo,
    Redo,
}

/// A single chord → shortcut binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Binding {
    pub code: KeyCode,
    pub modifiers: Modifiers,
    pub shortcut: Shortcut,
}

impl Binding {
    /// Bind Ctrl+`key` to `shortcut`.
    #[must_use]
    pub const fn ctrl(key: char, shortcut: Shortcut) -> Self {
        Self {
            code: KeyCode::Char(key),
            modifiers: Modifiers::CTRL,
            shortcut,
        }
    }

    fn matches(&self, event: &KeyEvent) -> bool {
        if self.modifiers != event.modifiers {
            return false;
        }
        match (self.code, event.code) {
            // Hosts report Ctrl+Z as either 'z' or 'Z'.
            (KeyCode::Char(a), KeyCode::Char(b)) => a.eq_ignore_ascii_case(&b),
            (a, b) => a == b,
        }
    }
}

/// Ordered set of bindings; the first match wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keymap {
    bindings: Vec<Binding>,
}

impl Keymap {
    /// An empty keymap with no bindings.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            bindings: Vec::new(),
        }
    }

    /// Add a binding. Earlier bindings take precedence.
    #[must_use]
    pub fn bind(mut self, binding: Binding) -> Self {
        self.bindings.push(binding);
        self
    }

    /// Resolve a key event to a shortcut.
    #[must_use]
    pub fn resolve(&self, event: &KeyEvent) -> Option<Shortcut> {
        if event.kind != KeyEventKind::Press {
            return None;
        }
        self.bindings
            .iter()
            .find(|b| b.matches(event))
            .map(|b| b.shortcut)
    }

    /// All bindings, in precedence order.
    #[must_use]
    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }
}

impl Default for Keymap {
    fn default() -> Self {
        Self::empty()
            .bind(Binding::ctrl('b', Shortcut::Bold))
            .bind(Binding::ctrl('i', Shortcut::Italic))
            .bind(Binding::ctrl('u', Shortcut::Underline))
            .bind(Binding::ctrl('s', Shortcut::Save))
            .bind(Binding::ctrl('p', Shortcut::Print))
            .bind(Binding::ctrl('z', Shortcut::Undo))
            .bind(Binding::ctrl('y', Shortcut::Redo))
    }
}
