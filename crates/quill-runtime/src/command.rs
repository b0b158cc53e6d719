#![forbid(unsafe_code)]

//! Editor commands and their outcomes.
//!
//! Toolbar buttons, dialogs and keyboard shortcuts all funnel into one
//! [`EditorCommand`], executed by the session. The [`CommandOutcome`] tells
//! the host what, if anything, it has to do next (write a file, open a
//! print preview, show a rejection).

use std::fmt;

use quill_core::format::FormatCommand;
use quill_core::keybinding::Shortcut;
use quill_core::snapshot::Snapshot;

/// File name offered for saved documents.
pub const EXPORT_FILE_NAME: &str = "document.html";

/// Media type accepted by `OpenDocument`.
pub const HTML_MEDIA_TYPE: &str = "text/html";

/// A user-level editor command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorCommand {
    Undo,
    Redo,
    /// Persist now and export the document.
    Save,
    /// Render the document for printing.
    Print,
    /// Formatting delegated to the surface.
    Format(FormatCommand),
    /// Replace the document with the placeholder and forget the autosave.
    NewDocument,
    /// Replace the document with a file's content.
    OpenDocument {
        name: String,
        media_type: String,
        content: String,
    },
    InsertTable {
        rows: usize,
        cols: usize,
        header: bool,
    },
    InsertLink {
        url: String,
        text: String,
    },
    ToggleSpellCheck,
}

impl EditorCommand {
    /// Short name for logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Undo => "undo",
            Self::Redo => "redo",
            Self::Save => "save",
            Self::Print => "print",
            Self::Format(_) => "format",
            Self::NewDocument => "new_document",
            Self::OpenDocument { .. } => "open_document",
            Self::InsertTable { .. } => "insert_table",
            Self::InsertLink { .. } => "insert_link",
            Self::ToggleSpellCheck => "toggle_spell_check",
        }
    }

    /// Whether a successful run changes the document.
    #[must_use]
    pub const fn edits_document(&self) -> bool {
        !matches!(self, Self::Save | Self::Print | Self::ToggleSpellCheck)
    }
}

impl fmt::Display for EditorCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<Shortcut> for EditorCommand {
    fn from(shortcut: Shortcut) -> Self {
        match shortcut {
            Shortcut::Bold => Self::Format(FormatCommand::Bold),
            Shortcut::Italic => Self::Format(FormatCommand::Italic),
            Shortcut::Underline => Self::Format(FormatCommand::Underline),
            Shortcut::Save => Self::Save,
            Shortcut::Print => Self::Print,
            Shortcut::Undo => Self::Undo,
            Shortcut::Redo => Self::Redo,
        }
    }
}

impl From<FormatCommand> for EditorCommand {
    fn from(command: FormatCommand) -> Self {
        Self::Format(command)
    }
}

/// What the host should do after a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// Nothing happened (empty stack, no-op format).
    Nothing,
    /// The surface now shows this snapshot.
    Restored(Snapshot),
    /// Offer `content` for download as `file_name`.
    Export { file_name: String, content: String },
    /// Hand this standalone HTML document to the print subsystem.
    Print(String),
    /// The surface was edited in place.
    Applied,
    /// The command was refused; the message explains why.
    Rejected(String),
    /// Spell checking is now on or off.
    SpellCheck { enabled: bool },
}

impl CommandOutcome {
    /// Whether the command had any effect.
    #[must_use]
    pub fn is_effective(&self) -> bool {
        !matches!(self, Self::Nothing | Self::Rejected(_))
    }
}

/// Whether an opened file should be treated as HTML.
#[must_use]
pub fn is_html_file(name: &str, media_type: &str) -> bool {
    if media_type.eq_ignore_ascii_case(HTML_MEDIA_TYPE) {
        return true;
    }
    let name = name.to_ascii_lowercase();
    name.ends_with(".html") || name.ends_with(".htm")
}
