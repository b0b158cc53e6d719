#![forbid(unsafe_code)]

//! The editor session.
//!
//! [`EditorSession`] owns everything one open document needs: the surface,
//! undo history, change scheduler, autosave storage, notifications and
//! spell-check state. It is driven from a single thread by two entry
//! points:
//!
//! - [`EditorSession::handle`] for surface activity ([`SessionEvent`]), and
//! - [`EditorSession::execute`] for explicit [`EditorCommand`]s.
//!
//! Time is always passed in, so the whole session is deterministic under
//! test. [`EditorSession::poll`] fires timers that have come due and
//! [`EditorSession::next_deadline`] says when the next one will.
//!
//! # Lifecycle
//!
//! ```text
//! init ──► handle / execute / poll ... ──► dispose
//!  │                                          │
//!  └ restore autosave or placeholder          └ flush or cancel autosave
//! ```
//!
//! `dispose` consumes the session; nothing can be called afterwards.

use std::fmt;

use web_time::{Instant, SystemTime};

use quill_core::event::{KeyCode, KeyEvent, PointerButton};
use quill_core::keybinding::Keymap;
use quill_core::markup::{self, TableSpec};
use quill_core::metrics::DocumentMetrics;
use quill_core::snapshot::Snapshot;

use crate::command::{CommandOutcome, EXPORT_FILE_NAME, EditorCommand, is_html_file};
use crate::config::EditorConfig;
use crate::history::HistoryManager;
use crate::notification::{NotificationQueue, QueueAction, Severity};
use crate::persistence::{RestoreError, StorageBackend, StorageResult, recover};
use crate::scheduler::{ChangeScheduler, ChangeTrigger};
use crate::spellcheck::{SpellChecker, SuggestionItem, SuggestionMenu};
use crate::surface::EditorSurface;

/// Something that happened on the editing surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// The content changed.
    Input,
    /// A key went down. Chords resolve to shortcuts here.
    KeyDown(KeyEvent),
    /// A key came up. Content-editing keys trigger a capture.
    KeyUp(KeyEvent),
    /// A pointer button was released over the document.
    PointerUp(PointerButton),
    /// The periodic capture tick.
    Tick,
}

/// Counters for diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub captures: u64,
    pub undos: u64,
    pub redos: u64,
    pub commands: u64,
    pub saves: u64,
    pub autosaves: u64,
    pub autosave_failures: u64,
}

/// Which path wrote the document to storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveKind {
    /// The debounced autosave (or the flush on dispose).
    Autosave,
    /// An explicit save command.
    Manual,
}

/// The most recent successful write to storage.
///
/// `sequence` increases with every save, so two records taken within the
/// same clock tick still compare unequal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveRecord {
    pub kind: SaveKind,
    pub at: SystemTime,
    pub sequence: u64,
}

impl fmt::Display for SaveRecord {
    /// The save status line, e.g. `Autosaved at 14:03:07 UTC`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self.kind {
            SaveKind::Autosave => "Autosaved",
            SaveKind::Manual => "Document saved",
        };
        let secs = self
            .at
            .duration_since(SystemTime::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
            % 86_400;
        write!(
            f,
            "{label} at {:02}:{:02}:{:02} UTC",
            secs / 3600,
            (secs % 3600) / 60,
            secs % 60
        )
    }
}

/// One open document and all the state around it.
pub struct EditorSession<S: EditorSurface> {
    surface: S,
    storage: Box<dyn StorageBackend>,
    history: HistoryManager,
    scheduler: ChangeScheduler,
    notifications: NotificationQueue,
    spellcheck: SpellChecker,
    keymap: Keymap,
    config: EditorConfig,
    stats: SessionStats,
    last_saved: Option<SaveRecord>,
}

impl<S: EditorSurface> std::fmt::Debug for EditorSession<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorSession")
            .field("storage", &self.storage.name())
            .field("history", &self.history)
            .field("scheduler", &self.scheduler)
            .field("spellcheck", &self.spellcheck)
            .field("stats", &self.stats)
            .field("last_saved", &self.last_saved)
            .finish_non_exhaustive()
    }
}

impl<S: EditorSurface> EditorSession<S> {
    /// Open a session.
    ///
    /// The document saved under the configured autosave key is restored
    /// into `surface`; when there is none (or it is blank or unreadable) the
    /// placeholder is used instead. History is seeded from the result and
    /// the autosave debounce is armed once.
    pub fn init(
        mut surface: S,
        storage: impl StorageBackend + 'static,
        config: EditorConfig,
        now: Instant,
    ) -> Self {
        let initial = match recover(&storage, &config.autosave_key) {
            Ok(snapshot) => {
                tracing::info!(
                    target: "quill.session",
                    backend = storage.name(),
                    bytes = snapshot.len(),
                    "restored autosaved document"
                );
                snapshot
            }
            Err(RestoreError::Unreadable { key, source }) => {
                tracing::warn!(
                    target: "quill.session",
                    backend = storage.name(),
                    key = %key,
                    error = %source,
                    "autosaved document unreadable, starting from placeholder"
                );
                Snapshot::from(config.placeholder.as_str())
            }
            Err(err) => {
                tracing::debug!(target: "quill.session", reason = %err, "starting from placeholder");
                Snapshot::from(config.placeholder.as_str())
            }
        };
        surface.restore(&initial);

        let history = HistoryManager::new(surface.snapshot(), config.history_config());
        let mut scheduler = ChangeScheduler::new(config.capture_interval(), config.autosave_delay());
        scheduler.arm_autosave(now);

        Self {
            surface,
            storage: Box::new(storage),
            history,
            scheduler,
            notifications: NotificationQueue::new(config.queue_config()),
            spellcheck: SpellChecker::default(),
            keymap: Keymap::default(),
            config,
            stats: SessionStats::default(),
            last_saved: None,
        }
    }

    /// Replace the spell checker (and with it the suggestion provider).
    #[must_use]
    pub fn with_spellchecker(mut self, spellcheck: SpellChecker) -> Self {
        self.spellcheck = spellcheck;
        self
    }

    /// Replace the keyboard shortcut map.
    #[must_use]
    pub fn with_keymap(mut self, keymap: Keymap) -> Self {
        self.keymap = keymap;
        self
    }

    // ====================================================================
    // Event and command dispatch
    // ====================================================================

    /// Handle surface activity.
    ///
    /// Returns the outcome when the event ran a command: a bound shortcut,
    /// or Enter accepting a spelling suggestion.
    pub fn handle(&mut self, event: SessionEvent, now: Instant) -> Option<CommandOutcome> {
        match event {
            SessionEvent::Input => {
                self.scheduler.observe(ChangeTrigger::Input, now);
                None
            }
            SessionEvent::KeyUp(key) => {
                if self.scheduler.observe(ChangeTrigger::KeyUp(key.code), now) {
                    self.capture();
                }
                None
            }
            SessionEvent::KeyDown(key) => {
                if let Some(outcome) = self.handle_menu_key(key, now) {
                    return outcome;
                }
                let shortcut = self.keymap.resolve(&key)?;
                tracing::debug!(target: "quill.session", ?shortcut, "shortcut");
                Some(self.execute(shortcut.into(), now))
            }
            SessionEvent::PointerUp(_) => {
                self.scheduler.observe(ChangeTrigger::PointerUp, now);
                self.capture();
                None
            }
            SessionEvent::Tick => {
                self.scheduler.observe(ChangeTrigger::Tick, now);
                self.capture();
                None
            }
        }
    }

    /// Menu navigation. `None` means no menu is open or the key is not a
    /// menu key.
    fn handle_menu_key(&mut self, key: KeyEvent, now: Instant) -> Option<Option<CommandOutcome>> {
        let menu = self.spellcheck.menu_mut()?;
        match key.code {
            KeyCode::Up => menu.select_previous(),
            KeyCode::Down => menu.select_next(),
            KeyCode::Enter => return Some(Some(self.choose_suggestion(now))),
            KeyCode::Escape => {
                self.dismiss_suggestions();
            }
            _ => return None,
        }
        Some(None)
    }

    /// Run a command.
    pub fn execute(&mut self, command: EditorCommand, now: Instant) -> CommandOutcome {
        self.stats.commands += 1;
        let name = command.name();
        let outcome = match command {
            EditorCommand::Undo => self.undo(now),
            EditorCommand::Redo => self.redo(now),
            EditorCommand::Save => self.save(now),
            EditorCommand::Print => CommandOutcome::Print(markup::print_document(&self.surface.snapshot())),
            EditorCommand::Format(format) => {
                if self.surface.apply_format(&format) {
                    self.record_edit(now);
                    CommandOutcome::Applied
                } else {
                    CommandOutcome::Nothing
                }
            }
            EditorCommand::NewDocument => self.new_document(now),
            EditorCommand::OpenDocument {
                name,
                media_type,
                content,
            } => self.open_document(&name, &media_type, content, now),
            EditorCommand::InsertTable { rows, cols, header } => {
                match markup::table(TableSpec::new(rows, cols, header)) {
                    Some(html) => {
                        self.surface.insert_markup(&html);
                        self.record_edit(now);
                        self.notify(
                            format!("Table with {rows} rows and {cols} columns inserted"),
                            Severity::Success,
                            now,
                        );
                        CommandOutcome::Applied
                    }
                    None => CommandOutcome::Rejected(
                        "Table rows and columns must be greater than zero.".into(),
                    ),
                }
            }
            EditorCommand::InsertLink { url, text } => {
                let text = if text.trim().is_empty() {
                    self.surface.selected_text()
                } else {
                    text
                };
                match markup::link(&url, &text) {
                    Some(html) => {
                        self.surface.insert_markup(&html);
                        self.record_edit(now);
                        CommandOutcome::Applied
                    }
                    None => CommandOutcome::Rejected("Please enter a URL.".into()),
                }
            }
            EditorCommand::ToggleSpellCheck => {
                let enabled = self.spellcheck.toggle();
                self.sync_navigation_capture();
                let message = if enabled {
                    "Spell check enabled"
                } else {
                    "Spell check disabled"
                };
                self.notify(message, Severity::Success, now);
                CommandOutcome::SpellCheck { enabled }
            }
        };
        tracing::debug!(
            target: "quill.session",
            command = name,
            effective = outcome.is_effective(),
            "command executed"
        );
        outcome
    }

    fn undo(&mut self, now: Instant) -> CommandOutcome {
        let live = self.surface.snapshot();
        let Some(previous) = self.history.undo(live) else {
            return CommandOutcome::Nothing;
        };
        self.surface.restore(&previous);
        self.stats.undos += 1;
        self.scheduler.arm_autosave(now);
        CommandOutcome::Restored(previous)
    }

    fn redo(&mut self, now: Instant) -> CommandOutcome {
        let live = self.surface.snapshot();
        let Some(next) = self.history.redo(live) else {
            return CommandOutcome::Nothing;
        };
        self.surface.restore(&next);
        self.stats.redos += 1;
        self.scheduler.arm_autosave(now);
        CommandOutcome::Restored(next)
    }

    fn save(&mut self, now: Instant) -> CommandOutcome {
        let content = self.surface.snapshot();
        match self.persist(&content) {
            Ok(()) => {
                self.scheduler.cancel_autosave();
                self.stats.saves += 1;
                self.record_save(SaveKind::Manual);
                self.notify("Document saved successfully", Severity::Success, now);
            }
            Err(err) => {
                tracing::warn!(target: "quill.session", error = %err, "save failed");
                self.notify("Error saving document", Severity::Error, now);
            }
        }
        CommandOutcome::Export {
            file_name: EXPORT_FILE_NAME.to_string(),
            content: content.into(),
        }
    }

    fn new_document(&mut self, now: Instant) -> CommandOutcome {
        self.scheduler.cancel_autosave();
        if let Err(err) = self.storage.clear(&self.config.autosave_key) {
            tracing::warn!(
                target: "quill.session",
                error = %err,
                "could not clear autosaved document"
            );
        }
        let placeholder = Snapshot::from(self.config.placeholder.as_str());
        self.surface.restore(&placeholder);
        self.capture();
        self.notify("New document created", Severity::Success, now);
        CommandOutcome::Restored(placeholder)
    }

    fn open_document(
        &mut self,
        name: &str,
        media_type: &str,
        content: String,
        now: Instant,
    ) -> CommandOutcome {
        if !is_html_file(name, media_type) {
            tracing::debug!(target: "quill.session", name, media_type, "rejected non-HTML file");
            return CommandOutcome::Rejected("Please select an HTML file.".into());
        }
        let snapshot = Snapshot::from(content);
        self.surface.restore(&snapshot);
        self.record_edit(now);
        CommandOutcome::Restored(snapshot)
    }

    // ====================================================================
    // Spell check
    // ====================================================================

    /// Open the suggestion menu for `word`, or for the selected text when
    /// `word` is blank. Does nothing while spell checking is off.
    pub fn open_suggestions(&mut self, word: &str) -> Option<&SuggestionMenu> {
        let word = if word.trim().is_empty() {
            self.surface.selected_text()
        } else {
            word.to_string()
        };
        self.spellcheck.open(&word);
        self.sync_navigation_capture();
        self.spellcheck.menu()
    }

    #[must_use]
    pub fn suggestion_menu(&self) -> Option<&SuggestionMenu> {
        self.spellcheck.menu()
    }

    pub fn select_next_suggestion(&mut self) {
        if let Some(menu) = self.spellcheck.menu_mut() {
            menu.select_next();
        }
    }

    pub fn select_previous_suggestion(&mut self) {
        if let Some(menu) = self.spellcheck.menu_mut() {
            menu.select_previous();
        }
    }

    /// Apply the selected menu item and close the menu.
    ///
    /// A replacement overwrites the surface selection and is captured.
    pub fn choose_suggestion(&mut self, now: Instant) -> CommandOutcome {
        let chosen = self.spellcheck.choose();
        self.sync_navigation_capture();
        match chosen {
            Some(SuggestionItem::Replace(text)) => {
                self.surface.replace_selection(&text);
                self.record_edit(now);
                CommandOutcome::Applied
            }
            Some(SuggestionItem::Ignore) | None => CommandOutcome::Nothing,
        }
    }

    /// Close the menu without choosing. Returns whether one was open.
    pub fn dismiss_suggestions(&mut self) -> bool {
        let was_open = self.spellcheck.dismiss();
        self.sync_navigation_capture();
        was_open
    }

    /// The surface leaves the navigation keys to the menu while it is open.
    fn sync_navigation_capture(&mut self) {
        self.surface
            .capture_navigation(self.spellcheck.menu().is_some());
    }

    // ====================================================================
    // Timers
    // ====================================================================

    /// Fire the autosave if it is due and advance the notification queue.
    ///
    /// Returns the notification changes for the host to display.
    pub fn poll(&mut self, now: Instant) -> Vec<QueueAction> {
        if self.scheduler.autosave_due(now) {
            self.autosave(now);
        }
        self.notifications.tick(now)
    }

    /// Earliest instant at which [`poll`](Self::poll) has work to do.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        match (
            self.scheduler.next_deadline(),
            self.notifications.next_deadline(),
        ) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    fn autosave(&mut self, now: Instant) {
        let content = self.surface.snapshot();
        match self.persist(&content) {
            Ok(()) => {
                self.stats.autosaves += 1;
                self.record_save(SaveKind::Autosave);
                tracing::debug!(target: "quill.autosave", bytes = content.len(), "autosaved");
            }
            Err(err) => {
                self.stats.autosave_failures += 1;
                tracing::warn!(target: "quill.autosave", error = %err, "autosave failed");
                self.notify("Error autosaving document", Severity::Error, now);
            }
        }
    }

    /// Write or drop a pending autosave ahead of [`dispose`](Self::dispose),
    /// per `flush_on_dispose`. Returns whether one was pending.
    pub fn settle_autosave(&mut self, now: Instant) -> bool {
        if !self.scheduler.cancel_autosave() {
            return false;
        }
        if self.config.flush_on_dispose {
            self.autosave(now);
        } else {
            tracing::debug!(target: "quill.autosave", "pending autosave dropped");
        }
        true
    }

    fn persist(&self, content: &Snapshot) -> StorageResult<()> {
        self.storage.save(&self.config.autosave_key, content)
    }

    fn record_save(&mut self, kind: SaveKind) {
        let sequence = self.last_saved.map_or(1, |record| record.sequence + 1);
        self.last_saved = Some(SaveRecord {
            kind,
            at: SystemTime::now(),
            sequence,
        });
    }

    // ====================================================================
    // Helpers
    // ====================================================================

    /// Record the live content into history if it changed.
    pub fn capture(&mut self) -> bool {
        let changed = self.history.capture(self.surface.snapshot());
        if changed {
            self.stats.captures += 1;
        }
        changed
    }

    /// Capture an edit made by a command and schedule it for autosave.
    fn record_edit(&mut self, now: Instant) {
        self.capture();
        self.scheduler.arm_autosave(now);
    }

    /// Queue a notification for the host.
    pub fn notify(&mut self, message: impl Into<String>, severity: Severity, now: Instant) {
        self.notifications.push(message, severity, now);
    }

    /// Word and character counts of the live document.
    #[must_use]
    pub fn metrics(&self) -> DocumentMetrics {
        DocumentMetrics::from_text(&self.surface.plain_text())
    }

    // ====================================================================
    // Accessors
    // ====================================================================

    #[must_use]
    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    #[must_use]
    pub fn history(&self) -> &HistoryManager {
        &self.history
    }

    #[must_use]
    pub fn scheduler(&self) -> &ChangeScheduler {
        &self.scheduler
    }

    #[must_use]
    pub fn notifications(&self) -> &NotificationQueue {
        &self.notifications
    }

    #[must_use]
    pub fn spellcheck(&self) -> &SpellChecker {
        &self.spellcheck
    }

    #[must_use]
    pub fn storage(&self) -> &dyn StorageBackend {
        self.storage.as_ref()
    }

    #[must_use]
    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    #[must_use]
    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    /// The last successful save or autosave, for a save status indicator.
    #[must_use]
    pub fn last_saved(&self) -> Option<SaveRecord> {
        self.last_saved
    }

    /// End the session.
    ///
    /// A pending autosave is written now when `flush_on_dispose` is set and
    /// dropped otherwise.
    pub fn dispose(mut self, now: Instant) -> SessionStats {
        self.settle_autosave(now);
        tracing::info!(
            target: "quill.session",
            captures = self.stats.captures,
            commands = self.stats.commands,
            autosaves = self.stats.autosaves,
            "session disposed"
        );
        self.stats
    }
}
