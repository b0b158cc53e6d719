#![forbid(unsafe_code)]

//! Snapshot-based undo/redo history.
//!
//! [`HistoryManager`] records whole-document [`Snapshot`]s. It never diffs:
//! every entry is the full serialized content, and since snapshots are
//! `Arc<str>`-backed, moving one between stacks is a pointer copy.
//!
//! # Architecture
//!
//! ```text
//! capture(s3)
//! ┌───────────────────────────────────────────┐
//! │ Undo Stack:  [s0, s1, s2]                 │
//! │ Redo Stack:  []                           │
//! │ Last:        s3                           │
//! └───────────────────────────────────────────┘
//!
//! undo(live) x2
//! ┌───────────────────────────────────────────┐
//! │ Undo Stack:  [s0]                         │
//! │ Redo Stack:  [s3, s2]                     │
//! │ Last:        s1                           │
//! └───────────────────────────────────────────┘
//!
//! capture(s4): new branch, clears redo
//! ┌───────────────────────────────────────────┐
//! │ Undo Stack:  [s0, s1]                     │
//! │ Redo Stack:  []                           │
//! │ Last:        s4                           │
//! └───────────────────────────────────────────┘
//! ```
//!
//! Unlike a store that keeps the current state on top of the undo stack,
//! the live document is held separately in `last`, so `undo` and `redo`
//! take the live content from the caller. The caller is responsible for
//! restoring the returned snapshot into the editing surface.
//!
//! # Invariants
//!
//! 1. `undo_depth() <= config.max_undo` after any operation.
//! 2. A capture that changes `last` clears the redo stack.
//! 3. The redo stack only grows through `undo` and only shrinks through
//!    `redo` or a changing capture.
//! 4. `last_snapshot()` is the most recently captured or restored snapshot.

use std::collections::VecDeque;
use std::fmt;

use quill_core::snapshot::Snapshot;

/// Default number of undo steps retained.
pub const DEFAULT_MAX_UNDO: usize = 50;

/// Configuration for the history manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryConfig {
    /// Maximum number of snapshots retained on the undo stack.
    /// Oldest snapshots are evicted first.
    pub max_undo: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_undo: DEFAULT_MAX_UNDO,
        }
    }
}

impl HistoryConfig {
    /// Create a configuration with the given undo depth.
    #[must_use]
    pub const fn new(max_undo: usize) -> Self {
        Self { max_undo }
    }

    /// Create an unlimited configuration (for testing).
    #[must_use]
    pub const fn unlimited() -> Self {
        Self {
            max_undo: usize::MAX,
        }
    }
}

/// Two bounded snapshot stacks plus the last recorded snapshot.
pub struct HistoryManager {
    /// Older snapshots, oldest at the front.
    undo_stack: VecDeque<Snapshot>,
    /// Undone snapshots, most recently undone at the back.
    redo_stack: VecDeque<Snapshot>,
    last: Snapshot,
    config: HistoryConfig,
}

impl fmt::Debug for HistoryManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HistoryManager")
            .field("undo_depth", &self.undo_stack.len())
            .field("redo_depth", &self.redo_stack.len())
            .field("last", &self.last)
            .field("config", &self.config)
            .finish()
    }
}

impl HistoryManager {
    /// Create a history seeded with the document's initial content.
    #[must_use]
    pub fn new(initial: Snapshot, config: HistoryConfig) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: VecDeque::new(),
            last: initial,
            config,
        }
    }

    /// Create a history with the default configuration.
    #[must_use]
    pub fn with_default_config(initial: Snapshot) -> Self {
        Self::new(initial, HistoryConfig::default())
    }

    // ====================================================================
    // Core Operations
    // ====================================================================

    /// Record `current` if it differs from the last snapshot.
    ///
    /// Returns `true` when history changed. Repeated captures of the same
    /// content are no-ops.
    pub fn capture(&mut self, current: Snapshot) -> bool {
        if current == self.last {
            return false;
        }
        let previous = std::mem::replace(&mut self.last, current);
        self.undo_stack.push_back(previous);
        self.redo_stack.clear();
        self.enforce_depth();
        tracing::trace!(
            target: "quill.history",
            undo_depth = self.undo_stack.len(),
            "captured snapshot"
        );
        true
    }

    /// Step back one snapshot.
    ///
    /// `live` is the surface content right now; it goes onto the redo stack
    /// so that uncaptured edits survive an undo/redo round trip. Returns
    /// `None` when there is nothing to undo.
    pub fn undo(&mut self, live: Snapshot) -> Option<Snapshot> {
        let previous = self.undo_stack.pop_back()?;
        self.redo_stack.push_back(live);
        self.last = previous.clone();
        tracing::debug!(
            target: "quill.history",
            undo_depth = self.undo_stack.len(),
            redo_depth = self.redo_stack.len(),
            "undo"
        );
        Some(previous)
    }

    /// Step forward one snapshot. Returns `None` when there is nothing to redo.
    pub fn redo(&mut self, live: Snapshot) -> Option<Snapshot> {
        let next = self.redo_stack.pop_back()?;
        self.undo_stack.push_back(live);
        self.enforce_depth();
        self.last = next.clone();
        tracing::debug!(
            target: "quill.history",
            undo_depth = self.undo_stack.len(),
            redo_depth = self.redo_stack.len(),
            "redo"
        );
        Some(next)
    }

    // ====================================================================
    // Query
    // ====================================================================

    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Number of snapshots available to undo.
    #[must_use]
    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    /// Number of snapshots available to redo.
    #[must_use]
    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    /// The most recently captured or restored snapshot.
    #[must_use]
    pub fn last_snapshot(&self) -> &Snapshot {
        &self.last
    }

    #[must_use]
    pub fn config(&self) -> &HistoryConfig {
        &self.config
    }

    fn enforce_depth(&mut self) {
        while self.undo_stack.len() > self.config.max_undo {
            self.undo_stack.pop_front();
        }
    }
}
