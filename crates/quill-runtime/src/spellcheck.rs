#![forbid(unsafe_code)]

//! Spell-check toggle and suggestion menu state.
//!
//! The editor does not detect misspellings itself. When spell checking is
//! on and the user asks about a word, a [`SuggestionProvider`] supplies
//! replacements and [`SpellChecker`] keeps the state of the resulting
//! [`SuggestionMenu`] until a choice is made or the menu is dismissed.

use std::collections::HashMap;

/// Source of spelling suggestions.
pub trait SuggestionProvider: Send {
    /// Replacement candidates for `word`, best first. Empty when unknown.
    fn suggestions(&self, word: &str) -> Vec<String>;
}

/// Fixed dictionary of misspelling → suggestions, matched case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct StaticDictionary {
    entries: HashMap<String, Vec<String>>,
}

impl StaticDictionary {
    /// An empty dictionary.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in list of common English misspellings.
    #[must_use]
    pub fn common_misspellings() -> Self {
        [
            ("teh", ["the", "tech", "ten"]),
            ("thier", ["their", "there", "they"]),
            ("recieve", ["receive", "relieve", "reprieve"]),
            ("seperate", ["separate", "desperate", "temperate"]),
            ("definately", ["definitely", "defiantly", "infinitely"]),
            ("accomodate", ["accommodate", "accelerate", "accumulate"]),
            ("occured", ["occurred", "secured", "obscured"]),
            ("untill", ["until", "instill", "entail"]),
        ]
        .into_iter()
        .fold(Self::new(), |dict, (word, suggestions)| {
            dict.with_entry(word, suggestions)
        })
    }

    /// Add or replace an entry.
    #[must_use]
    pub fn with_entry<I, S>(mut self, word: &str, suggestions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.entries.insert(
            word.to_lowercase(),
            suggestions.into_iter().map(Into::into).collect(),
        );
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl SuggestionProvider for StaticDictionary {
    fn suggestions(&self, word: &str) -> Vec<String> {
        self.entries
            .get(&word.trim().to_lowercase())
            .cloned()
            .unwrap_or_default()
    }
}

/// One row of the suggestion menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SuggestionItem {
    /// Replace the word with this text.
    Replace(String),
    /// Leave the word as is.
    Ignore,
}

/// Suggestions for a single word, with a keyboard-driven selection.
///
/// The last item is always [`SuggestionItem::Ignore`], so the menu is never
/// empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestionMenu {
    word: String,
    items: Vec<SuggestionItem>,
    selected: usize,
}

impl SuggestionMenu {
    #[must_use]
    pub fn new(word: impl Into<String>, suggestions: Vec<String>) -> Self {
        let mut items: Vec<SuggestionItem> =
            suggestions.into_iter().map(SuggestionItem::Replace).collect();
        items.push(SuggestionItem::Ignore);
        Self {
            word: word.into(),
            items,
            selected: 0,
        }
    }

    /// The word the menu was opened for.
    #[must_use]
    pub fn word(&self) -> &str {
        &self.word
    }

    #[must_use]
    pub fn items(&self) -> &[SuggestionItem] {
        &self.items
    }

    /// Whether the provider had nothing to offer.
    #[must_use]
    pub fn has_suggestions(&self) -> bool {
        self.items.len() > 1
    }

    #[must_use]
    pub fn selected_index(&self) -> usize {
        self.selected
    }

    #[must_use]
    pub fn selected(&self) -> &SuggestionItem {
        &self.items[self.selected]
    }

    /// Move the selection down, stopping at the last item.
    pub fn select_next(&mut self) {
        self.selected = (self.selected + 1).min(self.items.len() - 1);
    }

    /// Move the selection up, stopping at the first item.
    pub fn select_previous(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }
}

/// Spell-check toggle plus the open suggestion menu, if any.
pub struct SpellChecker {
    enabled: bool,
    provider: Box<dyn SuggestionProvider>,
    menu: Option<SuggestionMenu>,
}

impl std::fmt::Debug for SpellChecker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpellChecker")
            .field("enabled", &self.enabled)
            .field("menu", &self.menu)
            .finish_non_exhaustive()
    }
}

impl Default for SpellChecker {
    fn default() -> Self {
        Self::new(Box::new(StaticDictionary::common_misspellings()))
    }
}

impl SpellChecker {
    /// Disabled checker backed by `provider`.
    #[must_use]
    pub fn new(provider: Box<dyn SuggestionProvider>) -> Self {
        Self {
            enabled: false,
            provider,
            menu: None,
        }
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Flip the toggle and return the new state. Turning off closes the menu.
    pub fn toggle(&mut self) -> bool {
        self.enabled = !self.enabled;
        if !self.enabled {
            self.menu = None;
        }
        self.enabled
    }

    /// Open the menu for `word`.
    ///
    /// Does nothing and returns `None` when disabled or `word` is blank.
    pub fn open(&mut self, word: &str) -> Option<&SuggestionMenu> {
        let word = word.trim();
        if !self.enabled || word.is_empty() {
            return None;
        }
        let suggestions = self.provider.suggestions(word);
        self.menu = Some(SuggestionMenu::new(word, suggestions));
        self.menu.as_ref()
    }

    #[must_use]
    pub fn menu(&self) -> Option<&SuggestionMenu> {
        self.menu.as_ref()
    }

    pub fn menu_mut(&mut self) -> Option<&mut SuggestionMenu> {
        self.menu.as_mut()
    }

    /// Close the menu and return the selected item.
    pub fn choose(&mut self) -> Option<SuggestionItem> {
        self.menu.take().map(|menu| menu.selected().clone())
    }

    /// Close the menu without choosing. Returns whether one was open.
    pub fn dismiss(&mut self) -> bool {
        self.menu.take().is_some()
    }

    /// Look up suggestions without touching menu state.
    #[must_use]
    pub fn suggestions(&self, word: &str) -> Vec<String> {
        self.provider.suggestions(word)
    }
}
