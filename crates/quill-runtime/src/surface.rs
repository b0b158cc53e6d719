#![forbid(unsafe_code)]

//! The editing surface seam.
//!
//! [`EditorSurface`] is everything the session needs from the thing that
//! actually holds and renders the document: read the content, put content
//! back, and delegate formatting. Surfaces report user activity to
//! observers registered with [`EditorSurface::subscribe`], so the session
//! never polls for changes.
//!
//! [`MemorySurface`] is a headless implementation over a markup string. It
//! is cheap to clone; clones share one document, so a host can keep typing
//! into the surface it handed to a session.

use std::ops::Range;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use quill_core::event::{KeyCode, KeyEvent, KeyEventKind, Modifiers, PointerButton};
use quill_core::format::FormatCommand;
use quill_core::markup;
use quill_core::snapshot::Snapshot;
use unicode_segmentation::UnicodeSegmentation;

use crate::session::SessionEvent;

/// Callback receiving surface activity.
///
/// Observers run while the surface is locked and must not call back into it.
pub type SurfaceObserver = Box<dyn Fn(SessionEvent) + Send>;

/// The document surface the session edits.
pub trait EditorSurface: Send {
    /// Full serialized content.
    fn snapshot(&self) -> Snapshot;

    /// Replace the content. Programmatic restores do not notify observers.
    fn restore(&mut self, snapshot: &Snapshot);

    /// Visible text, for word and character counts.
    fn plain_text(&self) -> String {
        markup::plain_text(&self.snapshot())
    }

    /// Visible text of the current selection; empty when nothing is selected.
    fn selected_text(&self) -> String;

    /// Replace the selection (or insert at the caret) with plain text.
    fn replace_selection(&mut self, text: &str);

    /// Apply a formatting command. Returns whether anything changed.
    fn apply_format(&mut self, command: &FormatCommand) -> bool;

    /// Replace the selection (or insert at the caret) with markup.
    fn insert_markup(&mut self, markup: &str);

    /// Register an observer for user activity. Surfaces that cannot report
    /// activity ignore this; the periodic capture tick still sees changes.
    fn subscribe(&mut self, _observer: SurfaceObserver) {}

    /// Hand Up, Down, Enter and Escape to an open popup such as the
    /// suggestion menu. While captured those keys are still reported to
    /// observers but must not edit the document.
    fn capture_navigation(&mut self, _captured: bool) {}
}

struct SurfaceState {
    content: String,
    caret: usize,
    selection: Option<Range<usize>>,
    navigation_captured: bool,
    observers: Vec<SurfaceObserver>,
}

impl SurfaceState {
    fn emit(&self, event: SessionEvent) {
        for observer in &self.observers {
            observer(event);
        }
    }

    fn set_content(&mut self, content: String) {
        self.caret = default_caret(&content);
        self.content = content;
        self.selection = None;
    }

    /// Replace the selection, or insert at the caret, with raw markup.
    fn splice(&mut self, markup: &str) -> Range<usize> {
        let range = self.selection.take().unwrap_or(self.caret..self.caret);
        let start = range.start;
        self.content.replace_range(range, markup);
        self.caret = start + markup.len();
        start..self.caret
    }

    fn backspace(&mut self) -> bool {
        if self.selection.is_some() {
            self.splice("");
            return true;
        }
        let Some(range) = text_unit_before(&self.content, self.caret) else {
            return false;
        };
        self.caret = range.start;
        self.content.replace_range(range, "");
        true
    }

    fn delete_forward(&mut self) -> bool {
        if self.selection.is_some() {
            self.splice("");
            return true;
        }
        let Some(range) = text_unit_after(&self.content, self.caret) else {
            return false;
        };
        self.content.replace_range(range, "");
        true
    }

    fn outdent(&mut self) -> bool {
        const OPEN: &str = "<blockquote>";
        const CLOSE: &str = "</blockquote>";
        let Some(range) = self.selection.clone() else {
            return false;
        };
        if !self.content[..range.start].ends_with(OPEN) || !self.content[range.end..].starts_with(CLOSE)
        {
            return false;
        }
        self.content.replace_range(range.end..range.end + CLOSE.len(), "");
        self.content
            .replace_range(range.start - OPEN.len()..range.start, "");
        let selection = range.start - OPEN.len()..range.end - OPEN.len();
        self.caret = selection.end;
        self.selection = Some(selection);
        true
    }
}

/// Headless surface over a markup string.
#[derive(Clone)]
pub struct MemorySurface {
    state: Arc<Mutex<SurfaceState>>,
}

impl std::fmt::Debug for MemorySurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("MemorySurface")
            .field("len", &state.content.len())
            .field("caret", &state.caret)
            .field("selection", &state.selection)
            .field("navigation_captured", &state.navigation_captured)
            .field("observers", &state.observers.len())
            .finish()
    }
}

impl Default for MemorySurface {
    fn default() -> Self {
        Self::new("")
    }
}

impl MemorySurface {
    /// A surface holding `content`, with the caret at the end of the text.
    #[must_use]
    pub fn new(content: impl Into<String>) -> Self {
        let content = content.into();
        Self {
            state: Arc::new(Mutex::new(SurfaceState {
                caret: default_caret(&content),
                content,
                selection: None,
                navigation_captured: false,
                observers: Vec::new(),
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SurfaceState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current markup.
    #[must_use]
    pub fn content(&self) -> String {
        self.lock().content.clone()
    }

    /// Caret byte offset into the markup.
    #[must_use]
    pub fn caret(&self) -> usize {
        self.lock().caret
    }

    /// Selected byte range of the markup, if any.
    #[must_use]
    pub fn selection(&self) -> Option<Range<usize>> {
        self.lock().selection.clone()
    }

    // --- User activity ---------------------------------------------------

    /// Type plain text at the caret, replacing any selection.
    pub fn type_text(&self, text: &str) {
        if text.is_empty() {
            return;
        }
        let mut state = self.lock();
        state.splice(&markup::escape_text(text));
        state.emit(SessionEvent::Input);
    }

    /// Press and release a key.
    ///
    /// Unmodified character keys, Enter, Backspace and Delete edit the
    /// content, except for navigation keys while a popup has captured them.
    /// Every press is reported as a key-down/key-up pair so chords reach the
    /// session's key bindings.
    pub fn press(&self, key: KeyEvent) {
        let mut state = self.lock();
        state.emit(SessionEvent::KeyDown(key));
        let plain = !key
            .modifiers
            .intersects(Modifiers::CTRL | Modifiers::ALT | Modifiers::SUPER);
        let captured = state.navigation_captured && is_navigation_key(key.code);
        let changed = plain
            && !captured
            && match key.code {
                KeyCode::Char(c) => {
                    let mut buf = [0u8; 4];
                    state.splice(&markup::escape_text(c.encode_utf8(&mut buf)));
                    true
                }
                KeyCode::Enter => {
                    state.splice("<br>");
                    true
                }
                KeyCode::Backspace => state.backspace(),
                KeyCode::Delete => state.delete_forward(),
                _ => false,
            };
        if changed {
            state.emit(SessionEvent::Input);
        }
        state.emit(SessionEvent::KeyUp(key.with_kind(KeyEventKind::Release)));
    }

    /// Click in the document.
    pub fn click(&self) {
        self.lock()
            .emit(SessionEvent::PointerUp(PointerButton::Primary));
    }

    /// Select the first occurrence of `text`. Returns whether it was found.
    pub fn select(&self, text: &str) -> bool {
        let needle = markup::escape_text(text);
        let mut state = self.lock();
        let Some(start) = (!needle.is_empty())
            .then(|| state.content.find(&needle))
            .flatten()
        else {
            return false;
        };
        let end = start + needle.len();
        state.selection = Some(start..end);
        state.caret = end;
        true
    }

    /// Drop the selection, leaving the caret where it is.
    pub fn clear_selection(&self) {
        self.lock().selection = None;
    }
}

impl EditorSurface for MemorySurface {
    fn snapshot(&self) -> Snapshot {
        Snapshot::from(self.content())
    }

    fn restore(&mut self, snapshot: &Snapshot) {
        self.lock().set_content(snapshot.to_string());
    }

    fn plain_text(&self) -> String {
        markup::plain_text(&self.lock().content)
    }

    fn selected_text(&self) -> String {
        let state = self.lock();
        state
            .selection
            .clone()
            .map(|range| markup::plain_text(&state.content[range]))
            .unwrap_or_default()
    }

    fn replace_selection(&mut self, text: &str) {
        self.lock().splice(&markup::escape_text(text));
    }

    fn apply_format(&mut self, command: &FormatCommand) -> bool {
        let mut state = self.lock();
        match command {
            FormatCommand::InsertImage(url) => {
                let Some(img) = markup::image(url) else {
                    return false;
                };
                state.splice(&img);
                true
            }
            FormatCommand::Outdent => state.outdent(),
            _ => {
                let Some(range) = state.selection.clone() else {
                    return false;
                };
                let Some(html) = markup::format_fragment(command, &state.content[range]) else {
                    return false;
                };
                let wrapped = state.splice(&html);
                state.selection = Some(wrapped);
                true
            }
        }
    }

    fn insert_markup(&mut self, markup: &str) {
        self.lock().splice(markup);
    }

    fn subscribe(&mut self, observer: SurfaceObserver) {
        self.lock().observers.push(observer);
    }

    fn capture_navigation(&mut self, captured: bool) {
        self.lock().navigation_captured = captured;
    }
}

fn is_navigation_key(code: KeyCode) -> bool {
    matches!(
        code,
        KeyCode::Up | KeyCode::Down | KeyCode::Enter | KeyCode::Escape
    )
}

/// Caret position at the end of the text: before any trailing closing tags.
fn default_caret(content: &str) -> usize {
    let mut end = content.len();
    loop {
        let head = &content[..end];
        if !head.ends_with('>') {
            return end;
        }
        match head.rfind("</") {
            Some(open) if !head[open + 2..].contains('<') => end = open,
            _ => return end,
        }
    }
}

/// Byte range of the grapheme (or entity) before `pos`, skipping tags.
fn text_unit_before(content: &str, pos: usize) -> Option<Range<usize>> {
    let mut end = pos;
    loop {
        let head = &content[..end];
        let last = head.chars().next_back()?;
        if last == '>' {
            end = head.rfind('<')?;
            continue;
        }
        if last == ';'
            && let Some(amp) = head.rfind('&')
            && end - amp <= 10
            && !head[amp..].contains(char::is_whitespace)
        {
            return Some(amp..end);
        }
        let run = head.rfind(['>', ';']).map_or(0, |i| i + 1);
        let start = head[run..]
            .grapheme_indices(true)
            .next_back()
            .map_or(end - last.len_utf8(), |(i, _)| run + i);
        return Some(start..end);
    }
}

/// Byte range of the grapheme (or entity) at `pos`, skipping tags.
fn text_unit_after(content: &str, pos: usize) -> Option<Range<usize>> {
    let mut start = pos;
    loop {
        let tail = &content[start..];
        let first = tail.chars().next()?;
        if first == '<' {
            start += tail.find('>')? + 1;
            continue;
        }
        if first == '&'
            && let Some(semi) = tail.find(';')
            && semi <= 10
            && !tail[..semi].contains(char::is_whitespace)
        {
            return Some(start..start + semi + 1);
        }
        let run = tail.find(['<', '&']).unwrap_or(tail.len());
        let len = tail[..run]
            .graphemes(true)
            .next()
            .map_or(first.len_utf8(), str::len);
        return Some(start..start + len);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    const PLACEHOLDER: &str = "<p>Start typing your document here...</p>";

    fn recording(surface: &mut MemorySurface) -> mpsc::Receiver<SessionEvent> {
        let (tx, rx) = mpsc::channel();
        surface.subscribe(Box::new(move |ev| {
            let _ = tx.send(ev);
        }));
        rx
    }

    #[test]
    fn caret_starts_inside_trailing_paragraph() {
        let surface = MemorySurface::new(PLACEHOLDER);
        assert_eq!(surface.caret(), PLACEHOLDER.len() - "</p>".len());
        assert_eq!(default_caret("<p>a</p><p>b</p>"), "<p>a</p><p>b".len());
        assert_eq!(default_caret("text<br>"), "text<br>".len());
        assert_eq!(default_caret(""), 0);
    }

    #[test]
    fn typing_inserts_escaped_text_and_notifies() {
        let mut surface = MemorySurface::new("<p>Hi</p>");
        let rx = recording(&mut surface);
        surface.type_text(" & bye");
        assert_eq!(surface.content(), "<p>Hi &amp; bye</p>");
        assert_eq!(surface.plain_text(), "Hi & bye\n");
        assert_eq!(rx.try_recv(), Ok(SessionEvent::Input));
    }

    #[test]
    fn press_reports_key_down_input_key_up() {
        let mut surface = MemorySurface::new("<p>ab</p>");
        let rx = recording(&mut surface);
        surface.press(KeyEvent::new(KeyCode::Backspace));
        assert_eq!(surface.content(), "<p>a</p>");
        let events: Vec<_> = rx.try_iter().collect();
        assert_eq!(
            events,
            vec![
                SessionEvent::KeyDown(KeyEvent::new(KeyCode::Backspace)),
                SessionEvent::Input,
                SessionEvent::KeyUp(
                    KeyEvent::new(KeyCode::Backspace).with_kind(KeyEventKind::Release)
                ),
            ]
        );
    }

    #[test]
    fn chords_do_not_edit() {
        let mut surface = MemorySurface::new("<p>ab</p>");
        let rx = recording(&mut surface);
        surface.press(KeyEvent::new(KeyCode::Char('z')).with_modifiers(Modifiers::CTRL));
        assert_eq!(surface.content(), "<p>ab</p>");
        assert!(!rx.try_iter().any(|ev| ev == SessionEvent::Input));
    }

    #[test]
    fn backspace_skips_tags_and_entities() {
        let mut state = SurfaceState {
            content: "<p>a&amp;</p><p></p>".into(),
            caret: "<p>a&amp;</p><p>".len(),
            selection: None,
            navigation_captured: false,
            observers: Vec::new(),
        };
        assert!(state.backspace());
        assert_eq!(state.content, "<p>a</p><p></p>");
        assert!(state.backspace());
        assert_eq!(state.content, "<p></p><p></p>");
        assert!(!state.backspace());
    }

    #[test]
    fn delete_removes_next_character() {
        let surface = MemorySurface::new("<p>abc</p>");
        surface.select("a");
        surface.clear_selection();
        surface.press(KeyEvent::new(KeyCode::Delete));
        assert_eq!(surface.content(), "<p>ac</p>");
    }

    #[test]
    fn backspace_removes_whole_grapheme() {
        let surface = MemorySurface::new("<p></p>");
        surface.type_text("cafe\u{301}");
        surface.press(KeyEvent::new(KeyCode::Backspace));
        assert_eq!(surface.content(), "<p>caf</p>");

        let family = "\u{1F468}\u{200D}\u{1F469}\u{200D}\u{1F467}";
        surface.type_text(&format!("e{family}"));
        surface.press(KeyEvent::new(KeyCode::Backspace));
        assert_eq!(surface.content(), "<p>cafe</p>");
    }

    #[test]
    fn delete_removes_whole_grapheme() {
        let family = "\u{1F468}\u{200D}\u{1F469}\u{200D}\u{1F467}";
        let surface = MemorySurface::new(format!("<p>a{family}e\u{301}b</p>"));
        surface.select("a");
        surface.clear_selection();
        surface.press(KeyEvent::new(KeyCode::Delete));
        assert_eq!(surface.content(), "<p>ae\u{301}b</p>");
        surface.press(KeyEvent::new(KeyCode::Delete));
        assert_eq!(surface.content(), "<p>ab</p>");
    }

    #[test]
    fn captured_navigation_keys_do_not_edit() {
        let mut surface = MemorySurface::new("<p>teh</p>");
        surface.select("teh");
        surface.capture_navigation(true);
        let rx = recording(&mut surface);
        for code in [KeyCode::Up, KeyCode::Down, KeyCode::Enter, KeyCode::Escape] {
            surface.press(KeyEvent::new(code));
        }
        assert_eq!(surface.content(), "<p>teh</p>");
        assert_eq!(surface.selection(), Some(3..6));
        let events: Vec<_> = rx.try_iter().collect();
        assert_eq!(events.len(), 8);
        assert!(!events.contains(&SessionEvent::Input));

        surface.capture_navigation(false);
        surface.press(KeyEvent::new(KeyCode::Enter));
        assert_eq!(surface.content(), "<p><br></p>");
    }

    #[test]
    fn enter_inserts_line_break() {
        let surface = MemorySurface::new("<p>a</p>");
        surface.press(KeyEvent::new(KeyCode::Enter));
        assert_eq!(surface.content(), "<p>a<br></p>");
    }

    #[test]
    fn select_and_replace() {
        let mut surface = MemorySurface::new("<p>teh cat</p>");
        assert!(surface.select("teh"));
        assert_eq!(surface.selected_text(), "teh");
        surface.replace_selection("the");
        assert_eq!(surface.content(), "<p>the cat</p>");
        assert!(surface.selection().is_none());
        assert!(!surface.select("dog"));
        assert!(!surface.select(""));
    }

    #[test]
    fn format_wraps_selection_and_keeps_it_selected() {
        let mut surface = MemorySurface::new("<p>make bold</p>");
        assert!(!surface.apply_format(&FormatCommand::Bold));
        surface.select("bold");
        assert!(surface.apply_format(&FormatCommand::Bold));
        assert!(surface.apply_format(&FormatCommand::Italic));
        assert_eq!(surface.content(), "<p>make <i><b>bold</b></i></p>");
    }

    #[test]
    fn indent_then_outdent_round_trips() {
        let mut surface = MemorySurface::new("<p>x</p>");
        surface.select("x");
        assert!(surface.apply_format(&FormatCommand::Indent));
        assert_eq!(surface.content(), "<p><blockquote>x</blockquote></p>");
        // Selection now covers the blockquote; reselect the text inside.
        surface.select("x");
        assert!(surface.apply_format(&FormatCommand::Outdent));
        assert_eq!(surface.content(), "<p>x</p>");
        assert!(!surface.apply_format(&FormatCommand::Outdent));
    }

    #[test]
    fn insert_image_at_caret() {
        let mut surface = MemorySurface::new("<p>a</p>");
        assert!(surface.apply_format(&FormatCommand::InsertImage("cat.png".into())));
        assert!(surface.content().starts_with("<p>a<img src=\"cat.png\">"));
    }

    #[test]
    fn restore_is_silent_and_resets_selection() {
        let mut surface = MemorySurface::new("<p>a</p>");
        let rx = recording(&mut surface);
        surface.select("a");
        surface.restore(&Snapshot::from("<p>b</p>"));
        assert_eq!(surface.snapshot(), "<p>b</p>");
        assert!(surface.selection().is_none());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn clones_share_the_document() {
        let host = MemorySurface::new("<p></p>");
        let mut session_side = host.clone();
        host.type_text("hi");
        assert_eq!(session_side.snapshot(), "<p>hi</p>");
        session_side.insert_markup("<hr>");
        assert_eq!(host.content(), "<p>hi<hr></p>");
    }

    #[test]
    fn click_reports_pointer_up() {
        let mut surface = MemorySurface::new("");
        let rx = recording(&mut surface);
        surface.click();
        assert_eq!(
            rx.try_recv(),
            Ok(SessionEvent::PointerUp(PointerButton::Primary))
        );
    }
}
