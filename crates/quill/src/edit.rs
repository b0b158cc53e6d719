#![forbid(unsafe_code)]

//! Line-oriented headless editing session.
//!
//! Each input line is one directive (`type hello`, `key ctrl+z`,
//! `format bold`, ...). Directives are posted into an [`EditorRuntime`] that
//! this module pumps after every line, so shortcuts, capture triggers and
//! the autosave debounce behave exactly as they would under an interactive
//! host. Output is written as plain lines: notifications, command outcomes,
//! save status and suggestion menus.

use std::fmt;
use std::fs;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use web_time::Instant;

use quill_core::event::KeyEvent;
use quill_core::format::FormatCommand;
use quill_runtime::command::{CommandOutcome, EditorCommand};
use quill_runtime::config::EditorConfig;
use quill_runtime::notification::{NotificationSink, Severity};
use quill_runtime::persistence::StorageBackend;
use quill_runtime::runtime::{EditorRuntime, RuntimeHandle, RuntimeHost, RuntimeMsg};
use quill_runtime::session::{EditorSession, SaveRecord, SessionStats};
use quill_runtime::spellcheck::{SuggestionItem, SuggestionMenu};
use quill_runtime::surface::MemorySurface;

use crate::error::Result;

const HELP: &str = "\
directives:
  type <text>            insert text at the caret
  key <chord>            press a key, e.g. space, enter, ctrl+z
  click                  click in the document
  select <text>          select the first occurrence of text
  format <kind> [value]  bold, italic, center, size 5, color #f00, image <url>, ...
  undo | redo
  save [path]            persist now, optionally exporting to path
  print <path>           write the print-ready document to path
  new                    start a new document
  open <path>            replace the document with an HTML file
  table <rows> <cols> [header]
  link <url> [text]
  spell                  toggle spell checking
  suggest [word]         open suggestions for word (or the selection)
  show | stats | help | quit";

// ============================================================================
// Directives
// ============================================================================

/// One parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    Type(String),
    Key(KeyEvent),
    Click,
    Select(String),
    Command(EditorCommand),
    Save(Option<PathBuf>),
    Print(PathBuf),
    Open(PathBuf),
    Suggest(String),
    Show,
    Stats,
    Help,
    Quit,
}

/// Error for an input line that is not a directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectiveError(String);

impl fmt::Display for DirectiveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for DirectiveError {}

impl FromStr for Directive {
    type Err = DirectiveError;

    fn from_str(line: &str) -> std::result::Result<Self, Self::Err> {
        let line = line.trim_end_matches(['\r', '\n']);
        let (verb, rest) = match line.trim_start().split_once(' ') {
            Some((verb, rest)) => (verb, rest),
            None => (line.trim(), ""),
        };
        let arg = rest.trim();
        let required = |what: &str| {
            if arg.is_empty() {
                Err(DirectiveError(format!("{verb}: missing {what}")))
            } else {
                Ok(arg.to_string())
            }
        };

        let directive = match verb.to_ascii_lowercase().as_str() {
            // Typed text keeps its inner spacing.
            "type" => Self::Type(required("text").map(|_| rest.to_string())?),
            "key" => Self::Key(
                required("key")?
                    .parse()
                    .map_err(|e| DirectiveError(format!("key: {e}")))?,
            ),
            "click" => Self::Click,
            "select" => Self::Select(required("text")?),
            "format" => Self::Command(EditorCommand::Format(
                required("format")?
                    .parse::<FormatCommand>()
                    .map_err(|e| DirectiveError(e.to_string()))?,
            )),
            "undo" => Self::Command(EditorCommand::Undo),
            "redo" => Self::Command(EditorCommand::Redo),
            "save" => Self::Save((!arg.is_empty()).then(|| PathBuf::from(arg))),
            "print" => Self::Print(PathBuf::from(required("path")?)),
            "new" => Self::Command(EditorCommand::NewDocument),
            "open" => Self::Open(PathBuf::from(required("path")?)),
            "table" => parse_table(arg)?,
            "link" => {
                let url = required("url")?;
                let (url, text) = match url.split_once(char::is_whitespace) {
                    Some((url, text)) => (url.to_string(), text.trim().to_string()),
                    None => (url, String::new()),
                };
                Self::Command(EditorCommand::InsertLink { url, text })
            }
            "spell" => Self::Command(EditorCommand::ToggleSpellCheck),
            "suggest" => Self::Suggest(arg.to_string()),
            "show" => Self::Show,
            "stats" => Self::Stats,
            "help" | "?" => Self::Help,
            "quit" | "exit" => Self::Quit,
            "" => return Err(DirectiveError("empty line".into())),
            other => return Err(DirectiveError(format!("unknown directive `{other}`"))),
        };
        Ok(directive)
    }
}

fn parse_table(arg: &str) -> std::result::Result<Directive, DirectiveError> {
    let usage = || DirectiveError("usage: table <rows> <cols> [header]".into());
    let mut parts = arg.split_whitespace();
    let rows = parts.next().and_then(|p| p.parse().ok()).ok_or_else(usage)?;
    let cols = parts.next().and_then(|p| p.parse().ok()).ok_or_else(usage)?;
    let header = match parts.next() {
        None => false,
        Some(flag) if flag.eq_ignore_ascii_case("header") => true,
        Some(_) => return Err(usage()),
    };
    Ok(Directive::Command(EditorCommand::InsertTable { rows, cols, header }))
}

// ============================================================================
// Host
// ============================================================================

/// Something the runtime reported back, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
enum HostEvent {
    Note(String, Severity),
    Outcome(CommandOutcome),
    Menu(Option<SuggestionMenu>),
    Saved(SaveRecord),
}

/// Records runtime callbacks until the loop renders them.
#[derive(Debug, Default)]
struct CliHost {
    events: Vec<HostEvent>,
}

impl CliHost {
    fn drain(&mut self) -> Vec<HostEvent> {
        std::mem::take(&mut self.events)
    }
}

impl NotificationSink for CliHost {
    fn notify(&mut self, message: &str, severity: Severity) {
        self.events
            .push(HostEvent::Note(message.to_string(), severity));
    }
}

impl RuntimeHost for CliHost {
    fn on_outcome(&mut self, outcome: &CommandOutcome) {
        self.events.push(HostEvent::Outcome(outcome.clone()));
    }

    fn on_suggestions(&mut self, menu: Option<&SuggestionMenu>) {
        self.events.push(HostEvent::Menu(menu.cloned()));
    }

    fn on_saved(&mut self, record: &SaveRecord) {
        self.events.push(HostEvent::Saved(*record));
    }
}

// ============================================================================
// Loop
// ============================================================================

/// Where the next export or print outcome should be written.
#[derive(Debug, Default)]
struct PendingOutput {
    export: Option<PathBuf>,
    print: Option<PathBuf>,
}

struct LineEditor<'a, W: Write> {
    surface: MemorySurface,
    handle: RuntimeHandle,
    pending: PendingOutput,
    out: &'a mut W,
}

/// Run an editing session over `input`, writing results to `out`.
///
/// The session ends at `quit` or end of input. Returns the session's
/// counters after the final autosave flush.
pub fn run_edit<R, W>(
    storage: impl StorageBackend + 'static,
    config: EditorConfig,
    input: R,
    out: &mut W,
) -> Result<SessionStats>
where
    R: BufRead,
    W: Write,
{
    let surface = MemorySurface::default();
    let session = EditorSession::init(surface.clone(), storage, config, Instant::now());
    let mut runtime = EditorRuntime::new(session, CliHost::default());
    runtime.start();

    let mut editor = LineEditor {
        surface,
        handle: runtime.handle(),
        pending: PendingOutput::default(),
        out,
    };
    tracing::info!(target: "quill.cli", "edit session started");

    for line in input.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let directive = match line.parse::<Directive>() {
            Ok(directive) => directive,
            Err(err) => {
                writeln!(editor.out, "error: {err}")?;
                continue;
            }
        };
        if directive == Directive::Quit {
            break;
        }
        let query = matches!(directive, Directive::Show | Directive::Stats).then(|| directive.clone());
        editor.apply(directive)?;
        runtime.pump();
        let events = runtime.host_mut().drain();
        editor.render(events)?;

        match query {
            Some(Directive::Show) => writeln!(editor.out, "{}", editor.surface.content())?,
            Some(Directive::Stats) => {
                let session = runtime.session();
                writeln!(editor.out, "{}", session.metrics())?;
                let stats = session.stats();
                writeln!(
                    editor.out,
                    "undo: {} | redo: {} | commands: {} | autosaves: {}",
                    session.history().undo_depth(),
                    session.history().redo_depth(),
                    stats.commands,
                    stats.autosaves
                )?;
            }
            _ => {}
        }
    }

    let (stats, mut host) = runtime.shutdown();
    editor.render(host.drain())?;
    tracing::info!(
        target: "quill.cli",
        commands = stats.commands,
        autosaves = stats.autosaves,
        "edit session finished"
    );
    Ok(stats)
}

impl<W: Write> LineEditor<'_, W> {
    fn apply(&mut self, directive: Directive) -> Result<()> {
        match directive {
            Directive::Type(text) => self.surface.type_text(&text),
            Directive::Key(key) => self.surface.press(key),
            Directive::Click => self.surface.click(),
            Directive::Select(text) => {
                if !self.surface.select(&text) {
                    writeln!(self.out, "not found: {text}")?;
                }
            }
            Directive::Command(command) => {
                self.handle.command(command);
            }
            Directive::Save(path) => {
                self.pending.export = path;
                self.handle.command(EditorCommand::Save);
            }
            Directive::Print(path) => {
                self.pending.print = Some(path);
                self.handle.command(EditorCommand::Print);
            }
            Directive::Open(path) => match read_document(&path) {
                Ok(command) => {
                    self.handle.command(command);
                }
                Err(err) => writeln!(self.out, "error: {}: {err}", path.display())?,
            },
            Directive::Suggest(word) => {
                if !word.trim().is_empty() {
                    self.surface.select(&word);
                }
                self.handle.send(RuntimeMsg::Suggest(word));
            }
            Directive::Help => writeln!(self.out, "{HELP}")?,
            // Printed after the runtime has caught up.
            Directive::Show | Directive::Stats | Directive::Quit => {}
        }
        Ok(())
    }

    fn render(&mut self, events: Vec<HostEvent>) -> Result<()> {
        for event in events {
            match event {
                HostEvent::Note(message, severity) => {
                    writeln!(self.out, "[{severity}] {message}")?;
                }
                HostEvent::Outcome(outcome) => self.render_outcome(outcome)?,
                HostEvent::Menu(Some(menu)) => write_menu(&mut *self.out, &menu)?,
                HostEvent::Menu(None) => writeln!(self.out, "suggestions closed")?,
                HostEvent::Saved(record) => writeln!(self.out, "{record}")?,
            }
        }
        Ok(())
    }

    fn render_outcome(&mut self, outcome: CommandOutcome) -> Result<()> {
        match outcome {
            CommandOutcome::Nothing => writeln!(self.out, "nothing to do")?,
            CommandOutcome::Restored(_) => writeln!(self.out, "restored")?,
            CommandOutcome::Applied => writeln!(self.out, "applied")?,
            CommandOutcome::Rejected(reason) => writeln!(self.out, "rejected: {reason}")?,
            CommandOutcome::SpellCheck { .. } => {}
            CommandOutcome::Export { file_name, content } => {
                if let Some(path) = self.pending.export.take() {
                    self.write_file(&path, &content)?;
                } else {
                    tracing::debug!(target: "quill.cli", %file_name, "export not requested");
                }
            }
            CommandOutcome::Print(document) => match self.pending.print.take() {
                Some(path) => self.write_file(&path, &document)?,
                None => writeln!(self.out, "{document}")?,
            },
        }
        Ok(())
    }

    fn write_file(&mut self, path: &Path, content: &str) -> Result<()> {
        match fs::write(path, content) {
            Ok(()) => writeln!(self.out, "wrote {}", path.display())?,
            Err(err) => {
                tracing::warn!(target: "quill.cli", path = %path.display(), error = %err, "write failed");
                writeln!(self.out, "error: {}: {err}", path.display())?;
            }
        }
        Ok(())
    }
}

fn read_document(path: &Path) -> std::io::Result<EditorCommand> {
    let content = fs::read_to_string(path)?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(EditorCommand::OpenDocument {
        name,
        media_type: String::new(),
        content,
    })
}

fn write_menu<W: Write>(out: &mut W, menu: &SuggestionMenu) -> std::io::Result<()> {
    writeln!(out, "suggestions for {}:", menu.word())?;
    for (index, item) in menu.items().iter().enumerate() {
        let marker = if index == menu.selected_index() { '>' } else { ' ' };
        match item {
            SuggestionItem::Replace(text) => writeln!(out, "{marker} {text}")?,
            SuggestionItem::Ignore => writeln!(out, "{marker} (ignore)")?,
        }
    }
    Ok(())
}
