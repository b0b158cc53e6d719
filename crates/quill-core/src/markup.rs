#![forbid(unsafe_code)]

//! Markup fragments the editor inserts into the surface.
//!
//! These builders produce self-contained HTML fragments for the operations
//! that have no native formatting primitive: tables, hyperlinks, and the
//! standalone print document. All user-supplied text goes through
//! [`v_htmlescape`] before it is interpolated.

use std::fmt::Write as _;

use v_htmlescape::escape;

use crate::format::{Alignment, FormatCommand};

/// Placeholder text written into table header cells (`Header 1`, ...).
pub const TABLE_HEADER_PREFIX: &str = "Header";
/// Placeholder text written into table body cells.
pub const TABLE_CELL_TEXT: &str = "Cell";

/// Shape of a table to insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableSpec {
    /// Total rows, including the header row when `header` is set.
    pub rows: usize,
    pub cols: usize,
    pub header: bool,
}

impl TableSpec {
    #[must_use]
    pub const fn new(rows: usize, cols: usize, header: bool) -> Self {
        Self { rows, cols, header }
    }

    /// A table needs at least one row and one column.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.rows > 0 && self.cols > 0
    }

    /// Number of `<tbody>` rows.
    #[must_use]
    pub const fn body_rows(&self) -> usize {
        if self.header {
            self.rows - 1
        } else {
            self.rows
        }
    }
}

/// Build a `<table>` fragment. Returns `None` for an empty shape.
///
/// With a header, the first row becomes `<thead>` and the remaining
/// `rows - 1` rows go into `<tbody>`.
#[must_use]
pub fn table(spec: TableSpec) -> Option<String> {
    if !spec.is_valid() {
        return None;
    }
    let mut out = String::from("<table>");
    if spec.header {
        out.push_str("<thead><tr>");
        for col in 1..=spec.cols {
            let _ = write!(out, "<th>{TABLE_HEADER_PREFIX} {col}</th>");
        }
        out.push_str("</tr></thead>");
    }
    out.push_str("<tbody>");
    for _ in 0..spec.body_rows() {
        out.push_str("<tr>");
        for _ in 0..spec.cols {
            let _ = write!(out, "<td>{TABLE_CELL_TEXT}</td>");
        }
        out.push_str("</tr>");
    }
    out.push_str("</tbody></table>");
    Some(out)
}

/// Build an `<a>` fragment that opens in a new tab.
///
/// Both inputs are trimmed. Returns `None` when the URL is blank. A blank
/// `text` falls back to the URL.
#[must_use]
pub fn link(url: &str, text: &str) -> Option<String> {
    let url = url.trim();
    if url.is_empty() {
        return None;
    }
    let text = match text.trim() {
        "" => url,
        t => t,
    };
    Some(format!(
        r#"<a href="{}" target="_blank">{}</a>"#,
        escape(url),
        escape(text)
    ))
}

/// HTML-escape plain text for insertion into markup.
#[must_use]
pub fn escape_text(text: &str) -> String {
    escape(text).to_string()
}

/// Render a formatting command applied to `inner` as markup.
///
/// This is the fallback used by surfaces without a native formatting
/// engine. `inner` is already markup. Returns `None` for commands that do
/// not wrap a selection (`Outdent`, `InsertImage`) or when `inner` is empty.
#[must_use]
pub fn format_fragment(command: &FormatCommand, inner: &str) -> Option<String> {
    if inner.is_empty() {
        return None;
    }
    let html = match command {
        FormatCommand::Bold => format!("<b>{inner}</b>"),
        FormatCommand::Italic => format!("<i>{inner}</i>"),
        FormatCommand::Underline => format!("<u>{inner}</u>"),
        FormatCommand::Strikethrough => format!("<strike>{inner}</strike>"),
        FormatCommand::Align(alignment) => {
            let align = match alignment {
                Alignment::Left => "left",
                Alignment::Center => "center",
                Alignment::Right => "right",
                Alignment::Justify => "justify",
            };
            format!(r#"<div style="text-align: {align};">{inner}</div>"#)
        }
        FormatCommand::OrderedList => format!("<ol><li>{inner}</li></ol>"),
        FormatCommand::UnorderedList => format!("<ul><li>{inner}</li></ul>"),
        FormatCommand::Indent => format!("<blockquote>{inner}</blockquote>"),
        FormatCommand::FontFamily(face) => {
            format!(r#"<font face="{}">{inner}</font>"#, escape(face))
        }
        FormatCommand::FontSize(size) => format!(r#"<font size="{size}">{inner}</font>"#),
        FormatCommand::ForeColor(color) => {
            format!(r#"<font color="{}">{inner}</font>"#, escape(color))
        }
        FormatCommand::HighlightColor(color) => format!(
            r#"<span style="background-color: {};">{inner}</span>"#,
            escape(color)
        ),
        FormatCommand::Outdent | FormatCommand::InsertImage(_) => return None,
    };
    Some(html)
}

/// Build an `<img>` element for an image URL. Returns `None` when blank.
#[must_use]
pub fn image(url: &str) -> Option<String> {
    let url = url.trim();
    if url.is_empty() {
        return None;
    }
    Some(format!(r#"<img src="{}">"#, escape(url)))
}

const PRINT_STYLESHEET: &str = "\
body {
  font-family: 'Segoe UI', Tahoma, Geneva, Verdana, sans-serif;
  line-height: 1.6;
  color: #333;
  padding: 20px;
  max-width: 8.5in;
  margin: 0 auto;
}
table {
  border-collapse: collapse;
  width: 100%;
  margin: 10px 0;
}
table, th, td {
  border: 1px solid #ddd;
}
th, td {
  padding: 8px;
  text-align: left;
}
th {
  background-color: #f2f2f2;
}
@media print {
  body {
    padding: 0;
  }
  @page {
    margin: 1cm;
  }
}
";

/// Wrap document content in a standalone, print-ready HTML page.
///
/// The content is the surface's own markup and is embedded verbatim.
#[must_use]
pub fn print_document(content: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<title>Print Document</title>\n<style>\n{PRINT_STYLESHEET}</style>\n</head>\n<body>\n{content}\n</body>\n</html>\n"
    )
}

/// Extract the visible text of a markup string.
///
/// Tags are dropped, block-level closing tags and `<br>` become line
/// breaks, and the common named entities are decoded. This is not an HTML
/// parser; it is good enough for counting words on well-formed editor
/// output.
#[must_use]
pub fn plain_text(markup: &str) -> String {
    let mut out = String::with_capacity(markup.len());
    let mut rest = markup;
    while let Some(open) = rest.find('<') {
        push_decoded(&mut out, &rest[..open]);
        let after = &rest[open..];
        let Some(close) = after.find('>') else {
            // Unterminated tag: treat the remainder as text.
            push_decoded(&mut out, after);
            return out;
        };
        let tag = after[1..close].trim().to_ascii_lowercase();
        if breaks_line(&tag) && !out.ends_with('\n') && !out.is_empty() {
            out.push('\n');
        }
        rest = &after[close + 1..];
    }
    push_decoded(&mut out, rest);
    out
}

fn breaks_line(tag: &str) -> bool {
    let name = tag
        .trim_start_matches('/')
        .split(|c: char| c.is_whitespace() || c == '/')
        .next()
        .unwrap_or("");
    let is_close = tag.starts_with('/');
    match name {
        "br" => true,
        "p" | "div" | "li" | "tr" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "blockquote" => {
            is_close
        }
        _ => false,
    }
}

fn push_decoded(out: &mut String, text: &str) {
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let after = &rest[amp..];
        let decoded = after.find(';').and_then(|semi| {
            let ch = match &after[1..semi] {
                "amp" => '&',
                "lt" => '<',
                "gt" => '>',
                "quot" => '"',
                "apos" | "#39" | "#x27" => '\'',
                "nbsp" => ' ',
                "#x2f" | "#47" => '/',
                _ => return None,
            };
            Some((ch, semi + 1))
        });
        match decoded {
            Some((ch, len)) => {
                out.push(ch);
                rest = &after[len..];
            }
            None => {
                out.push('&');
                rest = &after[1..];
            }
        }
    }
    out.push_str(rest);
}
