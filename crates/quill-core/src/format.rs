#![forbid(unsafe_code)]

//! Formatting commands delegated to the surface's native editing engine.
//!
//! Quill never edits markup itself for formatting. A [`FormatCommand`] names
//! the operation and carries its argument; the surface adapter maps it onto
//! whatever primitive the host offers. [`FormatCommand::native_name`] gives
//! the conventional rich-text command identifier for hosts that take
//! string-named commands.

use std::fmt;
use std::str::FromStr;

/// Paragraph alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Alignment {
    Left,
    Center,
    Right,
    Justify,
}

/// One formatting operation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FormatCommand {
    Bold,
    Italic,
    Underline,
    Strikethrough,
    Align(Alignment),
    OrderedList,
    UnorderedList,
    Indent,
    Outdent,
    /// Font family name, e.g. `Georgia`.
    FontFamily(String),
    /// Legacy font size step, 1 (smallest) to 7 (largest).
    FontSize(u8),
    /// Foreground color as a CSS color string.
    ForeColor(String),
    /// Highlight (background) color as a CSS color string.
    HighlightColor(String),
    /// Insert an image by URL at the caret.
    InsertImage(String),
}

impl FormatCommand {
    /// Smallest accepted legacy font size step.
    pub const MIN_FONT_SIZE: u8 = 1;
    /// Largest accepted legacy font size step.
    pub const MAX_FONT_SIZE: u8 = 7;

    /// Conventional rich-text command identifier.
    #[must_use]
    pub const fn native_name(&self) -> &'static str {
        match self {
            Self::Bold => "bold",
            Self::Italic => "italic",
            Self::Underline => "underline",
            Self::Strikethrough => "strikeThrough",
            Self::Align(Alignment::Left) => "justifyLeft",
            Self::Align(Alignment::Center) => "justifyCenter",
            Self::Align(Alignment::Right) => "justifyRight",
            Self::Align(Alignment::Justify) => "justifyFull",
            Self::OrderedList => "insertOrderedList",
            Self::UnorderedList => "insertUnorderedList",
            Self::Indent => "indent",
            Self::Outdent => "outdent",
            Self::FontFamily(_) => "fontName",
            Self::FontSize(_) => "fontSize",
            Self::ForeColor(_) => "foreColor",
            Self::HighlightColor(_) => "hiliteColor",
            Self::InsertImage(_) => "insertImage",
        }
    }

    /// Argument passed alongside [`native_name`](Self::native_name), if any.
    #[must_use]
    pub fn value(&self) -> Option<String> {
        match self {
            Self::FontFamily(v) | Self::ForeColor(v) | Self::HighlightColor(v) => Some(v.clone()),
            Self::InsertImage(v) => Some(v.clone()),
            Self::FontSize(size) => Some(size.to_string()),
            _ => None,
        }
    }

    /// Whether this is an on/off character style (a toolbar toggle).
    #[must_use]
    pub const fn is_toggle(&self) -> bool {
        matches!(
            self,
            Self::Bold | Self::Italic | Self::Underline | Self::Strikethrough
        )
    }
}

impl fmt::Display for FormatCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value() {
            Some(value) => write!(f, "{}({value})", self.native_name()),
            None => f.write_str(self.native_name()),
        }
    }
}

/// Error returned when a format command cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseFormatError(pub String);

impl fmt::Display for ParseFormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid format command: {}", self.0)
    }
}

impl std::error::Error for ParseFormatError {}

impl FromStr for FormatCommand {
    type Err = ParseFormatError;

    /// Parse `kind` or `kind value`, e.g. `bold`, `size 5`, `color #ff0000`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (kind, arg) = match s.split_once(char::is_whitespace) {
            Some((kind, arg)) => (kind, Some(arg.trim())),
            None => (s, None),
        };
        let err = || ParseFormatError(s.to_string());
        let need_arg = || arg.filter(|a| !a.is_empty()).map(str::to_string).ok_or_else(err);

        let cmd = match kind.to_ascii_lowercase().as_str() {
            "bold" => Self::Bold,
            "italic" => Self::Italic,
            "underline" => Self::Underline,
            "strike" | "strikethrough" => Self::Strikethrough,
            "left" => Self::Align(Alignment::Left),
            "center" => Self::Align(Alignment::Center),
            "right" => Self::Align(Alignment::Right),
            "justify" => Self::Align(Alignment::Justify),
            "ol" | "ordered" => Self::OrderedList,
            "ul" | "unordered" => Self::UnorderedList,
            "indent" => Self::Indent,
            "outdent" => Self::Outdent,
            "font" => Self::FontFamily(need_arg()?),
            "size" => {
                let size: u8 = need_arg()?.parse().map_err(|_| err())?;
                if !(Self::MIN_FONT_SIZE..=Self::MAX_FONT_SIZE).contains(&size) {
                    return Err(err());
                }
                Self::FontSize(size)
            }
            "color" => Self::ForeColor(need_arg()?),
            "highlight" => Self::HighlightColor(need_arg()?),
            "image" => Self::InsertImage(need_arg()?),
            _ => return Err(err()),
        };
        Ok(cmd)
    }
}
