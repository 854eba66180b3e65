// Format kinds, markers and the active-format snapshot

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A toggleable format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatKind {
    Bold,
    Italic,
    Underline,
    Strikethrough,
    AlignCenter,
    AlignRight,
    AlignJustify,
}

/// Open/close delimiters of an inline format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InlineMarker {
    pub open: &'static str,
    pub close: &'static str,
}

impl InlineMarker {
    /// `**`, `*` and `~~` use the same string on both sides
    pub fn is_symmetric(&self) -> bool {
        self.open == self.close
    }
}

impl FormatKind {
    pub const ALL: [FormatKind; 7] = [
        FormatKind::Bold,
        FormatKind::Italic,
        FormatKind::Underline,
        FormatKind::Strikethrough,
        FormatKind::AlignCenter,
        FormatKind::AlignRight,
        FormatKind::AlignJustify,
    ];

    /// Inline delimiters, `None` for block alignment formats
    pub fn markers(self) -> Option<InlineMarker> {
        let (open, close) = match self {
            FormatKind::Bold => ("**", "**"),
            FormatKind::Italic => ("*", "*"),
            FormatKind::Underline => ("<u>", "</u>"),
            FormatKind::Strikethrough => ("~~", "~~"),
            _ => return None,
        };
        Some(InlineMarker { open, close })
    }

    pub fn alignment(self) -> Option<Alignment> {
        match self {
            FormatKind::AlignCenter => Some(Alignment::Center),
            FormatKind::AlignRight => Some(Alignment::Right),
            FormatKind::AlignJustify => Some(Alignment::Justify),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            FormatKind::Bold => "bold",
            FormatKind::Italic => "italic",
            FormatKind::Underline => "underline",
            FormatKind::Strikethrough => "strikethrough",
            FormatKind::AlignCenter => "align-center",
            FormatKind::AlignRight => "align-right",
            FormatKind::AlignJustify => "align-justify",
        }
    }
}

impl fmt::Display for FormatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Block alignment. `Left` is the absence of a wrapper, never a marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

impl Alignment {
    /// Value of the `align` attribute, `None` for left
    pub fn attr_value(self) -> Option<&'static str> {
        match self {
            Alignment::Left => None,
            Alignment::Center => Some("center"),
            Alignment::Right => Some("right"),
            Alignment::Justify => Some("justify"),
        }
    }

    pub fn from_attr_value(value: &str) -> Option<Self> {
        match value {
            "center" => Some(Alignment::Center),
            "right" => Some(Alignment::Right),
            "justify" => Some(Alignment::Justify),
            _ => None,
        }
    }

    /// The wrapper's opening tag, e.g. `<div align="center">`
    pub fn open_tag(self) -> Option<String> {
        self.attr_value()
            .map(|value| format!("<div align=\"{}\">", value))
    }

    pub fn format_kind(self) -> Option<FormatKind> {
        match self {
            Alignment::Left => None,
            Alignment::Center => Some(FormatKind::AlignCenter),
            Alignment::Right => Some(FormatKind::AlignRight),
            Alignment::Justify => Some(FormatKind::AlignJustify),
        }
    }
}

pub const BLOCK_CLOSE_TAG: &str = "</div>";

/// Which formats are active at a position.
///
/// Alignment is a single value, so two alignments can never be reported at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ActiveFormatState {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strikethrough: bool,
    pub alignment: Alignment,
}

impl ActiveFormatState {
    pub fn is_active(&self, kind: FormatKind) -> bool {
        match kind {
            FormatKind::Bold => self.bold,
            FormatKind::Italic => self.italic,
            FormatKind::Underline => self.underline,
            FormatKind::Strikethrough => self.strikethrough,
            _ => self.alignment.format_kind() == Some(kind),
        }
    }

    pub fn set_active(&mut self, kind: FormatKind, active: bool) {
        match kind {
            FormatKind::Bold => self.bold = active,
            FormatKind::Italic => self.italic = active,
            FormatKind::Underline => self.underline = active,
            FormatKind::Strikethrough => self.strikethrough = active,
            _ => {
                if let Some(alignment) = kind.alignment() {
                    if active {
                        self.alignment = alignment;
                    } else if self.alignment == alignment {
                        self.alignment = Alignment::Left;
                    }
                }
            }
        }
    }

    /// Left is active exactly when no other alignment is
    pub fn is_align_left(&self) -> bool {
        self.alignment == Alignment::Left
    }

    pub fn active_kinds(&self) -> Vec<FormatKind> {
        FormatKind::ALL
            .into_iter()
            .filter(|kind| self.is_active(*kind))
            .collect()
    }
}

impl fmt::Display for ActiveFormatState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.active_kinds().into_iter().map(FormatKind::name).collect();
        if self.is_align_left() {
            names.push("align-left");
        }
        write!(f, "{}", names.join(" "))
    }
}

/// A toolbar command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatCommand {
    Toggle(FormatKind),
    AlignLeft,
    Uppercase,
    Lowercase,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown format command: {0}")]
pub struct ParseCommandError(pub String);

impl FromStr for FormatCommand {
    type Err = ParseCommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        match name.as_str() {
            "align-left" => return Ok(FormatCommand::AlignLeft),
            "uppercase" => return Ok(FormatCommand::Uppercase),
            "lowercase" => return Ok(FormatCommand::Lowercase),
            _ => {}
        }
        FormatKind::ALL
            .into_iter()
            .find(|kind| kind.name() == name)
            .map(FormatCommand::Toggle)
            .ok_or_else(|| ParseCommandError(s.to_string()))
    }
}

impl fmt::Display for FormatCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatCommand::Toggle(kind) => f.write_str(kind.name()),
            FormatCommand::AlignLeft => f.write_str("align-left"),
            FormatCommand::Uppercase => f.write_str("uppercase"),
            FormatCommand::Lowercase => f.write_str("lowercase"),
        }
    }
}
