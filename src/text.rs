// Shared text types and host surface contracts
// All offsets are UTF-16 code units, the unit the host editing surface counts in

use std::cmp::{max, min};

/// A selection as the host reports it: `anchor` is where it started, `head`
/// is where the caret is. A collapsed selection is a plain caret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Selection {
    pub anchor: usize,
    pub head: usize,
}

impl Selection {
    pub fn new(anchor: usize, head: usize) -> Self {
        Selection { anchor, head }
    }

    pub fn caret(offset: usize) -> Self {
        Selection {
            anchor: offset,
            head: offset,
        }
    }

    pub fn from(&self) -> usize {
        min(self.anchor, self.head)
    }

    pub fn to(&self) -> usize {
        max(self.anchor, self.head)
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.head
    }

    pub fn len(&self) -> usize {
        self.to() - self.from()
    }

    pub fn is_empty(&self) -> bool {
        self.is_collapsed()
    }

    /// Clamp both ends to a buffer of `length` units
    pub fn clamp(self, length: usize) -> Self {
        Selection {
            anchor: min(self.anchor, length),
            head: min(self.head, length),
        }
    }

    /// Map this selection through an edit applied to the buffer
    pub fn map_through(self, edit: &TextEdit) -> Self {
        let map = |pos: usize| {
            if pos <= edit.from {
                pos
            } else if pos >= edit.to {
                pos.saturating_add_signed(edit.delta())
            } else {
                edit.from + edit.inserted_len()
            }
        };
        Selection {
            anchor: map(self.anchor),
            head: map(self.head),
        }
    }
}

/// A single replacement of `[from, to)` with `insert`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEdit {
    pub from: usize,
    pub to: usize,
    pub insert: String,
}

impl TextEdit {
    pub fn replace(from: usize, to: usize, insert: impl Into<String>) -> Self {
        TextEdit {
            from: min(from, to),
            to: max(from, to),
            insert: insert.into(),
        }
    }

    pub fn insert(at: usize, text: impl Into<String>) -> Self {
        Self::replace(at, at, text)
    }

    /// Length of the inserted text in UTF-16 units
    pub fn inserted_len(&self) -> usize {
        utf16_len(&self.insert)
    }

    /// Change in buffer length caused by this edit
    pub fn delta(&self) -> isize {
        self.inserted_len() as isize - (self.to - self.from) as isize
    }

    /// Apply the edit to a plain string and return the result
    pub fn apply_to(&self, text: &str) -> String {
        let from = utf16_to_byte(text, self.from);
        let to = max(from, utf16_to_byte(text, self.to));
        let mut out = String::with_capacity(text.len() + self.insert.len());
        out.push_str(&text[..from]);
        out.push_str(&self.insert);
        out.push_str(&text[to..]);
        out
    }
}

/// One line of the buffer, without its trailing newline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub from: usize,
    pub to: usize,
    pub text: String,
}

/// A point on a rendering surface, in surface pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Point { x, y }
    }
}

/// Read-only access to a snapshot of the text buffer.
///
/// Scanners and the toggle engine only ever need this much.
pub trait TextSource {
    fn slice_text(&self, from: usize, to: usize) -> String;
    fn length(&self) -> usize;
    fn line_at(&self, offset: usize) -> Line;

    /// Move an offset that falls between the halves of a surrogate pair
    /// back to the start of the pair
    fn align_offset(&self, offset: usize) -> usize {
        let offset = min(offset, self.length());
        if offset == 0 {
            return 0;
        }
        let probe = self.slice_text(offset - 1, offset + 1);
        let mut chars = probe.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if c.len_utf16() == 2 => offset - 1,
            _ => offset,
        }
    }
}

/// The host text surface: owns the authoritative buffer and selection.
pub trait TextWindow: TextSource {
    fn coords_to_offset(&self, point: Point) -> Option<usize>;
    fn offset_to_coords(&self, offset: usize) -> Option<Point>;
    fn apply_edit(&mut self, edit: &TextEdit);
    fn current_selection(&self) -> Selection;
    fn set_selection(&mut self, selection: Selection);
    fn focus(&mut self);
}

impl TextSource for str {
    fn slice_text(&self, from: usize, to: usize) -> String {
        let from = utf16_to_byte(self, from);
        let to = utf16_to_byte(self, to);
        if from >= to {
            String::new()
        } else {
            self[from..to].to_string()
        }
    }

    fn length(&self) -> usize {
        utf16_len(self)
    }

    fn align_offset(&self, offset: usize) -> usize {
        let mut units = 0;
        for ch in self.chars() {
            let next = units + ch.len_utf16();
            if next > offset {
                return units;
            }
            units = next;
        }
        units
    }

    fn line_at(&self, offset: usize) -> Line {
        let pos = utf16_to_byte(self, offset);
        let start = self[..pos].rfind('\n').map(|i| i + 1).unwrap_or(0);
        let end = self[pos..].find('\n').map(|i| pos + i).unwrap_or(self.len());
        Line {
            from: byte_to_utf16(self, start),
            to: byte_to_utf16(self, end),
            text: self[start..end].to_string(),
        }
    }
}

impl TextSource for String {
    fn slice_text(&self, from: usize, to: usize) -> String {
        self.as_str().slice_text(from, to)
    }

    fn length(&self) -> usize {
        self.as_str().length()
    }

    fn line_at(&self, offset: usize) -> Line {
        self.as_str().line_at(offset)
    }

    fn align_offset(&self, offset: usize) -> usize {
        self.as_str().align_offset(offset)
    }
}

/// Number of UTF-16 code units in `s`
pub fn utf16_len(s: &str) -> usize {
    s.chars().map(char::len_utf16).sum()
}

/// Byte index in `s` of a UTF-16 offset. Offsets inside a surrogate pair
/// round up to the next char boundary; offsets past the end clamp to `s.len()`.
pub fn utf16_to_byte(s: &str, offset: usize) -> usize {
    let mut units = 0;
    for (idx, ch) in s.char_indices() {
        if units >= offset {
            return idx;
        }
        units += ch.len_utf16();
    }
    s.len()
}

/// UTF-16 offset of a byte index in `s`, rounding down to a char boundary
pub fn byte_to_utf16(s: &str, byte: usize) -> usize {
    let mut byte = min(byte, s.len());
    while !s.is_char_boundary(byte) {
        byte -= 1;
    }
    utf16_len(&s[..byte])
}
