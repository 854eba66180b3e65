// Text Buffer implementation using gap buffer for efficient text editing
// Stores UTF-16 code units so positions line up with the host editing surface

use std::cmp::{max, min};

use crate::text::{Line, TextSource};

/// Callback type for buffer modifications: `(pos, inserted, deleted)`
pub type ModifyCallback = Box<dyn FnMut(usize, usize, usize)>;

const NEWLINE: u16 = b'\n' as u16;
const INITIAL_GAP_SIZE: usize = 1024;

fn is_high_surrogate(unit: u16) -> bool {
    (0xD800..0xDC00).contains(&unit)
}

fn is_low_surrogate(unit: u16) -> bool {
    (0xDC00..0xE000).contains(&unit)
}

/// Gap buffer based text buffer for efficient editing
/// The gap buffer maintains a gap at the last edit position for O(1) insertions
pub struct TextBuffer {
    /// The actual buffer with a gap
    buffer: Vec<u16>,
    /// Start of the gap
    gap_start: usize,
    /// End of the gap (exclusive)
    gap_end: usize,
    /// Modification callbacks
    modify_callbacks: Vec<ModifyCallback>,
}

impl TextBuffer {
    /// Create a new empty text buffer
    pub fn new() -> Self {
        TextBuffer {
            buffer: vec![0; INITIAL_GAP_SIZE],
            gap_start: 0,
            gap_end: INITIAL_GAP_SIZE,
            modify_callbacks: Vec::new(),
        }
    }

    /// Create a buffer holding `text`
    pub fn from_text(text: &str) -> Self {
        let mut buf = Self::new();
        buf.set_text(text);
        buf
    }

    /// Get the length of text in the buffer (excluding gap), in UTF-16 units
    pub fn length(&self) -> usize {
        self.buffer.len() - self.gap_size()
    }

    fn gap_size(&self) -> usize {
        self.gap_end - self.gap_start
    }

    /// Move the gap to a specific position
    fn move_gap(&mut self, pos: usize) {
        let pos = min(pos, self.length());

        if pos == self.gap_start {
            return;
        }

        if pos < self.gap_start {
            let distance = self.gap_start - pos;
            self.buffer
                .copy_within(pos..self.gap_start, self.gap_end - distance);
            self.gap_start = pos;
            self.gap_end -= distance;
        } else {
            let distance = pos - self.gap_start;
            self.buffer
                .copy_within(self.gap_end..self.gap_end + distance, self.gap_start);
            self.gap_start = pos;
            self.gap_end += distance;
        }
    }

    /// Expand the gap to ensure it can fit at least `size` units
    fn expand_gap(&mut self, size: usize) {
        if self.gap_size() >= size {
            return;
        }

        let new_gap_size = max(size, self.buffer.len() / 2);

        let mut new_buffer = Vec::with_capacity(self.length() + new_gap_size);
        new_buffer.extend_from_slice(&self.buffer[..self.gap_start]);
        new_buffer.resize(new_buffer.len() + new_gap_size, 0);
        new_buffer.extend_from_slice(&self.buffer[self.gap_end..]);

        self.buffer = new_buffer;
        self.gap_end = self.gap_start + new_gap_size;
    }

    fn unit_at_physical(&self, pos: usize) -> u16 {
        if pos < self.gap_start {
            self.buffer[pos]
        } else {
            self.buffer[pos + self.gap_size()]
        }
    }

    /// Get the code unit at position, or 0 past the end
    pub fn unit_at(&self, pos: usize) -> u16 {
        if pos < self.length() {
            self.unit_at_physical(pos)
        } else {
            0
        }
    }

    /// Get text from buffer as a String
    pub fn text(&self) -> String {
        let mut units = Vec::with_capacity(self.length());
        units.extend_from_slice(&self.buffer[..self.gap_start]);
        units.extend_from_slice(&self.buffer[self.gap_end..]);
        String::from_utf16_lossy(&units)
    }

    /// Get text in a range. Half surrogate pairs at the edges decode as U+FFFD,
    /// which keeps the result the same length in UTF-16 units.
    pub fn text_range(&self, start: usize, end: usize) -> String {
        let start = min(start, self.length());
        let end = min(end, self.length());

        if start >= end {
            return String::new();
        }

        let units: Vec<u16> = (start..end).map(|i| self.unit_at_physical(i)).collect();
        String::from_utf16_lossy(&units)
    }

    /// Set the entire buffer text
    pub fn set_text(&mut self, text: &str) {
        let old_length = self.length();
        let units: Vec<u16> = text.encode_utf16().collect();
        let new_len = units.len();
        let gap_size = max(INITIAL_GAP_SIZE, new_len / 2);

        self.buffer = Vec::with_capacity(new_len + gap_size);
        self.buffer.extend_from_slice(&units);
        self.buffer.resize(new_len + gap_size, 0);
        self.gap_start = new_len;
        self.gap_end = self.buffer.len();

        for cb in &mut self.modify_callbacks {
            cb(0, new_len, old_length);
        }
    }

    /// Insert text at position
    pub fn insert(&mut self, pos: usize, text: &str) {
        self.replace(pos, pos, text);
    }

    /// Remove text range
    pub fn remove(&mut self, start: usize, end: usize) {
        self.replace(start, end, "");
    }

    /// Replace text in range as one modification; callbacks see a single change
    pub fn replace(&mut self, start: usize, end: usize, text: &str) {
        let start = min(start, self.length());
        let end = min(max(start, end), self.length());
        let units: Vec<u16> = text.encode_utf16().collect();

        if start == end && units.is_empty() {
            return;
        }

        let deleted = end - start;
        self.move_gap(start);
        self.gap_end += deleted;
        self.expand_gap(units.len());

        self.buffer[self.gap_start..self.gap_start + units.len()].copy_from_slice(&units);
        self.gap_start += units.len();

        for cb in &mut self.modify_callbacks {
            cb(start, units.len(), deleted);
        }
    }

    /// True when `pos` does not split a surrogate pair
    pub fn is_char_boundary(&self, pos: usize) -> bool {
        if pos == 0 || pos >= self.length() {
            return true;
        }
        !(is_low_surrogate(self.unit_at(pos)) && is_high_surrogate(self.unit_at(pos - 1)))
    }

    /// Add modify callback
    pub fn add_modify_callback<F>(&mut self, callback: F)
    where
        F: FnMut(usize, usize, usize) + 'static,
    {
        self.modify_callbacks.push(Box::new(callback));
    }

    /// Remove all modify callbacks
    pub fn clear_modify_callbacks(&mut self) {
        self.modify_callbacks.clear();
    }

    /// Get the number of modify callbacks
    pub fn modify_callback_count(&self) -> usize {
        self.modify_callbacks.len()
    }

    // ========================================================================
    // Line Operations
    // ========================================================================

    /// Find the start of the line containing the given position
    pub fn line_start(&self, pos: usize) -> usize {
        let mut current = min(pos, self.length());
        while current > 0 {
            if self.unit_at_physical(current - 1) == NEWLINE {
                return current;
            }
            current -= 1;
        }
        0
    }

    /// Find the end of the line containing the given position
    /// Returns the offset of the newline character, or end of buffer
    pub fn line_end(&self, pos: usize) -> usize {
        let mut current = min(pos, self.length());
        while current < self.length() {
            if self.unit_at_physical(current) == NEWLINE {
                return current;
            }
            current += 1;
        }
        self.length()
    }

    /// Get the entire line containing the given position
    pub fn line_text(&self, pos: usize) -> String {
        self.text_range(self.line_start(pos), self.line_end(pos))
    }

    /// Count the number of newlines between start and end positions
    /// The unit at `end` is not counted
    pub fn count_lines(&self, start: usize, end: usize) -> usize {
        let start = min(start, self.length());
        let end = min(end, self.length());
        (start..end)
            .filter(|&pos| self.unit_at_physical(pos) == NEWLINE)
            .count()
    }

    /// Skip forward n lines from the starting position
    /// Returns the position of the first character of the line n lines ahead
    pub fn skip_lines(&self, start: usize, n_lines: usize) -> usize {
        if n_lines == 0 {
            return start;
        }

        let mut pos = start;
        let mut line_count = 0;

        while pos < self.length() {
            if self.unit_at_physical(pos) == NEWLINE {
                line_count += 1;
                if line_count == n_lines {
                    return pos + 1;
                }
            }
            pos += 1;
        }

        self.length()
    }
}

impl Default for TextBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl TextSource for TextBuffer {
    fn slice_text(&self, from: usize, to: usize) -> String {
        self.text_range(from, to)
    }

    fn length(&self) -> usize {
        TextBuffer::length(self)
    }

    fn line_at(&self, offset: usize) -> Line {
        let from = self.line_start(offset);
        let to = self.line_end(offset);
        Line {
            from,
            to,
            text: self.text_range(from, to),
        }
    }

    fn align_offset(&self, offset: usize) -> usize {
        let offset = min(offset, self.length());
        if self.is_char_boundary(offset) {
            offset
        } else {
            offset - 1
        }
    }
}
