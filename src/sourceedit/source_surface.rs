// Source Surface - monospace rendering of a TextBuffer
// Non-wrapping: one buffer line per row, scrolled by whole lines

use std::cmp::{max, min};

use unicode_segmentation::UnicodeSegmentation;

use crate::dragdrop::{DropSurface, Rect, SurfaceGeometry};
use crate::sourceedit::TextBuffer;
use crate::text::{Line, Point, Selection, TextEdit, TextSource, TextWindow, utf16_len};

/// Callback type for selection changes: `(old, new)`
pub type SelectionCallback = Box<dyn FnMut(Selection, Selection)>;

const DEFAULT_LINE_HEIGHT: i32 = 20;
const DEFAULT_CHAR_WIDTH: i32 = 8;
const DEFAULT_PADDING: i32 = 4;

pub struct SourceSurface {
    buffer: TextBuffer,
    selection: Selection,

    // Position and size
    x: i32,
    y: i32,
    w: i32,
    h: i32,

    padding: i32,
    line_height: i32,
    char_width: i32,

    /// First visible buffer line
    top_line: usize,
    focused: bool,

    selection_callbacks: Vec<SelectionCallback>,
}

impl SourceSurface {
    pub fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        SourceSurface {
            buffer: TextBuffer::new(),
            selection: Selection::default(),
            x,
            y,
            w,
            h,
            padding: DEFAULT_PADDING,
            line_height: DEFAULT_LINE_HEIGHT,
            char_width: DEFAULT_CHAR_WIDTH,
            top_line: 0,
            focused: false,
            selection_callbacks: Vec::new(),
        }
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.set_text(text);
        self
    }

    /// Set the glyph cell size
    pub fn with_metrics(mut self, line_height: i32, char_width: i32, padding: i32) -> Self {
        self.line_height = max(1, line_height);
        self.char_width = max(1, char_width);
        self.padding = max(0, padding);
        self
    }

    pub fn buffer(&self) -> &TextBuffer {
        &self.buffer
    }

    pub fn text(&self) -> String {
        self.buffer.text()
    }

    /// Replace the whole buffer; the caret moves to the start
    pub fn set_text(&mut self, text: &str) {
        self.buffer.set_text(text);
        self.top_line = 0;
        self.update_selection(Selection::caret(0));
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    pub fn line_count(&self) -> usize {
        self.buffer.count_lines(0, self.buffer.length()) + 1
    }

    pub fn top_line(&self) -> usize {
        self.top_line
    }

    pub fn scroll_to_line(&mut self, line: usize) {
        self.top_line = min(line, self.line_count() - 1);
    }

    /// Add a callback fired whenever the selection actually changes
    pub fn add_selection_callback<F>(&mut self, callback: F)
    where
        F: FnMut(Selection, Selection) + 'static,
    {
        self.selection_callbacks.push(Box::new(callback));
    }

    /// Add a callback fired on every buffer modification
    pub fn add_modify_callback<F>(&mut self, callback: F)
    where
        F: FnMut(usize, usize, usize) + 'static,
    {
        self.buffer.add_modify_callback(callback);
    }

    fn text_area_x(&self) -> i32 {
        self.x + self.padding
    }

    /// Rendered y of buffer line 0, which is above the surface when scrolled
    fn content_top(&self) -> i32 {
        self.y + self.padding - self.top_line as i32 * self.line_height
    }

    fn update_selection(&mut self, selection: Selection) {
        let selection = selection.clamp(self.buffer.length());
        if selection == self.selection {
            return;
        }
        let old = self.selection;
        self.selection = selection;
        for cb in &mut self.selection_callbacks {
            cb(old, selection);
        }
    }
}

impl TextSource for SourceSurface {
    fn slice_text(&self, from: usize, to: usize) -> String {
        self.buffer.text_range(from, to)
    }

    fn length(&self) -> usize {
        self.buffer.length()
    }

    fn line_at(&self, offset: usize) -> Line {
        self.buffer.line_at(offset)
    }

    fn align_offset(&self, offset: usize) -> usize {
        self.buffer.align_offset(offset)
    }
}

impl TextWindow for SourceSurface {
    fn coords_to_offset(&self, point: Point) -> Option<usize> {
        let (top, bottom) = self.content_span()?;
        if point.y < top || point.y >= bottom {
            return None;
        }

        let row = ((point.y - top) / self.line_height) as usize;
        let line_start = self.buffer.skip_lines(0, row);
        let line = self.buffer.line_text(line_start);

        // Round to the nearest caret position between glyph cells
        let col = (point.x - self.text_area_x() + self.char_width / 2) / self.char_width;
        let col = max(0, col) as usize;

        let units: usize = line.graphemes(true).take(col).map(utf16_len).sum();
        Some(line_start + units)
    }

    fn offset_to_coords(&self, offset: usize) -> Option<Point> {
        if offset > self.buffer.length() {
            return None;
        }
        let offset = self.buffer.align_offset(offset);
        let line_start = self.buffer.line_start(offset);
        let row = self.buffer.count_lines(0, line_start);
        let col = self
            .buffer
            .text_range(line_start, offset)
            .graphemes(true)
            .count();

        Some(Point::new(
            self.text_area_x() + col as i32 * self.char_width,
            self.content_top() + row as i32 * self.line_height,
        ))
    }

    fn apply_edit(&mut self, edit: &TextEdit) {
        self.buffer.replace(edit.from, edit.to, &edit.insert);
        let mapped = self.selection.map_through(edit);
        self.update_selection(mapped);
    }

    fn current_selection(&self) -> Selection {
        self.selection
    }

    fn set_selection(&mut self, selection: Selection) {
        self.update_selection(selection);
    }

    fn focus(&mut self) {
        self.focused = true;
    }
}

impl SurfaceGeometry for SourceSurface {
    fn bounds(&self) -> Rect {
        Rect::new(self.x, self.y, self.w, self.h)
    }

    fn content_span(&self) -> Option<(i32, i32)> {
        let top = self.content_top();
        Some((top, top + self.line_count() as i32 * self.line_height))
    }
}

impl DropSurface for SourceSurface {
    fn text_length(&self) -> usize {
        self.buffer.length()
    }

    fn native_offset(&self, point: Point) -> Option<usize> {
        self.coords_to_offset(point)
    }

    fn native_coords(&self, offset: usize) -> Option<Point> {
        self.offset_to_coords(offset)
    }

    fn line_start(&self, offset: usize) -> usize {
        self.buffer.line_start(offset)
    }
}
