// Preview Layout - block geometry of the rendered markdown preview
// Parses the buffer with pulldown-cmark and stacks blocks vertically

use std::cmp::Reverse;

use pulldown_cmark::{Event, Options, Parser, Tag};
use unicode_segmentation::UnicodeSegmentation;

use crate::dragdrop::{BlockTree, DropSurface, ElementId, Rect, SurfaceGeometry};
use crate::text::{Point, byte_to_utf16, utf16_len};

/// Kind of a rendered element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Paragraph,
    Heading(u8),
    BlockQuote,
    CodeBlock,
    HtmlBlock,
    List,
    ListItem,
    Rule,
    Table,
    TableHead,
    TableRow,
    TableCell,
    /// Emphasis, links and other spans inside a block
    Inline,
}

impl ElementKind {
    fn from_tag(tag: &Tag<'_>) -> Self {
        match tag {
            Tag::Paragraph => ElementKind::Paragraph,
            Tag::Heading { level, .. } => ElementKind::Heading(*level as u8),
            Tag::BlockQuote(_) => ElementKind::BlockQuote,
            Tag::CodeBlock(_) => ElementKind::CodeBlock,
            Tag::HtmlBlock => ElementKind::HtmlBlock,
            Tag::List(_) => ElementKind::List,
            Tag::Item => ElementKind::ListItem,
            Tag::Table(_) => ElementKind::Table,
            Tag::TableHead => ElementKind::TableHead,
            Tag::TableRow => ElementKind::TableRow,
            Tag::TableCell => ElementKind::TableCell,
            _ => ElementKind::Inline,
        }
    }

    /// Elements an insertion indicator can anchor to
    pub fn is_block_level(self) -> bool {
        matches!(
            self,
            ElementKind::Paragraph
                | ElementKind::Heading(_)
                | ElementKind::BlockQuote
                | ElementKind::CodeBlock
                | ElementKind::HtmlBlock
                | ElementKind::ListItem
                | ElementKind::Rule
                | ElementKind::Table
        )
    }

    /// Containers whose children are separated by block spacing
    fn spaces_children(self) -> bool {
        matches!(self, ElementKind::BlockQuote | ElementKind::ListItem)
    }

    /// Elements that take part in vertical stacking
    fn is_stacked(self) -> bool {
        !matches!(self, ElementKind::Inline | ElementKind::TableCell)
    }
}

/// A rendered element with its source range and geometry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub kind: ElementKind,
    /// Source range in UTF-16 units
    pub from: usize,
    pub to: usize,
    /// Start of the buffer line the element begins on
    pub snap_offset: usize,
    /// Top edge in content coordinates (before scrolling)
    pub top: i32,
    pub height: i32,
    pub parent: Option<ElementId>,
    pub depth: usize,
}

impl Element {
    pub fn bottom(&self) -> i32 {
        self.top + self.height
    }
}

/// Glyph metrics for the approximate layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutMetrics {
    pub line_height: i32,
    pub char_width: i32,
    pub block_spacing: i32,
    /// Extra height of a heading row
    pub heading_extra: i32,
    pub padding: i32,
}

impl Default for LayoutMetrics {
    fn default() -> Self {
        LayoutMetrics {
            line_height: 20,
            char_width: 8,
            block_spacing: 10,
            heading_extra: 8,
            padding: 8,
        }
    }
}

struct Frame {
    id: ElementId,
    /// Source byte range
    range: (usize, usize),
    children: usize,
    /// Byte range of text sitting directly in a list item
    inline: Option<(usize, usize)>,
}

/// Block layout of the rendered preview
pub struct PreviewLayout {
    elements: Vec<Element>,
    bounds: Rect,
    metrics: LayoutMetrics,
    scroll_offset: i32,
    /// UTF-16 offsets at which buffer lines start
    line_starts: Vec<usize>,
    length: usize,
    content_bottom: i32,
}

impl PreviewLayout {
    pub fn from_markdown(text: &str, bounds: Rect, metrics: LayoutMetrics) -> Self {
        let mut builder = LayoutBuilder::new(text, bounds, metrics);

        let mut options = Options::empty();
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_TASKLISTS);

        for (event, range) in Parser::new_ext(text, options).into_offset_iter() {
            match event {
                Event::Start(tag) => builder.start(ElementKind::from_tag(&tag), range.start, range.end),
                Event::End(_) => builder.end(),
                Event::Rule => {
                    builder.start(ElementKind::Rule, range.start, range.end);
                    builder.end();
                }
                Event::Text(_)
                | Event::Code(_)
                | Event::InlineHtml(_)
                | Event::SoftBreak
                | Event::HardBreak => builder.inline_text(range.start, range.end),
                _ => {}
            }
        }

        builder.finish()
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn element(&self, id: ElementId) -> Option<&Element> {
        self.elements.get(id)
    }

    pub fn metrics(&self) -> LayoutMetrics {
        self.metrics
    }

    pub fn scroll_offset(&self) -> i32 {
        self.scroll_offset
    }

    pub fn set_scroll_offset(&mut self, offset: i32) {
        let max_scroll = (self.content_bottom - self.bounds.bottom()).max(0);
        self.scroll_offset = offset.clamp(0, max_scroll);
    }

    fn to_content_y(&self, y: i32) -> i32 {
        y + self.scroll_offset
    }

    fn to_surface_y(&self, y: i32) -> i32 {
        y - self.scroll_offset
    }
}

impl SurfaceGeometry for PreviewLayout {
    fn bounds(&self) -> Rect {
        self.bounds
    }

    fn content_span(&self) -> Option<(i32, i32)> {
        let first = self.elements.first()?;
        Some((
            self.to_surface_y(first.top),
            self.to_surface_y(self.content_bottom),
        ))
    }
}

impl DropSurface for PreviewLayout {
    fn text_length(&self) -> usize {
        self.length
    }

    fn line_start(&self, offset: usize) -> usize {
        let idx = self.line_starts.partition_point(|start| *start <= offset);
        self.line_starts[idx.saturating_sub(1)]
    }

    fn block_tree(&self) -> Option<&dyn BlockTree> {
        Some(self)
    }
}

impl BlockTree for PreviewLayout {
    fn element_at(&self, point: Point) -> Option<ElementId> {
        if point.x < self.bounds.x || point.x >= self.bounds.right() {
            return None;
        }
        let y = self.to_content_y(point.y);
        self.elements
            .iter()
            .enumerate()
            .filter(|(_, el)| el.top <= y && y < el.bottom())
            .max_by_key(|(id, el)| (el.depth, *id))
            .map(|(id, _)| id)
    }

    fn parent(&self, id: ElementId) -> Option<ElementId> {
        self.elements.get(id)?.parent
    }

    fn is_block_level(&self, id: ElementId) -> bool {
        self.elements
            .get(id)
            .is_some_and(|el| el.kind.is_block_level())
    }

    fn block_offset(&self, id: ElementId) -> usize {
        self.elements.get(id).map_or(0, |el| el.snap_offset)
    }

    fn block_top(&self, id: ElementId) -> i32 {
        self.elements
            .get(id)
            .map_or(self.bounds.y, |el| self.to_surface_y(el.top))
    }

    fn next_block_below(&self, y: i32) -> Option<ElementId> {
        let y = self.to_content_y(y);
        self.elements
            .iter()
            .position(|el| el.kind.is_block_level() && el.top >= y)
    }

    fn block_at_offset(&self, offset: usize) -> Option<ElementId> {
        self.elements
            .iter()
            .enumerate()
            .filter(|(_, el)| el.kind.is_block_level() && el.snap_offset <= offset)
            .max_by_key(|(id, el)| (el.snap_offset, Reverse(*id)))
            .map(|(id, _)| id)
    }
}

struct LayoutBuilder<'a> {
    text: &'a str,
    metrics: LayoutMetrics,
    bounds: Rect,
    columns: usize,
    elements: Vec<Element>,
    stack: Vec<Frame>,
    root_children: usize,
    y: i32,
}

impl<'a> LayoutBuilder<'a> {
    fn new(text: &'a str, bounds: Rect, metrics: LayoutMetrics) -> Self {
        let usable = bounds.w - 2 * metrics.padding;
        let columns = (usable / metrics.char_width.max(1)).max(1) as usize;
        LayoutBuilder {
            text,
            metrics,
            bounds,
            columns,
            elements: Vec::new(),
            stack: Vec::new(),
            root_children: 0,
            y: bounds.y + metrics.padding,
        }
    }

    /// Wrapped row count of a source slice
    fn rows(&self, from: usize, to: usize) -> i32 {
        let slice = self.text.get(from..to).unwrap_or_default();
        let rows: usize = slice
            .lines()
            .map(|line| line.graphemes(true).count().div_ceil(self.columns).max(1))
            .sum();
        rows.max(1) as i32
    }

    fn snap_offset(&self, byte: usize) -> usize {
        let line_start = self.text[..byte].rfind('\n').map_or(0, |i| i + 1);
        byte_to_utf16(self.text, line_start)
    }

    fn kind_of(&self, frame: &Frame) -> ElementKind {
        self.elements[frame.id].kind
    }

    /// Lay out text sitting directly in a list item before its next child block
    fn flush_item_text(&mut self) {
        let Some(frame) = self.stack.last_mut() else {
            return;
        };
        if let Some((from, to)) = frame.inline.take() {
            self.y += self.rows(from, to) * self.metrics.line_height;
        }
    }

    fn start(&mut self, kind: ElementKind, from: usize, to: usize) {
        let parent_kind = self.stack.last().map(|frame| self.kind_of(frame));
        if kind.is_stacked() {
            if parent_kind == Some(ElementKind::ListItem) {
                self.flush_item_text();
            }
            let siblings = match self.stack.last() {
                Some(frame) => frame.children,
                None => self.root_children,
            };
            let spaced = parent_kind.is_none_or(ElementKind::spaces_children);
            if spaced && siblings > 0 {
                self.y += self.metrics.block_spacing;
            }
        }
        match self.stack.last_mut() {
            Some(frame) => frame.children += 1,
            None => self.root_children += 1,
        }

        let height = if kind == ElementKind::TableCell {
            self.metrics.line_height
        } else {
            0
        };
        let id = self.elements.len();
        self.elements.push(Element {
            kind,
            from: byte_to_utf16(self.text, from),
            to: byte_to_utf16(self.text, to),
            snap_offset: self.snap_offset(from),
            top: self.y,
            height,
            parent: self.stack.last().map(|frame| frame.id),
            depth: self.stack.len(),
        });
        self.stack.push(Frame {
            id,
            range: (from, to),
            children: 0,
            inline: None,
        });
    }

    fn end(&mut self) {
        if self.kind_of_top() == Some(ElementKind::ListItem) {
            self.flush_item_text();
        }
        let Some(frame) = self.stack.pop() else {
            return;
        };
        let lh = self.metrics.line_height;
        let (kind, top) = (self.elements[frame.id].kind, self.elements[frame.id].top);

        let height = match kind {
            ElementKind::Paragraph | ElementKind::CodeBlock | ElementKind::HtmlBlock => {
                self.rows(frame.range.0, frame.range.1) * lh
            }
            ElementKind::Heading(_) => lh + self.metrics.heading_extra,
            ElementKind::Rule | ElementKind::TableHead | ElementKind::TableRow => lh,
            ElementKind::ListItem => (self.y - top).max(lh),
            ElementKind::BlockQuote | ElementKind::List | ElementKind::Table => self.y - top,
            ElementKind::TableCell | ElementKind::Inline => return,
        };
        self.elements[frame.id].height = height;
        self.y = top + height;
    }

    fn kind_of_top(&self) -> Option<ElementKind> {
        self.stack.last().map(|frame| self.kind_of(frame))
    }

    fn inline_text(&mut self, from: usize, to: usize) {
        // Only text directly in a list item advances the layout on its own
        let Some(idx) = self
            .stack
            .iter()
            .rposition(|frame| self.elements[frame.id].kind != ElementKind::Inline)
        else {
            return;
        };
        if self.elements[self.stack[idx].id].kind != ElementKind::ListItem {
            return;
        }
        let item = &mut self.stack[idx];
        item.inline = Some(match item.inline {
            Some((start, _)) => (start, to),
            None => (from, to),
        });
    }

    fn finish(mut self) -> PreviewLayout {
        // Inline spans share the geometry of their enclosing block
        for id in 0..self.elements.len() {
            if self.elements[id].kind == ElementKind::Inline {
                if let Some(parent) = self.elements[id].parent {
                    let (top, height) = (self.elements[parent].top, self.elements[parent].height);
                    self.elements[id].top = top;
                    self.elements[id].height = height;
                }
            }
        }

        let mut line_starts = vec![0];
        let mut units = 0;
        for ch in self.text.chars() {
            units += ch.len_utf16();
            if ch == '\n' {
                line_starts.push(units);
            }
        }

        PreviewLayout {
            elements: self.elements,
            bounds: self.bounds,
            metrics: self.metrics,
            scroll_offset: 0,
            line_starts,
            length: utf16_len(self.text),
            content_bottom: self.y,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = "# Title\n\nFirst para\n\n- one\n- two\n";

    fn metrics() -> LayoutMetrics {
        LayoutMetrics {
            line_height: 20,
            char_width: 8,
            block_spacing: 10,
            heading_extra: 10,
            padding: 0,
        }
    }

    fn layout(text: &str) -> PreviewLayout {
        PreviewLayout::from_markdown(text, Rect::new(0, 0, 800, 600), metrics())
    }

    fn summary(layout: &PreviewLayout) -> Vec<(ElementKind, usize, i32, i32)> {
        layout
            .elements()
            .iter()
            .map(|el| (el.kind, el.snap_offset, el.top, el.height))
            .collect()
    }

    #[test]
    fn test_block_stacking() {
        let layout = layout(DOC);
        assert_eq!(
            summary(&layout),
            vec![
                (ElementKind::Heading(1), 0, 0, 30),
                (ElementKind::Paragraph, 9, 40, 20),
                (ElementKind::List, 21, 70, 40),
                (ElementKind::ListItem, 21, 70, 20),
                (ElementKind::ListItem, 27, 90, 20),
            ]
        );
        assert_eq!(layout.content_span(), Some((0, 110)));
    }

    #[test]
    fn test_element_at_and_ancestry() {
        let layout = layout("Some *emph* here\n");
        let hit = layout.element_at(Point::new(10, 5)).unwrap();
        assert_eq!(layout.element(hit).unwrap().kind, ElementKind::Inline);
        assert!(!layout.is_block_level(hit));

        let chain = layout.ancestors(hit);
        assert_eq!(chain.len(), 2);
        assert_eq!(layout.element(chain[1]).unwrap().kind, ElementKind::Paragraph);
        assert!(layout.is_block_level(chain[1]));
    }

    #[test]
    fn test_gaps_and_next_block() {
        let layout = layout(DOC);
        assert_eq!(layout.element_at(Point::new(10, 65)), None);
        let below = layout.next_block_below(65).unwrap();
        assert_eq!(layout.block_offset(below), 21);
        assert_eq!(layout.next_block_below(500), None);
        assert_eq!(layout.element_at(Point::new(900, 45)), None);
    }

    #[test]
    fn test_block_at_offset() {
        let layout = layout(DOC);
        let id = layout.block_at_offset(27).unwrap();
        assert_eq!(layout.block_top(id), 90);
        // Mid-block offsets belong to the block they fall in
        let id = layout.block_at_offset(14).unwrap();
        assert_eq!(layout.element(id).unwrap().kind, ElementKind::Paragraph);
        assert_eq!(layout.block_at_offset(0), Some(0));
    }

    #[test]
    fn test_quote_snaps_to_line_start() {
        let layout = layout("intro\n\n> quoted text\n");
        let quote = layout
            .elements()
            .iter()
            .find(|el| el.kind == ElementKind::BlockQuote)
            .unwrap();
        assert_eq!(quote.snap_offset, 7);
        let para = layout.elements().last().unwrap();
        assert_eq!(para.kind, ElementKind::Paragraph);
        assert_eq!(para.snap_offset, 7);
    }

    #[test]
    fn test_scroll_offset_moves_blocks() {
        let text = "para\n\n".repeat(40);
        let mut layout = layout(&text);
        layout.set_scroll_offset(100);
        assert_eq!(layout.scroll_offset(), 100);
        assert_eq!(layout.block_top(0), -100);
        let hit = layout.element_at(Point::new(5, 0)).unwrap();
        assert_eq!(layout.element(hit).unwrap().top, 90);
        layout.set_scroll_offset(-5);
        assert_eq!(layout.scroll_offset(), 0);
    }

    #[test]
    fn test_line_start_lookup() {
        let layout = layout("ab\ncd\n\nef");
        assert_eq!(layout.line_start(0), 0);
        assert_eq!(layout.line_start(4), 3);
        assert_eq!(layout.line_start(6), 6);
        assert_eq!(layout.line_start(8), 7);
        assert_eq!(layout.text_length(), 9);
    }

    #[test]
    fn test_wrapped_paragraph_rows() {
        let text = "x".repeat(250);
        let layout = PreviewLayout::from_markdown(&text, Rect::new(0, 0, 800, 600), metrics());
        assert_eq!(layout.elements()[0].height, 60);
    }
}
