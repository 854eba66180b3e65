// Bounded-window marker scanning
// Locates the marker pair enclosing a position without parsing the document

use std::cmp::{max, min};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::format::kind::{Alignment, BLOCK_CLOSE_TAG, InlineMarker};
use crate::text::{TextSource, byte_to_utf16, utf16_to_byte};

static ALIGN_OPEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<div align=(?:"(center|right|justify)"|'(center|right|justify)')>"#)
        .expect("alignment pattern is valid")
});

/// Search radii around a position, in UTF-16 units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub inline_radius: usize,
    pub block_radius: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        ScanConfig {
            inline_radius: 100,
            block_radius: 200,
        }
    }
}

/// A located marker pair. `[start, end)` covers the markers,
/// `[content_start, content_end)` the text between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkerSpan {
    pub start: usize,
    pub end: usize,
    pub content_start: usize,
    pub content_end: usize,
}

impl MarkerSpan {
    pub fn content_len(&self) -> usize {
        self.content_end - self.content_start
    }
}

/// A located alignment wrapper
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockSpan {
    pub span: MarkerSpan,
    pub alignment: Alignment,
}

/// A slice of the buffer around a range, with offset conversion both ways
struct ScanWindow {
    text: String,
    origin: usize,
}

impl ScanWindow {
    fn around<S: TextSource + ?Sized>(src: &S, from: usize, to: usize, radius: usize) -> Self {
        let len = src.length();
        let start = src.align_offset(from.saturating_sub(radius));
        let end = src.align_offset(min(len, to.saturating_add(radius)));
        ScanWindow {
            text: src.slice_text(start, end),
            origin: start,
        }
    }

    fn byte(&self, offset: usize) -> usize {
        utf16_to_byte(&self.text, offset.saturating_sub(self.origin))
    }

    fn offset(&self, byte: usize) -> usize {
        self.origin + byte_to_utf16(&self.text, byte)
    }

    fn span(&self, start: usize, content_start: usize, content_end: usize, end: usize) -> MarkerSpan {
        MarkerSpan {
            start: self.offset(start),
            end: self.offset(end),
            content_start: self.offset(content_start),
            content_end: self.offset(content_end),
        }
    }
}

/// Locate the inline marker pair enclosing `pos`, within `radius` units either side.
///
/// A caret touching the end of a closing marker counts as enclosed.
pub fn locate_enclosing_marker<S: TextSource + ?Sized>(
    src: &S,
    pos: usize,
    marker: InlineMarker,
    radius: usize,
) -> Option<MarkerSpan> {
    let pos = min(pos, src.length());
    let window = ScanWindow::around(src, pos, pos, radius);
    if marker.is_symmetric() {
        let line = src.line_at(pos);
        let line_start = max(line.from, window.origin);
        let line_end = min(line.to, window.offset(window.text.len()));
        let at_line_start = line.from >= window.origin;
        locate_symmetric(&window, pos, marker.open, (line_start, line_end), at_line_start)
    } else {
        locate_asymmetric(&window, pos, marker.open, marker.close)
    }
}

/// Maximal run of one marker character: byte start and length
#[derive(Debug, Clone, Copy)]
struct Run {
    start: usize,
    len: usize,
}

fn marker_runs(text: &str, from: usize, to: usize, ch: u8, at_line_start: bool) -> Vec<Run> {
    let bytes = text.as_bytes();
    let mut runs = Vec::new();
    let mut i = from;
    while i < to {
        if bytes[i] != ch {
            i += 1;
            continue;
        }
        let start = i;
        while i < to && bytes[i] == ch {
            i += 1;
        }
        // A run opening the line and followed by whitespace is a list bullet
        let is_bullet = at_line_start
            && start == from
            && bytes.get(i).is_some_and(|b| *b == b' ' || *b == b'\t');
        if !is_bullet {
            runs.push(Run {
                start,
                len: i - start,
            });
        }
    }
    runs
}

/// Whether a run of `len` marker characters stands for one marker of length `k`.
/// `***` is bold and italic at once.
fn fits_marker(len: usize, k: usize, ch: u8) -> bool {
    len == k || (ch == b'*' && len == 3)
}

/// Non-whitespace on both sides of the run, within the line
fn is_inner_run(text: &str, (from, to): (usize, usize), run: Run) -> bool {
    let before = text[from..run.start].chars().next_back();
    let after = text[run.start + run.len..to].chars().next();
    before.is_some_and(|c| !c.is_whitespace()) && after.is_some_and(|c| !c.is_whitespace())
}

/// Pair marker runs in order. Returns `(open_start, close_start)` byte pairs;
/// each marker is `k` bytes.
fn pair_runs(
    text: &str,
    bounds: (usize, usize),
    runs: &[Run],
    k: usize,
    ch: u8,
) -> Vec<(usize, usize)> {
    let mut pairs = Vec::new();
    let mut pending: Option<usize> = None;
    for &run in runs {
        let run_end = run.start + run.len;
        if fits_marker(run.len, k, ch) {
            match pending.take() {
                Some(open) => pairs.push((open, run.start)),
                None => pending = Some(run_end - k),
            }
        } else if run.len > k && is_inner_run(text, bounds, run) {
            // A closer written right against the next opener, as in `**a****b**`
            if let Some(open) = pending.take() {
                pairs.push((open, run.start));
                if fits_marker(run.len - k, k, ch) {
                    pending = Some(run_end - k);
                }
            }
        }
    }
    pairs
}

fn locate_symmetric(
    window: &ScanWindow,
    pos: usize,
    marker: &str,
    (line_start, line_end): (usize, usize),
    at_line_start: bool,
) -> Option<MarkerSpan> {
    let ch = *marker.as_bytes().first()?;
    let k = marker.len();
    let from = window.byte(line_start);
    let to = max(from, window.byte(line_end));

    let runs = marker_runs(&window.text, from, to, ch, at_line_start);
    let pos_byte = window.byte(pos);
    pair_runs(&window.text, (from, to), &runs, k, ch)
        .into_iter()
        .find_map(|(open_start, close_start)| {
            let open_end = open_start + k;
            let close_end = close_start + k;
            let inside = open_end <= pos_byte && pos_byte <= close_start;
            if inside || pos_byte == close_end {
                Some(window.span(open_start, open_end, close_start, close_end))
            } else {
                None
            }
        })
}

fn locate_asymmetric(window: &ScanWindow, pos: usize, open: &str, close: &str) -> Option<MarkerSpan> {
    let text = window.text.as_str();
    let pos_byte = window.byte(pos);
    let before = &text[..pos_byte];

    if let Some(close_start) = before.len().checked_sub(close.len()) {
        if before.ends_with(close) {
            let head = &before[..close_start];
            if let Some(open_start) = head.rfind(open) {
                let open_end = open_start + open.len();
                if !head[open_end..].contains(close) {
                    return Some(window.span(open_start, open_end, close_start, pos_byte));
                }
            }
        }
    }

    let open_start = before.rfind(open)?;
    let open_end = open_start + open.len();
    if open_end > pos_byte || before[open_end..].contains(close) {
        return None;
    }
    let close_start = pos_byte + text[pos_byte..].find(close)?;
    Some(window.span(open_start, open_end, close_start, close_start + close.len()))
}

/// Locate the alignment wrapper enclosing `[from, to]`.
///
/// The nearest opening tag starting at or before `from` is taken; it must not be
/// closed before `to`. With `only` set, a wrapper of another alignment is ignored.
pub fn locate_block_wrapper<S: TextSource + ?Sized>(
    src: &S,
    from: usize,
    to: usize,
    only: Option<Alignment>,
    radius: usize,
) -> Option<BlockSpan> {
    let len = src.length();
    let (from, to) = (min(from, len), min(max(from, to), len));
    let window = ScanWindow::around(src, from, to, radius);
    let text = window.text.as_str();
    let from_byte = window.byte(from);
    let to_byte = window.byte(to);
    let close = BLOCK_CLOSE_TAG;

    let nearest_open = |limit: usize| {
        ALIGN_OPEN_RE
            .captures_iter(text)
            .take_while(|caps| caps.get(0).is_some_and(|m| m.start() <= limit))
            .last()
    };

    let to_block = |caps: regex::Captures<'_>, close_start: usize| -> Option<BlockSpan> {
        let whole = caps.get(0)?;
        let value = caps.get(1).or_else(|| caps.get(2))?.as_str();
        let alignment = Alignment::from_attr_value(value)?;
        if only.is_some_and(|wanted| wanted != alignment) {
            return None;
        }
        Some(BlockSpan {
            span: window.span(
                whole.start(),
                whole.end(),
                close_start,
                close_start + close.len(),
            ),
            alignment,
        })
    };

    // Caret right after a closing tag
    if from == to && text[..from_byte].ends_with(close) {
        let close_start = from_byte - close.len();
        if let Some(caps) = nearest_open(close_start) {
            let open_end = caps.get(0).map_or(0, |m| m.end());
            if open_end <= close_start && !text[open_end..close_start].contains(close) {
                return to_block(caps, close_start);
            }
        }
    }

    let caps = nearest_open(from_byte)?;
    let open_end = caps.get(0).map_or(0, |m| m.end());
    let scan_from = min(open_end, to_byte);
    if text[scan_from..to_byte].contains(close) {
        return None;
    }
    let search_from = max(open_end, to_byte);
    let close_start = search_from + text[search_from..].find(close)?;
    to_block(caps, close_start)
}

/// Alignment declared by the first wrapper tag in a line, `Left` when there is none
pub fn detect_line_alignment(line: &str) -> Alignment {
    ALIGN_OPEN_RE
        .captures(line)
        .and_then(|caps| caps.get(1).or_else(|| caps.get(2)))
        .and_then(|value| Alignment::from_attr_value(value.as_str()))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::FormatKind;

    fn marker(kind: FormatKind) -> InlineMarker {
        kind.markers().unwrap()
    }

    fn locate(text: &str, pos: usize, kind: FormatKind) -> Option<MarkerSpan> {
        locate_enclosing_marker(text, pos, marker(kind), 100)
    }

    #[test]
    fn test_bold_pair_encloses_position() {
        let text = "say **hello** now";
        let span = locate(text, 8, FormatKind::Bold).unwrap();
        assert_eq!(
            span,
            MarkerSpan {
                start: 4,
                end: 13,
                content_start: 6,
                content_end: 11
            }
        );
        assert_eq!(locate(text, 6, FormatKind::Bold), Some(span));
        assert_eq!(locate(text, 11, FormatKind::Bold), Some(span));
        // Touching the end of the closer
        assert_eq!(locate(text, 13, FormatKind::Bold), Some(span));
        assert_eq!(locate(text, 2, FormatKind::Bold), None);
        assert_eq!(locate(text, 15, FormatKind::Bold), None);
    }

    #[test]
    fn test_italic_does_not_match_inside_bold() {
        assert_eq!(locate("**bold**", 4, FormatKind::Italic), None);
        assert_eq!(locate("*it*", 2, FormatKind::Bold), None);
        let span = locate("a *it* b", 4, FormatKind::Italic).unwrap();
        assert_eq!((span.start, span.end), (2, 6));
    }

    #[test]
    fn test_triple_star_is_bold_and_italic() {
        let text = "***both***";
        let bold = locate(text, 5, FormatKind::Bold).unwrap();
        assert_eq!((bold.start, bold.content_start, bold.content_end, bold.end), (1, 3, 7, 9));
        let italic = locate(text, 5, FormatKind::Italic).unwrap();
        assert_eq!((italic.start, italic.end), (2, 8));
    }

    #[test]
    fn test_italic_around_bold() {
        let text = "*one **two** three*";
        let italic = locate(text, 8, FormatKind::Italic).unwrap();
        assert_eq!((italic.start, italic.end), (0, 19));
        let bold = locate(text, 8, FormatKind::Bold).unwrap();
        assert_eq!((bold.start, bold.end), (5, 12));
    }

    #[test]
    fn test_adjacent_pairs_split_shared_run() {
        let text = "**new****old**";
        let first = locate(text, 4, FormatKind::Bold).unwrap();
        assert_eq!(
            (first.start, first.content_start, first.content_end, first.end),
            (0, 2, 5, 7)
        );
        let second = locate(text, 10, FormatKind::Bold).unwrap();
        assert_eq!(
            (second.start, second.content_start, second.content_end, second.end),
            (7, 9, 12, 14)
        );

        let italic = locate("*new**old*", 2, FormatKind::Italic).unwrap();
        assert_eq!((italic.start, italic.end), (0, 5));
        let strike = locate("~~new~~~~old~~", 10, FormatKind::Strikethrough).unwrap();
        assert_eq!((strike.start, strike.end), (7, 14));

        // A bold run between words is not an italic boundary unless an italic is open
        assert_eq!(locate("a**b", 3, FormatKind::Italic), None);
    }

    #[test]
    fn test_bullet_is_not_emphasis() {
        assert_eq!(locate("* item one", 4, FormatKind::Italic), None);
        let span = locate("* item *x*", 8, FormatKind::Italic).unwrap();
        assert_eq!((span.start, span.end), (7, 10));
    }

    #[test]
    fn test_pairs_are_line_scoped() {
        let text = "~~one\ntwo~~";
        assert_eq!(locate(text, 3, FormatKind::Strikethrough), None);
        assert_eq!(locate(text, 7, FormatKind::Strikethrough), None);
    }

    #[test]
    fn test_underline_tags() {
        let text = "an <u>under</u> line";
        let span = locate(text, 8, FormatKind::Underline).unwrap();
        assert_eq!(
            (span.start, span.content_start, span.content_end, span.end),
            (3, 6, 11, 15)
        );
        assert_eq!(locate(text, 15, FormatKind::Underline), Some(span));
        assert_eq!(locate(text, 17, FormatKind::Underline), None);
        assert_eq!(locate("<u>a</u> b <u>c", 10, FormatKind::Underline), None);
    }

    #[test]
    fn test_radius_limits_search() {
        let text = format!("**{}x**", "a".repeat(150));
        assert_eq!(locate_enclosing_marker(text.as_str(), 151, marker(FormatKind::Bold), 100), None);
        assert!(locate_enclosing_marker(text.as_str(), 151, marker(FormatKind::Bold), 200).is_some());
    }

    #[test]
    fn test_utf16_offsets_in_spans() {
        let text = "😀 **é**";
        let span = locate(text, 5, FormatKind::Bold).unwrap();
        assert_eq!((span.start, span.content_start, span.end), (3, 5, 8));
    }

    #[test]
    fn test_block_wrapper() {
        let text = "<div align=\"center\">Hello</div>\nnext";
        let block = locate_block_wrapper(text, 22, 22, None, 200).unwrap();
        assert_eq!(block.alignment, Alignment::Center);
        assert_eq!(
            (block.span.start, block.span.content_start, block.span.content_end, block.span.end),
            (0, 20, 25, 31)
        );
        // Caret at the tag itself and right after the closing tag
        assert_eq!(locate_block_wrapper(text, 0, 0, None, 200), Some(block));
        assert_eq!(locate_block_wrapper(text, 31, 31, None, 200), Some(block));
        assert_eq!(locate_block_wrapper(text, 34, 34, None, 200), None);
        assert_eq!(
            locate_block_wrapper(text, 22, 22, Some(Alignment::Right), 200),
            None
        );
    }

    #[test]
    fn test_block_wrapper_single_quotes() {
        let text = "<div align='justify'>x</div>";
        let block = locate_block_wrapper(text, 21, 22, None, 200).unwrap();
        assert_eq!(block.alignment, Alignment::Justify);
    }

    #[test]
    fn test_detect_line_alignment() {
        assert_eq!(detect_line_alignment("<div align=\"right\">x</div>"), Alignment::Right);
        assert_eq!(detect_line_alignment("<div align='center'>"), Alignment::Center);
        assert_eq!(detect_line_alignment("<div align=\"left\">x</div>"), Alignment::Left);
        assert_eq!(detect_line_alignment("<DIV align=\"right\">"), Alignment::Left);
        assert_eq!(detect_line_alignment("plain"), Alignment::Left);
    }
}
