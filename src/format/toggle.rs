// Format toggle engine
// Detects active formats around the selection and computes the single edit that toggles one

use tracing::debug;

use crate::format::kind::{
    ActiveFormatState, Alignment, BLOCK_CLOSE_TAG, FormatCommand, FormatKind, InlineMarker,
};
use crate::format::marker_scanner::{
    MarkerSpan, ScanConfig, detect_line_alignment, locate_block_wrapper, locate_enclosing_marker,
};
use crate::text::{Selection, TextEdit, TextSource, utf16_len};

pub const DEFAULT_PLACEHOLDER: &str = "text";

/// What a toggle did to the buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleAction {
    /// Markers were inserted
    Added,
    /// Markers were stripped
    Removed,
    /// Text or an existing wrapper was rewritten in place
    Replaced,
}

/// The edit to apply and the selection to set afterwards
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToggleOutcome {
    pub edit: TextEdit,
    pub selection: Selection,
    pub action: ToggleAction,
}

impl ToggleOutcome {
    fn new(edit: TextEdit, selection: Selection, action: ToggleAction) -> Self {
        ToggleOutcome {
            edit,
            selection,
            action,
        }
    }

    /// Replace `span` by its inner text, caret at the end of that text
    fn unwrap_span<S: TextSource + ?Sized>(src: &S, span: MarkerSpan) -> Self {
        let inner = src.slice_text(span.content_start, span.content_end);
        let caret = span.start + span.content_len();
        Self::new(
            TextEdit::replace(span.start, span.end, inner),
            Selection::caret(caret),
            ToggleAction::Removed,
        )
    }
}

#[derive(Debug, Clone)]
pub struct FormatToggleEngine {
    scan: ScanConfig,
    placeholder: String,
}

impl Default for FormatToggleEngine {
    fn default() -> Self {
        Self::new(ScanConfig::default(), DEFAULT_PLACEHOLDER)
    }
}

impl FormatToggleEngine {
    pub fn new(scan: ScanConfig, placeholder: impl Into<String>) -> Self {
        FormatToggleEngine {
            scan,
            placeholder: placeholder.into(),
        }
    }

    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    /// Active formats at the start of the selection
    pub fn detect_active_formats<S: TextSource + ?Sized>(
        &self,
        src: &S,
        selection: Selection,
    ) -> ActiveFormatState {
        let pos = selection.clamp(src.length()).from();
        let mut state = ActiveFormatState::default();
        for kind in FormatKind::ALL {
            if let Some(marker) = kind.markers() {
                let found = self.locate_inline(src, pos, marker).is_some();
                state.set_active(kind, found);
            }
        }
        state.alignment = detect_line_alignment(&src.line_at(pos).text);
        state
    }

    /// The inline marker pair of `kind` enclosing `pos`
    pub fn locate<S: TextSource + ?Sized>(
        &self,
        src: &S,
        pos: usize,
        kind: FormatKind,
    ) -> Option<MarkerSpan> {
        self.locate_inline(src, pos, kind.markers()?)
    }

    fn locate_inline<S: TextSource + ?Sized>(
        &self,
        src: &S,
        pos: usize,
        marker: InlineMarker,
    ) -> Option<MarkerSpan> {
        locate_enclosing_marker(src, pos, marker, self.scan.inline_radius)
    }

    /// Toggle using freshly detected state
    pub fn toggle_format<S: TextSource + ?Sized>(
        &self,
        src: &S,
        selection: Selection,
        command: FormatCommand,
    ) -> Option<ToggleOutcome> {
        let state = self.detect_active_formats(src, selection);
        self.toggle_format_with_state(src, selection, command, &state)
    }

    /// Toggle using the state the UI last rendered, which may be stale.
    ///
    /// Returns `None` when the command changes nothing.
    pub fn toggle_format_with_state<S: TextSource + ?Sized>(
        &self,
        src: &S,
        selection: Selection,
        command: FormatCommand,
        state: &ActiveFormatState,
    ) -> Option<ToggleOutcome> {
        let selection = selection.clamp(src.length());
        match command {
            FormatCommand::Toggle(kind) => match (kind.markers(), kind.alignment()) {
                (Some(marker), _) => Some(self.toggle_inline(src, selection, kind, marker, state)),
                (None, Some(alignment)) => {
                    Some(self.toggle_alignment(src, selection, alignment, state))
                }
                (None, None) => None,
            },
            FormatCommand::AlignLeft => self.strip_alignment(src, selection),
            FormatCommand::Uppercase => transform_case(src, selection, str::to_uppercase),
            FormatCommand::Lowercase => transform_case(src, selection, str::to_lowercase),
        }
    }

    fn toggle_inline<S: TextSource + ?Sized>(
        &self,
        src: &S,
        selection: Selection,
        kind: FormatKind,
        marker: InlineMarker,
        state: &ActiveFormatState,
    ) -> ToggleOutcome {
        if state.is_active(kind) {
            match self.locate_inline(src, selection.from(), marker) {
                Some(span) => return ToggleOutcome::unwrap_span(src, span),
                None => debug!(
                    format = %kind,
                    pos = selection.from(),
                    "active format has no enclosing markers, adding instead"
                ),
            }
        }

        if selection.is_collapsed() {
            let pos = selection.head;
            let payload = format!("{}{}{}", marker.open, self.placeholder, marker.close);
            return ToggleOutcome::new(
                TextEdit::insert(pos, payload),
                Selection::caret(pos + utf16_len(marker.open)),
                ToggleAction::Added,
            );
        }

        let selected = src.slice_text(selection.from(), selection.to());
        let wrapped = format!("{}{}{}", marker.open, selected, marker.close);
        let caret = selection.from() + utf16_len(&wrapped);
        ToggleOutcome::new(
            TextEdit::replace(selection.from(), selection.to(), wrapped),
            Selection::caret(caret),
            ToggleAction::Added,
        )
    }

    fn toggle_alignment<S: TextSource + ?Sized>(
        &self,
        src: &S,
        selection: Selection,
        alignment: Alignment,
        state: &ActiveFormatState,
    ) -> ToggleOutcome {
        let (from, to) = (selection.from(), selection.to());
        let radius = self.scan.block_radius;

        if state.alignment == alignment {
            match locate_block_wrapper(src, from, to, Some(alignment), radius) {
                Some(block) => return ToggleOutcome::unwrap_span(src, block.span),
                None => debug!(
                    ?alignment,
                    pos = from,
                    "active alignment has no enclosing wrapper, adding instead"
                ),
            }
        }

        // Another alignment already wraps the block: rewrite its opening tag
        if let Some(block) = locate_block_wrapper(src, from, to, None, radius) {
            if block.alignment != alignment {
                let open = alignment.open_tag().unwrap_or_default();
                let edit = TextEdit::replace(block.span.start, block.span.content_start, open);
                let selection = selection.map_through(&edit);
                return ToggleOutcome::new(edit, selection, ToggleAction::Replaced);
            }
        }

        let open = alignment.open_tag().unwrap_or_default();
        let close = BLOCK_CLOSE_TAG;
        let (range_from, range_to, content) = if selection.is_collapsed() {
            let line = src.line_at(from);
            let content = if line.text.is_empty() {
                self.placeholder.clone()
            } else {
                line.text
            };
            (line.from, line.to, content)
        } else {
            // Wrap whole lines so the wrapper never lands mid-line
            let first = src.line_at(from);
            let last_line_start = src.line_at(to).from;
            let last = if last_line_start == to {
                src.line_at(to - 1)
            } else {
                src.line_at(to)
            };
            (first.from, last.to, src.slice_text(first.from, last.to))
        };

        let wrapped = format!("{}{}{}", open, content, close);
        let caret = range_from + utf16_len(&wrapped);
        ToggleOutcome::new(
            TextEdit::replace(range_from, range_to, wrapped),
            Selection::caret(caret),
            ToggleAction::Added,
        )
    }

    /// Left alignment is the absence of a wrapper, so this only ever removes
    fn strip_alignment<S: TextSource + ?Sized>(
        &self,
        src: &S,
        selection: Selection,
    ) -> Option<ToggleOutcome> {
        let block = locate_block_wrapper(
            src,
            selection.from(),
            selection.to(),
            None,
            self.scan.block_radius,
        )?;
        Some(ToggleOutcome::unwrap_span(src, block.span))
    }
}

fn transform_case<S: TextSource + ?Sized>(
    src: &S,
    selection: Selection,
    map: fn(&str) -> String,
) -> Option<ToggleOutcome> {
    if selection.is_collapsed() {
        return None;
    }
    let (from, to) = (selection.from(), selection.to());
    let mapped = map(&src.slice_text(from, to));
    let end = from + utf16_len(&mapped);
    Some(ToggleOutcome::new(
        TextEdit::replace(from, to, mapped),
        Selection::new(from, end),
        ToggleAction::Replaced,
    ))
}
