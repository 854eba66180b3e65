// Drop insertion controller
// Tracks the indicator through a drag gesture and applies the payload on drop

use std::cmp::min;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, trace};

use crate::dragdrop::resolver::{InsertionIndicator, PositionResolver, SnapPolicy};
use crate::dragdrop::surface::DropSurface;
use crate::text::{Point, Selection, TextEdit, TextSource, TextWindow};

/// Where a dropped payload lands relative to the tracked offset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InsertionMode {
    /// Start of the line holding the tracked offset (raw text surface)
    #[default]
    LineStart,
    /// Exactly at the tracked offset (rendered preview)
    Direct,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown insertion mode: {0} (expected line or direct)")]
pub struct ParseModeError(pub String);

impl FromStr for InsertionMode {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "line" | "line-start" => Ok(InsertionMode::LineStart),
            "direct" => Ok(InsertionMode::Direct),
            _ => Err(ParseModeError(s.to_string())),
        }
    }
}

/// The edit a drop performs and the caret offset after it
pub fn plan_drop<S: TextSource + ?Sized>(
    src: &S,
    offset: usize,
    payload: &str,
    mode: InsertionMode,
) -> (TextEdit, usize) {
    let len = src.length();
    let offset = min(offset, len);
    let edit = match mode {
        InsertionMode::LineStart => {
            let line = src.line_at(offset);
            if offset == len && !line.text.is_empty() {
                TextEdit::insert(len, format!("\n{}", payload))
            } else {
                TextEdit::insert(line.from, payload)
            }
        }
        InsertionMode::Direct => TextEdit::insert(src.align_offset(offset), payload),
    };
    let caret = edit.from + edit.inserted_len();
    (edit, caret)
}

/// Drag gesture state for one drop target
#[derive(Debug)]
pub struct DropController {
    resolver: PositionResolver,
    mode: InsertionMode,
    indicator: Option<InsertionIndicator>,
}

impl DropController {
    pub fn new(resolver: PositionResolver, mode: InsertionMode) -> Self {
        DropController {
            resolver,
            mode,
            indicator: None,
        }
    }

    pub fn for_policy(policy: SnapPolicy, mode: InsertionMode) -> Self {
        Self::new(PositionResolver::for_policy(policy), mode)
    }

    pub fn mode(&self) -> InsertionMode {
        self.mode
    }

    pub fn resolver(&self) -> &PositionResolver {
        &self.resolver
    }

    pub fn indicator(&self) -> Option<InsertionIndicator> {
        self.indicator
    }

    pub fn tracked_offset(&self) -> Option<usize> {
        self.indicator.map(|indicator| indicator.offset)
    }

    pub fn drag_enter(&mut self, surface: &dyn DropSurface, point: Point) -> Option<InsertionIndicator> {
        self.drag_over(surface, point)
    }

    /// Track the latest resolvable position; an unresolvable one keeps the previous indicator
    pub fn drag_over(&mut self, surface: &dyn DropSurface, point: Point) -> Option<InsertionIndicator> {
        match self.resolver.resolve(surface, point) {
            Some(indicator) => self.indicator = Some(indicator),
            None => trace!(x = point.x, y = point.y, "drag position not resolvable"),
        }
        self.indicator
    }

    /// `next` is where the pointer went. Moving onto a child still inside the
    /// surface is not a leave.
    pub fn drag_leave(
        &mut self,
        surface: &dyn DropSurface,
        next: Option<Point>,
    ) -> Option<InsertionIndicator> {
        if next.is_some_and(|point| surface.contains(point)) {
            return self.indicator;
        }
        self.indicator = None;
        None
    }

    pub fn drag_end(&mut self) {
        self.indicator = None;
    }

    /// Insert `payload` at the tracked position. Drag state is cleared whether or not
    /// anything is inserted.
    pub fn drop<W: TextWindow + ?Sized>(&mut self, window: &mut W, payload: &str) -> Option<TextEdit> {
        let tracked = self.indicator.take().map(|indicator| indicator.offset);
        if payload.is_empty() {
            debug!("drop without payload ignored");
            return None;
        }
        let Some(offset) = tracked else {
            debug!("drop without a tracked position ignored");
            return None;
        };

        let (edit, caret) = plan_drop(window, offset, payload, self.mode);
        window.apply_edit(&edit);
        window.set_selection(Selection::caret(caret));
        window.focus();
        Some(edit)
    }
}

impl Default for DropController {
    fn default() -> Self {
        Self::new(PositionResolver::default(), InsertionMode::default())
    }
}
