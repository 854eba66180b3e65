// Position resolution for drag insertion
// Maps a pointer coordinate to a buffer offset and the y of the indicator line

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::trace;

use crate::dragdrop::surface::{BlockTree, DropSurface};
use crate::text::Point;

/// A proposed drop position: the offset that will receive the payload and
/// the y at which the indicator line is drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsertionIndicator {
    pub offset: usize,
    pub y: i32,
}

/// One way of turning surface coordinates into insertion offsets
pub trait SnapStrategy: fmt::Debug {
    fn name(&self) -> &'static str;

    fn resolve_offset(&self, surface: &dyn DropSurface, point: Point) -> Option<usize>;

    /// Rendered y of the block an offset snaps to
    fn snap_to_block_top(&self, surface: &dyn DropSurface, offset: usize) -> Option<i32>;
}

/// Above all content resolves to the buffer start, below it to the buffer end
fn outside_content(surface: &dyn DropSurface, y: i32) -> Option<usize> {
    let (top, bottom) = surface.content_span()?;
    if y < top {
        Some(0)
    } else if y >= bottom {
        Some(surface.text_length())
    } else {
        None
    }
}

/// Line snapping through the surface's own coordinate mapping
#[derive(Debug, Clone, Copy, Default)]
pub struct LineSnap;

impl SnapStrategy for LineSnap {
    fn name(&self) -> &'static str {
        "line"
    }

    fn resolve_offset(&self, surface: &dyn DropSurface, point: Point) -> Option<usize> {
        surface.content_span()?;
        if let Some(offset) = outside_content(surface, point.y) {
            return Some(offset);
        }
        let offset = surface.native_offset(point)?;
        Some(surface.line_start(offset))
    }

    fn snap_to_block_top(&self, surface: &dyn DropSurface, offset: usize) -> Option<i32> {
        let len = surface.text_length();
        let line_start = surface.line_start(offset);
        if offset >= len && line_start < len {
            // Appending after a non-empty last line opens a new line below it
            return surface.content_span().map(|(_, bottom)| bottom);
        }
        surface.native_coords(line_start).map(|p| p.y)
    }
}

/// Snapping to the nearest enclosing block-level element of a rendered tree
#[derive(Debug, Clone, Copy, Default)]
pub struct StructuralSnap;

impl StructuralSnap {
    fn enclosing_block(tree: &dyn BlockTree, point: Point) -> Option<usize> {
        let hit = tree.element_at(point)?;
        tree.ancestors(hit)
            .into_iter()
            .find(|id| tree.is_block_level(*id))
    }
}

impl SnapStrategy for StructuralSnap {
    fn name(&self) -> &'static str {
        "structural"
    }

    fn resolve_offset(&self, surface: &dyn DropSurface, point: Point) -> Option<usize> {
        let tree = surface.block_tree()?;
        if let Some(offset) = outside_content(surface, point.y) {
            return Some(offset);
        }
        let block = Self::enclosing_block(tree, point).or_else(|| tree.next_block_below(point.y));
        match block {
            Some(id) => Some(tree.block_offset(id)),
            None => Some(surface.text_length()),
        }
    }

    fn snap_to_block_top(&self, surface: &dyn DropSurface, offset: usize) -> Option<i32> {
        let tree = surface.block_tree()?;
        let (top, bottom) = surface.content_span()?;
        if offset >= surface.text_length() && offset > 0 {
            return Some(bottom);
        }
        Some(tree.block_at_offset(offset).map_or(top, |id| tree.block_top(id)))
    }
}

/// Coarse thirds of the surface: start, middle, end
#[derive(Debug, Clone, Copy, Default)]
pub struct TertileSnap;

impl SnapStrategy for TertileSnap {
    fn name(&self) -> &'static str {
        "tertile"
    }

    fn resolve_offset(&self, surface: &dyn DropSurface, point: Point) -> Option<usize> {
        let bounds = surface.bounds();
        let len = surface.text_length();
        let rel = (point.y - bounds.y) * 3;
        let offset = if rel < bounds.h {
            0
        } else if rel >= bounds.h * 2 {
            len
        } else {
            len / 2
        };
        Some(offset)
    }

    fn snap_to_block_top(&self, surface: &dyn DropSurface, offset: usize) -> Option<i32> {
        let bounds = surface.bounds();
        let len = surface.text_length();
        let y = if offset == 0 {
            bounds.y
        } else if offset >= len {
            bounds.bottom()
        } else {
            bounds.y + bounds.h / 2
        };
        Some(y)
    }
}

/// Which snapping the hosting surface uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SnapPolicy {
    /// Raw text surface with native line mapping
    #[default]
    Line,
    /// Rendered preview, falling back to tertiles without a block tree
    Structural,
    Tertile,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown snap policy: {0} (expected line, structural or tertile)")]
pub struct ParsePolicyError(pub String);

impl FromStr for SnapPolicy {
    type Err = ParsePolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "line" => Ok(SnapPolicy::Line),
            "structural" => Ok(SnapPolicy::Structural),
            "tertile" => Ok(SnapPolicy::Tertile),
            _ => Err(ParsePolicyError(s.to_string())),
        }
    }
}

/// A primary snap strategy with an optional degraded fallback.
///
/// Offset and indicator y always come from the same strategy, so the
/// indicator is drawn where the payload will land.
#[derive(Debug)]
pub struct PositionResolver {
    primary: Box<dyn SnapStrategy>,
    fallback: Option<Box<dyn SnapStrategy>>,
}

impl PositionResolver {
    pub fn new(primary: Box<dyn SnapStrategy>, fallback: Option<Box<dyn SnapStrategy>>) -> Self {
        PositionResolver { primary, fallback }
    }

    pub fn for_policy(policy: SnapPolicy) -> Self {
        match policy {
            SnapPolicy::Line => Self::new(Box::new(LineSnap), None),
            SnapPolicy::Structural => Self::new(Box::new(StructuralSnap), Some(Box::new(TertileSnap))),
            SnapPolicy::Tertile => Self::new(Box::new(TertileSnap), None),
        }
    }

    fn strategies(&self) -> impl Iterator<Item = &dyn SnapStrategy> {
        std::iter::once(self.primary.as_ref()).chain(self.fallback.as_deref())
    }

    pub fn resolve_offset(&self, surface: &dyn DropSurface, point: Point) -> Option<usize> {
        self.strategies()
            .find_map(|strategy| strategy.resolve_offset(surface, point))
    }

    pub fn snap_to_block_top(&self, surface: &dyn DropSurface, offset: usize) -> Option<i32> {
        self.strategies()
            .find_map(|strategy| strategy.snap_to_block_top(surface, offset))
    }

    /// Resolve a point over `surface` to an indicator, `None` when no strategy can
    pub fn resolve(&self, surface: &dyn DropSurface, point: Point) -> Option<InsertionIndicator> {
        if !surface.contains(point) {
            trace!(x = point.x, y = point.y, "point outside surface");
            return None;
        }
        for strategy in self.strategies() {
            let Some(offset) = strategy.resolve_offset(surface, point) else {
                trace!(strategy = strategy.name(), "no offset for point");
                continue;
            };
            match strategy.snap_to_block_top(surface, offset) {
                Some(y) => return Some(InsertionIndicator { offset, y }),
                None => trace!(strategy = strategy.name(), offset, "no indicator position"),
            }
        }
        None
    }
}

impl Default for PositionResolver {
    fn default() -> Self {
        Self::for_policy(SnapPolicy::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dragdrop::surface::{Rect, SurfaceGeometry};

    /// A surface with nothing but bounds and a length
    struct Bare {
        bounds: Rect,
        len: usize,
    }

    impl SurfaceGeometry for Bare {
        fn bounds(&self) -> Rect {
            self.bounds
        }

        fn content_span(&self) -> Option<(i32, i32)> {
            None
        }
    }

    impl DropSurface for Bare {
        fn text_length(&self) -> usize {
            self.len
        }
    }

    fn bare() -> Bare {
        Bare {
            bounds: Rect::new(0, 0, 300, 300),
            len: 41,
        }
    }

    #[test]
    fn test_tertile_thirds() {
        let surface = bare();
        let snap = TertileSnap;
        assert_eq!(snap.resolve_offset(&surface, Point::new(5, 10)), Some(0));
        assert_eq!(snap.resolve_offset(&surface, Point::new(5, 150)), Some(20));
        assert_eq!(snap.resolve_offset(&surface, Point::new(5, 250)), Some(41));
        assert_eq!(snap.snap_to_block_top(&surface, 0), Some(0));
        assert_eq!(snap.snap_to_block_top(&surface, 20), Some(150));
        assert_eq!(snap.snap_to_block_top(&surface, 41), Some(300));
    }

    #[test]
    fn test_structural_without_tree_falls_back() {
        let surface = bare();
        assert_eq!(StructuralSnap.resolve_offset(&surface, Point::new(5, 10)), None);

        let resolver = PositionResolver::for_policy(SnapPolicy::Structural);
        assert_eq!(
            resolver.resolve(&surface, Point::new(5, 250)),
            Some(InsertionIndicator { offset: 41, y: 300 })
        );
    }

    #[test]
    fn test_line_snap_needs_rendered_content() {
        let surface = bare();
        let resolver = PositionResolver::for_policy(SnapPolicy::Line);
        assert_eq!(resolver.resolve(&surface, Point::new(5, 10)), None);
    }

    #[test]
    fn test_resolve_outside_surface() {
        let resolver = PositionResolver::for_policy(SnapPolicy::Tertile);
        assert_eq!(resolver.resolve(&bare(), Point::new(5, 400)), None);
        assert_eq!(resolver.resolve_offset(&bare(), Point::new(5, 400)), Some(41));
    }

    #[test]
    fn test_parse_policy() {
        assert_eq!("Structural".parse::<SnapPolicy>(), Ok(SnapPolicy::Structural));
        assert!("grid".parse::<SnapPolicy>().is_err());
    }
}
