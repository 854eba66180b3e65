// Rendering surface contracts consumed by the position resolver

use crate::text::Point;

/// Identifier of an element inside a `BlockTree`
pub type ElementId = usize;

/// Axis-aligned rectangle in surface pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    pub fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Rect { x, y, w, h }
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.h
    }

    pub fn right(&self) -> i32 {
        self.x + self.w
    }

    /// Half-open containment: the right and bottom edges are outside
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x && point.x < self.right() && point.y >= self.y && point.y < self.bottom()
    }
}

/// Where a surface sits and where its rendered content is
pub trait SurfaceGeometry {
    fn bounds(&self) -> Rect;

    /// Vertical extent `(top, bottom)` of rendered content, if anything is laid out yet
    fn content_span(&self) -> Option<(i32, i32)>;

    fn contains(&self, point: Point) -> bool {
        self.bounds().contains(point)
    }
}

/// Everything a snap strategy may ask of a rendering surface.
///
/// Surfaces opt into the capabilities they have. A plain text surface
/// provides native coordinate mapping, a rendered preview provides a block tree.
pub trait DropSurface: SurfaceGeometry {
    /// Length of the underlying buffer in UTF-16 units
    fn text_length(&self) -> usize;

    fn native_offset(&self, _point: Point) -> Option<usize> {
        None
    }

    fn native_coords(&self, _offset: usize) -> Option<Point> {
        None
    }

    /// Start of the buffer line containing `offset`
    fn line_start(&self, offset: usize) -> usize {
        offset
    }

    fn block_tree(&self) -> Option<&dyn BlockTree> {
        None
    }
}

/// Rendered element ancestry, the structural view of a surface
pub trait BlockTree {
    /// Innermost element under `point`
    fn element_at(&self, point: Point) -> Option<ElementId>;
    fn parent(&self, id: ElementId) -> Option<ElementId>;
    fn is_block_level(&self, id: ElementId) -> bool;
    /// Buffer offset where the element's block starts
    fn block_offset(&self, id: ElementId) -> usize;
    /// Rendered y of the element's top edge
    fn block_top(&self, id: ElementId) -> i32;
    /// First block-level element whose top is at or below `y`
    fn next_block_below(&self, y: i32) -> Option<ElementId>;
    /// Block-level element starting at `offset`, or the nearest one starting before it
    fn block_at_offset(&self, offset: usize) -> Option<ElementId>;

    fn ancestors(&self, id: ElementId) -> Vec<ElementId> {
        let mut chain = vec![id];
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            chain.push(parent);
            current = parent;
        }
        chain
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_contains_is_half_open() {
        let rect = Rect::new(10, 20, 100, 50);
        assert!(rect.contains(Point::new(10, 20)));
        assert!(rect.contains(Point::new(109, 69)));
        assert!(!rect.contains(Point::new(110, 30)));
        assert!(!rect.contains(Point::new(50, 70)));
        assert!(!rect.contains(Point::new(9, 30)));
        assert_eq!(rect.bottom(), 70);
    }
}
