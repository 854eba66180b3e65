// Drag insertion over the raw text surface and the rendered preview

use mdlive::dragdrop::{
    DropController, InsertionIndicator, InsertionMode, PositionResolver, Rect, SnapPolicy,
};
use mdlive::preview::{LayoutMetrics, PreviewLayout};
use mdlive::sourceedit::SourceSurface;
use mdlive::text::{Point, Selection, TextWindow};

const LINES: &str = "Line one\nLine two\nLine three";
const DOC: &str = "# Title\n\nFirst para\n\n- one\n- two\n";

/// 10px glyphs, 20px rows, optional padding
fn text_surface(text: &str, padding: i32) -> SourceSurface {
    SourceSurface::new(0, 0, 400, 300)
        .with_metrics(20, 10, padding)
        .with_text(text)
}

fn preview(text: &str) -> PreviewLayout {
    let metrics = LayoutMetrics {
        line_height: 20,
        char_width: 8,
        block_spacing: 10,
        heading_extra: 10,
        padding: 0,
    };
    PreviewLayout::from_markdown(text, Rect::new(0, 0, 800, 600), metrics)
}

#[test]
fn test_drop_snaps_to_line_start() {
    let mut window = text_surface(LINES, 0);
    let mut controller = DropController::for_policy(SnapPolicy::Line, InsertionMode::LineStart);

    // Over "Line two", a few glyphs in
    let indicator = controller.drag_enter(&window, Point::new(30, 25));
    assert_eq!(indicator, Some(InsertionIndicator { offset: 9, y: 20 }));

    let edit = controller.drop(&mut window, "INSERTED\n\n").unwrap();
    assert_eq!(edit.from, 9);
    assert_eq!(window.text(), "Line one\nINSERTED\n\nLine two\nLine three");
    assert_eq!(window.current_selection(), Selection::caret(19));
    assert!(window.is_focused());
    assert_eq!(controller.indicator(), None);
}

#[test]
fn test_coordinates_outside_content() {
    let window = text_surface(LINES, 10);
    let resolver = PositionResolver::for_policy(SnapPolicy::Line);

    assert_eq!(resolver.resolve_offset(&window, Point::new(5, 3)), Some(0));
    assert_eq!(resolver.resolve_offset(&window, Point::new(5, 200)), Some(28));
    assert_eq!(
        resolver.resolve(&window, Point::new(5, 3)),
        Some(InsertionIndicator { offset: 0, y: 10 })
    );
    // Below the last line the indicator sits under it
    assert_eq!(
        resolver.resolve(&window, Point::new(5, 200)),
        Some(InsertionIndicator { offset: 28, y: 70 })
    );

    let layout = PreviewLayout::from_markdown(DOC, Rect::new(0, 0, 800, 600), LayoutMetrics::default());
    let resolver = PositionResolver::for_policy(SnapPolicy::Structural);
    assert_eq!(resolver.resolve_offset(&layout, Point::new(20, 2)), Some(0));
    assert_eq!(resolver.resolve_offset(&layout, Point::new(20, 590)), Some(33));
}

#[test]
fn test_drop_below_last_line_appends() {
    let mut window = text_surface(LINES, 0);
    let mut controller = DropController::for_policy(SnapPolicy::Line, InsertionMode::LineStart);
    controller.drag_over(&window, Point::new(10, 250));
    controller.drop(&mut window, "- item\n");
    assert_eq!(window.text(), "Line one\nLine two\nLine three\n- item\n");
    assert_eq!(window.current_selection(), Selection::caret(36));
}

#[test]
fn test_indicator_matches_insertion_point() {
    for y in (0..300).step_by(7) {
        let mut window = text_surface(LINES, 4);
        let mut controller = DropController::default();
        let Some(indicator) = controller.drag_over(&window, Point::new(45, y)) else {
            panic!("no indicator at y={y}");
        };
        let edit = controller.drop(&mut window, "X\n").unwrap();
        assert_eq!(edit.from, indicator.offset, "y={y}");
    }
}

#[test]
fn test_structural_snap_on_preview() {
    let layout = preview(DOC);
    let resolver = PositionResolver::for_policy(SnapPolicy::Structural);

    // Inside the paragraph
    assert_eq!(
        resolver.resolve(&layout, Point::new(10, 45)),
        Some(InsertionIndicator { offset: 9, y: 40 })
    );
    // In the gap above the list the next block below wins
    assert_eq!(
        resolver.resolve(&layout, Point::new(10, 65)),
        Some(InsertionIndicator { offset: 21, y: 70 })
    );
    assert_eq!(
        resolver.resolve(&layout, Point::new(10, 95)),
        Some(InsertionIndicator { offset: 27, y: 90 })
    );
}

#[test]
fn test_structural_snap_walks_up_from_inline() {
    let layout = preview("Intro with *emphasis* inside\n\nnext\n");
    let resolver = PositionResolver::for_policy(SnapPolicy::Structural);
    assert_eq!(resolver.resolve_offset(&layout, Point::new(100, 5)), Some(0));
    assert_eq!(resolver.resolve_offset(&layout, Point::new(100, 35)), Some(30));
}

#[test]
fn test_direct_drop_from_preview() {
    let layout = preview(DOC);
    let mut window = text_surface(DOC, 0);
    let mut controller = DropController::for_policy(SnapPolicy::Structural, InsertionMode::Direct);

    controller.drag_over(&layout, Point::new(10, 45));
    controller.drop(&mut window, "---\n\n");

    insta::assert_snapshot!(window.text(), @r"
    # Title

    ---

    First para

    - one
    - two
    ");
    assert_eq!(window.current_selection(), Selection::caret(14));
}

#[test]
fn test_tertile_snap() {
    let layout = preview(DOC);
    let resolver = PositionResolver::for_policy(SnapPolicy::Tertile);
    assert_eq!(
        resolver.resolve(&layout, Point::new(10, 50)),
        Some(InsertionIndicator { offset: 0, y: 0 })
    );
    assert_eq!(
        resolver.resolve(&layout, Point::new(10, 300)),
        Some(InsertionIndicator { offset: 16, y: 300 })
    );
    assert_eq!(
        resolver.resolve(&layout, Point::new(10, 500)),
        Some(InsertionIndicator { offset: 33, y: 600 })
    );
}

#[test]
fn test_leave_into_child_keeps_indicator() {
    let window = text_surface(LINES, 0);
    let mut controller = DropController::default();
    let indicator = controller.drag_over(&window, Point::new(30, 45));
    assert!(indicator.is_some());

    assert_eq!(controller.drag_leave(&window, Some(Point::new(50, 50))), indicator);
    assert_eq!(controller.drag_leave(&window, Some(Point::new(500, 50))), None);
    assert_eq!(controller.tracked_offset(), None);

    controller.drag_over(&window, Point::new(30, 45));
    assert_eq!(controller.drag_leave(&window, None), None);
}

#[test]
fn test_unresolvable_move_keeps_previous_indicator() {
    let window = text_surface(LINES, 0);
    let mut controller = DropController::default();
    let first = controller.drag_over(&window, Point::new(30, 45));
    assert_eq!(controller.drag_over(&window, Point::new(30, 900)), first);
}

#[test]
fn test_drop_without_tracked_offset_is_noop() {
    let mut window = text_surface(LINES, 0);
    let mut controller = DropController::default();

    assert_eq!(controller.drop(&mut window, "payload"), None);
    assert_eq!(window.text(), LINES);
    assert!(!window.is_focused());

    // Leaving clears the tracked offset, so a later drop does nothing either
    controller.drag_over(&window, Point::new(30, 25));
    controller.drag_leave(&window, Some(Point::new(-5, 25)));
    assert_eq!(controller.drop(&mut window, "payload"), None);
    assert_eq!(window.text(), LINES);
}

#[test]
fn test_empty_payload_clears_state() {
    let mut window = text_surface(LINES, 0);
    let mut controller = DropController::default();
    controller.drag_over(&window, Point::new(30, 25));

    assert_eq!(controller.drop(&mut window, ""), None);
    assert_eq!(controller.indicator(), None);
    assert_eq!(window.text(), LINES);

    controller.drag_over(&window, Point::new(30, 25));
    controller.drag_end();
    assert_eq!(controller.drop(&mut window, "late"), None);
}
