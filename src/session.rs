// Editor session: wires host events to the toggle engine and the drop controller
// The host window is passed into every call; the session never holds on to it

use tracing::debug;

use crate::catalog::{BlockCatalog, ContentBlock};
use crate::config::EditorConfig;
use crate::dragdrop::{DropController, DropSurface, InsertionIndicator};
use crate::format::{ActiveFormatState, FormatCommand, FormatToggleEngine, ToggleOutcome};
use crate::text::{Point, Selection, TextEdit, TextWindow};

/// Listener for active format snapshots
pub type FormatStateListener = Box<dyn FnMut(&ActiveFormatState)>;
/// Listener for insertion indicator changes; `None` hides the indicator
pub type IndicatorListener = Box<dyn FnMut(Option<InsertionIndicator>)>;

pub struct EditorSession {
    engine: FormatToggleEngine,
    drop: DropController,
    catalog: BlockCatalog,
    last_state: ActiveFormatState,
    format_listeners: Vec<FormatStateListener>,
    indicator_listeners: Vec<IndicatorListener>,
}

impl EditorSession {
    pub fn new(config: &EditorConfig) -> Self {
        EditorSession {
            engine: FormatToggleEngine::new(config.scan, config.placeholder.clone()),
            drop: DropController::for_policy(config.drop.snap, config.drop.mode),
            catalog: BlockCatalog::standard(&config.catalog.sample_text),
            last_state: ActiveFormatState::default(),
            format_listeners: Vec::new(),
            indicator_listeners: Vec::new(),
        }
    }

    pub fn engine(&self) -> &FormatToggleEngine {
        &self.engine
    }

    pub fn catalog(&self) -> &BlockCatalog {
        &self.catalog
    }

    pub fn drop_controller(&self) -> &DropController {
        &self.drop
    }

    /// The most recently emitted format state
    pub fn format_state(&self) -> ActiveFormatState {
        self.last_state
    }

    pub fn on_format_state<F>(&mut self, listener: F)
    where
        F: FnMut(&ActiveFormatState) + 'static,
    {
        self.format_listeners.push(Box::new(listener));
    }

    pub fn on_indicator<F>(&mut self, listener: F)
    where
        F: FnMut(Option<InsertionIndicator>) + 'static,
    {
        self.indicator_listeners.push(Box::new(listener));
    }

    /// Recompute and emit the format state; call on every selection or content change
    pub fn selection_changed<W: TextWindow + ?Sized>(&mut self, window: &W) -> ActiveFormatState {
        let state = self
            .engine
            .detect_active_formats(window, window.current_selection());
        self.last_state = state;
        for listener in &mut self.format_listeners {
            listener(&state);
        }
        state
    }

    /// Run a toolbar command against the state the toolbar currently shows
    pub fn run_command<W: TextWindow + ?Sized>(
        &mut self,
        window: &mut W,
        command: FormatCommand,
    ) -> Option<ToggleOutcome> {
        let selection = window.current_selection();
        let outcome =
            self.engine
                .toggle_format_with_state(window, selection, command, &self.last_state);
        match &outcome {
            Some(outcome) => {
                window.apply_edit(&outcome.edit);
                window.set_selection(outcome.selection);
                window.focus();
                self.selection_changed(window);
            }
            None => debug!(%command, "command changed nothing"),
        }
        outcome
    }

    /// Insert a block at the caret and place the caret after it
    pub fn insert_block<W: TextWindow + ?Sized>(
        &mut self,
        window: &mut W,
        block: &ContentBlock,
    ) -> TextEdit {
        let at = window.current_selection().head;
        let edit = TextEdit::insert(at, block.insert_text.clone());
        window.apply_edit(&edit);
        window.set_selection(Selection::caret(at + edit.inserted_len()));
        window.focus();
        self.selection_changed(window);
        edit
    }

    fn emit_indicator(&mut self, indicator: Option<InsertionIndicator>) {
        for listener in &mut self.indicator_listeners {
            listener(indicator);
        }
    }

    pub fn drag_enter(&mut self, surface: &dyn DropSurface, point: Point) -> Option<InsertionIndicator> {
        let indicator = self.drop.drag_enter(surface, point);
        self.emit_indicator(indicator);
        indicator
    }

    pub fn drag_over(&mut self, surface: &dyn DropSurface, point: Point) -> Option<InsertionIndicator> {
        let indicator = self.drop.drag_over(surface, point);
        self.emit_indicator(indicator);
        indicator
    }

    pub fn drag_leave(
        &mut self,
        surface: &dyn DropSurface,
        next: Option<Point>,
    ) -> Option<InsertionIndicator> {
        let indicator = self.drop.drag_leave(surface, next);
        self.emit_indicator(indicator);
        indicator
    }

    pub fn drag_end(&mut self) {
        self.drop.drag_end();
        self.emit_indicator(None);
    }

    /// Drop `payload` into `window` at the tracked position
    pub fn drop<W: TextWindow + ?Sized>(&mut self, window: &mut W, payload: &str) -> Option<TextEdit> {
        let edit = self.drop.drop(window, payload);
        self.emit_indicator(None);
        if edit.is_some() {
            self.selection_changed(window);
        }
        edit
    }
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::new(&EditorConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::FormatKind;
    use crate::sourceedit::SourceSurface;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn window(text: &str) -> SourceSurface {
        SourceSurface::new(0, 0, 400, 300)
            .with_metrics(20, 10, 0)
            .with_text(text)
    }

    #[test]
    fn test_selection_change_emits_state() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut session = EditorSession::default();
        let seen_clone = seen.clone();
        session.on_format_state(move |state| seen_clone.borrow_mut().push(*state));

        let mut w = window("plain **bold**");
        w.set_selection(Selection::caret(9));
        session.selection_changed(&w);
        w.set_selection(Selection::caret(2));
        session.selection_changed(&w);

        let seen = seen.borrow();
        assert_eq!(seen.len(), 2);
        assert!(seen[0].bold);
        assert!(!seen[1].bold);
    }

    #[test]
    fn test_run_command_applies_and_refreshes() {
        let mut session = EditorSession::default();
        let mut w = window("Hello world");
        w.set_selection(Selection::new(6, 11));
        session.selection_changed(&w);

        let bold = FormatCommand::Toggle(FormatKind::Bold);
        session.run_command(&mut w, bold).unwrap();
        assert_eq!(w.text(), "Hello **world**");
        assert_eq!(w.current_selection(), Selection::caret(15));
        assert!(w.is_focused());
        assert!(session.format_state().bold);

        session.run_command(&mut w, bold).unwrap();
        assert_eq!(w.text(), "Hello world");
        assert!(!session.format_state().bold);
    }

    #[test]
    fn test_insert_block_at_caret() {
        let mut session = EditorSession::default();
        let block = session.catalog().find("divider").unwrap().clone();
        let mut w = window("ab");
        w.set_selection(Selection::caret(1));

        session.insert_block(&mut w, &block);
        assert_eq!(w.text(), "a---\n\nb");
        assert_eq!(w.current_selection(), Selection::caret(6));
    }

    #[test]
    fn test_drag_emits_indicators() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut session = EditorSession::default();
        let seen_clone = seen.clone();
        session.on_indicator(move |indicator| seen_clone.borrow_mut().push(indicator));

        let mut w = window("Line one\nLine two\nLine three");
        session.drag_enter(&w, Point::new(30, 25));
        session.drop(&mut w, "INSERTED\n\n");

        assert_eq!(w.text(), "Line one\nINSERTED\n\nLine two\nLine three");
        assert_eq!(
            seen.borrow().as_slice(),
            &[Some(InsertionIndicator { offset: 9, y: 20 }), None]
        );
        assert_eq!(session.drop_controller().indicator(), None);
    }
}
