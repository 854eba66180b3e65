// Rendered preview geometry used for structural drop snapping

pub mod layout;

pub use layout::{Element, ElementKind, LayoutMetrics, PreviewLayout};
