// Drag insertion: coordinate resolution and drop handling

pub mod controller;
pub mod resolver;
pub mod surface;

pub use controller::{DropController, InsertionMode, ParseModeError, plan_drop};
pub use resolver::{
    InsertionIndicator, LineSnap, ParsePolicyError, PositionResolver, SnapPolicy, SnapStrategy,
    StructuralSnap, TertileSnap,
};
pub use surface::{BlockTree, DropSurface, ElementId, Rect, SurfaceGeometry};
