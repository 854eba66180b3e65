// Reference host text surface: a gap buffer and a monospace view over it

pub mod source_surface;
pub mod text_buffer;

pub use source_surface::{SelectionCallback, SourceSurface};
pub use text_buffer::{ModifyCallback, TextBuffer};
