// Inline and block format detection and toggling

pub mod kind;
pub mod marker_scanner;
pub mod toggle;

pub use kind::{ActiveFormatState, Alignment, FormatCommand, FormatKind, InlineMarker, ParseCommandError};
pub use marker_scanner::{
    BlockSpan, MarkerSpan, ScanConfig, detect_line_alignment, locate_block_wrapper,
    locate_enclosing_marker,
};
pub use toggle::{DEFAULT_PLACEHOLDER, FormatToggleEngine, ToggleAction, ToggleOutcome};
