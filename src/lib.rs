// Library exports for mdlive

pub mod catalog;
pub mod config;
pub mod dragdrop;
pub mod format;
pub mod preview;
pub mod session;
pub mod sourceedit;
pub mod text;
