//! The 128-entry palette: in-memory store, file codec and grid navigation.

mod default;
mod file;
mod grid;
mod store;

pub use default::*;
pub use file::*;
pub use grid::*;
pub use store::*;
