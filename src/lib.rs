//! # palette-sync
//!
//! Palette editor core for Launchpad controllers running custom firmware,
//! compiled to WebAssembly for the browser utility.
//!
//! The crate keeps the 128-entry color palette, moves it to and from a
//! connected controller over sysex, and reads and writes portable palette
//! files. MIDI port discovery and all rendering stay on the page.

mod color;
mod device;
mod editor;
mod error;
mod palette;
mod protocol;
mod utils;

use wasm_bindgen::prelude::*;

// When the `wee_alloc` feature is enabled, use `wee_alloc` as the global allocator.
#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

/// Initialize the WASM module. Runs automatically on instantiation.
#[wasm_bindgen(start)]
pub fn init() {
    // Set up better error messages for panics in debug builds
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

// Re-export main types
pub use color::*;
pub use device::*;
pub use editor::*;
pub use error::PaletteError;
pub use palette::*;
pub use protocol::*;
