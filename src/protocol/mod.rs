//! Sysex palette transfer with the Launchpad custom firmware.
//!
//! Downloads arrive as a stream of frames (begin, one entry per index, end).
//! Uploads go out as a single message carrying all 128 entries.

mod command;
mod config;
mod session;
mod upload;

pub use command::*;
pub use config::*;
pub use session::*;
pub use upload::*;
