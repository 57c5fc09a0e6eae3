//! Error types shared by the codecs, the palette store, grid navigation and
//! device sends.

use thiserror::Error;

/// Errors surfaced synchronously to callers.
///
/// Unrecognized sysex traffic never produces one of these; the transfer
/// session drops it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaletteError {
    /// A color string was not a 6-digit hex triplet.
    #[error("invalid hex color `{0}`")]
    InvalidHex(String),
    /// A palette file did not match the fixed layout.
    #[error("malformed palette file: {0}")]
    MalformedFile(&'static str),
    /// A palette index outside 0..=127.
    #[error("palette index {0} out of range (expected 0-127)")]
    IndexOutOfRange(usize),
    /// An upload slot outside the user-facing 1..=3.
    #[error("palette slot {0} out of range (expected 1-3)")]
    InvalidSlot(u8),
    /// A device refused an outbound sysex message.
    #[error("send to device `{device}` failed: {reason}")]
    SendFailed { device: String, reason: String },
}

pub type Result<T> = std::result::Result<T, PaletteError>;
