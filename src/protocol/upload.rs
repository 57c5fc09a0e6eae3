//! Outbound palette upload message.

use super::SysexConfig;
use crate::error::{PaletteError, Result};
use crate::palette::{Palette, PALETTE_SIZE};

/// Size of the flat `[index, r, g, b]` block carried by an upload.
pub const UPLOAD_BLOCK_SIZE: usize = PALETTE_SIZE * 4;

/// On-device palette slot, user-facing 1..=3.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot(u8);

impl Slot {
    pub const COUNT: u8 = 3;

    pub fn new(slot: u8) -> Result<Self> {
        if (1..=Self::COUNT).contains(&slot) {
            Ok(Self(slot))
        } else {
            Err(PaletteError::InvalidSlot(slot))
        }
    }

    /// The 1-based number shown to the user.
    pub fn number(self) -> u8 {
        self.0
    }

    /// The 0-based selector sent on the wire.
    pub fn wire_index(self) -> u8 {
        self.0 - 1
    }
}

impl Default for Slot {
    fn default() -> Self {
        Self(1)
    }
}

/// Flatten a palette into the 512-byte upload block.
///
/// Every index gets its slot; unpopulated ones are sent as black since the
/// firmware replaces the whole target slot.
pub fn encode_upload_block(palette: &Palette) -> [u8; UPLOAD_BLOCK_SIZE] {
    let mut block = [0u8; UPLOAD_BLOCK_SIZE];

    for (index, entry) in block.chunks_exact_mut(4).enumerate() {
        let [r, g, b] = palette.get(index).unwrap_or_default().to_array();
        entry.copy_from_slice(&[index as u8, r, g, b]);
    }

    block
}

/// Build the complete upload message:
/// `header, upload command, slot, 512-byte block, terminator`.
pub fn build_upload_message(palette: &Palette, slot: Slot, config: &SysexConfig) -> Vec<u8> {
    let mut message = Vec::with_capacity(config.header.len() + 3 + UPLOAD_BLOCK_SIZE);
    message.extend_from_slice(&config.header);
    message.push(config.upload_command);
    message.push(slot.wire_index());
    message.extend_from_slice(&encode_upload_block(palette));
    message.push(config.terminator);
    message
}

/// True when every byte between the leading status byte and the terminator
/// is a 7-bit MIDI data byte. Channel values above 127 break this.
pub fn has_only_data_bytes(message: &[u8]) -> bool {
    match message {
        [_, body @ .., _] => body.iter().all(|byte| byte & 0x80 == 0),
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgb;

    #[test]
    fn test_block_single_entry() {
        let mut palette = Palette::new();
        palette.insert(3, Rgb::new(1, 2, 3)).unwrap();

        let block = encode_upload_block(&palette);
        assert_eq!(block.len(), 512);
        assert_eq!(&block[12..16], &[3, 1, 2, 3]);

        for (i, group) in block.chunks_exact(4).enumerate() {
            if i != 3 {
                assert_eq!(group, &[i as u8, 0, 0, 0]);
            }
        }
    }

    #[test]
    fn test_message_framing() {
        let palette = crate::palette::default_palette();
        let config = SysexConfig::default();
        let message = build_upload_message(&palette, Slot::new(3).unwrap(), &config);

        assert_eq!(message.len(), 7 + 1 + 1 + 512 + 1);
        assert_eq!(&message[..7], &config.header[..]);
        assert_eq!(message[7], config.upload_command);
        assert_eq!(message[8], 2);
        assert_eq!(&message[9..521], &encode_upload_block(&palette)[..]);
        assert_eq!(message[521], 0xF7);
    }

    #[test]
    fn test_slot_range() {
        assert_eq!(Slot::new(0), Err(PaletteError::InvalidSlot(0)));
        assert_eq!(Slot::new(4), Err(PaletteError::InvalidSlot(4)));
        assert_eq!(Slot::new(1).unwrap().wire_index(), 0);
        assert_eq!(Slot::default().number(), 1);
    }

    #[test]
    fn test_data_byte_check() {
        let config = SysexConfig::default();

        let mut dim = Palette::new();
        dim.insert(0, Rgb::new(127, 64, 0)).unwrap();
        assert!(has_only_data_bytes(&build_upload_message(&dim, Slot::default(), &config)));

        let mut bright = Palette::new();
        bright.insert(0, Rgb::new(247, 0, 0)).unwrap();
        assert!(!has_only_data_bytes(&build_upload_message(&bright, Slot::default(), &config)));

        assert!(has_only_data_bytes(&[0xF0, 0xF7]));
        assert!(has_only_data_bytes(&[]));
    }
}
