//! Portable palette file (`.lpal`) encoding and decoding.
//!
//! Layout, 524 bytes, integers big-endian:
//!
//! | Offset | Size | Content                                          |
//! |--------|------|--------------------------------------------------|
//! | 0      | 4    | magic `LPAL`                                     |
//! | 4      | 2    | format version (1)                               |
//! | 6      | 2    | number of populated entries (0-128)              |
//! | 8      | 512  | 128 slots of `[index, r, g, b]`                  |
//! | 520    | 4    | trailer `LEND`                                   |
//!
//! Slot `i` holds `[i, r, g, b]` when index `i` is populated and
//! `[0xFF, 0, 0, 0]` when it is absent.

use byteorder::{BigEndian, ByteOrder};
use log::{debug, warn};

use super::store::{Palette, PALETTE_SIZE};
use crate::color::Rgb;
use crate::error::{PaletteError, Result};
use crate::utils::ByteReader;

pub const FILE_MAGIC: [u8; 4] = *b"LPAL";
pub const FILE_TRAILER: [u8; 4] = *b"LEND";
pub const FILE_VERSION: u16 = 1;

const HEADER_SIZE: usize = 8;
const SLOT_SIZE: usize = 4;
pub const FILE_SIZE: usize = HEADER_SIZE + PALETTE_SIZE * SLOT_SIZE + FILE_TRAILER.len();

/// Index byte marking an unpopulated slot.
const ABSENT_SLOT: u8 = 0xFF;

/// Serialize a palette into the file layout.
pub fn encode_palette_file(palette: &Palette) -> Vec<u8> {
    let mut out = [0u8; FILE_SIZE];

    out[0..4].copy_from_slice(&FILE_MAGIC);
    BigEndian::write_u16(&mut out[4..6], FILE_VERSION);
    BigEndian::write_u16(&mut out[6..8], palette.len() as u16);

    for (index, slot) in out[HEADER_SIZE..HEADER_SIZE + PALETTE_SIZE * SLOT_SIZE]
        .chunks_exact_mut(SLOT_SIZE)
        .enumerate()
    {
        match palette.get(index) {
            Some(Rgb { r, g, b }) => slot.copy_from_slice(&[index as u8, r, g, b]),
            None => slot[0] = ABSENT_SLOT,
        }
    }

    out[FILE_SIZE - FILE_TRAILER.len()..].copy_from_slice(&FILE_TRAILER);

    debug!("encoded palette file with {} entries", palette.len());
    out.to_vec()
}

/// Parse a palette file. Any deviation from the layout is rejected.
pub fn decode_palette_file(data: &[u8]) -> Result<Palette> {
    decode(data).inspect_err(|e| warn!("rejected palette file: {e}"))
}

fn decode(data: &[u8]) -> Result<Palette> {
    if data.len() != FILE_SIZE {
        return Err(PaletteError::MalformedFile("unexpected file size"));
    }

    let mut reader = ByteReader::new(data);
    let truncated = PaletteError::MalformedFile("truncated file");

    if reader.read_array::<4>().ok_or(truncated.clone())? != FILE_MAGIC {
        return Err(PaletteError::MalformedFile("bad magic"));
    }

    if reader.read_u16().ok_or(truncated.clone())? != FILE_VERSION {
        return Err(PaletteError::MalformedFile("unsupported version"));
    }

    let declared = reader.read_u16().ok_or(truncated.clone())? as usize;
    if declared > PALETTE_SIZE {
        return Err(PaletteError::MalformedFile("entry count exceeds 128"));
    }

    let mut palette = Palette::new();
    for index in 0..PALETTE_SIZE {
        let [id, r, g, b] = reader.read_array::<4>().ok_or(truncated.clone())?;

        if id == index as u8 {
            palette.insert(index, Rgb::new(r, g, b))?;
        } else if id == ABSENT_SLOT {
            if (r, g, b) != (0, 0, 0) {
                return Err(PaletteError::MalformedFile("color data in an empty slot"));
            }
        } else {
            return Err(PaletteError::MalformedFile("slot index does not match its position"));
        }
    }

    if palette.len() != declared {
        return Err(PaletteError::MalformedFile("entry count does not match slots"));
    }

    if reader.read_array::<4>().ok_or(truncated)? != FILE_TRAILER {
        return Err(PaletteError::MalformedFile("bad trailer"));
    }

    debug!("decoded palette file with {} entries", declared);
    Ok(palette)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::default_palette;

    fn sparse() -> Palette {
        let mut palette = Palette::new();
        palette.insert(0, Rgb::new(0, 0, 0)).unwrap();
        palette.insert(17, Rgb::new(255, 128, 1)).unwrap();
        palette.insert(127, Rgb::new(10, 20, 30)).unwrap();
        palette
    }

    #[test]
    fn test_round_trip() {
        for palette in [Palette::new(), sparse(), default_palette()] {
            let bytes = encode_palette_file(&palette);
            assert_eq!(bytes.len(), FILE_SIZE);
            assert_eq!(decode_palette_file(&bytes).unwrap(), palette);
        }
    }

    #[test]
    fn test_layout() {
        let bytes = encode_palette_file(&sparse());

        assert_eq!(&bytes[0..4], b"LPAL");
        assert_eq!(&bytes[4..6], &[0, 1]);
        assert_eq!(&bytes[6..8], &[0, 3]);
        assert_eq!(&bytes[8..12], &[0, 0, 0, 0]);
        assert_eq!(&bytes[12..16], &[0xFF, 0, 0, 0]);
        let slot17 = HEADER_SIZE + 17 * SLOT_SIZE;
        assert_eq!(&bytes[slot17..slot17 + 4], &[17, 255, 128, 1]);
        assert_eq!(&bytes[520..], b"LEND");
    }

    #[test]
    fn test_absent_is_not_black() {
        let decoded = decode_palette_file(&encode_palette_file(&sparse())).unwrap();
        assert_eq!(decoded.get(0), Some(Rgb::BLACK));
        assert_eq!(decoded.get(1), None);
    }

    #[test]
    fn test_rejects_wrong_size() {
        let bytes = encode_palette_file(&sparse());
        assert!(decode_palette_file(&bytes[..FILE_SIZE - 1]).is_err());
        assert!(decode_palette_file(&[]).is_err());

        let mut longer = bytes.clone();
        longer.push(0);
        assert!(decode_palette_file(&longer).is_err());
    }

    #[test]
    fn test_rejects_bad_markers() {
        let good = encode_palette_file(&sparse());

        let mut bad_magic = good.clone();
        bad_magic[0] = b'X';
        assert_eq!(
            decode_palette_file(&bad_magic),
            Err(PaletteError::MalformedFile("bad magic"))
        );

        let mut bad_version = good.clone();
        bad_version[5] = 2;
        assert_eq!(
            decode_palette_file(&bad_version),
            Err(PaletteError::MalformedFile("unsupported version"))
        );

        let mut bad_trailer = good.clone();
        bad_trailer[FILE_SIZE - 1] = 0;
        assert_eq!(
            decode_palette_file(&bad_trailer),
            Err(PaletteError::MalformedFile("bad trailer"))
        );
    }

    #[test]
    fn test_rejects_inconsistent_slots() {
        let good = encode_palette_file(&sparse());

        let mut wrong_index = good.clone();
        wrong_index[HEADER_SIZE + 17 * SLOT_SIZE] = 18;
        assert!(decode_palette_file(&wrong_index).is_err());

        let mut dirty_empty = good.clone();
        dirty_empty[HEADER_SIZE + 5 * SLOT_SIZE + 2] = 9;
        assert!(decode_palette_file(&dirty_empty).is_err());

        let mut wrong_count = good.clone();
        wrong_count[7] = 4;
        assert_eq!(
            decode_palette_file(&wrong_count),
            Err(PaletteError::MalformedFile("entry count does not match slots"))
        );
    }
}
