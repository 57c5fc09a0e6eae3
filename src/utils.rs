//! Utility functions for binary reading and channel arithmetic.

use byteorder::{BigEndian, ReadBytesExt};
use std::io::{Cursor, Read};

/// Binary reader over a borrowed buffer (big-endian, as in the palette file).
pub struct ByteReader<'a> {
    cursor: Cursor<&'a [u8]>,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            cursor: Cursor::new(data),
        }
    }

    #[inline]
    pub fn read_u16(&mut self) -> Option<u16> {
        self.cursor.read_u16::<BigEndian>().ok()
    }

    #[inline]
    pub fn read_array<const N: usize>(&mut self) -> Option<[u8; N]> {
        let mut buf = [0u8; N];
        self.cursor.read_exact(&mut buf).ok()?;
        Some(buf)
    }
}

#[inline]
pub fn clamp<T: PartialOrd>(value: T, min: T, max: T) -> T {
    if value < min {
        min
    } else if value > max {
        max
    } else {
        value
    }
}

/// Scale a fraction in [0, 1] to an 8-bit channel, rounding to nearest.
#[inline]
pub fn unit_to_channel(value: f64) -> u8 {
    clamp((value * 255.0).round(), 0.0, 255.0) as u8
}
