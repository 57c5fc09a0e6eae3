//! Color conversions between hex strings, RGB triplets and HSV.
//!
//! The palette, the sysex protocol and the palette file all carry 8-bit RGB.
//! Hex strings come from the page's picker, and HSV drives the color wheel.

use wasm_bindgen::prelude::*;

use crate::error::{PaletteError, Result};
use crate::utils::unit_to_channel;

/// An RGB triplet, one byte per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb { r: 0, g: 0, b: 0 };

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `RRGGBB` or `#RRGGBB` (either case).
    pub fn from_hex(hex: &str) -> Result<Self> {
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        if digits.len() != 6 || !digits.bytes().all(|c| c.is_ascii_hexdigit()) {
            return Err(PaletteError::InvalidHex(hex.to_string()));
        }

        let value = u32::from_str_radix(digits, 16)
            .map_err(|_| PaletteError::InvalidHex(hex.to_string()))?;

        Ok(Self::new(
            ((value >> 16) & 0xFF) as u8,
            ((value >> 8) & 0xFF) as u8,
            (value & 0xFF) as u8,
        ))
    }

    /// Format as lowercase `#rrggbb`.
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Convert using the max/min channel formula.
    /// Achromatic colors get hue 0 and saturation 0.
    pub fn to_hsv(self) -> Hsv {
        let r = self.r as f64 / 255.0;
        let g = self.g as f64 / 255.0;
        let b = self.b as f64 / 255.0;

        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let delta = max - min;

        let h = if delta == 0.0 {
            0.0
        } else if max == r {
            60.0 * ((g - b) / delta).rem_euclid(6.0)
        } else if max == g {
            60.0 * ((b - r) / delta + 2.0)
        } else {
            60.0 * ((r - g) / delta + 4.0)
        };

        let s = if max == 0.0 { 0.0 } else { delta / max };

        Hsv {
            h: if h >= 360.0 { h - 360.0 } else { h },
            s,
            v: max,
        }
    }

    pub fn to_array(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }
}

impl From<[u8; 3]> for Rgb {
    fn from([r, g, b]: [u8; 3]) -> Self {
        Self::new(r, g, b)
    }
}

/// HSV color as used by the picker: hue in degrees [0, 360),
/// saturation and value as fractions [0, 1].
#[wasm_bindgen]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Hsv {
    pub h: f64,
    pub s: f64,
    pub v: f64,
}

#[wasm_bindgen]
impl Hsv {
    #[wasm_bindgen(constructor)]
    pub fn new(h: f64, s: f64, v: f64) -> Self {
        Self { h, s, v }
    }

    /// Convert to a `#rrggbb` string.
    #[wasm_bindgen(js_name = toHex)]
    pub fn to_hex(&self) -> String {
        self.to_rgb().to_hex()
    }
}

impl Hsv {
    /// Convert back to 8-bit RGB. Hue wraps, saturation and value clamp.
    pub fn to_rgb(self) -> Rgb {
        let h = self.h.rem_euclid(360.0);
        let s = self.s.clamp(0.0, 1.0);
        let v = self.v.clamp(0.0, 1.0);

        let c = v * s;
        let x = c * (1.0 - ((h / 60.0).rem_euclid(2.0) - 1.0).abs());
        let m = v - c;

        let (r, g, b) = match (h / 60.0) as u32 {
            0 => (c, x, 0.0),
            1 => (x, c, 0.0),
            2 => (0.0, c, x),
            3 => (0.0, x, c),
            4 => (x, 0.0, c),
            _ => (c, 0.0, x),
        };

        Rgb::new(
            unit_to_channel(r + m),
            unit_to_channel(g + m),
            unit_to_channel(b + m),
        )
    }
}

pub fn hex_to_rgb(hex: &str) -> Result<Rgb> {
    Rgb::from_hex(hex)
}

pub fn hex_to_hsv(hex: &str) -> Result<Hsv> {
    Rgb::from_hex(hex).map(Rgb::to_hsv)
}

pub fn rgb_to_hex(rgb: Rgb) -> String {
    rgb.to_hex()
}

pub fn hsv_to_hex(hsv: Hsv) -> String {
    hsv.to_rgb().to_hex()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex() {
        assert_eq!(hex_to_rgb("#ff8000").unwrap(), Rgb::new(255, 128, 0));
        assert_eq!(hex_to_rgb("0A0b0C").unwrap(), Rgb::new(10, 11, 12));
    }

    #[test]
    fn test_parse_hex_rejects_malformed() {
        for bad in ["", "#", "#fff", "12345", "1234567", "#gg0000", "+12345", "#-12345", "##123456"] {
            assert_eq!(
                hex_to_rgb(bad),
                Err(PaletteError::InvalidHex(bad.to_string())),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_hex_round_trip() {
        for value in (0u32..=0xFF_FFFF).step_by(0x1_0101) {
            let hex = format!("{value:06X}");
            let rgb = hex_to_rgb(&hex).unwrap();
            let back = rgb_to_hex(rgb);
            assert_eq!(back.trim_start_matches('#'), hex.to_lowercase());
        }
    }

    #[test]
    fn test_hsv_primaries() {
        let red = hex_to_hsv("#ff0000").unwrap();
        assert_eq!((red.h, red.s, red.v), (0.0, 1.0, 1.0));

        let green = hex_to_hsv("#00ff00").unwrap();
        assert_eq!(green.h, 120.0);

        let blue = hex_to_hsv("#0000ff").unwrap();
        assert_eq!(blue.h, 240.0);

        let magenta = hex_to_hsv("#ff00ff").unwrap();
        assert_eq!(magenta.h, 300.0);
    }

    #[test]
    fn test_hsv_achromatic() {
        let gray = hex_to_hsv("#808080").unwrap();
        assert_eq!(gray.h, 0.0);
        assert_eq!(gray.s, 0.0);
        assert!((gray.v - 128.0 / 255.0).abs() < 1e-9);

        let black = hex_to_hsv("#000000").unwrap();
        assert_eq!((black.h, black.s, black.v), (0.0, 0.0, 0.0));
    }

    #[test]
    fn test_hsv_round_trip() {
        for rgb in [
            Rgb::new(0, 0, 0),
            Rgb::new(255, 255, 255),
            Rgb::new(12, 200, 99),
            Rgb::new(250, 3, 128),
            Rgb::new(1, 2, 3),
            Rgb::new(63, 0, 63),
        ] {
            assert_eq!(rgb.to_hsv().to_rgb(), rgb);
        }
    }

    #[test]
    fn test_hsv_to_hex_wraps_hue() {
        assert_eq!(hsv_to_hex(Hsv::new(360.0, 1.0, 1.0)), "#ff0000");
        assert_eq!(hsv_to_hex(Hsv::new(-120.0, 1.0, 1.0)), "#0000ff");
    }
}
