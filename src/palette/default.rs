//! Generated startup palette.

use super::store::{Palette, PALETTE_SIZE};
use crate::color::{Hsv, Rgb};

/// Build the palette the editor starts with.
///
/// Index 0 is black and 1..=3 are a white ramp. 4..=63 walk the hue wheel
/// at full and then half brightness. 64..=127 walk it again at full
/// brightness with saturation easing from pastel to vivid.
pub fn default_palette() -> Palette {
    Palette::from(std::array::from_fn::<_, PALETTE_SIZE, _>(default_color))
}

fn default_color(index: usize) -> Rgb {
    match index {
        0 => Rgb::BLACK,
        1..=3 => {
            let level = (index * 85) as u8;
            Rgb::new(level, level, level)
        }
        4..=63 => {
            let step = index - 4;
            let hue = (step % 30) as f64 * 12.0;
            let value = if step < 30 { 1.0 } else { 0.5 };
            Hsv::new(hue, 1.0, value).to_rgb()
        }
        _ => {
            let step = index - 64;
            let hue = (step % 16) as f64 * 22.5;
            let saturation = 0.25 + (step / 16) as f64 * 0.25;
            Hsv::new(hue, saturation, 1.0).to_rgb()
        }
    }
}
