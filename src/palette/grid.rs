//! Keyboard cursor movement across the two 8x8 palette blocks.
//!
//! Block A (0..=63) and block B (64..=127) sit side by side, each with rows
//! of eight. Moving right off column 7 of block A lands on the same row of
//! block B (+57) and moving left off column 0 of block B comes back (-57).

use wasm_bindgen::prelude::*;

use super::store::PALETTE_SIZE;
use crate::error::{PaletteError, Result};

const ROW: usize = 8;
const BLOCK: usize = 64;
/// Distance from column 7 of a block A row to column 0 of the same block B row.
const BLOCK_WRAP: usize = BLOCK - (ROW - 1);

#[wasm_bindgen]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up = 0,
    Down = 1,
    Left = 2,
    Right = 3,
}

impl Direction {
    /// Map a `KeyboardEvent.key` value to a direction (WASD or arrows).
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "w" | "ArrowUp" => Some(Direction::Up),
            "s" | "ArrowDown" => Some(Direction::Down),
            "a" | "ArrowLeft" => Some(Direction::Left),
            "d" | "ArrowRight" => Some(Direction::Right),
            _ => None,
        }
    }
}

/// Move the cursor one step. Returns `index` itself when blocked.
pub fn move_cursor(index: usize, direction: Direction) -> Result<usize> {
    if index >= PALETTE_SIZE {
        return Err(PaletteError::IndexOutOfRange(index));
    }

    let in_block_b = index >= BLOCK;
    let row = (index % BLOCK) / ROW;
    let column = index % ROW;

    let next = match direction {
        Direction::Up if row == 0 => index,
        Direction::Up => index - ROW,
        Direction::Down if row == ROW - 1 => index,
        Direction::Down => index + ROW,
        Direction::Left if column > 0 => index - 1,
        Direction::Left if in_block_b => index - BLOCK_WRAP,
        Direction::Left => index,
        Direction::Right if column < ROW - 1 => index + 1,
        Direction::Right if in_block_b => index,
        Direction::Right => index + BLOCK_WRAP,
    };

    Ok(next)
}
