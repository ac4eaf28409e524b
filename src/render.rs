//! # Presentation Contract
//!
//! The display backend is an external collaborator. It receives an owned
//! [`Snapshot`] once per render period and draws it; it never sees the live
//! [`GameState`](crate::state::GameState), so it cannot mutate it.

use heapless::Vec;

use crate::config::{GRID_SIZE, MAX_LEN};
use crate::grid::{Direction, Position};

/// Copy of the game state taken for one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// Head first.
    pub snake: Vec<Position, MAX_LEN>,
    pub fruit: Vec<Position, MAX_LEN>,
    pub direction: Direction,
    pub score: u16,
    pub running: bool,
    pub lose: bool,
}

/// What occupies a cell in a frame. Snake segments win over fruit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Cell {
    Empty,
    Head,
    Body,
    Fruit,
}

impl Cell {
    /// One-character glyph used by text frames.
    pub const fn glyph(self) -> u8 {
        match self {
            Cell::Empty => b'.',
            Cell::Head => b'@',
            Cell::Body => b'o',
            Cell::Fruit => b'*',
        }
    }
}

impl Snapshot {
    pub fn cell(&self, pos: Position) -> Cell {
        match self.snake.iter().position(|&s| s == pos) {
            Some(0) => Cell::Head,
            Some(_) => Cell::Body,
            None if self.fruit.contains(&pos) => Cell::Fruit,
            None => Cell::Empty,
        }
    }

    /// Row `y` as text glyphs, left to right.
    pub fn row(&self, y: u8) -> [u8; GRID_SIZE as usize] {
        let mut row = [Cell::Empty.glyph(); GRID_SIZE as usize];
        for (x, slot) in row.iter_mut().enumerate() {
            *slot = self.cell(Position::new(x as u8, y)).glyph();
        }
        row
    }
}

/// Draws frames. Implemented by display drivers.
pub trait Presenter {
    type Error;

    fn present(&mut self, frame: &Snapshot) -> Result<(), Self::Error>;
}

// ---------------------------------------------------------------------------
// Unit tests (host-only)
// ---------------------------------------------------------------------------
