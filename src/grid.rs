//! # Geometry
//!
//! Fixed-size toroidal coordinate space. Every edge connects to the
//! opposite edge, so stepping off the field re-enters on the other side.

use crate::config::GRID_SIZE;

/// A cell on the play field. Both coordinates lie in `[0, GRID_SIZE - 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Position {
    pub x: u8,
    pub y: u8,
}

impl Position {
    pub const fn new(x: u8, y: u8) -> Self {
        Self { x, y }
    }

    /// Centre cell of the field.
    pub const fn center() -> Self {
        Self::new(GRID_SIZE / 2, GRID_SIZE / 2)
    }

    /// The neighbouring cell in `direction`, wrapping at the edges.
    /// Exactly one coordinate changes.
    pub const fn step(self, direction: Direction) -> Self {
        match direction {
            Direction::Up => Self::new(self.x, wrap_decrement(self.y)),
            Direction::Down => Self::new(self.x, wrap_increment(self.y)),
            Direction::Left => Self::new(wrap_decrement(self.x), self.y),
            Direction::Right => Self::new(wrap_increment(self.x), self.y),
        }
    }

    /// Packs the cell into a single word for atomic storage.
    #[inline]
    pub(crate) const fn pack(self) -> u16 {
        (self.x as u16) << 8 | self.y as u16
    }

    #[inline]
    pub(crate) const fn unpack(word: u16) -> Self {
        Self::new((word >> 8) as u8, word as u8)
    }
}

/// `v - 1`, or `GRID_SIZE - 1` when `v` is 0.
#[inline]
pub const fn wrap_decrement(v: u8) -> u8 {
    if v == 0 {
        GRID_SIZE - 1
    } else {
        v - 1
    }
}

/// `v + 1`, or 0 when `v` is `GRID_SIZE - 1`.
#[inline]
pub const fn wrap_increment(v: u8) -> u8 {
    if v >= GRID_SIZE - 1 {
        0
    } else {
        v + 1
    }
}

/// `v - n` modulo `GRID_SIZE`.
#[inline]
pub const fn wrap_sub(v: u8, n: u8) -> u8 {
    let size = GRID_SIZE as u16;
    ((v as u16 + size - (n as u16 % size)) % size) as u8
}

/// Heading of the snake. `Up` decreases `y` (row 0 is the top of the screen).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Direction {
    Up = 0,
    Down = 1,
    Left = 2,
    Right = 3,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    pub const fn opposite(self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    /// Decodes the value stored by `as u8`. Out-of-range values fall back to
    /// `Right`, the reset heading.
    pub(crate) const fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Direction::Up,
            1 => Direction::Down,
            2 => Direction::Left,
            _ => Direction::Right,
        }
    }
}

// ---------------------------------------------------------------------------
// Unit tests (host-only)
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const LAST: u8 = GRID_SIZE - 1;

    #[test]
    fn test_step_changes_exactly_one_axis() {
        for x in 0..GRID_SIZE {
            for y in 0..GRID_SIZE {
                let from = Position::new(x, y);
                for dir in Direction::ALL {
                    let to = from.step(dir);
                    let dx = (to.x != from.x) as u8;
                    let dy = (to.y != from.y) as u8;
                    assert_eq!(dx + dy, 1, "{:?} -> {:?} via {:?}", from, to, dir);
                    assert!(to.x < GRID_SIZE && to.y < GRID_SIZE);
                    // Stepping back returns to the start
                    assert_eq!(to.step(dir.opposite()), from);
                }
            }
        }
    }

    #[test]
    fn test_wrap_at_edges() {
        assert_eq!(Position::new(5, 0).step(Direction::Up), Position::new(5, LAST));
        assert_eq!(Position::new(5, LAST).step(Direction::Down), Position::new(5, 0));
        assert_eq!(Position::new(0, 7).step(Direction::Left), Position::new(LAST, 7));
        assert_eq!(Position::new(LAST, 7).step(Direction::Right), Position::new(0, 7));
    }

    #[test]
    fn test_interior_moves_by_one() {
        let p = Position::new(4, 4);
        assert_eq!(p.step(Direction::Up), Position::new(4, 3));
        assert_eq!(p.step(Direction::Down), Position::new(4, 5));
        assert_eq!(p.step(Direction::Left), Position::new(3, 4));
        assert_eq!(p.step(Direction::Right), Position::new(5, 4));
    }

    #[test]
    fn test_wrap_sub() {
        assert_eq!(wrap_sub(8, 3), 5);
        assert_eq!(wrap_sub(1, 3), LAST - 1);
        assert_eq!(wrap_sub(0, 0), 0);
    }

    #[test]
    fn test_pack_roundtrip_and_direction_decode() {
        let p = Position::new(LAST, 3);
        assert_eq!(Position::unpack(p.pack()), p);
        for dir in Direction::ALL {
            assert_eq!(Direction::from_u8(dir as u8), dir);
        }
        assert_eq!(Direction::from_u8(200), Direction::Right);
    }
}
