//! Padded board addressing.
//!
//! The 64 real squares sit in rows 3..=10 and columns 3..=10 of a 15x15 grid,
//! row 3 holding rank 8. Every other cell is a sentinel. A knight jump or a
//! single slider step from any real square lands inside the grid, so
//! generation only ever asks one question of a destination: is it a sentinel.

use std::fmt;
use std::ops::{Add, AddAssign, Sub};
use std::str::FromStr;

use thiserror::Error;

/// Width of the padded grid. Moving one rank is a step of this size.
pub const WIDTH: i16 = 15;
/// Number of cells in the padded grid.
pub const CELLS: usize = 225;

const FIRST_ROW: usize = 3;
const FIRST_COL: usize = 3;

// Toward rank 8 is a negative step.
pub const NORTH: i16 = -WIDTH;
pub const SOUTH: i16 = WIDTH;
pub const EAST: i16 = 1;
pub const WEST: i16 = -1;
pub const NORTH_EAST: i16 = NORTH + EAST;
pub const NORTH_WEST: i16 = NORTH + WEST;
pub const SOUTH_EAST: i16 = SOUTH + EAST;
pub const SOUTH_WEST: i16 = SOUTH + WEST;

/// Rank (1..=8) of each cell, 0 for sentinels.
static RANKS: [u8; CELLS] = {
    let mut ranks = [0u8; CELLS];
    let mut i = 0;
    while i < CELLS {
        let row = i / 15;
        let col = i % 15;
        if row >= FIRST_ROW && row < FIRST_ROW + 8 && col >= FIRST_COL && col < FIRST_COL + 8 {
            ranks[i] = (8 - (row - FIRST_ROW)) as u8;
        }
        i += 1;
    }
    ranks
};

/// Error when parsing a [`Square`] name such as `e4`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SquareParseError {
    #[error("unexpected file char {0:?}")]
    UnexpectedFileChar(char),
    #[error("unexpected rank char {0:?}")]
    UnexpectedRankChar(char),
    #[error("invalid string length")]
    BadLength,
}

/// A cell of the padded grid. Ordering and equality follow the index, so a
/// square produced by arithmetic compares directly against a named one.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Square(u8);

impl Square {
    pub const A1: Square = Square::at(0, 1);
    pub const B1: Square = Square::at(1, 1);
    pub const C1: Square = Square::at(2, 1);
    pub const D1: Square = Square::at(3, 1);
    pub const E1: Square = Square::at(4, 1);
    pub const F1: Square = Square::at(5, 1);
    pub const G1: Square = Square::at(6, 1);
    pub const H1: Square = Square::at(7, 1);
    pub const A8: Square = Square::at(0, 8);
    pub const B8: Square = Square::at(1, 8);
    pub const C8: Square = Square::at(2, 8);
    pub const D8: Square = Square::at(3, 8);
    pub const E8: Square = Square::at(4, 8);
    pub const F8: Square = Square::at(5, 8);
    pub const G8: Square = Square::at(6, 8);
    pub const H8: Square = Square::at(7, 8);

    /// Real square from a file (0 = a) and rank (1..=8).
    ///
    /// Panics on out of range input.
    pub const fn at(file: u8, rank: u8) -> Square {
        assert!(file < 8 && rank >= 1 && rank <= 8, "square out of range");
        let row = FIRST_ROW + (8 - rank as usize);
        let col = FIRST_COL + file as usize;
        Square((row * 15 + col) as u8)
    }

    /// Any cell of the padded grid, sentinel or not.
    pub fn from_index(index: usize) -> Option<Square> {
        if index < CELLS {
            Some(Square(index as u8))
        } else {
            None
        }
    }

    #[inline(always)]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// True for the 64 real squares, false for sentinels.
    #[inline(always)]
    pub fn is_valid(self) -> bool {
        RANKS[self.0 as usize] != 0
    }

    /// Rank 1..=8, or 0 for a sentinel.
    #[inline(always)]
    pub fn rank(self) -> u8 {
        RANKS[self.0 as usize]
    }

    /// File 0..8 (0 = a). Meaningless for sentinels.
    #[inline(always)]
    pub fn file(self) -> u8 {
        (self.0 as usize % 15).wrapping_sub(FIRST_COL) as u8
    }

    /// All 64 real squares, a1 to h8 rank by rank.
    pub fn all() -> impl Iterator<Item = Square> {
        (1..=8u8).flat_map(|rank| (0..8u8).map(move |file| Square::at(file, rank)))
    }
}

impl Add<i16> for Square {
    type Output = Square;

    /// Raw offset. The result may be a sentinel; it is never bounds-checked
    /// beyond staying inside the padded grid.
    #[inline(always)]
    fn add(self, rhs: i16) -> Square {
        let index = self.0 as i16 + rhs;
        debug_assert!(
            (0..CELLS as i16).contains(&index),
            "offset {rhs} from {self:?} leaves the padded grid"
        );
        Square(index as u8)
    }
}

impl AddAssign<i16> for Square {
    #[inline(always)]
    fn add_assign(&mut self, rhs: i16) {
        *self = *self + rhs;
    }
}

impl Sub for Square {
    type Output = i16;

    #[inline(always)]
    fn sub(self, rhs: Square) -> i16 {
        self.0 as i16 - rhs.0 as i16
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "{}{}", (b'a' + self.file()) as char, self.rank())
        } else {
            write!(f, "#{}", self.0)
        }
    }
}

impl fmt::Debug for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Square({self})")
    }
}

impl FromStr for Square {
    type Err = SquareParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        let (Some(f), Some(r), None) = (chars.next(), chars.next(), chars.next()) else {
            return Err(SquareParseError::BadLength);
        };
        if !('a'..='h').contains(&f) {
            return Err(SquareParseError::UnexpectedFileChar(f));
        }
        if !('1'..='8').contains(&r) {
            return Err(SquareParseError::UnexpectedRankChar(r));
        }
        Ok(Square::at(f as u8 - b'a', r as u8 - b'0'))
    }
}

#[cfg(test)]
#[path = "square_tests.rs"]
mod square_tests;
