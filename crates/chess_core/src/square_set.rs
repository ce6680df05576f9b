//! Set of squares over the padded grid.
//!
//! Four 64-bit words cover all 225 cells; bit `i` stands for the cell with
//! index `i`. Iteration yields squares in ascending index order.

use crate::square::{CELLS, Square};

const WORDS: usize = CELLS.div_ceil(64);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct SquareSet([u64; WORDS]);

impl SquareSet {
    pub const EMPTY: SquareSet = SquareSet([0; WORDS]);

    /// Create a set with a single square.
    #[inline(always)]
    pub fn from_square(sq: Square) -> Self {
        let mut set = Self::EMPTY;
        set.insert(sq);
        set
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|&w| w == 0)
    }

    #[inline(always)]
    pub fn contains(&self, sq: Square) -> bool {
        let i = sq.index();
        self.0[i / 64] & (1u64 << (i % 64)) != 0
    }

    #[inline(always)]
    pub fn insert(&mut self, sq: Square) {
        let i = sq.index();
        self.0[i / 64] |= 1u64 << (i % 64);
    }

    #[inline(always)]
    pub fn remove(&mut self, sq: Square) {
        let i = sq.index();
        self.0[i / 64] &= !(1u64 << (i % 64));
    }

    /// Number of squares in the set.
    #[inline(always)]
    pub fn len(&self) -> u32 {
        self.0.iter().map(|w| w.count_ones()).sum()
    }

    /// Get and remove the lowest-index square.
    #[inline(always)]
    pub fn pop_first(&mut self) -> Option<Square> {
        for (w, word) in self.0.iter_mut().enumerate() {
            if *word != 0 {
                let bit = word.trailing_zeros() as usize;
                *word &= *word - 1;
                return Square::from_index(w * 64 + bit);
            }
        }
        None
    }
}

/// Iterator over the squares of a set, lowest index first.
impl Iterator for SquareSet {
    type Item = Square;

    #[inline(always)]
    fn next(&mut self) -> Option<Self::Item> {
        self.pop_first()
    }
}

impl FromIterator<Square> for SquareSet {
    fn from_iter<I: IntoIterator<Item = Square>>(iter: I) -> Self {
        let mut set = SquareSet::EMPTY;
        for sq in iter {
            set.insert(sq);
        }
        set
    }
}

#[cfg(test)]
#[path = "square_set_tests.rs"]
mod square_set_tests;
