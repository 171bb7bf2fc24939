//! Tetromino catalog: 4x4 occupancy matrices, bounding-box rotation, random selection.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Tetromino kinds in catalog order; the index doubles as the colour index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeKind {
    I,
    T,
    O,
    Z,
    S,
    L,
    J,
}

const fn matrix(rows: [[u8; 4]; 4]) -> Shape {
    let mut cells = [[false; 4]; 4];
    let mut r = 0;
    while r < 4 {
        let mut c = 0;
        while c < 4 {
            cells[r][c] = rows[r][c] != 0;
            c += 1;
        }
        r += 1;
    }
    Shape { cells }
}

const SHAPES: [Shape; 7] = [
    matrix([[0, 0, 0, 0], [1, 1, 1, 1], [0, 0, 0, 0], [0, 0, 0, 0]]),
    matrix([[0, 1, 0, 0], [1, 1, 1, 0], [0, 0, 0, 0], [0, 0, 0, 0]]),
    matrix([[0, 0, 0, 0], [0, 1, 1, 0], [0, 1, 1, 0], [0, 0, 0, 0]]),
    matrix([[1, 1, 0, 0], [0, 1, 1, 0], [0, 0, 0, 0], [0, 0, 0, 0]]),
    matrix([[0, 1, 1, 0], [1, 1, 0, 0], [0, 0, 0, 0], [0, 0, 0, 0]]),
    matrix([[1, 0, 0, 0], [1, 1, 1, 0], [0, 0, 0, 0], [0, 0, 0, 0]]),
    matrix([[0, 0, 1, 0], [1, 1, 1, 0], [0, 0, 0, 0], [0, 0, 0, 0]]),
];

impl ShapeKind {
    pub const ALL: [Self; 7] = [Self::I, Self::T, Self::O, Self::Z, Self::S, Self::L, Self::J];

    /// Colour index 0..7 for `Theme::piece_color`.
    #[inline]
    pub fn color_index(self) -> u8 {
        self as u8
    }

    /// Spawn orientation.
    #[inline]
    pub fn shape(self) -> Shape {
        SHAPES[self as usize]
    }
}

/// 4x4 occupancy matrix, `cells[row][col]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shape {
    cells: [[bool; 4]; 4],
}

impl Shape {
    /// 90° clockwise around the centre of the 4x4 box: `rotated[col][3 - row] = cells[row][col]`.
    /// No wall kicks; the caller decides whether the result fits.
    pub fn rotate(&self) -> Self {
        let mut rotated = [[false; 4]; 4];
        for (row, line) in self.cells.iter().enumerate() {
            for (col, &filled) in line.iter().enumerate() {
                rotated[col][3 - row] = filled;
            }
        }
        Self { cells: rotated }
    }

    /// (col, row) of every occupied cell, row-major.
    pub fn occupied(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.cells.iter().enumerate().flat_map(|(row, line)| {
            line.iter()
                .enumerate()
                .filter(|(_, filled)| **filled)
                .map(move |(col, _)| (col, row))
        })
    }

    #[inline]
    pub fn is_filled(&self, col: usize, row: usize) -> bool {
        self.cells
            .get(row)
            .and_then(|line| line.get(col))
            .copied()
            .unwrap_or(false)
    }
}

/// A piece in play (or queued): kind, current orientation and board-relative origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Piece {
    pub kind: ShapeKind,
    pub shape: Shape,
    pub x: i32,
    pub y: i32,
}

impl Piece {
    pub fn new(kind: ShapeKind) -> Self {
        Self {
            kind,
            shape: kind.shape(),
            x: 0,
            y: 0,
        }
    }

    #[inline]
    pub fn color_index(&self) -> u8 {
        self.kind.color_index()
    }
}

/// Uniform random piece source.
#[derive(Debug, Clone)]
pub struct PieceGenerator {
    rng: StdRng,
}

impl PieceGenerator {
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Reproducible sequence (for `--seed` and tests).
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn next(&mut self) -> Piece {
        let kind = ShapeKind::ALL[self.rng.gen_range(0..ShapeKind::ALL.len())];
        Piece::new(kind)
    }
}

impl Default for PieceGenerator {
    fn default() -> Self {
        Self::from_entropy()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_shape_has_four_cells() {
        for kind in ShapeKind::ALL {
            assert_eq!(kind.shape().occupied().count(), 4, "{kind:?}");
        }
    }

    #[test]
    fn test_four_rotations_is_identity() {
        for kind in ShapeKind::ALL {
            let s = kind.shape();
            assert_eq!(s.rotate().rotate().rotate().rotate(), s, "{kind:?}");
        }
    }

    #[test]
    fn test_rotate_does_not_mutate() {
        let t = ShapeKind::T.shape();
        let r = t.rotate();
        assert_eq!(t, ShapeKind::T.shape());
        assert_ne!(r, t);
    }

    #[test]
    fn test_rotate_i_becomes_vertical() {
        let r = ShapeKind::I.shape().rotate();
        // Row 1 maps to column 3 - 1 = 2.
        let cells: Vec<_> = r.occupied().collect();
        assert_eq!(cells, vec![(2, 0), (2, 1), (2, 2), (2, 3)]);
    }

    #[test]
    fn test_o_rotation_is_stable() {
        let o = ShapeKind::O.shape();
        assert_eq!(o.rotate(), o);
    }

    #[test]
    fn test_color_index_matches_catalog_order() {
        for (i, kind) in ShapeKind::ALL.iter().enumerate() {
            assert_eq!(kind.color_index() as usize, i);
        }
    }

    #[test]
    fn test_seeded_generator_is_reproducible() {
        let mut a = PieceGenerator::seeded(42);
        let mut b = PieceGenerator::seeded(42);
        for _ in 0..50 {
            assert_eq!(a.next().kind, b.next().kind);
        }
    }

    #[test]
    fn test_generator_covers_all_kinds() {
        let mut generator = PieceGenerator::seeded(7);
        let mut seen = [false; 7];
        for _ in 0..500 {
            seen[generator.next().color_index() as usize] = true;
        }
        assert!(seen.iter().all(|s| *s));
    }
}
