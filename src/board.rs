//! Board: locked cells, placement legality, row clearing.

use crate::pieces::Shape;

/// Playfield width in cells.
pub const WIDTH: usize = 10;
/// Playfield height in cells.
pub const HEIGHT: usize = 20;

/// Single cell: empty or locked with a colour index (0..7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cell {
    #[default]
    Empty,
    Filled(u8),
}

impl Cell {
    #[inline]
    pub fn is_filled(self) -> bool {
        matches!(self, Self::Filled(_))
    }
}

/// Grid of locked cells. `rows[0]` is the top row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    rows: [[Cell; WIDTH]; HEIGHT],
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    pub fn new() -> Self {
        Self {
            rows: [[Cell::Empty; WIDTH]; HEIGHT],
        }
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> Option<Cell> {
        self.rows.get(y).and_then(|row| row.get(x)).copied()
    }

    /// True if every occupied cell of `shape` at offset (x, y) is inside the side and bottom
    /// walls and does not overlap a locked cell. Cells above the top edge are always passable.
    pub fn is_valid_position(&self, shape: &Shape, x: i32, y: i32) -> bool {
        shape.occupied().all(|(col, row)| {
            let bx = x + col as i32;
            let by = y + row as i32;
            if bx < 0 || bx >= WIDTH as i32 || by >= HEIGHT as i32 {
                return false;
            }
            by < 0 || !self.get(bx as usize, by as usize).is_some_and(Cell::is_filled)
        })
    }

    /// Write the shape into the grid. Cells above row 0 (or outside the walls) are dropped.
    pub fn lock(&mut self, shape: &Shape, color_index: u8, x: i32, y: i32) {
        for (col, row) in shape.occupied() {
            let bx = x + col as i32;
            let by = y + row as i32;
            if by < 0 || bx < 0 || bx >= WIDTH as i32 || by >= HEIGHT as i32 {
                continue;
            }
            self.rows[by as usize][bx as usize] = Cell::Filled(color_index);
        }
    }

    fn row_complete(&self, y: usize) -> bool {
        self.rows[y].iter().all(|c| c.is_filled())
    }

    /// Indices of complete rows, bottom-up. Does not modify the board.
    pub fn completed_rows(&self) -> Vec<usize> {
        (0..HEIGHT).rev().filter(|&y| self.row_complete(y)).collect()
    }

    /// Remove every complete row, shifting the rows above down. Returns the number removed.
    pub fn clear_completed_rows(&mut self) -> usize {
        let mut cleared = 0;
        let mut y = HEIGHT;
        while y > 0 {
            let row = y - 1;
            if self.row_complete(row) {
                // Same index is re-examined: it now holds the row that was above.
                self.rows.copy_within(0..row, 1);
                self.rows[0] = [Cell::Empty; WIDTH];
                cleared += 1;
            } else {
                y -= 1;
            }
        }
        cleared
    }

    pub fn rows(&self) -> &[[Cell; WIDTH]; HEIGHT] {
        &self.rows
    }

    #[cfg(test)]
    pub fn fill_row(&mut self, y: usize, color_index: u8) {
        self.rows[y] = [Cell::Filled(color_index); WIDTH];
    }

    #[cfg(test)]
    pub fn set(&mut self, x: usize, y: usize, cell: Cell) {
        self.rows[y][x] = cell;
    }
}
