use log::debug;

use crate::error::ConfigError;
use crate::shape::{Matrix, ShapeKind};

// ============================================================================
// Types
// ============================================================================

/// Grid coordinate: `x` is the column, `y` the row (row 0 at the top).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Position {
    pub x: i16,
    pub y: i16,
}

impl Position {
    pub fn new(x: i16, y: i16) -> Self {
        Self { x, y }
    }

    /// Shifted position, or `None` if either coordinate leaves the `i16` range.
    pub fn checked_offset(self, dx: i16, dy: i16) -> Option<Self> {
        Some(Self {
            x: self.x.checked_add(dx)?,
            y: self.y.checked_add(dy)?,
        })
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum CellState {
    #[default]
    Empty,
    Filled(ShapeKind),
}

impl CellState {
    pub fn is_filled(self) -> bool {
        matches!(self, CellState::Filled(_))
    }
}

/// Absolute board positions of every filled sub-cell of `matrix` at `anchor`.
/// Sub-cells whose coordinates would overflow are skipped.
pub fn cells_at(matrix: &Matrix, anchor: Position) -> impl Iterator<Item = Position> + '_ {
    matrix
        .filled()
        .filter_map(move |(r, c)| anchor.checked_offset(c as i16, r as i16))
}

// ============================================================================
// Board
// ============================================================================

/// The well of locked cells. Its dimensions are fixed at construction.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Board {
    width: usize,
    height: usize,
    grid: Vec<Vec<CellState>>,
}

impl Board {
    pub fn new(width: usize, height: usize) -> Result<Self, ConfigError> {
        if width == 0 || height == 0 || width > i16::MAX as usize || height > i16::MAX as usize {
            return Err(ConfigError::InvalidDimensions { width, height });
        }
        Ok(Self {
            width,
            height,
            grid: vec![vec![CellState::Empty; width]; height],
        })
    }

    /// Builds a board from explicit rows, top row first.
    pub fn from_rows(grid: Vec<Vec<CellState>>) -> Result<Self, ConfigError> {
        let height = grid.len();
        let width = grid.first().map(Vec::len).unwrap_or(0);
        let mut board = Self::new(width, height)?;
        if let Some((row, r)) = grid.iter().enumerate().find(|(_, r)| r.len() != width) {
            return Err(ConfigError::RaggedBoard {
                row,
                len: r.len(),
                width,
            });
        }
        board.grid = grid;
        Ok(board)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Cell at `(x, y)`, or `None` outside the grid.
    pub fn cell(&self, x: i16, y: i16) -> Option<CellState> {
        if x < 0 || y < 0 {
            return None;
        }
        self.grid.get(y as usize)?.get(x as usize).copied()
    }

    /// Rows top to bottom.
    pub fn rows(&self) -> &[Vec<CellState>] {
        &self.grid
    }

    /// Whether `matrix` anchored at `anchor` fits: every filled sub-cell must
    /// be inside the side walls, above the floor, and on an empty cell.
    ///
    /// Sub-cells above row 0 are allowed and count as empty.
    pub fn is_valid_placement(&self, matrix: &Matrix, anchor: Position) -> bool {
        for (r, c) in matrix.filled() {
            let Some(block) = anchor.checked_offset(c as i16, r as i16) else {
                return false;
            };
            // Check side walls
            if block.x < 0 || block.x as usize >= self.width {
                return false;
            }
            // Nothing is locked above the top row
            if block.y < 0 {
                continue;
            }
            // Check floor and collision with locked cells
            let y = block.y as usize;
            if y >= self.height || self.grid[y][block.x as usize].is_filled() {
                return false;
            }
        }
        true
    }

    /// Writes the piece's filled sub-cells into the grid.
    ///
    /// The caller guarantees the placement was valid; sub-cells above row 0
    /// have nowhere to go and are dropped.
    pub fn lock_piece(&mut self, matrix: &Matrix, anchor: Position, kind: ShapeKind) {
        for block in cells_at(matrix, anchor) {
            if block.y < 0 {
                continue;
            }
            if let Some(cell) = self
                .grid
                .get_mut(block.y as usize)
                .and_then(|row| row.get_mut(block.x as usize))
            {
                *cell = CellState::Filled(kind);
            }
        }
        debug!("locked {:?} at ({}, {})", kind, anchor.x, anchor.y);
    }

    /// Removes every full row and refills from the top with empty rows.
    /// Surviving rows keep their relative order. Returns the number removed.
    pub fn clear_completed_rows(&mut self) -> usize {
        // Snapshot full rows before touching the grid
        let complete: Vec<usize> = (0..self.height)
            .filter(|&y| self.is_row_complete(y))
            .collect();
        if complete.is_empty() {
            return 0;
        }

        let mut y = 0;
        self.grid.retain(|_| {
            let keep = !complete.contains(&y);
            y += 1;
            keep
        });
        // Refill from the top
        let mut grid = vec![vec![CellState::Empty; self.width]; complete.len()];
        grid.append(&mut self.grid);
        self.grid = grid;

        debug!("cleared rows {:?}", complete);
        complete.len()
    }

    pub fn is_row_complete(&self, y: usize) -> bool {
        self.grid
            .get(y)
            .is_some_and(|row| row.iter().all(|cell| cell.is_filled()))
    }

    pub fn filled_count_in_row(&self, y: usize) -> usize {
        self.grid
            .get(y)
            .map(|row| row.iter().filter(|cell| cell.is_filled()).count())
            .unwrap_or(0)
    }

    pub fn total_filled_cells(&self) -> usize {
        self.grid.iter().flatten().filter(|cell| cell.is_filled()).count()
    }

    pub fn clear(&mut self) {
        for row in &mut self.grid {
            row.fill(CellState::Empty);
        }
    }
}

// ============================================================================
// Test Helpers
// ============================================================================

pub mod test_helpers {
    use super::*;

    pub fn empty_board(width: usize, height: usize) -> Board {
        Board {
            width,
            height,
            grid: vec![vec![CellState::Empty; width]; height],
        }
    }

    pub fn fill_row(board: &mut Board, y: usize) {
        board.grid[y].fill(CellState::Filled(ShapeKind::T));
    }

    pub fn fill_row_with_gap(board: &mut Board, y: usize, gap_x: usize) {
        fill_row(board, y);
        board.grid[y][gap_x] = CellState::Empty;
    }

    pub fn set(board: &mut Board, x: usize, y: usize) {
        board.grid[y][x] = CellState::Filled(ShapeKind::T);
    }
}
