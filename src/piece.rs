use log::trace;
use rand::Rng;

use crate::board::{cells_at, Board, Position};
use crate::shape::{Matrix, Rotation, Shape, ShapeCatalogue, ShapeKind};

// ============================================================================
// Active Piece
// ============================================================================

/// The falling piece: its base shape, the matrix for its current
/// orientation, and where the top-left of that matrix sits on the board.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ActivePiece {
    shape: Shape,
    matrix: Matrix,
    pub position: Position,
    pub rotation: Rotation,
}

impl ActivePiece {
    pub fn new_at(shape: Shape, x: i16, y: i16) -> Self {
        Self {
            matrix: shape.oriented(Rotation::Deg0),
            shape,
            position: Position { x, y },
            rotation: Rotation::Deg0,
        }
    }

    pub fn kind(&self) -> ShapeKind {
        self.shape.kind()
    }

    pub fn matrix(&self) -> &Matrix {
        &self.matrix
    }

    /// Absolute board positions of the filled sub-cells.
    pub fn blocks(&self) -> Vec<Position> {
        cells_at(&self.matrix, self.position).collect()
    }
}

// ============================================================================
// Controller
// ============================================================================

/// Owns the active piece and mediates every change to it against a board.
#[derive(Clone, Debug)]
pub struct PieceController {
    active: ActivePiece,
    spawn_x: i16,
}

/// Centered spawn column for a board of `width` columns.
pub fn spawn_column(width: usize) -> i16 {
    (width / 2).saturating_sub(1) as i16
}

impl PieceController {
    /// Controller with `shape` at the spawn point of a `board_width` board.
    pub fn new(board_width: usize, shape: Shape) -> Self {
        let spawn_x = spawn_column(board_width);
        Self {
            active: ActivePiece::new_at(shape, spawn_x, 0),
            spawn_x,
        }
    }

    /// Controller with a piece placed explicitly.
    pub fn with_piece(board_width: usize, piece: ActivePiece) -> Self {
        Self {
            active: piece,
            spawn_x: spawn_column(board_width),
        }
    }

    pub fn active(&self) -> &ActivePiece {
        &self.active
    }

    pub fn spawn_x(&self) -> i16 {
        self.spawn_x
    }

    /// Shifts the piece by `(dx, dy)` if the board allows it.
    pub fn try_move(&mut self, board: &Board, dx: i16, dy: i16) -> bool {
        let Some(target) = self.active.position.checked_offset(dx, dy) else {
            return false;
        };
        if !board.is_valid_placement(&self.active.matrix, target) {
            trace!("move ({dx}, {dy}) rejected at ({}, {})", target.x, target.y);
            return false;
        }
        self.active.position = target;
        true
    }

    /// Turns the piece a quarter clockwise in place. The new matrix is always
    /// derived from the base shape; there is no wall kick.
    pub fn try_rotate(&mut self, board: &Board) -> bool {
        let rotation = self.active.rotation.next();
        let matrix = self.active.shape.oriented(rotation);
        if !board.is_valid_placement(&matrix, self.active.position) {
            trace!("rotation to {}° rejected", rotation.degrees());
            return false;
        }
        self.active.matrix = matrix;
        self.active.rotation = rotation;
        true
    }

    /// Replaces the active piece with `shape` at the spawn point, base
    /// orientation. Does not check the placement; see [`Self::is_spawn_valid`].
    pub fn spawn(&mut self, shape: Shape) {
        self.active = ActivePiece::new_at(shape, self.spawn_x, 0);
    }

    /// Spawns a shape drawn uniformly from `catalogue`.
    pub fn spawn_next<R: Rng + ?Sized>(&mut self, catalogue: &ShapeCatalogue, rng: &mut R) {
        self.spawn(catalogue.choose(rng).clone());
    }

    pub fn is_spawn_valid(&self, board: &Board) -> bool {
        board.is_valid_placement(&self.active.matrix, self.active.position)
    }
}
