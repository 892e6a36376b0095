//! Falling-block puzzle simulation: a fixed-width well, one falling piece,
//! line clears, and a terminal game-over when a new piece cannot spawn.

pub mod board;
pub mod error;
pub mod game;
pub mod piece;
pub mod shape;

pub use board::{Board, CellState, Position};
pub use error::ConfigError;
pub use game::{Command, Game, GameConfig, GameEvent, GameState};
pub use piece::{ActivePiece, PieceController};
pub use shape::{rotate, Matrix, Rotation, Shape, ShapeCatalogue, ShapeKind};
