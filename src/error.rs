use thiserror::Error;

use crate::shape::ShapeKind;

/// Mistakes in how a game was put together. These are reported once, at
/// construction; a running simulation has no error paths.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("board dimensions must be positive, got {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("ragged board: row {row} has {len} cells, expected {width}")]
    RaggedBoard { row: usize, len: usize, width: usize },

    #[error("shape catalogue is empty")]
    EmptyCatalogue,

    #[error("invalid shape matrix: {0}")]
    InvalidShape(&'static str),

    #[error("{kind:?} is {shape_width} cells wide and does not fit at the spawn column of a {board_width}-wide board")]
    ShapeTooWide {
        kind: ShapeKind,
        shape_width: usize,
        board_width: usize,
    },

    #[error("gravity interval must be non-zero")]
    ZeroGravityInterval,
}
