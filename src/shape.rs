use rand::Rng;

use crate::error::ConfigError;

// ============================================================================
// Types
// ============================================================================

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum ShapeKind {
    I,
    O,
    T,
    S,
    Z,
    J,
    L,
}

impl ShapeKind {
    pub const ALL: [ShapeKind; 7] = [
        ShapeKind::I,
        ShapeKind::O,
        ShapeKind::T,
        ShapeKind::S,
        ShapeKind::Z,
        ShapeKind::J,
        ShapeKind::L,
    ];

    /// Base (0°) orientation of the standard piece. Every base fills its
    /// top-left cell, so an occupied spawn cell always blocks the spawn.
    fn base_rows(self) -> &'static [&'static [u8]] {
        match self {
            ShapeKind::I => &[&[1, 1, 1, 1]],
            ShapeKind::O => &[&[1, 1], &[1, 1]],
            ShapeKind::T => &[&[1, 1, 1], &[0, 1, 0]],
            ShapeKind::S => &[&[1, 0], &[1, 1], &[0, 1]],
            ShapeKind::Z => &[&[1, 1, 0], &[0, 1, 1]],
            ShapeKind::J => &[&[1, 1, 1], &[0, 0, 1]],
            ShapeKind::L => &[&[1, 1, 1], &[1, 0, 0]],
        }
    }
}

/// Cumulative orientation of a piece relative to its base shape.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Rotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    /// The next clockwise quarter turn, wrapping 270° back to 0°.
    pub fn next(self) -> Self {
        match self {
            Rotation::Deg0 => Rotation::Deg90,
            Rotation::Deg90 => Rotation::Deg180,
            Rotation::Deg180 => Rotation::Deg270,
            Rotation::Deg270 => Rotation::Deg0,
        }
    }

    pub fn degrees(self) -> u16 {
        match self {
            Rotation::Deg0 => 0,
            Rotation::Deg90 => 90,
            Rotation::Deg180 => 180,
            Rotation::Deg270 => 270,
        }
    }
}

/// Rectangular row-major grid of filled/empty sub-cells.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    cells: Vec<bool>,
}

impl Matrix {
    /// Builds a matrix from rows of `0`/non-zero values.
    pub fn from_rows<R: AsRef<[u8]>>(rows: &[R]) -> Result<Self, ConfigError> {
        let cols = rows.first().map(|r| r.as_ref().len()).unwrap_or(0);
        if cols == 0 {
            return Err(ConfigError::InvalidShape("matrix has no cells"));
        }
        if rows.iter().any(|r| r.as_ref().len() != cols) {
            return Err(ConfigError::InvalidShape("rows differ in length"));
        }
        let cells: Vec<bool> = rows
            .iter()
            .flat_map(|r| r.as_ref().iter().map(|&v| v != 0))
            .collect();
        if !cells.iter().any(|&c| c) {
            return Err(ConfigError::InvalidShape("matrix has no filled cells"));
        }
        Ok(Self {
            rows: rows.len(),
            cols,
            cells,
        })
    }

    fn from_fn(rows: usize, cols: usize, f: impl Fn(usize, usize) -> bool) -> Self {
        let mut cells = Vec::with_capacity(rows * cols);
        for r in 0..rows {
            for c in 0..cols {
                cells.push(f(r, c));
            }
        }
        Self { rows, cols, cells }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn get(&self, row: usize, col: usize) -> bool {
        row < self.rows && col < self.cols && self.cells[row * self.cols + col]
    }

    /// `(row, col)` offsets of every filled sub-cell, row by row.
    pub fn filled(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, filled)| **filled)
            .map(|(i, _)| (i / self.cols, i % self.cols))
    }
}

/// Rotates `matrix` clockwise by `rotation`. Always returns a new matrix.
pub fn rotate(matrix: &Matrix, rotation: Rotation) -> Matrix {
    let (rows, cols) = (matrix.rows, matrix.cols);
    match rotation {
        Rotation::Deg0 => matrix.clone(),
        Rotation::Deg90 => Matrix::from_fn(cols, rows, |i, j| matrix.get(rows - 1 - j, i)),
        Rotation::Deg180 => {
            Matrix::from_fn(rows, cols, |i, j| matrix.get(rows - 1 - i, cols - 1 - j))
        }
        Rotation::Deg270 => Matrix::from_fn(cols, rows, |i, j| matrix.get(j, cols - 1 - i)),
    }
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Shape {
    kind: ShapeKind,
    base: Matrix,
}

impl Shape {
    pub fn new(kind: ShapeKind, base: Matrix) -> Self {
        Self { kind, base }
    }

    pub fn standard(kind: ShapeKind) -> Self {
        let rows = kind.base_rows();
        let base = Matrix::from_fn(rows.len(), rows[0].len(), |r, c| rows[r][c] != 0);
        Self { kind, base }
    }

    pub fn kind(&self) -> ShapeKind {
        self.kind
    }

    pub fn base(&self) -> &Matrix {
        &self.base
    }

    /// The base matrix rotated to an absolute orientation.
    pub fn oriented(&self, rotation: Rotation) -> Matrix {
        rotate(&self.base, rotation)
    }
}

// ============================================================================
// Catalogue
// ============================================================================

#[derive(Clone, Debug)]
pub struct ShapeCatalogue {
    shapes: Vec<Shape>,
}

impl ShapeCatalogue {
    pub fn new(shapes: Vec<Shape>) -> Result<Self, ConfigError> {
        if shapes.is_empty() {
            return Err(ConfigError::EmptyCatalogue);
        }
        Ok(Self { shapes })
    }

    /// The seven canonical tetrominoes.
    pub fn standard() -> Self {
        Self {
            shapes: ShapeKind::ALL.into_iter().map(Shape::standard).collect(),
        }
    }

    pub fn all_shapes(&self) -> &[Shape] {
        &self.shapes
    }

    pub fn get(&self, kind: ShapeKind) -> Option<&Shape> {
        self.shapes.iter().find(|s| s.kind == kind)
    }

    /// Uniform draw over the catalogue entries.
    pub fn choose<R: Rng + ?Sized>(&self, rng: &mut R) -> &Shape {
        &self.shapes[rng.gen_range(0..self.shapes.len())]
    }
}

impl Default for ShapeCatalogue {
    fn default() -> Self {
        Self::standard()
    }
}
