use thiserror::Error;

use crate::nav::fixed_math::FixedNum;

/// Failures while building, loading or configuring the navigation layer.
///
/// A search that finds no route is *not* an error; see
/// [`SearchFailure`](crate::nav::pathfinding::SearchFailure).
#[derive(Error, Debug)]
pub enum NavError {
    #[error("grid dimensions must be non-zero, got {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("node radius must be positive, got {radius}")]
    InvalidNodeRadius { radius: FixedNum },

    #[error("grid data is inconsistent: {0}")]
    CorruptGrid(String),

    #[error("grid layout has no rows")]
    EmptyLayout,

    #[error("grid layout row {row} has {found} cells, expected {expected}")]
    RaggedLayout { row: usize, expected: usize, found: usize },

    #[error("unknown cell glyph {glyph:?} at ({x}, {y})")]
    UnknownCell { glyph: char, x: usize, y: usize },

    #[error("map version {found} is not supported (expected {expected})")]
    MapVersion { expected: u32, found: u32 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("map encoding error: {0}")]
    Encode(#[from] bincode::Error),

    #[error("config parse error: {0}")]
    Config(#[from] ron::error::SpannedError),
}

pub type NavResult<T> = Result<T, NavError>;
