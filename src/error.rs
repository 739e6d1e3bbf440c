use thiserror::Error;

/// Errors raised by matrix algebra and network construction.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("shape mismatch in {operation}: {left:?} and {right:?}")]
    ShapeMismatch {
        operation: &'static str,
        left: (usize, usize),
        right: (usize, usize),
    },

    #[error("{operation} only accepts a scalar operand, got a matrix of shape {shape:?}")]
    TypeMismatch {
        operation: &'static str,
        shape: (usize, usize),
    },

    #[error("a matrix needs at least one row and one column, got {rows}x{cols}")]
    EmptyMatrix { rows: usize, cols: usize },

    #[error("row {row} has {len} elements, expected {expected}")]
    RaggedRows {
        row: usize,
        len: usize,
        expected: usize,
    },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("invalid network configuration: {0}")]
    Configuration(String),
}

pub type Result<T> = std::result::Result<T, Error>;
