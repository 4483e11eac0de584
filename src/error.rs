//! Error types for Cognera

use crate::autograd::Shape;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Shape mismatch in {op}: lhs {lhs}, rhs {rhs}")]
    ShapeMismatch {
        op: &'static str,
        lhs: Shape,
        rhs: Shape,
    },

    #[error("Matmul shape mismatch: [{m}x{k1}] @ [{k2}x{n}], inner dims must match")]
    MatmulShapeMismatch {
        m: usize,
        k1: usize,
        k2: usize,
        n: usize,
    },

    #[error("Rank mismatch in {op}: expected rank {expected}, got {got}")]
    RankMismatch {
        op: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("Malformed input: row {row} has {got} values, expected {expected}")]
    MalformedInput {
        row: usize,
        expected: usize,
        got: usize,
    },

    #[error("Element count mismatch: shape {shape} requires {expected} elements, got {got}")]
    ElementCountMismatch {
        shape: Shape,
        expected: usize,
        got: usize,
    },

    #[error("Invalid shape: {0}")]
    InvalidShape(String),

    #[error("Gradient length mismatch: expected {expected}, got {got}")]
    GradientLength { expected: usize, got: usize },

    #[error("Tensor handle belongs to a different graph")]
    ForeignTensor,

    #[error("Unknown tensor index: {0}")]
    UnknownTensor(usize),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
