//! Tape-based autograd engine
//!
//! Provides reverse-mode automatic differentiation over dense f32 tensors.
//! Tensors live in a [`Graph`] arena; every differentiable op appends its
//! result to the graph's tape, and [`backward`] replays the tape in reverse.

mod backward;
mod graph;
mod ops;
mod tensor;


pub use backward::{BackwardReport, OpKind};
pub use graph::{Graph, GraphConfig, TensorId, Traversal};
pub use ops::*;
pub use tensor::{ArrayValues, Shape, Tensor, DEFAULT_PREVIEW_LEN};

use crate::error::Result;
use ndarray::Array1;

/// Perform backward pass on a tensor
///
/// With `grad_output` omitted the root is seeded with ones (scalar loss).
pub fn backward(
    graph: &mut Graph,
    tensor: TensorId,
    grad_output: Option<Array1<f32>>,
) -> Result<BackwardReport> {
    graph.backward(tensor, grad_output)
}
