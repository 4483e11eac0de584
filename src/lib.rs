//! # Cognera: Minimal Reverse-Mode Autodiff
//!
//! Cognera records elementwise and matrix operations on dense f32 tensors as
//! they execute, then replays them in reverse to propagate gradients.
//!
//! ## Architecture
//!
//! - **autograd**: Tensor arena, operation tape, backward pass
//! - **nn**: Dense/ReLU layers and a sequential model
//! - **config**: Declarative YAML run configuration and CLI arguments
//!
//! ```
//! use cognera::autograd::{Graph, Tensor};
//!
//! let mut graph = Graph::begin();
//! let a = graph.leaf(Tensor::from_rows(&[[1.0, 2.0]])?);
//! let b = graph.leaf(Tensor::from_rows(&[[3.0, 4.0]])?);
//! let c = graph.add(a, b)?;
//! graph.backward(c, None)?;
//!
//! assert_eq!(graph.grad(a)?.unwrap().to_vec(), vec![1.0, 1.0]);
//! assert_eq!(graph.tape_len(), 0);
//! # Ok::<(), cognera::Error>(())
//! ```

pub mod autograd;
pub mod config;
pub mod nn;

pub mod error;

// Re-export commonly used types
pub use autograd::{backward, Graph, Tensor, TensorId};
pub use error::{Error, Result};
