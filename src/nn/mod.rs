//! Layer and model composition on top of the autograd graph
//!
//! Layers form a closed set ([`Layer`]); a [`Model`] applies them in order.
//! Every forward pass records its ops on the caller's [`Graph`](crate::autograd::Graph),
//! so a backward pass from the prediction reaches the layer weights.

mod layer;
mod model;

pub use layer::{Dense, Layer};
pub use model::Model;
