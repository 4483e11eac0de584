//! Build a model from its layer list

use super::schema::{LayerSpec, ModelSpec};
use crate::autograd::Graph;
use crate::error::Result;
use crate::nn::{Dense, Layer, Model};
use rand::Rng;

/// Allocate every layer's weights on `graph` and assemble the model
pub fn build_model<R: Rng + ?Sized>(graph: &mut Graph, spec: &ModelSpec, rng: &mut R) -> Result<Model> {
    let mut layers = Vec::with_capacity(spec.layers.len());
    for layer in &spec.layers {
        layers.push(match *layer {
            LayerSpec::Dense {
                in_features,
                out_features,
            } => Layer::Dense(Dense::new(graph, in_features, out_features, rng)?),
            LayerSpec::Relu => Layer::Relu,
        });
    }
    Ok(Model::new(layers))
}
