//! Sequential model

use super::Layer;
use crate::autograd::{Graph, TensorId};
use crate::error::Result;

/// Layers applied one after another; each output feeds the next layer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Model {
    layers: Vec<Layer>,
}

impl Model {
    pub fn new(layers: Vec<Layer>) -> Self {
        Self { layers }
    }

    /// Append a layer. Returns self for chaining.
    pub fn push(mut self, layer: impl Into<Layer>) -> Self {
        self.layers.push(layer.into());
        self
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Run every layer's forward pass on `x`
    pub fn predict(&self, graph: &mut Graph, x: TensorId) -> Result<TensorId> {
        self.layers
            .iter()
            .try_fold(x, |out, layer| layer.forward(graph, out))
    }

    pub fn parameters(&self) -> Vec<TensorId> {
        self.layers.iter().flat_map(|l| l.parameters()).collect()
    }

    /// Parameters keyed as `layers.{i}.weight`
    pub fn named_parameters(&self) -> Vec<(String, TensorId)> {
        self.layers
            .iter()
            .enumerate()
            .flat_map(|(i, layer)| {
                layer
                    .parameters()
                    .into_iter()
                    .map(move |p| (format!("layers.{i}.weight"), p))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autograd::Tensor;
    use crate::error::Error;
    use crate::nn::Dense;

    #[test]
    fn test_empty_model_is_identity() {
        let mut graph = Graph::begin();
        let x = graph.from_array(vec![1.0, 2.0]).unwrap();
        assert_eq!(Model::default().predict(&mut graph, x).unwrap(), x);
    }

    #[test]
    fn test_predict_chains_layers() {
        let mut graph = Graph::begin();
        let w1 = graph.leaf(Tensor::from_rows(&[[1.0, -1.0]]).unwrap());
        let w2 = graph.leaf(Tensor::from_rows(&[[2.0], [3.0]]).unwrap());
        let model = Model::default()
            .push(Dense::from_weight(&graph, w1).unwrap())
            .push(Layer::Relu)
            .push(Dense::from_weight(&graph, w2).unwrap());

        let x = graph.leaf(Tensor::from_rows(&[[2.0], [-1.0]]).unwrap());
        let y = model.predict(&mut graph, x).unwrap();

        // x @ w1 = [[2, -2], [-1, 1]] -> relu -> [[2, 0], [0, 1]] -> @ w2
        assert_eq!(graph.data(y).unwrap().to_vec(), vec![4.0, 3.0]);
        assert_eq!(graph.tape_len(), 3);

        graph.backward(y, None).unwrap();
        // dW2 = relu(h)^T @ ones = column sums
        assert_eq!(graph.grad(w2).unwrap().unwrap().to_vec(), vec![2.0, 1.0]);
        assert!(graph.grad(w1).unwrap().is_some());
    }

    #[test]
    fn test_predict_propagates_shape_errors() {
        let mut graph = Graph::begin();
        let w = graph.leaf(Tensor::from_rows(&[[1.0], [1.0], [1.0]]).unwrap());
        let model = Model::new(vec![Layer::Dense(Dense::from_weight(&graph, w).unwrap())]);
        let x = graph.leaf(Tensor::from_rows(&[[1.0, 2.0]]).unwrap());

        assert!(matches!(
            model.predict(&mut graph, x),
            Err(Error::MatmulShapeMismatch { k1: 2, k2: 3, .. })
        ));
    }

    #[test]
    fn test_named_parameters() {
        let mut graph = Graph::begin();
        let w = graph.leaf(Tensor::from_rows(&[[1.0]]).unwrap());
        let dense = Dense::from_weight(&graph, w).unwrap();
        let model = Model::new(vec![Layer::Relu, dense.into()]);

        assert_eq!(model.parameters(), vec![w]);
        assert_eq!(
            model.named_parameters(),
            vec![("layers.1.weight".to_string(), w)]
        );
    }
}
