//! Layer variants

use crate::autograd::{Graph, Tensor, TensorId};
use crate::error::{Error, Result};
use rand::Rng;

/// Half-width of the uniform weight initialisation range
const INIT_SCALE: f32 = 0.05;

/// Fully-connected layer without bias: `y = x @ W`
///
/// `W` has shape `[in_features, out_features]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dense {
    in_features: usize,
    out_features: usize,
    weight: TensorId,
}

impl Dense {
    /// Create a layer whose weight is drawn from `U(-0.05, 0.05)`
    pub fn new<R: Rng + ?Sized>(
        graph: &mut Graph,
        in_features: usize,
        out_features: usize,
        rng: &mut R,
    ) -> Result<Self> {
        let count = in_features.checked_mul(out_features).ok_or_else(|| {
            Error::InvalidShape(format!(
                "dense weight [{in_features}, {out_features}] overflows the element count"
            ))
        })?;
        let values: Vec<f32> = (0..count)
            .map(|_| rng.random_range(-INIT_SCALE..INIT_SCALE))
            .collect();
        let weight = Tensor::new(values, (in_features, out_features))?;
        Ok(Self::with_weight(graph.leaf(weight), in_features, out_features))
    }

    /// Wrap an existing `[in_features, out_features]` weight
    pub fn from_weight(graph: &Graph, weight: TensorId) -> Result<Self> {
        let dims = graph.tensor(weight)?.shape().dims().to_vec();
        match dims.as_slice() {
            [i, o] => Ok(Self::with_weight(weight, *i, *o)),
            _ => Err(Error::RankMismatch {
                op: "dense",
                expected: 2,
                got: dims.len(),
            }),
        }
    }

    fn with_weight(weight: TensorId, in_features: usize, out_features: usize) -> Self {
        Self {
            in_features,
            out_features,
            weight,
        }
    }

    pub fn in_features(&self) -> usize {
        self.in_features
    }

    pub fn out_features(&self) -> usize {
        self.out_features
    }

    pub fn weight(&self) -> TensorId {
        self.weight
    }

    /// `[batch, in_features] -> [batch, out_features]`
    pub fn forward(&self, graph: &mut Graph, x: TensorId) -> Result<TensorId> {
        graph.matmul(x, self.weight)
    }
}

/// Closed set of layer kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    Dense(Dense),
    Relu,
}

impl Layer {
    pub fn forward(&self, graph: &mut Graph, x: TensorId) -> Result<TensorId> {
        match self {
            Layer::Dense(dense) => dense.forward(graph, x),
            Layer::Relu => graph.relu(x),
        }
    }

    /// Trainable tensors owned by this layer
    pub fn parameters(&self) -> Vec<TensorId> {
        match self {
            Layer::Dense(dense) => vec![dense.weight],
            Layer::Relu => Vec::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Layer::Dense(_) => "dense",
            Layer::Relu => "relu",
        }
    }
}

impl From<Dense> for Layer {
    fn from(dense: Dense) -> Self {
        Layer::Dense(dense)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_dense_init_shape_and_range() {
        let mut graph = Graph::begin();
        let mut rng = StdRng::seed_from_u64(7);
        let dense = Dense::new(&mut graph, 3, 2, &mut rng).unwrap();

        let w = graph.tensor(dense.weight()).unwrap();
        assert!(w.shape_equals(&[3, 2]));
        assert!(w.is_leaf());
        assert!(w.data().iter().all(|v| v.abs() <= INIT_SCALE));
        assert_eq!(graph.tape_len(), 0);
    }

    #[test]
    fn test_dense_init_is_seeded() {
        let mut g1 = Graph::begin();
        let mut g2 = Graph::begin();
        let d1 = Dense::new(&mut g1, 4, 4, &mut StdRng::seed_from_u64(1)).unwrap();
        let d2 = Dense::new(&mut g2, 4, 4, &mut StdRng::seed_from_u64(1)).unwrap();

        assert_eq!(
            g1.data(d1.weight()).unwrap(),
            g2.data(d2.weight()).unwrap()
        );
    }

    #[test]
    fn test_dense_forward_is_matmul() {
        let mut graph = Graph::begin();
        let w = graph
            .leaf(Tensor::from_rows(&[[1.0, 0.0], [0.0, 2.0]]).unwrap());
        let dense = Dense::from_weight(&graph, w).unwrap();
        let x = graph.leaf(Tensor::from_rows(&[[3.0, 4.0]]).unwrap());

        let y = Layer::from(dense).forward(&mut graph, x).unwrap();

        assert_eq!(graph.data(y).unwrap().to_vec(), vec![3.0, 8.0]);
        assert_eq!(graph.tape_len(), 1);
    }

    #[test]
    fn test_dense_rejects_overflowing_size() {
        let mut graph = Graph::begin();
        let mut rng = StdRng::seed_from_u64(0);
        assert!(matches!(
            Dense::new(&mut graph, usize::MAX, 2, &mut rng),
            Err(Error::InvalidShape(_))
        ));
        assert!(graph.is_empty());
    }

    #[test]
    fn test_from_weight_requires_matrix() {
        let mut graph = Graph::begin();
        let w = graph.from_array(vec![1.0, 2.0]).unwrap();
        assert!(matches!(
            Dense::from_weight(&graph, w),
            Err(Error::RankMismatch { got: 1, .. })
        ));
    }

    #[test]
    fn test_relu_layer_has_no_parameters() {
        assert!(Layer::Relu.parameters().is_empty());
        assert_eq!(Layer::Relu.name(), "relu");
    }
}
