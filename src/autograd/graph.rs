//! Computation graph: tensor arena plus the operation tape
//!
//! Every tensor lives in the arena of exactly one [`Graph`] and is addressed
//! by a [`TensorId`]. Differentiable operations push their result onto the
//! tape in creation order; [`Graph::backward`] replays the tape in reverse
//! and then clears it.

use super::{ops, ArrayValues, BackwardReport, Tensor};
use crate::error::{Error, Result};
use ndarray::{Array1, ArrayView1};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, trace};

use super::tensor::DEFAULT_PREVIEW_LEN;

static NEXT_GRAPH_ID: AtomicU64 = AtomicU64::new(0);

fn next_graph_id() -> u64 {
    NEXT_GRAPH_ID.fetch_add(1, Ordering::Relaxed)
}

/// Stable handle to a tensor in a [`Graph`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TensorId {
    graph: u64,
    index: usize,
}

impl TensorId {
    /// Position in the arena
    pub fn index(&self) -> usize {
        self.index
    }
}

/// Which recorded results a backward sweep replays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Traversal {
    /// Every result on the tape, newest first, each with its own
    /// accumulated gradient. Results from unrelated computations recorded
    /// on the same tape are replayed too.
    #[default]
    Tape,
    /// Only results reachable from the backward root through `parents`,
    /// still newest first.
    Reachable,
}

impl std::str::FromStr for Traversal {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "tape" => Ok(Traversal::Tape),
            "reachable" => Ok(Traversal::Reachable),
            _ => Err(format!(
                "Unknown traversal: {s}. Valid traversals: tape, reachable"
            )),
        }
    }
}

/// Graph settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphConfig {
    #[serde(default)]
    pub traversal: Traversal,

    /// Values shown by [`Graph::render`]
    #[serde(default = "default_preview_len")]
    pub preview_len: usize,
}

fn default_preview_len() -> usize {
    DEFAULT_PREVIEW_LEN
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            traversal: Traversal::default(),
            preview_len: DEFAULT_PREVIEW_LEN,
        }
    }
}

/// Arena of tensors and the tape of differentiable results
///
/// The tape only ever holds results that carry an op. It is cleared at the
/// end of every backward pass; gradients are not, so repeated passes over
/// the same leaves accumulate until [`Graph::zero_grad`] is called.
pub struct Graph {
    id: u64,
    config: GraphConfig,
    tensors: Vec<Tensor>,
    tape: Vec<TensorId>,
}

impl Graph {
    /// Create an empty graph
    pub fn new(config: GraphConfig) -> Self {
        Self {
            id: next_graph_id(),
            config,
            tensors: Vec::new(),
            tape: Vec::new(),
        }
    }

    /// Start a new session with default settings
    pub fn begin() -> Self {
        Self::new(GraphConfig::default())
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    pub fn set_traversal(&mut self, traversal: Traversal) {
        self.config.traversal = traversal;
    }

    /// Move a leaf tensor into the arena
    pub fn leaf(&mut self, tensor: Tensor) -> TensorId {
        self.push(tensor)
    }

    /// Build a leaf from flat or nested values and move it into the arena
    pub fn from_array(&mut self, values: impl Into<ArrayValues>) -> Result<TensorId> {
        Ok(self.leaf(Tensor::from_array(values)?))
    }

    fn push(&mut self, tensor: Tensor) -> TensorId {
        let id = TensorId {
            graph: self.id,
            index: self.tensors.len(),
        };
        self.tensors.push(tensor);
        id
    }

    /// Store an op result and append it to the tape
    pub(crate) fn record(&mut self, tensor: Tensor) -> TensorId {
        debug_assert!(!tensor.is_leaf());
        let op = tensor.op();
        let id = self.push(tensor);
        self.tape.push(id);
        trace!(index = id.index, ?op, tape_len = self.tape.len(), "recorded");
        id
    }

    fn check(&self, id: TensorId) -> Result<usize> {
        if id.graph != self.id {
            return Err(Error::ForeignTensor);
        }
        if id.index >= self.tensors.len() {
            return Err(Error::UnknownTensor(id.index));
        }
        Ok(id.index)
    }

    pub fn tensor(&self, id: TensorId) -> Result<&Tensor> {
        let index = self.check(id)?;
        Ok(&self.tensors[index])
    }

    fn tensor_mut(&mut self, id: TensorId) -> Result<&mut Tensor> {
        let index = self.check(id)?;
        Ok(&mut self.tensors[index])
    }

    pub fn data(&self, id: TensorId) -> Result<&Array1<f32>> {
        Ok(self.tensor(id)?.data())
    }

    pub fn grad(&self, id: TensorId) -> Result<Option<&Array1<f32>>> {
        Ok(self.tensor(id)?.grad())
    }

    /// Diagnostic rendering using the configured preview length
    pub fn render(&self, id: TensorId) -> Result<String> {
        Ok(self.tensor(id)?.preview(self.config.preview_len))
    }

    /// Add a gradient contribution to a tensor
    pub fn accumulate_grad(&mut self, id: TensorId, grad: ArrayView1<'_, f32>) -> Result<()> {
        self.tensor_mut(id)?.accumulate_grad(grad)
    }

    /// Recorded results, oldest first
    pub fn tape(&self) -> &[TensorId] {
        &self.tape
    }

    pub fn tape_len(&self) -> usize {
        self.tape.len()
    }

    /// Number of tensors in the arena
    pub fn len(&self) -> usize {
        self.tensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tensors.is_empty()
    }

    /// Clear the tape. Tensors and their gradients stay in the arena.
    pub fn reset(&mut self) {
        debug!(cleared = self.tape.len(), "tape reset");
        self.tape.clear();
    }

    /// Drop every accumulated gradient
    pub fn zero_grad(&mut self) {
        for tensor in &mut self.tensors {
            tensor.zero_grad();
        }
    }

    /// Drop the whole arena. Handles issued before this call are rejected
    /// afterwards.
    pub fn clear(&mut self) {
        self.tensors.clear();
        self.tape.clear();
        self.id = next_graph_id();
    }

    pub fn add(&mut self, a: TensorId, b: TensorId) -> Result<TensorId> {
        ops::add(self, a, b)
    }

    pub fn mul(&mut self, a: TensorId, b: TensorId) -> Result<TensorId> {
        ops::mul(self, a, b)
    }

    pub fn matmul(&mut self, a: TensorId, b: TensorId) -> Result<TensorId> {
        ops::matmul(self, a, b)
    }

    pub fn relu(&mut self, a: TensorId) -> Result<TensorId> {
        ops::relu(self, a)
    }

    /// Run the backward pass from `root`
    ///
    /// 1. Seed `root` with `seed`, or all ones when `seed` is `None`.
    /// 2. Walk the tape newest first; every result that has a gradient runs
    ///    its op's gradient rule with that gradient and accumulates the
    ///    outcome into its parents.
    /// 3. Clear the tape, whether or not the replay succeeded.
    ///
    /// A seed of the wrong length fails before anything is touched.
    pub fn backward(&mut self, root: TensorId, seed: Option<Array1<f32>>) -> Result<BackwardReport> {
        let root_len = self.tensor(root)?.len();
        let seed = match seed {
            Some(seed) if seed.len() != root_len => {
                return Err(Error::GradientLength {
                    expected: root_len,
                    got: seed.len(),
                });
            }
            Some(seed) => seed,
            None => Array1::ones(root_len),
        };

        let traversal = self.config.traversal;
        debug!(
            root = root.index,
            tape_len = self.tape.len(),
            ?traversal,
            "backward pass starting"
        );

        self.tensor_mut(root)?.accumulate_grad(seed.view())?;

        let replay = self.replay(root, traversal);
        self.reset();
        let report = replay?;

        debug!(
            replayed = report.replayed,
            skipped = report.skipped,
            "backward pass finished"
        );
        Ok(report)
    }

    /// Propagate gradients along the tape, newest first
    fn replay(&mut self, root: TensorId, traversal: Traversal) -> Result<BackwardReport> {
        let reachable = match traversal {
            Traversal::Tape => None,
            Traversal::Reachable => Some(self.ancestors(root)),
        };

        let mut report = BackwardReport {
            traversal,
            replayed: 0,
            skipped: 0,
        };

        for pos in (0..self.tape.len()).rev() {
            let index = self.tape[pos].index;
            if reachable.as_ref().is_some_and(|r| !r.contains(&index)) {
                report.skipped += 1;
                continue;
            }

            let node = &self.tensors[index];
            let (Some(op), Some(grad)) = (node.op(), node.grad()) else {
                report.skipped += 1;
                continue;
            };
            let parents = node.parents().to_vec();
            let inputs: Vec<&Tensor> = parents.iter().map(|p| &self.tensors[p.index]).collect();
            let local = op.local_grads(grad, &inputs);

            for (parent, g) in parents.iter().zip(local) {
                self.tensors[parent.index].accumulate_grad(g.view())?;
            }
            report.replayed += 1;
        }
        Ok(report)
    }

    /// Arena indices reachable from `root` through `parents`, root included
    fn ancestors(&self, root: TensorId) -> HashSet<usize> {
        let mut visited = HashSet::new();
        let mut stack = vec![root.index];
        while let Some(index) = stack.pop() {
            if !visited.insert(index) {
                continue;
            }
            stack.extend(self.tensors[index].parents().iter().map(|p| p.index));
        }
        visited
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::begin()
    }
}

impl std::fmt::Debug for Graph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Graph")
            .field("num_tensors", &self.tensors.len())
            .field("tape_len", &self.tape.len())
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backward_clears_tape_when_replay_fails() {
        let mut graph = Graph::begin();
        let a = graph.from_array(vec![1.0, 2.0]).unwrap();
        let b = graph.from_array(vec![3.0, 4.0]).unwrap();
        let c = graph.add(a, b).unwrap();

        // Shrink a parent after recording so its accumulation fails
        graph.tensors[a.index] = Tensor::from_vec(vec![1.0]).unwrap();

        let err = graph.backward(c, None).unwrap_err();
        assert!(matches!(
            err,
            Error::GradientLength {
                expected: 1,
                got: 2
            }
        ));
        assert_eq!(graph.tape_len(), 0);
    }
}
