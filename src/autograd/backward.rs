//! Local gradient rules, dispatched over the operation tag

use super::{Tensor, Traversal};
use ndarray::Array1;

/// Differentiable operation that produced a tensor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpKind {
    Add,
    Mul,
    Matmul,
    Relu,
}

impl OpKind {
    pub fn name(&self) -> &'static str {
        match self {
            OpKind::Add => "add",
            OpKind::Mul => "mul",
            OpKind::Matmul => "matmul",
            OpKind::Relu => "relu",
        }
    }

    /// Map the gradient of the result to one gradient per input, in
    /// `inputs` order.
    ///
    /// `inputs` are the parents recorded when the op ran, so their lengths
    /// and shapes already satisfy the op's preconditions.
    pub(crate) fn local_grads(&self, grad: &Array1<f32>, inputs: &[&Tensor]) -> Vec<Array1<f32>> {
        match self {
            // ∂(a+b)/∂a = ∂(a+b)/∂b = 1
            OpKind::Add => vec![grad.clone(), grad.clone()],
            OpKind::Mul => {
                let (a, b) = (inputs[0], inputs[1]);
                // ∂L/∂a = ∂L/∂out * b, ∂L/∂b = ∂L/∂out * a
                vec![grad * b.data(), grad * a.data()]
            }
            OpKind::Matmul => matmul_grads(grad, inputs[0], inputs[1]),
            OpKind::Relu => {
                let mask = inputs[0].data().mapv(|x| if x > 0.0 { 1.0 } else { 0.0 });
                vec![grad * &mask]
            }
        }
    }
}

/// dA = G @ B^T, dB = A^T @ G
fn matmul_grads(grad: &Array1<f32>, a: &Tensor, b: &Tensor) -> Vec<Array1<f32>> {
    let (m, k) = (a.shape().dims()[0], a.shape().dims()[1]);
    let n = b.shape().dims()[1];
    let (a, b) = (a.data(), b.data());

    let mut grad_a = vec![0.0; m * k];
    // grad_A[i,p] = sum_j grad_C[i,j] * B[p,j]
    for i in 0..m {
        for p in 0..k {
            let mut sum = 0.0;
            for j in 0..n {
                sum += grad[i * n + j] * b[p * n + j];
            }
            grad_a[i * k + p] = sum;
        }
    }

    let mut grad_b = vec![0.0; k * n];
    // grad_B[p,j] = sum_i A[i,p] * grad_C[i,j]
    for p in 0..k {
        for j in 0..n {
            let mut sum = 0.0;
            for i in 0..m {
                sum += a[i * k + p] * grad[i * n + j];
            }
            grad_b[p * n + j] = sum;
        }
    }

    vec![Array1::from(grad_a), Array1::from(grad_b)]
}

/// Summary of one backward sweep
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackwardReport {
    /// Traversal the sweep used
    pub traversal: Traversal,
    /// Recorded results whose gradient rule ran
    pub replayed: usize,
    /// Recorded results passed over (no gradient yet, or unreachable)
    pub skipped: usize,
}
