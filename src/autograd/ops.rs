//! Differentiable operations
//!
//! Each op validates its operands, computes the result into a fresh buffer,
//! and only then records it on the graph. A failed op leaves the arena and
//! the tape untouched.

use super::{Graph, OpKind, Shape, Tensor, TensorId};
use crate::error::{Error, Result};
use ndarray::Array1;

fn check_same_len(op: &'static str, a: &Tensor, b: &Tensor) -> Result<()> {
    if a.len() != b.len() {
        return Err(Error::ShapeMismatch {
            op,
            lhs: a.shape().clone(),
            rhs: b.shape().clone(),
        });
    }
    Ok(())
}

/// Add two tensors element-wise
///
/// Operands must hold the same number of elements; the result takes the
/// shape of `a`.
pub fn add(graph: &mut Graph, a: TensorId, b: TensorId) -> Result<TensorId> {
    let (ta, tb) = (graph.tensor(a)?, graph.tensor(b)?);
    check_same_len("add", ta, tb)?;

    let data = ta.data() + tb.data();
    let result = Tensor::from_op(data, ta.shape().clone(), OpKind::Add, vec![a, b]);
    Ok(graph.record(result))
}

/// Multiply two tensors element-wise
pub fn mul(graph: &mut Graph, a: TensorId, b: TensorId) -> Result<TensorId> {
    let (ta, tb) = (graph.tensor(a)?, graph.tensor(b)?);
    check_same_len("mul", ta, tb)?;

    let data = ta.data() * tb.data();
    let result = Tensor::from_op(data, ta.shape().clone(), OpKind::Mul, vec![a, b]);
    Ok(graph.record(result))
}

/// Matrix product of `a` `[m, k]` and `b` `[k, n]`
pub fn matmul(graph: &mut Graph, a: TensorId, b: TensorId) -> Result<TensorId> {
    let (ta, tb) = (graph.tensor(a)?, graph.tensor(b)?);
    for t in [ta, tb] {
        if t.shape().rank() != 2 {
            return Err(Error::RankMismatch {
                op: "matmul",
                expected: 2,
                got: t.shape().rank(),
            });
        }
    }

    let (m, k) = (ta.shape().dims()[0], ta.shape().dims()[1]);
    let (k2, n) = (tb.shape().dims()[0], tb.shape().dims()[1]);
    if k != k2 {
        return Err(Error::MatmulShapeMismatch { m, k1: k, k2, n });
    }

    let len = m.checked_mul(n).ok_or_else(|| {
        Error::InvalidShape(format!("matmul result [{m}, {n}] overflows the element count"))
    })?;

    let (a_data, b_data) = (ta.data(), tb.data());
    let mut out = vec![0.0; len];
    for i in 0..m {
        for j in 0..n {
            let mut sum = 0.0;
            for p in 0..k {
                sum += a_data[i * k + p] * b_data[p * n + j];
            }
            out[i * n + j] = sum;
        }
    }

    let result = Tensor::from_op(
        Array1::from(out),
        Shape::from((m, n)),
        OpKind::Matmul,
        vec![a, b],
    );
    Ok(graph.record(result))
}

/// ReLU activation
///
/// NaN inputs pass through unchanged; their gradient is zero.
pub fn relu(graph: &mut Graph, a: TensorId) -> Result<TensorId> {
    let ta = graph.tensor(a)?;
    let data = ta.data().mapv(|x| if x > 0.0 || x.is_nan() { x } else { 0.0 });
    let result = Tensor::from_op(data, ta.shape().clone(), OpKind::Relu, vec![a]);
    Ok(graph.record(result))
}
