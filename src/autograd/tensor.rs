//! Tensor record with gradient accumulation

use super::{OpKind, TensorId};
use crate::error::{Error, Result};
use ndarray::{Array1, ArrayView1};
use std::fmt;

/// Number of values shown by the diagnostic rendering.
pub const DEFAULT_PREVIEW_LEN: usize = 10;

/// Dimension sizes of a tensor (rank 1 or 2).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Shape(Vec<usize>);

impl Shape {
    /// Create a shape from dimension sizes
    pub fn new(dims: Vec<usize>) -> Self {
        Shape(dims)
    }

    pub fn dims(&self) -> &[usize] {
        &self.0
    }

    pub fn rank(&self) -> usize {
        self.0.len()
    }

    /// Product of all dimensions, saturating at `usize::MAX`
    pub fn elem_count(&self) -> usize {
        self.checked_elem_count().unwrap_or(usize::MAX)
    }

    /// Product of all dimensions, `None` on overflow
    pub fn checked_elem_count(&self) -> Option<usize> {
        self.0.iter().try_fold(1usize, |acc, &d| acc.checked_mul(d))
    }

    fn validate(&self) -> Result<()> {
        if !(1..=2).contains(&self.rank()) {
            return Err(Error::InvalidShape(format!(
                "rank {} is not supported (expected 1 or 2)",
                self.rank()
            )));
        }
        if self.0.contains(&0) {
            return Err(Error::InvalidShape(format!(
                "{self} has a zero-sized dimension"
            )));
        }
        if self.checked_elem_count().is_none() {
            return Err(Error::InvalidShape(format!(
                "{self} overflows the element count"
            )));
        }
        Ok(())
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, d) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{d}")?;
        }
        write!(f, "]")
    }
}

impl From<usize> for Shape {
    fn from(d: usize) -> Self {
        Shape(vec![d])
    }
}

impl From<(usize, usize)> for Shape {
    fn from((d0, d1): (usize, usize)) -> Self {
        Shape(vec![d0, d1])
    }
}

impl From<Vec<usize>> for Shape {
    fn from(v: Vec<usize>) -> Self {
        Shape(v)
    }
}

impl From<&[usize]> for Shape {
    fn from(s: &[usize]) -> Self {
        Shape(s.to_vec())
    }
}

/// Literal values accepted by [`Tensor::from_array`]
///
/// `Flat` builds a rank-1 tensor, `Rows` a row-major rank-2 tensor.
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayValues {
    Flat(Vec<f32>),
    Rows(Vec<Vec<f32>>),
}

impl From<Vec<f32>> for ArrayValues {
    fn from(v: Vec<f32>) -> Self {
        ArrayValues::Flat(v)
    }
}

impl From<&[f32]> for ArrayValues {
    fn from(v: &[f32]) -> Self {
        ArrayValues::Flat(v.to_vec())
    }
}

impl<const N: usize> From<[f32; N]> for ArrayValues {
    fn from(v: [f32; N]) -> Self {
        ArrayValues::Flat(v.to_vec())
    }
}

impl From<Vec<Vec<f32>>> for ArrayValues {
    fn from(rows: Vec<Vec<f32>>) -> Self {
        ArrayValues::Rows(rows)
    }
}

impl<const R: usize, const C: usize> From<[[f32; C]; R]> for ArrayValues {
    fn from(rows: [[f32; C]; R]) -> Self {
        ArrayValues::Rows(rows.iter().map(|r| r.to_vec()).collect())
    }
}

/// Dense f32 array with an optional gradient and the op that produced it
///
/// Tensors live inside a [`Graph`](super::Graph) arena. A tensor built by
/// one of the constructors here is a leaf: it has no op and no parents.
#[derive(Clone, PartialEq)]
pub struct Tensor {
    data: Array1<f32>,
    shape: Shape,
    grad: Option<Array1<f32>>,
    op: Option<OpKind>,
    parents: Vec<TensorId>,
}

impl Tensor {
    /// Create a leaf tensor from a raw buffer and an explicit shape
    pub fn new(data: Vec<f32>, shape: impl Into<Shape>) -> Result<Self> {
        let shape = shape.into();
        shape.validate()?;
        if data.len() != shape.elem_count() {
            return Err(Error::ElementCountMismatch {
                expected: shape.elem_count(),
                got: data.len(),
                shape,
            });
        }
        Ok(Self::leaf(Array1::from(data), shape))
    }

    /// Create a rank-1 tensor from a vector
    pub fn from_vec(data: Vec<f32>) -> Result<Self> {
        let len = data.len();
        Self::new(data, len)
    }

    /// Create a rank-2 tensor from equal-length rows
    pub fn from_rows<R: AsRef<[f32]>>(rows: &[R]) -> Result<Self> {
        let cols = rows.first().map_or(0, |r| r.as_ref().len());
        let mut flat = Vec::with_capacity(rows.len() * cols);
        for (i, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != cols {
                return Err(Error::MalformedInput {
                    row: i,
                    expected: cols,
                    got: row.len(),
                });
            }
            flat.extend_from_slice(row);
        }
        Self::new(flat, (rows.len(), cols))
    }

    /// Create a tensor from flat (rank 1) or nested (rank 2) values
    pub fn from_array(values: impl Into<ArrayValues>) -> Result<Self> {
        match values.into() {
            ArrayValues::Flat(v) => Self::from_vec(v),
            ArrayValues::Rows(rows) => Self::from_rows(&rows),
        }
    }

    fn leaf(data: Array1<f32>, shape: Shape) -> Self {
        Self {
            data,
            shape,
            grad: None,
            op: None,
            parents: Vec::new(),
        }
    }

    /// Build an op result. Callers guarantee `data.len() == shape.elem_count()`.
    pub(crate) fn from_op(
        data: Array1<f32>,
        shape: Shape,
        op: OpKind,
        parents: Vec<TensorId>,
    ) -> Self {
        debug_assert_eq!(data.len(), shape.elem_count());
        Self {
            data,
            shape,
            grad: None,
            op: Some(op),
            parents,
        }
    }

    pub fn data(&self) -> &Array1<f32> {
        &self.data
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Compare against a shape given as dimension sizes
    pub fn shape_equals(&self, dims: &[usize]) -> bool {
        self.shape.dims() == dims
    }

    /// Accumulated gradient, absent until the first contribution arrives
    pub fn grad(&self) -> Option<&Array1<f32>> {
        self.grad.as_ref()
    }

    /// Operation that produced this tensor, `None` for leaves
    pub fn op(&self) -> Option<OpKind> {
        self.op
    }

    pub fn parents(&self) -> &[TensorId] {
        &self.parents
    }

    pub fn is_leaf(&self) -> bool {
        self.op.is_none()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Add `grad` into the running gradient, allocating it as zeros first
    pub fn accumulate_grad(&mut self, grad: ArrayView1<'_, f32>) -> Result<()> {
        if grad.len() != self.data.len() {
            return Err(Error::GradientLength {
                expected: self.data.len(),
                got: grad.len(),
            });
        }
        let len = self.data.len();
        let acc = self.grad.get_or_insert_with(|| Array1::zeros(len));
        *acc += &grad;
        Ok(())
    }

    /// Drop the accumulated gradient
    pub fn zero_grad(&mut self) {
        self.grad = None;
    }

    /// Render shape plus the first `limit` values
    pub fn preview(&self, limit: usize) -> String {
        let dims: Vec<String> = self.shape.dims().iter().map(|d| d.to_string()).collect();
        let values: Vec<String> = self
            .data
            .iter()
            .take(limit)
            .map(|x| format!("{x:.3}"))
            .collect();
        let ellipsis = if self.data.len() > limit { "..." } else { "" };
        format!(
            "Tensor(shape=[{}], data=[{}{}])",
            dims.join(","),
            values.join(", "),
            ellipsis
        )
    }
}

impl fmt::Display for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.preview(DEFAULT_PREVIEW_LEN))
    }
}

impl fmt::Debug for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tensor")
            .field("shape", &self.shape)
            .field("data", &self.data)
            .field("grad", &self.grad)
            .field("op", &self.op)
            .field("parents", &self.parents)
            .finish()
    }
}
