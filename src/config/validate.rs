//! Configuration validation

use super::schema::{LayerSpec, RunSpec};

/// Largest weight element count a single dense layer may request
pub const MAX_LAYER_PARAMS: usize = 1 << 24;

/// Validation error type
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("Model has no layers")]
    EmptyModel,

    #[error("Invalid layer {index}: {in_features}x{out_features} (sizes must be > 0)")]
    InvalidLayerSize {
        index: usize,
        in_features: usize,
        out_features: usize,
    },

    #[error("Layer {index} is too large: {in_features}x{out_features} exceeds {max} weights")]
    LayerTooLarge {
        index: usize,
        in_features: usize,
        out_features: usize,
        max: usize,
    },

    #[error("Layer {index} expects {expected} input features, previous layer produces {got}")]
    LayerWidthMismatch {
        index: usize,
        expected: usize,
        got: usize,
    },

    #[error("Input is empty")]
    EmptyInput,

    #[error("Input row {row} has {got} values, expected {expected}")]
    RaggedInput {
        row: usize,
        expected: usize,
        got: usize,
    },

    #[error("Input has {got} features, first dense layer expects {expected}")]
    InputWidthMismatch { expected: usize, got: usize },

    #[error("Invalid preview length: {0} (must be > 0)")]
    InvalidPreviewLen(usize),
}

/// Validate a parsed run file
///
/// Checks:
/// - At least one layer, all dense sizes positive
/// - No dense weight above [`MAX_LAYER_PARAMS`] elements
/// - Consecutive dense layers agree on width
/// - Input is a non-empty rectangle whose width matches the first dense layer
pub fn validate_config(spec: &RunSpec) -> Result<(), ValidationError> {
    if spec.model.layers.is_empty() {
        return Err(ValidationError::EmptyModel);
    }

    // Width flowing into the next layer; relu keeps it
    let mut width: Option<usize> = None;
    let mut first_dense: Option<usize> = None;
    for (index, layer) in spec.model.layers.iter().enumerate() {
        if let LayerSpec::Dense {
            in_features,
            out_features,
        } = *layer
        {
            if in_features == 0 || out_features == 0 {
                return Err(ValidationError::InvalidLayerSize {
                    index,
                    in_features,
                    out_features,
                });
            }
            let params = in_features.checked_mul(out_features);
            if params.map_or(true, |p| p > MAX_LAYER_PARAMS) {
                return Err(ValidationError::LayerTooLarge {
                    index,
                    in_features,
                    out_features,
                    max: MAX_LAYER_PARAMS,
                });
            }
            if let Some(got) = width {
                if got != in_features {
                    return Err(ValidationError::LayerWidthMismatch {
                        index,
                        expected: in_features,
                        got,
                    });
                }
            }
            first_dense.get_or_insert(in_features);
            width = Some(out_features);
        }
    }

    let cols = match spec.input.first() {
        Some(row) if !row.is_empty() => row.len(),
        _ => return Err(ValidationError::EmptyInput),
    };
    for (row, values) in spec.input.iter().enumerate() {
        if values.len() != cols {
            return Err(ValidationError::RaggedInput {
                row,
                expected: cols,
                got: values.len(),
            });
        }
    }
    if let Some(expected) = first_dense {
        if expected != cols {
            return Err(ValidationError::InputWidthMismatch {
                expected,
                got: cols,
            });
        }
    }

    if spec.graph.preview_len == 0 {
        return Err(ValidationError::InvalidPreviewLen(spec.graph.preview_len));
    }

    Ok(())
}
