//! Integration tests for config module

use super::*;
use crate::autograd::Traversal;
use crate::error::Error;
use std::io::Write;
use tempfile::NamedTempFile;

const XOR_YAML: &str = r#"
model:
  layers:
    - type: dense
      in_features: 2
      out_features: 4
    - type: relu
    - type: dense
      in_features: 4
      out_features: 1
input: [[0, 0], [0, 1], [1, 0], [1, 1]]
seed: 42
"#;

fn write_temp(yaml: &str) -> NamedTempFile {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(yaml.as_bytes()).unwrap();
    temp_file
}

fn parse(yaml: &str) -> RunSpec {
    serde_yaml::from_str(yaml).unwrap()
}

#[test]
fn test_end_to_end_config_loading() {
    let temp_file = write_temp(XOR_YAML);
    let spec = load_config(temp_file.path()).unwrap();

    assert_eq!(spec.model.layers.len(), 3);
    assert_eq!(
        spec.model.layers[0],
        LayerSpec::Dense {
            in_features: 2,
            out_features: 4
        }
    );
    assert_eq!(spec.model.layers[1], LayerSpec::Relu);
    assert_eq!(spec.input.len(), 4);
    assert_eq!(spec.seed, Some(42));
    // Defaults
    assert_eq!(spec.graph.traversal, Traversal::Tape);
    assert_eq!(spec.graph.preview_len, 10);
    assert!(validate_config(&spec).is_ok());
}

#[test]
fn test_graph_section() {
    let spec = parse(
        r#"
model:
  layers:
    - type: relu
input: [[1, -1]]
graph:
  traversal: reachable
  preview_len: 3
"#,
    );
    assert_eq!(spec.graph.traversal, Traversal::Reachable);
    assert_eq!(spec.graph.preview_len, 3);
    assert_eq!(spec.seed, None);
}

#[test]
fn test_missing_file() {
    let err = load_config("/nonexistent/model.yaml").unwrap_err();
    assert!(matches!(err, Error::ConfigError(msg) if msg.contains("Failed to read")));
}

#[test]
fn test_invalid_yaml() {
    let temp_file = write_temp("model: [unclosed");
    let err = load_config(temp_file.path()).unwrap_err();
    assert!(matches!(err, Error::ConfigError(msg) if msg.contains("Failed to parse")));
}

#[test]
fn test_unknown_layer_type_rejected() {
    let yaml = r#"
model:
  layers:
    - type: conv
input: [[1]]
"#;
    assert!(serde_yaml::from_str::<RunSpec>(yaml).is_err());
}

#[test]
fn test_validate_empty_model() {
    let mut spec = parse(XOR_YAML);
    spec.model.layers.clear();
    assert_eq!(validate_config(&spec), Err(ValidationError::EmptyModel));
}

#[test]
fn test_validate_layer_width_chain() {
    let mut spec = parse(XOR_YAML);
    spec.model.layers[2] = LayerSpec::Dense {
        in_features: 3,
        out_features: 1,
    };
    assert_eq!(
        validate_config(&spec),
        Err(ValidationError::LayerWidthMismatch {
            index: 2,
            expected: 3,
            got: 4
        })
    );
}

#[test]
fn test_validate_zero_sized_layer() {
    let mut spec = parse(XOR_YAML);
    spec.model.layers[0] = LayerSpec::Dense {
        in_features: 2,
        out_features: 0,
    };
    assert!(matches!(
        validate_config(&spec),
        Err(ValidationError::InvalidLayerSize { index: 0, .. })
    ));
}

#[test]
fn test_validate_input() {
    let mut spec = parse(XOR_YAML);
    spec.input = vec![vec![0.0, 1.0], vec![1.0]];
    assert_eq!(
        validate_config(&spec),
        Err(ValidationError::RaggedInput {
            row: 1,
            expected: 2,
            got: 1
        })
    );

    spec.input = vec![vec![0.0, 1.0, 2.0]];
    assert_eq!(
        validate_config(&spec),
        Err(ValidationError::InputWidthMismatch {
            expected: 2,
            got: 3
        })
    );

    spec.input.clear();
    assert_eq!(validate_config(&spec), Err(ValidationError::EmptyInput));
}

#[test]
fn test_validate_preview_len() {
    let mut spec = parse(XOR_YAML);
    spec.graph.preview_len = 0;
    assert_eq!(
        validate_config(&spec),
        Err(ValidationError::InvalidPreviewLen(0))
    );
}

#[test]
fn test_run_from_yaml() {
    let temp_file = write_temp(XOR_YAML);
    let report = run_from_yaml(temp_file.path()).unwrap();

    assert!(report.output.shape_equals(&[4, 1]));
    assert_eq!(report.backward.replayed, 3);
    assert_eq!(report.gradient_norms.len(), 2);
    assert_eq!(report.gradient_norms[0].0, "layers.0.weight");
    assert_eq!(report.gradient_norms[1].0, "layers.2.weight");
    assert!(report.rendered.starts_with("Tensor(shape=[4,1]"));
}

#[test]
fn test_run_is_deterministic_for_seed() {
    let spec = parse(XOR_YAML);
    let first = run_spec(&spec).unwrap();
    let second = run_spec(&spec).unwrap();
    assert_eq!(first.output.data(), second.output.data());
    assert_eq!(first.gradient_norms, second.gradient_norms);
}

#[test]
fn test_validate_oversized_layer() {
    let huge = 1usize << (usize::BITS - 1);
    let mut spec = parse(XOR_YAML);
    spec.model.layers = vec![
        LayerSpec::Dense {
            in_features: 2,
            out_features: huge,
        },
        LayerSpec::Dense {
            in_features: huge,
            out_features: 1,
        },
    ];
    assert!(matches!(
        validate_config(&spec),
        Err(ValidationError::LayerTooLarge { index: 0, .. })
    ));

    let err = run_spec(&spec).unwrap_err();
    assert!(matches!(err, Error::ConfigError(msg) if msg.contains("too large")));

    spec.model.layers = vec![LayerSpec::Dense {
        in_features: 2,
        out_features: MAX_LAYER_PARAMS,
    }];
    assert!(matches!(
        validate_config(&spec),
        Err(ValidationError::LayerTooLarge { index: 0, .. })
    ));
}

#[test]
fn test_run_rejects_invalid_spec() {
    let mut spec = parse(XOR_YAML);
    spec.input = vec![vec![1.0, 2.0, 3.0]];
    let err = run_spec(&spec).unwrap_err();
    assert!(matches!(err, Error::ConfigError(msg) if msg.contains("Invalid config")));
}

#[test]
fn test_apply_overrides() {
    let mut spec = parse(XOR_YAML);
    let args = RunArgs {
        config: "model.yaml".into(),
        traversal: Some(Traversal::Reachable),
        seed: Some(1),
        preview_len: None,
    };
    apply_overrides(&mut spec, &args);

    assert_eq!(spec.graph.traversal, Traversal::Reachable);
    assert_eq!(spec.seed, Some(1));
    assert_eq!(spec.graph.preview_len, 10);
}
