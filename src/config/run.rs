//! Config-driven forward/backward run

use super::builder::build_model;
use super::schema::RunSpec;
use super::validate::validate_config;
use crate::autograd::{BackwardReport, Graph, Tensor};
use crate::error::{Error, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fs;
use std::path::Path;
use tracing::info;

/// Outcome of [`run_spec`]
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Model prediction for the configured input
    pub output: Tensor,
    /// Rendering of the prediction using the configured preview length
    pub rendered: String,
    /// L2 norm of each parameter's gradient, keyed `layers.{i}.weight`
    pub gradient_norms: Vec<(String, f32)>,
    pub backward: BackwardReport,
}

/// Load and parse a YAML run file
pub fn load_config<P: AsRef<Path>>(config_path: P) -> Result<RunSpec> {
    let path = config_path.as_ref();
    let yaml_content = fs::read_to_string(path).map_err(|e| {
        Error::ConfigError(format!(
            "Failed to read config file {}: {}",
            path.display(),
            e
        ))
    })?;

    serde_yaml::from_str(&yaml_content)
        .map_err(|e| Error::ConfigError(format!("Failed to parse YAML config: {e}")))
}

/// Load, validate and run a YAML run file
pub fn run_from_yaml<P: AsRef<Path>>(config_path: P) -> Result<RunReport> {
    let spec = load_config(config_path)?;
    run_spec(&spec)
}

/// Build the model, predict on the input, and backpropagate with a ones seed
pub fn run_spec(spec: &RunSpec) -> Result<RunReport> {
    validate_config(spec).map_err(|e| Error::ConfigError(format!("Invalid config: {e}")))?;

    let mut rng = match spec.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    let mut graph = Graph::new(spec.graph.clone());
    let model = build_model(&mut graph, &spec.model, &mut rng)?;
    let x = graph.leaf(Tensor::from_rows(&spec.input)?);
    info!(
        layers = model.len(),
        batch = spec.input.len(),
        "running model"
    );

    let y = model.predict(&mut graph, x)?;
    let backward = graph.backward(y, None)?;

    let mut gradient_norms = Vec::new();
    for (name, id) in model.named_parameters() {
        let norm = graph
            .grad(id)?
            .map_or(0.0, |g| g.iter().map(|v| v * v).sum::<f32>().sqrt());
        gradient_norms.push((name, norm));
    }

    Ok(RunReport {
        output: graph.tensor(y)?.clone(),
        rendered: graph.render(y)?,
        gradient_norms,
        backward,
    })
}
