//! Declarative YAML run configuration
//!
//! # Example
//!
//! ```yaml
//! model:
//!   layers:
//!     - type: dense
//!       in_features: 2
//!       out_features: 4
//!     - type: relu
//!     - type: dense
//!       in_features: 4
//!       out_features: 1
//! input: [[0, 0], [0, 1], [1, 0], [1, 1]]
//! seed: 42
//! graph:
//!   traversal: tape
//! ```

mod builder;
mod cli;
mod run;
mod schema;
mod validate;

#[cfg(test)]
mod tests;


pub use builder::build_model;
pub use cli::{apply_overrides, parse_args, Cli, Command, RunArgs, ValidateArgs};
pub use run::{load_config, run_from_yaml, run_spec, RunReport};
pub use schema::{LayerSpec, ModelSpec, RunSpec};
pub use validate::{validate_config, ValidationError, MAX_LAYER_PARAMS};
