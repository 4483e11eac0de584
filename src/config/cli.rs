//! CLI argument parsing
//!
//! # Usage
//!
//! ```bash
//! cognera demo
//! cognera run model.yaml
//! cognera run model.yaml --traversal reachable --seed 7
//! cognera validate model.yaml
//! ```

use crate::autograd::Traversal;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Cognera: tape-based autodiff over dense tensors
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "cognera")]
#[command(version)]
#[command(about = "Minimal reverse-mode autodiff engine with a sequential model runner")]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Run the built-in add/matmul walkthrough
    Demo,

    /// Build a model from YAML, predict, and backpropagate
    Run(RunArgs),

    /// Validate a configuration file without running it
    Validate(ValidateArgs),
}

/// Arguments for the run command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct RunArgs {
    /// Path to YAML configuration file
    #[arg(value_name = "CONFIG")]
    pub config: PathBuf,

    /// Override backward traversal (tape, reachable)
    #[arg(short, long)]
    pub traversal: Option<Traversal>,

    /// Override the weight initialisation seed
    #[arg(short, long)]
    pub seed: Option<u64>,

    /// Override how many values the output preview shows
    #[arg(long)]
    pub preview_len: Option<usize>,
}

/// Arguments for the validate command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct ValidateArgs {
    /// Path to YAML configuration file
    #[arg(value_name = "CONFIG")]
    pub config: PathBuf,
}

/// Parse CLI arguments from a string slice (for testing)
pub fn parse_args<I, T>(args: I) -> Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Cli::try_parse_from(args)
}

/// Apply command-line overrides to a RunSpec
pub fn apply_overrides(spec: &mut super::RunSpec, args: &RunArgs) {
    if let Some(traversal) = args.traversal {
        spec.graph.traversal = traversal;
    }
    if let Some(seed) = args.seed {
        spec.seed = Some(seed);
    }
    if let Some(preview_len) = args.preview_len {
        spec.graph.preview_len = preview_len;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run_command() {
        let cli = parse_args(["cognera", "run", "model.yaml"]).unwrap();
        match cli.command {
            Command::Run(args) => {
                assert_eq!(args.config, PathBuf::from("model.yaml"));
                assert_eq!(args.traversal, None);
                assert_eq!(args.seed, None);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_run_overrides() {
        let cli = parse_args([
            "cognera",
            "run",
            "model.yaml",
            "--traversal",
            "reachable",
            "--seed",
            "9",
            "--preview-len",
            "3",
        ])
        .unwrap();
        let Command::Run(args) = cli.command else {
            panic!("expected run command");
        };
        assert_eq!(args.traversal, Some(Traversal::Reachable));
        assert_eq!(args.seed, Some(9));
        assert_eq!(args.preview_len, Some(3));
    }

    #[test]
    fn test_parse_rejects_unknown_traversal() {
        assert!(parse_args(["cognera", "run", "m.yaml", "--traversal", "sideways"]).is_err());
    }

    #[test]
    fn test_global_flags() {
        let cli = parse_args(["cognera", "demo", "--verbose"]).unwrap();
        assert!(cli.verbose);
        assert!(!cli.quiet);
        assert_eq!(cli.command, Command::Demo);
    }

    #[test]
    fn test_parse_validate_command() {
        let cli = parse_args(["cognera", "-q", "validate", "model.yaml"]).unwrap();
        assert!(cli.quiet);
        assert_eq!(
            cli.command,
            Command::Validate(ValidateArgs {
                config: PathBuf::from("model.yaml")
            })
        );
    }
}
