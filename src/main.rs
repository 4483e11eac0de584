//! Cognera CLI
//!
//! # Usage
//!
//! ```bash
//! # Walk through add/matmul and their gradients
//! cognera demo
//!
//! # Build a model from config, predict, backpropagate
//! cognera run model.yaml
//! cognera run model.yaml --traversal reachable --seed 7
//!
//! # Validate config
//! cognera validate model.yaml
//! ```

use clap::Parser;
use cognera::autograd::{Graph, Tensor};
use cognera::config::{apply_overrides, load_config, run_spec, validate_config, Cli, Command};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_level = if cli.quiet {
        LogLevel::Quiet
    } else if cli.verbose {
        LogLevel::Verbose
    } else {
        LogLevel::Normal
    };
    init_tracing(log_level);

    let result = match cli.command {
        Command::Demo => run_demo(log_level),
        Command::Run(args) => run_model(args, log_level),
        Command::Validate(args) => run_validate(args, log_level),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

#[derive(Clone, Copy, PartialEq)]
enum LogLevel {
    Quiet,
    Normal,
    Verbose,
}

/// `RUST_LOG` wins over the flags when set
fn init_tracing(level: LogLevel) {
    let default = match level {
        LogLevel::Quiet => "error",
        LogLevel::Normal => "warn",
        LogLevel::Verbose => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn log(level: LogLevel, required: LogLevel, msg: &str) {
    if level != LogLevel::Quiet && (level == required || required == LogLevel::Normal) {
        println!("{msg}");
    }
}

fn run_demo(level: LogLevel) -> Result<(), String> {
    demo(level).map_err(|e| e.to_string())
}

fn demo(level: LogLevel) -> cognera::Result<()> {
    let mut graph = Graph::begin();

    let a = graph.leaf(Tensor::from_rows(&[[1.0, 2.0]])?);
    let b = graph.leaf(Tensor::from_rows(&[[3.0, 4.0]])?);
    let sum = graph.add(a, b)?;
    log(level, LogLevel::Normal, &format!("a       = {}", graph.render(a)?));
    log(level, LogLevel::Normal, &format!("b       = {}", graph.render(b)?));
    log(level, LogLevel::Normal, &format!("a + b   = {}", graph.render(sum)?));

    graph.backward(sum, None)?;
    log(level, LogLevel::Normal, &format!("grad a  = {:?}", grad_vec(&graph, a)?));
    log(level, LogLevel::Normal, &format!("grad b  = {:?}", grad_vec(&graph, b)?));

    let m = graph.leaf(Tensor::from_rows(&[[1.0, 2.0], [3.0, 4.0]])?);
    let n = graph.leaf(Tensor::from_rows(&[[5.0, 6.0], [7.0, 8.0]])?);
    let product = graph.matmul(m, n)?;
    log(level, LogLevel::Normal, &format!("m @ n   = {}", graph.render(product)?));

    let report = graph.backward(product, None)?;
    log(level, LogLevel::Normal, &format!("grad m  = {:?}", grad_vec(&graph, m)?));
    log(level, LogLevel::Normal, &format!("grad n  = {:?}", grad_vec(&graph, n)?));
    log(
        level,
        LogLevel::Verbose,
        &format!("replayed {} op(s), tape now {}", report.replayed, graph.tape_len()),
    );
    Ok(())
}

fn grad_vec(graph: &Graph, id: cognera::TensorId) -> cognera::Result<Vec<f32>> {
    Ok(graph.grad(id)?.map(|g| g.to_vec()).unwrap_or_default())
}

fn run_model(args: cognera::config::RunArgs, level: LogLevel) -> Result<(), String> {
    log(
        level,
        LogLevel::Normal,
        &format!("Cognera: running {}", args.config.display()),
    );

    let mut spec = load_config(&args.config).map_err(|e| e.to_string())?;
    apply_overrides(&mut spec, &args);

    let report = run_spec(&spec).map_err(|e| e.to_string())?;

    log(level, LogLevel::Normal, &format!("  Output: {}", report.rendered));
    for (name, norm) in &report.gradient_norms {
        log(level, LogLevel::Normal, &format!("  |grad {name}| = {norm:.6}"));
    }
    log(
        level,
        LogLevel::Verbose,
        &format!(
            "  Backward ({:?}): replayed {}, skipped {}",
            report.backward.traversal, report.backward.replayed, report.backward.skipped
        ),
    );
    Ok(())
}

fn run_validate(args: cognera::config::ValidateArgs, level: LogLevel) -> Result<(), String> {
    let spec = load_config(&args.config).map_err(|e| e.to_string())?;
    validate_config(&spec).map_err(|e| e.to_string())?;

    log(level, LogLevel::Normal, "✓ Configuration is valid");
    log(
        level,
        LogLevel::Verbose,
        &format!(
            "  Layers: {}, batch: {}, traversal: {:?}",
            spec.model.layers.len(),
            spec.input.len(),
            spec.graph.traversal
        ),
    );
    Ok(())
}
