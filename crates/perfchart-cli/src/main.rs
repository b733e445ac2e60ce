//! Perfchart - performance chart ingestion harness
//!
//! The `perfchart` command drives the core library from files.
//!
//! ## Commands
//!
//! - `interpolate`: Evaluate a dataset at one input point
//! - `validate`: Run test cases and structural checks against a dataset
//! - `propose`: Derive corrective adjustments from a failed test result
//! - `run`: Replay inbound protocol messages through the state machine

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::de::DeserializeOwned;
use tracing::{info, warn, Level};

use perfchart_core::metrics::METRICS;
use perfchart_core::{
    apply_adjustments, evaluate, execute_validation_tests, propose_adjustments,
    validate_abac_data, write_model_artifact, AbacDataset, Envelope, ExtrapolationPolicy,
    InboundMessage, InterpolationMethod, OutboundMessage, ProtocolConfig, ProtocolHandler,
    QueryPoint, TestCase, TestResult,
};

#[derive(Parser)]
#[command(name = "perfchart")]
#[command(author = "Perfchart Developers")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Aircraft performance chart ingestion and validation", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    /// Protocol configuration file (JSON)
    #[arg(long, global = true, env = "PERFCHART_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a dataset at one input point
    Interpolate {
        /// Dataset file (JSON)
        #[arg(short, long)]
        dataset: PathBuf,

        /// Pressure altitude (ft)
        #[arg(long)]
        alt: Option<f64>,

        /// Outside air temperature (C)
        #[arg(long)]
        oat: Option<f64>,

        /// Mass (kg)
        #[arg(long)]
        mass: Option<f64>,

        /// Headwind component (kt)
        #[arg(long)]
        headwind: Option<f64>,

        /// Runway slope (%)
        #[arg(long)]
        slope: Option<f64>,

        /// Override the dataset's interpolation method
        #[arg(long, value_parser = parse_wire::<InterpolationMethod>)]
        method: Option<InterpolationMethod>,

        /// Override the dataset's extrapolation policy
        #[arg(long, value_parser = parse_wire::<ExtrapolationPolicy>)]
        policy: Option<ExtrapolationPolicy>,
    },

    /// Run test cases and structural checks against a dataset
    Validate {
        /// Dataset file (JSON)
        #[arg(short, long)]
        dataset: PathBuf,

        /// Test cases file (JSON array); defaults to the dataset's own cases
        #[arg(long)]
        cases: Option<PathBuf>,
    },

    /// Derive corrective adjustments from a failed test result
    Propose {
        /// Dataset file (JSON)
        #[arg(short, long)]
        dataset: PathBuf,

        /// Test result file (JSON)
        #[arg(short, long)]
        result: PathBuf,

        /// Write the adjusted dataset to this path
        #[arg(long)]
        apply: Option<PathBuf>,
    },

    /// Replay inbound protocol messages through the state machine
    Run {
        /// Messages file (JSON array of {type, data} envelopes)
        #[arg(short, long)]
        messages: PathBuf,

        /// Answer ABAC_TEST requests by evaluating the cases locally
        #[arg(long)]
        auto_test: bool,

        /// Write the compiled model here when the session finalizes
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    perfchart_core::telemetry::init_tracing(cli.json, level);

    let config = match &cli.config {
        Some(path) => ProtocolConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => ProtocolConfig::default(),
    };

    let outcome = match cli.command {
        Commands::Interpolate {
            dataset,
            alt,
            oat,
            mass,
            headwind,
            slope,
            method,
            policy,
        } => {
            let inputs = QueryPoint {
                pressure_alt_ft: alt,
                oat_c: oat,
                mass_kg: mass,
                headwind_kt: headwind,
                slope_percent: slope,
            };
            cmd_interpolate(&dataset, inputs, method, policy)
        }
        Commands::Validate { dataset, cases } => cmd_validate(&dataset, cases.as_deref()),
        Commands::Propose {
            dataset,
            result,
            apply,
        } => cmd_propose(&dataset, &result, apply.as_deref()),
        Commands::Run {
            messages,
            auto_test,
            out_dir,
        } => cmd_run(&messages, config, auto_test, out_dir.as_deref()),
    };

    METRICS.flush();
    outcome
}

/// Parse a snake_case wire name such as `linear_warn`.
fn parse_wire<T: DeserializeOwned>(raw: &str) -> std::result::Result<T, String> {
    serde_json::from_value(serde_json::Value::String(raw.to_string()))
        .map_err(|_| format!("unrecognized value '{raw}'"))
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Failed to parse {}", path.display()))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn cmd_interpolate(
    path: &Path,
    inputs: QueryPoint,
    method: Option<InterpolationMethod>,
    policy: Option<ExtrapolationPolicy>,
) -> Result<()> {
    let mut dataset: AbacDataset = read_json(path)?;
    if let Some(method) = method {
        dataset.interpolation.method = method;
    }
    if let Some(policy) = policy {
        dataset.interpolation.extrapolation_policy = policy;
    }

    let evaluation = evaluate(&dataset, &inputs)
        .with_context(|| format!("Cannot evaluate {} at {}", dataset.id, inputs))?;
    if evaluation.is_extrapolated() {
        warn!("value for {} is extrapolated", inputs);
    }
    print_json(&evaluation)
}

fn cmd_validate(path: &Path, cases: Option<&Path>) -> Result<()> {
    let dataset: AbacDataset = read_json(path)?;
    let cases: Vec<TestCase> = match cases {
        Some(p) => read_json(p)?,
        None => dataset.validation_tests.cases.clone(),
    };

    let report = validate_abac_data(&dataset);
    for warning in &report.warnings {
        warn!("{}", warning);
    }
    let result = execute_validation_tests(&dataset, &cases);
    info!(
        "{}: {}/{} cases passed, data quality {:.2}",
        dataset.id,
        result.summary.passed,
        cases.len(),
        report.data_quality
    );

    print_json(&serde_json::json!({ "report": report, "result": result }))
}

fn cmd_propose(dataset_path: &Path, result_path: &Path, apply: Option<&Path>) -> Result<()> {
    let dataset: AbacDataset = read_json(dataset_path)?;
    let result: TestResult = read_json(result_path)?;

    let proposals = propose_adjustments(&result, &dataset);
    if let Some(out) = apply {
        let revised = apply_adjustments(&dataset, &proposals);
        std::fs::write(out, serde_json::to_vec_pretty(&revised)?)
            .with_context(|| format!("Failed to write {}", out.display()))?;
        info!("Wrote adjusted dataset to {}", out.display());
    }
    print_json(&proposals)
}

fn cmd_run(path: &Path, config: ProtocolConfig, auto_test: bool, out_dir: Option<&Path>) -> Result<()> {
    let messages: Vec<Envelope> = read_json(path)?;
    for out in run_session(messages, config, auto_test, out_dir)? {
        println!("{}", serde_json::to_string(&out)?);
    }
    Ok(())
}

/// Feed `messages` to a fresh handler and collect every outbound message.
fn run_session(
    messages: Vec<Envelope>,
    config: ProtocolConfig,
    auto_test: bool,
    out_dir: Option<&Path>,
) -> Result<Vec<OutboundMessage>> {
    let mut handler = ProtocolHandler::new(config);
    let mut emitted = Vec::new();
    emitted.extend(handler.start());

    for envelope in messages {
        let mut response = handler.process_envelope(envelope);
        while let Some(out) = response.take() {
            if auto_test {
                if let OutboundMessage::AbacTest(test) = &out {
                    if let Some(dataset) = handler.state().current_dataset.as_ref() {
                        let result = execute_validation_tests(dataset, &test.cases);
                        emitted.push(out);
                        response = handler.process(InboundMessage::TestResult(result));
                        continue;
                    }
                }
            }
            if let (OutboundMessage::PerfModelSaveOk(saved), Some(dir)) = (&out, out_dir) {
                if let Some(model) = handler.state().compiled_model.as_ref() {
                    let written = write_model_artifact(model, dir, &saved.file)
                        .with_context(|| format!("Failed to write model to {}", dir.display()))?;
                    info!("Wrote compiled model to {}", written.display());
                }
            }
            emitted.push(out);
        }
    }
    Ok(emitted)
}
