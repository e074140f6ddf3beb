//! # ecsgen: ECS code generator driver
//!
//! Reads a declaration manifest produced by the discovery step, runs one
//! generation pass, and writes the registries, masks, and schedule as JSON
//! for the code emitter.
//!
//! Broken registries do not stop the pass: the output is always written, and
//! the process exits non-zero when any error diagnostic was raised.

mod report;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ecsgen_core::Generator;
use ecsgen_decl::{Manifest, Severity};
use report::Report;

#[derive(Parser)]
#[command(name = "ecsgen", about = "Allocate ECS IDs and validate system ordering")]
struct Args {
    /// Path to the JSON declaration manifest
    #[arg(short, long)]
    input: PathBuf,

    /// Where to write the generated JSON (stdout if omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Override the manifest's maximum ID
    #[arg(long)]
    max_id: Option<u32>,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,
}

fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    info!(input = %args.input.display(), "loading declaration manifest");
    let manifest = Manifest::load_file(&args.input)
        .with_context(|| format!("failed to load {}", args.input.display()))?;

    let mut config = manifest.config;
    if let Some(max_id) = args.max_id {
        config = config.with_max_id(max_id);
    }
    info!(
        declarations = manifest.declarations.len(),
        queries = manifest.queries.len(),
        max_id = config.max_id,
        "manifest loaded"
    );

    let output = Generator::new(config).run(&manifest.declarations, &manifest.queries);
    let report = Report::new(config, &output);
    report::log_diagnostics(report.diagnostics.iter().copied());

    let json = report.to_json(args.pretty).context("failed to serialize output")?;
    match &args.output {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!(output = %path.display(), "wrote generated output");
        }
        None => println!("{json}"),
    }

    let errors = report.count(Severity::Error);
    let warnings = report.count(Severity::Warning);
    info!(errors, warnings, "done");

    Ok(if errors > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}
