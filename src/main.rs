use anyhow::{Context, Result};
use clap::Parser;
use std::path::Path;
use tcpinfo_xval::{
    chart::ChartRenderer,
    cli::{Cli, OutputFormat},
    config::ReconcileConfig,
    csv_output::CsvOutput,
    json_output::RunSummary,
    pipeline::{self, Inputs},
};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber
///
/// RUST_LOG directives win when set; otherwise info, or trace with --debug.
fn init_tracing(debug: bool) {
    let level = if debug { "trace" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<ReconcileConfig> {
    match path {
        Some(path) => ReconcileConfig::from_file(path)
            .with_context(|| format!("Failed to load configuration {}", path.display())),
        None => Ok(ReconcileConfig::default()),
    }
}

/// Directory the output files land in
///
/// A prefix ending in a separator names the directory itself; otherwise the
/// last component is a file-name prefix.
fn prefix_dir(prefix: &str) -> Option<&Path> {
    let path = Path::new(prefix);
    if prefix.ends_with('/') || prefix.ends_with(std::path::MAIN_SEPARATOR) {
        return Some(path);
    }
    path.parent().filter(|parent| !parent.as_os_str().is_empty())
}

/// Create the directories the output prefix points into
fn ensure_prefix_dir(prefix: &str) -> Result<()> {
    if let Some(dir) = prefix_dir(prefix) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create output directory {}", dir.display()))?;
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Cli::parse();

    init_tracing(args.debug);

    let config = load_config(args.config.as_deref())?;

    let inputs = Inputs {
        kernel: args.firefly_path.clone(),
        probe: args.skops_path().clone(),
        generator: args.iperf3_path.clone(),
    };

    let comparison = pipeline::run(&inputs, &config).context("Failed to reconcile captures")?;

    ensure_prefix_dir(&args.prefix)?;
    let renderer = ChartRenderer::new(&args.prefix, args.cong_alg.as_deref());
    let mut summary = RunSummary::new(&comparison);

    for variable in &comparison.reconciled.variables {
        let name = &variable.descriptor.variable;
        let chart = renderer
            .render(variable)
            .with_context(|| format!("Failed to render '{}'", name))?;

        let csv = if args.csv {
            let path = CsvOutput::output_path(&args.prefix, name);
            CsvOutput::new(variable)
                .write(&path)
                .with_context(|| format!("Failed to export '{}'", name))?;
            Some(path)
        } else {
            None
        };

        info!("rendered '{}' to {}", name, chart.display());
        summary.add_rendered(name, &chart, csv.as_deref());
    }

    match args.format {
        OutputFormat::Text => print!("{}", summary.to_text()),
        OutputFormat::Json => println!("{}", summary.to_json()?),
    }

    Ok(())
}
