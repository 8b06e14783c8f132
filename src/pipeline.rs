//! End-to-end reconciliation
//!
//! RecordParser -> TimestampNormalizer -> TimeAligner -> DerivedFieldComputer.
//! Each stage consumes the previous stage's output by value or shared
//! reference and never reaches back upstream.

use crate::align::{align, SeriesSet};
use crate::config::ReconcileConfig;
use crate::derive::{DerivedFieldComputer, Reconciled};
use crate::error::Result;
use crate::record::{read_input, ParseStats, RecordParser};
use crate::source::SourceKind;
use crate::timestamp::{normalize_generator, normalize_records};
use std::path::PathBuf;
use tracing::info;

/// Paths of the three capture files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inputs {
    /// Firefly JSON lines carrying netlink measurements
    pub kernel: PathBuf,
    /// Firefly JSON lines carrying sk_ops measurements
    pub probe: PathBuf,
    /// iperf3 JSON report
    pub generator: PathBuf,
}

/// In-memory capture contents with the names used in diagnostics
#[derive(Debug, Clone, Copy)]
pub struct InputTexts<'a> {
    pub kernel: (&'a str, &'a str),
    pub probe: (&'a str, &'a str),
    pub generator: (&'a str, &'a str),
}

/// Everything produced by one run
#[derive(Debug, Clone)]
pub struct Comparison {
    pub set: SeriesSet,
    pub reconciled: Reconciled,
    /// Lifecycle filter counters for the kernel and probe files
    pub parse_stats: [(SourceKind, ParseStats); 2],
}

/// Read the capture files and reconcile them
///
/// When the kernel and probe paths are the same file (the usual flowd-go
/// capture, which stores both enrichments in one firefly stream) it is read
/// and parsed once.
pub fn run(inputs: &Inputs, config: &ReconcileConfig) -> Result<Comparison> {
    let kernel_text = read_input(&inputs.kernel)?;
    let probe_text = if inputs.probe == inputs.kernel {
        None
    } else {
        Some(read_input(&inputs.probe)?)
    };
    let generator_text = read_input(&inputs.generator)?;

    let kernel_origin = inputs.kernel.display().to_string();
    let probe_origin = inputs.probe.display().to_string();
    let generator_origin = inputs.generator.display().to_string();

    reconcile(
        InputTexts {
            kernel: (&kernel_origin, &kernel_text),
            probe: (&probe_origin, probe_text.as_deref().unwrap_or(&kernel_text)),
            generator: (&generator_origin, &generator_text),
        },
        config,
    )
}

/// Reconcile captures that are already in memory
///
/// A probe capture with the same origin as the kernel capture is one shared
/// firefly file: its records are routed by the capture substructure they
/// carry. Separate files must carry their own substructure on every kept
/// record.
pub fn reconcile(texts: InputTexts<'_>, config: &ReconcileConfig) -> Result<Comparison> {
    let parser = RecordParser::new(config);

    let (kernel_origin, kernel_text) = texts.kernel;
    let (probe_origin, probe_text) = texts.probe;
    let (kernel_records, kernel_stats, probe_records, probe_stats) =
        if probe_origin == kernel_origin {
            let shared = parser.parse_shared(kernel_text, kernel_origin)?;
            (shared.kernel, shared.stats, shared.probe, shared.stats)
        } else {
            let (kernel_records, kernel_stats) =
                parser.parse_line_delimited(kernel_text, SourceKind::KernelSocket, kernel_origin)?;
            let (probe_records, probe_stats) =
                parser.parse_line_delimited(probe_text, SourceKind::InKernelProbe, probe_origin)?;
            (kernel_records, kernel_stats, probe_records, probe_stats)
        };
    let (generator_origin, generator_text) = texts.generator;
    let report = parser.parse_generator(generator_text, generator_origin)?;

    let kernel = normalize_records(kernel_records, SourceKind::KernelSocket, kernel_origin)?;
    let probe = normalize_records(probe_records, SourceKind::InKernelProbe, probe_origin)?;
    let generator = normalize_generator(report, generator_origin)?;

    for series in [&kernel, &probe, &generator] {
        info!("loaded {} {} samples", series.samples.len(), series.source);
    }

    let set = align(kernel, probe, generator)?;
    info!(
        "epoch {} taken from {}",
        set.epoch().to_rfc3339(),
        set.epoch_source()
    );

    let reconciled = DerivedFieldComputer::new(config).compute_all(&set, &config.variables);

    Ok(Comparison {
        set,
        reconciled,
        parse_stats: [
            (SourceKind::KernelSocket, kernel_stats),
            (SourceKind::InKernelProbe, probe_stats),
        ],
    })
}
