//! Run summary output (text and JSON)
//!
//! Reports what a reconciliation run produced: the shared epoch, how much
//! each source contributed, which charts were written and which variables
//! were skipped.

use crate::pipeline::Comparison;
use crate::source::SourceKind;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::path::Path;

/// Format name carried by every JSON summary
pub const SUMMARY_FORMAT: &str = "tcpinfo-xval-summary-v1";

/// Per-source sample counts and time span
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonSource {
    /// Series name (kernelSocket, inKernelProbe, trafficGenerator)
    pub source: SourceKind,
    /// Short label used in legends
    pub label: String,
    pub samples: usize,
    /// First relative time in seconds
    pub first_s: f64,
    /// Last relative time in seconds
    pub last_s: f64,
    /// Records dropped by the lifecycle filter (line-delimited sources only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discarded: Option<usize>,
}

/// A variable that was rendered
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRendered {
    pub variable: String,
    pub chart: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub csv: Option<String>,
}

/// A variable that was skipped
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonSkipped {
    pub variable: String,
    pub source: SourceKind,
    pub key: String,
    pub sample_index: usize,
    pub reason: String,
}

/// Root summary structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    /// Format version identifier
    pub version: String,
    /// Format name
    pub format: String,
    /// Shared epoch, RFC 3339
    pub epoch: String,
    /// Source whose first sample defined the epoch
    pub epoch_source: SourceKind,
    pub sources: Vec<JsonSource>,
    pub rendered: Vec<JsonRendered>,
    pub skipped: Vec<JsonSkipped>,
}

impl RunSummary {
    /// Summarize a comparison; rendered outputs are added as they are written
    pub fn new(comparison: &Comparison) -> Self {
        let set = &comparison.set;
        let sources = set
            .iter()
            .map(|series| {
                let (first_s, last_s) = series.span().unwrap_or((0.0, 0.0));
                let discarded = comparison
                    .parse_stats
                    .iter()
                    .find(|(source, _)| *source == series.source)
                    .map(|(_, stats)| stats.discarded);
                JsonSource {
                    source: series.source,
                    label: series.source.label().to_string(),
                    samples: series.len(),
                    first_s,
                    last_s,
                    discarded,
                }
            })
            .collect();

        let skipped = comparison
            .reconciled
            .skipped
            .iter()
            .map(|s| JsonSkipped {
                variable: s.variable.clone(),
                source: s.source,
                key: s.key.clone(),
                sample_index: s.sample_index,
                reason: s.to_string(),
            })
            .collect();

        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            format: SUMMARY_FORMAT.to_string(),
            epoch: set.epoch().to_rfc3339(),
            epoch_source: set.epoch_source(),
            sources,
            rendered: Vec::new(),
            skipped,
        }
    }

    /// Record a written chart (and CSV export, if any)
    pub fn add_rendered(&mut self, variable: &str, chart: &Path, csv: Option<&Path>) {
        self.rendered.push(JsonRendered {
            variable: variable.to_string(),
            chart: chart.display().to_string(),
            csv: csv.map(|p| p.display().to_string()),
        });
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Human-readable summary
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "epoch: {} ({})", self.epoch, self.epoch_source);
        for source in &self.sources {
            let _ = write!(
                out,
                "  {:<8} {:>6} samples  {:>10.3}s .. {:.3}s",
                source.label, source.samples, source.first_s, source.last_s
            );
            if let Some(discarded) = source.discarded {
                let _ = write!(out, "  ({} records filtered)", discarded);
            }
            out.push('\n');
        }
        let _ = writeln!(out, "rendered {} variable(s):", self.rendered.len());
        for rendered in &self.rendered {
            let _ = write!(out, "  {:<10} {}", rendered.variable, rendered.chart);
            if let Some(csv) = &rendered.csv {
                let _ = write!(out, ", {}", csv);
            }
            out.push('\n');
        }
        if !self.skipped.is_empty() {
            let _ = writeln!(out, "skipped {} variable(s):", self.skipped.len());
            for skipped in &self.skipped {
                let _ = writeln!(out, "  {}", skipped.reason);
            }
        }
        out
    }
}
