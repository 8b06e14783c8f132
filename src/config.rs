//! Reconciliation configuration
//!
//! Everything the pipeline needs to know about the capture formats lives
//! here and is passed explicitly into each stage. Defaults describe the
//! firefly JSON lines written by flowd-go and the JSON report of `iperf3 -J`.
//!
//! # Example
//! ```
//! use tcpinfo_xval::config::ReconcileConfig;
//!
//! let config = ReconcileConfig::from_toml_str(r#"
//! lifecycle_state = "ongoing"
//! segment_size_key = "sndMss"
//! "#).unwrap();
//! assert_eq!(config.variables.len(), 5);
//! assert!(config.validate().is_ok());
//! ```

use crate::derive::{Derivation, FieldDescriptor, NameMap};
use crate::error::{Result, XvalError};
use crate::source::SourceKind;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// 2^20, used to present byte quantities as MiB
pub const MIB: f64 = 1_048_576.0;

/// Configuration shared by all pipeline stages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileConfig {
    /// Lifecycle state kept by the record parser; all others are discarded
    pub lifecycle_state: String,

    /// Substructure holding netlink (`sock_diag`) measurements
    pub kernel_capture_key: String,

    /// Substructure holding sk_ops eBPF measurements
    pub probe_capture_key: String,

    /// Numeric bundle nested inside each capture substructure
    pub metrics_key: String,

    /// Index of the iperf3 stream compared against the kernel sources
    pub generator_stream: usize,

    /// Per-sample segment size used by [`Derivation::SegmentScaled`]
    pub segment_size_key: String,

    /// Logical name -> iperf3 key overrides, layered over the defaults
    #[serde(deserialize_with = "over_default_names")]
    pub name_overrides: NameMap,

    /// Variables to reconcile and plot, in output order
    pub variables: Vec<FieldDescriptor>,
}

fn over_default_names<'de, D>(deserializer: D) -> std::result::Result<NameMap, D::Error>
where
    D: Deserializer<'de>,
{
    let overrides = NameMap::deserialize(deserializer)?;
    Ok(NameMap::default().merged(overrides))
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            lifecycle_state: "ongoing".to_string(),
            kernel_capture_key: "netlink".to_string(),
            probe_capture_key: "skOps".to_string(),
            metrics_key: "tcpInfo".to_string(),
            generator_stream: 0,
            segment_size_key: "sndMss".to_string(),
            name_overrides: NameMap::default(),
            variables: default_variables(),
        }
    }
}

/// The five metrics every source tracks in a standard capture
pub fn default_variables() -> Vec<FieldDescriptor> {
    vec![
        FieldDescriptor::new("rtt", "RTT", "RTT [us]"),
        FieldDescriptor::new("rttVar", "RTT Variance", "RTT Var [us]"),
        FieldDescriptor::new(
            "sndCwnd",
            "Sender's Congestion Window",
            "Congestion Window [MiB]",
        )
        .with_scale(MIB)
        .with_kernel_derivation(Derivation::SegmentScaled),
        FieldDescriptor::new("pMtu", "Path MTU", "PMTU [bytes]"),
        FieldDescriptor::new("bytesSent", "Sent Bytes", "Data [MiB]")
            .with_scale(MIB)
            .with_generator_derivation(Derivation::RunningSum),
    ]
}

impl ReconcileConfig {
    /// Parse a TOML document; missing keys take their default values
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| XvalError::Config(e.to_string()))
    }

    /// Load and validate a TOML configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| XvalError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Capture substructure for a line-delimited source
    pub fn capture_key(&self, source: SourceKind) -> Option<&str> {
        match source {
            SourceKind::KernelSocket => Some(&self.kernel_capture_key),
            SourceKind::InKernelProbe => Some(&self.probe_capture_key),
            SourceKind::TrafficGenerator => None,
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let keys = [
            ("lifecycle_state", &self.lifecycle_state),
            ("kernel_capture_key", &self.kernel_capture_key),
            ("probe_capture_key", &self.probe_capture_key),
            ("metrics_key", &self.metrics_key),
            ("segment_size_key", &self.segment_size_key),
        ];
        for (name, value) in keys {
            if value.is_empty() {
                return Err(XvalError::Config(format!("{} must not be empty", name)));
            }
        }

        if self.variables.is_empty() {
            return Err(XvalError::Config(
                "at least one variable must be configured".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for descriptor in &self.variables {
            if descriptor.variable.is_empty() {
                return Err(XvalError::Config(
                    "variable names must not be empty".to_string(),
                ));
            }
            if !seen.insert(descriptor.variable.as_str()) {
                return Err(XvalError::Config(format!(
                    "variable '{}' is configured twice",
                    descriptor.variable
                )));
            }
            if !descriptor.scale.is_finite() || descriptor.scale <= 0.0 {
                return Err(XvalError::Config(format!(
                    "scale of '{}' must be a positive number, got {}",
                    descriptor.variable, descriptor.scale
                )));
            }
        }

        Ok(())
    }
}
