// Table-driven description of one plotted variable
//
// A FieldDescriptor names the key each source stores the quantity under and
// the per-sample derivation that turns the native value into the shared unit.
// Adding a source or a variable means adding a descriptor entry, never a new
// code path.

use crate::source::SourceKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-sample transformation applied before the scale divisor
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Derivation {
    /// Use the native value as-is
    #[default]
    Identity,
    /// Multiply by the sample's own segment size (segments -> bytes)
    SegmentScaled,
    /// Running total of per-interval deltas (deltas -> cumulative)
    RunningSum,
}

/// Logical variable and how to extract it from every source
///
/// # Example
/// ```
/// use tcpinfo_xval::derive::{Derivation, FieldDescriptor, NameMap};
/// use tcpinfo_xval::source::SourceKind;
///
/// let cwnd = FieldDescriptor::new("sndCwnd", "Sender's Congestion Window", "Congestion Window [MiB]")
///     .with_scale(1048576.0)
///     .with_kernel_derivation(Derivation::SegmentScaled);
///
/// let names = NameMap::default();
/// assert_eq!(cwnd.key_for(SourceKind::KernelSocket, &names), "sndCwnd");
/// assert_eq!(cwnd.key_for(SourceKind::TrafficGenerator, &names), "snd_cwnd");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// Logical name; also the key used by netlink and sk_ops records
    pub variable: String,

    /// Chart title
    pub title: String,

    /// Y axis label, including the unit after scaling
    pub y_label: String,

    /// Divisor applied uniformly to all three series
    #[serde(default = "default_scale")]
    pub scale: f64,

    /// Derivation for kernelSocket and inKernelProbe samples
    #[serde(default)]
    pub kernel_derivation: Derivation,

    /// Derivation for trafficGenerator samples
    #[serde(default)]
    pub generator_derivation: Derivation,

    /// Explicit key for kernelSocket records (defaults to `variable`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kernel_key: Option<String>,

    /// Explicit key for inKernelProbe records (defaults to `variable`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub probe_key: Option<String>,

    /// Explicit key for trafficGenerator records (defaults to the name table)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generator_key: Option<String>,
}

fn default_scale() -> f64 {
    1.0
}

impl FieldDescriptor {
    /// Create a descriptor with unit scale and identity derivations
    pub fn new(variable: &str, title: &str, y_label: &str) -> Self {
        Self {
            variable: variable.to_string(),
            title: title.to_string(),
            y_label: y_label.to_string(),
            scale: default_scale(),
            kernel_derivation: Derivation::Identity,
            generator_derivation: Derivation::Identity,
            kernel_key: None,
            probe_key: None,
            generator_key: None,
        }
    }

    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_kernel_derivation(mut self, derivation: Derivation) -> Self {
        self.kernel_derivation = derivation;
        self
    }

    pub fn with_generator_derivation(mut self, derivation: Derivation) -> Self {
        self.generator_derivation = derivation;
        self
    }

    pub fn with_generator_key(mut self, key: &str) -> Self {
        self.generator_key = Some(key.to_string());
        self
    }

    /// Key under which `source` stores this variable
    pub fn key_for(&self, source: SourceKind, names: &NameMap) -> String {
        let explicit = match source {
            SourceKind::KernelSocket => self.kernel_key.as_ref(),
            SourceKind::InKernelProbe => self.probe_key.as_ref(),
            SourceKind::TrafficGenerator => self.generator_key.as_ref(),
        };

        match explicit {
            Some(key) => key.clone(),
            None if source.is_kernel_native() => self.variable.clone(),
            None => names.resolve(&self.variable),
        }
    }

    /// Derivation applied to samples of `source`
    pub fn derivation_for(&self, source: SourceKind) -> Derivation {
        if source.is_kernel_native() {
            self.kernel_derivation
        } else {
            self.generator_derivation
        }
    }
}

/// Case-insensitive logical-name -> generator-key table
///
/// Names without an override map to their lower-cased form, which is how
/// iperf3 spells most TCP metrics (`rttVar` -> `rttvar`, `pMtu` -> `pmtu`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NameMap {
    overrides: BTreeMap<String, String>,
}

impl NameMap {
    /// Build a table from (logical name, generator key) pairs
    pub fn new<I, K, V>(overrides: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            overrides: overrides
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Generator-side key for a logical variable
    pub fn resolve(&self, variable: &str) -> String {
        self.overrides
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(variable))
            .map(|(_, key)| key.clone())
            .unwrap_or_else(|| variable.to_lowercase())
    }

    /// Layer `other` over this table; its entries replace same-named ones
    /// regardless of case
    pub fn merged(mut self, other: NameMap) -> Self {
        for (name, key) in other.overrides {
            self.overrides
                .retain(|existing, _| !existing.eq_ignore_ascii_case(&name));
            self.overrides.insert(name, key);
        }
        self
    }

    pub fn len(&self) -> usize {
        self.overrides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.overrides.is_empty()
    }
}

impl Default for NameMap {
    fn default() -> Self {
        // iperf3 reports the congestion window in bytes under snd_cwnd and
        // per-interval byte deltas under bytes.
        Self::new([("sndcwnd", "snd_cwnd"), ("bytessent", "bytes")])
    }
}
