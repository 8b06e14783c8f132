// Derived-field computation
//
// Turns aligned samples into plot-ready (time, value) points, one series per
// source, for every configured variable. All three series of a variable end
// up in the same physical unit and the same scale.

use super::descriptor::{Derivation, FieldDescriptor, NameMap};
use crate::align::{Series, SeriesSet};
use crate::config::ReconcileConfig;
use crate::source::SourceKind;
use std::fmt;
use tracing::{debug, warn};

/// Plot-ready points of one source for one variable
#[derive(Debug, Clone, PartialEq)]
pub struct PlotSeries {
    pub source: SourceKind,
    /// (relative time in seconds, scaled value)
    pub points: Vec<(f64, f64)>,
}

/// A variable resolved for all three sources
#[derive(Debug, Clone, PartialEq)]
pub struct VariableSeries {
    pub descriptor: FieldDescriptor,
    /// One entry per source, in source order
    pub series: Vec<PlotSeries>,
}

impl VariableSeries {
    pub fn get(&self, source: SourceKind) -> Option<&PlotSeries> {
        self.series.iter().find(|s| s.source == source)
    }

    /// Bounding box of all points as ((x_min, x_max), (y_min, y_max))
    pub fn bounds(&self) -> Option<((f64, f64), (f64, f64))> {
        let mut points = self.series.iter().flat_map(|s| s.points.iter());
        let &(x, y) = points.next()?;
        let init = ((x, x), (y, y));
        Some(points.fold(init, |((x0, x1), (y0, y1)), &(x, y)| {
            ((x0.min(x), x1.max(x)), (y0.min(y), y1.max(y)))
        }))
    }
}

/// A variable that could not be resolved for one source
///
/// Not fatal: the variable is skipped and all others proceed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedVariable {
    pub variable: String,
    pub source: SourceKind,
    /// Key that was looked up
    pub key: String,
    /// Index of the first sample lacking the key
    pub sample_index: usize,
}

impl fmt::Display for UnresolvedVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "variable '{}' unresolved for {}: key '{}' missing from sample {}",
            self.variable, self.source, self.key, self.sample_index
        )
    }
}

/// Outcome of computing every configured variable
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reconciled {
    pub variables: Vec<VariableSeries>,
    pub skipped: Vec<UnresolvedVariable>,
}

/// Computes derived, unit-reconciled fields from aligned series
#[derive(Debug, Clone, Copy)]
pub struct DerivedFieldComputer<'a> {
    names: &'a NameMap,
    segment_size_key: &'a str,
}

impl<'a> DerivedFieldComputer<'a> {
    pub fn new(config: &'a ReconcileConfig) -> Self {
        Self {
            names: &config.name_overrides,
            segment_size_key: &config.segment_size_key,
        }
    }

    /// Resolve one variable for all three sources
    pub fn compute(
        &self,
        set: &SeriesSet,
        descriptor: &FieldDescriptor,
    ) -> Result<VariableSeries, UnresolvedVariable> {
        let series = set
            .iter()
            .map(|series| self.compute_series(series, descriptor))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(VariableSeries {
            descriptor: descriptor.clone(),
            series,
        })
    }

    /// Resolve every descriptor, skipping the unresolvable ones
    pub fn compute_all(&self, set: &SeriesSet, descriptors: &[FieldDescriptor]) -> Reconciled {
        let mut reconciled = Reconciled::default();

        for descriptor in descriptors {
            match self.compute(set, descriptor) {
                Ok(variable) => {
                    debug!(
                        "resolved '{}' ({} points)",
                        descriptor.variable,
                        variable.series.iter().map(|s| s.points.len()).sum::<usize>()
                    );
                    reconciled.variables.push(variable);
                }
                Err(unresolved) => {
                    warn!("skipping {}", unresolved);
                    reconciled.skipped.push(unresolved);
                }
            }
        }

        reconciled
    }

    fn compute_series(
        &self,
        series: &Series,
        descriptor: &FieldDescriptor,
    ) -> Result<PlotSeries, UnresolvedVariable> {
        let key = descriptor.key_for(series.source, self.names);
        let derivation = descriptor.derivation_for(series.source);

        let unresolved = |key: &str, sample_index: usize| UnresolvedVariable {
            variable: descriptor.variable.clone(),
            source: series.source,
            key: key.to_string(),
            sample_index,
        };

        let mut raw = Vec::with_capacity(series.samples.len());
        for (idx, sample) in series.samples.iter().enumerate() {
            let value = *sample.fields.get(&key).ok_or_else(|| unresolved(&key, idx))?;
            let value = match derivation {
                Derivation::SegmentScaled => {
                    let segment_size = *sample
                        .fields
                        .get(self.segment_size_key)
                        .ok_or_else(|| unresolved(self.segment_size_key, idx))?;
                    segment_scaled(value, segment_size)
                }
                Derivation::Identity | Derivation::RunningSum => value,
            };
            raw.push(value);
        }

        if derivation == Derivation::RunningSum {
            raw = running_total(&raw);
        }

        let points = series
            .samples
            .iter()
            .zip(raw)
            .map(|(sample, value)| (sample.relative_time, value / descriptor.scale))
            .collect();

        Ok(PlotSeries {
            source: series.source,
            points,
        })
    }
}

/// Convert a window in segments to bytes
pub fn segment_scaled(segments: f64, segment_size: f64) -> f64 {
    segments * segment_size
}

/// Cumulative totals of per-interval deltas
///
/// `total[0] = delta[0]` and `total[i] = total[i - 1] + delta[i]`.
///
/// # Example
/// ```
/// use tcpinfo_xval::derive::running_total;
///
/// assert_eq!(running_total(&[1000.0, 2500.0, 500.0]), vec![1000.0, 3500.0, 4000.0]);
/// ```
pub fn running_total(deltas: &[f64]) -> Vec<f64> {
    deltas
        .iter()
        .scan(0.0, |total, delta| {
            *total += delta;
            Some(*total)
        })
        .collect()
}
