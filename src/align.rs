//! Alignment of the three sources onto one relative time axis
//!
//! The earliest first instant across all three series becomes epoch zero and
//! every sample is rebased to seconds since that epoch. Samples are never
//! re-sorted or resampled.

use crate::error::{Result, XvalError};
use crate::record::FieldBundle;
use crate::source::SourceKind;
use crate::timestamp::TimedSeries;
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

/// A measurement on the shared time axis
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    /// Seconds since the epoch of the [`SeriesSet`]
    pub relative_time: f64,
    pub fields: FieldBundle,
}

/// Ordered samples of one source
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub source: SourceKind,
    pub samples: Vec<Sample>,
}

impl Series {
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Time covered by the series, in relative seconds
    pub fn span(&self) -> Option<(f64, f64)> {
        let first = self.samples.first()?.relative_time;
        let last = self.samples.last()?.relative_time;
        Some((first, last))
    }
}

/// Exactly one series per source, sharing one epoch
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesSet {
    epoch: DateTime<Utc>,
    epoch_source: SourceKind,
    series: [Series; 3],
}

impl SeriesSet {
    /// Absolute instant mapped to relative time 0.0
    pub fn epoch(&self) -> DateTime<Utc> {
        self.epoch
    }

    /// Source whose first sample defined the epoch
    pub fn epoch_source(&self) -> SourceKind {
        self.epoch_source
    }

    pub fn get(&self, source: SourceKind) -> &Series {
        // Series are stored in SourceKind::ALL order.
        &self.series[source as usize]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Series> {
        self.series.iter()
    }
}

/// Rebase three normalized streams onto their common epoch
///
/// When several sources share the minimal first instant the earliest one in
/// source order is reported as the epoch source; all of them start at 0.0.
pub fn align(
    kernel: TimedSeries,
    probe: TimedSeries,
    generator: TimedSeries,
) -> Result<SeriesSet> {
    let streams = [kernel, probe, generator];

    for (expected, stream) in SourceKind::ALL.iter().zip(&streams) {
        if stream.source != *expected {
            return Err(XvalError::Config(format!(
                "expected the {} series, got {}",
                expected, stream.source
            )));
        }
    }

    let mut epoch: Option<(DateTime<Utc>, SourceKind)> = None;
    for stream in &streams {
        let first = stream
            .first_instant()
            .ok_or_else(|| XvalError::EmptySeries(stream.source.to_string()))?;
        if epoch.map_or(true, |(current, _)| first < current) {
            epoch = Some((first, stream.source));
        }
    }
    let (epoch, epoch_source) =
        epoch.ok_or_else(|| XvalError::EmptySeries(SourceKind::KernelSocket.to_string()))?;

    debug!("epoch {} defined by {}", epoch, epoch_source);

    let series = streams.map(|stream| rebase(stream, epoch));

    Ok(SeriesSet {
        epoch,
        epoch_source,
        series,
    })
}

fn rebase(stream: TimedSeries, epoch: DateTime<Utc>) -> Series {
    let source = stream.source;
    let samples: Vec<Sample> = stream
        .samples
        .into_iter()
        .map(|sample| Sample {
            relative_time: seconds_between(epoch, sample.instant),
            fields: sample.fields,
        })
        .collect();

    if let Some(idx) = samples.iter().position(|s| s.relative_time < 0.0) {
        warn!(
            "{} sample {} precedes the epoch; input is not sorted by collection time",
            source, idx
        );
    }

    Series { source, samples }
}

/// Signed seconds from `from` to `to`
pub fn seconds_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    let delta = to - from;
    match delta.num_nanoseconds() {
        Some(nanos) => nanos as f64 / 1e9,
        None => delta.num_milliseconds() as f64 / 1e3,
    }
}
