//! Decoding of raw capture files
//!
//! Two formats are understood:
//! - JSON lines of fireflies, one record per line, each carrying a
//!   `flow-lifecycle` header and per-capture-method `tcpInfo` bundles
//! - the single JSON document produced by `iperf3 -J`
//!
//! Records are decoded into flat numeric field bundles. Nothing here knows
//! about the other sources or about time.

use crate::config::ReconcileConfig;
use crate::error::{line_at, Result, XvalError};
use crate::source::SourceKind;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

/// Numeric fields of one measurement, keyed by their native name
pub type FieldBundle = BTreeMap<String, f64>;

/// One kept line of a line-delimited capture
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    /// 1-based line number in the originating file
    pub line: usize,
    /// Composite timestamp exactly as written by the collector
    pub timestamp: String,
    /// Numeric measurement fields
    pub fields: FieldBundle,
}

/// One iperf3 interval
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorInterval {
    /// Position in the `intervals` array
    pub index: usize,
    /// Interval duration in seconds
    pub seconds: f64,
    /// Numeric fields of the selected stream
    pub fields: FieldBundle,
}

/// Decoded iperf3 report
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorReport {
    /// `start.timestamp.time`, e.g. `Sat, 02 Nov 2024 16:07:01 GMT`
    pub start_time: String,
    pub intervals: Vec<GeneratorInterval>,
}

/// Record counters for one line-delimited file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseStats {
    /// Non-blank lines decoded
    pub lines: usize,
    /// Records dropped by the lifecycle filter
    pub discarded: usize,
}

/// Both line-delimited captures decoded from one shared file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SharedCapture {
    pub kernel: Vec<RawRecord>,
    pub probe: Vec<RawRecord>,
    pub stats: ParseStats,
}

/// A record that passed the lifecycle filter
struct KeptLine {
    line: usize,
    timestamp: String,
    doc: Map<String, Value>,
}

/// Decoder for the capture formats
#[derive(Debug, Clone, Copy)]
pub struct RecordParser<'a> {
    config: &'a ReconcileConfig,
}

impl<'a> RecordParser<'a> {
    pub fn new(config: &'a ReconcileConfig) -> Self {
        Self { config }
    }

    /// Decode a line-delimited capture for `source`
    ///
    /// Records whose lifecycle state differs from the configured one are
    /// discarded. Every kept record must carry the source's capture
    /// substructure; its absence means the capture run is structurally
    /// incompatible and aborts the parse.
    pub fn parse_line_delimited(
        &self,
        text: &str,
        source: SourceKind,
        origin: &str,
    ) -> Result<(Vec<RawRecord>, ParseStats)> {
        let capture_key = self.config.capture_key(source).ok_or_else(|| {
            XvalError::Config(format!("{} is not a line-delimited source", source))
        })?;

        let mut records = Vec::new();
        let mut stats = ParseStats::default();

        for (idx, line) in text.lines().enumerate() {
            let Some(kept) = self.decode_line(line, idx + 1, origin, &mut stats)? else {
                continue;
            };
            records.push(self.extract(&kept, capture_key, origin)?);
        }

        debug!(
            "{}: {} {} records kept, {} discarded by lifecycle filter",
            origin,
            records.len(),
            source,
            stats.discarded
        );

        Ok((records, stats))
    }

    /// Decode one file that holds both the netlink and the sk_ops capture
    ///
    /// Each kept record is routed by the capture substructures it carries:
    /// to the kernel series, the probe series, or both. A kept record with
    /// neither substructure aborts the parse.
    pub fn parse_shared(&self, text: &str, origin: &str) -> Result<SharedCapture> {
        let kernel_key = self.config.kernel_capture_key.as_str();
        let probe_key = self.config.probe_capture_key.as_str();

        let mut capture = SharedCapture::default();

        for (idx, line) in text.lines().enumerate() {
            let Some(kept) = self.decode_line(line, idx + 1, origin, &mut capture.stats)? else {
                continue;
            };

            let has_kernel = carries(&kept.doc, kernel_key);
            let has_probe = carries(&kept.doc, probe_key);
            if !has_kernel && !has_probe {
                return Err(missing(
                    origin,
                    &line_at(kept.line),
                    &format!("{} or {}", kernel_key, probe_key),
                ));
            }
            if has_kernel {
                capture.kernel.push(self.extract(&kept, kernel_key, origin)?);
            }
            if has_probe {
                capture.probe.push(self.extract(&kept, probe_key, origin)?);
            }
        }

        debug!(
            "{}: {} netlink and {} sk_ops records kept, {} discarded by lifecycle filter",
            origin,
            capture.kernel.len(),
            capture.probe.len(),
            capture.stats.discarded
        );

        Ok(capture)
    }

    /// Decode one line; `None` for blank lines and filtered lifecycle states
    fn decode_line(
        &self,
        line: &str,
        number: usize,
        origin: &str,
        stats: &mut ParseStats,
    ) -> Result<Option<KeptLine>> {
        if line.trim().is_empty() {
            return Ok(None);
        }
        let at = line_at(number);
        stats.lines += 1;

        let value: Value = serde_json::from_str(line).map_err(|e| XvalError::MalformedInput {
            origin: origin.to_string(),
            at: at.clone(),
            reason: e.to_string(),
        })?;
        let doc = match value {
            Value::Object(doc) => doc,
            _ => return Err(malformed(origin, &at, "record is not a JSON object")),
        };

        let lifecycle = require_object(&doc, "flow-lifecycle", "flow-lifecycle", origin, &at)?;
        let state = require_str(lifecycle, "state", "flow-lifecycle.state", origin, &at)?;
        if state != self.config.lifecycle_state {
            stats.discarded += 1;
            return Ok(None);
        }
        let timestamp = require_str(
            lifecycle,
            "current-time",
            "flow-lifecycle.current-time",
            origin,
            &at,
        )?
        .to_string();

        Ok(Some(KeptLine {
            line: number,
            timestamp,
            doc,
        }))
    }

    /// Pull the metrics bundle of one capture out of a kept record
    fn extract(&self, kept: &KeptLine, capture_key: &str, origin: &str) -> Result<RawRecord> {
        let at = line_at(kept.line);
        let capture = require_object(&kept.doc, capture_key, capture_key, origin, &at)?;
        let metrics_path = format!("{}.{}", capture_key, self.config.metrics_key);
        let metrics = require_object(capture, &self.config.metrics_key, &metrics_path, origin, &at)?;

        Ok(RawRecord {
            line: kept.line,
            timestamp: kept.timestamp.clone(),
            fields: numeric_fields(metrics),
        })
    }

    /// Decode an iperf3 JSON report
    pub fn parse_generator(&self, text: &str, origin: &str) -> Result<GeneratorReport> {
        let value: Value = serde_json::from_str(text).map_err(|e| XvalError::MalformedInput {
            origin: origin.to_string(),
            at: line_at(e.line()),
            reason: e.to_string(),
        })?;
        let doc = as_object(&value, origin, "document", "report")?;

        let start = require_object(doc, "start", "start", origin, "document")?;
        let timestamp = require_object(start, "timestamp", "start.timestamp", origin, "document")?;
        let start_time = require_str(timestamp, "time", "start.timestamp.time", origin, "document")?;

        let intervals = doc
            .get("intervals")
            .ok_or_else(|| missing(origin, "document", "intervals"))?
            .as_array()
            .ok_or_else(|| malformed(origin, "document", "'intervals' is not an array"))?;

        let stream_idx = self.config.generator_stream;
        let mut parsed = Vec::with_capacity(intervals.len());

        for (index, interval) in intervals.iter().enumerate() {
            let at = format!("intervals[{}]", index);
            let interval = as_object(interval, origin, &at, "interval")?;

            let streams = interval
                .get("streams")
                .ok_or_else(|| missing(origin, &at, "streams"))?
                .as_array()
                .ok_or_else(|| malformed(origin, &at, "'streams' is not an array"))?;
            let stream_path = format!("streams[{}]", stream_idx);
            let stream = streams
                .get(stream_idx)
                .ok_or_else(|| missing(origin, &at, &stream_path))?;
            let stream = as_object(stream, origin, &at, &stream_path)?;

            let seconds = stream
                .get("seconds")
                .ok_or_else(|| missing(origin, &at, &format!("{}.seconds", stream_path)))?
                .as_f64()
                .ok_or_else(|| malformed(origin, &at, "'seconds' is not a number"))?;

            parsed.push(GeneratorInterval {
                index,
                seconds,
                fields: numeric_fields(stream),
            });
        }

        debug!("{}: {} iperf3 intervals", origin, parsed.len());

        Ok(GeneratorReport {
            start_time: start_time.to_string(),
            intervals: parsed,
        })
    }
}

/// Read a whole capture file into memory
pub fn read_input(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|source| XvalError::Io {
        path: path.display().to_string(),
        source,
    })
}

fn numeric_fields(map: &Map<String, Value>) -> FieldBundle {
    map.iter()
        .filter_map(|(k, v)| v.as_f64().map(|n| (k.clone(), n)))
        .collect()
}

fn carries(doc: &Map<String, Value>, key: &str) -> bool {
    doc.get(key).is_some_and(|v| !v.is_null())
}

fn missing(origin: &str, at: &str, field: &str) -> XvalError {
    XvalError::MissingField {
        origin: origin.to_string(),
        at: at.to_string(),
        field: field.to_string(),
    }
}

fn malformed(origin: &str, at: &str, reason: &str) -> XvalError {
    XvalError::MalformedInput {
        origin: origin.to_string(),
        at: at.to_string(),
        reason: reason.to_string(),
    }
}

fn as_object<'v>(
    value: &'v Value,
    origin: &str,
    at: &str,
    what: &str,
) -> Result<&'v Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| malformed(origin, at, &format!("{} is not a JSON object", what)))
}

fn require_object<'v>(
    map: &'v Map<String, Value>,
    key: &str,
    path: &str,
    origin: &str,
    at: &str,
) -> Result<&'v Map<String, Value>> {
    match map.get(key) {
        None | Some(Value::Null) => Err(missing(origin, at, path)),
        Some(value) => as_object(value, origin, at, &format!("'{}'", path)),
    }
}

fn require_str<'v>(
    map: &'v Map<String, Value>,
    key: &str,
    path: &str,
    origin: &str,
    at: &str,
) -> Result<&'v str> {
    match map.get(key) {
        None | Some(Value::Null) => Err(missing(origin, at, path)),
        Some(value) => value
            .as_str()
            .ok_or_else(|| malformed(origin, at, &format!("'{}' is not a string", path))),
    }
}
