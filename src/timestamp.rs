//! Timestamp normalization
//!
//! flowd-go formats `current-time` with Go's `.999999` layout, which drops
//! trailing zeros, so the fractional-seconds component arrives with anywhere
//! between one and six digits. Each such timestamp is rewritten to exactly
//! three fractional digits (millisecond precision) before being parsed into
//! an absolute UTC instant.
//!
//! iperf3 only reports an absolute start time; interval instants are
//! reconstructed by accumulating interval durations onto it.

use crate::error::{line_at, Result, XvalError};
use crate::record::{FieldBundle, GeneratorReport, RawRecord};
use crate::source::SourceKind;
use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use regex::Regex;
use std::sync::OnceLock;

/// `start.timestamp.time` layout of iperf3 reports
pub const GENERATOR_TIME_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Fractional digits kept by [`normalize_fraction`]
pub const FRACTION_DIGITS: usize = 3;

/// A measurement with its absolute instant
#[derive(Debug, Clone, PartialEq)]
pub struct TimedSample {
    pub instant: DateTime<Utc>,
    pub fields: FieldBundle,
}

/// All samples of one source, in collection order
#[derive(Debug, Clone, PartialEq)]
pub struct TimedSeries {
    pub source: SourceKind,
    pub samples: Vec<TimedSample>,
}

impl TimedSeries {
    pub fn first_instant(&self) -> Option<DateTime<Utc>> {
        self.samples.first().map(|s| s.instant)
    }
}

fn timestamp_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^(?P<head>[0-9]{4}-[0-9]{2}-[0-9]{2}[Tt ][0-9]{2}:[0-9]{2}:[0-9]{2})(?:\.(?P<frac>[0-9]+))?(?P<offset>[Zz]|[+-][0-9]{2}:[0-9]{2})?$",
        )
        .expect("timestamp regex is valid")
    })
}

/// Rewrite the fractional-seconds component to exactly three digits
///
/// Shorter fractions are right-padded with zeros, longer ones truncated.
///
/// # Example
/// ```
/// use tcpinfo_xval::timestamp::normalize_fraction;
///
/// assert_eq!(
///     normalize_fraction("2024-11-02T16:07:01.7+00:00").unwrap(),
///     "2024-11-02T16:07:01.700+00:00"
/// );
/// assert_eq!(
///     normalize_fraction("2024-11-02T16:07:01.769470+00:00").unwrap(),
///     "2024-11-02T16:07:01.769+00:00"
/// );
/// ```
pub fn normalize_fraction(timestamp: &str) -> std::result::Result<String, String> {
    let caps = timestamp_regex()
        .captures(timestamp.trim())
        .ok_or_else(|| "not an ISO 8601 date-time".to_string())?;

    let frac = caps
        .name("frac")
        .ok_or_else(|| "no fractional-seconds component".to_string())?
        .as_str();
    let offset = caps
        .name("offset")
        .ok_or_else(|| "no UTC offset".to_string())?
        .as_str();

    let mut fixed: String = frac.chars().take(FRACTION_DIGITS).collect();
    while fixed.len() < FRACTION_DIGITS {
        fixed.push('0');
    }

    Ok(format!("{}.{}{}", &caps["head"], fixed, offset))
}

/// Normalize and parse a composite timestamp into a UTC instant
pub fn parse_instant(timestamp: &str) -> std::result::Result<DateTime<Utc>, String> {
    let normalized = normalize_fraction(timestamp)?;
    DateTime::parse_from_rfc3339(&normalized)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| e.to_string())
}

/// Parse iperf3's `start.timestamp.time`
pub fn parse_generator_start(text: &str) -> std::result::Result<DateTime<Utc>, String> {
    NaiveDateTime::parse_from_str(text.trim(), GENERATOR_TIME_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|e| e.to_string())
}

/// Instants of consecutive intervals starting at `start`
///
/// Interval `i` ends at `start + durations[0] + ... + durations[i]`; that end
/// is the instant its statistics were reported at.
pub fn accumulate_instants(start: DateTime<Utc>, durations: &[f64]) -> Vec<DateTime<Utc>> {
    let mut elapsed = 0.0;
    durations
        .iter()
        .map(|seconds| {
            elapsed += seconds;
            start + Duration::nanoseconds((elapsed * 1e9).round() as i64)
        })
        .collect()
}

/// Attach absolute instants to line-delimited records
pub fn normalize_records(
    records: Vec<RawRecord>,
    source: SourceKind,
    origin: &str,
) -> Result<TimedSeries> {
    let samples = records
        .into_iter()
        .map(|record| {
            let instant =
                parse_instant(&record.timestamp).map_err(|reason| XvalError::TimestampFormat {
                    origin: origin.to_string(),
                    at: line_at(record.line),
                    timestamp: record.timestamp.clone(),
                    reason,
                })?;
            Ok(TimedSample {
                instant,
                fields: record.fields,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(TimedSeries { source, samples })
}

/// Attach absolute instants to iperf3 intervals
pub fn normalize_generator(report: GeneratorReport, origin: &str) -> Result<TimedSeries> {
    let start =
        parse_generator_start(&report.start_time).map_err(|reason| XvalError::TimestampFormat {
            origin: origin.to_string(),
            at: "start.timestamp.time".to_string(),
            timestamp: report.start_time.clone(),
            reason,
        })?;

    if let Some(bad) = report
        .intervals
        .iter()
        .find(|i| !i.seconds.is_finite() || i.seconds < 0.0)
    {
        return Err(XvalError::MalformedInput {
            origin: origin.to_string(),
            at: format!("intervals[{}]", bad.index),
            reason: format!("invalid interval duration {}", bad.seconds),
        });
    }

    let durations: Vec<f64> = report.intervals.iter().map(|i| i.seconds).collect();
    let instants = accumulate_instants(start, &durations);

    let samples = report
        .intervals
        .into_iter()
        .zip(instants)
        .map(|(interval, instant)| TimedSample {
            instant,
            fields: interval.fields,
        })
        .collect();

    Ok(TimedSeries {
        source: SourceKind::TrafficGenerator,
        samples,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::GeneratorInterval;
    use chrono::{TimeZone, Timelike};

    #[test]
    fn test_pad_short_fractions() {
        assert_eq!(
            normalize_fraction("2024-11-02T16:07:01.7+00:00").unwrap(),
            "2024-11-02T16:07:01.700+00:00"
        );
        assert_eq!(
            normalize_fraction("2024-11-02T16:07:01.76+00:00").unwrap(),
            "2024-11-02T16:07:01.760+00:00"
        );
    }

    #[test]
    fn test_exact_fraction_untouched() {
        assert_eq!(
            normalize_fraction("2024-11-02T16:07:01.769+00:00").unwrap(),
            "2024-11-02T16:07:01.769+00:00"
        );
    }

    #[test]
    fn test_truncate_long_fractions() {
        assert_eq!(
            normalize_fraction("2024-11-02T16:07:01.769470+00:00").unwrap(),
            "2024-11-02T16:07:01.769+00:00"
        );
        assert_eq!(
            normalize_fraction("2024-11-02T16:07:01.9999+02:00").unwrap(),
            "2024-11-02T16:07:01.999+02:00"
        );
    }

    #[test]
    fn test_fraction_digits_equal_to_seconds() {
        // The fraction is replaced by position, not by searching for its text.
        assert_eq!(
            normalize_fraction("2024-11-02T16:07:01.01+00:00").unwrap(),
            "2024-11-02T16:07:01.010+00:00"
        );
    }

    #[test]
    fn test_zulu_offset() {
        assert_eq!(
            normalize_fraction("2024-11-02T16:07:01.5Z").unwrap(),
            "2024-11-02T16:07:01.500Z"
        );
    }

    #[test]
    fn test_missing_fraction_rejected() {
        let err = normalize_fraction("2024-11-02T16:07:01+00:00").unwrap_err();
        assert!(err.contains("fractional-seconds"));
    }

    #[test]
    fn test_missing_offset_rejected() {
        assert!(normalize_fraction("2024-11-02T16:07:01.5").is_err());
    }

    #[test]
    fn test_non_ascii_digits_rejected() {
        // Arabic-Indic digits in the fraction
        assert!(normalize_fraction("2024-11-02T16:07:01.\u{0661}\u{0662}+00:00").is_err());
        assert!(normalize_fraction("2024-11-02T16:07:\u{0660}1.5+00:00").is_err());
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(normalize_fraction("yesterday").is_err());
        assert!(normalize_fraction("").is_err());
    }

    #[test]
    fn test_parse_instant_converts_to_utc() {
        let instant = parse_instant("2024-11-02T18:07:01.25+02:00").unwrap();
        let expected = Utc.with_ymd_and_hms(2024, 11, 2, 16, 7, 1).unwrap();
        assert_eq!(instant, expected + Duration::milliseconds(250));
        assert_eq!(instant.nanosecond(), 250_000_000);
    }

    #[test]
    fn test_parse_generator_start() {
        let start = parse_generator_start("Sat, 02 Nov 2024 16:07:01 GMT").unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 11, 2, 16, 7, 1).unwrap());
        assert!(parse_generator_start("2024-11-02 16:07:01").is_err());
    }

    #[test]
    fn test_accumulate_is_running_sum() {
        let start = Utc.with_ymd_and_hms(2024, 11, 2, 16, 7, 1).unwrap();
        let instants = accumulate_instants(start, &[1.0, 1.5, 0.25]);
        assert_eq!(instants[0], start + Duration::milliseconds(1000));
        assert_eq!(instants[1], start + Duration::milliseconds(2500));
        assert_eq!(instants[2], start + Duration::milliseconds(2750));
    }

    #[test]
    fn test_normalize_records_reports_line() {
        let records = vec![
            RawRecord {
                line: 3,
                timestamp: "2024-11-02T16:07:01.1+00:00".to_string(),
                fields: FieldBundle::new(),
            },
            RawRecord {
                line: 9,
                timestamp: "2024-11-02T16:07:01+00:00".to_string(),
                fields: FieldBundle::new(),
            },
        ];
        let err = normalize_records(records, SourceKind::KernelSocket, "ff.jsonl").unwrap_err();
        match err {
            XvalError::TimestampFormat { at, timestamp, .. } => {
                assert_eq!(at, "line 9");
                assert_eq!(timestamp, "2024-11-02T16:07:01+00:00");
            }
            other => panic!("expected TimestampFormat, got {:?}", other),
        }
    }

    #[test]
    fn test_normalize_generator() {
        let report = GeneratorReport {
            start_time: "Sat, 02 Nov 2024 16:07:01 GMT".to_string(),
            intervals: vec![
                GeneratorInterval {
                    index: 0,
                    seconds: 1.0,
                    fields: FieldBundle::new(),
                },
                GeneratorInterval {
                    index: 1,
                    seconds: 1.0,
                    fields: FieldBundle::new(),
                },
            ],
        };
        let series = normalize_generator(report, "iperf3.json").unwrap();
        let start = Utc.with_ymd_and_hms(2024, 11, 2, 16, 7, 1).unwrap();
        assert_eq!(series.source, SourceKind::TrafficGenerator);
        assert_eq!(series.first_instant(), Some(start + Duration::seconds(1)));
        assert_eq!(series.samples[1].instant, start + Duration::seconds(2));
    }

    #[test]
    fn test_normalize_generator_bad_start() {
        let report = GeneratorReport {
            start_time: "not a date".to_string(),
            intervals: Vec::new(),
        };
        let err = normalize_generator(report, "iperf3.json").unwrap_err();
        assert_eq!(err.kind(), "TimestampFormatError");
    }

    #[test]
    fn test_normalize_generator_negative_duration() {
        let report = GeneratorReport {
            start_time: "Sat, 02 Nov 2024 16:07:01 GMT".to_string(),
            intervals: vec![GeneratorInterval {
                index: 0,
                seconds: -1.0,
                fields: FieldBundle::new(),
            }],
        };
        let err = normalize_generator(report, "iperf3.json").unwrap_err();
        assert!(err.to_string().contains("intervals[0]"));
    }
}
