//! Property-based tests for the reconciliation pipeline
//!
//! Core properties tested:
//! 1. Fractional-second normalization
//! 2. Alignment onto the shared epoch
//! 3. Cumulative reconstruction of per-interval deltas

use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;
use tcpinfo_xval::align::align;
use tcpinfo_xval::derive::running_total;
use tcpinfo_xval::record::FieldBundle;
use tcpinfo_xval::source::SourceKind;
use tcpinfo_xval::timestamp::{normalize_fraction, parse_instant, TimedSample, TimedSeries};

fn base_instant() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 11, 2, 16, 7, 0).unwrap()
}

/// Sorted series whose first sample sits `start_ms` after the base instant
fn series(source: SourceKind, start_ms: i64, gaps_ms: &[i64]) -> TimedSeries {
    let mut instant = base_instant() + Duration::milliseconds(start_ms);
    let mut samples = vec![TimedSample {
        instant,
        fields: FieldBundle::new(),
    }];
    for gap in gaps_ms {
        instant += Duration::milliseconds(*gap);
        samples.push(TimedSample {
            instant,
            fields: FieldBundle::new(),
        });
    }
    TimedSeries { source, samples }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_fraction_normalized_to_three_digits(
        second in 0u32..60,
        fraction in "[0-9]{1,6}",
        offset in prop::sample::select(vec!["Z", "+00:00", "+02:00", "-05:30"]),
    ) {
        let timestamp = format!("2024-11-02T16:07:{:02}.{}{}", second, fraction, offset);
        let normalized = normalize_fraction(&timestamp).unwrap();

        let dot = normalized.find('.').unwrap();
        let digits: String = normalized[dot + 1..]
            .chars()
            .take_while(|c| c.is_ascii_digit())
            .collect();
        prop_assert_eq!(digits.len(), 3);
        prop_assert!(parse_instant(&timestamp).is_ok());
        prop_assert!(DateTime::parse_from_rfc3339(&normalized).is_ok());
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_alignment_starts_at_zero(
        starts in prop::array::uniform3(0i64..5_000),
        kernel_gaps in prop::collection::vec(0i64..2_000, 0..10),
        probe_gaps in prop::collection::vec(0i64..2_000, 0..10),
        generator_gaps in prop::collection::vec(0i64..2_000, 0..10),
    ) {
        let set = align(
            series(SourceKind::KernelSocket, starts[0], &kernel_gaps),
            series(SourceKind::InKernelProbe, starts[1], &probe_gaps),
            series(SourceKind::TrafficGenerator, starts[2], &generator_gaps),
        )
        .unwrap();

        let min_first = set
            .iter()
            .map(|s| s.samples[0].relative_time)
            .fold(f64::INFINITY, f64::min);
        prop_assert_eq!(min_first, 0.0);

        for series in set.iter() {
            for sample in &series.samples {
                prop_assert!(sample.relative_time >= 0.0);
            }
        }

        let earliest = starts.iter().min().unwrap();
        let expected = SourceKind::ALL[starts.iter().position(|s| s == earliest).unwrap()];
        prop_assert_eq!(set.epoch_source(), expected);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_running_total_is_repeatable(
        deltas in prop::collection::vec(0u32..10_000_000, 0..50),
    ) {
        let deltas: Vec<f64> = deltas.into_iter().map(f64::from).collect();
        let first = running_total(&deltas);
        let second = running_total(&deltas);

        prop_assert_eq!(&first, &second);
        prop_assert_eq!(first.len(), deltas.len());
        if let Some(last) = first.last() {
            prop_assert_eq!(*last, deltas.iter().sum::<f64>());
        }
        prop_assert!(first.windows(2).all(|w| w[0] <= w[1]));
    }
}
