//! Engine and aggregator properties.

use benchtrail_bench::engine::Engine;
use benchtrail_bench::fixtures::BenchInput;
use benchtrail_bench::stats::{aggregate, median};
use benchtrail_bench::workload::Kernel;
use benchtrail_bench::Registry;
use benchtrail_core::errors::{AggregationError, ExecutionError};
use benchtrail_core::{RawTiming, RevisionInfo};
use proptest::prelude::*;

fn revision() -> RevisionInfo {
    RevisionInfo::from_epoch_seconds("0123456789abcdef0123456789abcdef01234567", 1_700_000_000)
        .unwrap()
}

fn timing(name: &str, size: u64, run_index: u32, elapsed: f64) -> RawTiming {
    RawTiming {
        category: "A".to_string(),
        name: name.to_string(),
        size,
        run_index,
        elapsed,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn engine_produces_sizes_times_runs(
        sizes in prop::collection::vec(0u64..64, 1..5),
        runs in 1u32..6,
    ) {
        let mut registry = Registry::new();
        registry.register("A", "sum", Kernel::Sum, sizes.clone());
        let descriptors: Vec<_> = registry.descriptors().collect();
        let samples = Engine::new(runs).execute(&descriptors).unwrap();

        prop_assert_eq!(samples.len(), sizes.len() * runs as usize);
        prop_assert!(samples.iter().all(|s| sizes.contains(&s.size)));
    }

    #[test]
    fn median_lies_within_bounds(values in prop::collection::vec(0.0f64..1e3, 1..50)) {
        let m = median(&values).unwrap();
        let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        prop_assert!(m >= min && m <= max);
    }
}

#[test]
fn median_of_odd_and_even_groups() {
    let rev = revision();
    let raw = vec![
        timing("odd", 10, 0, 1.0),
        timing("odd", 10, 1, 3.0),
        timing("odd", 10, 2, 2.0),
        timing("even", 10, 0, 4.0),
        timing("even", 10, 1, 1.0),
        timing("even", 10, 2, 3.0),
        timing("even", 10, 3, 2.0),
    ];
    let rows = aggregate(&raw, &rev, 8).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].name, "odd");
    assert_eq!(rows[0].median, 2.0);
    assert_eq!(rows[0].runs, 3);
    assert_eq!(rows[1].median, 2.5);
    assert_eq!(rows[1].runs, 4);
    assert_eq!(rows[0].id, "A-odd-10-01234567");
}

#[test]
fn aggregation_rejects_bad_samples() {
    let rev = revision();
    assert!(matches!(aggregate(&[], &rev, 8), Err(AggregationError::Empty)));
    assert!(matches!(
        aggregate(&[timing("x", 1, 0, f64::NAN)], &rev, 8),
        Err(AggregationError::InvalidSample { .. })
    ));
    assert!(matches!(
        aggregate(&[timing("x", 1, 0, -1.0)], &rev, 8),
        Err(AggregationError::InvalidSample { .. })
    ));
    assert!(matches!(
        aggregate(&[timing("x", 1, 0, 1.0), timing("x", 1, 0, 2.0)], &rev, 8),
        Err(AggregationError::DuplicateRun { .. })
    ));
    assert!(matches!(
        aggregate(&[timing("x", u64::from(u32::MAX) + 1, 0, 1.0)], &rev, 8),
        Err(AggregationError::SizeOutOfRange { .. })
    ));
}

#[test]
fn failing_benchmark_fails_fast() {
    let mut registry = Registry::new();
    registry.register(
        "A",
        "flaky",
        |input: &BenchInput| -> Result<(), String> {
            if input.size() == 20 {
                Err("size 20 unsupported".to_string())
            } else {
                Ok(())
            }
        },
        vec![10, 20],
    );
    let descriptors: Vec<_> = registry.descriptors().collect();
    match Engine::new(2).execute(&descriptors) {
        Err(ExecutionError::BenchmarkFailed {
            size, run_index, ..
        }) => {
            assert_eq!(size, 20);
            assert_eq!(run_index, 0);
        }
        other => panic!("expected BenchmarkFailed, got {other:?}"),
    }
}

#[test]
fn inputs_are_deterministic_per_size() {
    let a = BenchInput::generate(100);
    let b = BenchInput::generate(100);
    assert_eq!(a.values(), b.values());
    assert_eq!(a.values().len(), 100);
    assert_ne!(BenchInput::generate(101).values()[..100], a.values()[..]);
}
