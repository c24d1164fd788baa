//! Statistics aggregator: raw samples → one result row per
//! (category, name, size) group.

use benchtrail_core::errors::AggregationError;
use benchtrail_core::types::record_id;
use benchtrail_core::{BenchRecord, RawTiming, RevisionInfo};
use rustc_hash::{FxHashMap, FxHashSet};
use statrs::statistics::{Data, Median};

/// Median of `samples`, or `None` when empty. Even-length inputs average
/// the two middle values.
pub fn median(samples: &[f64]) -> Option<f64> {
    if samples.is_empty() {
        return None;
    }
    Some(Data::new(samples.to_vec()).median())
}

struct Group<'a> {
    category: &'a str,
    name: &'a str,
    size: u64,
    elapsed: Vec<f64>,
    seen_runs: FxHashSet<u32>,
}

/// Group samples, take per-group medians, and stamp every row with the
/// same revision. Groups keep first-seen order.
///
/// All-or-nothing: a non-finite or negative sample, a repeated run index,
/// or a size outside `u32` fails the whole batch.
pub fn aggregate(
    raw: &[RawTiming],
    revision: &RevisionInfo,
    id_hash_len: usize,
) -> Result<Vec<BenchRecord>, AggregationError> {
    if raw.is_empty() {
        return Err(AggregationError::Empty);
    }

    let mut order: Vec<Group<'_>> = Vec::new();
    let mut index: FxHashMap<(&str, &str, u64), usize> = FxHashMap::default();

    for sample in raw {
        if !sample.elapsed.is_finite() || sample.elapsed < 0.0 {
            return Err(AggregationError::InvalidSample {
                category: sample.category.clone(),
                name: sample.name.clone(),
                size: sample.size,
                elapsed: sample.elapsed,
            });
        }
        let key = (sample.category.as_str(), sample.name.as_str(), sample.size);
        let idx = *index.entry(key).or_insert_with(|| {
            order.push(Group {
                category: &sample.category,
                name: &sample.name,
                size: sample.size,
                elapsed: Vec::new(),
                seen_runs: FxHashSet::default(),
            });
            order.len() - 1
        });
        let group = &mut order[idx];
        if !group.seen_runs.insert(sample.run_index) {
            return Err(AggregationError::DuplicateRun {
                category: sample.category.clone(),
                name: sample.name.clone(),
                size: sample.size,
                run_index: sample.run_index,
            });
        }
        group.elapsed.push(sample.elapsed);
    }

    let mut rows = Vec::with_capacity(order.len());
    for group in order {
        let size = u32::try_from(group.size).map_err(|_| AggregationError::SizeOutOfRange {
            category: group.category.to_string(),
            name: group.name.to_string(),
            size: group.size,
        })?;
        let runs =
            u32::try_from(group.elapsed.len()).map_err(|_| AggregationError::RunsOutOfRange {
                category: group.category.to_string(),
                name: group.name.to_string(),
                size: group.size,
                runs: group.elapsed.len(),
            })?;
        let Some(median) = median(&group.elapsed) else {
            continue;
        };
        rows.push(BenchRecord {
            id: record_id(group.category, group.name, size, &revision.git_hash, id_hash_len),
            category: group.category.to_string(),
            name: group.name.to_string(),
            size,
            git_hash: revision.git_hash.clone(),
            timestamp: revision.timestamp,
            median,
            runs,
        });
    }

    tracing::debug!(samples = raw.len(), rows = rows.len(), "aggregated samples");
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn median_odd_and_even() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), Some(2.5));
        assert_eq!(median(&[]), None);
    }
}
