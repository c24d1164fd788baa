//! Plain-text reports: stored rows, sweep outcomes, and relative trends.

use std::collections::BTreeMap;

use benchtrail_core::types::revision::short_prefix;
use benchtrail_core::BenchRecord;
use chrono::{DateTime, Utc};
use rustc_hash::FxHashMap;

use crate::history::{CommitState, SweepReport};
use crate::stats::median;

const HASH_WIDTH: usize = 8;

/// Table of stored rows, in the order given.
pub fn render_records(rows: &[BenchRecord]) -> String {
    if rows.is_empty() {
        return "No results stored.\n".to_string();
    }
    let cat_w = column_width("category", rows.iter().map(|r| r.category.len()));
    let name_w = column_width("name", rows.iter().map(|r| r.name.len()));

    let mut out = format!(
        "{:<cat_w$}  {:<name_w$}  {:>10}  {:<8}  {:<20}  {:>12}  {:>5}\n",
        "category", "name", "size", "commit", "timestamp", "median (ms)", "runs"
    );
    for row in rows {
        out.push_str(&format!(
            "{:<cat_w$}  {:<name_w$}  {:>10}  {:<8}  {:<20}  {:>12.4}  {:>5}\n",
            row.category,
            row.name,
            row.size,
            short_prefix(&row.git_hash, HASH_WIDTH),
            row.timestamp.format("%Y-%m-%d %H:%M:%S"),
            row.median * 1_000.0,
            row.runs,
        ));
    }
    out
}

fn column_width(header: &str, values: impl Iterator<Item = usize>) -> usize {
    values.max().unwrap_or(0).max(header.len())
}

/// Per-commit status lines plus a summary.
pub fn render_sweep(report: &SweepReport) -> String {
    let mut out = String::new();
    out.push_str("╔══════════════════════════════════════════╗\n");
    out.push_str("║          Historical Sweep Report         ║\n");
    out.push_str("╚══════════════════════════════════════════╝\n\n");

    for outcome in &report.commits {
        let symbol = if outcome.succeeded() { "✓" } else { "✗" };
        let degraded = if outcome.degraded { " [unresolved]" } else { "" };
        out.push_str(&format!(
            "{} {:<12} {}{} ({:.1}s)\n",
            symbol,
            outcome.reference,
            short_prefix(&outcome.commit, HASH_WIDTH),
            degraded,
            outcome.duration.as_secs_f64(),
        ));
        match (&outcome.failure, outcome.state) {
            (Some(failure), _) => out.push_str(&format!(
                "  {} failed: [{}] {}\n",
                failure.stage.as_str(),
                failure.code,
                failure.message
            )),
            (None, CommitState::Cleaned) => {
                out.push_str(&format!("  {} rows\n", outcome.rows));
            }
            (None, state) => out.push_str(&format!("  stopped at {}\n", state.as_str())),
        }
        if let Some(e) = &outcome.cleanup_error {
            out.push_str(&format!("  ⚠ cleanup: {e}\n"));
        }
    }

    out.push_str(&format!(
        "\n{}/{} commits succeeded, {} rows merged in {:.1}s\n",
        report.succeeded(),
        report.commits.len(),
        report.merged_rows,
        report.duration.as_secs_f64(),
    ));
    if let Some(dir) = &report.partition_dir {
        out.push_str(&format!("Partitions kept in {}\n", dir.display()));
    }
    out
}

/// One observation of a series.
#[derive(Debug, Clone, PartialEq)]
pub struct TrendPoint {
    /// Dense rank of the commit timestamp across all selected rows, from 1.
    pub observation: usize,
    pub git_hash: String,
    pub timestamp: DateTime<Utc>,
    pub median: f64,
    /// `median` over the series' first observation. `None` when that is zero.
    pub relative: Option<f64>,
}

/// One (category, name, size) series ordered by commit time.
#[derive(Debug, Clone, PartialEq)]
pub struct TrendSeries {
    pub category: String,
    pub name: String,
    pub size: u32,
    pub points: Vec<TrendPoint>,
}

/// Build relative-performance series from stored rows. With category
/// filters, only categories containing one of them (case-insensitive)
/// are kept.
pub fn compute_trend(rows: &[BenchRecord], categories: &[String]) -> Vec<TrendSeries> {
    let needles: Vec<String> = categories.iter().map(|c| c.to_lowercase()).collect();
    let selected: Vec<&BenchRecord> = rows
        .iter()
        .filter(|r| {
            needles.is_empty() || {
                let cat = r.category.to_lowercase();
                needles.iter().any(|n| cat.contains(n.as_str()))
            }
        })
        .collect();

    let mut stamps: Vec<DateTime<Utc>> = selected.iter().map(|r| r.timestamp).collect();
    stamps.sort();
    stamps.dedup();
    let rank: FxHashMap<DateTime<Utc>, usize> = stamps
        .into_iter()
        .enumerate()
        .map(|(i, ts)| (ts, i + 1))
        .collect();

    let mut grouped: BTreeMap<(&str, &str, u32), Vec<&BenchRecord>> = BTreeMap::new();
    for row in selected {
        grouped.entry(row.series_key()).or_default().push(row);
    }

    grouped
        .into_iter()
        .map(|((category, name, size), mut series)| {
            series.sort_by_key(|r| r.timestamp);
            let base = series.first().map(|r| r.median).unwrap_or(0.0);
            let points = series
                .into_iter()
                .map(|r| TrendPoint {
                    observation: rank.get(&r.timestamp).copied().unwrap_or(0),
                    git_hash: r.git_hash.clone(),
                    timestamp: r.timestamp,
                    median: r.median,
                    relative: (base > 0.0).then(|| r.median / base),
                })
                .collect();
            TrendSeries {
                category: category.to_string(),
                name: name.to_string(),
                size,
                points,
            }
        })
        .collect()
}

/// Median relative performance per (category, observation).
pub fn category_summary(series: &[TrendSeries]) -> BTreeMap<(String, usize), f64> {
    let mut buckets: BTreeMap<(String, usize), Vec<f64>> = BTreeMap::new();
    for s in series {
        for p in &s.points {
            if let Some(rel) = p.relative {
                buckets
                    .entry((s.category.clone(), p.observation))
                    .or_default()
                    .push(rel);
            }
        }
    }
    buckets
        .into_iter()
        .filter_map(|(key, values)| median(&values).map(|m| (key, m)))
        .collect()
}

pub fn render_trend(series: &[TrendSeries]) -> String {
    if series.is_empty() {
        return "No results to compare.\n".to_string();
    }
    let mut out = String::new();
    for s in series {
        out.push_str(&format!("{} / {} / {}\n", s.category, s.name, s.size));
        for p in &s.points {
            let relative = p
                .relative
                .map(|r| format!("{r:.3}x"))
                .unwrap_or_else(|| "-".to_string());
            out.push_str(&format!(
                "  #{:<3} {:<8}  {}  {:>12.4} ms  {:>8}\n",
                p.observation,
                short_prefix(&p.git_hash, HASH_WIDTH),
                p.timestamp.format("%Y-%m-%d"),
                p.median * 1_000.0,
                relative,
            ));
        }
    }

    let summary = category_summary(series);
    if !summary.is_empty() {
        out.push_str("\nPer-category median relative time\n");
        for ((category, observation), value) in summary {
            out.push_str(&format!("  {category:<20} #{observation:<3} {value:.3}x\n"));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(name: &str, hash: &str, secs: i64, median: f64) -> BenchRecord {
        BenchRecord {
            id: format!("A-{name}-10-{hash}"),
            category: "A".to_string(),
            name: name.to_string(),
            size: 10,
            git_hash: hash.to_string(),
            timestamp: DateTime::from_timestamp(secs, 0).unwrap(),
            median,
            runs: 3,
        }
    }

    #[test]
    fn trend_is_relative_to_first_observation() {
        let rows = vec![
            row("x", "c2", 200, 3.0),
            row("x", "c1", 100, 2.0),
            row("y", "c2", 200, 1.0),
        ];
        let series = compute_trend(&rows, &[]);
        assert_eq!(series.len(), 2);
        let x = &series[0];
        assert_eq!(x.points[0].observation, 1);
        assert_eq!(x.points[0].relative, Some(1.0));
        assert_eq!(x.points[1].observation, 2);
        assert_eq!(x.points[1].relative, Some(1.5));
        // y only exists at the second timestamp, which keeps its global rank.
        assert_eq!(series[1].points[0].observation, 2);
    }

    #[test]
    fn trend_filters_categories() {
        let rows = vec![row("x", "c1", 100, 1.0)];
        assert!(compute_trend(&rows, &["parsing".to_string()]).is_empty());
        assert_eq!(compute_trend(&rows, &["a".to_string()]).len(), 1);
    }

    #[test]
    fn records_table_has_header() {
        let out = render_records(&[row("x", "0123456789", 100, 0.002)]);
        assert!(out.starts_with("category"));
        assert!(out.contains("01234567"));
        assert!(out.contains("2.0000"));
    }
}
