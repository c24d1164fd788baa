//! v001: aggregated benchmark results keyed by deterministic id.
//!
//! `timestamp` holds the commit time as microseconds since the Unix epoch.

pub const MIGRATION_SQL: &str = "
CREATE TABLE IF NOT EXISTS bench_results (
    id        TEXT PRIMARY KEY NOT NULL,
    category  TEXT NOT NULL,
    name      TEXT NOT NULL,
    size      INTEGER NOT NULL CHECK (size >= 0 AND size <= 4294967295),
    git_hash  TEXT NOT NULL,
    timestamp INTEGER NOT NULL,
    median    REAL NOT NULL,
    runs      INTEGER NOT NULL CHECK (runs >= 0 AND runs <= 4294967295)
) STRICT;

CREATE INDEX IF NOT EXISTS idx_bench_results_series
    ON bench_results (category, name, size, timestamp);
";

pub const DROP_SQL: &str = "
DROP INDEX IF EXISTS idx_bench_results_series;
DROP TABLE IF EXISTS bench_results;
";
