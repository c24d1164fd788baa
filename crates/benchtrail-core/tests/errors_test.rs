//! Error codes and message formatting.

use std::path::PathBuf;

use benchtrail_core::errors::*;

#[test]
fn vcs_error_codes_follow_failure_kind() {
    let resolve = VcsError::Resolve {
        reference: "v9".to_string(),
        message: "unknown revision".to_string(),
    };
    assert_eq!(resolve.error_code(), "RESOLUTION_ERROR");

    let create = VcsError::WorktreeCreate {
        path: PathBuf::from("/tmp/wt"),
        commit: "abc".to_string(),
        message: "exists".to_string(),
    };
    assert_eq!(create.error_code(), "WORKTREE_ERROR");

    let remove = VcsError::WorktreeRemove {
        path: PathBuf::from("/tmp/wt"),
        message: "busy".to_string(),
    };
    assert_eq!(remove.error_code(), "CLEANUP_ERROR");
}

#[test]
fn pipeline_error_delegates_codes() {
    let err: PipelineError = AggregationError::Empty.into();
    assert_eq!(err.error_code(), "AGGREGATION_ERROR");

    let err = PipelineError::NoBenchmarks {
        filter: Some("ser".to_string()),
    };
    assert_eq!(err.error_code(), "NO_BENCHMARKS");
    assert!(err.to_string().contains("ser"));
}

#[test]
fn coded_string_prefixes_code() {
    let err = SyncError::NoManifest {
        path: PathBuf::from("/wt"),
    };
    assert_eq!(err.coded_string(), "[SYNC_ERROR] No build manifest found in /wt");
}

#[test]
fn child_failures_share_code() {
    let err = ExecutionError::MissingPartition {
        path: PathBuf::from("/p.jsonl"),
    };
    assert_eq!(err.error_code(), "CHILD_FAILED");
    let err = ExecutionError::BenchmarkFailed {
        category: "c".to_string(),
        name: "n".to_string(),
        size: 1,
        run_index: 0,
        message: "boom".to_string(),
    };
    assert_eq!(err.error_code(), "EXECUTION_ERROR");
}
