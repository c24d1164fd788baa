//! Historical runner: replay the current benchmark suite against a list
//! of commits.
//!
//! Commits are processed one at a time. Each gets its own detached
//! worktree, has its environment rebuilt from its own manifests, and is
//! benchmarked by a separate child process that writes a partition file.
//! A failing commit is recorded and skipped; the sweep always continues.
//! Once every commit has been visited the surviving partitions are upserted
//! into the result store, so repeating a sweep never duplicates rows.
//!
//! Per-commit states:
//!
//! ```text
//! Pending → Resolved → WorktreeCreated → Synced → Executed → Cleaned
//!              └──────────────┴─────────────┴──────────→ Failed
//! ```
//!
//! The worktree is removed on every path out of a commit, including
//! failures and interrupts.

use std::fs::OpenOptions;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use benchtrail_core::config::BenchtrailConfig;
use benchtrail_core::constants::{SWEEP_LOCK_FILE, WORKTREES_DIR};
use benchtrail_core::errors::{ErrorCode, HistoryError};
use benchtrail_core::traits::{Cancellable, CancellationToken};
use benchtrail_core::types::revision::short_prefix;
use benchtrail_core::BenchRecord;
use benchtrail_storage::partition::{partition_path, read_partition, read_partitions};
use benchtrail_storage::ResultStore;
use rustc_hash::FxHashMap;

use crate::launcher::{ChildJob, ChildLauncher};
use crate::sync::EnvSync;
use crate::vcs::Vcs;

/// Where a commit is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitState {
    Pending,
    Resolved,
    WorktreeCreated,
    Synced,
    Executed,
    Cleaned,
    Failed,
}

impl CommitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Resolved => "resolved",
            Self::WorktreeCreated => "worktree_created",
            Self::Synced => "synced",
            Self::Executed => "executed",
            Self::Cleaned => "cleaned",
            Self::Failed => "failed",
        }
    }
}

/// The step a commit failed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureStage {
    Worktree,
    Sync,
    Execute,
    Partition,
}

impl FailureStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Worktree => "worktree",
            Self::Sync => "sync",
            Self::Execute => "execute",
            Self::Partition => "partition",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitFailure {
    pub stage: FailureStage,
    /// Stable error code, e.g. `SYNC_ERROR`.
    pub code: &'static str,
    pub message: String,
}

/// What happened to one commit of a sweep.
#[derive(Debug, Clone)]
pub struct CommitOutcome {
    /// The reference as given.
    pub reference: String,
    /// Resolved commit id, or the reference itself when resolution failed.
    pub commit: String,
    pub degraded: bool,
    pub state: CommitState,
    pub failure: Option<CommitFailure>,
    /// Rows in the commit's partition.
    pub rows: usize,
    pub partition: Option<PathBuf>,
    /// Worktree removal failure. Logged, never fatal.
    pub cleanup_error: Option<String>,
    pub duration: Duration,
}

impl CommitOutcome {
    fn pending(reference: &str) -> Self {
        Self {
            reference: reference.to_string(),
            commit: reference.to_string(),
            degraded: false,
            state: CommitState::Pending,
            failure: None,
            rows: 0,
            partition: None,
            cleanup_error: None,
            duration: Duration::ZERO,
        }
    }

    pub fn succeeded(&self) -> bool {
        self.failure.is_none() && self.state == CommitState::Cleaned
    }

    fn advance(&mut self, state: CommitState) {
        tracing::debug!(
            reference = %self.reference,
            from = self.state.as_str(),
            to = state.as_str(),
            "commit state"
        );
        self.state = state;
    }

    fn fail<E: ErrorCode + std::fmt::Display>(&mut self, stage: FailureStage, error: &E) {
        tracing::warn!(
            reference = %self.reference,
            stage = stage.as_str(),
            error = %error.coded_string(),
            "commit failed"
        );
        self.failure = Some(CommitFailure {
            stage,
            code: error.error_code(),
            message: error.to_string(),
        });
        self.advance(CommitState::Failed);
    }
}

/// Result of a whole sweep.
#[derive(Debug, Clone, Default)]
pub struct SweepReport {
    pub commits: Vec<CommitOutcome>,
    /// Rows upserted into the store.
    pub merged_rows: usize,
    /// Partition directory, when kept.
    pub partition_dir: Option<PathBuf>,
    pub duration: Duration,
}

impl SweepReport {
    pub fn succeeded(&self) -> usize {
        self.commits.iter().filter(|c| c.succeeded()).count()
    }

    pub fn failed(&self) -> usize {
        self.commits.len() - self.succeeded()
    }

    pub fn is_partial(&self) -> bool {
        self.failed() > 0
    }
}

/// Sweep settings.
#[derive(Debug, Clone)]
pub struct HistoryOptions {
    /// Benchmark definitions of the current checkout.
    pub bench_root: PathBuf,
    pub category: Option<String>,
    pub worktree_prefix_len: usize,
    pub keep_partitions: bool,
}

impl HistoryOptions {
    pub fn from_config(
        config: &BenchtrailConfig,
        bench_root: impl Into<PathBuf>,
        category: Option<String>,
    ) -> Self {
        Self {
            bench_root: bench_root.into(),
            category,
            worktree_prefix_len: config.history.effective_worktree_prefix_len(),
            keep_partitions: config.history.effective_keep_partitions(),
        }
    }
}

struct Interrupted;

/// Removes a worktree when dropped unless already removed explicitly.
struct WorktreeGuard<'a> {
    vcs: &'a dyn Vcs,
    path: PathBuf,
    armed: bool,
}

impl<'a> WorktreeGuard<'a> {
    fn new(vcs: &'a dyn Vcs, path: PathBuf) -> Self {
        Self {
            vcs,
            path,
            armed: true,
        }
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn remove(mut self) -> Result<(), String> {
        self.armed = false;
        self.vcs
            .remove_worktree(&self.path)
            .map_err(|e| e.coded_string())
    }
}

impl Drop for WorktreeGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            if let Err(e) = self.vcs.remove_worktree(&self.path) {
                tracing::warn!(path = %self.path.display(), error = %e, "worktree cleanup failed");
            }
        }
    }
}

/// Drives a sweep through its collaborators.
pub struct HistoryRunner<'a> {
    vcs: &'a dyn Vcs,
    sync: &'a dyn EnvSync,
    launcher: &'a dyn ChildLauncher,
    data_dir: PathBuf,
    options: HistoryOptions,
    cancel: CancellationToken,
}

impl<'a> HistoryRunner<'a> {
    pub fn new(
        vcs: &'a dyn Vcs,
        sync: &'a dyn EnvSync,
        launcher: &'a dyn ChildLauncher,
        data_dir: impl Into<PathBuf>,
        options: HistoryOptions,
    ) -> Self {
        Self {
            vcs,
            sync,
            launcher,
            data_dir: data_dir.into(),
            options,
            cancel: CancellationToken::new(),
        }
    }

    /// Checked after every blocking step.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Process every reference, then merge what succeeded into `store`.
    pub fn run(
        &self,
        references: &[String],
        store: &dyn ResultStore,
    ) -> Result<SweepReport, HistoryError> {
        let started = Instant::now();
        let io_err = |path: &Path| {
            let path = path.to_path_buf();
            move |source| HistoryError::Io { path, source }
        };

        std::fs::create_dir_all(&self.data_dir).map_err(io_err(&self.data_dir))?;
        // The child runs inside the worktree, so every path it is handed must
        // be absolute.
        let data_dir = std::fs::canonicalize(&self.data_dir).map_err(io_err(&self.data_dir))?;
        let lock_path = data_dir.join(SWEEP_LOCK_FILE);
        let lock_file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)
            .map_err(io_err(&lock_path))?;
        let mut lock = fd_lock::RwLock::new(lock_file);
        let _guard = lock.try_write().map_err(|e| match e.kind() {
            ErrorKind::WouldBlock => HistoryError::SweepLocked {
                path: lock_path.clone(),
            },
            _ => HistoryError::Io {
                path: lock_path.clone(),
                source: e,
            },
        })?;

        let bench_root =
            std::fs::canonicalize(&self.options.bench_root).map_err(io_err(&self.options.bench_root))?;
        let worktrees = data_dir.join(WORKTREES_DIR);
        std::fs::create_dir_all(&worktrees).map_err(io_err(&worktrees))?;
        let partitions = data_dir.join("partitions").join(format!(
            "sweep_{}_{}",
            chrono::Utc::now().format("%Y%m%dT%H%M%S"),
            std::process::id()
        ));
        std::fs::create_dir_all(&partitions).map_err(io_err(&partitions))?;

        tracing::info!(commits = references.len(), "starting historical sweep");
        let mut report = SweepReport::default();
        for (idx, reference) in references.iter().enumerate() {
            match self.process_commit(idx, reference, &bench_root, &worktrees, &partitions) {
                Ok(outcome) => report.commits.push(outcome),
                Err(Interrupted) => {
                    self.discard_partitions(&partitions);
                    return Err(HistoryError::Interrupted {
                        completed: idx,
                        total: references.len(),
                    });
                }
            }
        }

        report.merged_rows = self.merge(&partitions, store)?;
        if self.options.keep_partitions {
            report.partition_dir = Some(partitions);
        } else {
            self.discard_partitions(&partitions);
        }
        report.duration = started.elapsed();
        tracing::info!(
            succeeded = report.succeeded(),
            failed = report.failed(),
            rows = report.merged_rows,
            "historical sweep finished"
        );
        Ok(report)
    }

    fn process_commit(
        &self,
        seq: usize,
        reference: &str,
        bench_root: &Path,
        worktrees: &Path,
        partitions: &Path,
    ) -> Result<CommitOutcome, Interrupted> {
        let started = Instant::now();
        let mut outcome = CommitOutcome::pending(reference);

        match self.vcs.resolve(reference) {
            Ok(commit) => outcome.commit = commit,
            Err(e) => {
                tracing::warn!(reference, error = %e.coded_string(), "falling back to the raw reference");
                outcome.degraded = true;
            }
        }
        outcome.advance(CommitState::Resolved);

        let short = path_safe(short_prefix(&outcome.commit, self.options.worktree_prefix_len));
        let wt_path = worktrees.join(format!("wt_{short}"));
        if wt_path.exists() {
            tracing::warn!(path = %wt_path.display(), "removing stale worktree");
            if let Err(e) = self.vcs.remove_worktree(&wt_path) {
                tracing::warn!(path = %wt_path.display(), error = %e, "stale worktree removal failed");
            }
        }

        if let Err(e) = self.vcs.create_detached_worktree(&wt_path, &outcome.commit) {
            outcome.fail(FailureStage::Worktree, &e);
            if wt_path.exists() {
                outcome.cleanup_error = WorktreeGuard::new(self.vcs, wt_path).remove().err();
            }
            outcome.duration = started.elapsed();
            return Ok(outcome);
        }
        let worktree = WorktreeGuard::new(self.vcs, wt_path);
        outcome.advance(CommitState::WorktreeCreated);
        self.check_cancelled()?;

        // Sweep position first: aliases of one commit get separate files and
        // the directory reads back in reference order.
        let partition = partition_path(
            partitions,
            &format!("{seq:06}_{}", path_safe(&outcome.commit)),
        );
        if let Err(e) = self.sync.sync(worktree.path()) {
            outcome.fail(FailureStage::Sync, &e);
        } else {
            outcome.advance(CommitState::Synced);
            self.check_cancelled()?;
            self.execute(&mut outcome, worktree.path(), bench_root, &partition);
        }
        self.check_cancelled()?;

        outcome.cleanup_error = worktree.remove().err();
        if let Some(e) = &outcome.cleanup_error {
            tracing::warn!(reference, error = %e, "worktree cleanup failed");
        }
        if outcome.failure.is_none() {
            outcome.advance(CommitState::Cleaned);
            tracing::info!(
                reference,
                commit = %short,
                rows = outcome.rows,
                "commit benchmarked"
            );
        }
        outcome.duration = started.elapsed();
        Ok(outcome)
    }

    fn execute(
        &self,
        outcome: &mut CommitOutcome,
        worktree: &Path,
        bench_root: &Path,
        partition: &Path,
    ) {
        let job = ChildJob {
            worktree,
            bench_root,
            partition,
            category: self.options.category.as_deref(),
        };
        if let Err(e) = self.launcher.launch(&job) {
            outcome.fail(FailureStage::Execute, &e);
            remove_partition(partition);
            return;
        }
        match read_partition(partition) {
            Ok(rows) => {
                outcome.rows = rows.len();
                outcome.partition = Some(partition.to_path_buf());
                outcome.advance(CommitState::Executed);
            }
            Err(e) => {
                outcome.fail(FailureStage::Partition, &e);
                remove_partition(partition);
            }
        }
    }

    /// Upsert every partition left in the sweep's directory. Failed commits
    /// leave none behind. Rows sharing an id keep the last one read.
    fn merge(&self, partitions: &Path, store: &dyn ResultStore) -> Result<usize, HistoryError> {
        let mut rows: Vec<BenchRecord> = Vec::new();
        let mut by_id: FxHashMap<String, usize> = FxHashMap::default();
        for row in read_partitions(partitions)? {
            match by_id.get(&row.id) {
                Some(&idx) => rows[idx] = row,
                None => {
                    by_id.insert(row.id.clone(), rows.len());
                    rows.push(row);
                }
            }
        }
        if rows.is_empty() {
            tracing::info!("no partitions to merge");
            return Ok(0);
        }
        store.create()?;
        let merged = store.insert_or_replace(&rows)?;
        tracing::info!(rows = merged, "merged partitions");
        Ok(merged)
    }

    fn discard_partitions(&self, dir: &Path) {
        if self.options.keep_partitions {
            return;
        }
        if let Err(e) = std::fs::remove_dir_all(dir) {
            tracing::warn!(path = %dir.display(), error = %e, "failed to remove partitions");
        }
    }

    fn check_cancelled(&self) -> Result<(), Interrupted> {
        if self.cancel.is_cancelled() {
            tracing::warn!("sweep interrupted");
            return Err(Interrupted);
        }
        Ok(())
    }
}

fn remove_partition(path: &Path) {
    if path.exists() {
        if let Err(e) = std::fs::remove_file(path) {
            tracing::warn!(path = %path.display(), error = %e, "failed to remove partition");
        }
    }
}

/// Keep a reference usable as a file name component.
fn path_safe(value: &str) -> String {
    value
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' { c } else { '_' })
        .collect()
}
