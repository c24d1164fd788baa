//! Version-control collaborators.
//!
//! Reference resolution and revision metadata go through `git2`. Worktree
//! management shells out to the `git` CLI, which owns the worktree
//! bookkeeping under `.git/worktrees`.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use benchtrail_core::errors::VcsError;
use benchtrail_core::RevisionInfo;
use git2::Repository;

use crate::process::tail;

/// What the historical runner needs from version control.
pub trait Vcs {
    /// Full commit id for a reference (hash, prefix, branch, tag, `HEAD~2`).
    fn resolve(&self, reference: &str) -> Result<String, VcsError>;

    /// Check `commit` out, detached, into a new worktree at `path`.
    fn create_detached_worktree(&self, path: &Path, commit: &str) -> Result<(), VcsError>;

    /// Force-remove the worktree at `path`. Succeeds only if the directory
    /// is gone afterwards.
    fn remove_worktree(&self, path: &Path) -> Result<(), VcsError>;
}

/// Identity of the checkout a pipeline runs against.
pub trait RevisionSource {
    fn current_revision(&self) -> Result<RevisionInfo, VcsError>;
}

/// A git repository on disk.
#[derive(Debug, Clone)]
pub struct GitRepository {
    workdir: PathBuf,
}

impl GitRepository {
    /// Find the repository containing `path`.
    pub fn discover(path: &Path) -> Result<Self, VcsError> {
        let repo = Repository::discover(path).map_err(|e| VcsError::Revision {
            path: path.to_path_buf(),
            message: e.message().to_string(),
        })?;
        let workdir = repo
            .workdir()
            .map(Path::to_path_buf)
            .ok_or_else(|| VcsError::Revision {
                path: path.to_path_buf(),
                message: "bare repositories have no working directory".to_string(),
            })?;
        Ok(Self { workdir })
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    fn open(&self) -> Result<Repository, VcsError> {
        Repository::open(&self.workdir).map_err(|e| VcsError::Revision {
            path: self.workdir.clone(),
            message: e.message().to_string(),
        })
    }

    fn git(&self, args: &[&OsStr]) -> Result<Output, VcsError> {
        let output = Command::new("git")
            .arg("-C")
            .arg(&self.workdir)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .map_err(|source| VcsError::Spawn { source })?;
        crate::process::log_output("git", &output);
        Ok(output)
    }

    fn prune(&self) {
        match self.git(&[OsStr::new("worktree"), OsStr::new("prune")]) {
            Ok(out) if !out.status.success() => {
                tracing::warn!(stderr = %tail(&out.stderr), "git worktree prune failed");
            }
            Err(e) => tracing::warn!(error = %e, "git worktree prune failed"),
            Ok(_) => {}
        }
    }
}

impl Vcs for GitRepository {
    fn resolve(&self, reference: &str) -> Result<String, VcsError> {
        let repo = self.open()?;
        let commit = repo
            .revparse_single(reference)
            .and_then(|obj| obj.peel_to_commit())
            .map_err(|e| VcsError::Resolve {
                reference: reference.to_string(),
                message: e.message().to_string(),
            })?;
        Ok(commit.id().to_string())
    }

    fn create_detached_worktree(&self, path: &Path, commit: &str) -> Result<(), VcsError> {
        let output = self.git(&[
            OsStr::new("worktree"),
            OsStr::new("add"),
            OsStr::new("--detach"),
            path.as_os_str(),
            OsStr::new(commit),
        ])?;
        if !output.status.success() {
            return Err(VcsError::WorktreeCreate {
                path: path.to_path_buf(),
                commit: commit.to_string(),
                message: tail(&output.stderr),
            });
        }
        tracing::debug!(path = %path.display(), commit, "created worktree");
        Ok(())
    }

    fn remove_worktree(&self, path: &Path) -> Result<(), VcsError> {
        let output = self.git(&[
            OsStr::new("worktree"),
            OsStr::new("remove"),
            OsStr::new("--force"),
            path.as_os_str(),
        ])?;
        if !output.status.success() {
            tracing::debug!(
                path = %path.display(),
                stderr = %tail(&output.stderr),
                "git worktree remove failed, deleting directory"
            );
        }
        if path.exists() {
            std::fs::remove_dir_all(path).map_err(|e| VcsError::WorktreeRemove {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        }
        self.prune();
        if path.exists() {
            return Err(VcsError::WorktreeRemove {
                path: path.to_path_buf(),
                message: "directory still present after removal".to_string(),
            });
        }
        Ok(())
    }
}

/// Reads HEAD of whatever checkout (main or worktree) contains `path`.
#[derive(Debug, Clone)]
pub struct CheckoutRevision {
    path: PathBuf,
}

impl CheckoutRevision {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RevisionSource for CheckoutRevision {
    fn current_revision(&self) -> Result<RevisionInfo, VcsError> {
        let err = |message: String| VcsError::Revision {
            path: self.path.clone(),
            message,
        };
        let repo = Repository::discover(&self.path).map_err(|e| err(e.message().to_string()))?;
        let commit = repo
            .head()
            .and_then(|head| head.peel_to_commit())
            .map_err(|e| err(e.message().to_string()))?;
        let seconds = commit.time().seconds();
        RevisionInfo::from_epoch_seconds(commit.id().to_string(), seconds)
            .ok_or_else(|| err(format!("commit time {seconds} out of range")))
    }
}

/// A revision known up front, for dry runs and tests.
#[derive(Debug, Clone)]
pub struct FixedRevision(pub RevisionInfo);

impl RevisionSource for FixedRevision {
    fn current_revision(&self) -> Result<RevisionInfo, VcsError> {
        Ok(self.0.clone())
    }
}
