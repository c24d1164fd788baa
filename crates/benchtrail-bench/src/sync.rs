//! Environment reconstruction inside a commit's worktree.
//!
//! Before a historical commit can be benchmarked its dependencies must
//! match that commit's lockfile, not the current one. With an explicit
//! `history.sync_command` that command runs as-is; otherwise the build
//! manifest present in the worktree decides.

use std::path::Path;
use std::process::{Command, Stdio};

use benchtrail_core::errors::SyncError;

use crate::process::{log_output, render_command, tail};

/// Rebuilds the environment a worktree needs.
pub trait EnvSync {
    fn sync(&self, worktree: &Path) -> Result<(), SyncError>;
}

/// Marker file → command, checked in order; the first present file wins.
const DETECTORS: &[(&str, &[&str])] = &[
    ("uv.lock", &["uv", "sync"]),
    ("pyproject.toml", &["uv", "sync"]),
    ("Cargo.toml", &["cargo", "build", "--release"]),
    ("package-lock.json", &["npm", "ci"]),
    ("package.json", &["npm", "install"]),
    ("Makefile", &["make"]),
];

/// Pick the sync command for a worktree from the manifests it contains.
pub fn detect_command(worktree: &Path) -> Option<Vec<String>> {
    DETECTORS
        .iter()
        .find(|(marker, _)| worktree.join(marker).is_file())
        .map(|(_, argv)| argv.iter().map(|s| s.to_string()).collect())
}

/// Runs a configured or detected sync command with the worktree as cwd.
#[derive(Debug, Clone, Default)]
pub struct ManifestSync {
    command: Option<Vec<String>>,
}

impl ManifestSync {
    /// Detect the command per worktree.
    pub fn detect() -> Self {
        Self { command: None }
    }

    /// Always run `argv`.
    pub fn with_command(argv: Vec<String>) -> Self {
        Self {
            command: Some(argv),
        }
    }
}

impl EnvSync for ManifestSync {
    fn sync(&self, worktree: &Path) -> Result<(), SyncError> {
        let argv = match &self.command {
            Some(argv) => argv.clone(),
            None => detect_command(worktree).ok_or_else(|| SyncError::NoManifest {
                path: worktree.to_path_buf(),
            })?,
        };
        let (program, args) = argv.split_first().ok_or(SyncError::EmptyCommand)?;
        let rendered = render_command(&argv);

        tracing::info!(worktree = %worktree.display(), command = %rendered, "syncing environment");
        let output = Command::new(program)
            .args(args)
            .current_dir(worktree)
            .stdin(Stdio::null())
            .output()
            .map_err(|source| SyncError::Spawn {
                program: program.clone(),
                source,
            })?;
        log_output("sync", &output);

        if !output.status.success() {
            return Err(SyncError::Failed {
                command: rendered,
                status: output.status.to_string(),
                stderr_tail: tail(&output.stderr),
            });
        }
        Ok(())
    }
}

/// Skips environment reconstruction.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSync;

impl EnvSync for NoSync {
    fn sync(&self, _worktree: &Path) -> Result<(), SyncError> {
        Ok(())
    }
}
