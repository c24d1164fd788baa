//! Isolated child-process execution for one historical commit.
//!
//! The child is invoked as `<argv prefix> <bench_root> <partition> <category or "">`
//! with the worktree as its working directory. Exit status 0 means the
//! partition file exists; anything else means it does not.

use std::path::Path;
use std::process::{Command, Stdio};

use benchtrail_core::constants::CHILD_SUBCOMMAND;
use benchtrail_core::errors::ExecutionError;
use benchtrail_core::BenchtrailConfig;

use crate::process::{log_output, render_command, tail};

/// One child invocation.
#[derive(Debug, Clone, Copy)]
pub struct ChildJob<'a> {
    /// Working directory: the commit's worktree.
    pub worktree: &'a Path,
    /// Benchmark definitions from the current checkout.
    pub bench_root: &'a Path,
    pub partition: &'a Path,
    pub category: Option<&'a str>,
}

/// Runs the single-run pipeline of one commit in a separate process.
pub trait ChildLauncher {
    fn launch(&self, job: &ChildJob<'_>) -> Result<(), ExecutionError>;
}

/// Spawns a real child process and blocks until it exits.
#[derive(Debug, Clone)]
pub struct ProcessLauncher {
    argv: Vec<String>,
    envs: Vec<(String, String)>,
}

impl ProcessLauncher {
    /// Launcher with an explicit argv prefix. `None` if `argv` is empty.
    pub fn new(argv: Vec<String>) -> Option<Self> {
        if argv.is_empty() {
            return None;
        }
        Some(Self {
            argv,
            envs: Vec::new(),
        })
    }

    /// Re-invoke the running executable with the child subcommand.
    pub fn current_exe() -> std::io::Result<Self> {
        let exe = std::env::current_exe()?;
        Ok(Self {
            argv: vec![
                exe.to_string_lossy().into_owned(),
                CHILD_SUBCOMMAND.to_string(),
            ],
            envs: Vec::new(),
        })
    }

    /// Launcher for a resolved config. The child inherits the parent's
    /// run settings through `BENCHTRAIL_*` variables, since it loads its
    /// own config from the worktree.
    pub fn from_config(config: &BenchtrailConfig) -> Result<Self, ExecutionError> {
        let launcher = match config.history.child_command.clone() {
            Some(argv) => Self::new(argv).ok_or_else(|| ExecutionError::ChildSpawn {
                program: String::new(),
                source: std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "child command is empty",
                ),
            })?,
            None => Self::current_exe().map_err(|source| ExecutionError::ChildSpawn {
                program: CHILD_SUBCOMMAND.to_string(),
                source,
            })?,
        };
        let sizes = config
            .run
            .effective_default_sizes()
            .iter()
            .map(u64::to_string)
            .collect::<Vec<_>>()
            .join(",");
        Ok(launcher
            .env("BENCHTRAIL_RUNS", config.run.effective_runs().to_string())
            .env("BENCHTRAIL_ID_HASH_LEN", config.run.effective_id_hash_len().to_string())
            .env("BENCHTRAIL_DEFAULT_SIZES", sizes))
    }

    /// Set an environment variable for every launched child.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    pub fn argv(&self) -> &[String] {
        &self.argv
    }
}

impl ChildLauncher for ProcessLauncher {
    fn launch(&self, job: &ChildJob<'_>) -> Result<(), ExecutionError> {
        let (program, prefix) = self
            .argv
            .split_first()
            .ok_or_else(|| ExecutionError::ChildSpawn {
                program: String::new(),
                source: std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "child command is empty",
                ),
            })?;

        let mut cmd = Command::new(program);
        cmd.args(prefix)
            .arg(job.bench_root)
            .arg(job.partition)
            .arg(job.category.unwrap_or(""))
            .current_dir(job.worktree)
            .stdin(Stdio::null());
        for (key, value) in &self.envs {
            cmd.env(key, value);
        }

        tracing::debug!(
            command = %render_command(&self.argv),
            worktree = %job.worktree.display(),
            partition = %job.partition.display(),
            "launching child"
        );
        let output = cmd.output().map_err(|source| ExecutionError::ChildSpawn {
            program: program.clone(),
            source,
        })?;
        log_output("child", &output);

        if !output.status.success() {
            return Err(ExecutionError::ChildFailed {
                status: output.status.to_string(),
                stderr_tail: tail(&output.stderr),
            });
        }
        if !job.partition.is_file() {
            return Err(ExecutionError::MissingPartition {
                path: job.partition.to_path_buf(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_argv_is_rejected() {
        assert!(ProcessLauncher::new(Vec::new()).is_none());
    }

    #[test]
    fn config_run_settings_are_forwarded() {
        let config = BenchtrailConfig::from_toml(
            "[run]\nruns = 4\ndefault_sizes = [1, 2]\n[history]\nchild_command = [\"bench-child\"]\n",
        )
        .unwrap();
        let launcher = ProcessLauncher::from_config(&config).unwrap();
        assert_eq!(launcher.argv(), ["bench-child".to_string()]);
        assert!(launcher
            .envs
            .contains(&("BENCHTRAIL_RUNS".to_string(), "4".to_string())));
        assert!(launcher
            .envs
            .contains(&("BENCHTRAIL_DEFAULT_SIZES".to_string(), "1,2".to_string())));
    }

    #[cfg(unix)]
    #[test]
    fn nonzero_exit_is_child_failure() {
        let dir = tempfile::tempdir().unwrap();
        let launcher = ProcessLauncher::new(vec![
            "sh".to_string(),
            "-c".to_string(),
            "echo broken >&2; exit 3".to_string(),
            "child".to_string(),
        ])
        .unwrap();
        let partition = dir.path().join("p.jsonl");
        let job = ChildJob {
            worktree: dir.path(),
            bench_root: dir.path(),
            partition: &partition,
            category: None,
        };
        match launcher.launch(&job) {
            Err(ExecutionError::ChildFailed { stderr_tail, .. }) => {
                assert_eq!(stderr_tail, "broken")
            }
            other => panic!("expected ChildFailed, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn success_without_partition_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let launcher = ProcessLauncher::new(vec!["true".to_string()]).unwrap();
        let partition = dir.path().join("p.jsonl");
        let job = ChildJob {
            worktree: dir.path(),
            bench_root: dir.path(),
            partition: &partition,
            category: Some("A"),
        };
        assert!(matches!(
            launcher.launch(&job),
            Err(ExecutionError::MissingPartition { .. })
        ));
    }
}
