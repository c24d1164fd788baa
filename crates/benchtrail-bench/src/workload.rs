//! Benchmark callables.
//!
//! A [`Workload`] is what a descriptor times. Built-in [`Kernel`]s run in
//! process; [`CommandWorkload`]s spawn an external program from the
//! pipeline's working directory, which for a historical run is the
//! commit's worktree. Any `Fn(&BenchInput) -> Result<(), String>` closure
//! is a workload too.

use std::collections::HashSet;
use std::hint::black_box;
use std::process::{Command, Stdio};

use crate::fixtures::BenchInput;
use crate::process::{render_command, tail};

/// Something a benchmark descriptor can time.
pub trait Workload: Send + Sync {
    /// Untimed setup for one input, called once per size before the
    /// timed invocations.
    fn prepare(&self, _input: &BenchInput) -> Result<(), String> {
        Ok(())
    }

    /// One timed invocation. An error fails the whole pipeline run.
    fn run(&self, input: &BenchInput) -> Result<(), String>;
}

impl<F> Workload for F
where
    F: Fn(&BenchInput) -> Result<(), String> + Send + Sync,
{
    fn run(&self, input: &BenchInput) -> Result<(), String> {
        self(input)
    }
}

/// In-process kernels over the generated integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kernel {
    /// Square every element into a new vector.
    Square,
    Sum,
    Max,
    Sort,
    Reverse,
    /// Distinct elements via a hash set.
    Dedup,
}

impl Kernel {
    pub const ALL: [Kernel; 6] = [
        Kernel::Square,
        Kernel::Sum,
        Kernel::Max,
        Kernel::Sort,
        Kernel::Reverse,
        Kernel::Dedup,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Square => "square",
            Self::Sum => "sum",
            Self::Max => "max",
            Self::Sort => "sort",
            Self::Reverse => "reverse",
            Self::Dedup => "dedup",
        }
    }

    /// Look a kernel up by its manifest name (case-insensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(name))
    }
}

impl Workload for Kernel {
    fn run(&self, input: &BenchInput) -> Result<(), String> {
        let values = black_box(input.values());
        match self {
            Self::Square => {
                black_box(values.iter().map(|x| x.wrapping_mul(*x)).collect::<Vec<_>>());
            }
            Self::Sum => {
                black_box(values.iter().fold(0i64, |acc, x| acc.wrapping_add(*x)));
            }
            Self::Max => {
                black_box(values.iter().max());
            }
            Self::Sort => {
                let mut v = values.to_vec();
                v.sort_unstable();
                black_box(v);
            }
            Self::Reverse => {
                black_box(values.iter().rev().copied().collect::<Vec<_>>());
            }
            Self::Dedup => {
                black_box(values.iter().collect::<HashSet<_>>().len());
            }
        }
        Ok(())
    }
}

/// Placeholder replaced by the input size.
pub const SIZE_PLACEHOLDER: &str = "{size}";
/// Placeholder replaced by the path of the materialized input file.
pub const INPUT_PLACEHOLDER: &str = "{input}";

/// External program timed end to end, including process startup.
#[derive(Debug, Clone)]
pub struct CommandWorkload {
    argv: Vec<String>,
}

impl CommandWorkload {
    /// `argv` must contain at least a program.
    pub fn new(argv: Vec<String>) -> Option<Self> {
        if argv.is_empty() {
            None
        } else {
            Some(Self { argv })
        }
    }

    fn needs_input_file(&self) -> bool {
        self.argv.iter().any(|a| a.contains(INPUT_PLACEHOLDER))
    }

    fn expand(&self, input: &BenchInput) -> Result<Vec<String>, String> {
        let input_path = if self.needs_input_file() {
            let path = input.materialize().map_err(|e| e.to_string())?;
            Some(path.to_string_lossy().into_owned())
        } else {
            None
        };
        let size = input.size().to_string();
        Ok(self
            .argv
            .iter()
            .map(|a| {
                let a = a.replace(SIZE_PLACEHOLDER, &size);
                match &input_path {
                    Some(p) => a.replace(INPUT_PLACEHOLDER, p),
                    None => a,
                }
            })
            .collect())
    }
}

impl Workload for CommandWorkload {
    fn prepare(&self, input: &BenchInput) -> Result<(), String> {
        if self.needs_input_file() {
            input.materialize().map_err(|e| e.to_string())?;
        }
        Ok(())
    }

    fn run(&self, input: &BenchInput) -> Result<(), String> {
        let argv = self.expand(input)?;
        let output = Command::new(&argv[0])
            .args(&argv[1..])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| format!("failed to spawn `{}`: {e}", render_command(&argv)))?;
        if output.status.success() {
            Ok(())
        } else {
            Err(format!(
                "`{}` exited with {}: {}",
                render_command(&argv),
                output.status,
                tail(&output.stderr)
            ))
        }
    }
}
