//! Execution engine: time every descriptor at every size.
//!
//! For each (descriptor, size) the deterministic input is generated and
//! prepared outside the timed region, then the workload is invoked `runs`
//! times, each measured with `Instant`. The first failing invocation
//! aborts the whole run and discards every sample taken so far.

use std::sync::Arc;
use std::time::Instant;

use benchtrail_core::errors::ExecutionError;
use benchtrail_core::traits::{Cancellable, CancellationToken};
use benchtrail_core::RawTiming;
use rustc_hash::FxHashMap;

use crate::fixtures::BenchInput;
use crate::registry::BenchmarkDescriptor;

/// Runs descriptors and collects raw samples.
#[derive(Debug, Clone)]
pub struct Engine {
    runs: u32,
    cancel: Option<CancellationToken>,
}

impl Engine {
    /// Engine timing each (descriptor, size) `runs` times.
    pub fn new(runs: u32) -> Self {
        Self { runs, cancel: None }
    }

    /// Check `token` between invocations.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn runs(&self) -> u32 {
        self.runs
    }

    /// Produce exactly `sizes.len() × runs` samples per descriptor.
    pub fn execute(
        &self,
        descriptors: &[&BenchmarkDescriptor],
    ) -> Result<Vec<RawTiming>, ExecutionError> {
        let expected: usize = descriptors
            .iter()
            .map(|d| d.sizes.len() * self.runs as usize)
            .sum();
        let mut samples = Vec::with_capacity(expected);
        // Inputs depend on size only, so descriptors sharing a size share one.
        let mut inputs: FxHashMap<u64, Arc<BenchInput>> = FxHashMap::default();
        // Duplicate registrations share a group, so their run indices continue.
        let mut next_run: FxHashMap<(&str, &str, u64), u32> = FxHashMap::default();

        for descriptor in descriptors {
            let started = Instant::now();
            for &size in &descriptor.sizes {
                let input = inputs
                    .entry(size)
                    .or_insert_with(|| Arc::new(BenchInput::generate(size)))
                    .clone();

                descriptor.workload.prepare(&input).map_err(|message| {
                    ExecutionError::InputPreparation {
                        category: descriptor.category.clone(),
                        name: descriptor.name.clone(),
                        size,
                        message,
                    }
                })?;

                let first_run = next_run
                    .entry((descriptor.category.as_str(), descriptor.name.as_str(), size))
                    .or_insert(0);
                let base = *first_run;
                *first_run = base.saturating_add(self.runs);

                for run_index in base..base.saturating_add(self.runs) {
                    if self.is_cancelled() {
                        return Err(ExecutionError::Cancelled);
                    }
                    let start = Instant::now();
                    let result = descriptor.workload.run(&input);
                    let elapsed = start.elapsed().as_secs_f64();
                    result.map_err(|message| ExecutionError::BenchmarkFailed {
                        category: descriptor.category.clone(),
                        name: descriptor.name.clone(),
                        size,
                        run_index,
                        message,
                    })?;
                    samples.push(RawTiming {
                        category: descriptor.category.clone(),
                        name: descriptor.name.clone(),
                        size,
                        run_index,
                        elapsed,
                    });
                }
            }
            tracing::debug!(
                category = %descriptor.category,
                name = %descriptor.name,
                sizes = descriptor.sizes.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "benchmark finished"
            );
        }

        Ok(samples)
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(|c| c.is_cancelled())
    }
}
