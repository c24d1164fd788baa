//! Single-run pipeline: discover → filter → execute → aggregate, against
//! whatever checkout the process is running in.

use std::path::Path;

use benchtrail_core::config::RunConfig;
use benchtrail_core::errors::PipelineError;
use benchtrail_core::traits::CancellationToken;
use benchtrail_core::BenchRecord;
use benchtrail_storage::partition::write_partition;

use crate::discovery::{self, DiscoveryStats};
use crate::engine::Engine;
use crate::registry::Registry;
use crate::stats;
use crate::vcs::RevisionSource;

/// Resolved run settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineOptions {
    pub runs: u32,
    pub default_sizes: Vec<u64>,
    pub id_hash_len: usize,
}

impl PipelineOptions {
    pub fn from_config(config: &RunConfig) -> Self {
        Self {
            runs: config.effective_runs(),
            default_sizes: config.effective_default_sizes(),
            id_hash_len: config.effective_id_hash_len(),
        }
    }
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self::from_config(&RunConfig::default())
    }
}

/// Owns the registry for exactly one pipeline run.
#[derive(Debug)]
pub struct PipelineContext {
    registry: Registry,
    options: PipelineOptions,
    cancel: Option<CancellationToken>,
}

impl PipelineContext {
    /// A context with an empty registry.
    pub fn new(options: PipelineOptions) -> Self {
        Self {
            registry: Registry::new(),
            options,
            cancel: None,
        }
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Populate the registry from the manifests under `root`.
    pub fn discover(&mut self, root: &Path) -> Result<DiscoveryStats, PipelineError> {
        Ok(discovery::discover(
            root,
            &mut self.registry,
            &self.options.default_sizes,
        )?)
    }

    /// Execute and aggregate whatever the registry holds that matches
    /// `category`. The revision is looked up once and stamped on every row.
    pub fn run(
        &self,
        category: Option<&str>,
        revision: &dyn RevisionSource,
    ) -> Result<Vec<BenchRecord>, PipelineError> {
        let selected = self.registry.filter_by_category(category)?;
        let revision = revision.current_revision()?;
        tracing::info!(
            benchmarks = selected.len(),
            runs = self.options.runs,
            commit = %revision.short_hash(self.options.id_hash_len),
            "running benchmarks"
        );

        let mut engine = Engine::new(self.options.runs);
        if let Some(token) = &self.cancel {
            engine = engine.with_cancellation(token.clone());
        }
        let raw = engine.execute(&selected)?;
        let rows = stats::aggregate(&raw, &revision, self.options.id_hash_len)?;
        Ok(rows)
    }
}

/// One full pass with a fresh registry.
pub fn run_pipeline(
    root: &Path,
    category: Option<&str>,
    options: &PipelineOptions,
    revision: &dyn RevisionSource,
) -> Result<Vec<BenchRecord>, PipelineError> {
    let mut ctx = PipelineContext::new(options.clone());
    ctx.discover(root)?;
    ctx.run(category, revision)
}

/// Child side of a historical run: run the pipeline and write its rows
/// to `partition`. Nothing is written on failure.
pub fn run_partition(
    bench_root: &Path,
    partition: &Path,
    category: Option<&str>,
    options: &PipelineOptions,
    revision: &dyn RevisionSource,
) -> Result<usize, PipelineError> {
    let rows = run_pipeline(bench_root, category, options, revision)?;
    write_partition(partition, &rows)?;
    Ok(rows.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vcs::FixedRevision;
    use crate::workload::Kernel;
    use benchtrail_core::RevisionInfo;

    #[test]
    fn empty_registry_is_no_benchmarks() {
        let ctx = PipelineContext::new(PipelineOptions::default());
        let rev = FixedRevision(RevisionInfo::from_epoch_seconds("abc", 0).unwrap());
        assert!(matches!(
            ctx.run(None, &rev),
            Err(PipelineError::NoBenchmarks { .. })
        ));
    }

    #[test]
    fn failing_workload_discards_run() {
        let mut ctx = PipelineContext::new(PipelineOptions {
            runs: 3,
            ..PipelineOptions::default()
        });
        ctx.registry_mut().register("A", "ok", Kernel::Sum, vec![10]);
        ctx.registry_mut().register(
            "A",
            "broken",
            |_: &crate::fixtures::BenchInput| -> Result<(), String> { Err("boom".to_string()) },
            vec![10],
        );
        let rev = FixedRevision(RevisionInfo::from_epoch_seconds("abc", 0).unwrap());
        assert!(matches!(
            ctx.run(None, &rev),
            Err(PipelineError::Execution(_))
        ));
    }
}
