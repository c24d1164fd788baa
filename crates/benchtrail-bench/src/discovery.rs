//! Benchmark discovery: find manifest files under a root and register
//! what they declare.
//!
//! Every immediate entry of the root whose name starts with `bench`
//! (case-insensitive) is considered. A file is loaded directly; a
//! directory contributes every `.toml` file beneath it. Entries are
//! visited in name order so registration order is stable.
//!
//! Manifest format:
//!
//! ```toml
//! [[bench]]
//! category = "Iteration"
//! name = "sum"
//! sizes = [10, 1000]
//! kernel = "sum"
//!
//! [[bench]]
//! category = "Cli"
//! name = "parse"
//! command = ["target/release/parse-bench", "{input}"]
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use benchtrail_core::constants::{BENCH_PREFIX, ID_SEPARATOR, MANIFEST_EXTENSION};
use benchtrail_core::errors::DiscoveryError;
use serde::Deserialize;
use walkdir::WalkDir;

use crate::registry::{BenchmarkDescriptor, Registry};
use crate::workload::{CommandWorkload, Kernel, Workload};

#[derive(Debug, Deserialize)]
struct Manifest {
    #[serde(default)]
    bench: Vec<ManifestEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ManifestEntry {
    category: String,
    name: String,
    sizes: Option<Vec<u64>>,
    kernel: Option<String>,
    command: Option<Vec<String>>,
}

/// What a discovery pass loaded.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DiscoveryStats {
    pub files_loaded: usize,
    pub benchmarks_registered: usize,
}

/// Walk `root` and register every declared benchmark into `registry`.
/// The first manifest that fails to load aborts discovery.
pub fn discover(
    root: &Path,
    registry: &mut Registry,
    default_sizes: &[u64],
) -> Result<DiscoveryStats, DiscoveryError> {
    if !root.is_dir() {
        return Err(DiscoveryError::RootNotFound {
            path: root.to_path_buf(),
        });
    }

    let mut entries: Vec<PathBuf> = std::fs::read_dir(root)
        .map_err(|e| DiscoveryError::Io {
            path: root.to_path_buf(),
            source: e,
        })?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<_, _>>()
        .map_err(|e| DiscoveryError::Io {
            path: root.to_path_buf(),
            source: e,
        })?;
    entries.sort();

    let mut stats = DiscoveryStats::default();
    for path in entries.iter().filter(|p| is_bench_entry(p)) {
        if path.is_file() {
            load_into(path, registry, default_sizes, &mut stats)?;
        } else if path.is_dir() {
            for entry in WalkDir::new(path).sort_by_file_name() {
                let entry = entry.map_err(|e| DiscoveryError::Io {
                    path: e.path().map(Path::to_path_buf).unwrap_or_else(|| path.clone()),
                    source: e.into(),
                })?;
                if entry.file_type().is_file() {
                    load_into(entry.path(), registry, default_sizes, &mut stats)?;
                }
            }
        }
    }

    tracing::info!(
        root = %root.display(),
        files = stats.files_loaded,
        benchmarks = stats.benchmarks_registered,
        "discovered benchmarks"
    );
    Ok(stats)
}

fn is_bench_entry(path: &Path) -> bool {
    path.file_name()
        .map(|n| n.to_string_lossy().to_lowercase().starts_with(BENCH_PREFIX))
        .unwrap_or(false)
}

fn load_into(
    path: &Path,
    registry: &mut Registry,
    default_sizes: &[u64],
    stats: &mut DiscoveryStats,
) -> Result<(), DiscoveryError> {
    let descriptors = load_source(path, default_sizes)?;
    if let Some(descriptors) = descriptors {
        stats.files_loaded += 1;
        stats.benchmarks_registered += descriptors.len();
        for d in descriptors {
            registry.register_descriptor(d);
        }
    }
    Ok(())
}

/// Load one benchmark source file. Files that are not manifests are
/// skipped (`Ok(None)`).
pub fn load_source(
    path: &Path,
    default_sizes: &[u64],
) -> Result<Option<Vec<BenchmarkDescriptor>>, DiscoveryError> {
    let is_manifest = path
        .extension()
        .map(|e| e.eq_ignore_ascii_case(MANIFEST_EXTENSION))
        .unwrap_or(false);
    if !is_manifest || !path.is_file() {
        return Ok(None);
    }

    let text = std::fs::read_to_string(path).map_err(|e| DiscoveryError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    let manifest: Manifest = toml::from_str(&text).map_err(|e| DiscoveryError::InvalidManifest {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let descriptors = manifest
        .bench
        .into_iter()
        .map(|entry| build_descriptor(path, entry, default_sizes))
        .collect::<Result<Vec<_>, _>>()?;
    tracing::debug!(path = %path.display(), count = descriptors.len(), "loaded manifest");
    Ok(Some(descriptors))
}

fn build_descriptor(
    path: &Path,
    entry: ManifestEntry,
    default_sizes: &[u64],
) -> Result<BenchmarkDescriptor, DiscoveryError> {
    let invalid = |message: String| DiscoveryError::InvalidManifest {
        path: path.to_path_buf(),
        message,
    };

    if entry.category.trim().is_empty() || entry.name.trim().is_empty() {
        return Err(invalid("category and name must be non-empty".to_string()));
    }
    // Row ids start with the category, so a separator inside it would let
    // two different series share an id.
    if entry.category.contains(ID_SEPARATOR) {
        return Err(invalid(format!(
            "category '{}' must not contain '{ID_SEPARATOR}'",
            entry.category
        )));
    }

    let sizes = entry.sizes.unwrap_or_else(|| default_sizes.to_vec());
    if sizes.is_empty() {
        return Err(invalid(format!(
            "{}/{} declares no sizes",
            entry.category, entry.name
        )));
    }

    let workload: Arc<dyn Workload> = match (entry.kernel, entry.command) {
        (Some(kernel), None) => match Kernel::from_name(&kernel) {
            Some(k) => Arc::new(k),
            None => {
                return Err(DiscoveryError::UnknownKernel {
                    path: path.to_path_buf(),
                    category: entry.category,
                    name: entry.name,
                    kernel,
                })
            }
        },
        (None, Some(argv)) => match CommandWorkload::new(argv) {
            Some(w) => Arc::new(w),
            None => {
                return Err(invalid(format!(
                    "{}/{} has an empty command",
                    entry.category, entry.name
                )))
            }
        },
        _ => {
            return Err(invalid(format!(
                "{}/{} must declare exactly one of `kernel` or `command`",
                entry.category, entry.name
            )))
        }
    };

    Ok(BenchmarkDescriptor {
        category: entry.category,
        name: entry.name,
        workload,
        sizes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bench_prefix_is_case_insensitive() {
        assert!(is_bench_entry(Path::new("/x/Benchmarks")));
        assert!(is_bench_entry(Path::new("/x/bench_core.toml")));
        assert!(!is_bench_entry(Path::new("/x/src")));
    }

    #[test]
    fn non_manifest_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bench_notes.md");
        std::fs::write(&path, "# not a manifest").unwrap();
        assert!(load_source(&path, &[10]).unwrap().is_none());
    }

    #[test]
    fn default_sizes_fill_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bench.toml");
        std::fs::write(
            &path,
            "[[bench]]\ncategory = \"A\"\nname = \"x\"\nkernel = \"sum\"\n",
        )
        .unwrap();
        let descriptors = load_source(&path, &[7, 70]).unwrap().unwrap();
        assert_eq!(descriptors[0].sizes, vec![7, 70]);
    }

    #[test]
    fn kernel_and_command_are_exclusive() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bench.toml");
        std::fs::write(
            &path,
            "[[bench]]\ncategory = \"A\"\nname = \"x\"\nkernel = \"sum\"\ncommand = [\"true\"]\n",
        )
        .unwrap();
        assert!(matches!(
            load_source(&path, &[1]),
            Err(DiscoveryError::InvalidManifest { .. })
        ));
    }
}
