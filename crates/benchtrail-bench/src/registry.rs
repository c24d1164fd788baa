//! Benchmark registry: category → ordered descriptors.
//!
//! A registry is a plain value owned by one pipeline context. Every
//! pipeline run starts from a fresh one, and every historical commit runs
//! in its own process, so registrations never leak between runs.

use std::fmt;
use std::sync::Arc;

use benchtrail_core::errors::PipelineError;
use rustc_hash::FxHashMap;

use crate::workload::Workload;

/// Registered metadata for one benchmark.
#[derive(Clone)]
pub struct BenchmarkDescriptor {
    pub category: String,
    pub name: String,
    pub workload: Arc<dyn Workload>,
    /// Input sizes, in declaration order.
    pub sizes: Vec<u64>,
}

impl fmt::Debug for BenchmarkDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BenchmarkDescriptor")
            .field("category", &self.category)
            .field("name", &self.name)
            .field("sizes", &self.sizes)
            .finish_non_exhaustive()
    }
}

#[derive(Debug)]
struct Category {
    name: String,
    descriptors: Vec<BenchmarkDescriptor>,
}

/// Descriptors grouped by category, both in registration order.
#[derive(Debug, Default)]
pub struct Registry {
    categories: Vec<Category>,
    index: FxHashMap<String, usize>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a descriptor to its category. Registering the same
    /// category and name twice keeps both.
    pub fn register(
        &mut self,
        category: impl Into<String>,
        name: impl Into<String>,
        workload: impl Workload + 'static,
        sizes: Vec<u64>,
    ) {
        self.register_descriptor(BenchmarkDescriptor {
            category: category.into(),
            name: name.into(),
            workload: Arc::new(workload),
            sizes,
        });
    }

    pub fn register_descriptor(&mut self, descriptor: BenchmarkDescriptor) {
        let idx = match self.index.get(&descriptor.category) {
            Some(&idx) => idx,
            None => {
                let idx = self.categories.len();
                self.index.insert(descriptor.category.clone(), idx);
                self.categories.push(Category {
                    name: descriptor.category.clone(),
                    descriptors: Vec::new(),
                });
                idx
            }
        };
        let bucket = &mut self.categories[idx].descriptors;
        if bucket.iter().any(|d| d.name == descriptor.name) {
            tracing::debug!(
                category = %descriptor.category,
                name = %descriptor.name,
                "duplicate benchmark registration"
            );
        }
        bucket.push(descriptor);
    }

    /// Total number of descriptors.
    pub fn len(&self) -> usize {
        self.categories.iter().map(|c| c.descriptors.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Category names in registration order.
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(|c| c.name.as_str())
    }

    /// Descriptors of one category (exact name).
    pub fn category(&self, name: &str) -> Option<&[BenchmarkDescriptor]> {
        self.index
            .get(name)
            .map(|&idx| self.categories[idx].descriptors.as_slice())
    }

    /// All descriptors, flattened in category then registration order.
    pub fn descriptors(&self) -> impl Iterator<Item = &BenchmarkDescriptor> {
        self.categories.iter().flat_map(|c| c.descriptors.iter())
    }

    /// Descriptors selected by an optional category filter.
    ///
    /// Without a filter every descriptor is returned. With one, categories
    /// whose name contains the filter (case-insensitive) are kept. An
    /// empty selection is `PipelineError::NoBenchmarks`.
    pub fn filter_by_category(
        &self,
        filter: Option<&str>,
    ) -> Result<Vec<&BenchmarkDescriptor>, PipelineError> {
        let selected: Vec<&BenchmarkDescriptor> = match filter {
            None => self.descriptors().collect(),
            Some(f) => {
                let needle = f.to_lowercase();
                self.categories
                    .iter()
                    .filter(|c| c.name.to_lowercase().contains(&needle))
                    .flat_map(|c| c.descriptors.iter())
                    .collect()
            }
        };
        if selected.is_empty() {
            return Err(PipelineError::NoBenchmarks {
                filter: filter.map(str::to_string),
            });
        }
        Ok(selected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workload::Kernel;

    fn registry_with(categories: &[&str]) -> Registry {
        let mut r = Registry::new();
        for c in categories {
            r.register(*c, "bench", Kernel::Sum, vec![10]);
        }
        r
    }

    #[test]
    fn register_groups_by_category_in_order() {
        let mut r = Registry::new();
        r.register("B", "one", Kernel::Sum, vec![1]);
        r.register("A", "two", Kernel::Max, vec![1]);
        r.register("B", "three", Kernel::Sort, vec![1]);

        assert_eq!(r.categories().collect::<Vec<_>>(), vec!["B", "A"]);
        let names: Vec<_> = r.descriptors().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["one", "three", "two"]);
        assert_eq!(r.len(), 3);
    }

    #[test]
    fn duplicates_accumulate() {
        let mut r = Registry::new();
        r.register("A", "same", Kernel::Sum, vec![1]);
        r.register("A", "same", Kernel::Sum, vec![1]);
        assert_eq!(r.category("A").map(|d| d.len()), Some(2));
    }

    #[test]
    fn substring_filter_is_case_insensitive() {
        let r = registry_with(&["Serialization", "UserSerializer", "Parsing"]);
        let selected = r.filter_by_category(Some("ser")).unwrap();
        let cats: Vec<_> = selected.iter().map(|d| d.category.as_str()).collect();
        assert_eq!(cats, vec!["Serialization", "UserSerializer"]);
    }

    #[test]
    fn no_filter_returns_everything() {
        let r = registry_with(&["A", "B"]);
        assert_eq!(r.filter_by_category(None).unwrap().len(), 2);
    }

    #[test]
    fn empty_selection_is_not_found() {
        let r = registry_with(&["Parsing"]);
        assert!(matches!(
            r.filter_by_category(Some("ser")),
            Err(PipelineError::NoBenchmarks { .. })
        ));
        assert!(matches!(
            Registry::new().filter_by_category(None),
            Err(PipelineError::NoBenchmarks { filter: None })
        ));
    }
}
