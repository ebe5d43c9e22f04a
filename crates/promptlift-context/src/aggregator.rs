use camino::Utf8PathBuf;
use globset::GlobSet;
use promptlift_analyzers::{
    AnalysisRecord, Analyzer, AnalyzerLimits, builtin_analyzers, default_analyzers,
};
use promptlift_config::{Config, DEFAULT_MAX_CONTEXT_BYTES};
use promptlift_utils::error::ConfigError;
use promptlift_utils::paths::{ProjectPath, resolve_project_path};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::Path;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::cache::{CacheEntry, CacheStats, ContextCache};
use crate::ProjectContext;

/// Merges an ordered list of analyzers into cached [`ProjectContext`] values.
///
/// Each aggregator owns its cache exclusively; nothing is shared between
/// instances and nothing is evicted except by [`ContextAggregator::clear_cache`].
pub struct ContextAggregator {
    analyzers: Vec<Arc<dyn Analyzer>>,
    max_context_bytes: usize,
    cache: ContextCache,
}

impl std::fmt::Debug for ContextAggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextAggregator")
            .field(
                "analyzers",
                &self.analyzers.iter().map(|a| a.name()).collect::<Vec<_>>(),
            )
            .field("max_context_bytes", &self.max_context_bytes)
            .field("cache", &self.cache.stats())
            .finish()
    }
}

impl ContextAggregator {
    #[must_use]
    pub fn new(analyzers: Vec<Arc<dyn Analyzer>>, max_context_bytes: usize) -> Self {
        Self {
            analyzers,
            max_context_bytes,
            cache: ContextCache::default(),
        }
    }

    /// Built-in analyzers with default limits and no extra ignore globs.
    #[must_use]
    pub fn with_defaults() -> Self {
        let analyzers = builtin_analyzers(&AnalyzerLimits::default(), GlobSet::empty());
        Self::new(analyzers, DEFAULT_MAX_CONTEXT_BYTES)
    }

    /// Built-in analyzers with limits and byte budget taken from `config`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` for a malformed ignore glob.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let analyzers = default_analyzers(&AnalyzerLimits::from_config(config))?;
        Ok(Self::new(analyzers, config.max_context_bytes()))
    }

    /// Context for the project at `path`, or `None` when there is none.
    ///
    /// Missing paths return `None` and are never cached, so a later call can
    /// succeed once the directory appears. An existing path that is not a
    /// directory is cached as unavailable. On a miss the analyzers run
    /// concurrently on the blocking pool; one failing contributes its empty
    /// record instead of failing the lookup.
    ///
    /// Cache keys and analyzer roots are UTF-8 paths, so a directory whose
    /// canonical path is not valid UTF-8 also yields `None` and is not cached.
    pub async fn get_context(&self, path: &Path) -> Option<Arc<ProjectContext>> {
        let key = match resolve_project_path(path) {
            ProjectPath::Directory(key) => key,
            ProjectPath::NotADirectory(key) => {
                if self.cache.get(&key).is_none() {
                    debug!(path = %key, "Not a directory; caching as unavailable");
                    self.cache.insert(key, CacheEntry::Unavailable);
                }
                return None;
            }
            ProjectPath::NonUtf8 => {
                debug!(path = %path.display(), "Project path is not valid UTF-8");
                return None;
            }
            ProjectPath::Missing => {
                debug!(path = %path.display(), "Project path does not exist");
                return None;
            }
        };

        if let Some(entry) = self.cache.get(&key) {
            debug!(path = %key, "Context cache hit");
            return match entry {
                CacheEntry::Available(context) => Some(context),
                CacheEntry::Unavailable => None,
            };
        }

        debug!(path = %key, analyzers = self.analyzers.len(), "Context cache miss");
        let records = self.run_analyzers(&key).await;

        // Removed while the analyzers ran: treat as missing
        if !key.is_dir() {
            debug!(path = %key, "Project directory vanished during analysis");
            return None;
        }

        let context = Arc::new(ProjectContext::from_records(records, self.max_context_bytes));
        self.cache
            .insert(key, CacheEntry::Available(Arc::clone(&context)));
        Some(context)
    }

    /// Run every analyzer off the async scheduler; results keep analyzer order.
    async fn run_analyzers(&self, root: &Utf8PathBuf) -> Vec<AnalysisRecord> {
        let mut tasks = JoinSet::new();
        for (index, analyzer) in self.analyzers.iter().enumerate() {
            let analyzer = Arc::clone(analyzer);
            let root = root.clone();
            tasks.spawn_blocking(move || {
                let outcome = catch_unwind(AssertUnwindSafe(|| analyzer.analyze(&root)));
                (index, outcome)
            });
        }

        let mut slots: Vec<Option<AnalysisRecord>> = self.analyzers.iter().map(|_| None).collect();
        while let Some(joined) = tasks.join_next().await {
            let Ok((index, outcome)) = joined else {
                warn!("Analyzer task was cancelled");
                continue;
            };
            let name = self.analyzers[index].name();
            match outcome {
                Ok(Ok(record)) => slots[index] = Some(record),
                Ok(Err(e)) => {
                    warn!(analyzer = name, error = %e, "Analyzer failed; using empty section");
                }
                Err(_) => {
                    warn!(analyzer = name, error = "panicked", "Analyzer failed; using empty section");
                }
            }
        }

        slots
            .into_iter()
            .zip(&self.analyzers)
            .map(|(slot, analyzer)| slot.unwrap_or_else(|| analyzer.empty_record()))
            .collect()
    }

    /// Drop every cached context.
    pub fn clear_cache(&self) {
        self.cache.clear();
        debug!("Context cache cleared");
    }

    #[must_use]
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Whether the canonical form of `path` has a cache entry
    #[must_use]
    pub fn is_cached(&self, path: &Path) -> bool {
        resolve_project_path(path)
            .canonical()
            .is_some_and(|key| self.cache.contains(key))
    }

    #[must_use]
    pub fn analyzer_count(&self) -> usize {
        self.analyzers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8Path;
    use promptlift_analyzers::TechStack;
    use promptlift_utils::error::AnalyzerError;
    use promptlift_utils::test_support::ProjectFixture;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counting {
        calls: Arc<AtomicUsize>,
        title: &'static str,
    }

    impl Analyzer for Counting {
        fn name(&self) -> &'static str {
            "counting"
        }

        fn analyze(&self, _root: &Utf8Path) -> Result<AnalysisRecord, AnalyzerError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(AnalysisRecord::Custom {
                title: self.title.to_string(),
                body: "found".to_string(),
            })
        }

        fn empty_record(&self) -> AnalysisRecord {
            AnalysisRecord::Custom {
                title: self.title.to_string(),
                body: String::new(),
            }
        }
    }

    struct Failing;

    impl Analyzer for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn analyze(&self, root: &Utf8Path) -> Result<AnalysisRecord, AnalyzerError> {
            Err(AnalyzerError::Command {
                command: "vcs".to_string(),
                reason: format!("no history at {root}"),
            })
        }

        fn empty_record(&self) -> AnalysisRecord {
            AnalysisRecord::TechStack(TechStack::default())
        }
    }

    struct Panicking;

    impl Analyzer for Panicking {
        fn name(&self) -> &'static str {
            "panicking"
        }

        fn analyze(&self, _root: &Utf8Path) -> Result<AnalysisRecord, AnalyzerError> {
            panic!("analyzer bug");
        }

        fn empty_record(&self) -> AnalysisRecord {
            AnalysisRecord::Custom {
                title: "Panicking".to_string(),
                body: String::new(),
            }
        }
    }

    fn counting(title: &'static str) -> (Arc<dyn Analyzer>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let analyzer: Arc<dyn Analyzer> = Arc::new(Counting {
            calls: Arc::clone(&calls),
            title,
        });
        (analyzer, calls)
    }

    #[tokio::test]
    async fn test_second_lookup_is_served_from_cache() {
        let fixture = ProjectFixture::new();
        let (analyzer, calls) = counting("One");
        let aggregator = ContextAggregator::new(vec![analyzer], 4096);

        let first = aggregator.get_context(fixture.path()).await.unwrap();
        let second = aggregator.get_context(fixture.path()).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&first, &second));
        let stats = aggregator.cache_stats();
        assert_eq!((stats.hits, stats.misses, stats.writes), (1, 1, 1));
    }

    #[tokio::test]
    async fn test_equivalent_paths_share_one_entry() {
        let fixture = ProjectFixture::new();
        fixture.dir("sub");
        let (analyzer, calls) = counting("One");
        let aggregator = ContextAggregator::new(vec![analyzer], 4096);

        aggregator.get_context(fixture.path()).await.unwrap();
        let dotted = fixture.path().join("sub").join("..");
        aggregator.get_context(&dotted).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(aggregator.cache_stats().entries, 1);
    }

    #[tokio::test]
    async fn test_missing_path_is_never_cached() {
        let fixture = ProjectFixture::new();
        let missing = fixture.path().join("later");
        let (analyzer, calls) = counting("One");
        let aggregator = ContextAggregator::new(vec![analyzer], 4096);

        assert!(aggregator.get_context(&missing).await.is_none());
        assert!(!aggregator.is_cached(&missing));
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        fixture.dir("later");
        assert!(aggregator.get_context(&missing).await.is_some());
        assert!(aggregator.is_cached(&missing));
    }

    #[tokio::test]
    async fn test_file_path_is_cached_as_unavailable() {
        let fixture = ProjectFixture::new();
        fixture.write("notes.txt", "hi");
        let file = fixture.path().join("notes.txt");
        let (analyzer, calls) = counting("One");
        let aggregator = ContextAggregator::new(vec![analyzer], 4096);

        assert!(aggregator.get_context(&file).await.is_none());
        assert!(aggregator.get_context(&file).await.is_none());

        assert!(aggregator.is_cached(&file));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(aggregator.cache_stats().writes, 1);
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn test_non_utf8_directory_has_no_context() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let fixture = ProjectFixture::new();
        let dir = fixture.path().join(OsStr::from_bytes(b"proj-\xff"));
        std::fs::create_dir(&dir).unwrap();
        let (analyzer, calls) = counting("One");
        let aggregator = ContextAggregator::new(vec![analyzer], 4096);

        assert!(aggregator.get_context(&dir).await.is_none());
        assert!(!aggregator.is_cached(&dir));
        assert_eq!(aggregator.cache_stats().entries, 0);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failures_degrade_to_empty_sections_in_order() {
        let fixture = ProjectFixture::new();
        let (first, _) = counting("First");
        let (last, _) = counting("Last");
        let aggregator = ContextAggregator::new(
            vec![first, Arc::new(Failing), Arc::new(Panicking), last],
            4096,
        );

        let context = aggregator.get_context(fixture.path()).await.unwrap();

        assert!(context.tech_stack.is_empty());
        let titles: Vec<_> = context.extra_sections.iter().map(AnalysisRecord::title).collect();
        assert_eq!(titles, vec!["First", "Panicking", "Last"]);
        assert_eq!(context.summary, "first; last");
        let text = &context.rendered_context_text;
        assert!(text.find("## First").unwrap() < text.find("## Last").unwrap());
    }

    #[tokio::test]
    async fn test_clear_cache_forces_reanalysis() {
        let fixture = ProjectFixture::new();
        let (analyzer, calls) = counting("One");
        let aggregator = ContextAggregator::new(vec![analyzer], 4096);

        let before = aggregator.get_context(fixture.path()).await.unwrap();
        aggregator.clear_cache();
        assert!(!aggregator.is_cached(fixture.path()));
        let after = aggregator.get_context(fixture.path()).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(before, after);
        assert_eq!(aggregator.cache_stats().clears, 1);
    }

    #[tokio::test]
    async fn test_default_analyzers_on_node_project() {
        let fixture = ProjectFixture::new();
        fixture.with_package_json(&["react"]).write("src/index.js", "");
        let aggregator = ContextAggregator::with_defaults();

        let context = aggregator.get_context(fixture.path()).await.unwrap();

        assert!(context.technologies().contains(&"react"));
        assert!(context.rendered_context_text.contains("react"));
        assert!(!context.history.is_repository);
    }
}
