//! Project analyzers for promptlift
//!
//! Each analyzer takes a project root and returns one [`AnalysisRecord`].
//! Analyzers are stateless, read-only and independent of each other, so the
//! context aggregator can run any ordered list of them concurrently.

mod history;
mod record;
mod structure;
mod tech_stack;
pub mod walk;

use camino::Utf8Path;
use globset::GlobSet;
use promptlift_config::Config;
use promptlift_utils::error::{AnalyzerError, ConfigError};
use std::sync::Arc;

pub use history::HistoryAnalyzer;
pub use record::{AnalysisRecord, Commit, ProjectHistory, ProjectStructure, TechStack};
pub use structure::StructureAnalyzer;
pub use tech_stack::TechStackAnalyzer;

/// A single source of project information.
///
/// Implementations must not write to the project. They may block (filesystem
/// or subprocess I/O); callers run them off the async scheduler.
pub trait Analyzer: Send + Sync {
    /// Stable name used in logs
    fn name(&self) -> &'static str;

    /// Analyze the project rooted at `root`.
    ///
    /// # Errors
    ///
    /// Returns `AnalyzerError` when the analysis cannot complete; callers
    /// substitute [`Analyzer::empty_record`].
    fn analyze(&self, root: &Utf8Path) -> Result<AnalysisRecord, AnalyzerError>;

    /// Record contributed when `analyze` fails
    fn empty_record(&self) -> AnalysisRecord;
}

/// Bounds applied by the built-in analyzers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyzerLimits {
    pub max_tree_depth: usize,
    pub max_recent_commits: usize,
    /// Extra glob patterns excluded from project walks
    pub ignore: Vec<String>,
}

impl Default for AnalyzerLimits {
    fn default() -> Self {
        Self {
            max_tree_depth: promptlift_config::DEFAULT_MAX_TREE_DEPTH,
            max_recent_commits: promptlift_config::DEFAULT_MAX_RECENT_COMMITS,
            ignore: Vec::new(),
        }
    }
}

impl AnalyzerLimits {
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_tree_depth: config.max_tree_depth(),
            max_recent_commits: config.max_recent_commits(),
            ignore: config.ignore_patterns().to_vec(),
        }
    }
}

/// The built-in analyzers in rendering order: tech stack, structure, history.
///
/// # Errors
///
/// Returns `ConfigError::InvalidValue` if an ignore pattern is not a valid glob.
pub fn default_analyzers(limits: &AnalyzerLimits) -> Result<Vec<Arc<dyn Analyzer>>, ConfigError> {
    let ignore = walk::build_ignore_set(&limits.ignore)?;
    Ok(builtin_analyzers(limits, ignore))
}

/// Like [`default_analyzers`], with an already compiled ignore set.
///
/// `limits.ignore` is not consulted.
#[must_use]
pub fn builtin_analyzers(limits: &AnalyzerLimits, ignore: GlobSet) -> Vec<Arc<dyn Analyzer>> {
    vec![
        Arc::new(TechStackAnalyzer::new(ignore.clone())),
        Arc::new(StructureAnalyzer::new(limits.max_tree_depth, ignore)),
        Arc::new(HistoryAnalyzer::new(limits.max_recent_commits)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use promptlift_utils::test_support::ProjectFixture;

    #[test]
    fn test_default_analyzers_order() {
        let analyzers = default_analyzers(&AnalyzerLimits::default()).unwrap();
        let names: Vec<_> = analyzers.iter().map(|a| a.name()).collect();
        assert_eq!(names, vec!["tech_stack", "structure", "history"]);
    }

    #[test]
    fn test_builtin_analyzers_with_empty_ignore_set() {
        let analyzers = builtin_analyzers(&AnalyzerLimits::default(), GlobSet::empty());
        assert_eq!(analyzers.len(), 3);
    }

    #[test]
    fn test_invalid_ignore_pattern_is_rejected() {
        let limits = AnalyzerLimits {
            ignore: vec!["{unclosed".to_string()],
            ..AnalyzerLimits::default()
        };
        assert!(default_analyzers(&limits).is_err());
    }

    #[test]
    fn test_limits_from_config() {
        let config = Config::builder()
            .max_tree_depth(5)
            .max_recent_commits(3)
            .ignore("fixtures/**")
            .build()
            .unwrap();
        let limits = AnalyzerLimits::from_config(&config);
        assert_eq!(limits.max_tree_depth, 5);
        assert_eq!(limits.max_recent_commits, 3);
        assert_eq!(limits.ignore, vec!["fixtures/**"]);
    }

    #[test]
    fn test_all_analyzers_accept_an_empty_directory() -> anyhow::Result<()> {
        let fixture = ProjectFixture::new();
        for analyzer in default_analyzers(&AnalyzerLimits::default())? {
            let record = analyzer.analyze(fixture.root())?;
            assert!(record.is_empty(), "{} produced {record:?}", analyzer.name());
        }
        Ok(())
    }
}
