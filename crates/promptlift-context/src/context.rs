use promptlift_analyzers::{AnalysisRecord, ProjectHistory, ProjectStructure, TechStack};
use serde::Serialize;

use crate::render::{build_summary, render_context};

/// Merged, immutable summary of one project.
///
/// Built once per canonical path and shared behind an `Arc` until the owning
/// cache is cleared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectContext {
    pub summary: String,
    pub tech_stack: TechStack,
    pub structure: ProjectStructure,
    pub history: ProjectHistory,
    /// Records beyond the first of each built-in kind, in analyzer order
    pub extra_sections: Vec<AnalysisRecord>,
    /// Markdown block prepended to the outbound prompt
    pub rendered_context_text: String,
}

impl ProjectContext {
    /// Merge analyzer output, in analyzer order, into a context whose
    /// rendered text fits in `max_context_bytes`.
    #[must_use]
    pub fn from_records(records: Vec<AnalysisRecord>, max_context_bytes: usize) -> Self {
        let summary = build_summary(&records);
        let rendered_context_text = render_context(&summary, &records, max_context_bytes);

        let mut tech_stack = None;
        let mut structure = None;
        let mut history = None;
        let mut extra_sections = Vec::new();
        for record in records {
            match record {
                AnalysisRecord::TechStack(t) if tech_stack.is_none() => tech_stack = Some(t),
                AnalysisRecord::Structure(s) if structure.is_none() => structure = Some(s),
                AnalysisRecord::History(h) if history.is_none() => history = Some(h),
                other => extra_sections.push(other),
            }
        }

        Self {
            summary,
            tech_stack: tech_stack.unwrap_or_default(),
            structure: structure.unwrap_or_default(),
            history: history.unwrap_or_default(),
            extra_sections,
            rendered_context_text,
        }
    }

    /// Every detected technology as one ordered list
    #[must_use]
    pub fn technologies(&self) -> Vec<&str> {
        self.tech_stack.all().collect()
    }

    /// True when no analyzer contributed anything
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tech_stack.is_empty()
            && self.structure.total_files == 0
            && self.structure.total_directories == 0
            && !self.history.is_repository
            && self.extra_sections.iter().all(AnalysisRecord::is_empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::EMPTY_SUMMARY;

    #[test]
    fn test_from_records_splits_known_kinds() {
        let records = vec![
            AnalysisRecord::TechStack(TechStack {
                frameworks: vec!["react".to_string()],
                ..TechStack::default()
            }),
            AnalysisRecord::History(ProjectHistory {
                is_repository: true,
                current_branch: Some("main".to_string()),
                total_commits: 2,
                ..ProjectHistory::default()
            }),
            AnalysisRecord::Custom {
                title: "Ownership".to_string(),
                body: "team-a".to_string(),
            },
        ];

        let context = ProjectContext::from_records(records, 4096);

        assert_eq!(context.technologies(), vec!["react"]);
        assert_eq!(context.history.current_branch.as_deref(), Some("main"));
        assert_eq!(context.structure, ProjectStructure::default());
        assert_eq!(context.extra_sections.len(), 1);
        assert_eq!(
            context.summary,
            "1 technologies: react; git branch main with 2 commits; ownership"
        );
        assert!(context.rendered_context_text.contains("react"));
        assert!(!context.is_empty());
    }

    #[test]
    fn test_empty_analysis_is_still_a_context() {
        let context = ProjectContext::from_records(
            vec![
                AnalysisRecord::TechStack(TechStack::default()),
                AnalysisRecord::History(ProjectHistory::default()),
            ],
            4096,
        );
        assert!(context.is_empty());
        assert_eq!(context.summary, EMPTY_SUMMARY);
        assert!(context.rendered_context_text.contains(EMPTY_SUMMARY));
    }
}
