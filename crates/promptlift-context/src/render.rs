//! Rendering of the context block prepended to outbound prompts

use promptlift_analyzers::AnalysisRecord;
use std::fmt::Write as _;

pub const CONTEXT_HEADER: &str = "# Project Context\n\n";

/// Ends the context block; the original prompt follows it
pub const CONTEXT_SEPARATOR: &str = "---\n\n";

pub const TRUNCATION_MARKER: &str = "... (truncated)\n";

/// Summary used when no analyzer found anything
pub const EMPTY_SUMMARY: &str = "No project details detected";

const FENCE: &str = "```";

/// One-line summary built from each record's fragment, in analyzer order.
#[must_use]
pub fn build_summary(records: &[AnalysisRecord]) -> String {
    let fragments: Vec<String> = records
        .iter()
        .filter_map(AnalysisRecord::summary_fragment)
        .collect();
    if fragments.is_empty() {
        EMPTY_SUMMARY.to_string()
    } else {
        fragments.join("; ")
    }
}

/// Render the context block within `max_bytes`.
///
/// The header, summary and separator are always present. Sections are added
/// in order while they fit; the first one that does not is cut on a line
/// boundary and marked, and every later section is dropped. The result stays
/// within `max_bytes` unless the header and summary alone exceed it.
#[must_use]
pub fn render_context(summary: &str, records: &[AnalysisRecord], max_bytes: usize) -> String {
    let mut out = String::from(CONTEXT_HEADER);
    let _ = writeln!(out, "Summary: {summary}\n");

    let mut remaining = max_bytes.saturating_sub(out.len() + CONTEXT_SEPARATOR.len());
    for section in records.iter().filter_map(AnalysisRecord::render_section) {
        let block_len = section.len() + 1;
        if block_len <= remaining {
            out.push_str(&section);
            out.push('\n');
            remaining -= block_len;
            continue;
        }
        out.push_str(&truncate_section(&section, remaining));
        break;
    }

    out.push_str(CONTEXT_SEPARATOR);
    out
}

/// Whole lines of `section` that fit in `budget`, followed by the marker.
///
/// Returns an empty string when not even the marker fits. An open code fence
/// is closed so the prompt that follows is not swallowed by it.
fn truncate_section(section: &str, budget: usize) -> String {
    let reserve = TRUNCATION_MARKER.len() + FENCE.len() + 1;
    if budget < reserve {
        return String::new();
    }

    let mut kept = String::new();
    let mut in_fence = false;
    for line in section.split_inclusive('\n') {
        if kept.len() + line.len() + reserve > budget {
            break;
        }
        if line.starts_with(FENCE) {
            in_fence = !in_fence;
        }
        kept.push_str(line);
    }

    if in_fence {
        kept.push_str(FENCE);
        kept.push('\n');
    }
    kept.push_str(TRUNCATION_MARKER);
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use promptlift_analyzers::{ProjectStructure, TechStack};

    fn stack(frameworks: &[&str]) -> AnalysisRecord {
        AnalysisRecord::TechStack(TechStack {
            languages: vec!["JavaScript".to_string()],
            frameworks: frameworks.iter().map(|s| (*s).to_string()).collect(),
            ..TechStack::default()
        })
    }

    fn custom(title: &str, lines: usize) -> AnalysisRecord {
        AnalysisRecord::Custom {
            title: title.to_string(),
            body: (0..lines).map(|i| format!("line {i}\n")).collect(),
        }
    }

    #[test]
    fn test_summary_joins_fragments() {
        let records = vec![
            stack(&["react"]),
            AnalysisRecord::Structure(ProjectStructure {
                total_files: 4,
                total_directories: 2,
                ..ProjectStructure::default()
            }),
        ];
        assert_eq!(
            build_summary(&records),
            "2 technologies: JavaScript, react; 4 files in 2 directories"
        );
    }

    #[test]
    fn test_empty_summary() {
        let records = vec![AnalysisRecord::TechStack(TechStack::default())];
        assert_eq!(build_summary(&records), EMPTY_SUMMARY);
    }

    #[test]
    fn test_render_includes_all_sections_within_budget() {
        let records = vec![stack(&["react"]), custom("Notes", 2)];
        let text = render_context("s", &records, 16 * 1024);

        assert!(text.starts_with(CONTEXT_HEADER));
        assert!(text.contains("Summary: s\n"));
        assert!(text.contains("## Tech Stack\n- Languages: JavaScript\n- Frameworks: react\n"));
        assert!(text.contains("## Notes\nline 0\nline 1\n"));
        assert!(text.ends_with(CONTEXT_SEPARATOR));
        assert!(!text.contains(TRUNCATION_MARKER));
    }

    #[test]
    fn test_render_truncates_and_drops_later_sections() {
        let records = vec![custom("Big", 200), custom("Later", 1)];
        let text = render_context("s", &records, 512);

        assert!(text.len() <= 512, "len {}", text.len());
        assert!(text.contains("## Big\nline 0\n"));
        assert!(text.contains(TRUNCATION_MARKER));
        assert!(!text.contains("## Later"));
        assert!(text.ends_with(CONTEXT_SEPARATOR));
    }

    #[test]
    fn test_truncation_is_utf8_safe_and_closes_fences() {
        let tree: String = (0..100).map(|i| format!("répertoire-{i}/\n")).collect();
        let records = vec![AnalysisRecord::Structure(ProjectStructure {
            directory_tree: tree,
            total_directories: 100,
            ..ProjectStructure::default()
        })];

        let text = render_context("s", &records, 400);

        assert!(text.len() <= 400);
        assert_eq!(text.matches(FENCE).count() % 2, 0);
        assert!(text.contains(TRUNCATION_MARKER));
    }

    #[test]
    fn test_summary_survives_tiny_budget() {
        let text = render_context("summary here", &[custom("Big", 50)], 10);
        assert!(text.contains("Summary: summary here"));
        assert!(!text.contains("## Big"));
    }
}
