//! Plain records produced by analyzers

use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use std::fmt::Write as _;

/// Technologies detected in a project, each list ordered by first detection
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TechStack {
    pub languages: Vec<String>,
    pub frameworks: Vec<String>,
    pub databases: Vec<String>,
    pub tools: Vec<String>,
}

impl TechStack {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.languages.is_empty()
            && self.frameworks.is_empty()
            && self.databases.is_empty()
            && self.tools.is_empty()
    }

    /// Every detected technology, languages first.
    pub fn all(&self) -> impl Iterator<Item = &str> {
        self.languages
            .iter()
            .chain(&self.frameworks)
            .chain(&self.databases)
            .chain(&self.tools)
            .map(String::as_str)
    }
}

/// Shape of the project's file tree
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProjectStructure {
    /// Indented listing, bounded by depth and entries per directory
    pub directory_tree: String,
    pub key_directories: Vec<String>,
    pub entry_files: Vec<String>,
    pub config_files: Vec<String>,
    pub total_files: usize,
    pub total_directories: usize,
    /// The walk stopped early; totals are lower bounds
    pub truncated: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Commit {
    pub hash: String,
    pub author: String,
    pub message: String,
    pub date: Option<DateTime<FixedOffset>>,
}

/// Version-control history; `is_repository = false` leaves everything else empty
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProjectHistory {
    pub is_repository: bool,
    pub current_branch: Option<String>,
    pub total_commits: usize,
    pub recent_commits: Vec<Commit>,
    /// Ordered by commit count, most active first
    pub contributors: Vec<String>,
}

/// Output of one analyzer.
///
/// Each record knows how to render itself, so the aggregator can merge any
/// ordered list of analyzers without knowing their concrete types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnalysisRecord {
    TechStack(TechStack),
    Structure(ProjectStructure),
    History(ProjectHistory),
    Custom { title: String, body: String },
}

impl AnalysisRecord {
    #[must_use]
    pub fn title(&self) -> &str {
        match self {
            Self::TechStack(_) => "Tech Stack",
            Self::Structure(_) => "Project Structure",
            Self::History(_) => "Recent History",
            Self::Custom { title, .. } => title,
        }
    }

    /// True when the record carries nothing worth rendering
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::TechStack(stack) => stack.is_empty(),
            Self::Structure(s) => s.total_files == 0 && s.total_directories == 0,
            Self::History(h) => !h.is_repository,
            Self::Custom { body, .. } => body.trim().is_empty(),
        }
    }

    /// Markdown section (`## Title` plus body), or `None` for empty records
    #[must_use]
    pub fn render_section(&self) -> Option<String> {
        if self.is_empty() {
            return None;
        }

        let mut out = format!("## {}\n", self.title());
        match self {
            Self::TechStack(stack) => {
                for (label, items) in [
                    ("Languages", &stack.languages),
                    ("Frameworks", &stack.frameworks),
                    ("Databases", &stack.databases),
                    ("Tools", &stack.tools),
                ] {
                    if !items.is_empty() {
                        let _ = writeln!(out, "- {label}: {}", items.join(", "));
                    }
                }
            }
            Self::Structure(s) => {
                let _ = writeln!(
                    out,
                    "- Files: {}, directories: {}{}",
                    s.total_files,
                    s.total_directories,
                    if s.truncated { " (partial count)" } else { "" }
                );
                for (label, items) in [
                    ("Key directories", &s.key_directories),
                    ("Entry points", &s.entry_files),
                    ("Config files", &s.config_files),
                ] {
                    if !items.is_empty() {
                        let _ = writeln!(out, "- {label}: {}", items.join(", "));
                    }
                }
                if !s.directory_tree.is_empty() {
                    out.push_str("\n```\n");
                    out.push_str(&s.directory_tree);
                    if !s.directory_tree.ends_with('\n') {
                        out.push('\n');
                    }
                    out.push_str("```\n");
                }
            }
            Self::History(h) => {
                let _ = writeln!(
                    out,
                    "- Branch: {} ({} commits)",
                    h.current_branch.as_deref().unwrap_or("detached"),
                    h.total_commits
                );
                if !h.contributors.is_empty() {
                    let _ = writeln!(out, "- Contributors: {}", h.contributors.join(", "));
                }
                if !h.recent_commits.is_empty() {
                    out.push_str("- Recent commits:\n");
                    for commit in &h.recent_commits {
                        let date = commit
                            .date
                            .map(|d| d.format("%Y-%m-%d").to_string())
                            .unwrap_or_else(|| "unknown date".to_string());
                        let _ = writeln!(
                            out,
                            "  - {} {} {} ({})",
                            commit.hash, date, commit.message, commit.author
                        );
                    }
                }
            }
            Self::Custom { body, .. } => {
                out.push_str(body.trim_end());
                out.push('\n');
            }
        }
        Some(out)
    }

    /// Short phrase for the one-line context summary
    #[must_use]
    pub fn summary_fragment(&self) -> Option<String> {
        if self.is_empty() {
            return None;
        }
        match self {
            Self::TechStack(stack) => {
                let all: Vec<&str> = stack.all().collect();
                let shown = all.iter().take(5).copied().collect::<Vec<_>>().join(", ");
                let more = if all.len() > 5 { ", ..." } else { "" };
                Some(format!("{} technologies: {shown}{more}", all.len()))
            }
            Self::Structure(s) => Some(format!(
                "{} files in {} directories",
                s.total_files, s.total_directories
            )),
            Self::History(h) => Some(format!(
                "git branch {} with {} commits",
                h.current_branch.as_deref().unwrap_or("detached"),
                h.total_commits
            )),
            Self::Custom { title, .. } => Some(title.to_lowercase()),
        }
    }
}
