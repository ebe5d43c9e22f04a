use camino::Utf8Path;
use chrono::DateTime;
use promptlift_utils::error::AnalyzerError;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::debug;

use crate::{AnalysisRecord, Analyzer, Commit, ProjectHistory};

/// Field separator for `git log --format`
const FIELD_SEP: char = '\u{1f}';

/// Contributors listed at most
const MAX_CONTRIBUTORS: usize = 10;

/// Reads branch, commit and contributor history through the `git` binary.
///
/// Only read-only plumbing is invoked, with optional locks disabled, so the
/// repository's index is never rewritten.
#[derive(Debug, Clone)]
pub struct HistoryAnalyzer {
    max_recent_commits: usize,
    git: Option<PathBuf>,
}

impl HistoryAnalyzer {
    /// Locate `git` on `PATH`. A missing binary makes every project "not a repository".
    #[must_use]
    pub fn new(max_recent_commits: usize) -> Self {
        let git = which::which("git").ok();
        if git.is_none() {
            debug!("git not found on PATH; history analysis disabled");
        }
        Self {
            max_recent_commits,
            git,
        }
    }

    /// Use an explicit `git` binary, or none at all.
    #[must_use]
    pub fn with_git(max_recent_commits: usize, git: Option<PathBuf>) -> Self {
        Self {
            max_recent_commits,
            git,
        }
    }

    fn git(&self, git: &Path, root: &Utf8Path, args: &[&str]) -> Result<String, AnalyzerError> {
        let command = format!("git {}", args.join(" "));
        let output = Command::new(git)
            .arg("-C")
            .arg(root.as_str())
            .args(args)
            .env("GIT_OPTIONAL_LOCKS", "0")
            .env("GIT_TERMINAL_PROMPT", "0")
            .env("LC_ALL", "C")
            .stdin(Stdio::null())
            .output()
            .map_err(|e| AnalyzerError::Command {
                command: command.clone(),
                reason: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(AnalyzerError::Command {
                command,
                reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn recent_commits(&self, git: &Path, root: &Utf8Path) -> Result<Vec<Commit>, AnalyzerError> {
        let limit = format!("-n{}", self.max_recent_commits);
        let format = format!("--format=%h{FIELD_SEP}%an{FIELD_SEP}%aI{FIELD_SEP}%s");
        let raw = self.git(git, root, &["log", &limit, &format])?;
        Ok(raw.lines().filter_map(parse_commit_line).collect())
    }

    fn contributors(&self, git: &Path, root: &Utf8Path) -> Result<Vec<String>, AnalyzerError> {
        let raw = self.git(git, root, &["shortlog", "-sn", "HEAD"])?;
        Ok(raw
            .lines()
            .filter_map(|line| line.split_once('\t').map(|(_, name)| name.trim().to_string()))
            .filter(|name| !name.is_empty())
            .take(MAX_CONTRIBUTORS)
            .collect())
    }
}

fn parse_commit_line(line: &str) -> Option<Commit> {
    let mut fields = line.splitn(4, FIELD_SEP);
    let hash = fields.next()?.trim();
    if hash.is_empty() {
        return None;
    }
    let author = fields.next()?.to_string();
    let date = fields
        .next()
        .and_then(|d| DateTime::parse_from_rfc3339(d.trim()).ok());
    let message = fields.next().unwrap_or_default().trim().to_string();
    Some(Commit {
        hash: hash.to_string(),
        author,
        message,
        date,
    })
}

impl Analyzer for HistoryAnalyzer {
    fn name(&self) -> &'static str {
        "history"
    }

    fn analyze(&self, root: &Utf8Path) -> Result<AnalysisRecord, AnalyzerError> {
        if !root.is_dir() {
            return Err(AnalyzerError::NotADirectory(root.to_string()));
        }
        let Some(git) = &self.git else {
            return Ok(self.empty_record());
        };

        let inside = self
            .git(git, root, &["rev-parse", "--is-inside-work-tree"])
            .map(|out| out.trim() == "true")
            .unwrap_or(false);
        if !inside {
            return Ok(self.empty_record());
        }

        let mut history = ProjectHistory {
            is_repository: true,
            // Works before the first commit, unlike `rev-parse --abbrev-ref`
            current_branch: self
                .git(git, root, &["symbolic-ref", "--short", "-q", "HEAD"])
                .ok()
                .map(|b| b.trim().to_string())
                .filter(|b| !b.is_empty()),
            ..ProjectHistory::default()
        };

        // No commits yet: rev-list fails on an unborn HEAD
        let Ok(count) = self.git(git, root, &["rev-list", "--count", "HEAD"]) else {
            return Ok(AnalysisRecord::History(history));
        };
        history.total_commits = count.trim().parse().map_err(|e| AnalyzerError::Parse {
            file: "git rev-list --count HEAD".to_string(),
            reason: format!("{e}"),
        })?;

        if self.max_recent_commits > 0 {
            history.recent_commits = self.recent_commits(git, root)?;
        }
        history.contributors = self.contributors(git, root)?;

        Ok(AnalysisRecord::History(history))
    }

    fn empty_record(&self) -> AnalysisRecord {
        AnalysisRecord::History(ProjectHistory::default())
    }
}
