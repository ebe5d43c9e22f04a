//! Bounded, read-only directory walk shared by the file-based analyzers

use camino::{Utf8Path, Utf8PathBuf};
use globset::{Glob, GlobSet, GlobSetBuilder};
use promptlift_utils::error::{AnalyzerError, ConfigError};
use std::fs;
use tracing::debug;

/// Directory names never descended into
pub const DEFAULT_IGNORED_DIRS: &[&str] = &[
    ".git",
    ".hg",
    ".svn",
    "node_modules",
    "target",
    "dist",
    "build",
    "__pycache__",
    ".venv",
    "venv",
    "vendor",
    ".idea",
    ".next",
    ".mypy_cache",
    ".pytest_cache",
    ".tox",
    "coverage",
];

/// Compile user ignore globs.
///
/// A pattern ending in `/**` also ignores the directory itself.
///
/// # Errors
///
/// Returns `ConfigError::InvalidValue` for a malformed pattern.
pub fn build_ignore_set(patterns: &[String]) -> Result<GlobSet, ConfigError> {
    let invalid = |pattern: &str, e: globset::Error| ConfigError::InvalidValue {
        key: "context.ignore".to_string(),
        value: format!("Invalid glob pattern '{pattern}': {e}"),
    };

    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern).map_err(|e| invalid(pattern, e))?);
        if let Some(dir) = pattern.strip_suffix("/**")
            && !dir.is_empty()
        {
            builder.add(Glob::new(dir).map_err(|e| invalid(pattern, e))?);
        }
    }
    builder.build().map_err(|e| ConfigError::InvalidValue {
        key: "context.ignore".to_string(),
        value: e.to_string(),
    })
}

/// One visited entry
#[derive(Debug, Clone)]
pub struct WalkEntry {
    /// Path relative to the walk root, `/`-separated
    pub relative: Utf8PathBuf,
    pub name: String,
    /// 0 for direct children of the root
    pub depth: usize,
    pub is_dir: bool,
    /// Position among the (sorted, non-ignored) siblings
    pub index: usize,
    pub sibling_count: usize,
}

/// Limits for one walk
#[derive(Debug, Clone, Copy)]
pub struct WalkLimits {
    /// Deepest level visited (0 = only the root's children)
    pub max_depth: usize,
    /// Total entries visited before the walk stops
    pub max_entries: usize,
}

/// Depth-first walk in name order (directories before files).
///
/// Symlinks are reported as files and never followed. Unreadable
/// subdirectories are skipped. Returns `true` if `max_entries` cut the walk short.
///
/// # Errors
///
/// Returns `AnalyzerError::NotADirectory` if `root` is not a directory and
/// `AnalyzerError::Io` if the root itself cannot be read.
pub fn walk(
    root: &Utf8Path,
    ignore: &GlobSet,
    limits: WalkLimits,
    visit: &mut dyn FnMut(&WalkEntry),
) -> Result<bool, AnalyzerError> {
    if !root.is_dir() {
        return Err(AnalyzerError::NotADirectory(root.to_string()));
    }
    let children = read_sorted(root, Utf8Path::new(""), ignore).map_err(|source| {
        AnalyzerError::Io {
            path: root.to_string(),
            source,
        }
    })?;

    let mut visited = 0usize;
    Ok(walk_children(
        root,
        Utf8Path::new(""),
        children,
        0,
        ignore,
        limits,
        &mut visited,
        visit,
    ))
}

#[allow(clippy::too_many_arguments)]
fn walk_children(
    root: &Utf8Path,
    parent_rel: &Utf8Path,
    children: Vec<(String, bool)>,
    depth: usize,
    ignore: &GlobSet,
    limits: WalkLimits,
    visited: &mut usize,
    visit: &mut dyn FnMut(&WalkEntry),
) -> bool {
    let sibling_count = children.len();
    for (index, (name, is_dir)) in children.into_iter().enumerate() {
        if *visited >= limits.max_entries {
            return true;
        }
        *visited += 1;

        let relative = parent_rel.join(&name);
        let entry = WalkEntry {
            relative,
            name,
            depth,
            is_dir,
            index,
            sibling_count,
        };
        visit(&entry);

        if entry.is_dir && depth < limits.max_depth {
            match read_sorted(&root.join(&entry.relative), &entry.relative, ignore) {
                Ok(grandchildren) => {
                    if walk_children(
                        root,
                        &entry.relative,
                        grandchildren,
                        depth + 1,
                        ignore,
                        limits,
                        visited,
                        visit,
                    ) {
                        return true;
                    }
                }
                Err(e) => debug!(path = %entry.relative, error = %e, "Skipping unreadable directory"),
            }
        }
    }
    false
}

/// Non-ignored children of `dir` as `(name, is_dir)`, directories first, then by name
fn read_sorted(
    dir: &Utf8Path,
    dir_rel: &Utf8Path,
    ignore: &GlobSet,
) -> std::io::Result<Vec<(String, bool)>> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);

        if is_dir && DEFAULT_IGNORED_DIRS.contains(&name.as_str()) {
            continue;
        }
        if ignore.is_match(dir_rel.join(&name).as_str()) {
            continue;
        }
        entries.push((name, is_dir));
    }
    entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    Ok(entries)
}
