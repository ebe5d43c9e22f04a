use camino::Utf8Path;
use globset::GlobSet;
use promptlift_utils::error::AnalyzerError;
use std::fmt::Write as _;

use crate::walk::{self, WalkEntry, WalkLimits};
use crate::{AnalysisRecord, Analyzer, ProjectStructure};

/// Entries listed per directory before the tree collapses the rest
const MAX_ENTRIES_PER_DIR: usize = 20;

/// Depth explored for totals, independent of the rendered tree depth
const COUNT_DEPTH: usize = 12;

/// Entries visited before totals become a lower bound
const MAX_WALK_ENTRIES: usize = 20_000;

/// Top-level directory names worth calling out
const KEY_DIRECTORIES: &[&str] = &[
    "src", "lib", "app", "apps", "packages", "crates", "cmd", "internal", "pkg", "tests", "test",
    "spec", "docs", "scripts", "config", "public", "components", "pages", "api", "server",
    "client", "web", "frontend", "backend", "migrations",
];

const ENTRY_FILES: &[&str] = &[
    "main.rs",
    "lib.rs",
    "main.py",
    "__main__.py",
    "app.py",
    "manage.py",
    "wsgi.py",
    "index.js",
    "index.ts",
    "index.tsx",
    "main.js",
    "main.ts",
    "server.js",
    "server.ts",
    "app.js",
    "app.ts",
    "main.go",
    "Main.java",
    "Program.cs",
    "index.php",
    "index.html",
];

/// Deepest level (0 = root) at which entry files are recognized
const ENTRY_FILE_MAX_DEPTH: usize = 2;

const CONFIG_FILES: &[&str] = &[
    "Cargo.toml",
    "package.json",
    "tsconfig.json",
    "pyproject.toml",
    "setup.py",
    "setup.cfg",
    "requirements.txt",
    "go.mod",
    "Gemfile",
    "pom.xml",
    "build.gradle",
    "build.gradle.kts",
    "composer.json",
    "Makefile",
    "Dockerfile",
    "docker-compose.yml",
    "docker-compose.yaml",
    "compose.yaml",
    ".gitignore",
    ".editorconfig",
    ".env.example",
];

const CONFIG_EXTENSIONS: &[&str] = &["toml", "yaml", "yml", "ini", "cfg", "conf"];

/// Summarizes the directory layout of a project.
#[derive(Debug, Clone)]
pub struct StructureAnalyzer {
    max_tree_depth: usize,
    ignore: GlobSet,
}

impl StructureAnalyzer {
    /// `max_tree_depth` bounds the rendered tree (1 = top level only).
    #[must_use]
    pub fn new(max_tree_depth: usize, ignore: GlobSet) -> Self {
        Self {
            max_tree_depth,
            ignore,
        }
    }

    fn is_config_file(name: &str) -> bool {
        CONFIG_FILES.contains(&name)
            || name
                .rsplit_once('.')
                .is_some_and(|(stem, ext)| !stem.is_empty() && CONFIG_EXTENSIONS.contains(&ext))
            || (name.ends_with(".config.js") || name.ends_with(".config.ts"))
    }

    fn record_entry(&self, entry: &WalkEntry, out: &mut ProjectStructure) {
        if entry.is_dir {
            out.total_directories += 1;
            if entry.depth == 0 && KEY_DIRECTORIES.contains(&entry.name.as_str()) {
                out.key_directories.push(entry.name.clone());
            }
        } else {
            out.total_files += 1;
            if entry.depth <= ENTRY_FILE_MAX_DEPTH && ENTRY_FILES.contains(&entry.name.as_str()) {
                out.entry_files.push(entry.relative.to_string());
            }
            if entry.depth == 0 && Self::is_config_file(&entry.name) {
                out.config_files.push(entry.name.clone());
            }
        }

        if entry.depth >= self.max_tree_depth {
            return;
        }
        let indent = "  ".repeat(entry.depth);
        if entry.index < MAX_ENTRIES_PER_DIR {
            let suffix = if entry.is_dir { "/" } else { "" };
            let _ = writeln!(out.directory_tree, "{indent}{}{suffix}", entry.name);
        } else if entry.index == MAX_ENTRIES_PER_DIR {
            let _ = writeln!(
                out.directory_tree,
                "{indent}... ({} more)",
                entry.sibling_count - MAX_ENTRIES_PER_DIR
            );
        }
    }
}

impl Analyzer for StructureAnalyzer {
    fn name(&self) -> &'static str {
        "structure"
    }

    fn analyze(&self, root: &Utf8Path) -> Result<AnalysisRecord, AnalyzerError> {
        let mut structure = ProjectStructure::default();
        let limits = WalkLimits {
            max_depth: COUNT_DEPTH.max(self.max_tree_depth),
            max_entries: MAX_WALK_ENTRIES,
        };

        let truncated = walk::walk(root, &self.ignore, limits, &mut |entry| {
            self.record_entry(entry, &mut structure);
        })?;
        structure.truncated = truncated;

        Ok(AnalysisRecord::Structure(structure))
    }

    fn empty_record(&self) -> AnalysisRecord {
        AnalysisRecord::Structure(ProjectStructure::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::walk::build_ignore_set;
    use promptlift_utils::test_support::ProjectFixture;

    fn analyze(fixture: &ProjectFixture, depth: usize, ignore: &[String]) -> ProjectStructure {
        let analyzer = StructureAnalyzer::new(depth, build_ignore_set(ignore).unwrap());
        match analyzer.analyze(fixture.root()).unwrap() {
            AnalysisRecord::Structure(s) => s,
            other => panic!("unexpected record: {other:?}"),
        }
    }

    #[test]
    fn test_structure_collects_key_dirs_entries_and_configs() {
        let fixture = ProjectFixture::new();
        fixture
            .with_cargo_toml(&["serde"])
            .write("src/main.rs", "fn main() {}")
            .write("src/util/mod.rs", "")
            .write("tests/it.rs", "")
            .write("README.md", "# x");

        let s = analyze(&fixture, 3, &[]);

        assert_eq!(s.key_directories, vec!["src", "tests"]);
        assert_eq!(s.entry_files, vec!["src/main.rs"]);
        assert_eq!(s.config_files, vec!["Cargo.toml"]);
        assert_eq!(s.total_directories, 3);
        assert_eq!(s.total_files, 5);
        assert!(!s.truncated);
    }

    #[test]
    fn test_tree_is_indented_and_depth_bounded() {
        let fixture = ProjectFixture::new();
        fixture.write("src/deep/nested/file.rs", "").write("a.txt", "");

        let s = analyze(&fixture, 2, &[]);

        assert_eq!(s.directory_tree, "src/\n  deep/\na.txt\n");
        // Totals still see below the rendered depth
        assert_eq!(s.total_files, 2);
        assert_eq!(s.total_directories, 3);
    }

    #[test]
    fn test_tree_collapses_wide_directories() {
        let fixture = ProjectFixture::new();
        for i in 0..25 {
            fixture.write(&format!("f{i:02}.txt"), "");
        }

        let s = analyze(&fixture, 1, &[]);

        assert_eq!(s.directory_tree.lines().count(), MAX_ENTRIES_PER_DIR + 1);
        assert!(s.directory_tree.ends_with("... (5 more)\n"));
        assert_eq!(s.total_files, 25);
    }

    #[test]
    fn test_ignore_patterns_exclude_from_counts() {
        let fixture = ProjectFixture::new();
        fixture.write("fixtures/a.json", "").write("src/lib.rs", "");

        let s = analyze(&fixture, 3, &["fixtures/**".to_string()]);

        assert_eq!(s.total_files, 1);
        assert!(!s.directory_tree.contains("fixtures"));
    }

    #[test]
    fn test_empty_directory_yields_empty_record() {
        let fixture = ProjectFixture::new();
        let analyzer = StructureAnalyzer::new(3, build_ignore_set(&[]).unwrap());
        let record = analyzer.analyze(fixture.root()).unwrap();
        assert!(record.is_empty());
    }
}
