//! Path resolution helpers shared by the context and config crates.

use camino::Utf8PathBuf;
use std::path::Path;

/// Outcome of resolving a caller-supplied project path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectPath {
    /// Canonical, symlink-resolved, absolute directory.
    Directory(Utf8PathBuf),
    /// The path exists but is not a directory (canonical form attached).
    NotADirectory(Utf8PathBuf),
    /// The path exists but its canonical form is not valid UTF-8.
    NonUtf8,
    /// Nothing exists at the path.
    Missing,
}

impl ProjectPath {
    /// Canonical key, when the path exists and is representable.
    #[must_use]
    pub fn canonical(&self) -> Option<&Utf8PathBuf> {
        match self {
            Self::Directory(p) | Self::NotADirectory(p) => Some(p),
            Self::NonUtf8 | Self::Missing => None,
        }
    }
}

/// Resolve `path` to one normalized absolute form.
///
/// `./foo`, `/abs/foo` and a symlink pointing at `/abs/foo` all resolve to the
/// same key. Uses `dunce` so Windows paths stay free of the `\\?\` prefix.
/// Existence is checked once, here; callers treat it as best-effort since the
/// filesystem can change before they act on it.
#[must_use]
pub fn resolve_project_path(path: &Path) -> ProjectPath {
    let canonical = match dunce::canonicalize(path) {
        Ok(p) => p,
        Err(_) => return ProjectPath::Missing,
    };

    let is_dir = canonical.is_dir();
    match Utf8PathBuf::from_path_buf(canonical) {
        Ok(utf8) if is_dir => ProjectPath::Directory(utf8),
        Ok(utf8) => ProjectPath::NotADirectory(utf8),
        Err(_) => ProjectPath::NonUtf8,
    }
}

/// Whether `dir` is the root of a version-controlled checkout.
#[must_use]
pub fn is_vcs_root(dir: &Path) -> bool {
    dir.join(".git").exists() || dir.join(".hg").exists() || dir.join(".svn").exists()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_path() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("does-not-exist");
        assert_eq!(resolve_project_path(&missing), ProjectPath::Missing);
        assert!(resolve_project_path(&missing).canonical().is_none());
    }

    #[test]
    fn test_directory_is_canonical_and_absolute() {
        let temp = TempDir::new().unwrap();
        let nested = temp.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();

        let dotted = nested.join("..").join("b").join(".");
        let resolved = resolve_project_path(&dotted);
        let direct = resolve_project_path(&nested);

        assert_eq!(resolved, direct);
        match resolved {
            ProjectPath::Directory(p) => {
                assert!(p.is_absolute());
                assert!(!p.as_str().contains(".."));
            }
            other => panic!("expected directory, got {other:?}"),
        }
    }

    #[test]
    fn test_file_is_not_a_directory() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("notes.txt");
        std::fs::write(&file, "hi").unwrap();
        assert!(matches!(
            resolve_project_path(&file),
            ProjectPath::NotADirectory(_)
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_resolves_to_target() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("real");
        std::fs::create_dir(&target).unwrap();
        let link = temp.path().join("link");
        std::os::unix::fs::symlink(&target, &link).unwrap();

        assert_eq!(resolve_project_path(&link), resolve_project_path(&target));
    }

    #[test]
    fn test_vcs_root_detection() {
        let temp = TempDir::new().unwrap();
        assert!(!is_vcs_root(temp.path()));
        std::fs::create_dir(temp.path().join(".git")).unwrap();
        assert!(is_vcs_root(temp.path()));
    }
}
