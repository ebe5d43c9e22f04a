//! Test fixtures shared across the workspace; not part of public API stability guarantees.

use camino::{Utf8Path, Utf8PathBuf};
use std::process::Command;

/// Temporary project directory with helpers for seeding manifests and files.
///
/// The directory is removed when the fixture is dropped.
pub struct ProjectFixture {
    inner: tempfile::TempDir,
    root: Utf8PathBuf,
}

impl ProjectFixture {
    /// Create an empty project directory.
    ///
    /// # Panics
    ///
    /// Panics if the temp directory cannot be created or is not UTF-8.
    #[must_use]
    pub fn new() -> Self {
        let inner = tempfile::TempDir::new().expect("create temp project");
        let root = Utf8PathBuf::from_path_buf(inner.path().to_path_buf())
            .expect("temp dir path is UTF-8");
        Self { inner, root }
    }

    /// Project root (not canonicalized).
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Underlying temp dir, for APIs that want a `std::path::Path`.
    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        self.inner.path()
    }

    /// Write `content` to `relative`, creating parent directories.
    ///
    /// # Panics
    ///
    /// Panics on I/O failure.
    pub fn write(&self, relative: &str, content: &str) -> &Self {
        let path = self.root.join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent dirs");
        }
        std::fs::write(&path, content).expect("write fixture file");
        self
    }

    /// Create an empty directory at `relative`.
    ///
    /// # Panics
    ///
    /// Panics on I/O failure.
    pub fn dir(&self, relative: &str) -> &Self {
        std::fs::create_dir_all(self.root.join(relative)).expect("create fixture dir");
        self
    }

    /// Seed a `package.json` declaring the given runtime dependencies.
    pub fn with_package_json(&self, dependencies: &[&str]) -> &Self {
        let deps = dependencies
            .iter()
            .map(|d| format!("    \"{d}\": \"^1.0.0\""))
            .collect::<Vec<_>>()
            .join(",\n");
        let body = format!(
            "{{\n  \"name\": \"fixture\",\n  \"version\": \"1.0.0\",\n  \"dependencies\": {{\n{deps}\n  }}\n}}\n"
        );
        self.write("package.json", &body)
    }

    /// Seed a `Cargo.toml` declaring the given dependencies.
    pub fn with_cargo_toml(&self, dependencies: &[&str]) -> &Self {
        let mut body = String::from("[package]\nname = \"fixture\"\nversion = \"0.1.0\"\n\n[dependencies]\n");
        for dep in dependencies {
            body.push_str(&format!("{dep} = \"1\"\n"));
        }
        self.write("Cargo.toml", &body)
    }

    /// Initialize a git repository with one commit per message.
    ///
    /// Returns `false` when `git` is not available, so callers can skip.
    pub fn init_git(&self, commit_messages: &[&str]) -> bool {
        if !self.git(&["init", "-q", "-b", "main"]) {
            return false;
        }
        for (i, message) in commit_messages.iter().enumerate() {
            self.write(&format!("history/{i}.txt"), message);
            if !self.git(&["add", "-A"])
                || !self.git(&[
                    "-c",
                    "user.name=Fixture Author",
                    "-c",
                    "user.email=fixture@example.com",
                    "commit",
                    "-q",
                    "-m",
                    message,
                ])
            {
                return false;
            }
        }
        true
    }

    fn git(&self, args: &[&str]) -> bool {
        Command::new("git")
            .arg("-C")
            .arg(self.root.as_str())
            .args(args)
            .env("GIT_CONFIG_NOSYSTEM", "1")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }
}

impl Default for ProjectFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Sets an environment variable for the guard's lifetime, restoring the old value on drop.
///
/// Tests using this must be `#[serial]`: the environment is process-global.
pub struct EnvGuard {
    key: String,
    previous: Option<String>,
}

impl EnvGuard {
    #[must_use]
    pub fn set(key: &str, value: &str) -> Self {
        let previous = std::env::var(key).ok();
        unsafe {
            std::env::set_var(key, value);
        }
        Self {
            key: key.to_string(),
            previous,
        }
    }

    #[must_use]
    pub fn remove(key: &str) -> Self {
        let previous = std::env::var(key).ok();
        unsafe {
            std::env::remove_var(key);
        }
        Self {
            key: key.to_string(),
            previous,
        }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        unsafe {
            match &self.previous {
                Some(value) => std::env::set_var(&self.key, value),
                None => std::env::remove_var(&self.key),
            }
        }
    }
}
