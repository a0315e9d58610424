use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum PathError {
    #[error("home directory not found, set $HOME environment variable")]
    HomeNotFound,
}

/// Centralized path construction for the `~/.navsync/` directory layout.
///
/// Use `resolve()` in production code and `from_dir()` in tests.
#[derive(Debug, Clone)]
pub struct NavsyncPaths {
    navsync_dir: PathBuf,
}

impl NavsyncPaths {
    /// Resolve paths from the user's home directory (`~/.navsync`).
    pub fn resolve() -> Result<Self, PathError> {
        let home = dirs::home_dir().ok_or(PathError::HomeNotFound)?;
        Ok(Self {
            navsync_dir: home.join(".navsync"),
        })
    }

    /// Create paths from an explicit base directory. Use in tests.
    pub fn from_dir(navsync_dir: PathBuf) -> Self {
        Self { navsync_dir }
    }

    /// The base `~/.navsync` directory.
    pub fn navsync_dir(&self) -> &Path {
        &self.navsync_dir
    }

    pub fn user_config(&self) -> PathBuf {
        self.navsync_dir.join("config.toml")
    }

    pub fn traces_dir(&self) -> PathBuf {
        self.navsync_dir.join("traces")
    }

    /// Resolve a trace name to `~/.navsync/traces/<name>.json`.
    ///
    /// Names containing a path separator are returned unchanged so callers can
    /// pass explicit paths through the same helper.
    pub fn trace_file(&self, name: &str) -> PathBuf {
        if name.contains('/') || name.contains('\\') || name.ends_with(".json") {
            return PathBuf::from(name);
        }
        self.traces_dir().join(format!("{name}.json"))
    }

    // --- Static helpers (no self) ---

    /// Project-level config: `<project_root>/.navsync/config.toml`.
    pub fn project_config(project_root: &Path) -> PathBuf {
        project_root.join(".navsync").join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_paths() -> NavsyncPaths {
        NavsyncPaths::from_dir(PathBuf::from("/home/user/.navsync"))
    }

    #[test]
    fn test_resolve_returns_ok_when_home_set() {
        let result = NavsyncPaths::resolve();
        assert!(result.is_ok());
        let paths = result.unwrap();
        assert!(paths.navsync_dir().to_string_lossy().contains(".navsync"));
    }

    #[test]
    fn test_from_dir() {
        let paths = NavsyncPaths::from_dir(PathBuf::from("/tmp/test-navsync"));
        assert_eq!(paths.navsync_dir(), Path::new("/tmp/test-navsync"));
    }

    #[test]
    fn test_user_config() {
        assert_eq!(
            test_paths().user_config(),
            PathBuf::from("/home/user/.navsync/config.toml")
        );
    }

    #[test]
    fn test_project_config() {
        assert_eq!(
            NavsyncPaths::project_config(Path::new("/work/portal")),
            PathBuf::from("/work/portal/.navsync/config.toml")
        );
    }

    #[test]
    fn test_trace_file_resolves_bare_name() {
        assert_eq!(
            test_paths().trace_file("loop"),
            PathBuf::from("/home/user/.navsync/traces/loop.json")
        );
    }

    #[test]
    fn test_trace_file_passes_explicit_path_through() {
        assert_eq!(
            test_paths().trace_file("./fixtures/loop.json"),
            PathBuf::from("./fixtures/loop.json")
        );
        assert_eq!(
            test_paths().trace_file("loop.json"),
            PathBuf::from("loop.json")
        );
    }
}
