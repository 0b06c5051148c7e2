use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum PathError {
    #[error("home directory not found, set $HOME")]
    HomeNotFound,
}

/// Centralized path construction for the `~/.homeboard/` directory layout.
///
/// Single source of truth for every path under `~/.homeboard/`. Use `resolve()`
/// in production code and `from_dir()` in tests.
#[derive(Debug, Clone)]
pub struct HomeboardPaths {
    homeboard_dir: PathBuf,
}

impl HomeboardPaths {
    /// Resolve paths from the user's home directory (`~/.homeboard`).
    pub fn resolve() -> Result<Self, PathError> {
        let home = dirs::home_dir().ok_or(PathError::HomeNotFound)?;
        Ok(Self {
            homeboard_dir: home.join(".homeboard"),
        })
    }

    /// Resolve from the home directory, falling back to `/tmp/.homeboard`.
    ///
    /// For callers that must always produce a path (config defaults, state
    /// file location) and only need to report the failure.
    pub fn resolve_or_tmp() -> Self {
        Self::resolve().unwrap_or_else(|_| Self::from_dir(PathBuf::from("/tmp/.homeboard")))
    }

    /// Create paths from an explicit base directory. Use in tests.
    pub fn from_dir(homeboard_dir: PathBuf) -> Self {
        Self { homeboard_dir }
    }

    /// The base `~/.homeboard` directory.
    pub fn homeboard_dir(&self) -> &Path {
        &self.homeboard_dir
    }

    // --- Top-level files ---

    pub fn user_config(&self) -> PathBuf {
        self.homeboard_dir.join("config.toml")
    }

    /// Persisted widget collapse map.
    pub fn ui_state_file(&self) -> PathBuf {
        self.homeboard_dir.join("ui_state.json")
    }

    // --- Static helpers (no self) ---

    /// Project-level config: `<project_root>/.homeboard/config.toml`.
    pub fn project_config(project_root: &Path) -> PathBuf {
        project_root.join(".homeboard").join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_paths() -> HomeboardPaths {
        HomeboardPaths::from_dir(PathBuf::from("/home/user/.homeboard"))
    }

    #[test]
    fn test_resolve_uses_home_env() {
        temp_env::with_var("HOME", Some("/home/alice"), || {
            let paths = HomeboardPaths::resolve().unwrap();
            assert_eq!(paths.homeboard_dir(), Path::new("/home/alice/.homeboard"));
        });
    }

    #[test]
    fn test_from_dir() {
        let paths = HomeboardPaths::from_dir(PathBuf::from("/tmp/test-homeboard"));
        assert_eq!(paths.homeboard_dir(), Path::new("/tmp/test-homeboard"));
    }

    #[test]
    fn test_user_config() {
        assert_eq!(
            test_paths().user_config(),
            PathBuf::from("/home/user/.homeboard/config.toml")
        );
    }

    #[test]
    fn test_ui_state_file() {
        assert_eq!(
            test_paths().ui_state_file(),
            PathBuf::from("/home/user/.homeboard/ui_state.json")
        );
    }

    #[test]
    fn test_project_config() {
        assert_eq!(
            HomeboardPaths::project_config(Path::new("/work/house")),
            PathBuf::from("/work/house/.homeboard/config.toml")
        );
    }
}
