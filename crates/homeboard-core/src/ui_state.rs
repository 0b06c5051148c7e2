//! Persisted widget collapse map.
//!
//! One JSON object of widget id -> collapsed flag. The whole map is written
//! on every change and read back all-or-nothing: a corrupt file is treated
//! as first run.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use homeboard_config::UiConfig;
use homeboard_paths::HomeboardPaths;
use homeboard_protocol::{Domain, TIMERS_WIDGET};
use tracing::{debug, warn};

use crate::errors::StateStoreError;

pub type CollapseMap = BTreeMap<String, bool>;

/// Every widget id the board knows about: the domain slugs plus the timers.
pub fn known_widgets() -> impl Iterator<Item = &'static str> {
    Domain::ALL
        .into_iter()
        .map(Domain::slug)
        .chain(std::iter::once(TIMERS_WIDGET))
}

#[derive(Debug, Clone)]
pub struct LocalStateStore {
    path: PathBuf,
    always_visible: String,
}

impl LocalStateStore {
    pub fn new(path: impl Into<PathBuf>, always_visible: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            always_visible: always_visible.into(),
        }
    }

    /// Store at the configured path, or `~/.homeboard/ui_state.json`.
    pub fn from_config(ui: &UiConfig) -> Self {
        let path = ui
            .state_file()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| HomeboardPaths::resolve_or_tmp().ui_state_file());
        Self::new(path, ui.always_visible())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn always_visible(&self) -> &str {
        &self.always_visible
    }

    /// Replace the stored map with `map`, atomically.
    pub fn save(&self, map: &CollapseMap) -> Result<(), StateStoreError> {
        let content = serde_json::to_string_pretty(map)?;
        let write_err = |source| StateStoreError::Write {
            path: self.path.display().to_string(),
            source,
        };

        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(write_err)?;
        }

        let temp_file = self.path.with_extension("json.tmp");
        if let Err(e) = fs::write(&temp_file, &content) {
            cleanup_temp_file(&temp_file);
            return Err(write_err(e));
        }
        if let Err(e) = fs::rename(&temp_file, &self.path) {
            cleanup_temp_file(&temp_file);
            return Err(write_err(e));
        }

        debug!(
            event = "core.ui_state.saved",
            path = %self.path.display(),
            entries = map.len(),
        );
        Ok(())
    }

    /// The stored map, or `None` if the file is missing or not a JSON object
    /// of booleans.
    pub fn load(&self) -> Option<CollapseMap> {
        let content = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(
                    event = "core.ui_state.read_failed",
                    path = %self.path.display(),
                    error = %e,
                );
                return None;
            }
        };
        match serde_json::from_str(&content) {
            Ok(map) => Some(map),
            Err(e) => {
                warn!(
                    event = "core.ui_state.parse_failed",
                    path = %self.path.display(),
                    error = %e,
                );
                None
            }
        }
    }

    /// Collapse state to apply at startup.
    ///
    /// Known widgets default to collapsed, stored entries win over the
    /// default, and the always-visible widget is expanded no matter what.
    pub fn effective(&self) -> CollapseMap {
        let mut map: CollapseMap = known_widgets().map(|id| (id.to_string(), true)).collect();
        if let Some(stored) = self.load() {
            map.extend(stored);
        }
        map.insert(self.always_visible.clone(), false);
        map
    }

    /// Flip one widget and persist the complete map. Returns the new
    /// collapsed flag.
    pub fn toggle(&self, widget_id: &str) -> Result<bool, StateStoreError> {
        let mut map = self.effective();
        let collapsed = !map.get(widget_id).copied().unwrap_or(true);
        map.insert(widget_id.to_string(), collapsed);
        self.save(&map)?;
        Ok(collapsed)
    }
}

fn cleanup_temp_file(temp_file: &Path) {
    if let Err(e) = fs::remove_file(temp_file)
        && e.kind() != std::io::ErrorKind::NotFound
    {
        warn!(
            event = "core.ui_state.temp_cleanup_failed",
            path = %temp_file.display(),
            error = %e,
        );
    }
}
