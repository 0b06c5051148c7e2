//! Configuration loading and merging.
//!
//! # Configuration Hierarchy
//!
//! Later sources override earlier ones:
//! 1. **Hardcoded defaults** - accessor fallbacks in [`crate::types`]
//! 2. **User config** - `~/.homeboard/config.toml`
//! 3. **Project config** - `./.homeboard/config.toml`
//! 4. **CLI arguments** - applied by the binary after loading

use std::fs;
use std::path::Path;

use homeboard_paths::HomeboardPaths;
use tracing::debug;

use crate::errors::ConfigError;
use crate::types::{
    ChannelConfig, HomeboardConfig, PollConfig, ServerConfig, TimersConfig, UiConfig,
};
use crate::validation::validate_config;

fn is_file_not_found(e: &ConfigError) -> bool {
    matches!(e, ConfigError::IoError { source } if source.kind() == std::io::ErrorKind::NotFound)
}

/// Load and merge the user and project config files, then validate.
///
/// # Errors
///
/// Parse and validation failures are errors. Missing files are not.
pub fn load_hierarchy() -> Result<HomeboardConfig, ConfigError> {
    let user = match HomeboardPaths::resolve() {
        Ok(paths) => Some(paths.user_config()),
        Err(e) => {
            debug!(event = "config.load.user_skipped", error = %e);
            None
        }
    };
    let project = HomeboardPaths::project_config(&std::env::current_dir()?);
    load_from(user.as_deref(), Some(&project))
}

/// Load from explicit file locations. `None` skips that layer.
pub fn load_from(
    user: Option<&Path>,
    project: Option<&Path>,
) -> Result<HomeboardConfig, ConfigError> {
    let mut config = HomeboardConfig::default();

    for path in [user, project].into_iter().flatten() {
        match load_config_file(path) {
            Ok(layer) => {
                debug!(event = "config.load.layer_applied", path = %path.display());
                config = merge_configs(config, layer);
            }
            Err(e) if !is_file_not_found(&e) => return Err(e),
            Err(_) => {}
        }
    }

    validate_config(&config)?;
    Ok(config)
}

fn load_config_file(path: &Path) -> Result<HomeboardConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    toml::from_str(&content).map_err(|e| ConfigError::ConfigParseError {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

/// Merge two configurations, with `override_config` taking precedence.
///
/// Optional fields are replaced only when the override sets them. Poll
/// entries merge per domain.
pub fn merge_configs(base: HomeboardConfig, override_config: HomeboardConfig) -> HomeboardConfig {
    HomeboardConfig {
        server: ServerConfig {
            base_url: override_config.server.base_url.or(base.server.base_url),
            push_path: override_config.server.push_path.or(base.server.push_path),
            request_timeout_secs: override_config
                .server
                .request_timeout_secs
                .or(base.server.request_timeout_secs),
            action_timeout_secs: override_config
                .server
                .action_timeout_secs
                .or(base.server.action_timeout_secs),
        },
        channel: ChannelConfig {
            retry_floor_ms: override_config
                .channel
                .retry_floor_ms
                .or(base.channel.retry_floor_ms),
            retry_ceiling_ms: override_config
                .channel
                .retry_ceiling_ms
                .or(base.channel.retry_ceiling_ms),
        },
        poll: {
            let mut overrides = base.poll.overrides;
            overrides.extend(override_config.poll.overrides);
            PollConfig { overrides }
        },
        timers: TimersConfig {
            max_minutes: override_config
                .timers
                .max_minutes
                .or(base.timers.max_minutes),
        },
        ui: UiConfig {
            always_visible: override_config
                .ui
                .always_visible
                .or(base.ui.always_visible),
            state_file: override_config.ui.state_file.or(base.ui.state_file),
            action_refresh_delay_ms: override_config
                .ui
                .action_refresh_delay_ms
                .or(base.ui.action_refresh_delay_ms),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use homeboard_protocol::Domain;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_missing_files_yield_defaults() {
        let dir = TempDir::new().unwrap();
        let config = load_from(
            Some(&dir.path().join("nope.toml")),
            Some(&dir.path().join("also-nope.toml")),
        )
        .unwrap();
        assert_eq!(config.server.base_url(), "http://localhost:8000");
    }

    #[test]
    fn test_project_overrides_user() {
        let dir = TempDir::new().unwrap();
        let user = write(
            &dir,
            "user.toml",
            r#"
            [server]
            base_url = "http://home:8000"
            request_timeout_secs = 3

            [poll]
            lights = 5
            news = 600
            "#,
        );
        let project = write(
            &dir,
            "project.toml",
            r#"
            [server]
            base_url = "http://lab:9000"
            action_timeout_secs = 240

            [poll]
            lights = 2
            "#,
        );

        let config = load_from(Some(&user), Some(&project)).unwrap();
        assert_eq!(config.server.base_url(), "http://lab:9000");
        assert_eq!(config.server.request_timeout(), Duration::from_secs(3));
        assert_eq!(config.server.action_timeout(), Duration::from_secs(240));
        assert_eq!(
            config.poll.interval_for(Domain::Lights),
            Duration::from_secs(2)
        );
        assert_eq!(
            config.poll.interval_for(Domain::News),
            Duration::from_secs(600)
        );
    }

    #[test]
    fn test_parse_error_is_reported() {
        let dir = TempDir::new().unwrap();
        let user = write(&dir, "user.toml", "[server\nbase_url = ");
        let err = load_from(Some(&user), None).unwrap_err();
        assert_eq!(err.error_code(), "config_parse_error");
        assert!(err.to_string().contains("user.toml"));
    }

    #[test]
    fn test_merged_result_is_validated() {
        let dir = TempDir::new().unwrap();
        let user = write(&dir, "user.toml", "[channel]\nretry_floor_ms = 0\n");
        let err = load_from(Some(&user), None).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidConfiguration { .. }));
    }

    #[test]
    fn test_merge_keeps_base_when_override_unset() {
        let mut base = HomeboardConfig::default();
        base.ui.always_visible = Some("weather".to_string());
        base.timers.max_minutes = Some(60);
        let merged = merge_configs(base, HomeboardConfig::default());
        assert_eq!(merged.ui.always_visible(), "weather");
        assert_eq!(merged.timers.max_minutes(), 60);
    }
}
