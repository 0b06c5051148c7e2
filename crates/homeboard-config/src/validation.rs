//! Configuration validation.

use homeboard_protocol::{Domain, TIMERS_WIDGET};

use crate::errors::ConfigError;
use crate::types::HomeboardConfig;

fn invalid(message: String) -> ConfigError {
    ConfigError::InvalidConfiguration { message }
}

/// Validate a merged configuration.
///
/// # Validation Rules
///
/// - `server.base_url` is non-empty and uses http or https
/// - `server.push_path` starts with `/`
/// - `server.request_timeout_secs` and `server.action_timeout_secs` are positive
/// - `channel.retry_floor_ms` is positive and not above the ceiling
/// - every `[poll]` key names a domain and every interval is positive
/// - `timers.max_minutes` is positive
/// - `ui.always_visible` names a known widget
pub fn validate_config(config: &HomeboardConfig) -> Result<(), ConfigError> {
    let base_url = config.server.base_url();
    if base_url.is_empty() {
        return Err(invalid("server.base_url is empty".to_string()));
    }
    if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
        return Err(invalid(format!(
            "server.base_url '{base_url}' must start with http:// or https://"
        )));
    }

    let push_path = config.server.push_path();
    if !push_path.starts_with('/') {
        return Err(invalid(format!(
            "server.push_path '{push_path}' must start with '/'"
        )));
    }

    if config.server.request_timeout().is_zero() {
        return Err(invalid(
            "server.request_timeout_secs must be positive".to_string(),
        ));
    }
    if config.server.action_timeout().is_zero() {
        return Err(invalid(
            "server.action_timeout_secs must be positive".to_string(),
        ));
    }

    let floor = config.channel.retry_floor();
    let ceiling = config.channel.retry_ceiling();
    if floor.is_zero() {
        return Err(invalid("channel.retry_floor_ms must be positive".to_string()));
    }
    if ceiling < floor {
        return Err(invalid(format!(
            "channel.retry_ceiling_ms ({}) is below retry_floor_ms ({})",
            ceiling.as_millis(),
            floor.as_millis()
        )));
    }

    for (slug, secs) in &config.poll.overrides {
        if Domain::from_slug(slug).is_none() {
            return Err(invalid(format!("[poll] has unknown domain '{slug}'")));
        }
        if *secs == 0 {
            return Err(invalid(format!("[poll] {slug} interval must be positive")));
        }
    }

    if config.timers.max_minutes() == 0 {
        return Err(invalid("timers.max_minutes must be positive".to_string()));
    }

    let always_visible = config.ui.always_visible();
    if always_visible != TIMERS_WIDGET && Domain::from_slug(always_visible).is_none() {
        return Err(invalid(format!(
            "ui.always_visible '{always_visible}' is not a known widget"
        )));
    }

    Ok(())
}
