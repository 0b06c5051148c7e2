use homeboard_config::HomeboardConfig;
use tracing::warn;

use crate::color;

/// Load configuration, falling back to defaults with a visible warning.
pub fn load_config_with_warning() -> HomeboardConfig {
    match HomeboardConfig::load_hierarchy() {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "{} {}",
                color::warning(&format!("Warning: Could not load config: {e}. Using defaults.")),
                color::hint(
                    "Tip: Check ~/.homeboard/config.toml and ./.homeboard/config.toml for syntax errors."
                ),
            );
            warn!(
                event = "cli.config.load_failed",
                error = %e,
                error_code = e.error_code(),
            );
            HomeboardConfig::default()
        }
    }
}

/// Human cadence: whole minutes as `5m`, everything else in seconds.
pub fn format_interval(interval: std::time::Duration) -> String {
    let secs = interval.as_secs();
    if secs >= 60 && secs % 60 == 0 {
        format!("{}m", secs / 60)
    } else {
        format!("{secs}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_format_interval() {
        assert_eq!(format_interval(Duration::from_secs(10)), "10s");
        assert_eq!(format_interval(Duration::from_secs(90)), "90s");
        assert_eq!(format_interval(Duration::from_secs(300)), "5m");
        assert_eq!(format_interval(Duration::from_secs(1800)), "30m");
    }
}
