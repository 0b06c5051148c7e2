//! # homeboard-config
//!
//! TOML configuration types, loading, and validation for homeboard.
//!
//! Single source of truth for `HomeboardConfig`. Depends only on
//! `homeboard-paths` and `homeboard-protocol`.

mod loading;
mod validation;

pub mod errors;
pub mod types;

pub use errors::ConfigError;
pub use loading::{load_from, load_hierarchy, merge_configs};
pub use types::{ChannelConfig, HomeboardConfig, PollConfig, ServerConfig, TimersConfig, UiConfig};
pub use validation::validate_config;

impl HomeboardConfig {
    /// Load configuration from the hierarchy of config files.
    ///
    /// See [`loading::load_hierarchy`] for details.
    pub fn load_hierarchy() -> Result<Self, ConfigError> {
        loading::load_hierarchy()
    }

    /// See [`validation::validate_config`] for details.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validation::validate_config(self)
    }
}
