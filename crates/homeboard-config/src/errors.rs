#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to parse config file '{path}': {message}")]
    ConfigParseError { path: String, message: String },

    #[error("Invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    #[error("IO error reading config: {source}")]
    IoError {
        #[from]
        source: std::io::Error,
    },
}

impl ConfigError {
    pub fn error_code(&self) -> &'static str {
        match self {
            ConfigError::ConfigParseError { .. } => "config_parse_error",
            ConfigError::InvalidConfiguration { .. } => "invalid_configuration",
            ConfigError::IoError { .. } => "config_io_error",
        }
    }

    /// Everything except raw I/O failures is fixable by editing the config.
    pub fn is_user_error(&self) -> bool {
        !matches!(self, ConfigError::IoError { .. })
    }
}
