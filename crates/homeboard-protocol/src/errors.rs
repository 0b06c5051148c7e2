/// Errors produced while decoding frames or building requests.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("malformed frame: {message}")]
    MalformedFrame { message: String },

    #[error("invalid '{tag}' payload: {message}")]
    InvalidPayload { tag: String, message: String },

    #[error("unknown domain '{slug}'")]
    UnknownDomain { slug: String },

    #[error("unknown media command '{command}'")]
    UnknownMediaCommand { command: String },

    #[error("unknown light mode '{mode}' (expected on, off or toggle)")]
    UnknownLightMode { mode: String },

    #[error("invalid {action} action: {reason}")]
    InvalidAction {
        action: &'static str,
        reason: &'static str,
    },

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl ProtocolError {
    pub fn error_code(&self) -> &'static str {
        match self {
            ProtocolError::MalformedFrame { .. } => "malformed_frame",
            ProtocolError::InvalidPayload { .. } => "invalid_payload",
            ProtocolError::UnknownDomain { .. } => "unknown_domain",
            ProtocolError::UnknownMediaCommand { .. } => "unknown_media_command",
            ProtocolError::UnknownLightMode { .. } => "unknown_light_mode",
            ProtocolError::InvalidAction { .. } => "invalid_action",
            ProtocolError::Serde(_) => "serialization_error",
        }
    }

    /// Whether the error stems from user input rather than the server.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            ProtocolError::UnknownDomain { .. }
                | ProtocolError::UnknownMediaCommand { .. }
                | ProtocolError::UnknownLightMode { .. }
                | ProtocolError::InvalidAction { .. }
        )
    }
}
