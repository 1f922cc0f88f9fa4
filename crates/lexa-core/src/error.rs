//! Error types for the Lexa client.

use thiserror::Error;

/// Detail shown to the user when the backend gave no explanation.
pub const FALLBACK_ERROR_DETAIL: &str = "Xin lỗi, đã có lỗi xảy ra.";

/// A shared error type for the whole Lexa client.
///
/// Variants fall into three groups:
/// - precondition errors, raised locally before any request is sent
/// - transport and backend errors, raised by a backend call
/// - decoding, configuration and I/O errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LexaError {
    /// No template (or a template without a filename) was chosen.
    #[error("No contract template selected")]
    NoTemplateSelected,

    /// The session already has a template; start a new session to switch.
    #[error("A contract template is already selected for this session: {0}")]
    TemplateAlreadySelected(String),

    /// The submitted message was empty or whitespace only.
    #[error("Message is empty")]
    EmptyMessage,

    /// A previous exchange has not completed yet.
    #[error("Another request is still in flight for this session")]
    ExchangeInFlight,

    /// The credential was missing or rejected by the backend.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The backend answered with a non-success status.
    #[error("Backend error ({status}): {}", detail.as_deref().unwrap_or("no detail"))]
    Backend {
        status: u16,
        detail: Option<String>,
    },

    /// The caller dropped the request before the backend answered.
    #[error("Request was cancelled before the backend answered")]
    Cancelled,

    /// The request never produced a response (connect, timeout, body read).
    #[error("Transport error: {0}")]
    Transport(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization { format: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl LexaError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates a Backend error
    pub fn backend(status: u16, detail: Option<String>) -> Self {
        Self::Backend { status, detail }
    }

    /// Creates a Transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    /// Creates a Serialization error
    pub fn serialization(format: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Serialization {
            format: format.into(),
            message: message.into(),
        }
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if this error was raised locally, before any request was sent.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::NoTemplateSelected
                | Self::TemplateAlreadySelected(_)
                | Self::EmptyMessage
                | Self::ExchangeInFlight
        )
    }

    /// Check if this error came from a backend call.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            Self::Unauthorized(_) | Self::Backend { .. } | Self::Transport(_)
        )
    }

    /// Check if the credential needs to be renewed.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized(_))
    }

    /// The backend-provided explanation, if there is one.
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Backend { detail, .. } => detail.as_deref(),
            Self::Unauthorized(detail) => Some(detail.as_str()),
            _ => None,
        }
    }

    /// The explanation shown in a transcript turn.
    ///
    /// Falls back to a generic message when the backend said nothing useful.
    pub fn user_detail(&self) -> &str {
        self.detail()
            .filter(|d| !d.trim().is_empty())
            .unwrap_or(FALLBACK_ERROR_DETAIL)
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for LexaError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for LexaError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for LexaError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

/// A type alias for `Result<T, LexaError>`.
pub type Result<T> = std::result::Result<T, LexaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_detail_prefers_backend_detail() {
        let err = LexaError::backend(400, Some("Please configure your Gemini API Key in settings.".into()));
        assert_eq!(
            err.user_detail(),
            "Please configure your Gemini API Key in settings."
        );
    }

    #[test]
    fn test_user_detail_falls_back() {
        assert_eq!(LexaError::backend(500, None).user_detail(), FALLBACK_ERROR_DETAIL);
        assert_eq!(
            LexaError::backend(500, Some("  ".into())).user_detail(),
            FALLBACK_ERROR_DETAIL
        );
        assert_eq!(
            LexaError::transport("connection refused").user_detail(),
            FALLBACK_ERROR_DETAIL
        );
    }

    #[test]
    fn test_classification() {
        assert!(LexaError::EmptyMessage.is_precondition());
        assert!(LexaError::ExchangeInFlight.is_precondition());
        assert!(!LexaError::EmptyMessage.is_remote());
        assert!(LexaError::transport("x").is_remote());
        assert!(LexaError::Unauthorized("expired".into()).is_unauthorized());
    }

    #[test]
    fn test_backend_display() {
        let err = LexaError::backend(404, Some("File not found".into()));
        assert_eq!(err.to_string(), "Backend error (404): File not found");
        assert_eq!(
            LexaError::backend(502, None).to_string(),
            "Backend error (502): no detail"
        );
    }
}
