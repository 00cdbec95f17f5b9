//! Error types for Agentdeck

use thiserror::Error;

/// Result type alias using Agentdeck's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Agentdeck error types with helpful messages
#[derive(Error, Debug)]
pub enum Error {
    // Network errors (E100-E199)
    #[error("Network error: {0}. Check that the orchestrator backend is reachable.")]
    Network(#[from] reqwest::Error),

    #[error("Backend returned HTTP {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Malformed payload from '{endpoint}': {reason}")]
    MalformedPayload { endpoint: String, reason: String },

    // Config errors (E600-E699)
    #[error("Configuration error: {0}")]
    Config(String),

    // Input errors (E800-E899)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // Generic errors
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Get error code for this error type
    pub fn code(&self) -> &'static str {
        match self {
            Self::Network(_) => "E100",
            Self::Api { .. } => "E101",
            Self::MalformedPayload { .. } => "E102",
            Self::Config(_) => "E600",
            Self::InvalidInput(_) => "E800",
            Self::Io(_) => "E9999",
        }
    }

    /// Backend-reported error detail, if the response body carried one.
    ///
    /// FastAPI-style backends wrap validation errors as `{"detail": "..."}`;
    /// surface that text instead of the raw body when present.
    pub fn detail(&self) -> Option<String> {
        match self {
            Self::Api { body, .. } => serde_json::from_str::<serde_json::Value>(body)
                .ok()
                .and_then(|v| v.get("detail").cloned())
                .and_then(|d| d.as_str().map(str::to_string)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = Error::Api {
            status: 500,
            body: "boom".to_string(),
        };
        assert_eq!(err.code(), "E101");

        let err = Error::MalformedPayload {
            endpoint: "api/agents".to_string(),
            reason: "expected an array".to_string(),
        };
        assert_eq!(err.code(), "E102");

        let err = Error::Config("missing base url".to_string());
        assert_eq!(err.code(), "E600");

        let err = Error::InvalidInput("bad scheme".to_string());
        assert_eq!(err.code(), "E800");

        let err = Error::Io(std::io::Error::other("disk gone"));
        assert_eq!(err.code(), "E9999");
    }

    #[test]
    fn test_api_detail_extraction() {
        let err = Error::Api {
            status: 400,
            body: r#"{"detail": "Agent ID kitchen already exists"}"#.to_string(),
        };
        assert_eq!(
            err.detail().as_deref(),
            Some("Agent ID kitchen already exists")
        );

        let err = Error::Api {
            status: 502,
            body: "<html>bad gateway</html>".to_string(),
        };
        assert_eq!(err.detail(), None);
    }
}
