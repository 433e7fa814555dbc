//! Error types for the Cirrus shell.

use thiserror::Error;

/// A shared error type for the entire Cirrus shell.
///
/// Variants carry the raw failure message separately from the display prefix
/// so callers can classify failures by their text (see
/// [`CirrusError::is_authorization_failure`]).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CirrusError {
    /// Transport-level failure talking to the backend
    #[error("Network error: {message}")]
    Network { message: String },

    /// The backend answered with a non-success status
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// Key-value or durable store failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization {
        format: String, // "TOML", "JSON", etc.
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Navigation to another view failed
    #[error("Navigation error: {0}")]
    Navigation(String),

    /// The native client refused or failed to restart
    #[error("Restart error: {0}")]
    Restart(String),

    /// One-time application setup failed
    #[error("Initialization error: {0}")]
    Initialization(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CirrusError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates a Network error
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Creates an Http error
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::Http {
            status,
            message: message.into(),
        }
    }

    /// Creates a Storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    /// Creates an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an Initialization error
    pub fn initialization(message: impl Into<String>) -> Self {
        Self::Initialization(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    // ============================================================================
    // Inspection
    // ============================================================================

    /// Returns the raw failure message without the variant prefix.
    pub fn message(&self) -> &str {
        match self {
            Self::Network { message }
            | Self::Http { message, .. }
            | Self::Io { message }
            | Self::Serialization { message, .. } => message,
            Self::Storage(message)
            | Self::Config(message)
            | Self::Navigation(message)
            | Self::Restart(message)
            | Self::Initialization(message)
            | Self::Internal(message) => message,
        }
    }

    /// Text suitable for a user-visible notification.
    ///
    /// Falls back to the full display string when the raw message is empty.
    pub fn user_message(&self) -> String {
        let message = self.message().trim();
        if message.is_empty() {
            self.to_string()
        } else {
            message.to_string()
        }
    }

    /// Check whether the message names an authorization/key failure.
    ///
    /// Every marker must appear in the message, compared case-insensitively.
    /// An empty marker list never matches.
    pub fn is_authorization_failure<S: AsRef<str>>(&self, markers: &[S]) -> bool {
        if markers.is_empty() {
            return false;
        }
        let lower = self.message().to_lowercase();
        markers
            .iter()
            .all(|marker| lower.contains(&marker.as_ref().to_lowercase()))
    }

    /// Check if this is a config error
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for CirrusError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for CirrusError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for CirrusError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::ser::Error> for CirrusError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

/// A type alias for `Result<T, CirrusError>`.
pub type Result<T> = std::result::Result<T, CirrusError>;

#[cfg(test)]
mod tests {
    use super::*;

    const MARKERS: [&str; 2] = ["api", "key"];

    #[test]
    fn test_authorization_failure_requires_all_markers() {
        let err = CirrusError::http(401, "Invalid API key");
        assert!(err.is_authorization_failure(&MARKERS));

        let err = CirrusError::network("api unreachable");
        assert!(!err.is_authorization_failure(&MARKERS));

        let err = CirrusError::network("key rotated");
        assert!(!err.is_authorization_failure(&MARKERS));
    }

    #[test]
    fn test_authorization_failure_is_case_insensitive() {
        let err = CirrusError::network("APIKEY_EXPIRED");
        assert!(err.is_authorization_failure(&MARKERS));
    }

    #[test]
    fn test_authorization_failure_ignores_display_prefix() {
        // "Network error: " must not contribute to the match.
        let err = CirrusError::network("timeout");
        assert!(!err.is_authorization_failure(&["network", "timeout"]));
    }

    #[test]
    fn test_empty_markers_never_match() {
        let err = CirrusError::network("api key");
        assert!(!err.is_authorization_failure::<&str>(&[]));
    }

    #[test]
    fn test_user_message_falls_back_to_display() {
        let err = CirrusError::storage("");
        assert_eq!(err.user_message(), "Storage error: ");

        let err = CirrusError::storage("disk full");
        assert_eq!(err.user_message(), "disk full");
    }

    #[test]
    fn test_io_conversion_keeps_kind() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: CirrusError = io.into();
        assert!(err.message().contains("NotFound"));
    }
}
