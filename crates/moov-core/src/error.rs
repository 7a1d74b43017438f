//! Error types for Moov.

use thiserror::Error;

/// A shared error type for the whole Moov workspace.
///
/// Variants map onto the failure classes of the chat protocol: malformed
/// arguments, failed metadata lookups, bad store addressing, player trouble,
/// and the storage/configuration plumbing underneath.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MoovError {
    /// Malformed command or time arguments
    #[error("Parse error: {0}")]
    Parse(String),

    /// Metadata lookup for a URL failed
    #[error("Could not resolve '{url}': {message}")]
    Resolution { url: String, message: String },

    /// The session store has no entries
    #[error("Session store is empty")]
    EmptyStore,

    /// The session store was addressed with an index it does not hold
    #[error("Session index {index} out of range (len {len})")]
    IndexOutOfRange { index: usize, len: usize },

    /// A command needed a live player and none is running
    #[error("No player is running")]
    PlayerUnavailable,

    /// The player process or its IPC channel failed
    #[error("Player error: {0}")]
    Player(String),

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization {
        format: String, // "TOML", "JSON"
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl MoovError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates a Parse error
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    /// Creates a Resolution error
    pub fn resolution(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Resolution {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Creates a Player error
    pub fn player(message: impl Into<String>) -> Self {
        Self::Player(message.into())
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

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    pub fn is_resolution(&self) -> bool {
        matches!(self, Self::Resolution { .. })
    }

    /// True for both empty-store and out-of-range addressing.
    pub fn is_bad_index(&self) -> bool {
        matches!(self, Self::EmptyStore | Self::IndexOutOfRange { .. })
    }

    pub fn is_io(&self) -> bool {
        matches!(self, Self::Io { .. })
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for MoovError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for MoovError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for MoovError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::ser::Error> for MoovError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

/// A type alias for `Result<T, MoovError>`.
pub type Result<T> = std::result::Result<T, MoovError>;
