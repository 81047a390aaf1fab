//! Error types for the refine engine.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A shared error type for the entire refine engine.
///
/// Variants mirror the failure taxonomy of the selection-to-replacement
/// pipeline: credential problems, remote-service failures, replacement
/// failures, and storage-layer faults. Storage faults are recoverable by
/// design (the caller degrades them to a cache miss).
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RefineError {
    /// No API credential has been configured.
    #[error("No API credential configured")]
    NoCredential,

    /// The configured credential was rejected by the remote service.
    #[error("Invalid API credential: {message}")]
    InvalidCredential { message: String },

    /// The remote service reported an exhausted quota.
    #[error("API quota exceeded: {message}")]
    QuotaExceeded { message: String },

    /// The remote call did not finish within its size-appropriate deadline.
    #[error("Request timed out after {deadline_secs}s")]
    RequestTimeout { deadline_secs: u64 },

    /// The remote service answered with a payload we could not use.
    #[error("Malformed service response: {message}")]
    MalformedResponse { message: String },

    /// Remote-service failure that fits no other category.
    #[error("Service error: {message}")]
    Service { message: String },

    /// No eligible surface could be found for replacement.
    #[error("No eligible surface found in document")]
    NoSurfaceFound,

    /// Storage layer fault (key-value store, secret file).
    #[error("Storage error: {message}")]
    Storage { message: String },

    /// Serialization/deserialization error.
    #[error("Serialization error: {format} - {message}")]
    Serialization {
        format: &'static str,
        message: String,
    },

    /// IO error (file system operations).
    #[error("IO error: {message}")]
    Io { message: String },

    /// Internal error (should not happen in normal operation).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl RefineError {
    /// Creates an InvalidCredential error.
    pub fn invalid_credential(message: impl Into<String>) -> Self {
        Self::InvalidCredential {
            message: message.into(),
        }
    }

    /// Creates a QuotaExceeded error.
    pub fn quota_exceeded(message: impl Into<String>) -> Self {
        Self::QuotaExceeded {
            message: message.into(),
        }
    }

    /// Creates a MalformedResponse error.
    pub fn malformed_response(message: impl Into<String>) -> Self {
        Self::MalformedResponse {
            message: message.into(),
        }
    }

    /// Creates a Service error.
    pub fn service(message: impl Into<String>) -> Self {
        Self::Service {
            message: message.into(),
        }
    }

    /// Creates a Storage error.
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Creates an Internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Check if this error originates from the storage layer.
    ///
    /// Storage errors never block the primary flow; callers log them and
    /// continue as if the lookup missed.
    pub fn is_storage(&self) -> bool {
        matches!(self, Self::Storage { .. } | Self::Io { .. })
    }

    /// Check if this is a credential problem (absent or rejected key).
    pub fn is_credential_failure(&self) -> bool {
        matches!(self, Self::NoCredential | Self::InvalidCredential { .. })
    }

    /// The user-facing message for this error.
    ///
    /// Service failures are surfaced as blocking notifications; every
    /// variant maps to a distinct message so the user knows whether to fix
    /// configuration, wait, or simply retry.
    pub fn user_message(&self) -> String {
        match self {
            Self::NoCredential => {
                "Please configure your API key before refining text.".to_string()
            }
            Self::InvalidCredential { .. } => {
                "Invalid API key. Please check your configured key.".to_string()
            }
            Self::QuotaExceeded { .. } => {
                "API quota exceeded. Please check your usage.".to_string()
            }
            Self::RequestTimeout { .. } => {
                "Request timed out. Try with smaller text or try again later.".to_string()
            }
            Self::MalformedResponse { .. } => {
                "The service returned an unusable answer. Please try again.".to_string()
            }
            Self::NoSurfaceFound => {
                "No editable field found; the result was copied to the clipboard.".to_string()
            }
            _ => "Error refining text. Please try again.".to_string(),
        }
    }
}

impl From<std::io::Error> for RefineError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for RefineError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON",
            message: err.to_string(),
        }
    }
}

/// A type alias for `Result<T, RefineError>`.
pub type Result<T> = std::result::Result<T, RefineError>;
