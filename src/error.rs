//! Error types for the Driftgate validation system.
//!
//! This module provides the error hierarchy for all operations in the
//! validation lifecycle: argument checking, rendering/plan compilation
//! fetches, secret reads, and tool configuration.

use std::path::PathBuf;
use thiserror::Error;

use crate::diff::{EnvironmentId, HostId};

/// The main error type for the Driftgate validation system.
#[derive(Debug, Error)]
pub enum DriftgateError {
    /// A required identifier is missing or blank.
    ///
    /// Raised synchronously, before any fetch begins.
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Description of the invalid argument.
        message: String,
    },

    /// An upstream fetch failed for a host/environment pair.
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Secret store errors.
    #[error("Secret error: {0}")]
    Secret(#[from] SecretError),

    /// Tool settings errors.
    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),

    /// IO errors.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Fetch-phase errors.
///
/// The orchestrator attaches host and environment context to the underlying
/// collaborator failure; a fetch error is fatal to the whole validation call
/// and is never retried here.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Rendering the configuration tree failed.
    #[error("failed to render configuration for host '{host}' in environment '{environment}': {source}")]
    Render {
        /// Host whose configuration could not be rendered.
        host: HostId,
        /// Environment that could not be rendered.
        environment: EnvironmentId,
        /// Underlying collaborator failure.
        source: RenderError,
    },

    /// Compiling the execution plan failed.
    #[error("failed to compile execution plan for host '{host}' in environment '{environment}': {source}")]
    Plan {
        /// Host whose plan could not be compiled.
        host: HostId,
        /// Environment that could not be compiled.
        environment: EnvironmentId,
        /// Underlying collaborator failure.
        source: RenderError,
    },

    /// Refreshing the version-controlled source content failed.
    #[error("failed to refresh configuration sources: {source}")]
    Refresh {
        /// Underlying collaborator failure.
        source: RenderError,
    },
}

/// Render-service collaborator errors.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The requested environment does not exist or cannot be resolved.
    #[error("environment not found: {environment}")]
    EnvironmentNotFound {
        /// The missing environment name.
        environment: String,
    },

    /// The render service failed to compile the requested data.
    #[error("render failed: {message}")]
    RenderFailed {
        /// Description of the render failure.
        message: String,
    },

    /// Network error talking to the render service.
    #[error("network error communicating with render service: {message}")]
    Network {
        /// Description of the network error.
        message: String,
    },

    /// The render service returned a non-success status.
    #[error("render service request failed: {status} - {message}")]
    ApiRequest {
        /// HTTP status code.
        status: u16,
        /// Error message from the service.
        message: String,
    },

    /// The render service returned a response that could not be decoded.
    #[error("invalid response from render service: {message}")]
    InvalidResponse {
        /// Description of the response issue.
        message: String,
    },
}

/// Secret store errors.
#[derive(Debug, Error)]
pub enum SecretError {
    /// Authentication with the secret store failed.
    #[error("Vault authentication failed: {message}")]
    AuthenticationFailed {
        /// Description of the auth failure.
        message: String,
    },

    /// The secret does not exist.
    #[error("secret not found: {path}")]
    NotFound {
        /// Path of the missing secret.
        path: String,
    },

    /// The requested key is not present in the secret.
    #[error("key '{key}' not found in secret '{path}'")]
    MissingKey {
        /// Path of the secret.
        path: String,
        /// Key that was requested.
        key: String,
    },

    /// Network error talking to the secret store.
    #[error("network error communicating with Vault: {message}")]
    Network {
        /// Description of the network error.
        message: String,
    },

    /// The secret store returned a response that could not be decoded.
    #[error("invalid response from Vault: {message}")]
    InvalidResponse {
        /// Description of the response issue.
        message: String,
    },
}

/// Tool settings errors.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The settings file was not found.
    #[error("settings file not found: {path}")]
    FileNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// The settings file could not be parsed.
    #[error("failed to parse settings: {message}")]
    ParseError {
        /// Description of the parse error.
        message: String,
    },

    /// Settings validation failed.
    #[error("settings validation failed: {message}")]
    ValidationError {
        /// Description of the validation error.
        message: String,
        /// Field that failed validation.
        field: Option<String>,
    },

    /// Environment variable is missing.
    #[error("missing environment variable: {name}")]
    MissingEnvVar {
        /// Name of the missing variable.
        name: String,
    },
}

/// Result type alias for Driftgate operations.
pub type Result<T> = std::result::Result<T, DriftgateError>;

impl DriftgateError {
    /// Creates a new internal error with the given message.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Creates a new invalid-argument error with the given message.
    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }
}

impl RenderError {
    /// Creates a network error.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Creates an API request error.
    #[must_use]
    pub fn api_error(status: u16, message: impl Into<String>) -> Self {
        Self::ApiRequest {
            status,
            message: message.into(),
        }
    }

    /// Creates an invalid-response error.
    #[must_use]
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            message: message.into(),
        }
    }

    /// Returns true if this error is retryable.
    ///
    /// Only the render client's internal retry wrapper consults this; the
    /// validation orchestrator never retries.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Network { .. })
    }
}

impl SecretError {
    /// Creates a network error.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Creates an invalid-response error.
    #[must_use]
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            message: message.into(),
        }
    }
}

impl SettingsError {
    /// Creates a validation error for a specific field.
    #[must_use]
    pub fn validation(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Creates a validation error without a specific field.
    #[must_use]
    pub fn validation_general(message: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
            field: None,
        }
    }
}
