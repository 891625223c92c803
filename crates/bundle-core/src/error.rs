//! Error types for bundle-core

use thiserror::Error;

/// Result type alias using bundle-core's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Configuration errors shared by every crate in the workspace
#[derive(Error, Debug)]
pub enum Error {
    /// Repository name could not be parsed
    #[error("Invalid repository '{name}': {reason}")]
    InvalidRepository { name: String, reason: String },

    /// Image reference (repository plus tag or digest) could not be parsed
    #[error("Invalid reference '{reference}': {reason}")]
    InvalidReference { reference: String, reason: String },

    /// Custom certificate authority text is not usable PEM
    #[error("Failed to append registry certificate: {reason}")]
    InvalidCertificate { reason: String },

    /// Missing required field
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    /// Setting value could not be parsed
    #[error("Invalid value for {name}: {value}")]
    InvalidSetting { name: String, value: String },

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create an invalid repository error
    pub fn invalid_repository(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidRepository {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid reference error
    pub fn invalid_reference(reference: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidReference {
            reference: reference.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid certificate error
    pub fn invalid_certificate(reason: impl Into<String>) -> Self {
        Self::InvalidCertificate {
            reason: reason.into(),
        }
    }

    /// Create a missing field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }

    /// Create an invalid setting error
    pub fn invalid_setting(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidSetting {
            name: name.into(),
            value: value.into(),
        }
    }
}
