//! Error types for registry access and version checks

use thiserror::Error;

/// Result type alias for registry calls
pub type RegistryResult<T> = std::result::Result<T, RegistryError>;

/// Failures talking to an OCI registry
#[derive(Error, Debug)]
pub enum RegistryError {
    /// The registry answered 404 for the requested resource
    #[error("manifest unknown: {url}")]
    NotFound { url: String },

    /// The registry rejected our credentials or challenge
    #[error("authentication failed for {url}: {reason}")]
    Unauthorized { url: String, reason: String },

    /// Any other non-success status
    #[error("registry returned {status} for {url}: {body}")]
    Status {
        status: u16,
        url: String,
        body: String,
    },

    /// A manifest probe succeeded without a Docker-Content-Digest header
    #[error("registry did not report a digest for {url}")]
    MissingDigest { url: String },

    /// Malformed response payload
    #[error("failed to parse response from {url}: {reason}")]
    InvalidResponse { url: String, reason: String },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error(transparent)]
    Config(#[from] bundle_core::Error),
}

impl RegistryError {
    /// Create an error from a non-success status, mapping 404 to [`RegistryError::NotFound`]
    pub fn from_status(status: u16, url: impl Into<String>, body: impl Into<String>) -> Self {
        let url = url.into();
        if status == 404 {
            return Self::NotFound { url };
        }
        let body = body.into();
        Self::Status {
            status,
            url,
            body: if body.is_empty() {
                "(no response body)".to_string()
            } else {
                body
            },
        }
    }

    /// Whether the reference does not exist (deleted or never published)
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Failures of a whole check, labelled with the phase that failed
#[derive(Error, Debug)]
pub enum CheckError {
    #[error("resolve repository")]
    ResolveRepository(#[source] bundle_core::Error),

    #[error("initialize transport")]
    InitializeTransport(#[source] RegistryError),

    #[error("list repository tags")]
    ListTags(#[source] RegistryError),

    #[error("get tag digest")]
    TagDigest(#[source] RegistryError),

    #[error("get remote image")]
    RemoteImage(#[source] RegistryError),
}
