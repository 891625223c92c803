//! Error types for bundle transfers

use std::process::ExitStatus;
use thiserror::Error;

/// Failures of a single imgpkg invocation
#[derive(Error, Debug)]
pub enum DelegateError {
    /// The imgpkg binary could not be located
    #[error("imgpkg binary '{program}' not found")]
    NotFound {
        program: String,
        #[source]
        source: which::Error,
    },

    /// The child process could not be started
    #[error("failed to start {program}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// imgpkg ran but reported failure
    #[error("imgpkg {action} failed with {status}")]
    NonZeroExit {
        action: &'static str,
        status: ExitStatus,
    },

    /// A push finished without a `Pushed '<reference>'` line
    #[error("failed to parse image digest from output")]
    DigestNotReported,

    /// The pushed reference printed by imgpkg is not a digest reference
    #[error("invalid pushed reference '{reference}'")]
    InvalidPushedReference {
        reference: String,
        #[source]
        source: bundle_core::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures of a whole fetch or publish, labelled with the phase that failed
#[derive(Error, Debug)]
pub enum TransferError {
    #[error("write CA certificates")]
    WriteCaCerts(#[source] std::io::Error),

    #[error("pull bundle")]
    Pull(#[source] DelegateError),

    #[error("save version info")]
    SaveVersionInfo(#[source] std::io::Error),

    #[error("push bundle")]
    Push(#[source] DelegateError),

    /// Malformed request: bad repository or tag, missing params.path
    #[error(transparent)]
    Config(#[from] bundle_core::Error),
}
