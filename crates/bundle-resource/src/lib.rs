//! Pipeline resource for OCI bundles
//!
//! Three binaries share this library:
//! - `check` reports versions of a repository newer than the last one seen
//! - `in` pulls a version into a directory
//! - `out` pushes a file or directory as a new version
//!
//! Requests arrive as JSON on stdin and responses leave as JSON on stdout.
//! Logs and imgpkg output go to stderr.

pub mod cli;
pub mod commands;
pub mod logging;
pub mod protocol;

pub use logging::init_tracing;

use std::process::ExitCode;

/// Print an error chain the way the pipeline shows it to users
pub fn report(result: anyhow::Result<()>) -> ExitCode {
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}
