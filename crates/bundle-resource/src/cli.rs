//! CLI argument parsing with clap
//!
//! The pipeline runs each binary with at most one positional argument, so
//! everything else is read from the environment.

use bundle_core::settings::DEFAULT_RETRY_COUNT;
use bundle_core::{parse_duration, TransferSettings};
use bundle_image::DEFAULT_TIMEOUT;
use clap::{Args, Parser};
use std::path::PathBuf;
use std::time::Duration;

/// Verbosity flags shared by every binary
#[derive(Args, Debug, Clone, Default)]
pub struct LogArgs {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long)]
    pub quiet: bool,
}

/// How imgpkg is run by `in` and `out`
#[derive(Args, Debug, Clone)]
pub struct TransferArgs {
    /// imgpkg binary, as a path or a name on PATH
    #[arg(long, env = "IMGPKG_BIN", default_value = "imgpkg")]
    pub imgpkg: PathBuf,

    /// Retries imgpkg makes per registry request
    #[arg(long, env = "BUNDLE_RESOURCE_RETRY_COUNT", default_value_t = DEFAULT_RETRY_COUNT)]
    pub retry_count: u32,

    /// How long imgpkg waits for registry response headers
    #[arg(
        long,
        env = "BUNDLE_RESOURCE_RESPONSE_HEADER_TIMEOUT",
        default_value = "30s",
        value_parser = duration_arg
    )]
    pub response_header_timeout: Duration,
}

impl TransferArgs {
    pub fn settings(&self) -> TransferSettings {
        TransferSettings {
            imgpkg: self.imgpkg.clone(),
            retry_count: self.retry_count,
            response_header_timeout: self.response_header_timeout,
        }
    }
}

/// Report new versions of a bundle repository
///
/// Reads a check request from stdin and writes the versions to stdout.
#[derive(Parser, Debug, Clone)]
#[command(name = "check", version)]
pub struct CheckArgs {
    /// Timeout for each registry request
    #[arg(
        long,
        env = "BUNDLE_RESOURCE_HTTP_TIMEOUT",
        default_value = "60s",
        value_parser = duration_arg
    )]
    pub http_timeout: Duration,

    #[command(flatten)]
    pub log: LogArgs,
}

impl Default for CheckArgs {
    fn default() -> Self {
        Self {
            http_timeout: DEFAULT_TIMEOUT,
            log: LogArgs::default(),
        }
    }
}

/// Fetch a bundle version into a directory
#[derive(Parser, Debug, Clone)]
#[command(name = "in", version)]
pub struct InArgs {
    /// Directory that receives the bundle and its version files
    #[arg(value_name = "DESTINATION")]
    pub destination: PathBuf,

    #[command(flatten)]
    pub transfer: TransferArgs,

    #[command(flatten)]
    pub log: LogArgs,
}

/// Publish a file or directory as a bundle version
#[derive(Parser, Debug, Clone)]
#[command(name = "out", version)]
pub struct OutArgs {
    /// Working directory that `params.path` is relative to
    #[arg(value_name = "SOURCE")]
    pub source: PathBuf,

    #[command(flatten)]
    pub transfer: TransferArgs,

    #[command(flatten)]
    pub log: LogArgs,
}

fn duration_arg(value: &str) -> Result<Duration, String> {
    parse_duration(value).map_err(|e| e.to_string())
}
