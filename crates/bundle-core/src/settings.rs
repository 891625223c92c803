//! Process-level settings for the transfer delegate
//!
//! These are not part of the pipeline `source:`; the binaries fill them from
//! flags or environment variables and fall back to the defaults below.

use crate::error::{Error, Result};
use std::path::PathBuf;
use std::time::Duration;

/// Default number of retries the delegate performs per registry request
pub const DEFAULT_RETRY_COUNT: u32 = 5;

/// Default time the delegate waits for registry response headers
pub const DEFAULT_RESPONSE_HEADER_TIMEOUT: Duration = Duration::from_secs(30);

/// How the transfer delegate is invoked
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferSettings {
    /// Path (or bare name resolved on PATH) of the imgpkg binary
    pub imgpkg: PathBuf,
    pub retry_count: u32,
    pub response_header_timeout: Duration,
}

impl Default for TransferSettings {
    fn default() -> Self {
        Self {
            imgpkg: PathBuf::from("imgpkg"),
            retry_count: DEFAULT_RETRY_COUNT,
            response_header_timeout: DEFAULT_RESPONSE_HEADER_TIMEOUT,
        }
    }
}

/// Parse a duration such as "30s", "2m", "1h 30m", "500ms" or a bare number of seconds
pub fn parse_duration(value: &str) -> Result<Duration> {
    let trimmed = value.trim();
    if !trimmed.is_empty() && trimmed.bytes().all(|b| b.is_ascii_digit()) {
        let secs = trimmed
            .parse()
            .map_err(|_| Error::invalid_setting("duration", value))?;
        return Ok(Duration::from_secs(secs));
    }
    humantime::parse_duration(trimmed)
        .map_err(|e| Error::invalid_setting("duration", format!("{}: {}", value, e)))
}

/// Render a duration the way Go's flag parser expects it
pub fn format_duration(duration: Duration) -> String {
    if duration.subsec_millis() == 0 {
        format!("{}s", duration.as_secs())
    } else {
        format!("{}ms", duration.as_millis())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = TransferSettings::default();
        assert_eq!(settings.retry_count, 5);
        assert_eq!(settings.response_header_timeout, Duration::from_secs(30));
        assert_eq!(settings.imgpkg, PathBuf::from("imgpkg"));
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("30s").unwrap(), Duration::from_secs(30));
        assert_eq!(parse_duration("45").unwrap(), Duration::from_secs(45));
        assert_eq!(parse_duration("2m").unwrap(), Duration::from_secs(120));
        assert_eq!(parse_duration("1h").unwrap(), Duration::from_secs(3600));
        assert_eq!(parse_duration("250ms").unwrap(), Duration::from_millis(250));
        assert_eq!(parse_duration(" 10s ").unwrap(), Duration::from_secs(10));
        assert_eq!(parse_duration("1h 30m").unwrap(), Duration::from_secs(5400));
    }

    #[test]
    fn test_parse_duration_invalid() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("s").is_err());
        assert!(parse_duration("10x").is_err());
        assert!(parse_duration("soon").is_err());
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_secs(30)), "30s");
        assert_eq!(format_duration(Duration::from_millis(1500)), "1500ms");
    }
}
