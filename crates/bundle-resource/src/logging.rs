//! Tracing setup for the resource binaries

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Environment variable holding an `EnvFilter` directive, e.g. `bundle_image=trace`
pub const LOG_ENV: &str = "BUNDLE_RESOURCE_LOG";

/// Initialize tracing on stderr; stdout is reserved for the protocol response
///
/// `-q` and `-v` take precedence over [`LOG_ENV`], which takes precedence
/// over the default `info` level.
pub fn init_tracing(verbose: u8, quiet: bool) {
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(filter(verbose, quiet))
        .init();
}

fn filter(verbose: u8, quiet: bool) -> EnvFilter {
    if quiet {
        return EnvFilter::new("error");
    }
    match verbose {
        0 => EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_environment() {
        assert_eq!(filter(0, true).to_string(), "error");
        assert_eq!(filter(1, false).to_string(), "debug");
        assert_eq!(filter(3, false).to_string(), "trace");
    }
}
