//! Recover the pushed digest from imgpkg's output

use crate::error::DelegateError;
use bundle_image::Reference;
use regex::Regex;
use std::sync::LazyLock;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::debug;

static PUSHED_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Pushed '(.+)'").expect("pushed pattern is valid"));

/// The reference in a `Pushed '<reference>'` line, if this is one
pub fn pushed_reference(line: &str) -> Option<&str> {
    PUSHED_PATTERN
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Digest of a pushed reference such as `registry/repo@sha256:...`
pub fn pushed_digest(reference: &str) -> Result<String, DelegateError> {
    let invalid = |source| DelegateError::InvalidPushedReference {
        reference: reference.to_string(),
        source,
    };

    let parsed = Reference::parse(reference, false).map_err(invalid)?;
    parsed.digest_str().map(String::from).ok_or_else(|| {
        invalid(bundle_core::Error::invalid_reference(
            reference,
            "not a digest reference",
        ))
    })
}

/// Read output lines until one reports the pushed reference
///
/// Finishes when a match is found or every sender has hung up; the latter
/// means imgpkg never reported a digest.
pub async fn scrape_pushed_digest(
    mut lines: UnboundedReceiver<String>,
) -> Result<String, DelegateError> {
    while let Some(line) = lines.recv().await {
        if let Some(reference) = pushed_reference(&line) {
            debug!("imgpkg pushed {}", reference);
            return pushed_digest(reference);
        }
    }
    Err(DelegateError::DigestNotReported)
}
