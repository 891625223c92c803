//! JSON over stdio

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::{Read, Write};

/// Decode one request; unknown fields are rejected by the request types
pub fn read_request<T, R>(input: R) -> bundle_core::Result<T>
where
    T: DeserializeOwned,
    R: Read,
{
    Ok(serde_json::from_reader(input)?)
}

/// Encode a response followed by a newline
pub fn write_response<T, W>(mut output: W, response: &T) -> bundle_core::Result<()>
where
    T: Serialize,
    W: Write,
{
    serde_json::to_writer(&mut output, response)?;
    output.write_all(b"\n")?;
    output.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bundle_core::{CheckRequest, Version};

    #[test]
    fn test_read_check_request() {
        let input = br#"{"source":{"repository":"ghcr.io/org/bundle"},"version":{"tag":"1.0.0","digest":"sha256:abc"}}"#;
        let request: CheckRequest = read_request(&input[..]).unwrap();
        assert_eq!(request.source.repository, "ghcr.io/org/bundle");
        assert_eq!(request.version, Some(Version::new("1.0.0", "sha256:abc")));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let input = br#"{"source":{"repository":"ghcr.io/org/bundle","colour":"blue"}}"#;
        let err = read_request::<CheckRequest, _>(&input[..]).unwrap_err();
        assert!(err.to_string().contains("colour"));
    }

    #[test]
    fn test_write_response() {
        let mut out = Vec::new();
        write_response(&mut out, &[Version::new("1.0.0", "sha256:abc")]).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "[{\"tag\":\"1.0.0\",\"digest\":\"sha256:abc\"}]\n"
        );
    }
}
