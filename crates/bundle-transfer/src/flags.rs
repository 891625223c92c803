//! Registry flags shared by `imgpkg pull` and `imgpkg push`

use bundle_core::{format_duration, Source, TransferSettings};
use bundle_image::Credentials;
use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::NamedTempFile;
use tracing::debug;

pub const USERNAME_ENV: &str = "IMGPKG_USERNAME";
pub const PASSWORD_ENV: &str = "IMGPKG_PASSWORD";

/// Custom certificate authorities written out for imgpkg to read
///
/// The files are removed when this value is dropped, so it must outlive the
/// child process.
#[derive(Debug, Default)]
pub struct CaCertFiles {
    files: Vec<NamedTempFile>,
}

impl CaCertFiles {
    /// Write one temporary file per PEM certificate
    pub fn write(certs: &[String]) -> std::io::Result<Self> {
        let mut files = Vec::with_capacity(certs.len());
        for cert in certs {
            let mut file = tempfile::Builder::new()
                .prefix("bundle-resource-ca-")
                .suffix(".pem")
                .tempfile()?;
            file.write_all(cert.as_bytes())?;
            file.flush()?;
            debug!("Wrote CA certificate to {}", file.path().display());
            files.push(file);
        }
        Ok(Self { files })
    }

    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.files.iter().map(|f| f.path())
    }
}

/// Registry connection options for one imgpkg invocation
#[derive(Debug, Clone)]
pub struct RegistryFlags {
    pub ca_cert_paths: Vec<PathBuf>,
    pub verify_certs: bool,
    pub insecure: bool,
    pub credentials: Option<Credentials>,
    pub retry_count: u32,
    pub response_header_timeout: Duration,
}

impl RegistryFlags {
    pub fn new(source: &Source, certs: &CaCertFiles, settings: &TransferSettings) -> Self {
        Self {
            ca_cert_paths: certs.paths().map(Path::to_path_buf).collect(),
            verify_certs: true,
            insecure: source.insecure,
            credentials: source
                .credentials()
                .map(|(username, password)| Credentials::new(username, password)),
            retry_count: settings.retry_count,
            response_header_timeout: settings.response_header_timeout,
        }
    }

    /// Command-line arguments; credentials travel in [`RegistryFlags::env`] instead
    pub fn args(&self) -> Vec<OsString> {
        let mut args = Vec::new();
        for path in &self.ca_cert_paths {
            args.push(OsString::from("--registry-ca-cert-path"));
            args.push(path.clone().into_os_string());
        }
        args.push(format!("--registry-verify-certs={}", self.verify_certs).into());
        args.push(format!("--registry-insecure={}", self.insecure).into());
        args.push("--registry-retry-count".into());
        args.push(self.retry_count.to_string().into());
        args.push("--registry-response-header-timeout".into());
        args.push(format_duration(self.response_header_timeout).into());
        args
    }

    /// Environment variables for the child process
    pub fn env(&self) -> Vec<(&'static str, String)> {
        match &self.credentials {
            Some(creds) => vec![
                (USERNAME_ENV, creds.username.clone()),
                (PASSWORD_ENV, creds.password.clone()),
            ],
            None => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args_of(flags: &RegistryFlags) -> Vec<String> {
        flags
            .args()
            .into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_default_args() {
        let flags = RegistryFlags::new(
            &Source::new("ghcr.io/org/bundle"),
            &CaCertFiles::default(),
            &TransferSettings::default(),
        );
        assert_eq!(
            args_of(&flags),
            vec![
                "--registry-verify-certs=true",
                "--registry-insecure=false",
                "--registry-retry-count",
                "5",
                "--registry-response-header-timeout",
                "30s",
            ]
        );
        assert!(flags.env().is_empty());
    }

    #[test]
    fn test_cert_paths_and_insecure() {
        let certs = CaCertFiles::write(&["cert-one".to_string(), "cert-two".to_string()]).unwrap();
        let mut source = Source::new("localhost:5000/bundle");
        source.insecure = true;

        let flags = RegistryFlags::new(&source, &certs, &TransferSettings::default());
        let args = args_of(&flags);

        assert_eq!(args.iter().filter(|a| *a == "--registry-ca-cert-path").count(), 2);
        assert!(args.contains(&"--registry-insecure=true".to_string()));

        let written: Vec<String> = certs
            .paths()
            .map(|p| std::fs::read_to_string(p).unwrap())
            .collect();
        assert_eq!(written, vec!["cert-one", "cert-two"]);
    }

    #[test]
    fn test_cert_files_removed_on_drop() {
        let certs = CaCertFiles::write(&["cert".to_string()]).unwrap();
        let path = certs.paths().next().unwrap().to_path_buf();
        assert!(path.exists());
        drop(certs);
        assert!(!path.exists());
    }

    #[test]
    fn test_credentials_only_in_env() {
        let mut source = Source::new("ghcr.io/org/bundle");
        source.username = Some("robot".to_string());
        source.password = Some("s3cret".to_string());

        let flags = RegistryFlags::new(&source, &CaCertFiles::default(), &TransferSettings::default());
        assert!(!args_of(&flags).iter().any(|a| a.contains("s3cret")));
        assert_eq!(
            flags.env(),
            vec![
                (USERNAME_ENV, "robot".to_string()),
                (PASSWORD_ENV, "s3cret".to_string()),
            ]
        );
    }

    #[test]
    fn test_partial_credentials_ignored() {
        let mut source = Source::new("ghcr.io/org/bundle");
        source.username = Some("robot".to_string());

        let flags = RegistryFlags::new(&source, &CaCertFiles::default(), &TransferSettings::default());
        assert!(flags.env().is_empty());
    }
}
