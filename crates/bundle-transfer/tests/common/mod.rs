//! Common test infrastructure for bundle-transfer tests
//!
//! Two kinds of fake delegate:
//! - [`FakeTransfer`], an in-process [`BundleTransfer`] that records calls
//! - [`create_fake_imgpkg`], a shell script standing in for the imgpkg binary

#![allow(dead_code)]

use async_trait::async_trait;
use bundle_transfer::{BundleTransfer, DelegateError, RegistryFlags};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub const REPOSITORY: &str = "registry.example.com/team/bundle";
pub const DIGEST: &str = "sha256:9b2c4e6f8a0b1c3d5e7f9a1b3c5d7e9f0a2b4c6d8e0f1a3b5c7d9e1f3a5b7c9d";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferCall {
    pub action: &'static str,
    pub bundle: String,
    pub path: PathBuf,
    pub args: Vec<String>,
    pub env: Vec<(&'static str, String)>,
}

/// Records every pull and push; pulls write a single file into the output dir
#[derive(Default)]
pub struct FakeTransfer {
    failure: Option<fn() -> DelegateError>,
    calls: Mutex<Vec<TransferCall>>,
}

impl FakeTransfer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every call with the error `make` builds
    pub fn failing(make: fn() -> DelegateError) -> Self {
        Self {
            failure: Some(make),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<TransferCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, action: &'static str, bundle: &str, path: &Path, flags: &RegistryFlags) {
        self.calls.lock().unwrap().push(TransferCall {
            action,
            bundle: bundle.to_string(),
            path: path.to_path_buf(),
            args: flags
                .args()
                .into_iter()
                .map(|a| a.to_string_lossy().into_owned())
                .collect(),
            env: flags.env(),
        });
    }
}

#[async_trait]
impl BundleTransfer for FakeTransfer {
    async fn pull(
        &self,
        bundle: &str,
        output: &Path,
        flags: &RegistryFlags,
    ) -> Result<(), DelegateError> {
        self.record("pull", bundle, output, flags);
        if let Some(make) = self.failure {
            return Err(make());
        }
        std::fs::create_dir_all(output)?;
        std::fs::write(output.join("bundle.yml"), "name: bundle")?;
        Ok(())
    }

    async fn push(
        &self,
        bundle: &str,
        file: &Path,
        flags: &RegistryFlags,
    ) -> Result<String, DelegateError> {
        self.record("push", bundle, file, flags);
        if let Some(make) = self.failure {
            return Err(make());
        }
        Ok(DIGEST.to_string())
    }
}

/// Write an executable `imgpkg` script into `dir`
///
/// The script appends its arguments and the IMGPKG_USERNAME it saw to
/// `imgpkg.log`. `pull` creates the `-o` directory; `push` prints
/// `pushed_line` to stderr between two stdout lines. It exits with `exit_code`.
#[cfg(unix)]
pub fn create_fake_imgpkg(dir: &Path, pushed_line: &str, exit_code: i32) -> PathBuf {
    let push = format!(
        "echo \"dir: .\"\n    echo \"{}\" >&2\n    echo \"Succeeded\"",
        pushed_line
    );
    create_fake_imgpkg_with_push(dir, &push, exit_code)
}

/// Like [`create_fake_imgpkg`], with `push_body` as the shell run for `push`
#[cfg(unix)]
pub fn create_fake_imgpkg_with_push(dir: &Path, push_body: &str, exit_code: i32) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let script_path = dir.join("imgpkg");
    let log_path = dir.join("imgpkg.log");

    let script = format!(
        r#"#!/bin/sh
echo "$*" >> "{log}"
echo "user=${{IMGPKG_USERNAME:-}}" >> "{log}"
case "$1" in
  pull)
    while [ $# -gt 0 ]; do
      if [ "$1" = "-o" ]; then
        mkdir -p "$2"
        echo "name: bundle" > "$2/bundle.yml"
      fi
      shift
    done
    echo "Pulling bundle" >&2
    ;;
  push)
    {push}
    ;;
esac
exit {exit_code}
"#,
        log = log_path.display(),
        push = push_body,
        exit_code = exit_code,
    );

    std::fs::write(&script_path, script).unwrap();
    std::fs::set_permissions(&script_path, std::fs::Permissions::from_mode(0o755)).unwrap();
    script_path
}

pub fn read_log(dir: &Path) -> String {
    std::fs::read_to_string(dir.join("imgpkg.log")).unwrap_or_default()
}
