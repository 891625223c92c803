//! Common test infrastructure for bundle-resource tests

#![allow(dead_code)]

use std::path::{Path, PathBuf};

pub const DIGEST_A: &str = "sha256:aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
pub const DIGEST_B: &str = "sha256:bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";

/// Write an executable `imgpkg` script that logs its arguments to `imgpkg.log`
///
/// `pull` creates the `-o` directory; `push` reports `pushed` as the pushed reference.
#[cfg(unix)]
pub fn create_fake_imgpkg(dir: &Path, pushed: &str, exit_code: i32) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let script_path = dir.join("imgpkg");
    let script = format!(
        r#"#!/bin/sh
echo "$*" >> "{log}"
case "$1" in
  pull)
    while [ $# -gt 0 ]; do
      [ "$1" = "-o" ] && mkdir -p "$2" && echo "name: bundle" > "$2/bundle.yml"
      shift
    done
    ;;
  push)
    echo "Pushed '{pushed}'"
    ;;
esac
exit {exit_code}
"#,
        log = dir.join("imgpkg.log").display(),
        pushed = pushed,
        exit_code = exit_code,
    );

    std::fs::write(&script_path, script).unwrap();
    std::fs::set_permissions(&script_path, std::fs::Permissions::from_mode(0o755)).unwrap();
    script_path
}
