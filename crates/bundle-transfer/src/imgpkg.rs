//! Bundle transfers through the imgpkg CLI
//!
//! imgpkg writes its progress to both stdout and stderr. Both streams are
//! forwarded line by line to our stderr, since stdout carries the pipeline
//! protocol response. On push the same lines also feed the digest scraper.

use crate::error::DelegateError;
use crate::flags::RegistryFlags;
use crate::scrape::scrape_pushed_digest;
use async_trait::async_trait;
use bundle_core::TransferSettings;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc::{self, UnboundedSender};
use tracing::{debug, info, warn};

/// Moves bundles between a registry and the local filesystem
#[async_trait]
pub trait BundleTransfer: Send + Sync {
    /// Pull `bundle` (a `repo@digest` reference) into the `output` directory
    async fn pull(
        &self,
        bundle: &str,
        output: &Path,
        flags: &RegistryFlags,
    ) -> Result<(), DelegateError>;

    /// Push `file` as `bundle` (a `repo:tag` reference), returning the pushed digest
    async fn push(
        &self,
        bundle: &str,
        file: &Path,
        flags: &RegistryFlags,
    ) -> Result<String, DelegateError>;
}

/// [`BundleTransfer`] backed by the imgpkg binary
#[derive(Debug, Clone)]
pub struct ImgpkgCli {
    program: PathBuf,
}

impl ImgpkgCli {
    /// Use `program` as-is, without checking that it exists
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Resolve the configured imgpkg binary, searching PATH for bare names
    pub fn locate(settings: &TransferSettings) -> Result<Self, DelegateError> {
        let program =
            which::which(&settings.imgpkg).map_err(|source| DelegateError::NotFound {
                program: settings.imgpkg.display().to_string(),
                source,
            })?;
        debug!("Using imgpkg at {}", program.display());
        Ok(Self::new(program))
    }

    fn command<I, S>(&self, args: I, flags: &RegistryFlags) -> Command
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut cmd = Command::new(&self.program);
        cmd.args(args)
            .args(flags.args())
            .envs(flags.env())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }

    /// Run to completion with output forwarded; `lines` also receives every line
    async fn run(
        &self,
        mut cmd: Command,
        action: &'static str,
        lines: UnboundedSender<String>,
    ) -> Result<(), DelegateError> {
        let mut child = cmd.spawn().map_err(|source| DelegateError::Spawn {
            program: self.program.display().to_string(),
            source,
        })?;

        let mut forwarders = Vec::new();
        if let Some(stdout) = child.stdout.take() {
            forwarders.push(tokio::spawn(forward_lines(stdout, lines.clone())));
        }
        if let Some(stderr) = child.stderr.take() {
            forwarders.push(tokio::spawn(forward_lines(stderr, lines.clone())));
        }
        // the scraper sees end-of-stream once both forwarders finish
        drop(lines);

        let status = child.wait().await?;
        for forwarder in forwarders {
            if let Err(e) = forwarder.await {
                warn!("imgpkg output forwarder failed: {}", e);
            }
        }

        if !status.success() {
            return Err(DelegateError::NonZeroExit { action, status });
        }
        Ok(())
    }
}

#[async_trait]
impl BundleTransfer for ImgpkgCli {
    async fn pull(
        &self,
        bundle: &str,
        output: &Path,
        flags: &RegistryFlags,
    ) -> Result<(), DelegateError> {
        info!("Pulling {} into {}", bundle, output.display());
        let cmd = self.command(
            [
                OsStr::new("pull"),
                OsStr::new("-b"),
                OsStr::new(bundle),
                OsStr::new("-o"),
                output.as_os_str(),
            ],
            flags,
        );

        // nothing scrapes a pull, so lines are only forwarded
        let (tx, _) = mpsc::unbounded_channel();
        self.run(cmd, "pull", tx).await
    }

    async fn push(
        &self,
        bundle: &str,
        file: &Path,
        flags: &RegistryFlags,
    ) -> Result<String, DelegateError> {
        info!("Pushing {} as {}", file.display(), bundle);
        let cmd = self.command(
            [
                OsStr::new("push"),
                OsStr::new("-b"),
                OsStr::new(bundle),
                OsStr::new("-f"),
                file.as_os_str(),
            ],
            flags,
        );

        let (tx, rx) = mpsc::unbounded_channel();
        let (status, digest) = tokio::join!(self.run(cmd, "push", tx), scrape_pushed_digest(rx));

        // a failed push outranks whatever the scraper made of its output
        status?;
        digest
    }
}

async fn forward_lines<R>(reader: R, lines: UnboundedSender<String>)
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                // imgpkg echoes file names, which need not be UTF-8
                let line = String::from_utf8_lossy(&buf)
                    .trim_end_matches(['\n', '\r'])
                    .to_string();
                eprintln!("{}", line);
                // the receiver is gone once the scraper has its match
                let _ = lines.send(line);
            }
            Err(e) => {
                warn!("Failed to read imgpkg output: {}", e);
                break;
            }
        }
    }
}
