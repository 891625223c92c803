//! Fetch a bundle version into a destination directory

use crate::error::TransferError;
use crate::flags::{CaCertFiles, RegistryFlags};
use crate::imgpkg::BundleTransfer;
use bundle_core::{InRequest, InResponse, TransferSettings, Version};
use bundle_image::Reference;
use std::path::Path;
use tracing::debug;

/// Subdirectory of the destination that receives the bundle contents
pub const OUTPUT_DIR: &str = "output";

/// Pull `request.version` into `<dest>/output` and record it beside the contents
pub async fn run_get<T>(
    transfer: &T,
    request: &InRequest,
    dest: &Path,
    settings: &TransferSettings,
) -> Result<InResponse, TransferError>
where
    T: BundleTransfer + ?Sized,
{
    let source = &request.source;
    let bundle = format!("{}@{}", source.repository, request.version.digest);
    Reference::parse(&bundle, source.insecure)?;

    let certs = CaCertFiles::write(&source.ca_certs).map_err(TransferError::WriteCaCerts)?;
    let flags = RegistryFlags::new(source, &certs, settings);

    transfer
        .pull(&bundle, &dest.join(OUTPUT_DIR), &flags)
        .await
        .map_err(TransferError::Pull)?;

    save_version_info(dest, &request.version, &source.repository)
        .await
        .map_err(TransferError::SaveVersionInfo)?;

    Ok(InResponse {
        version: request.version.clone(),
    })
}

/// Write `tag`, `digest` and `repository` files, without trailing newlines
async fn save_version_info(dest: &Path, version: &Version, repository: &str) -> std::io::Result<()> {
    debug!("Saving version info to {}", dest.display());
    tokio::fs::write(dest.join("tag"), &version.tag).await?;
    tokio::fs::write(dest.join("digest"), &version.digest).await?;
    tokio::fs::write(dest.join("repository"), repository).await?;
    Ok(())
}
