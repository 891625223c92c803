//! Publish a file or directory as a new bundle version

use crate::error::TransferError;
use crate::flags::{CaCertFiles, RegistryFlags};
use crate::imgpkg::BundleTransfer;
use bundle_core::{OutRequest, OutResponse, TransferSettings, Version};
use bundle_image::Reference;
use std::path::Path;
use tracing::info;

/// Push `<workdir>/<params.path>` to the repository and report the new version
///
/// The tag comes from `params.tag`, then `source.tag`, then `latest`.
pub async fn run_put<T>(
    transfer: &T,
    request: &OutRequest,
    workdir: &Path,
    settings: &TransferSettings,
) -> Result<OutResponse, TransferError>
where
    T: BundleTransfer + ?Sized,
{
    if request.params.path.is_empty() {
        return Err(bundle_core::Error::missing_field("params.path").into());
    }

    let source = &request.source;
    let tag = request.push_tag();
    let bundle = format!("{}:{}", source.repository, tag);
    Reference::parse(&bundle, source.insecure)?;

    let certs = CaCertFiles::write(&source.ca_certs).map_err(TransferError::WriteCaCerts)?;
    let flags = RegistryFlags::new(source, &certs, settings);

    let digest = transfer
        .push(&bundle, &workdir.join(&request.params.path), &flags)
        .await
        .map_err(TransferError::Push)?;

    info!("Published {}@{}", bundle, digest);
    Ok(OutResponse {
        version: Version::new(tag, digest),
    })
}
