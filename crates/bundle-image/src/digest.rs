//! Digest resolution: cheap probe first, full manifest fetch as fallback

use crate::error::RegistryResult;
use crate::reference::Reference;
use crate::registry::Registry;
use tracing::debug;

/// Resolve the current digest of a tag or digest reference
///
/// Returns `Ok(None)` when the reference does not exist, which is expected
/// for tags deleted between listing and resolution. Not every registry
/// answers a `HEAD` for every reference type, so any other probe failure
/// falls back to a full `GET`; only a failure of that fallback is an error.
pub async fn head_or_get<R>(registry: &R, reference: &Reference) -> RegistryResult<Option<String>>
where
    R: Registry + ?Sized,
{
    let probe_err = match registry.head_manifest(reference).await {
        Ok(descriptor) => return Ok(Some(descriptor.digest)),
        Err(err) if err.is_not_found() => {
            debug!("Reference not found: {}", reference);
            return Ok(None);
        }
        Err(err) => err,
    };

    debug!(
        "Manifest probe failed for {} ({}), falling back to full fetch",
        reference, probe_err
    );

    match registry.get_manifest(reference).await {
        Ok(descriptor) => Ok(Some(descriptor.digest)),
        Err(err) if err.is_not_found() => {
            debug!("Reference not found: {}", reference);
            Ok(None)
        }
        Err(err) => Err(err),
    }
}
