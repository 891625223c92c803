use crate::digest::head_or_get;
use crate::error::CheckError;
use crate::reference::{Reference, Repository};
use crate::registry::{Registry, RegistryClient, RegistryClientBuilder, DEFAULT_TIMEOUT};
use crate::version::{ParsedVersion, TagClass, VersionFilter};
use bundle_core::{CheckRequest, CheckResponse, Source, Version};
use semver::VersionReq;
use std::cmp::Ordering;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, trace};

/// A tag whose digest has been resolved and whose name parsed as a version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagVersion {
    pub tag_name: String,
    pub digest: String,
    pub version: ParsedVersion,
}

/// Works out which versions of a repository are new since the caller's last one
pub struct CheckEngine<R> {
    registry: R,
    filter: VersionFilter,
}

impl CheckEngine<RegistryClient> {
    /// Create an engine talking to the registry described by `source`
    pub fn for_source(source: &Source) -> Result<Self, CheckError> {
        let client = RegistryClient::for_source(source).map_err(CheckError::InitializeTransport)?;
        Ok(Self::new(client))
    }
}

impl<R: Registry> CheckEngine<R> {
    pub fn new(registry: R) -> Self {
        Self {
            registry,
            filter: VersionFilter::new(),
        }
    }

    /// Only report versions inside `constraint`; the alias tag is then never reported
    pub fn with_constraint(mut self, constraint: VersionReq) -> Self {
        self.filter = self.filter.with_constraint(constraint);
        self
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }

    pub fn into_registry(self) -> R {
        self.registry
    }

    /// Run a check for `source`, starting after `from` when given
    pub async fn check(
        &self,
        source: &Source,
        from: Option<&Version>,
    ) -> Result<CheckResponse, CheckError> {
        let repository = Repository::parse(&source.repository, source.insecure)
            .map_err(CheckError::ResolveRepository)?;

        match source.fixed_tag() {
            Some(tag) => self.check_tag(&repository.tag(tag), from).await,
            None => self.check_repository(&repository, from).await,
        }
    }

    /// Every version of the repository newer than `from`, oldest first
    pub async fn check_repository(
        &self,
        repository: &Repository,
        from: Option<&Version>,
    ) -> Result<CheckResponse, CheckError> {
        debug!("Checking repository {}", repository);

        let mut tags = self
            .registry
            .list_tags(repository)
            .await
            .map_err(CheckError::ListTags)?;

        trace!("Found {} tags total", tags.len());

        if let Some(from) = from {
            // assess the 'from' tag first so the cursor exists before any
            // tag that could be skipped because of it
            tags.sort_by_key(|tag| tag != &from.tag);
        }

        let mut cursor: Option<ParsedVersion> = None;
        let mut alias_tag: Option<String> = None;
        let mut resolved: Vec<TagVersion> = Vec::new();

        for tag in tags {
            let version = match self.filter.classify(&tag) {
                TagClass::Alias => {
                    alias_tag = Some(tag);
                    continue;
                }
                TagClass::Ignored => continue,
                TagClass::Version(version) => version,
            };

            if cursor.as_ref().is_some_and(|c| *c >= version) {
                // lesser (or equal but less specific, i.e. 6.3 vs 6.3.0)
                // versions were already reported
                trace!("Skipping tag at or below cursor: {}", tag);
                continue;
            }

            let Some(digest) = head_or_get(&self.registry, &repository.tag(tag.as_str()))
                .await
                .map_err(CheckError::TagDigest)?
            else {
                continue;
            };

            if let Some(from) = from {
                if tag == from.tag && digest == from.digest {
                    debug!("Using {} as cursor", tag);
                    cursor = Some(version.clone());
                }
            }

            resolved.push(TagVersion {
                tag_name: tag,
                digest,
                version,
            });
        }

        let best = select_representatives(resolved);

        let mut tag_versions: Vec<TagVersion> = best.values().cloned().collect();
        tag_versions.sort_by(compare_tag_versions);

        let mut response: CheckResponse = tag_versions
            .into_iter()
            .map(|tv| Version::new(tv.tag_name, tv.digest))
            .collect();

        if let Some(alias) = alias_tag {
            if !self.filter.has_constraint() {
                let digest = head_or_get(&self.registry, &repository.tag(alias.as_str()))
                    .await
                    .map_err(CheckError::TagDigest)?;

                match digest {
                    Some(digest) if !best.contains_key(&digest) => {
                        response.push(Version::new(alias, digest));
                    }
                    Some(_) => trace!("Alias {} already represented by a version", alias),
                    None => {}
                }
            }
        }

        debug!("Check found {} versions", response.len());
        Ok(response)
    }

    /// The fixed tag's current state, preceded by `from` if it still exists
    pub async fn check_tag(
        &self,
        tag: &Reference,
        from: Option<&Version>,
    ) -> Result<CheckResponse, CheckError> {
        debug!("Checking tag {}", tag);

        let Some(digest) = head_or_get(&self.registry, tag)
            .await
            .map_err(CheckError::RemoteImage)?
        else {
            return Ok(CheckResponse::new());
        };

        let tag_name = tag.identifier().to_string();
        let mut response = CheckResponse::new();

        if let Some(from) = from.filter(|from| from.digest != digest) {
            let previous = tag.repository().digest(from.digest.as_str());
            let found = head_or_get(&self.registry, &previous)
                .await
                .map_err(CheckError::RemoteImage)?;

            if found.is_some() {
                response.push(Version::new(tag_name.as_str(), from.digest.as_str()));
            }
        }

        response.push(Version::new(tag_name, digest));
        Ok(response)
    }
}

/// Run a check request against the registry it names
pub async fn run_check(request: &CheckRequest) -> Result<CheckResponse, CheckError> {
    run_check_with_timeout(request, DEFAULT_TIMEOUT).await
}

/// Like [`run_check`], bounding every registry request by `timeout`
pub async fn run_check_with_timeout(
    request: &CheckRequest,
    timeout: Duration,
) -> Result<CheckResponse, CheckError> {
    // validate the repository before building a client for it
    Repository::parse(&request.source.repository, request.source.insecure)
        .map_err(CheckError::ResolveRepository)?;

    let client = RegistryClientBuilder::from_source(&request.source)
        .timeout(timeout)
        .build()
        .map_err(CheckError::InitializeTransport)?;

    CheckEngine::new(client)
        .check(&request.source, request.version.as_ref())
        .await
}

/// Pick one version label per digest
///
/// A release beats a prerelease; otherwise the more specific tag wins
/// (`3.2.1` over `3.2`, `1.0.0-rc.2` over `1.0.0-rc`); remaining ties keep
/// the entry seen first.
pub fn select_representatives(entries: Vec<TagVersion>) -> BTreeMap<String, TagVersion> {
    entries
        .into_iter()
        .fold(BTreeMap::new(), |mut best, candidate| {
            match best.entry(candidate.digest.clone()) {
                Entry::Vacant(slot) => {
                    slot.insert(candidate);
                }
                Entry::Occupied(mut slot) => {
                    if prefers(&candidate.version, &slot.get().version) {
                        slot.insert(candidate);
                    }
                }
            }
            best
        })
}

fn prefers(candidate: &ParsedVersion, existing: &ParsedVersion) -> bool {
    match (existing.is_prerelease(), candidate.is_prerelease()) {
        (false, true) => false,
        (true, false) => true,
        _ => candidate.specificity() > existing.specificity(),
    }
}

/// Ascending precedence; distinct digests with equal precedence (`1.0` and
/// `1.0.0`) fall back to specificity, then tag name
fn compare_tag_versions(a: &TagVersion, b: &TagVersion) -> Ordering {
    a.version
        .cmp(&b.version)
        .then_with(|| a.version.specificity().cmp(&b.version.specificity()))
        .then_with(|| a.tag_name.cmp(&b.tag_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(tag: &str, digest: &str) -> TagVersion {
        TagVersion {
            tag_name: tag.to_string(),
            digest: digest.to_string(),
            version: ParsedVersion::parse(tag).unwrap(),
        }
    }

    #[test]
    fn test_prefers_release_over_prerelease() {
        let best = select_representatives(vec![entry("2.0.0-rc.1", "d"), entry("2.0.0", "d")]);
        assert_eq!(best["d"].tag_name, "2.0.0");

        let best = select_representatives(vec![entry("2.0.0", "d"), entry("2.0.0-rc.1", "d")]);
        assert_eq!(best["d"].tag_name, "2.0.0");
    }

    #[test]
    fn test_prefers_more_specific_tag() {
        let best = select_representatives(vec![entry("6.3", "d"), entry("6.3.0", "d")]);
        assert_eq!(best["d"].tag_name, "6.3.0");

        let best = select_representatives(vec![entry("6.3.0", "d"), entry("6", "d")]);
        assert_eq!(best["d"].tag_name, "6.3.0");

        let best = select_representatives(vec![entry("1.0.0-rc", "d"), entry("1.0.0-rc.2", "d")]);
        assert_eq!(best["d"].tag_name, "1.0.0-rc.2");
    }

    #[test]
    fn test_equal_specificity_keeps_first() {
        let best = select_representatives(vec![entry("v1.0.0", "d"), entry("1.0.0", "d")]);
        assert_eq!(best["d"].tag_name, "v1.0.0");
    }

    #[test]
    fn test_distinct_digests_kept() {
        let best = select_representatives(vec![entry("1.0.0", "a"), entry("1.1.0", "b")]);
        assert_eq!(best.len(), 2);
    }

    #[test]
    fn test_compare_equal_precedence_is_deterministic() {
        let mut entries = vec![entry("1.0.0", "a"), entry("1.0", "b"), entry("0.9.0", "c")];
        entries.sort_by(compare_tag_versions);
        let tags: Vec<_> = entries.iter().map(|e| e.tag_name.as_str()).collect();
        assert_eq!(tags, vec!["0.9.0", "1.0", "1.0.0"]);
    }
}
