use bundle_core::{Error, Result};
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

/// Registry assumed when a repository name has no host component
pub const DEFAULT_REGISTRY: &str = "index.docker.io";

static PATH_COMPONENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9]+(?:(?:[._]|__|-+)[a-z0-9]+)*$").expect("path regex is valid")
});

static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\w][\w.-]{0,127}$").expect("tag regex is valid"));

static DIGEST_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9]+(?:[.+_-][a-z0-9]+)*:[a-fA-F0-9]{32,}$").expect("digest regex is valid")
});

/// An addressable repository: registry host plus repository path
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Repository {
    registry: String,
    path: String,
    insecure: bool,
}

impl Repository {
    /// Parse a repository name like "ghcr.io/org/bundle" or "ubuntu"
    ///
    /// `insecure` allows plaintext HTTP to the registry.
    pub fn parse(name: &str, insecure: bool) -> Result<Self> {
        if name.is_empty() {
            return Err(Error::invalid_repository(name, "repository name is empty"));
        }

        let (registry, path) = match name.split_once('/') {
            Some((first, rest)) if looks_like_registry(first) => (first.to_string(), rest),
            _ => (DEFAULT_REGISTRY.to_string(), name),
        };

        let registry = if registry == "docker.io" {
            DEFAULT_REGISTRY.to_string()
        } else {
            registry
        };

        // Official Docker Hub images live under library/
        let path = if registry == DEFAULT_REGISTRY && !path.contains('/') {
            format!("library/{}", path)
        } else {
            path.to_string()
        };

        for component in path.split('/') {
            if !PATH_COMPONENT_RE.is_match(component) {
                return Err(Error::invalid_repository(
                    name,
                    format!("invalid path component '{}'", component),
                ));
            }
        }

        Ok(Self {
            registry,
            path,
            insecure,
        })
    }

    /// Registry host, possibly with a port
    pub fn registry(&self) -> &str {
        &self.registry
    }

    /// Repository path within the registry
    pub fn path(&self) -> &str {
        &self.path
    }

    /// URL scheme for this registry
    pub fn scheme(&self) -> &'static str {
        let host = self.registry.split(':').next().unwrap_or_default();
        if self.insecure || host == "localhost" || host == "127.0.0.1" {
            "http"
        } else {
            "https"
        }
    }

    /// Base URL of the registry API, e.g. "https://ghcr.io"
    pub fn base_url(&self) -> String {
        format!("{}://{}", self.scheme(), self.registry)
    }

    /// Token scope for an action such as "pull"
    pub fn scope(&self, action: &str) -> String {
        format!("repository:{}:{}", self.path, action)
    }

    /// Reference a tag in this repository
    pub fn tag(&self, tag: impl Into<String>) -> Reference {
        Reference {
            repository: self.clone(),
            kind: ReferenceKind::Tag(tag.into()),
        }
    }

    /// Reference a digest in this repository
    pub fn digest(&self, digest: impl Into<String>) -> Reference {
        Reference {
            repository: self.clone(),
            kind: ReferenceKind::Digest(digest.into()),
        }
    }
}

impl fmt::Display for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.registry, self.path)
    }
}

fn looks_like_registry(component: &str) -> bool {
    component.contains('.') || component.contains(':') || component == "localhost"
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ReferenceKind {
    Tag(String),
    Digest(String),
}

/// A tag or digest within a repository
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Reference {
    repository: Repository,
    kind: ReferenceKind,
}

impl Reference {
    /// Parse "repo:tag" or "repo@digest"; a bare repository means tag "latest"
    pub fn parse(s: &str, insecure: bool) -> Result<Self> {
        if let Some((repo, digest)) = s.split_once('@') {
            let repository = Repository::parse(repo, insecure)?;
            if !DIGEST_RE.is_match(digest) {
                return Err(Error::invalid_reference(s, "malformed digest"));
            }
            return Ok(repository.digest(digest));
        }

        // A colon after the last slash separates the tag; earlier ones are ports
        let last_slash = s.rfind('/').map(|i| i + 1).unwrap_or(0);
        let (repo, tag) = match s[last_slash..].rfind(':') {
            Some(idx) => (&s[..last_slash + idx], &s[last_slash + idx + 1..]),
            None => (s, bundle_core::DEFAULT_TAG),
        };

        if !TAG_RE.is_match(tag) {
            return Err(Error::invalid_reference(s, "malformed tag"));
        }
        Ok(Repository::parse(repo, insecure)?.tag(tag))
    }

    pub fn repository(&self) -> &Repository {
        &self.repository
    }

    /// The tag or digest string used in registry API paths
    pub fn identifier(&self) -> &str {
        match &self.kind {
            ReferenceKind::Tag(tag) => tag,
            ReferenceKind::Digest(digest) => digest,
        }
    }

    pub fn tag_str(&self) -> Option<&str> {
        match &self.kind {
            ReferenceKind::Tag(tag) => Some(tag),
            ReferenceKind::Digest(_) => None,
        }
    }

    pub fn digest_str(&self) -> Option<&str> {
        match &self.kind {
            ReferenceKind::Digest(digest) => Some(digest),
            ReferenceKind::Tag(_) => None,
        }
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ReferenceKind::Tag(tag) => write!(f, "{}:{}", self.repository, tag),
            ReferenceKind::Digest(digest) => write!(f, "{}@{}", self.repository, digest),
        }
    }
}
