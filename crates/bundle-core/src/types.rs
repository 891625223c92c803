//! Pipeline protocol payloads
//!
//! Every object rejects unknown fields: a typo in a pipeline's `source:`
//! block fails the step instead of being silently ignored.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Tag used when neither the publish params nor the source pin one
pub const DEFAULT_TAG: &str = "latest";

/// Repository location and access configuration, immutable per invocation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Source {
    /// Repository name, e.g. "registry.example.com/team/bundle"
    pub repository: String,

    /// Fixed tag to track instead of the whole repository
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,

    /// Prerelease inclusion flag (accepted for compatibility)
    #[serde(default)]
    pub prereleases: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Allow plaintext HTTP to the registry
    #[serde(default)]
    pub insecure: bool,

    /// Additional trusted certificate authorities, PEM encoded
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ca_certs: Vec<String>,
}

impl Source {
    /// Create a source for a repository with every other option at its default
    pub fn new(repository: impl Into<String>) -> Self {
        Self {
            repository: repository.into(),
            ..Default::default()
        }
    }

    /// Pin the source to a fixed tag
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// The fixed tag, treating an empty string the same as an absent one
    pub fn fixed_tag(&self) -> Option<&str> {
        self.tag.as_deref().filter(|t| !t.is_empty())
    }

    /// Basic-auth credentials, only when both halves are non-empty
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (self.username.as_deref(), self.password.as_deref()) {
            (Some(user), Some(pass)) if !user.is_empty() && !pass.is_empty() => Some((user, pass)),
            _ => None,
        }
    }
}

/// One resolvable state of the repository
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Version {
    pub tag: String,
    pub digest: String,
}

impl Version {
    pub fn new(tag: impl Into<String>, digest: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            digest: digest.into(),
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.tag, self.digest)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CheckRequest {
    pub source: Source,
    #[serde(default)]
    pub version: Option<Version>,
}

/// Ordered list of versions, oldest first
pub type CheckResponse = Vec<Version>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InRequest {
    pub source: Source,
    #[serde(default)]
    pub params: InParams,
    pub version: Version,
}

/// The fetch step takes no parameters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InParams {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InResponse {
    pub version: Version,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutRequest {
    pub source: Source,
    pub params: OutParams,
}

impl OutRequest {
    /// Tag to publish under: params, then source, then [`DEFAULT_TAG`]
    pub fn push_tag(&self) -> &str {
        self.params
            .tag
            .as_deref()
            .filter(|t| !t.is_empty())
            .or_else(|| self.source.fixed_tag())
            .unwrap_or(DEFAULT_TAG)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    /// Bundle location relative to the step's working directory
    #[serde(default)]
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutResponse {
    pub version: Version,
}
