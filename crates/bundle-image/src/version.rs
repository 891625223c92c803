//! Tag classification and semantic-version parsing
//!
//! Registries are full of tags that look like versions but are not releases
//! of the same artifact (`1.2.3-debian11`, `1.2.3-slim`). A tag counts as a
//! version only when it parses leniently as semver and any prerelease suffix
//! is a plain `alpha`/`beta`/`rc` label.

use regex::Regex;
use semver::{BuildMetadata, Prerelease, VersionReq};
use std::cmp::Ordering;
use std::fmt;
use std::sync::LazyLock;
use tracing::trace;

/// Floating alias tag that never takes part in version ordering
pub const ALIAS_TAG: &str = "latest";

/// Prerelease labels treated as genuine prereleases
pub const PRERELEASE_LABELS: [&str; 3] = ["alpha", "beta", "rc"];

static VERSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^v?([0-9]+)(?:\.([0-9]+))?(?:\.([0-9]+))?",
        r"(?:-([0-9A-Za-z-]+(?:\.[0-9A-Za-z-]+)*))?",
        r"(?:\+([0-9A-Za-z-]+(?:\.[0-9A-Za-z-]+)*))?$",
    ))
    .expect("version regex is valid")
});

/// A semantic version parsed from a tag, remembering the exact tag text
///
/// Equality and ordering follow semver precedence only: `6.3` and `6.3.0`
/// compare equal, and build metadata is ignored.
#[derive(Debug, Clone)]
pub struct ParsedVersion {
    version: semver::Version,
    original: String,
}

impl ParsedVersion {
    /// Parse a tag leniently (`v` prefix, missing minor/patch allowed)
    pub fn parse(text: &str) -> Option<Self> {
        let caps = VERSION_RE.captures(text)?;

        let number = |idx: usize| -> Option<u64> {
            match caps.get(idx) {
                Some(m) => m.as_str().parse().ok(),
                None => Some(0),
            }
        };

        let pre = match caps.get(4) {
            Some(m) => Prerelease::new(m.as_str()).ok()?,
            None => Prerelease::EMPTY,
        };
        let build = match caps.get(5) {
            Some(m) => BuildMetadata::new(m.as_str()).ok()?,
            None => BuildMetadata::EMPTY,
        };

        Some(Self {
            version: semver::Version {
                major: number(1)?,
                minor: number(2)?,
                patch: number(3)?,
                pre,
                build,
            },
            original: text.to_string(),
        })
    }

    pub fn major(&self) -> u64 {
        self.version.major
    }

    pub fn minor(&self) -> u64 {
        self.version.minor
    }

    pub fn patch(&self) -> u64 {
        self.version.patch
    }

    /// Prerelease text without the leading `-`, empty for releases
    pub fn prerelease(&self) -> &str {
        self.version.pre.as_str()
    }

    pub fn build(&self) -> &str {
        self.version.build.as_str()
    }

    pub fn is_prerelease(&self) -> bool {
        !self.version.pre.is_empty()
    }

    /// The tag text this version was parsed from
    pub fn original(&self) -> &str {
        &self.original
    }

    /// Number of `.` separators in the original text; `3.2.0` is more specific than `3.2`
    pub fn specificity(&self) -> usize {
        self.original.matches('.').count()
    }

    /// The normalised semver value
    pub fn as_semver(&self) -> &semver::Version {
        &self.version
    }
}

impl PartialEq for ParsedVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ParsedVersion {}

impl PartialOrd for ParsedVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ParsedVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let (a, b) = (&self.version, &other.version);
        a.major
            .cmp(&b.major)
            .then(a.minor.cmp(&b.minor))
            .then(a.patch.cmp(&b.patch))
            // semver's Prerelease ordering puts the empty (release) value last
            .then_with(|| a.pre.cmp(&b.pre))
    }
}

impl fmt::Display for ParsedVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.original)
    }
}

/// Outcome of classifying a single tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagClass {
    /// The floating alias tag
    Alias,
    /// A version that takes part in ordering
    Version(ParsedVersion),
    /// Not a version, an image variant, or outside the active constraint
    Ignored,
}

/// Decides which tags count as versions
#[derive(Debug, Clone, Default)]
pub struct VersionFilter {
    constraint: Option<VersionReq>,
}

impl VersionFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict accepted versions to a range such as ">=2.0.0, <3.0.0"
    pub fn with_constraint(mut self, constraint: VersionReq) -> Self {
        self.constraint = Some(constraint);
        self
    }

    pub fn constraint(&self) -> Option<&VersionReq> {
        self.constraint.as_ref()
    }

    pub fn has_constraint(&self) -> bool {
        self.constraint.is_some()
    }

    pub fn classify(&self, tag: &str) -> TagClass {
        if tag == ALIAS_TAG {
            return TagClass::Alias;
        }

        let Some(version) = ParsedVersion::parse(tag) else {
            trace!("Skipping non-semver tag: {}", tag);
            return TagClass::Ignored;
        };

        if let Some(constraint) = &self.constraint {
            if !constraint.matches(version.as_semver()) {
                trace!("Skipping tag outside constraint {}: {}", constraint, tag);
                return TagClass::Ignored;
            }
        }

        if version.is_prerelease() && !is_release_channel(version.prerelease()) {
            trace!("Skipping image variant: {}", tag);
            return TagClass::Ignored;
        }

        TagClass::Version(version)
    }
}

/// A prerelease suffix names a release channel when it has no extra `-`
/// segment and starts with one of [`PRERELEASE_LABELS`]
fn is_release_channel(prerelease: &str) -> bool {
    !prerelease.contains('-')
        && PRERELEASE_LABELS
            .iter()
            .any(|label| prerelease.starts_with(label))
}
