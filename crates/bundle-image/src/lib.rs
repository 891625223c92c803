//! Registry access and version resolution for bundle-resource
//!
//! This crate provides functionality for:
//! - Querying OCI-compatible registries (tag listing, manifest probes)
//! - Classifying tags as semantic versions or aliases
//! - Resolving tag and digest references to content digests
//! - Working out which versions are new since the caller's last one
//!
//! # Example
//!
//! ```no_run
//! use bundle_core::{Source, Version};
//! use bundle_image::CheckEngine;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let source = Source::new("ghcr.io/org/bundle");
//!     let engine = CheckEngine::for_source(&source)?;
//!
//!     let last = Version::new("1.2.0", "sha256:...");
//!     for version in engine.check(&source, Some(&last)).await? {
//!         println!("{} {}", version.tag, version.digest);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod digest;
pub mod error;
pub mod reference;
pub mod registry;
pub mod resolver;
pub mod version;

// Re-export main types for convenience
pub use auth::{Challenge, Credentials};
pub use digest::head_or_get;
pub use error::{CheckError, RegistryError, RegistryResult};
pub use reference::{Reference, ReferenceKind, Repository, DEFAULT_REGISTRY};
pub use registry::{Descriptor, Registry, RegistryClient, RegistryClientBuilder, DEFAULT_TIMEOUT};
pub use resolver::{
    run_check, run_check_with_timeout, select_representatives, CheckEngine, TagVersion,
};
pub use version::{ParsedVersion, TagClass, VersionFilter, ALIAS_TAG, PRERELEASE_LABELS};
