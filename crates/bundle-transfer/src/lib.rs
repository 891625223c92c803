//! Bundle transfers for bundle-resource
//!
//! This crate provides functionality for:
//! - Pulling a bundle version into a destination directory (`in`)
//! - Pushing a file or directory as a new bundle version (`out`)
//! - Driving the imgpkg CLI with registry flags and temporary CA files
//! - Recovering the pushed digest from imgpkg's output

pub mod error;
pub mod fetch;
pub mod flags;
pub mod imgpkg;
pub mod publish;
pub mod scrape;

// Re-export main types for convenience
pub use error::{DelegateError, TransferError};
pub use fetch::{run_get, OUTPUT_DIR};
pub use flags::{CaCertFiles, RegistryFlags};
pub use imgpkg::{BundleTransfer, ImgpkgCli};
pub use publish::run_put;
pub use scrape::{pushed_digest, pushed_reference, scrape_pushed_digest};
