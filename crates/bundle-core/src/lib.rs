//! # bundle-core
//!
//! Core library for bundle-resource providing:
//! - Pipeline protocol payloads (check / in / out requests and responses)
//! - The shared error taxonomy for configuration problems
//! - Process-level transfer settings with their defaults

pub mod error;
pub mod settings;
pub mod types;

pub use error::{Error, Result};
pub use settings::{format_duration, parse_duration, TransferSettings};
pub use types::{
    CheckRequest, CheckResponse, InParams, InRequest, InResponse, OutParams, OutRequest,
    OutResponse, Source, Version, DEFAULT_TAG,
};
