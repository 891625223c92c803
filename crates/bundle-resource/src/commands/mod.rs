//! One module per resource binary
//!
//! Each `run` decodes its request from `input`, performs the step and encodes
//! the response to `output`. Errors carry the failing step as context, so
//! `{:#}` prints "<Step>: <cause chain>".

pub mod check;
pub mod fetch;
pub mod publish;
