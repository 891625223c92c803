//! Common test infrastructure for bundle-image tests
//!
//! Provides an in-memory [`Registry`] that records every manifest request so
//! tests can assert which tags were (and were not) resolved.

#![allow(dead_code)]

use async_trait::async_trait;
use bundle_image::{Descriptor, Reference, Registry, RegistryError, RegistryResult, Repository};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

pub const REPOSITORY: &str = "registry.example.com/team/bundle";

/// Build a fake sha256 digest from a short seed, e.g. `digest("a")`
pub fn digest(seed: &str) -> String {
    format!("sha256:{:0>64}", seed)
}

#[derive(Default)]
pub struct FakeRegistry {
    /// Tags in registry listing order
    listed: Vec<String>,
    /// Tags that currently resolve, and their digests
    live: HashMap<String, String>,
    /// Digests that resolve when addressed directly but have no tag
    orphans: HashSet<String>,
    /// Identifiers for which both HEAD and GET fail with a server error
    failing: HashSet<String>,
    head_unsupported: bool,
    listing_fails: bool,
    calls: Mutex<Vec<String>>,
}

impl FakeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tag pointing at a digest
    pub fn tag(mut self, tag: &str, digest: &str) -> Self {
        self.listed.push(tag.to_string());
        self.live.insert(tag.to_string(), digest.to_string());
        self
    }

    /// Add a tag that is listed but deleted before it can be resolved
    pub fn vanishing(mut self, tag: &str) -> Self {
        self.listed.push(tag.to_string());
        self
    }

    /// Keep a digest addressable after its tag moved on
    pub fn orphan(mut self, digest: &str) -> Self {
        self.orphans.insert(digest.to_string());
        self
    }

    pub fn failing(mut self, identifier: &str) -> Self {
        self.failing.insert(identifier.to_string());
        self
    }

    /// Make every HEAD fail so resolution must fall back to GET
    pub fn without_head(mut self) -> Self {
        self.head_unsupported = true;
        self
    }

    pub fn failing_listing(mut self) -> Self {
        self.listing_fails = true;
        self
    }

    /// Every manifest request made so far, as "HEAD <id>" / "GET <id>"
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Identifiers probed with HEAD
    pub fn probed(&self) -> Vec<String> {
        self.calls()
            .iter()
            .filter_map(|c| c.strip_prefix("HEAD ").map(String::from))
            .collect()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn lookup(&self, reference: &Reference) -> RegistryResult<Descriptor> {
        let id = reference.identifier();
        if self.failing.contains(id) {
            return Err(RegistryError::from_status(500, id, "boom"));
        }

        let digest = match reference.digest_str() {
            Some(d) if self.orphans.contains(d) || self.live.values().any(|v| v == d) => {
                Some(d.to_string())
            }
            Some(_) => None,
            None => self.live.get(id).cloned(),
        };

        digest
            .map(|digest| Descriptor { digest })
            .ok_or_else(|| RegistryError::from_status(404, id, ""))
    }
}

#[async_trait]
impl Registry for FakeRegistry {
    async fn list_tags(&self, _repository: &Repository) -> RegistryResult<Vec<String>> {
        if self.listing_fails {
            return Err(RegistryError::from_status(503, "tags/list", "unavailable"));
        }
        Ok(self.listed.clone())
    }

    async fn head_manifest(&self, reference: &Reference) -> RegistryResult<Descriptor> {
        self.record(format!("HEAD {}", reference.identifier()));
        if self.head_unsupported {
            return Err(RegistryError::from_status(405, reference.identifier(), ""));
        }
        self.lookup(reference)
    }

    async fn get_manifest(&self, reference: &Reference) -> RegistryResult<Descriptor> {
        self.record(format!("GET {}", reference.identifier()));
        self.lookup(reference)
    }
}
