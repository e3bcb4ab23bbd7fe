//! Solution group wait-edges.
//!
//! Resources built from the same solution share build outputs, so starting two
//! of them at once races on the shared dependencies. At registration time each
//! grouped resource is made to wait for every peer registered before it:
//!
//! ```text
//! register A (G)   A waits for -
//! register B (G)   B waits for A
//! register C (G)   C waits for A, B
//! register D (-)   D waits for -
//! ```
//!
//! Edges only point at earlier registrations, so the wait graph is acyclic.

use crate::error::{Error, Result};
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Clone)]
struct Registration {
    name: String,
    group: Option<String>,
}

/// Registration-order wait graph over solution groups.
#[derive(Debug, Default)]
pub struct SolutionGroupScheduler {
    registrations: Vec<Registration>,
    waits: HashMap<String, Vec<String>>,
}

impl SolutionGroupScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `name`, returning the earlier peers it must wait for.
    pub fn register(&mut self, name: &str, group: Option<&str>) -> Result<Vec<String>> {
        if self.waits.contains_key(name) {
            return Err(Error::DuplicateResource(name.to_string()));
        }

        let waits_for: Vec<String> = match group {
            Some(group) => self
                .registrations
                .iter()
                .filter(|r| r.group.as_deref() == Some(group))
                .map(|r| r.name.clone())
                .collect(),
            None => Vec::new(),
        };

        for peer in &waits_for {
            debug!(resource = %name, waits_for = %peer, group = ?group, "Adding solution group wait");
        }

        self.registrations.push(Registration {
            name: name.to_string(),
            group: group.map(String::from),
        });
        self.waits.insert(name.to_string(), waits_for.clone());
        Ok(waits_for)
    }

    /// Peers `name` waits for; empty for unknown or ungrouped resources.
    pub fn waits_for(&self, name: &str) -> &[String] {
        self.waits.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All `(resource, waits_for)` edges in registration order.
    pub fn edges(&self) -> Vec<(&str, &str)> {
        self.registrations
            .iter()
            .flat_map(|r| {
                self.waits_for(&r.name)
                    .iter()
                    .map(move |peer| (r.name.as_str(), peer.as_str()))
            })
            .collect()
    }

    /// Names in registration order.
    pub fn registered(&self) -> impl Iterator<Item = &str> {
        self.registrations.iter().map(|r| r.name.as_str())
    }
}
