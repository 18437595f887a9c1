//! Round-robin provider selection.
//!
//! The selection state (cursor) lives inside the selector instance, never in
//! a global counter, so multiple gateway instances (e.g., in tests) do not
//! interfere with each other.

use std::sync::{Arc, Mutex};

use crate::error::{Error, Result};
use crate::registry::EndpointRegistry;

/// Stateful round-robin selector over the registry's ordering.
///
/// `next()` performs its read-modify-write of the cursor under a mutex, so N
/// concurrent calls observe N distinct, contiguous steps of the modulo
/// sequence. The registry snapshot is taken while the cursor lock is held,
/// which keeps a concurrent deregistration from yielding an out-of-range
/// index.
#[derive(Debug)]
pub struct ProviderSelector {
    registry: Arc<EndpointRegistry>,
    /// Index of the next provider to serve in the registry's ordering.
    cursor: Mutex<usize>,
}

impl ProviderSelector {
    pub fn new(registry: Arc<EndpointRegistry>) -> Self {
        Self {
            registry,
            cursor: Mutex::new(0),
        }
    }

    /// Rotate to the next provider and return its name.
    ///
    /// Fails with `NoProviders` when the registry is empty at call time; the
    /// empty case is an explicit error, never a modulo-by-zero.
    pub fn next(&self) -> Result<String> {
        let mut cursor = self.cursor.lock().expect("selector lock poisoned");

        let ordering = self.registry.list_names();
        if ordering.is_empty() {
            return Err(Error::NoProviders);
        }

        // The cursor can exceed the ordering length if providers were
        // deregistered since the last rotation; wrap it first.
        let index = *cursor % ordering.len();
        *cursor = (index + 1) % ordering.len();

        Ok(ordering[index].clone())
    }

    /// Caller-specified override of rotation. Validates the name exists and
    /// leaves the cursor untouched.
    pub fn pinned(&self, name: &str) -> Result<String> {
        self.registry.get(name).map(|p| p.name)
    }

    /// Clamp the cursor back into range after a deregistration shrank the
    /// ordering.
    pub fn clamp(&self) {
        let mut cursor = self.cursor.lock().expect("selector lock poisoned");
        let len = self.registry.len();
        if len == 0 || *cursor >= len {
            *cursor = 0;
        }
    }
}
