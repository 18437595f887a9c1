//! Endpoint registry and credential store.
//!
//! The registry owns the set of known upstream providers; registration order
//! is the rotation order and stays stable for the process lifetime. The
//! credential store holds secrets keyed by provider name, separate from the
//! registry so credentials can be rotated and redacted independently.

use std::sync::{Arc, RwLock};

use dashmap::DashMap;

use crate::config::ApiKey;
use crate::error::{Error, Result};

/// A registered upstream provider. Immutable once registered.
#[derive(Debug, Clone, PartialEq)]
pub struct Provider {
    /// Unique name identifying this provider
    pub name: String,
    /// Base URL outbound calls are issued against
    pub base_url: String,
    /// Whether dispatch must attach a credential
    pub requires_credential: bool,
}

/// Ordered registry of upstream providers.
///
/// Mutations are serialized against reads through the inner lock, so a
/// deregistration concurrent with rotation can never produce a torn ordering.
#[derive(Debug, Default)]
pub struct EndpointRegistry {
    providers: RwLock<Vec<Provider>>,
}

impl EndpointRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider. Fails if the name is already taken; the first
    /// registration's data is preserved unchanged.
    pub fn register(
        &self,
        name: impl Into<String>,
        base_url: impl Into<String>,
        requires_credential: bool,
    ) -> Result<()> {
        let name = name.into();
        let mut providers = self.providers.write().expect("registry lock poisoned");

        if providers.iter().any(|p| p.name == name) {
            return Err(Error::DuplicateProvider { name });
        }

        tracing::debug!(provider = %name, "Registered provider");
        providers.push(Provider {
            name,
            base_url: base_url.into(),
            requires_credential,
        });
        Ok(())
    }

    /// Remove a provider by name.
    pub fn deregister(&self, name: &str) -> Result<()> {
        let mut providers = self.providers.write().expect("registry lock poisoned");

        let position = providers
            .iter()
            .position(|p| p.name == name)
            .ok_or_else(|| Error::UnknownProvider {
                name: name.to_string(),
            })?;

        providers.remove(position);
        tracing::debug!(provider = %name, "Deregistered provider");
        Ok(())
    }

    /// Look up a provider by name, returning it by value.
    pub fn get(&self, name: &str) -> Result<Provider> {
        self.providers
            .read()
            .expect("registry lock poisoned")
            .iter()
            .find(|p| p.name == name)
            .cloned()
            .ok_or_else(|| Error::UnknownProvider {
                name: name.to_string(),
            })
    }

    /// Ordered sequence of registered names. This is the contract the
    /// selector rotates over.
    pub fn list_names(&self) -> Vec<String> {
        self.providers
            .read()
            .expect("registry lock poisoned")
            .iter()
            .map(|p| p.name.clone())
            .collect()
    }

    /// Snapshot of all registered providers in registration order.
    pub fn list(&self) -> Vec<Provider> {
        self.providers
            .read()
            .expect("registry lock poisoned")
            .clone()
    }

    /// Number of registered providers.
    pub fn len(&self) -> usize {
        self.providers.read().expect("registry lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Per-provider secrets, keyed by provider name.
///
/// Holds the registry only to validate names on `set`; the association is by
/// name, so deregistering a provider leaves its credential behind, harmless
/// until explicitly pruned.
#[derive(Debug)]
pub struct CredentialStore {
    registry: Arc<EndpointRegistry>,
    secrets: DashMap<String, ApiKey>,
}

impl CredentialStore {
    pub fn new(registry: Arc<EndpointRegistry>) -> Self {
        Self {
            registry,
            secrets: DashMap::new(),
        }
    }

    /// Set or rotate a provider's secret.
    ///
    /// Fails for unregistered providers so orphaned credentials cannot be
    /// created here. Deregistration afterwards can still orphan one; the
    /// facade prunes on deregister.
    pub fn set(&self, provider_name: impl Into<String>, secret: ApiKey) -> Result<()> {
        let provider_name = provider_name.into();
        self.registry.get(&provider_name)?;
        self.secrets.insert(provider_name, secret);
        Ok(())
    }

    /// Fetch a provider's secret. Absence is a valid state; the dispatcher
    /// decides whether that is fatal based on `requires_credential`.
    pub fn get(&self, provider_name: &str) -> Option<ApiKey> {
        self.secrets.get(provider_name).map(|s| s.value().clone())
    }

    /// Drop a provider's secret, e.g. after deregistration.
    pub fn remove(&self, provider_name: &str) {
        self.secrets.remove(provider_name);
    }
}
