//! Gateway facade composing the registry, credential store, selector, and
//! dispatcher into the single entry point the transport layer consumes.

use std::sync::Arc;
use std::time::Duration;

use axum::http::HeaderMap;
use reqwest::Client;

use crate::config::{ApiKey, Config};
use crate::dispatch::{Dispatcher, Method, ResponseEnvelope};
use crate::error::Result;
use crate::gateway::types::ChatCompletionRequest;
use crate::registry::{CredentialStore, EndpointRegistry, Provider};
use crate::selector::ProviderSelector;

/// The single entry point for inbound requests.
///
/// Owns the registry, credential store, and selection state; the outbound
/// network call runs without holding either lock, so concurrent dispatches
/// proceed in parallel.
#[derive(Debug)]
pub struct Gateway {
    registry: Arc<EndpointRegistry>,
    credentials: Arc<CredentialStore>,
    selector: ProviderSelector,
    dispatcher: Dispatcher,
}

impl Gateway {
    /// Build an empty gateway around the given HTTP client.
    pub fn new(client: Client) -> Self {
        let registry = Arc::new(EndpointRegistry::new());
        let credentials = Arc::new(CredentialStore::new(registry.clone()));
        let selector = ProviderSelector::new(registry.clone());
        let dispatcher = Dispatcher::new(registry.clone(), credentials.clone(), client);

        Self {
            registry,
            credentials,
            selector,
            dispatcher,
        }
    }

    /// Build a gateway from configuration: HTTP client with the configured
    /// timeouts, plus one registration (and credential, when present) per
    /// configured provider.
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.upstream.timeout_secs))
            .connect_timeout(Duration::from_secs(config.upstream.connect_timeout_secs))
            .build()?;

        let gateway = Self::new(client);

        for provider in &config.providers {
            gateway.register(&provider.name, &provider.url, provider.requires_credential)?;
            if let Some(key) = &provider.api_key {
                gateway.set_credential(&provider.name, key.clone())?;
            }
        }

        Ok(gateway)
    }

    /// Register a provider. Fails on duplicate names.
    pub fn register(
        &self,
        name: &str,
        base_url: &str,
        requires_credential: bool,
    ) -> Result<()> {
        self.registry.register(name, base_url, requires_credential)
    }

    /// Deregister a provider, prune its credential, and clamp the rotation
    /// cursor back into range.
    pub fn deregister(&self, name: &str) -> Result<()> {
        self.registry.deregister(name)?;
        self.credentials.remove(name);
        self.selector.clamp();
        Ok(())
    }

    /// Set or rotate a provider's credential. Fails for unregistered
    /// providers so orphaned credentials cannot be created.
    pub fn set_credential(&self, name: &str, secret: ApiKey) -> Result<()> {
        self.credentials.set(name, secret)
    }

    /// Snapshot of registered providers in rotation order.
    pub fn providers(&self) -> Vec<Provider> {
        self.registry.list()
    }

    /// Whether a credential is currently stored for this provider.
    pub fn credential_configured(&self, name: &str) -> bool {
        self.credentials.get(name).is_some()
    }

    /// Dispatch an arbitrary call to a named provider.
    pub async fn dispatch(
        &self,
        provider_name: &str,
        method: Method,
        payload: &serde_json::Value,
        extra_headers: &HeaderMap,
    ) -> Result<ResponseEnvelope> {
        self.dispatcher
            .dispatch(provider_name, method, payload, extra_headers)
            .await
    }

    /// Handle a chat-completion request end to end.
    ///
    /// Picks the pinned provider when one is named, otherwise rotates. The
    /// upstream envelope is returned verbatim along with the name of the
    /// provider that served it.
    pub async fn handle_chat_completion(
        &self,
        request: &ChatCompletionRequest,
        pinned_provider: Option<&str>,
    ) -> Result<(String, ResponseEnvelope)> {
        let provider_name = match pinned_provider {
            Some(name) => self.selector.pinned(name)?,
            None => self.selector.next()?,
        };

        tracing::info!(
            provider = %provider_name,
            model = %request.model,
            pinned = pinned_provider.is_some(),
            "Selected provider"
        );

        let payload = request.to_payload();
        let envelope = self
            .dispatcher
            .dispatch(&provider_name, Method::Post, &payload, &HeaderMap::new())
            .await?;

        Ok((provider_name, envelope))
    }
}
