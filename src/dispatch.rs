//! Outbound request dispatch.
//!
//! Builds and issues the outbound call for a selected provider: looks up the
//! endpoint, enforces the credential requirement before any network I/O,
//! merges headers with defined precedence, and returns the upstream result
//! as a normalized envelope. Non-2xx upstream responses are not errors here;
//! they pass through in the envelope for the caller to inspect.

use std::str::FromStr;
use std::sync::Arc;

use axum::http::{header, HeaderMap, HeaderValue};
use bytes::Bytes;
use reqwest::{Client, StatusCode};

use crate::config::ApiKey;
use crate::error::{Error, Result};
use crate::registry::{CredentialStore, EndpointRegistry};

/// Closed set of supported request methods.
///
/// An unrecognized verb is a construction-time failure, not a runtime string
/// comparison fallthrough.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }

    /// Whether the payload travels as query parameters (GET/DELETE) rather
    /// than a JSON body (POST/PUT).
    fn payload_in_query(&self) -> bool {
        matches!(self, Method::Get | Method::Delete)
    }
}

impl FromStr for Method {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "DELETE" => Ok(Method::Delete),
            other => Err(Error::UnsupportedMethod {
                method: other.to_string(),
            }),
        }
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized upstream response returned to the caller unchanged.
#[derive(Debug, Clone)]
pub struct ResponseEnvelope {
    pub status_code: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl ResponseEnvelope {
    /// Parse the body as JSON, for callers that expect a structured result.
    pub fn json(&self) -> Result<serde_json::Value> {
        serde_json::from_slice(&self.body)
            .map_err(|e| Error::Internal(format!("Upstream body is not valid JSON: {}", e)))
    }
}

/// Merge caller-supplied headers with the injected credential.
///
/// Caller headers pass through untouched, except Authorization: when a
/// credential is injected it replaces (never duplicates) whatever the caller
/// supplied.
pub fn merge_headers(extra: &HeaderMap, credential: Option<&ApiKey>) -> Result<HeaderMap> {
    let mut merged = extra.clone();

    if let Some(key) = credential {
        let mut value = HeaderValue::from_str(&format!("Bearer {}", key.expose_secret()))
            .map_err(|_| Error::Internal("Credential contains invalid header bytes".into()))?;
        value.set_sensitive(true);
        merged.insert(header::AUTHORIZATION, value);
    }

    Ok(merged)
}

/// Flatten a JSON object into query-string pairs for GET/DELETE dispatch.
///
/// Scalar values serialize to their plain string form; nested values are
/// JSON-encoded. A null payload produces no pairs.
fn query_pairs(payload: &serde_json::Value) -> Result<Vec<(String, String)>> {
    match payload {
        serde_json::Value::Null => Ok(Vec::new()),
        serde_json::Value::Object(map) => Ok(map
            .iter()
            .map(|(k, v)| {
                let value = match v {
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                (k.clone(), value)
            })
            .collect()),
        _ => Err(Error::BadRequest(
            "Query payload must be a JSON object".to_string(),
        )),
    }
}

/// Issues outbound calls for selected providers.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: Arc<EndpointRegistry>,
    credentials: Arc<CredentialStore>,
    client: Client,
}

impl Dispatcher {
    pub fn new(
        registry: Arc<EndpointRegistry>,
        credentials: Arc<CredentialStore>,
        client: Client,
    ) -> Self {
        Self {
            registry,
            credentials,
            client,
        }
    }

    /// Dispatch a call to a provider by name.
    ///
    /// The credential requirement is enforced before anything touches the
    /// network. Network-level failures surface as `Transport`; non-2xx
    /// upstream statuses come back in the envelope as-is.
    pub async fn dispatch(
        &self,
        provider_name: &str,
        method: Method,
        payload: &serde_json::Value,
        extra_headers: &HeaderMap,
    ) -> Result<ResponseEnvelope> {
        let provider = self.registry.get(provider_name)?;

        let credential = self.credentials.get(&provider.name);
        if provider.requires_credential && credential.is_none() {
            return Err(Error::MissingCredential {
                name: provider.name,
            });
        }

        let headers = merge_headers(extra_headers, credential.as_ref())?;

        let mut request = self
            .client
            .request(method.into(), &provider.base_url)
            .headers(headers);

        request = if method.payload_in_query() {
            request.query(&query_pairs(payload)?)
        } else {
            request.json(payload)
        };

        tracing::debug!(
            provider = %provider.name,
            method = %method,
            url = %provider.base_url,
            "Dispatching upstream request"
        );

        let response = request.send().await.map_err(|e| {
            tracing::error!(error = %e, provider = %provider.name, "Failed to reach provider");
            Error::Transport(e)
        })?;

        let status_code = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await.map_err(Error::Transport)?;

        if !status_code.is_success() {
            tracing::warn!(
                status = %status_code,
                provider = %provider.name,
                "Provider returned non-success status"
            );
        }

        Ok(ResponseEnvelope {
            status_code,
            headers,
            body,
        })
    }
}
