//! OpenAI-compatible inbound request types.

use serde::{Deserialize, Serialize};

/// Chat completion request (OpenAI-compatible subset).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
}

/// A chat message.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Message {
    pub role: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl ChatCompletionRequest {
    /// Normalized upstream payload: the request fields with unset options
    /// omitted rather than serialized as null.
    pub fn to_payload(&self) -> serde_json::Value {
        // Serialization of this type cannot fail: no maps with non-string
        // keys, no non-finite floats introduced by us.
        serde_json::to_value(self).unwrap_or_else(|_| serde_json::json!({}))
    }
}

/// Admin request body for registering a provider at runtime.
#[derive(Debug, Deserialize)]
pub struct RegisterProviderRequest {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub requires_credential: bool,
    /// Optional credential set in the same call
    pub api_key: Option<String>,
}
