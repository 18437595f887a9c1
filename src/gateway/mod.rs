//! HTTP gateway module.
//!
//! This module provides the OpenAI-compatible HTTP API that accepts
//! requests and forwards them to rotated or pinned providers, plus the
//! facade the transport layer drives.

mod facade;
mod handlers;
mod server;
pub mod types;

pub use facade::Gateway;
pub use handlers::{
    SPINDLE_LATENCY_MS_HEADER, SPINDLE_PIN_HEADER, SPINDLE_PROVIDER_HEADER,
    SPINDLE_REQUEST_ID_HEADER,
};
pub use server::{create_router, run_server, AppState, RequestId};
pub use types::{ChatCompletionRequest, Message, RegisterProviderRequest};
