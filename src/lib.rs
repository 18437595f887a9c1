//! spindle - Round-robin provider dispatch gateway for outbound API calls
//!
//! This library provides the core functionality for the spindle gateway:
//! an endpoint registry, a credential store, round-robin provider selection,
//! and a request dispatcher that injects credentials into outbound calls.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod gateway;
pub mod registry;
pub mod selector;

pub use config::Config;
pub use error::{Error, Result};
pub use gateway::Gateway;
