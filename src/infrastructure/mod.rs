//! Infrastructure layer - External concerns
//!
//! This layer contains:
//! - Config: YAML configuration and message templates
//! - Names: Default display name generation
//! - Adapters: Transports (WebSocket, in-memory)

pub mod config;
pub mod names;
pub mod adapters;
