//! Domain layer - Core chat types
//!
//! This layer contains:
//! - Entities: Participant, Envelope, Command
//! - Traits: Abstractions for transports (Connection, Transport)

pub mod entities;
pub mod traits;
