//! Application layer - Chatroom engine and command handling
//!
//! This layer contains:
//! - Chatroom: Participant registry, broadcasting, lifecycle events
//! - Messaging: Command parsing and dispatch
//! - Services: Built-in commands
//! - Errors: Engine, command, config and transport errors

pub mod chatroom;
pub mod errors;
pub mod messaging;
pub mod services;
