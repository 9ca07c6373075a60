//! Application layer errors

use thiserror::Error;

use crate::domain::entities::ConnectionId;

/// Chatroom engine errors
#[derive(Error, Debug)]
pub enum ChatError {
    #[error("Unknown connection: {0}")]
    UnknownConnection(ConnectionId),

    #[error("Connection already registered: {0}")]
    DuplicateConnection(ConnectionId),

    #[error("Chatroom has been shut down")]
    ShutDown,

    #[error("Invalid name: {0:?}")]
    InvalidName(String),

    #[error("Send error: {0}")]
    Send(#[from] SendError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Per-connection delivery errors
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendError {
    #[error("connection closed")]
    Closed,

    #[error("outbound queue full")]
    Full,
}

/// Command execution errors
///
/// `InvalidArgs` and `NotFound` carry the exact text shown to the invoking
/// participant; `Chat` is a structural failure that propagates to the caller.
#[derive(Error, Debug)]
pub enum CommandError {
    #[error("Invalid arguments: {0}")]
    InvalidArgs(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Chat(#[from] ChatError),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path}: {reason}")]
    Read { path: String, reason: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Word list error: {0}")]
    WordList(String),
}

/// Transport errors
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Handshake failed: {0}")]
    Handshake(String),

    #[error("Chat error: {0}")]
    Chat(#[from] ChatError),
}
