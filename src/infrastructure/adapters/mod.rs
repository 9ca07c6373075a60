//! Transport adapters

pub mod memory;
pub mod websocket;

pub use memory::MemoryConnection;
pub use websocket::{WebSocketConnection, WebSocketTransport};
