//! Domain traits - Abstractions implemented by transports

pub mod connection;
pub mod transport;

pub use connection::Connection;
pub use transport::Transport;
