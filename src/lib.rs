//! relayroom - an in-memory chatroom relay.
//!
//! Clients attach over a websocket, exchange broadcast and private messages,
//! and run `!`-commands against shared room state.

pub mod domain;
pub mod application;
pub mod infrastructure;

pub use application::chatroom::{Chatroom, DeliveryReport};
pub use application::errors::{ChatError, CommandError, ConfigError, SendError, TransportError};
pub use domain::entities::{ConnectionId, Envelope, Origin, Participant};
pub use domain::traits::{Connection, Transport};
pub use infrastructure::config::Config;
