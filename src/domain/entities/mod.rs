//! Domain entities - Core chat objects

pub mod participant;
pub mod envelope;
pub mod command;

pub use participant::{ConnectionId, Participant};
pub use envelope::{Envelope, Origin, SENT_AT_FORMAT};
pub use command::{Command, CommandHandler, CommandRegistry, CommandRegistryBuilder, Invocation};
