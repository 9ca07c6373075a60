//! Command dispatcher - Routes `!`-commands to registered handlers

use crate::application::chatroom::Chatroom;
use crate::application::errors::{ChatError, CommandError};
use crate::application::services::builtin_commands;
use crate::domain::entities::{CommandRegistry, Envelope, Invocation, Origin, Participant};
use super::parser::{is_command, parse_command};

/// Recognizes and executes commands against a chatroom.
///
/// The registry is fixed at construction; nothing can register or replace
/// handlers afterwards.
pub struct CommandDispatcher {
    registry: CommandRegistry,
}

impl CommandDispatcher {
    pub fn new(registry: CommandRegistry) -> Self {
        tracing::info!(
            "Registered commands: {}",
            registry.names().collect::<Vec<_>>().join(", ")
        );
        Self { registry }
    }

    /// Dispatcher with the built-in command set
    pub fn with_builtins() -> Self {
        Self::new(builtin_commands())
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    /// Handle a command line sent by `participant`.
    ///
    /// Syntax errors, unknown commands and bad arguments are answered with a
    /// SERVER envelope to the sender and leave room state untouched; only
    /// structural failures are returned.
    pub fn handle(&self, raw: &str, participant: &Participant, room: &Chatroom) -> Result<(), ChatError> {
        let text = raw.trim();
        let sender = participant.connection_id();

        if !is_command(text) {
            let reply = Envelope::new(format!("\"{}\" is not a valid command (Syntax)", text), Origin::Server);
            return room.send(&reply, sender);
        }

        let parsed = parse_command(text);
        let Some(command) = self.registry.get(&parsed.name) else {
            tracing::debug!("[{}] unknown command {}", participant.name, parsed.name);
            let reply = Envelope::new(format!("\"{}\" is not a valid command (Doesn't exist)", text), Origin::Server);
            return room.send(&reply, sender);
        };

        tracing::debug!("[{}] running !{}", participant.name, command.name);
        let invocation = Invocation {
            participant,
            room,
            args: &parsed.args,
        };

        match (command.handler)(&invocation) {
            Ok(()) => Ok(()),
            Err(CommandError::InvalidArgs(message)) | Err(CommandError::NotFound(message)) => {
                room.send(&Envelope::new(message, Origin::Server), sender)
            }
            Err(CommandError::Chat(e)) => Err(e),
        }
    }
}

impl Default for CommandDispatcher {
    fn default() -> Self {
        Self::with_builtins()
    }
}
