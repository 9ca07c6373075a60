use std::collections::HashMap;

use crate::application::chatroom::Chatroom;
use crate::application::errors::CommandError;
use crate::domain::entities::{Envelope, Origin, Participant};

/// Everything a command handler gets to work with
pub struct Invocation<'a> {
    pub participant: &'a Participant,
    pub room: &'a Chatroom,
    /// Remainder of the command line, verbatim
    pub args: &'a str,
}

impl Invocation<'_> {
    /// Send a SERVER envelope to the invoking participant only
    pub fn reply(&self, body: impl Into<String>) -> Result<(), CommandError> {
        let envelope = Envelope::new(body, Origin::Server);
        self.room.send(&envelope, self.participant.connection_id())?;
        Ok(())
    }
}

/// Command handler function type
pub type CommandHandler = Box<dyn Fn(&Invocation<'_>) -> Result<(), CommandError> + Send + Sync>;

/// Represents a chat command
pub struct Command {
    pub name: String,
    pub description: Option<String>,
    pub usage: Option<String>,
    pub handler: CommandHandler,
}

impl Command {
    pub fn new<F>(name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&Invocation<'_>) -> Result<(), CommandError> + Send + Sync + 'static,
    {
        Self {
            name: name.into().to_lowercase(),
            description: None,
            usage: None,
            handler: Box::new(handler),
        }
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    pub fn with_usage(mut self, usage: impl Into<String>) -> Self {
        self.usage = Some(usage.into());
        self
    }
}

/// Collects commands before the registry is frozen
#[derive(Default)]
pub struct CommandRegistryBuilder {
    commands: Vec<Command>,
}

impl CommandRegistryBuilder {
    pub fn register(mut self, command: Command) -> Self {
        self.commands.push(command);
        self
    }

    pub fn build(self) -> CommandRegistry {
        let mut order = Vec::with_capacity(self.commands.len());
        let mut commands = HashMap::with_capacity(self.commands.len());
        for command in self.commands {
            if !commands.contains_key(&command.name) {
                order.push(command.name.clone());
            }
            commands.insert(command.name.clone(), command);
        }
        CommandRegistry { commands, order }
    }
}

/// Immutable name → command table. There is no way to add or remove
/// entries once built.
pub struct CommandRegistry {
    commands: HashMap<String, Command>,
    order: Vec<String>,
}

impl CommandRegistry {
    pub fn builder() -> CommandRegistryBuilder {
        CommandRegistryBuilder::default()
    }

    pub fn get(&self, name: &str) -> Option<&Command> {
        self.commands.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    /// Commands in registration order
    pub fn all(&self) -> impl Iterator<Item = &Command> {
        self.order.iter().filter_map(|name| self.commands.get(name))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}
