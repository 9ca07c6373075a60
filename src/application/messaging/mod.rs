//! Message handling - Command parsing and dispatch

pub mod dispatcher;
pub mod parser;

pub use dispatcher::CommandDispatcher;
pub use parser::{is_command, parse_command, ParsedCommand, COMMAND_MARKER};
