//! Application services - Built-in chat commands

pub mod commands;

pub use commands::builtin_commands;
