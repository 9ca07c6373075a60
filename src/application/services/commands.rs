//! Built-in `!`-commands

use crate::application::errors::{ChatError, CommandError};
use crate::domain::entities::{Command, CommandRegistry, Invocation};

const SETNAME_USAGE: &str = "!setname usage: \"!setname <new name>\"";
const PM_USAGE: &str = "!pm usage: !pm <user> <message>";

/// The command table every chatroom starts with
pub fn builtin_commands() -> CommandRegistry {
    CommandRegistry::builder()
        .register(Command::new("help", help)
            .with_description("List the commands you can use")
            .with_usage("!help"))
        .register(Command::new("about", about)
            .with_description("What this chatroom is")
            .with_usage("!about"))
        .register(Command::new("setname", setname)
            .with_description("Change your display name")
            .with_usage("!setname <new name>"))
        .register(Command::new("who", who)
            .with_description("List everyone connected")
            .with_usage("!who"))
        .register(Command::new("env", env)
            .with_description("Show the server environment")
            .with_usage("!env"))
        .register(Command::new("ping", |inv| inv.reply("pong!"))
            .with_description("Check the server is alive")
            .with_usage("!ping"))
        .register(Command::new("pm", pm)
            .with_description("Send a private message")
            .with_usage("!pm <user> <message>"))
        .build()
}

fn help(inv: &Invocation<'_>) -> Result<(), CommandError> {
    let mut body = "Here are some commands you can use:".to_string();
    for cmd in inv.room.dispatcher().registry().all() {
        body.push_str(&format!(
            "\n\t{} - {}",
            cmd.usage.clone().unwrap_or_else(|| format!("!{}", cmd.name)),
            cmd.description.as_deref().unwrap_or("")
        ));
    }
    inv.reply(body)
}

fn about(inv: &Invocation<'_>) -> Result<(), CommandError> {
    inv.reply(inv.room.about().to_string())
}

fn setname(inv: &Invocation<'_>) -> Result<(), CommandError> {
    if inv.args.is_empty() {
        return Err(CommandError::InvalidArgs(SETNAME_USAGE.to_string()));
    }
    match inv.room.rename(inv.participant.connection_id(), inv.args) {
        Err(ChatError::InvalidName(_)) => {
            Err(CommandError::InvalidArgs(SETNAME_USAGE.to_string()))
        }
        other => Ok(other?),
    }
}

fn who(inv: &Invocation<'_>) -> Result<(), CommandError> {
    let names = inv.room.names()?;
    inv.reply(format!("Connected Users: {}", names.join(", ")))
}

fn env(inv: &Invocation<'_>) -> Result<(), CommandError> {
    inv.reply(format!("Environment: {}", inv.room.environment()))
}

fn pm(inv: &Invocation<'_>) -> Result<(), CommandError> {
    if inv.args.is_empty() {
        return Err(CommandError::InvalidArgs(PM_USAGE.to_string()));
    }

    let (target, message) = match inv.args.split_once(char::is_whitespace) {
        Some((target, message)) => (target, message.trim_start()),
        None => (inv.args, ""),
    };
    if message.is_empty() {
        return Err(CommandError::InvalidArgs(PM_USAGE.to_string()));
    }

    let Some(recipient) = inv.room.find_by_name(target)? else {
        return Err(CommandError::NotFound(format!("!pm error: user {} not found", target)));
    };

    inv.room.private_message(message, inv.participant.connection_id(), recipient.connection_id())?;
    Ok(())
}
