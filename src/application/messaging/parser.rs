//! Command recognition and parsing

use once_cell::sync::Lazy;
use regex_lite::Regex;

/// Marker that opens every command
pub const COMMAND_MARKER: char = '!';

static COMMAND_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^!.+").expect("command pattern is valid"));

/// A command line split into its name and verbatim argument string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    /// Lower-cased, with exactly one leading marker removed
    pub name: String,
    /// Everything after the first whitespace run; empty when absent
    pub args: String,
}

/// True iff `text` is a marker followed by at least one more character on
/// the same line. A bare `!` is not a command.
pub fn is_command(text: &str) -> bool {
    COMMAND_PATTERN.is_match(text)
}

/// Split an already-trimmed command line at its first whitespace run
pub fn parse_command(text: &str) -> ParsedCommand {
    let (head, rest) = match text.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim_start()),
        None => (text, ""),
    };

    ParsedCommand {
        name: head.strip_prefix(COMMAND_MARKER).unwrap_or(head).to_lowercase(),
        args: rest.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_command() {
        for valid in ["!x", "!help", "!valid with args", "!help extra args", "!!"] {
            assert!(is_command(valid), "{:?} should be a command", valid);
        }
        for invalid in ["message", "hello!", "!", "message !three", " !help", "", "!\nhelp"] {
            assert!(!is_command(invalid), "{:?} should not be a command", invalid);
        }
    }

    #[test]
    fn test_parse_keeps_argument_case() {
        let parsed = parse_command("!SetName Bob Smith");
        assert_eq!(parsed.name, "setname");
        assert_eq!(parsed.args, "Bob Smith");
    }

    #[test]
    fn test_parse_strips_a_single_marker() {
        assert_eq!(parse_command("!!ping").name, "!ping");
        assert_eq!(parse_command("!!!PING now").name, "!!ping");
    }

    #[test]
    fn test_parse_without_args() {
        let parsed = parse_command("!WHO");
        assert_eq!(parsed, ParsedCommand { name: "who".to_string(), args: String::new() });
    }

    #[test]
    fn test_parse_collapses_only_the_first_whitespace_run() {
        let parsed = parse_command("!pm \t bob   two  spaces");
        assert_eq!(parsed.name, "pm");
        assert_eq!(parsed.args, "bob   two  spaces");
    }
}
