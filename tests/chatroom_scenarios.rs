//! Chatroom integration tests
//! Run with: cargo test --test chatroom_scenarios

use std::io::Write;
use std::sync::{Arc, Once};

use relayroom::application::messaging::{is_command, parse_command};
use relayroom::infrastructure::adapters::MemoryConnection;
use relayroom::infrastructure::names::NameGenerator;
use relayroom::{ChatError, Chatroom, Config, Connection};

static INIT: Once = Once::new();

fn ensure_init() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    });
}

fn room() -> Chatroom {
    ensure_init();
    let config = Config::default();
    let names = NameGenerator::from_words(["swift", "calm"], ["falcon", "newt"]).unwrap();
    Chatroom::with_name_generator(config.chat, config.meta, names)
}

fn join(room: &Chatroom, name: &str) -> Arc<MemoryConnection> {
    let connection = MemoryConnection::new();
    room.join(connection.clone(), Some(name.to_string())).unwrap();
    connection
}

#[test]
fn test_greeting_embeds_generated_name() {
    let room = room();
    let a = MemoryConnection::new();
    let participant = room.join(a.clone(), None).unwrap();

    assert!(["SwiftFalcon", "SwiftNewt", "CalmFalcon", "CalmNewt"].contains(&participant.name.as_str()));
    let greeting = a.last().unwrap();
    assert_eq!(greeting["origin"], "SERVER");
    assert!(greeting["body"].as_str().unwrap().contains(&participant.name));
}

#[test]
fn test_chat_line_and_echo() {
    let room = room();
    let a = join(&room, "alice");
    let b = join(&room, "bob");

    room.handle_message(a.id(), "hi").unwrap();

    let received = b.last().unwrap();
    assert_eq!(received["body"], "alice: hi");
    assert_eq!(received["origin"], "USER");
    let echoed = a.last().unwrap();
    assert_eq!(echoed["body"], "alice: hi");
    assert_eq!(echoed["origin"], "SELF");
}

#[test]
fn test_private_message_via_command() {
    let room = room();
    let a = join(&room, "alice");
    let b = join(&room, "bob");
    let c = join(&room, "carol");

    room.handle_message(a.id(), "!pm bob secret").unwrap();

    let delivered = b.last().unwrap();
    let body = delivered["body"].as_str().unwrap();
    assert!(body.contains("alice") && body.contains("secret"));
    assert_eq!(delivered["origin"], "PRIVATE");
    assert_eq!(a.last().unwrap()["origin"], "PRIVATE");
    assert!(c.frames().iter().all(|frame| !frame.contains("secret")));
}

#[test]
fn test_shutdown_is_terminal() {
    let room = room();
    let a = join(&room, "alice");
    let b = join(&room, "bob");

    room.shutdown().unwrap();

    for connection in [&a, &b] {
        assert_eq!(connection.last().unwrap()["body"], "The server is shutting down. Goodbye!");
        assert!(connection.is_closed());
    }
    let late = MemoryConnection::new();
    assert!(matches!(room.join(late, None), Err(ChatError::ShutDown)));
}

#[test]
fn test_command_recognition() {
    assert!(is_command("!x"));
    assert!(is_command("!help extra args"));
    assert!(!is_command("!"));
    assert!(!is_command("hello!"));

    let parsed = parse_command("!PM bob hello there");
    assert_eq!(parsed.name, "pm");
    assert_eq!(parsed.args, "bob hello there");
}

#[test]
fn test_room_from_config_files() {
    ensure_init();
    let mut adjectives = tempfile::NamedTempFile::new().unwrap();
    writeln!(adjectives, "  mighty \n\n").unwrap();
    let mut animals = tempfile::NamedTempFile::new().unwrap();
    writeln!(animals, "MOOSE").unwrap();

    let mut config = Config::default();
    config.name_generator.adjective_path = adjectives.path().to_path_buf();
    config.name_generator.animal_path = animals.path().to_path_buf();
    config.chat.greeting_template = "Hello ${name}, that costs $$0".into();

    let room = Chatroom::new(&config).unwrap();
    let a = MemoryConnection::new();
    room.join(a.clone(), None).unwrap();
    assert_eq!(a.last().unwrap()["body"], "Hello MightyMoose, that costs $0");
}

#[test]
fn test_missing_word_list_is_fatal() {
    ensure_init();
    let mut config = Config::default();
    config.name_generator.adjective_path = "/definitely/not/here.txt".into();

    assert!(Chatroom::new(&config).is_err());
}
