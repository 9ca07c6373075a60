//! Chatroom engine - Live participant registry and the only broadcaster
//!
//! Every registry read or write goes through one mutex. Broadcasts enqueue
//! to each recipient while holding it, so all recipients see broadcasts in
//! the same order and nobody receives anything after their `leave`.
//! Enqueueing never blocks: a full or closed connection is recorded in the
//! [`DeliveryReport`] and skipped.


use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::application::errors::{ChatError, ConfigError, SendError};
use crate::application::messaging::{is_command, CommandDispatcher};
use crate::domain::entities::{ConnectionId, Envelope, Origin, Participant};
use crate::domain::traits::Connection;
use crate::infrastructure::config::{ChatConfig, Config, MetaConfig};
use crate::infrastructure::names::NameGenerator;

/// Outcome of a fan-out. For `shutdown`, a connection that could not be
/// closed is listed in `failed` even if it got the notice.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub delivered: usize,
    pub failed: Vec<(ConnectionId, SendError)>,
}

impl DeliveryReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Connection → participant map, iterated in join order
#[derive(Default)]
struct Registry {
    participants: HashMap<ConnectionId, Participant>,
    order: Vec<ConnectionId>,
    shut_down: bool,
}

impl Registry {
    fn get(&self, id: ConnectionId) -> Result<&Participant, ChatError> {
        self.participants.get(&id).ok_or(ChatError::UnknownConnection(id))
    }

    fn get_mut(&mut self, id: ConnectionId) -> Result<&mut Participant, ChatError> {
        self.participants.get_mut(&id).ok_or(ChatError::UnknownConnection(id))
    }

    fn insert(&mut self, participant: Participant) {
        let id = participant.connection_id();
        self.order.push(id);
        self.participants.insert(id, participant);
    }

    fn remove(&mut self, id: ConnectionId) -> Option<Participant> {
        let participant = self.participants.remove(&id)?;
        self.order.retain(|c| *c != id);
        Some(participant)
    }

    fn iter(&self) -> impl Iterator<Item = &Participant> {
        self.order.iter().filter_map(|id| self.participants.get(id))
    }

    fn len(&self) -> usize {
        self.order.len()
    }
}

/// A single chatroom shared by every connection of the process
pub struct Chatroom {
    registry: Mutex<Registry>,
    dispatcher: CommandDispatcher,
    names: NameGenerator,
    templates: ChatConfig,
    environment: String,
    about: String,
}

impl Chatroom {
    /// Build from loaded configuration; fails if a word list can't be read
    pub fn new(config: &Config) -> Result<Self, ConfigError> {
        config.chat.validate()?;
        let names = NameGenerator::load(
            &config.name_generator.adjective_path,
            &config.name_generator.animal_path,
        )?;
        Ok(Self::with_name_generator(config.chat.clone(), config.meta.clone(), names))
    }

    pub fn with_name_generator(templates: ChatConfig, meta: MetaConfig, names: NameGenerator) -> Self {
        Self::with_dispatcher(templates, meta, names, CommandDispatcher::with_builtins())
    }

    pub fn with_dispatcher(
        templates: ChatConfig,
        meta: MetaConfig,
        names: NameGenerator,
        dispatcher: CommandDispatcher,
    ) -> Self {
        let about = meta.about.unwrap_or_else(|| {
            format!(
                "This is a websocket-based, in-memory chatroom (relayroom v{})",
                env!("CARGO_PKG_VERSION")
            )
        });

        Self {
            registry: Mutex::new(Registry::default()),
            dispatcher,
            names,
            templates,
            environment: meta.environment,
            about,
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Registry>, ChatError> {
        self.registry
            .lock()
            .map_err(|_| ChatError::Internal("Lock poisoned".to_string()))
    }

    /// Register a connection. Greets the newcomer and tells everyone else.
    pub fn join(&self, connection: Arc<dyn Connection>, name: Option<String>) -> Result<Participant, ChatError> {
        let id = connection.id();
        let name = name.unwrap_or_else(|| self.names.generate());

        let mut registry = self.lock()?;
        if registry.shut_down {
            return Err(ChatError::ShutDown);
        }
        if registry.participants.contains_key(&id) {
            return Err(ChatError::DuplicateConnection(id));
        }

        let participant = Participant::new(connection, name);
        registry.insert(participant.clone());
        tracing::info!("{} joined as {} ({} connected)", id, participant.name, registry.len());

        let greeting = Envelope::new(
            self.templates.greeting_template.render(&[("name", participant.name.as_str())]),
            Origin::Server,
        );
        if let Err(e) = Self::deliver(&registry, &greeting, id) {
            tracing::warn!("Greeting to {} failed: {}", participant.name, e);
        }

        let notice = Envelope::new(
            self.templates.connect_notification_template.render(&[("name", participant.name.as_str())]),
            Origin::Server,
        );
        Self::fan_out(&registry, &notice, &[id])?;

        Ok(participant)
    }

    /// Route one inbound line: commands to the dispatcher, anything else to
    /// the room as `"<name>: <text>"`.
    pub fn handle_message(&self, connection: ConnectionId, text: &str) -> Result<(), ChatError> {
        let registry = self.lock()?;
        let sender = registry.get(connection)?;

        if is_command(text) {
            let sender = sender.clone();
            drop(registry);
            tracing::debug!("[{}] command: {}", sender.name, text);
            return self.dispatcher.handle(text, &sender, self);
        }

        let body = format!("{}: {}", sender.name, text);
        tracing::debug!("[{}] chat line ({} chars)", sender.name, text.chars().count());

        Self::fan_out(&registry, &Envelope::new(body.clone(), Origin::User), &[connection])?;
        Self::deliver(&registry, &Envelope::new(body, Origin::Echo), connection)
    }

    /// Unregister a connection and tell the remaining participants.
    /// A second call for the same connection is an `UnknownConnection` error.
    pub fn leave(&self, connection: ConnectionId) -> Result<Participant, ChatError> {
        let mut registry = self.lock()?;
        let participant = registry
            .remove(connection)
            .ok_or(ChatError::UnknownConnection(connection))?;
        tracing::info!("{} ({}) left ({} connected)", participant.name, connection, registry.len());

        // After shutdown every socket is already closing; nobody is left to tell
        if !registry.shut_down {
            let notice = Envelope::new(
                self.templates.disconnect_notification_template.render(&[("name", participant.name.as_str())]),
                Origin::Server,
            );
            Self::fan_out(&registry, &notice, &[])?;
        }

        Ok(participant)
    }

    /// Deliver one envelope to one registered connection
    pub fn send(&self, envelope: &Envelope, connection: ConnectionId) -> Result<(), ChatError> {
        let registry = self.lock()?;
        Self::deliver(&registry, envelope, connection)
    }

    /// Deliver to every registered connection not in `skip`
    pub fn broadcast(&self, envelope: &Envelope, skip: &[ConnectionId]) -> Result<DeliveryReport, ChatError> {
        let registry = self.lock()?;
        Self::fan_out(&registry, envelope, skip)
    }

    /// Change a participant's display name; all whitespace is stripped.
    /// Everyone, the renamer included, is notified.
    pub fn rename(&self, connection: ConnectionId, new_name: &str) -> Result<(), ChatError> {
        let sanitized: String = new_name.split_whitespace().collect();

        let mut registry = self.lock()?;
        let participant = registry.get_mut(connection)?;
        if sanitized.is_empty() {
            return Err(ChatError::InvalidName(new_name.to_string()));
        }

        let old_name = std::mem::replace(&mut participant.name, sanitized.clone());
        tracing::info!("{} renamed to {}", old_name, sanitized);

        let notice = Envelope::new(
            self.templates
                .name_change_notification_template
                .render(&[("old", old_name.as_str()), ("new", sanitized.as_str())]),
            Origin::Server,
        );
        Self::fan_out(&registry, &notice, &[])?;
        Ok(())
    }

    /// Send `body` privately from one participant to another, with a receipt
    /// back to the sender. Nobody else sees either envelope.
    pub fn private_message(&self, body: &str, from: ConnectionId, to: ConnectionId) -> Result<(), ChatError> {
        let registry = self.lock()?;
        let from_name = registry.get(from)?.name.clone();
        let to_name = registry.get(to)?.name.clone();

        let outgoing = Envelope::new(
            self.templates
                .private_message_from_template
                .render(&[("from_name", from_name.as_str()), ("message", body)]),
            Origin::Private,
        );
        let receipt = Envelope::new(
            self.templates
                .private_message_to_template
                .render(&[("to_name", to_name.as_str()), ("message", body)]),
            Origin::Private,
        );

        tracing::debug!("Private message {} -> {}", from_name, to_name);
        Self::deliver(&registry, &outgoing, to)?;
        Self::deliver(&registry, &receipt, from)
    }

    /// Notify everyone, close every connection and refuse further joins.
    /// Calling it again is a no-op.
    pub fn shutdown(&self) -> Result<DeliveryReport, ChatError> {
        let mut registry = self.lock()?;
        if registry.shut_down {
            return Ok(DeliveryReport::default());
        }
        registry.shut_down = true;
        tracing::warn!("Shutting down chatroom with {} connected", registry.len());

        let notice = Envelope::new(
            self.templates.shutdown_notification_template.render(&[]),
            Origin::Server,
        );
        let mut report = Self::fan_out(&registry, &notice, &[])?;

        for participant in registry.iter() {
            let id = participant.connection_id();
            if let Err(e) = participant.connection.close() {
                tracing::warn!("Closing {} ({}) failed: {}", participant.name, id, e);
                if !report.failed.iter().any(|(failed, _)| *failed == id) {
                    report.failed.push((id, e));
                }
            }
        }

        Ok(report)
    }

    /// Snapshot of one participant
    pub fn participant(&self, connection: ConnectionId) -> Result<Participant, ChatError> {
        self.lock()?.get(connection).cloned()
    }

    /// Snapshot of all participants in join order
    pub fn participants(&self) -> Result<Vec<Participant>, ChatError> {
        Ok(self.lock()?.iter().cloned().collect())
    }

    /// Current display names in join order
    pub fn names(&self) -> Result<Vec<String>, ChatError> {
        Ok(self.lock()?.iter().map(|p| p.name.clone()).collect())
    }

    /// First participant, in join order, whose name is exactly `name`
    pub fn find_by_name(&self, name: &str) -> Result<Option<Participant>, ChatError> {
        Ok(self.lock()?.iter().find(|p| p.name == name).cloned())
    }

    pub fn len(&self) -> usize {
        self.registry.lock().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_shut_down(&self) -> bool {
        self.registry.lock().map(|r| r.shut_down).unwrap_or(true)
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn about(&self) -> &str {
        &self.about
    }

    pub fn dispatcher(&self) -> &CommandDispatcher {
        &self.dispatcher
    }

    fn check_origin(envelope: &Envelope) {
        if envelope.origin() == Origin::Default {
            tracing::warn!("Outgoing envelope has DEFAULT origin: {:?}", envelope.body());
        }
    }

    fn deliver(registry: &Registry, envelope: &Envelope, to: ConnectionId) -> Result<(), ChatError> {
        let participant = registry.get(to)?;
        Self::check_origin(envelope);
        participant.connection.send(envelope.to_json()?)?;
        Ok(())
    }

    fn fan_out(registry: &Registry, envelope: &Envelope, skip: &[ConnectionId]) -> Result<DeliveryReport, ChatError> {
        Self::check_origin(envelope);
        let frame = envelope.to_json()?;
        let mut report = DeliveryReport::default();

        for participant in registry.iter() {
            let id = participant.connection_id();
            if skip.contains(&id) {
                continue;
            }
            match participant.connection.send(frame.clone()) {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    tracing::warn!("Delivery to {} ({}) failed: {}", participant.name, id, e);
                    report.failed.push((id, e));
                }
            }
        }

        Ok(report)
    }
}

impl fmt::Display for Chatroom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Chatroom ({}, {} connected)", self.environment, self.len())
    }
}
