use chrono::{DateTime, Local};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::traits::Connection;

/// Stable identity of a transport connection, used as the registry key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A registered identity attached to one live connection.
///
/// Values handed out by the chatroom are snapshots; renaming goes through
/// [`Chatroom::rename`](crate::application::chatroom::Chatroom::rename).
#[derive(Clone)]
pub struct Participant {
    pub id: Uuid,
    pub name: String,
    pub joined_at: DateTime<Local>,
    pub connection: Arc<dyn Connection>,
}

impl Participant {
    pub fn new(connection: Arc<dyn Connection>, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            joined_at: Local::now(),
            connection,
        }
    }

    pub fn connection_id(&self) -> ConnectionId {
        self.connection.id()
    }
}

impl fmt::Debug for Participant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Participant")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("joined_at", &self.joined_at)
            .field("connection", &self.connection.id())
            .finish()
    }
}

impl fmt::Display for Participant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}, joined {})",
            self.name,
            self.id,
            self.joined_at.format("%Y-%m-%d %H:%M")
        )
    }
}
