//! In-process connection for local runs and tests

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::application::errors::SendError;
use crate::domain::entities::ConnectionId;
use crate::domain::traits::Connection;

/// Records every frame sent to it instead of writing to a socket
#[derive(Debug, Default)]
pub struct MemoryConnection {
    id: ConnectionId,
    frames: Mutex<Vec<String>>,
    closed: AtomicBool,
}

impl MemoryConnection {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Raw frames in the order they were sent
    pub fn frames(&self) -> Vec<String> {
        self.frames.lock().map(|f| f.clone()).unwrap_or_default()
    }

    /// Frames decoded as JSON; frames that fail to decode are skipped
    pub fn envelopes(&self) -> Vec<serde_json::Value> {
        self.frames()
            .iter()
            .filter_map(|frame| serde_json::from_str(frame).ok())
            .collect()
    }

    pub fn last(&self) -> Option<serde_json::Value> {
        self.envelopes().pop()
    }

    pub fn len(&self) -> usize {
        self.frames.lock().map(|f| f.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl Connection for MemoryConnection {
    fn id(&self) -> ConnectionId {
        self.id
    }

    fn send(&self, frame: String) -> Result<(), SendError> {
        if self.is_closed() {
            return Err(SendError::Closed);
        }
        self.frames.lock().map_err(|_| SendError::Closed)?.push(frame);
        Ok(())
    }

    fn close(&self) -> Result<(), SendError> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_until_closed() {
        let connection = MemoryConnection::new();
        connection.send("{\"body\":\"a\"}".to_string()).unwrap();
        assert_eq!(connection.len(), 1);
        assert_eq!(connection.last().unwrap()["body"], "a");

        connection.close().unwrap();
        assert!(connection.is_closed());
        assert_eq!(connection.send("late".to_string()), Err(SendError::Closed));
        assert_eq!(connection.frames().len(), 1);
    }

    #[test]
    fn test_ids_are_distinct() {
        assert_ne!(MemoryConnection::new().id(), MemoryConnection::new().id());
    }
}
