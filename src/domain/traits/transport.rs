use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::watch;

use crate::application::chatroom::Chatroom;
use crate::application::errors::TransportError;

/// Transport trait - abstraction for the listener that feeds a chatroom.
///
/// Implementations call `join` on connect, `handle_message` for each inbound
/// text frame and `leave` on disconnect, never overlapping for one connection.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Accept connections until `shutdown` flips to `true`
    async fn serve(
        &self,
        room: Arc<Chatroom>,
        shutdown: watch::Receiver<bool>,
    ) -> Result<(), TransportError>;

    /// Short human-readable name for logs
    fn name(&self) -> &str;
}
