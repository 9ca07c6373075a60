use crate::application::errors::SendError;
use crate::domain::entities::ConnectionId;

/// Connection trait - the capability a transport endpoint exposes to the chatroom.
///
/// `send` must not block: implementations hand the frame to a per-connection
/// outbound path (a queue, a buffer) and report `Full` or `Closed` instead of
/// waiting on a slow peer.
pub trait Connection: Send + Sync {
    /// Identity used as the registry key; stable for the connection's lifetime
    fn id(&self) -> ConnectionId;

    /// Queue one serialized frame for delivery
    fn send(&self, frame: String) -> Result<(), SendError>;

    /// Ask the transport to close the connection after queued frames
    fn close(&self) -> Result<(), SendError>;
}
