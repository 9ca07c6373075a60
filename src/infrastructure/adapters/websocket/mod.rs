//! WebSocket transport
//!
//! Each socket gets a bounded outbound queue drained by its own writer task,
//! so a slow peer only ever fills its own queue. Close requests travel on a
//! separate signal and can't be refused by a full queue. The reader loop
//! feeds the chatroom sequentially, which keeps per-connection ordering.

use async_trait::async_trait;
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;

use crate::application::chatroom::Chatroom;
use crate::application::errors::{SendError, TransportError};
use crate::domain::entities::ConnectionId;
use crate::domain::traits::{Connection, Transport};
use crate::infrastructure::config::ServerConfig;

/// Outbound frames buffered per connection before sends start failing
pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

/// How long a shut-down server waits for clients to finish closing
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// The chatroom's handle on one websocket
#[derive(Debug)]
pub struct WebSocketConnection {
    id: ConnectionId,
    frames: mpsc::Sender<String>,
    closing: watch::Sender<bool>,
}

/// Receiving side drained by a connection's writer task
#[derive(Debug)]
pub struct Outbound {
    frames: mpsc::Receiver<String>,
    closing: watch::Receiver<bool>,
}

impl WebSocketConnection {
    /// A connection plus the receiving end its writer task drains
    pub fn channel(capacity: usize) -> (Self, Outbound) {
        let (frames, frames_rx) = mpsc::channel(capacity.max(1));
        let (closing, closing_rx) = watch::channel(false);
        let connection = Self { id: ConnectionId::new(), frames, closing };
        (connection, Outbound { frames: frames_rx, closing: closing_rx })
    }
}

fn queue_error<T>(err: TrySendError<T>) -> SendError {
    match err {
        TrySendError::Full(_) => SendError::Full,
        TrySendError::Closed(_) => SendError::Closed,
    }
}

impl Connection for WebSocketConnection {
    fn id(&self) -> ConnectionId {
        self.id
    }

    fn send(&self, frame: String) -> Result<(), SendError> {
        self.frames.try_send(frame).map_err(queue_error)
    }

    fn close(&self) -> Result<(), SendError> {
        self.closing.send(true).map_err(|_| SendError::Closed)
    }
}

/// Serves a chatroom over plain websockets
pub struct WebSocketTransport {
    address: String,
    max_message_len: Option<usize>,
    queue_capacity: usize,
}

impl WebSocketTransport {
    pub fn new(server: &ServerConfig) -> Self {
        Self {
            address: server.address(),
            max_message_len: server.max_message_len(),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }

    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// Serve on an already-bound listener. On shutdown the room is shut
    /// down (if nobody did it yet) and clients get a short grace period to
    /// finish the close handshake.
    pub async fn serve_on(
        &self,
        listener: TcpListener,
        room: Arc<Chatroom>,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<(), TransportError> {
        tracing::info!("Listening on ws://{}", listener.local_addr()?);

        while !*shutdown.borrow() {
            tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        let room = room.clone();
                        let limit = self.max_message_len;
                        let capacity = self.queue_capacity;
                        tokio::spawn(async move {
                            if let Err(e) = handle_socket(stream, peer, room, limit, capacity).await {
                                tracing::warn!("Connection from {} ended with error: {}", peer, e);
                            }
                        });
                    }
                    Err(e) => tracing::warn!("Accept failed: {}", e),
                },
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        if !room.is_shut_down() {
            let report = room.shutdown()?;
            tracing::info!("Shutdown notice delivered to {} connections", report.delivered);
        }

        let drained = tokio::time::timeout(SHUTDOWN_GRACE, async {
            while !room.is_empty() {
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
        })
        .await;
        if drained.is_err() {
            tracing::warn!("{} connections still open after shutdown grace period", room.len());
        }

        Ok(())
    }
}

#[async_trait]
impl Transport for WebSocketTransport {
    async fn serve(
        &self,
        room: Arc<Chatroom>,
        shutdown: watch::Receiver<bool>,
    ) -> Result<(), TransportError> {
        let listener = TcpListener::bind(&self.address).await?;
        self.serve_on(listener, room, shutdown).await
    }

    fn name(&self) -> &str {
        "websocket"
    }
}

async fn handle_socket(
    stream: TcpStream,
    peer: SocketAddr,
    room: Arc<Chatroom>,
    max_message_len: Option<usize>,
    queue_capacity: usize,
) -> Result<(), TransportError> {
    let ws = tokio_tungstenite::accept_async(stream)
        .await
        .map_err(|e| TransportError::Handshake(e.to_string()))?;
    let (sink, mut source) = ws.split();

    let (connection, outbound) = WebSocketConnection::channel(queue_capacity);
    let connection = Arc::new(connection);
    let id = connection.id();
    tracing::debug!("{} connected from {}", id, peer);

    let writer = tokio::spawn(write_frames(sink, outbound, id));

    if let Err(e) = room.join(connection.clone(), None) {
        let _ = connection.close();
        drop(connection);
        let _ = writer.await;
        return Err(e.into());
    }

    while let Some(message) = source.next().await {
        match message {
            Ok(Message::Text(text)) => {
                let text = truncate(text.as_str(), max_message_len);
                if let Err(e) = room.handle_message(id, text) {
                    tracing::warn!("Message from {} failed: {}", id, e);
                }
            }
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                tracing::debug!("Read from {} failed: {}", id, e);
                break;
            }
        }
    }

    if let Err(e) = room.leave(id) {
        tracing::debug!("Leave for {} failed: {}", id, e);
    }
    // The registry's handle is gone; dropping ours lets the writer finish
    drop(connection);
    let _ = writer.await;
    tracing::debug!("{} disconnected", id);
    Ok(())
}

/// Write queued frames until the connection is closed or dropped. A close
/// request flushes whatever is already queued before the close handshake.
async fn write_frames(
    mut sink: SplitSink<WebSocketStream<TcpStream>, Message>,
    mut outbound: Outbound,
    id: ConnectionId,
) {
    loop {
        tokio::select! {
            biased;
            frame = outbound.frames.recv() => {
                let Some(text) = frame else { break };
                if let Err(e) = sink.send(Message::Text(text.into())).await {
                    tracing::debug!("Write to {} failed: {}", id, e);
                    return;
                }
            }
            changed = outbound.closing.changed() => {
                if changed.is_ok() {
                    while let Ok(text) = outbound.frames.try_recv() {
                        if let Err(e) = sink.send(Message::Text(text.into())).await {
                            tracing::debug!("Write to {} failed: {}", id, e);
                            return;
                        }
                    }
                }
                break;
            }
        }
    }

    if let Err(e) = sink.close().await {
        tracing::debug!("Close for {} failed: {}", id, e);
    }
}

/// Cut `text` to at most `limit` characters
fn truncate(text: &str, limit: Option<usize>) -> &str {
    match limit.and_then(|limit| text.char_indices().nth(limit)) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::config::{Config, ServerConfig};
    use crate::infrastructure::names::NameGenerator;
    use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

    type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

    fn test_room() -> Chatroom {
        let config = Config::default();
        let names = NameGenerator::from_words(["brave"], ["otter"]).unwrap();
        Chatroom::with_name_generator(config.chat, config.meta, names)
    }

    async fn next_envelope(client: &mut Client) -> serde_json::Value {
        loop {
            let message = tokio::time::timeout(Duration::from_secs(5), client.next())
                .await
                .expect("timed out waiting for a frame")
                .expect("stream ended")
                .expect("read failed");
            if let Message::Text(text) = message {
                return serde_json::from_str(text.as_str()).unwrap();
            }
        }
    }

    async fn read_until_closed(client: &mut Client) {
        let _ = tokio::time::timeout(Duration::from_secs(5), async {
            while let Some(Ok(message)) = client.next().await {
                if message.is_close() {
                    break;
                }
            }
        })
        .await;
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("hello world", Some(5)), "hello");
        assert_eq!(truncate("héllo", Some(2)), "hé");
        assert_eq!(truncate("short", Some(50)), "short");
        assert_eq!(truncate("unbounded", None), "unbounded");
        assert_eq!(truncate("gone", Some(0)), "");
    }

    #[test]
    fn test_full_queue_reports_full() {
        let (connection, _rx) = WebSocketConnection::channel(1);
        connection.send("one".to_string()).unwrap();
        assert_eq!(connection.send("two".to_string()), Err(SendError::Full));
    }

    #[test]
    fn test_dropped_writer_reports_closed() {
        let (connection, rx) = WebSocketConnection::channel(4);
        drop(rx);
        assert_eq!(connection.send("x".to_string()), Err(SendError::Closed));
        assert_eq!(connection.close(), Err(SendError::Closed));
    }

    #[test]
    fn test_shutdown_closes_connection_with_full_queue() {
        let room = test_room();
        let (connection, mut outbound) = WebSocketConnection::channel(2);
        let connection = Arc::new(connection);
        room.join(connection.clone(), None).unwrap();

        // The greeting holds one slot, the shutdown notice takes the last
        let report = room.shutdown().unwrap();
        assert_eq!(report.delivered, 1);
        assert!(report.is_complete());
        assert_eq!(connection.send("late".to_string()), Err(SendError::Full));
        assert!(*outbound.closing.borrow());

        let mut queued = Vec::new();
        while let Ok(frame) = outbound.frames.try_recv() {
            queued.push(frame);
        }
        assert_eq!(queued.len(), 2);
        assert!(queued[1].contains("The server is shutting down. Goodbye!"));
    }

    #[test]
    fn test_shutdown_reports_failed_close() {
        let room = test_room();
        let (connection, outbound) = WebSocketConnection::channel(4);
        let connection = Arc::new(connection);
        room.join(connection.clone(), None).unwrap();
        drop(outbound.closing);

        let report = room.shutdown().unwrap();
        assert_eq!(report.delivered, 1);
        assert_eq!(report.failed, vec![(connection.id(), SendError::Closed)]);
    }

    #[tokio::test]
    async fn test_chat_over_websocket_then_shutdown() {
        let room = Arc::new(test_room());
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let transport = WebSocketTransport::new(&ServerConfig {
            host: "127.0.0.1".to_string(),
            port: addr.port(),
            max_message_len: 5,
        })
        .with_queue_capacity(4);
        let server = tokio::spawn({
            let room = room.clone();
            async move { transport.serve_on(listener, room, shutdown_rx).await }
        });

        let (mut alice, _) = connect_async(format!("ws://{}", addr)).await.unwrap();
        let greeting = next_envelope(&mut alice).await;
        assert_eq!(greeting["origin"], "SERVER");
        assert!(greeting["body"].as_str().unwrap().contains("BraveOtter"));

        let (mut bob, _) = connect_async(format!("ws://{}", addr)).await.unwrap();
        next_envelope(&mut bob).await;
        let joined = next_envelope(&mut alice).await;
        assert_eq!(joined["body"], "BraveOtter has joined the chat");

        alice.send(Message::Text("hello world".to_string().into())).await.unwrap();
        let line = next_envelope(&mut bob).await;
        assert_eq!(line["origin"], "USER");
        assert_eq!(line["body"], "BraveOtter: hello");
        let echo = next_envelope(&mut alice).await;
        assert_eq!(echo["origin"], "SELF");

        shutdown_tx.send(true).unwrap();
        for client in [&mut alice, &mut bob] {
            let notice = next_envelope(client).await;
            assert_eq!(notice["body"], "The server is shutting down. Goodbye!");
            read_until_closed(client).await;
        }

        tokio::time::timeout(Duration::from_secs(5), server)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert!(room.is_shut_down());
    }
}
