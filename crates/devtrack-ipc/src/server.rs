// SPDX-FileCopyrightText: 2026 DevTrack Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! IPC server: one Unix-domain-socket listener, many peers.
//!
//! Server-originated messages are broadcast to every connected peer; with
//! no peer connected the message is logged and dropped (the event store
//! already holds the trigger). Inbound messages are dispatched to the
//! handler registered for their type, in arrival order per connection.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::UnixListener;
use tokio::sync::{Mutex, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use devtrack_core::DevtrackError;

use crate::message::{IpcMessage, MessageType};

/// Grace period between the shutdown broadcast and closing connections.
const SHUTDOWN_GRACE: Duration = Duration::from_millis(500);

/// Receiver side of the handler registry.
#[async_trait]
pub trait IpcHandler: Send + Sync {
    async fn handle(&self, msg: IpcMessage) -> Result<(), DevtrackError>;
}

/// Adapter so plain async closures can be registered as handlers.
pub struct FnHandler<F>(pub F);

#[async_trait]
impl<F, Fut> IpcHandler for FnHandler<F>
where
    F: Fn(IpcMessage) -> Fut + Send + Sync,
    Fut: std::future::Future<Output = Result<(), DevtrackError>> + Send,
{
    async fn handle(&self, msg: IpcMessage) -> Result<(), DevtrackError> {
        (self.0)(msg).await
    }
}

type HandlerMap = Arc<RwLock<HashMap<MessageType, Arc<dyn IpcHandler>>>>;
type ClientMap = Arc<Mutex<HashMap<String, OwnedWriteHalf>>>;

/// The daemon-side message bus endpoint.
pub struct IpcServer {
    socket_path: PathBuf,
    clients: ClientMap,
    handlers: HandlerMap,
    cancel: CancellationToken,
}

impl IpcServer {
    pub fn new(socket_path: impl Into<PathBuf>) -> Self {
        Self {
            socket_path: socket_path.into(),
            clients: Arc::new(Mutex::new(HashMap::new())),
            handlers: Arc::new(RwLock::new(HashMap::new())),
            cancel: CancellationToken::new(),
        }
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Register the handler for a message type, replacing any previous one.
    pub async fn register_handler(&self, message_type: MessageType, handler: Arc<dyn IpcHandler>) {
        self.handlers.write().await.insert(message_type, handler);
    }

    /// Bind the socket and spawn the accept loop.
    pub async fn start(&self) -> Result<(), DevtrackError> {
        if let Some(parent) = self.socket_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| DevtrackError::BindFailed {
                path: self.socket_path.clone(),
                source: e,
            })?;
        }
        // A previous unclean shutdown may have left the endpoint behind.
        if self.socket_path.exists() {
            std::fs::remove_file(&self.socket_path).map_err(|e| DevtrackError::BindFailed {
                path: self.socket_path.clone(),
                source: e,
            })?;
        }

        let listener =
            UnixListener::bind(&self.socket_path).map_err(|e| DevtrackError::BindFailed {
                path: self.socket_path.clone(),
                source: e,
            })?;
        info!(path = %self.socket_path.display(), "IPC server listening");

        let clients = self.clients.clone();
        let handlers = self.handlers.clone();
        let cancel = self.cancel.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        debug!("IPC accept loop shutting down");
                        return;
                    }
                    accepted = listener.accept() => {
                        let stream = match accepted {
                            Ok((stream, _addr)) => stream,
                            Err(e) => {
                                warn!(error = %e, "error accepting IPC connection");
                                continue;
                            }
                        };

                        let client_id = format!("client-{}", Uuid::new_v4());
                        let (read_half, write_half) = stream.into_split();
                        clients.lock().await.insert(client_id.clone(), write_half);
                        info!(client = %client_id, "IPC client connected");

                        tokio::spawn(handle_client(
                            client_id,
                            read_half,
                            clients.clone(),
                            handlers.clone(),
                            cancel.clone(),
                        ));
                    }
                }
            }
        });

        Ok(())
    }

    /// Broadcast a server-originated message to every connected peer.
    ///
    /// With no peer connected the message is dropped; the corresponding
    /// trigger row in the event store preserves the information.
    pub async fn send_message(&self, msg: &IpcMessage) -> Result<(), DevtrackError> {
        let line = msg.to_line()?;

        let mut clients = self.clients.lock().await;
        if clients.is_empty() {
            debug!(message_type = %msg.message_type, "no IPC clients connected, message dropped");
            return Ok(());
        }

        let mut dead = Vec::new();
        for (id, conn) in clients.iter_mut() {
            if let Err(e) = conn.write_all(line.as_bytes()).await {
                warn!(client = %id, error = %e, "error sending IPC message");
                dead.push(id.clone());
            }
        }
        for id in dead {
            clients.remove(&id);
            info!(client = %id, "IPC client dropped on write failure");
        }
        Ok(())
    }

    /// Number of currently connected peers.
    pub async fn client_count(&self) -> usize {
        self.clients.lock().await.len()
    }

    /// Broadcast `shutdown`, give peers a grace period to observe it, then
    /// close all connections and remove the socket endpoint.
    pub async fn stop(&self) {
        if self.send_message(&IpcMessage::shutdown()).await.is_err() {
            warn!("failed to broadcast shutdown message");
        }
        tokio::time::sleep(SHUTDOWN_GRACE).await;

        self.cancel.cancel();
        self.clients.lock().await.clear();

        if self.socket_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.socket_path) {
                warn!(error = %e, "failed to remove socket file");
            }
        }
        info!("IPC server stopped");
    }
}

/// Per-connection read loop: frames are processed in arrival order.
async fn handle_client(
    client_id: String,
    read_half: OwnedReadHalf,
    clients: ClientMap,
    handlers: HandlerMap,
    cancel: CancellationToken,
) {
    let mut lines = BufReader::new(read_half).lines();

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            line = lines.next_line() => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) => {
                        // EOF: peer went away. Observed and logged; not fatal.
                        info!(client = %client_id, "IPC client disconnected");
                        break;
                    }
                    Err(e) => {
                        warn!(client = %client_id, error = %e, "error reading from IPC client");
                        break;
                    }
                };
                if line.trim().is_empty() {
                    continue;
                }

                let msg = match IpcMessage::from_line(&line) {
                    Ok(msg) => msg,
                    Err(e) => {
                        warn!(client = %client_id, error = %e, "discarding malformed message");
                        continue;
                    }
                };

                if msg.message_type == MessageType::Unknown {
                    warn!(client = %client_id, "discarding message of unknown type");
                    continue;
                }

                let handler = handlers.read().await.get(&msg.message_type).cloned();
                match handler {
                    Some(handler) => {
                        if let Err(e) = handler.handle(msg).await {
                            warn!(client = %client_id, error = %e, "message handler failed");
                        }
                    }
                    None => {
                        warn!(
                            client = %client_id,
                            message_type = %msg.message_type,
                            "no handler registered for message type"
                        );
                    }
                }
            }
        }
    }

    clients.lock().await.remove(&client_id);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::IpcClient;
    use crate::message::TaskUpdateData;
    use tokio::sync::mpsc;

    fn temp_socket() -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("devtrack.sock");
        (dir, path)
    }

    #[tokio::test]
    async fn broadcast_with_no_clients_is_dropped_not_an_error() {
        let (_dir, path) = temp_socket();
        let server = IpcServer::new(&path);
        server.start().await.unwrap();

        server
            .send_message(&IpcMessage::shutdown())
            .await
            .expect("dropping with no clients is fine");
        assert_eq!(server.client_count().await, 0);

        server.stop().await;
    }

    #[tokio::test]
    async fn stop_removes_socket_endpoint() {
        let (_dir, path) = temp_socket();
        let server = IpcServer::new(&path);
        server.start().await.unwrap();
        assert!(path.exists());

        server.stop().await;
        assert!(!path.exists(), "socket removed on stop");
    }

    #[tokio::test]
    async fn inbound_message_reaches_registered_handler() {
        let (_dir, path) = temp_socket();
        let server = IpcServer::new(&path);
        let (tx, mut rx) = mpsc::channel::<IpcMessage>(4);
        server
            .register_handler(
                MessageType::TaskUpdate,
                Arc::new(FnHandler(move |msg: IpcMessage| {
                    let tx = tx.clone();
                    async move {
                        tx.send(msg).await.ok();
                        Ok(())
                    }
                })),
            )
            .await;
        server.start().await.unwrap();

        let client = IpcClient::new(&path);
        client.connect().await.unwrap();
        let sent = IpcMessage::task_update(&TaskUpdateData {
            project: "P".into(),
            ticket_id: "P-1".into(),
            description: "Fixed".into(),
            status: "in_progress".into(),
            time_spent: "1h".into(),
            synced: false,
        });
        client.send_message(&sent).await.unwrap();

        let received = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(received.id, sent.id);
        let data: TaskUpdateData = received.parse_data().unwrap();
        assert_eq!(data.ticket_id, "P-1");

        client.disconnect().await;
        server.stop().await;
    }

    #[tokio::test]
    async fn broadcast_reaches_connected_client() {
        let (_dir, path) = temp_socket();
        let server = IpcServer::new(&path);
        server.start().await.unwrap();

        let client = IpcClient::new(&path);
        client.connect().await.unwrap();
        // Wait for the server to register the connection.
        tokio::time::timeout(Duration::from_secs(5), async {
            while server.client_count().await == 0 {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap();

        let sent = IpcMessage::new(MessageType::StatusQuery, serde_json::json!({}));
        server.send_message(&sent).await.unwrap();

        let received = tokio::time::timeout(Duration::from_secs(5), client.receive_message())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(received.message_type, MessageType::StatusQuery);
        assert_eq!(received.id, sent.id);

        client.disconnect().await;
        server.stop().await;
    }

    #[tokio::test]
    async fn stop_broadcasts_shutdown_and_unlinks_socket() {
        let (_dir, path) = temp_socket();
        let server = IpcServer::new(&path);
        server.start().await.unwrap();

        let client = IpcClient::new(&path);
        client.connect().await.unwrap();
        tokio::time::timeout(Duration::from_secs(5), async {
            while server.client_count().await == 0 {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap();

        let ((), received) = tokio::join!(server.stop(), client.receive_message());
        assert_eq!(received.unwrap().message_type, MessageType::Shutdown);
        assert!(!path.exists());
    }
}
