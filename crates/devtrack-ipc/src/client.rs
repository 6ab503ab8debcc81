// SPDX-FileCopyrightText: 2026 DevTrack Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! IPC client: the peer side of the message bus.
//!
//! Used by the intelligence process and by the control surface, which
//! sends operator commands (`prompt_request`) through the same socket.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::UnixStream;
use tokio::sync::Mutex;
use tracing::{info, warn};

use devtrack_core::DevtrackError;

use crate::message::IpcMessage;
use crate::server::IpcHandler;

/// Connect timeout; the daemon socket is local, so this is generous.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// A peer connection to the daemon's IPC socket.
pub struct IpcClient {
    socket_path: PathBuf,
    reader: Mutex<Option<BufReader<OwnedReadHalf>>>,
    writer: Mutex<Option<OwnedWriteHalf>>,
}

impl IpcClient {
    pub fn new(socket_path: impl Into<PathBuf>) -> Self {
        Self {
            socket_path: socket_path.into(),
            reader: Mutex::new(None),
            writer: Mutex::new(None),
        }
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Connect to the server socket. Idempotent while connected.
    pub async fn connect(&self) -> Result<(), DevtrackError> {
        let mut writer = self.writer.lock().await;
        if writer.is_some() {
            return Ok(());
        }

        let stream = tokio::time::timeout(CONNECT_TIMEOUT, UnixStream::connect(&self.socket_path))
            .await
            .map_err(|_| DevtrackError::PeerDisconnected {
                client_id: format!("connect timeout to {}", self.socket_path.display()),
            })?
            .map_err(|e| DevtrackError::BindFailed {
                path: self.socket_path.clone(),
                source: e,
            })?;

        let (read_half, write_half) = stream.into_split();
        *self.reader.lock().await = Some(BufReader::new(read_half));
        *writer = Some(write_half);
        info!(path = %self.socket_path.display(), "connected to IPC server");
        Ok(())
    }

    /// Drop both stream halves. Idempotent.
    pub async fn disconnect(&self) {
        self.reader.lock().await.take();
        self.writer.lock().await.take();
    }

    /// Send one framed message.
    pub async fn send_message(&self, msg: &IpcMessage) -> Result<(), DevtrackError> {
        let line = msg.to_line()?;
        let mut writer = self.writer.lock().await;
        let conn = writer.as_mut().ok_or(DevtrackError::NotRunning)?;
        conn.write_all(line.as_bytes())
            .await
            .map_err(|e| DevtrackError::PeerDisconnected {
                client_id: format!("write failed: {e}"),
            })
    }

    /// Receive the next framed message, blocking until one arrives.
    pub async fn receive_message(&self) -> Result<IpcMessage, DevtrackError> {
        let mut reader = self.reader.lock().await;
        let conn = reader.as_mut().ok_or(DevtrackError::NotRunning)?;

        let mut line = String::new();
        let n = conn
            .read_line(&mut line)
            .await
            .map_err(|e| DevtrackError::PeerDisconnected {
                client_id: format!("read failed: {e}"),
            })?;
        if n == 0 {
            return Err(DevtrackError::PeerDisconnected {
                client_id: "connection closed".to_string(),
            });
        }
        IpcMessage::from_line(&line)
    }

    /// Hand the read half to a background task dispatching every inbound
    /// message to `handler`. The loop ends on disconnect or EOF;
    /// `receive_message` is unavailable afterwards.
    pub async fn start_listening(&self, handler: Arc<dyn IpcHandler>) -> Result<(), DevtrackError> {
        let reader = self
            .reader
            .lock()
            .await
            .take()
            .ok_or(DevtrackError::NotRunning)?;

        tokio::spawn(async move {
            let mut lines = reader.lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        if line.trim().is_empty() {
                            continue;
                        }
                        match IpcMessage::from_line(&line) {
                            Ok(msg) => {
                                if let Err(e) = handler.handle(msg).await {
                                    warn!(error = %e, "client message handler failed");
                                }
                            }
                            Err(e) => {
                                warn!(error = %e, "discarding malformed message from server");
                            }
                        }
                    }
                    Ok(None) => {
                        info!("IPC server closed the connection");
                        break;
                    }
                    Err(e) => {
                        warn!(error = %e, "error reading from IPC server");
                        break;
                    }
                }
            }
        });

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_before_connect_fails() {
        let client = IpcClient::new("/tmp/devtrack-test-nonexistent.sock");
        let err = client.send_message(&IpcMessage::shutdown()).await.unwrap_err();
        assert!(matches!(err, DevtrackError::NotRunning));
    }

    #[tokio::test]
    async fn connect_to_missing_socket_fails() {
        let dir = tempfile::tempdir().unwrap();
        let client = IpcClient::new(dir.path().join("absent.sock"));
        assert!(client.connect().await.is_err());
    }

    #[tokio::test]
    async fn disconnect_is_idempotent() {
        let client = IpcClient::new("/tmp/devtrack-test-any.sock");
        client.disconnect().await;
        client.disconnect().await;
    }
}
