// SPDX-FileCopyrightText: 2026 DevTrack Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Graceful shutdown and reload coordination with signal handling.
//!
//! SIGTERM and SIGINT (Ctrl+C) cancel the returned token, which every
//! worker monitors between suspension points. SIGHUP requests a config
//! reload without restarting the daemon.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Install handlers for SIGINT, SIGTERM, and (on POSIX) SIGHUP.
///
/// Returns the shutdown token plus a channel that receives one unit per
/// reload request. The handler task runs until shutdown is triggered.
pub fn install_signal_handler() -> (CancellationToken, mpsc::Receiver<()>) {
    let token = CancellationToken::new();
    let token_clone = token.clone();
    let (reload_tx, reload_rx) = mpsc::channel(4);

    tokio::spawn(async move {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            let mut sigterm =
                signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
            let mut sighup =
                signal(SignalKind::hangup()).expect("failed to install SIGHUP handler");

            loop {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {
                        info!("received SIGINT (Ctrl+C), initiating shutdown");
                        break;
                    }
                    _ = sigterm.recv() => {
                        info!("received SIGTERM, initiating shutdown");
                        break;
                    }
                    _ = sighup.recv() => {
                        info!("received SIGHUP, requesting configuration reload");
                        let _ = reload_tx.send(()).await;
                    }
                }
            }
        }

        #[cfg(not(unix))]
        {
            let _ = tokio::signal::ctrl_c().await;
            info!("received Ctrl+C, initiating shutdown");
            drop(reload_tx);
        }

        token_clone.cancel();
        debug!("shutdown signal handler completed");
    });

    (token, reload_rx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn handler_returns_uncancelled_token() {
        let (token, _reload) = install_signal_handler();
        assert!(!token.is_cancelled());
        // Cancel manually to clean up the background task.
        token.cancel();
    }
}
