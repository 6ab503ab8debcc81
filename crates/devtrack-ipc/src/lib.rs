// SPDX-FileCopyrightText: 2026 DevTrack Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Length-free, newline-delimited JSON IPC between the DevTrack daemon and
//! its intelligence peer, over a per-profile Unix domain socket.

pub mod client;
pub mod message;
pub mod server;

pub use client::IpcClient;
pub use message::{
    AckData, CommitTriggerData, IpcMessage, MessageType, TaskUpdateData, TimerTriggerData,
};
pub use server::{FnHandler, IpcHandler, IpcServer};
