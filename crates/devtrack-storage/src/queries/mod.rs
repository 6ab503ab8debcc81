// SPDX-FileCopyrightText: 2026 DevTrack Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed query modules, one per table plus maintenance.

pub mod config;
pub mod logs;
pub mod maintenance;
pub mod responses;
pub mod task_updates;
pub mod triggers;
