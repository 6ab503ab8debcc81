// SPDX-FileCopyrightText: 2026 DevTrack Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared test tooling for the DevTrack workspace.

pub mod harness;

pub use harness::TestHarness;
