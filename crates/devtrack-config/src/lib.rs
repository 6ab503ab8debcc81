// SPDX-FileCopyrightText: 2026 DevTrack Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the DevTrack daemon.
//!
//! YAML model with per-field defaults, a Figment-based loader with
//! environment overrides, atomic persistence, and semantic validation.

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

pub use loader::{load, load_from_str, resolve_secret, save};
pub use model::DevtrackConfig;
pub use validation::validate_config;

use devtrack_core::{DevtrackError, ProfileDir};

/// Load and validate in one step; validation failures are fatal config errors.
pub fn load_and_validate(profile: &ProfileDir) -> Result<DevtrackConfig, DevtrackError> {
    let config = load(profile)?;
    validate_config(&config).map_err(|errors| {
        diagnostic::render_errors(&errors);
        DevtrackError::Config(format!("{} validation error(s)", errors.len()))
    })?;
    Ok(config)
}
