// SPDX-FileCopyrightText: 2026 DevTrack Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Merge order (later overrides earlier): compiled defaults, then
//! `<profile>/config.yaml`, then `DEVTRACK_*` environment variables.
//! On first load, when no config file exists, a default configuration is
//! synthesized and written so the user has something to edit.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use tracing::info;

use devtrack_core::{DevtrackError, ProfileDir};

use crate::model::DevtrackConfig;

/// Load configuration for the given profile directory.
///
/// If no config file exists yet, a default configuration is created,
/// persisted, and returned.
pub fn load(profile: &ProfileDir) -> Result<DevtrackConfig, DevtrackError> {
    let path = profile.config_path();
    if !path.exists() {
        let config = DevtrackConfig::default();
        save(&config, profile)?;
        info!(path = %path.display(), "created default configuration");
        return Ok(config);
    }

    build_figment(&path)
        .extract()
        .map_err(|e| DevtrackError::Config(e.to_string()))
}

/// Load configuration from a YAML string only (no file or env lookup).
///
/// Used for testing and explicit config specification.
pub fn load_from_str(yaml_content: &str) -> Result<DevtrackConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(DevtrackConfig::default()))
        .merge(Yaml::string(yaml_content))
        .extract()
}

/// Build the Figment used for config loading (exposed for diagnostic use).
pub fn build_figment(path: &Path) -> Figment {
    Figment::new()
        .merge(Serialized::defaults(DevtrackConfig::default()))
        .merge(Yaml::file(path))
        .merge(env_provider())
}

/// Persist the configuration atomically: serialize to a temporary sibling
/// file, then rename over the target.
///
/// Secret values are persisted exactly as configured (`${NAME}` placeholders
/// included); resolved values never reach disk.
pub fn save(config: &DevtrackConfig, profile: &ProfileDir) -> Result<(), DevtrackError> {
    profile.ensure()?;
    let path = profile.config_path();
    let tmp = path.with_extension("yaml.tmp");

    let data = serde_yaml::to_string(config)
        .map_err(|e| DevtrackError::Config(format!("failed to serialize config: {e}")))?;

    std::fs::write(&tmp, data).map_err(|e| {
        DevtrackError::Config(format!("failed to write {}: {e}", tmp.display()))
    })?;
    std::fs::rename(&tmp, &path).map_err(|e| {
        DevtrackError::Config(format!("failed to rename into {}: {e}", path.display()))
    })?;
    Ok(())
}

/// Resolve a possibly-placeholder secret value.
///
/// `${NAME}` is looked up in the environment at read time. Returns `None`
/// for empty values and for placeholders that do not resolve, so unresolved
/// secrets are never forwarded to external services.
pub fn resolve_secret(raw: &str) -> Option<String> {
    if raw.is_empty() {
        return None;
    }
    if let Some(name) = raw.strip_prefix("${").and_then(|s| s.strip_suffix('}')) {
        return std::env::var(name).ok().filter(|v| !v.is_empty());
    }
    Some(raw.to_string())
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` NOT `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names: `DEVTRACK_SETTINGS_PROMPT_INTERVAL` must
/// map to `settings.prompt_interval`, not `settings.prompt.interval`.
fn env_provider() -> Env {
    Env::prefixed("DEVTRACK_").map(|key| {
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("settings_", "settings.", 1)
            .replacen("integrations_", "integrations.", 1);
        mapped.into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_load_synthesizes_default_and_saves() {
        let dir = tempfile::tempdir().unwrap();
        let profile = ProfileDir::at(dir.path());

        let config = load(&profile).unwrap();
        assert_eq!(config.settings.prompt_interval, 180);
        assert!(profile.config_path().exists());
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let profile = ProfileDir::at(dir.path());

        let mut config = DevtrackConfig::default();
        config.settings.prompt_interval = 45;
        config.settings.work_hours_only = true;
        config.settings.notifications.output_type = "both".to_string();
        save(&config, &profile).unwrap();

        let loaded = load(&profile).unwrap();
        assert_eq!(loaded.settings.prompt_interval, 45);
        assert!(loaded.settings.work_hours_only);
        assert_eq!(loaded.settings.notifications.output_type, "both");
    }

    #[test]
    fn save_leaves_no_temporary_sibling() {
        let dir = tempfile::tempdir().unwrap();
        let profile = ProfileDir::at(dir.path());

        save(&DevtrackConfig::default(), &profile).unwrap();
        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().is_some_and(|ext| ext == "tmp"))
            .collect();
        assert!(leftovers.is_empty(), "temp file should be renamed away");
    }

    #[test]
    fn save_persists_placeholder_not_resolved_secret() {
        let dir = tempfile::tempdir().unwrap();
        let profile = ProfileDir::at(dir.path());

        save(&DevtrackConfig::default(), &profile).unwrap();
        let raw = std::fs::read_to_string(profile.config_path()).unwrap();
        assert!(raw.contains("${GITHUB_TOKEN}"));
    }

    #[test]
    fn resolve_secret_handles_placeholder_and_literal() {
        // Unset names stay unresolved.
        assert_eq!(resolve_secret("${DEVTRACK_TEST_UNSET_SECRET}"), None);
        assert_eq!(resolve_secret(""), None);
        assert_eq!(resolve_secret("literal-token"), Some("literal-token".into()));
    }
}
