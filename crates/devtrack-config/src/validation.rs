// SPDX-FileCopyrightText: 2026 DevTrack Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes, such as a sane work-hours window and known enum-like strings.

use std::collections::HashSet;

use crate::diagnostic::ConfigError;
use crate::model::DevtrackConfig;

const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];
const VALID_OUTPUT_TYPES: &[&str] = &["email", "teams", "both"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &DevtrackConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.settings.prompt_interval < 1 {
        errors.push(ConfigError::Validation {
            message: format!(
                "settings.prompt_interval must be at least 1, got {}",
                config.settings.prompt_interval
            ),
        });
    }

    let start = config.settings.work_start_hour;
    let end = config.settings.work_end_hour;
    if start >= 24 || end > 24 || start >= end {
        errors.push(ConfigError::Validation {
            message: format!(
                "work hours window must satisfy 0 <= start < end <= 24, got {start}-{end}"
            ),
        });
    }

    if !VALID_LOG_LEVELS.contains(&config.settings.log_level.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "settings.log_level must be one of {VALID_LOG_LEVELS:?}, got `{}`",
                config.settings.log_level
            ),
        });
    }

    let output_type = config.settings.notifications.output_type.as_str();
    if !VALID_OUTPUT_TYPES.contains(&output_type) {
        errors.push(ConfigError::Validation {
            message: format!(
                "notifications.output_type must be one of {VALID_OUTPUT_TYPES:?}, got `{output_type}`"
            ),
        });
    }

    if parse_report_time(&config.settings.notifications.daily_report_time).is_none() {
        errors.push(ConfigError::Validation {
            message: format!(
                "notifications.daily_report_time must be HH:MM, got `{}`",
                config.settings.notifications.daily_report_time
            ),
        });
    }

    let mut seen_paths = HashSet::new();
    for repo in &config.repositories {
        if repo.name.trim().is_empty() {
            errors.push(ConfigError::Validation {
                message: format!(
                    "repository at {} must have a non-empty name",
                    repo.path.display()
                ),
            });
        }
        if repo.path.as_os_str().is_empty() {
            errors.push(ConfigError::Validation {
                message: format!("repository `{}` must have a non-empty path", repo.name),
            });
        }
        if !seen_paths.insert(&repo.path) {
            errors.push(ConfigError::Validation {
                message: format!("duplicate repository path: {}", repo.path.display()),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Parse an `HH:MM` wall-clock label. Returns `(hour, minute)`.
fn parse_report_time(value: &str) -> Option<(u32, u32)> {
    let (h, m) = value.split_once(':')?;
    let hour: u32 = h.parse().ok()?;
    let minute: u32 = m.parse().ok()?;
    (hour < 24 && minute < 60).then_some((hour, minute))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        assert!(validate_config(&DevtrackConfig::default()).is_ok());
    }

    #[test]
    fn zero_interval_rejected() {
        let mut config = DevtrackConfig::default();
        config.settings.prompt_interval = 0;
        let errors = validate_config(&config).unwrap_err();
        assert!(errors[0].to_string().contains("prompt_interval"));
    }

    #[test]
    fn inverted_work_window_rejected() {
        let mut config = DevtrackConfig::default();
        config.settings.work_start_hour = 18;
        config.settings.work_end_hour = 9;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn unknown_output_type_rejected() {
        let mut config = DevtrackConfig::default();
        config.settings.notifications.output_type = "carrier-pigeon".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors[0].to_string().contains("output_type"));
    }

    #[test]
    fn bad_report_time_rejected() {
        let mut config = DevtrackConfig::default();
        config.settings.notifications.daily_report_time = "25:99".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn duplicate_repo_paths_rejected() {
        let mut config = DevtrackConfig::default();
        for _ in 0..2 {
            config.repositories.push(crate::model::RepositoryConfig {
                name: "repo".into(),
                path: "/work/repo".into(),
                enabled: true,
                project: String::new(),
                ignore: Vec::new(),
            });
        }
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(|e| e.to_string().contains("duplicate")));
    }

    #[test]
    fn report_time_parser_bounds() {
        assert_eq!(parse_report_time("18:00"), Some((18, 0)));
        assert_eq!(parse_report_time("24:00"), None);
        assert_eq!(parse_report_time("nope"), None);
    }
}
