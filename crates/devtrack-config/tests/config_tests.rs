// SPDX-FileCopyrightText: 2026 DevTrack Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the DevTrack configuration system.

use devtrack_config::diagnostic::suggest_key;
use devtrack_config::{load_from_str, validate_config};

/// Valid YAML with all known fields deserializes successfully.
#[test]
fn valid_yaml_deserializes_into_config() {
    let yaml = r#"
version: "1.0.0"
repositories:
  - name: automation-tools
    path: /work/automation-tools
    enabled: true
    project: DevTrack
settings:
  prompt_interval: 60
  work_hours_only: true
  work_start_hour: 8
  work_end_hour: 17
  log_level: debug
  notifications:
    output_type: both
    daily_report_time: "17:30"
integrations:
  github:
    enabled: true
    owner: acme
    repo: widgets
"#;

    let config = load_from_str(yaml).expect("valid YAML should deserialize");
    assert_eq!(config.repositories.len(), 1);
    assert_eq!(config.repositories[0].name, "automation-tools");
    assert_eq!(config.repositories[0].project, "DevTrack");
    assert_eq!(config.settings.prompt_interval, 60);
    assert!(config.settings.work_hours_only);
    assert_eq!(config.settings.work_start_hour, 8);
    assert_eq!(config.settings.work_end_hour, 17);
    assert_eq!(config.settings.log_level, "debug");
    assert_eq!(config.settings.notifications.output_type, "both");
    assert_eq!(config.settings.notifications.daily_report_time, "17:30");
    assert!(config.integrations.github.enabled);
    assert_eq!(config.integrations.github.owner, "acme");
    // Untouched sections keep their defaults.
    assert_eq!(config.integrations.github.token, "${GITHUB_TOKEN}");
    assert!(!config.integrations.jira.enabled);
    assert!(validate_config(&config).is_ok());
}

/// Empty input produces the documented defaults.
#[test]
fn empty_yaml_uses_defaults() {
    let config = load_from_str("").expect("empty YAML should use defaults");
    assert_eq!(config.version, "1.0.0");
    assert_eq!(config.settings.prompt_interval, 180);
    assert!(!config.settings.work_hours_only);
    assert_eq!(config.settings.work_start_hour, 9);
    assert_eq!(config.settings.work_end_hour, 18);
    assert_eq!(config.settings.notifications.output_type, "email");
    assert!(config.repositories.is_empty());
}

/// Unknown keys are rejected at load time.
#[test]
fn unknown_key_is_rejected() {
    let yaml = "settings:\n  promt_interval: 30\n";
    let err = load_from_str(yaml).expect_err("should reject unknown field");
    let err_str = format!("{err}");
    assert!(
        err_str.contains("unknown field") || err_str.contains("promt_interval"),
        "error should mention the bad key, got: {err_str}"
    );
}

/// The fuzzy matcher proposes the intended key for a close typo.
#[test]
fn typo_gets_a_suggestion() {
    let valid = &[
        "prompt_interval",
        "work_hours_only",
        "work_start_hour",
        "work_end_hour",
        "log_level",
    ];
    assert_eq!(
        suggest_key("promt_interval", valid),
        Some("prompt_interval".to_string())
    );
}

/// Partial settings merge over defaults rather than replacing the section.
#[test]
fn partial_settings_keep_remaining_defaults() {
    let config = load_from_str("settings:\n  prompt_interval: 15\n").unwrap();
    assert_eq!(config.settings.prompt_interval, 15);
    assert_eq!(config.settings.work_start_hour, 9);
    assert_eq!(config.settings.log_level, "info");
}
