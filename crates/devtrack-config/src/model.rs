// SPDX-FileCopyrightText: 2026 DevTrack Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the DevTrack daemon.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages. The on-disk
//! format is YAML at `<profile>/config.yaml`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use devtrack_core::DevtrackError;

/// Top-level DevTrack configuration.
///
/// Loaded from `<profile>/config.yaml` with `DEVTRACK_*` environment
/// variable overrides. Every field has a defined default.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DevtrackConfig {
    /// Config format version.
    #[serde(default = "default_version")]
    pub version: String,

    /// Watched Git repositories.
    #[serde(default)]
    pub repositories: Vec<RepositoryConfig>,

    /// General daemon settings.
    #[serde(default)]
    pub settings: Settings,

    /// Task-tracker integration settings. The core never calls these
    /// services; it round-trips and validates them for the intelligence peer.
    #[serde(default)]
    pub integrations: Integrations,
}

impl Default for DevtrackConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            repositories: Vec::new(),
            settings: Settings::default(),
            integrations: Integrations::default(),
        }
    }
}

fn default_version() -> String {
    "1.0.0".to_string()
}

impl DevtrackConfig {
    /// Repositories with `enabled = true`.
    pub fn enabled_repositories(&self) -> Vec<&RepositoryConfig> {
        self.repositories.iter().filter(|r| r.enabled).collect()
    }

    /// Add a repository to the watch list.
    ///
    /// Fails if the path is already configured or does not contain a `.git`
    /// directory. The caller is responsible for persisting via `save`.
    pub fn add_repository(
        &mut self,
        name: &str,
        path: &Path,
        project: &str,
    ) -> Result<(), DevtrackError> {
        if self.repositories.iter().any(|r| r.path == path) {
            return Err(DevtrackError::Config(format!(
                "repository already configured: {}",
                path.display()
            )));
        }
        if !path.join(".git").is_dir() {
            return Err(DevtrackError::NotARepository {
                path: path.to_path_buf(),
            });
        }
        self.repositories.push(RepositoryConfig {
            name: name.to_string(),
            path: path.to_path_buf(),
            enabled: true,
            project: project.to_string(),
            ignore: Vec::new(),
        });
        Ok(())
    }

    /// Remove a repository by path. Fails if no repository matches.
    pub fn remove_repository(&mut self, path: &Path) -> Result<(), DevtrackError> {
        let before = self.repositories.len();
        self.repositories.retain(|r| r.path != path);
        if self.repositories.len() == before {
            return Err(DevtrackError::Config(format!(
                "repository not found: {}",
                path.display()
            )));
        }
        Ok(())
    }
}

/// A single watched Git repository.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RepositoryConfig {
    /// Logical display name.
    pub name: String,
    /// Absolute path to the working copy.
    pub path: PathBuf,
    /// Whether the watcher is attached to this repository.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Owning project label forwarded to the intelligence peer.
    #[serde(default)]
    pub project: String,
    /// Branches or paths to ignore.
    #[serde(default)]
    pub ignore: Vec<String>,
}

/// General daemon settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Minutes between timer prompts.
    #[serde(default = "default_prompt_interval")]
    pub prompt_interval: u32,

    /// Suppress timer triggers outside the work window.
    #[serde(default)]
    pub work_hours_only: bool,

    /// Start of work hours, 24h local time.
    #[serde(default = "default_work_start_hour")]
    pub work_start_hour: u32,

    /// End of work hours, 24h local time (exclusive).
    #[serde(default = "default_work_end_hour")]
    pub work_end_hour: u32,

    /// IANA timezone label for report rendering. The gate itself uses the
    /// host's local clock.
    #[serde(default = "default_timezone")]
    pub timezone: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Automatically push accumulated task updates.
    #[serde(default = "default_true")]
    pub auto_sync: bool,

    /// Notification and report output settings.
    #[serde(default)]
    pub notifications: Notifications,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            prompt_interval: default_prompt_interval(),
            work_hours_only: false,
            work_start_hour: default_work_start_hour(),
            work_end_hour: default_work_end_hour(),
            timezone: default_timezone(),
            log_level: default_log_level(),
            auto_sync: true,
            notifications: Notifications::default(),
        }
    }
}

fn default_prompt_interval() -> u32 {
    180
}

fn default_work_start_hour() -> u32 {
    9
}

fn default_work_end_hour() -> u32 {
    18
}

fn default_timezone() -> String {
    "local".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

/// Notification and report output settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Notifications {
    /// Output channel: "email", "teams", or "both".
    #[serde(default = "default_output_type")]
    pub output_type: String,

    /// Time to send the daily report, HH:MM local.
    #[serde(default = "default_daily_report_time")]
    pub daily_report_time: String,

    /// Weekday for the weekly report.
    #[serde(default = "default_weekly_report_day")]
    pub weekly_report_day: String,

    /// Send a notification on every trigger.
    #[serde(default)]
    pub send_on_trigger: bool,

    /// Send the end-of-day summary.
    #[serde(default = "default_true")]
    pub send_daily_summary: bool,

    #[serde(default)]
    pub email: EmailOutput,

    #[serde(default)]
    pub teams: TeamsOutput,
}

impl Default for Notifications {
    fn default() -> Self {
        Self {
            output_type: default_output_type(),
            daily_report_time: default_daily_report_time(),
            weekly_report_day: default_weekly_report_day(),
            send_on_trigger: false,
            send_daily_summary: true,
            email: EmailOutput::default(),
            teams: TeamsOutput::default(),
        }
    }
}

fn default_output_type() -> String {
    "email".to_string()
}

fn default_daily_report_time() -> String {
    "18:00".to_string()
}

fn default_weekly_report_day() -> String {
    "Friday".to_string()
}

/// Email report output settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EmailOutput {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub to_addresses: Vec<String>,
    #[serde(default)]
    pub cc_addresses: Vec<String>,
    #[serde(default = "default_email_subject")]
    pub subject: String,
    #[serde(default)]
    pub manager_email: String,
}

impl Default for EmailOutput {
    fn default() -> Self {
        Self {
            enabled: true,
            to_addresses: Vec::new(),
            cc_addresses: Vec::new(),
            subject: default_email_subject(),
            manager_email: String::new(),
        }
    }
}

fn default_email_subject() -> String {
    "DevTrack Daily Report".to_string()
}

/// Teams report output settings.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TeamsOutput {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub channel_id: String,
    #[serde(default = "default_teams_channel_name")]
    pub channel_name: String,
    #[serde(default)]
    pub chat_id: String,
    /// "channel" or "chat".
    #[serde(default = "default_chat_type")]
    pub chat_type: String,
    #[serde(default)]
    pub webhook_url: String,
    #[serde(default)]
    pub mention_user: bool,
}

fn default_teams_channel_name() -> String {
    "DevTrack Updates".to_string()
}

fn default_chat_type() -> String {
    "channel".to_string()
}

/// Task-tracker integration settings.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Integrations {
    #[serde(default)]
    pub azure_devops: AzureDevOpsIntegration,
    #[serde(default)]
    pub github: GitHubIntegration,
    #[serde(default)]
    pub jira: JiraIntegration,
}

/// Azure DevOps integration settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AzureDevOpsIntegration {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub organization: String,
    #[serde(default)]
    pub project: String,
    /// Personal access token; written as a `${NAME}` placeholder and
    /// resolved from the environment at read time.
    #[serde(default = "default_azure_pat")]
    pub pat: String,
}

impl Default for AzureDevOpsIntegration {
    fn default() -> Self {
        Self {
            enabled: false,
            organization: String::new(),
            project: String::new(),
            pat: default_azure_pat(),
        }
    }
}

fn default_azure_pat() -> String {
    "${AZURE_DEVOPS_PAT}".to_string()
}

/// GitHub integration settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GitHubIntegration {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub repo: String,
    #[serde(default = "default_github_token")]
    pub token: String,
}

impl Default for GitHubIntegration {
    fn default() -> Self {
        Self {
            enabled: false,
            owner: String::new(),
            repo: String::new(),
            token: default_github_token(),
        }
    }
}

fn default_github_token() -> String {
    "${GITHUB_TOKEN}".to_string()
}

/// JIRA integration settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct JiraIntegration {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub project: String,
    #[serde(default)]
    pub username: String,
    #[serde(default = "default_jira_token")]
    pub api_token: String,
}

impl Default for JiraIntegration {
    fn default() -> Self {
        Self {
            enabled: false,
            url: String::new(),
            project: String::new(),
            username: String::new(),
            api_token: default_jira_token(),
        }
    }
}

fn default_jira_token() -> String {
    "${JIRA_API_TOKEN}".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = DevtrackConfig::default();
        assert_eq!(config.settings.prompt_interval, 180);
        assert!(!config.settings.work_hours_only);
        assert_eq!(config.settings.work_start_hour, 9);
        assert_eq!(config.settings.work_end_hour, 18);
        assert_eq!(config.settings.notifications.output_type, "email");
        assert!(!config.integrations.azure_devops.enabled);
        assert!(!config.integrations.github.enabled);
        assert!(!config.integrations.jira.enabled);
        assert!(config.repositories.is_empty());
    }

    #[test]
    fn add_repository_rejects_non_git_path() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = DevtrackConfig::default();
        let err = config
            .add_repository("plain", dir.path(), "Proj")
            .unwrap_err();
        assert!(matches!(err, DevtrackError::NotARepository { .. }));
    }

    #[test]
    fn add_repository_rejects_duplicate_path() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join(".git")).unwrap();

        let mut config = DevtrackConfig::default();
        config.add_repository("repo", dir.path(), "Proj").unwrap();
        let err = config
            .add_repository("again", dir.path(), "Proj")
            .unwrap_err();
        assert!(err.to_string().contains("already configured"));
    }

    #[test]
    fn remove_repository_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join(".git")).unwrap();

        let mut config = DevtrackConfig::default();
        config.add_repository("repo", dir.path(), "Proj").unwrap();
        assert_eq!(config.enabled_repositories().len(), 1);

        config.remove_repository(dir.path()).unwrap();
        assert!(config.repositories.is_empty());
        assert!(config.remove_repository(dir.path()).is_err());
    }

    #[test]
    fn enabled_repositories_filters_disabled() {
        let mut config = DevtrackConfig::default();
        config.repositories.push(RepositoryConfig {
            name: "on".into(),
            path: "/work/on".into(),
            enabled: true,
            project: String::new(),
            ignore: Vec::new(),
        });
        config.repositories.push(RepositoryConfig {
            name: "off".into(),
            path: "/work/off".into(),
            enabled: false,
            project: String::new(),
            ignore: Vec::new(),
        });
        let enabled = config.enabled_repositories();
        assert_eq!(enabled.len(), 1);
        assert_eq!(enabled[0].name, "on");
    }
}
