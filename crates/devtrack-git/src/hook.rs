// SPDX-FileCopyrightText: 2026 DevTrack Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-commit hook installer.
//!
//! The hook is advisory only: it appends a timestamped line to the profile's
//! `commit.log`. The watcher does not depend on it.

use std::path::{Path, PathBuf};

use tracing::info;

use devtrack_core::{DevtrackError, ProfileDir};

use crate::commit::is_git_repository;

/// Install the post-commit hook into `repo_path/.git/hooks/post-commit`.
///
/// An existing hook is left untouched. Returns the hook path.
pub fn install_post_commit_hook(
    repo_path: &Path,
    profile: &ProfileDir,
) -> Result<PathBuf, DevtrackError> {
    if !is_git_repository(repo_path) {
        return Err(DevtrackError::NotARepository {
            path: repo_path.to_path_buf(),
        });
    }

    let hook_path = repo_path.join(".git/hooks/post-commit");
    if hook_path.exists() {
        info!(path = %hook_path.display(), "post-commit hook already exists");
        return Ok(hook_path);
    }

    let script = format!(
        "#!/bin/sh\n\
         # Installed by devtrack. Appends an advisory line for each commit;\n\
         # commit detection itself runs through the filesystem watcher.\n\
         echo \"Commit detected at $(date)\" >> {}\n\
         exit 0\n",
        profile.commit_log_path().display()
    );

    if let Some(parent) = hook_path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            DevtrackError::Internal(format!("failed to create hooks directory: {e}"))
        })?;
    }
    std::fs::write(&hook_path, script)
        .map_err(|e| DevtrackError::Internal(format!("failed to write hook: {e}")))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&hook_path, std::fs::Permissions::from_mode(0o755))
            .map_err(|e| DevtrackError::Internal(format!("failed to chmod hook: {e}")))?;
    }

    info!(path = %hook_path.display(), "installed post-commit hook");
    Ok(hook_path)
}
