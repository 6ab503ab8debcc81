// SPDX-FileCopyrightText: 2026 DevTrack Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HEAD and commit-metadata reads against a local repository.
//!
//! These are synchronous libgit2 calls; the watcher invokes them inside
//! `spawn_blocking`.

use std::path::Path;

use chrono::{DateTime, Utc};
use git2::{ObjectType, Repository, TreeWalkMode, TreeWalkResult};

use devtrack_core::{CommitInfo, DevtrackError};

/// Whether `path` contains a `.git` directory.
pub fn is_git_repository(path: &Path) -> bool {
    path.join(".git").is_dir()
}

/// Read the commit currently at HEAD, with its changed-files list.
pub fn read_head_commit(repo_path: &Path) -> Result<CommitInfo, DevtrackError> {
    let repo = Repository::open(repo_path).map_err(|e| DevtrackError::RepositoryUnreadable {
        path: repo_path.to_path_buf(),
        source: Box::new(e),
    })?;

    let unreadable = |e: git2::Error| DevtrackError::RepositoryUnreadable {
        path: repo_path.to_path_buf(),
        source: Box::new(e),
    };

    let head = repo.head().map_err(unreadable)?;
    let branch = head
        .is_branch()
        .then(|| head.shorthand().map(str::to_string))
        .flatten();
    let commit = head.peel_to_commit().map_err(unreadable)?;

    let files = changed_files(&repo, &commit).map_err(unreadable)?;
    let author = commit.author();
    let timestamp = DateTime::<Utc>::from_timestamp(commit.time().seconds(), 0)
        .unwrap_or_else(Utc::now);

    Ok(CommitInfo {
        hash: commit.id().to_string(),
        message: commit.message().unwrap_or_default().trim().to_string(),
        author: author.name().unwrap_or_default().to_string(),
        timestamp,
        files,
        branch,
    })
}

/// Paths touched by a commit: the first-parent diff, or the whole tree for
/// a root commit. A path present on either side of a delta is included.
fn changed_files(repo: &Repository, commit: &git2::Commit<'_>) -> Result<Vec<String>, git2::Error> {
    let tree = commit.tree()?;

    if commit.parent_count() == 0 {
        let mut files = Vec::new();
        tree.walk(TreeWalkMode::PreOrder, |dir, entry| {
            if entry.kind() == Some(ObjectType::Blob) {
                if let Some(name) = entry.name() {
                    files.push(format!("{dir}{name}"));
                }
            }
            TreeWalkResult::Ok
        })?;
        return Ok(files);
    }

    let parent_tree = commit.parent(0)?.tree()?;
    let diff = repo.diff_tree_to_tree(Some(&parent_tree), Some(&tree), None)?;

    let mut files = Vec::new();
    for delta in diff.deltas() {
        let old = delta.old_file().path();
        let new = delta.new_file().path();
        if let Some(path) = old {
            files.push(path.to_string_lossy().into_owned());
        }
        if let Some(path) = new {
            if old != Some(path) {
                files.push(path.to_string_lossy().into_owned());
            }
        }
    }
    Ok(files)
}

#[cfg(test)]
pub(crate) mod testutil {
    //! Shared fixtures: build real repositories with libgit2, no git CLI.

    use std::path::Path;

    use git2::Repository;

    pub fn init_repo(dir: &Path) -> Repository {
        let repo = Repository::init(dir).unwrap();
        let mut config = repo.config().unwrap();
        config.set_str("user.name", "alice").unwrap();
        config.set_str("user.email", "alice@example.com").unwrap();
        repo
    }

    pub fn commit_file(repo: &Repository, name: &str, content: &str, message: &str) -> git2::Oid {
        let workdir = repo.workdir().unwrap();
        std::fs::write(workdir.join(name), content).unwrap();

        let mut index = repo.index().unwrap();
        index.add_path(Path::new(name)).unwrap();
        index.write().unwrap();
        let tree_id = index.write_tree().unwrap();
        let tree = repo.find_tree(tree_id).unwrap();

        let sig = repo.signature().unwrap();
        let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();
        repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
            .unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::testutil::{commit_file, init_repo};
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn detects_git_repository() {
        let dir = tempdir().unwrap();
        assert!(!is_git_repository(dir.path()));
        init_repo(dir.path());
        assert!(is_git_repository(dir.path()));
    }

    #[test]
    fn read_head_of_non_repo_fails() {
        let dir = tempdir().unwrap();
        let err = read_head_commit(dir.path()).unwrap_err();
        assert!(matches!(err, DevtrackError::RepositoryUnreadable { .. }));
    }

    #[test]
    fn root_commit_lists_full_tree() {
        let dir = tempdir().unwrap();
        let repo = init_repo(dir.path());
        commit_file(&repo, "README.md", "hello", "initial commit");

        let info = read_head_commit(dir.path()).unwrap();
        assert_eq!(info.hash.len(), 40);
        assert_eq!(info.message, "initial commit");
        assert_eq!(info.author, "alice");
        assert_eq!(info.files, vec!["README.md".to_string()]);
        assert!(info.branch.is_some());
    }

    #[test]
    fn second_commit_diffs_against_first_parent() {
        let dir = tempdir().unwrap();
        let repo = init_repo(dir.path());
        commit_file(&repo, "README.md", "hello", "initial commit");
        commit_file(&repo, "src.rs", "fn main() {}", "Fixed auth bug #123");

        let info = read_head_commit(dir.path()).unwrap();
        assert_eq!(info.message, "Fixed auth bug #123");
        assert_eq!(info.files, vec!["src.rs".to_string()]);
    }

    #[test]
    fn message_is_trimmed() {
        let dir = tempdir().unwrap();
        let repo = init_repo(dir.path());
        commit_file(&repo, "a.txt", "x", "message with trailing newline\n");

        let info = read_head_commit(dir.path()).unwrap();
        assert_eq!(info.message, "message with trailing newline");
    }
}
