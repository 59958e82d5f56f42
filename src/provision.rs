//! Working-copy provisioning.
//!
//! `provision` is idempotent: it brings the configured path to the state
//! "valid working copy with an origin remote, synced with origin" no matter
//! what it finds there. Failures here are fatal to startup since nothing
//! downstream can work without a usable working copy.

use std::path::Path;

use crate::git::{
    GitCli, GitError, ensure_origin_remote, open_repository, repository_exists,
    resolve_current_branch,
};

/// Ensure a ready working copy of `remote_url` at `repo_path`.
///
/// - Absent path: create parent directories and clone.
/// - Present but not a repository: delete recursively and clone fresh.
///   This discards any non-git content at the path; see README.
/// - Present and a repository: add an `origin` remote if missing, then pull.
pub fn provision(git: &GitCli, repo_path: &Path, remote_url: &str) -> Result<(), GitError> {
    if !repo_path.exists() {
        log::info!("cloning {} into {}", remote_url, repo_path.display());
        git.clone(remote_url, repo_path)?;
    } else if !repository_exists(repo_path) {
        log::warn!(
            "{} exists but is not a git repository; removing it and cloning fresh",
            repo_path.display()
        );
        remove_path(repo_path)?;
        git.clone(remote_url, repo_path)?;
    } else {
        let repo = open_repository(repo_path)?;
        ensure_origin_remote(&repo, remote_url)?;
        let (branch, _) = resolve_current_branch(&repo)?;
        git.pull(repo_path, &branch)?;
    }

    log::info!("repository setup complete at {}", repo_path.display());
    Ok(())
}

fn remove_path(path: &Path) -> Result<(), GitError> {
    if path.is_dir() {
        std::fs::remove_dir_all(path)?;
    } else {
        std::fs::remove_file(path)?;
    }
    Ok(())
}
