//! Git operations using a hybrid CLI + libgit2 approach.
//!
//! Network and working-tree mutations go through the system `git` binary
//! (with hardening) because credential helpers and merge machinery work
//! out of the box there:
//!
//! - `clone` - initial provisioning of the working copy
//! - `pull` - sync with origin before publishing
//! - `stage_all` / `commit` / `push` - the publish pipeline
//!
//! Local reads use libgit2:
//!
//! - `open_repository` - clean API for opening existing repos
//! - `repository_exists` - path validation
//! - `ensure_origin_remote` - remote lookup/creation
//! - `head_commit_id` - resolve the commit produced by a publish

use git2::Repository;
use std::path::Path;
use std::process::{Command, Stdio};
use thiserror::Error;

/// Errors returned by git operations.
#[derive(Error, Debug)]
pub enum GitError {
    /// libgit2 reported an error.
    #[error("git operation failed: {0}")]
    Git(#[from] git2::Error),
    /// Repository path does not contain a git repo.
    #[error("repository not found at {0}")]
    NotFound(String),
    /// Clone failed.
    #[error("clone failed: {0}")]
    CloneError(String),
    /// Pull failed.
    #[error("pull failed: {0}")]
    PullError(String),
    /// Staging changes failed.
    #[error("stage failed: {0}")]
    StageError(String),
    /// Commit failed.
    #[error("commit failed: {0}")]
    CommitError(String),
    /// Push failed.
    #[error("push failed: {0}")]
    PushError(String),
    /// Output parsing or unexpected git data.
    #[error("failed to parse git data: {0}")]
    ParseError(String),
    /// Underlying IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Invalid inputs were provided.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Validate that a branch name does not contain dangerous patterns.
///
/// Rejects:
/// - Empty strings
/// - Strings containing `..` (path traversal)
/// - Strings starting with `-` (could be interpreted as flags)
/// - Strings containing null bytes or control characters
fn validate_branch(value: &str) -> Result<(), GitError> {
    if value.is_empty() {
        return Err(GitError::InvalidInput("branch cannot be empty".into()));
    }
    if value.contains("..") {
        return Err(GitError::InvalidInput("branch cannot contain '..'".into()));
    }
    if value.starts_with('-') {
        return Err(GitError::InvalidInput(
            "branch cannot start with '-'".into(),
        ));
    }
    if value.bytes().any(|b| b == 0 || b < 0x20) {
        return Err(GitError::InvalidInput(
            "branch cannot contain null or control characters".into(),
        ));
    }
    Ok(())
}

/// Validate that a remote URL does not contain dangerous patterns.
///
/// Rejects:
/// - Empty strings
/// - Strings starting with `-` (could be interpreted as flags)
/// - Strings containing null bytes or control characters
fn validate_remote_url(url: &str) -> Result<(), GitError> {
    if url.is_empty() {
        return Err(GitError::InvalidInput("remote URL cannot be empty".into()));
    }
    if url.starts_with('-') {
        return Err(GitError::InvalidInput(
            "remote URL cannot start with '-'".into(),
        ));
    }
    if url.bytes().any(|b| b == 0 || b < 0x20) {
        return Err(GitError::InvalidInput(
            "remote URL cannot contain null or control characters".into(),
        ));
    }
    Ok(())
}

fn path_str<'a>(path: &'a Path, name: &str) -> Result<&'a str, GitError> {
    path.to_str()
        .ok_or_else(|| GitError::ParseError(format!("{} path is not valid UTF-8", name)))
}

/// Git CLI wrapper with security hardening.
///
/// Used for operations that need the system git: network operations pick up
/// the user's credential helpers, and commit/merge behave exactly as they
/// would from the shell.
pub struct GitCli {
    git_path: String,
}

impl Default for GitCli {
    fn default() -> Self {
        Self::new()
    }
}

impl GitCli {
    /// Create a new GitCli instance using the system git.
    pub fn new() -> Self {
        Self {
            git_path: "git".into(),
        }
    }

    /// Create a hardened Command with security settings.
    ///
    /// Applies:
    /// - `GIT_LFS_SKIP_SMUDGE=1` - skip LFS file downloads
    /// - `GIT_TERMINAL_PROMPT=0` - disable interactive prompts
    /// - `core.hooksPath=` - disable hooks execution
    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.git_path);
        cmd.env("GIT_LFS_SKIP_SMUDGE", "1");
        cmd.env("GIT_TERMINAL_PROMPT", "0");
        cmd.args(["-c", "core.hooksPath="]);
        cmd.stdin(Stdio::null());
        cmd
    }

    /// Clone a repository into `dest`.
    ///
    /// Creates parent directories as needed. If the clone fails and `dest`
    /// did not exist beforehand, the partial clone is removed.
    pub fn clone(&self, url: &str, dest: &Path) -> Result<(), GitError> {
        validate_remote_url(url)?;

        let dest_existed = dest.exists();

        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let dest_str = path_str(dest, "destination")?;

        let output = self.command().arg("clone").arg(url).arg(dest_str).output()?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            if !dest_existed {
                let _ = std::fs::remove_dir_all(dest);
            }
            return Err(GitError::CloneError(stderr.into_owned()));
        }

        Ok(())
    }

    /// Pull `branch` from origin into the working copy.
    ///
    /// Fetch + merge, no conflict handling: a merge conflict surfaces as a
    /// `PullError` for the caller to report. The branch is named explicitly
    /// so the pull works even when no upstream is configured.
    pub fn pull(&self, workdir: &Path, branch: &str) -> Result<(), GitError> {
        validate_branch(branch)?;

        let workdir_str = path_str(workdir, "working copy")?;

        let output = self
            .command()
            .arg("-C")
            .arg(workdir_str)
            .args(["pull", "origin"])
            .arg(branch)
            .output()?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(GitError::PullError(stderr.into_owned()));
        }

        Ok(())
    }

    /// Stage all working-copy changes (`git add -A`).
    pub fn stage_all(&self, workdir: &Path) -> Result<(), GitError> {
        let workdir_str = path_str(workdir, "working copy")?;

        let output = self
            .command()
            .arg("-C")
            .arg(workdir_str)
            .args(["add", "-A"])
            .output()?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(GitError::StageError(stderr.into_owned()));
        }

        Ok(())
    }

    /// Commit staged changes with the given message.
    pub fn commit(&self, workdir: &Path, message: &str) -> Result<(), GitError> {
        if message.is_empty() {
            return Err(GitError::InvalidInput(
                "commit message cannot be empty".into(),
            ));
        }

        let workdir_str = path_str(workdir, "working copy")?;

        let output = self
            .command()
            .arg("-C")
            .arg(workdir_str)
            .args(["commit", "-m"])
            .arg(message)
            .output()?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stdout = String::from_utf8_lossy(&output.stdout);
            // git reports "nothing to commit" on stdout, real errors on stderr
            let detail = if stderr.trim().is_empty() {
                stdout
            } else {
                stderr
            };
            return Err(GitError::CommitError(detail.into_owned()));
        }

        Ok(())
    }

    /// Push the current branch to origin.
    pub fn push(&self, workdir: &Path) -> Result<(), GitError> {
        let workdir_str = path_str(workdir, "working copy")?;

        let output = self
            .command()
            .arg("-C")
            .arg(workdir_str)
            .args(["push", "origin", "HEAD"])
            .output()?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(GitError::PushError(stderr.into_owned()));
        }

        Ok(())
    }
}

/// Open an existing repository at the given path.
pub fn open_repository(path: &Path) -> Result<Repository, GitError> {
    let repo = Repository::open(path).map_err(|e| {
        if e.code() == git2::ErrorCode::NotFound {
            GitError::NotFound(path.display().to_string())
        } else {
            GitError::Git(e)
        }
    })?;
    Ok(repo)
}

/// Check if a path contains a valid git repository.
pub fn repository_exists(path: &Path) -> bool {
    Repository::open(path).is_ok()
}

/// Ensure the repository has an `origin` remote pointing somewhere.
///
/// If no remote named `origin` exists, one is created with the given URL.
/// An existing `origin` is left untouched even if its URL differs.
pub fn ensure_origin_remote(repo: &Repository, url: &str) -> Result<(), GitError> {
    validate_remote_url(url)?;

    if repo.find_remote("origin").is_err() {
        repo.remote("origin", url)?;
    }

    Ok(())
}

/// Resolve the current branch name and HEAD commit from a repository.
///
/// Returns (branch_name, commit_sha) e.g. ("main", "abc123...")
pub fn resolve_current_branch(repo: &Repository) -> Result<(String, String), GitError> {
    let head = repo.head()?;
    let ref_name = head
        .name()
        .ok_or_else(|| GitError::ParseError("HEAD reference has no name".to_string()))?;

    let branch_name = ref_name
        .strip_prefix("refs/heads/")
        .ok_or_else(|| {
            GitError::ParseError(format!(
                "unexpected HEAD format: expected 'refs/heads/<branch>', got '{}'",
                ref_name
            ))
        })?
        .to_string();

    let commit = head.peel_to_commit()?;
    let commit_sha = commit.id().to_string();

    Ok((branch_name, commit_sha))
}
