//! The publish pipeline: pull, append the marker line, commit, push.
//!
//! Publishing is best-effort from the daemon's point of view: any step can
//! fail (network down, merge conflict, remote rejected the push) and the
//! error is returned to the loop to log. Partially applied state - an
//! appended marker line that never got committed, say - is left in place
//! and folded into the next day's commit by `stage_all`.

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Local;

use crate::git::{GitCli, GitError, open_repository, resolve_current_branch};

/// Timestamp format used in both the marker line and the commit message.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Outcome of a successful publish, for the loop to log.
#[derive(Debug, Clone)]
pub struct PublishSummary {
    /// Local timestamp embedded in the marker line and commit message.
    pub timestamp: String,
    /// Commit id of the pushed commit.
    pub commit: String,
}

/// Publishes one heartbeat commit to a working copy.
///
/// Holds the working copy path explicitly rather than a long-lived
/// repository handle, so tests can point it at any checkout.
pub struct Publisher {
    workdir: PathBuf,
    marker_file: String,
    git: GitCli,
}

impl Publisher {
    pub fn new(workdir: PathBuf, marker_file: String) -> Self {
        Self {
            workdir,
            marker_file,
            git: GitCli::new(),
        }
    }

    /// Path of the marker file inside the working copy.
    pub fn marker_path(&self) -> PathBuf {
        self.workdir.join(&self.marker_file)
    }

    /// Run one publish cycle: pull, append marker, stage, commit, push.
    pub fn publish(&self) -> Result<PublishSummary, GitError> {
        let branch = {
            let repo = open_repository(&self.workdir)?;
            let (branch, _) = resolve_current_branch(&repo)?;
            branch
        };

        self.git.pull(&self.workdir, &branch)?;

        let timestamp = Local::now().format(TIMESTAMP_FORMAT).to_string();
        append_marker(&self.marker_path(), &timestamp)?;

        self.git.stage_all(&self.workdir)?;
        self.git
            .commit(&self.workdir, &format!("Auto commit at {}", timestamp))?;
        self.git.push(&self.workdir)?;

        let repo = open_repository(&self.workdir)?;
        let (_, commit) = resolve_current_branch(&repo)?;

        Ok(PublishSummary { timestamp, commit })
    }
}

/// Append one marker line to `path`, creating the file if absent.
fn append_marker(path: &Path, timestamp: &str) -> Result<(), GitError> {
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    writeln!(file, "\nAuto-commit at: {}", timestamp)?;
    Ok(())
}
