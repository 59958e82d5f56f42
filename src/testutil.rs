//! Shared helpers for git-backed tests.
//!
//! Tests run against local filesystem remotes: a bare repository seeded with
//! one commit stands in for the hosted remote, so no network is needed.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Run a git command in `dir`, panicking on failure.
pub fn git_in(dir: &Path, args: &[&str]) {
    let output = Command::new("git")
        .arg("-C")
        .arg(dir)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .expect("failed to run git");
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
}

/// Create a bare repository under `root` seeded with one commit on the
/// default branch, and return its path (usable as a remote URL).
pub fn seed_remote(root: &Path) -> PathBuf {
    let bare = root.join("remote.git");
    let seed = root.join("seed");
    std::fs::create_dir_all(&seed).expect("failed to create seed dir");

    git_in(root, &["init", "--bare", bare.to_str().unwrap()]);

    git_in(&seed, &["init"]);
    git_in(&seed, &["config", "user.name", "gitpulse-test"]);
    git_in(&seed, &["config", "user.email", "gitpulse@example.invalid"]);
    std::fs::write(seed.join("README.md"), "# seed\n").expect("failed to write README");
    git_in(&seed, &["add", "-A"]);
    git_in(&seed, &["commit", "-m", "initial"]);
    git_in(&seed, &["remote", "add", "origin", bare.to_str().unwrap()]);
    git_in(&seed, &["push", "origin", "HEAD"]);

    bare
}

/// Configure a throwaway commit identity in a working copy.
pub fn set_test_identity(workdir: &Path) {
    git_in(workdir, &["config", "user.name", "gitpulse-test"]);
    git_in(workdir, &["config", "user.email", "gitpulse@example.invalid"]);
}
