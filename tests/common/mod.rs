//! Common test utilities and helpers for repostatus tests

use std::fs;
use std::path::Path;
use std::process::{Command, Stdio};

/// Mark a directory as a repository with a bare `.git` child. Enough for
/// discovery tests; status queries against it degrade to sentinels.
pub fn marker_repo(path: &Path) {
    fs::create_dir_all(path.join(".git")).expect("Failed to create marker repo");
}

fn git(path: &Path, args: &[&str]) {
    let status = Command::new("git")
        .args(args)
        .current_dir(path)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .expect("failed to run git");
    assert!(status.success(), "git {:?} failed in {:?}", args, path);
}

/// Create a real git repository with one commit on branch `main` and an
/// optional origin remote.
pub fn create_git_repo(path: &Path, remote_url: Option<&str>) {
    fs::create_dir_all(path).expect("Failed to create repo directory");

    git(path, &["init"]);
    git(path, &["config", "user.name", "Test User"]);
    git(path, &["config", "user.email", "test@example.com"]);
    git(path, &["checkout", "-b", "main"]);

    fs::write(path.join("README.md"), "# Test Repository").expect("Failed to write README");
    git(path, &["add", "."]);
    git(path, &["commit", "-m", "Initial commit"]);

    if let Some(url) = remote_url {
        git(path, &["remote", "add", "origin", url]);
    }
}
