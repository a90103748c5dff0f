//! Common test utilities and helpers for aurcheck tests
#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// Whether a usable git is on PATH; tests that need one return early without it
pub fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}

/// Whether the tests run with an effective uid of 0, which the binary refuses
pub fn running_as_root() -> bool {
    nix::unistd::Uid::effective().is_root()
}

/// Run git in `dir` with a fixed identity, panicking on failure
pub fn git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .env("GIT_AUTHOR_NAME", "aurcheck tests")
        .env("GIT_AUTHOR_EMAIL", "tests@aurcheck.invalid")
        .env("GIT_COMMITTER_NAME", "aurcheck tests")
        .env("GIT_COMMITTER_EMAIL", "tests@aurcheck.invalid")
        .output()
        .expect("Failed to run git");

    assert!(
        output.status.success(),
        "git {:?} failed in {}: {}",
        args,
        dir.display(),
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

pub fn pkgbuild(name: &str, version: &str) -> String {
    format!("pkgname={}\npkgver={}\npkgrel=1\narch=('any')\n", name, version)
}

/// An AUR directory whose package clones track bare remotes in the same sandbox
pub struct AurFixture {
    pub temp_dir: TempDir,
    pub aur_dir: PathBuf,
    remotes: PathBuf,
    upstreams: PathBuf,
}

impl AurFixture {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let aur_dir = temp_dir.path().join("aur");
        let remotes = temp_dir.path().join("remotes");
        let upstreams = temp_dir.path().join("upstreams");
        for dir in [&aur_dir, &remotes, &upstreams] {
            fs::create_dir_all(dir).expect("Failed to create fixture dir");
        }

        Self {
            temp_dir,
            aur_dir,
            remotes,
            upstreams,
        }
    }

    /// Publish a package at `version` and clone it into the AUR directory
    pub fn add_package(&self, name: &str, version: &str) -> PathBuf {
        let remote = self.remotes.join(format!("{}.git", name));
        fs::create_dir_all(&remote).expect("Failed to create remote dir");
        git(&remote, &["init", "--quiet", "--bare"]);
        git(&remote, &["symbolic-ref", "HEAD", "refs/heads/master"]);

        let upstream = self.upstreams.join(name);
        fs::create_dir_all(&upstream).expect("Failed to create upstream dir");
        git(&upstream, &["init", "--quiet"]);
        git(&upstream, &["symbolic-ref", "HEAD", "refs/heads/master"]);
        git(
            &upstream,
            &["remote", "add", "origin", &remote.to_string_lossy()],
        );
        self.commit_upstream(name, version);

        let clone = self.aur_dir.join(name);
        git(
            &self.aur_dir,
            &["clone", "--quiet", &remote.to_string_lossy(), name],
        );
        clone
    }

    /// Push a new version of `name` to its remote without touching the clone
    pub fn publish(&self, name: &str, version: &str) {
        self.commit_upstream(name, version);
    }

    pub fn remote_path(&self, name: &str) -> PathBuf {
        self.remotes.join(format!("{}.git", name))
    }

    pub fn clone_path(&self, name: &str) -> PathBuf {
        self.aur_dir.join(name)
    }

    fn commit_upstream(&self, name: &str, version: &str) {
        let upstream = self.upstreams.join(name);
        fs::write(upstream.join("PKGBUILD"), pkgbuild(name, version))
            .expect("Failed to write PKGBUILD");
        git(&upstream, &["add", "PKGBUILD"]);
        git(
            &upstream,
            &["commit", "--quiet", "-m", &format!("{} {}", name, version)],
        );
        git(&upstream, &["push", "--quiet", "origin", "master"]);
    }
}

/// Assertion helper for command output
pub fn assert_contains_all(text: &str, expected: &[&str]) {
    for item in expected {
        assert!(
            text.contains(item),
            "Expected text to contain '{}', but it didn't. Text: {}",
            item,
            text
        );
    }
}
