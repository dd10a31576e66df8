//! Common test utilities and helpers for repowatch tests
#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// Isolated data directory plus a config file pointing at it
pub struct TestEnvironment {
    pub temp_dir: TempDir,
    pub data_dir: PathBuf,
    pub config_path: PathBuf,
}

impl TestEnvironment {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let data_dir = temp_dir.path().join("data");
        std::fs::create_dir_all(&data_dir).expect("Failed to create data dir");
        let config_path = temp_dir.path().join("config.yml");

        let env = Self {
            temp_dir,
            data_dir,
            config_path,
        };
        env.write_config("");
        env
    }

    /// Write a config whose storage lives in the temp dir; `extra` is appended verbatim
    pub fn write_config(&self, extra: &str) {
        let content = format!(
            "storage:\n  data_dir: \"{}\"\nlogging:\n  level: \"warn\"\n  color: false\n{}",
            self.data_dir.display(),
            extra
        );
        std::fs::write(&self.config_path, content).expect("Failed to write test config");
    }

    pub fn favorites_file(&self) -> PathBuf {
        self.data_dir.join("repos_favoritos.json")
    }

    pub fn registry_file(&self) -> PathBuf {
        self.data_dir.join("repos_clonados.json")
    }

    /// Run the repowatch binary against this environment's config
    pub fn run(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_repowatch"))
            .arg("--config")
            .arg(&self.config_path)
            .args(args)
            .current_dir(self.temp_dir.path())
            .env_remove("RUST_LOG")
            .output()
            .expect("Failed to execute repowatch")
    }
}

/// A local repository usable as a remote: `main` with one commit and a `v1` tag
pub struct FixtureRepo {
    pub dir: TempDir,
}

impl FixtureRepo {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create fixture dir");
        let repo = Self { dir };

        git(repo.path(), &["init", "-q"]);
        git(repo.path(), &["symbolic-ref", "HEAD", "refs/heads/main"]);
        repo.commit("README.md", "fixture\n");
        git(repo.path(), &["tag", "v1"]);
        repo
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn url(&self) -> String {
        self.dir.path().display().to_string()
    }

    pub fn commit(&self, file: &str, content: &str) {
        std::fs::write(self.path().join(file), content).expect("Failed to write fixture file");
        git(self.path(), &["add", file]);
        git(self.path(), &["commit", "-q", "-m", &format!("update {}", file)]);
    }

    pub fn create_branch(&self, name: &str) {
        git(self.path(), &["branch", name]);
    }
}

/// Run git in `dir` with a throwaway identity, panicking on failure
pub fn git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args([
            "-c",
            "user.name=repowatch tests",
            "-c",
            "user.email=tests@repowatch.invalid",
            "-c",
            "commit.gpgsign=false",
            "-c",
            "tag.gpgsign=false",
        ])
        .args(args)
        .current_dir(dir)
        .output()
        .expect("Failed to execute git");

    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// Assertion helpers for test validation
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

pub fn stdout_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

pub fn stderr_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}
