//! Throw-away git repositories with one orphan branch per release

use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

/// Builder for a source repository laid out like chisel-releases
pub struct TestRepo {
    dir: TempDir,
}

impl TestRepo {
    /// `true` when a `git` binary is on `PATH`; prints a skip notice otherwise
    pub fn git_available() -> bool {
        if which::which("git").is_ok() {
            true
        } else {
            eprintln!("skipping: git not found on PATH");
            false
        }
    }

    /// Create a new empty repository
    pub fn new() -> Self {
        let repo = Self {
            dir: TempDir::new().expect("Failed to create temp dir"),
        };
        repo.git(&["init", "-q"]);
        repo
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// URL for cloning; `file://` so `--depth` is honoured
    pub fn url(&self) -> String {
        format!("file://{}", self.path().display())
    }

    /// Run git in the repository and expect success
    pub fn git(&self, args: &[&str]) -> String {
        let output = Command::new("git")
            .current_dir(self.path())
            .args([
                "-c",
                "user.name=Test User",
                "-c",
                "user.email=test@test.com",
                "-c",
                "commit.gpgsign=false",
            ])
            .args(args)
            .output()
            .expect("Failed to run git");
        assert!(
            output.status.success(),
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8_lossy(&output.stdout).to_string()
    }

    /// Add a file with the given content
    pub fn add_file(&self, relative_path: &str, content: impl AsRef<[u8]>) -> &Self {
        let full_path = self.path().join(relative_path);
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent dirs");
        }
        fs::write(&full_path, content).expect("Failed to write file");
        self
    }

    /// Create branch `name` holding exactly `files`, with no shared history
    pub fn branch<C: AsRef<[u8]>>(&self, name: &str, files: &[(&str, C)]) -> &Self {
        self.git(&["checkout", "-q", "--orphan", name]);
        self.git(&["rm", "-r", "-f", "-q", "--ignore-unmatch", "."]);
        self.git(&["clean", "-f", "-d", "-x", "-q"]);
        for (path, content) in files {
            self.add_file(path, content);
        }
        self.git(&["add", "-A"]);
        self.git(&["commit", "-q", "--allow-empty", "-m", &format!("Add {}", name)]);
        self
    }

    /// Release branch with `slices/<package>.yaml` for each entry
    pub fn release_branch<C: AsRef<[u8]>>(&self, name: &str, slices: &[(&str, C)]) -> &Self {
        let files: Vec<(String, &[u8])> = slices
            .iter()
            .map(|(package, text)| (format!("slices/{}.yaml", package), text.as_ref()))
            .chain(std::iter::once((
                "chisel.yaml".to_string(),
                b"format: v1\n".as_slice(),
            )))
            .collect();
        let files: Vec<(&str, &[u8])> = files.iter().map(|(p, t)| (p.as_str(), *t)).collect();
        self.branch(name, &files)
    }

    /// Release branch without a `slices/` directory
    pub fn bare_branch(&self, name: &str) -> &Self {
        self.branch(name, &[("README.md", "nothing here yet\n")])
    }
}
