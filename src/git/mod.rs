//! Git operations for the source repository
//!
//! All repository access goes through the git executable as a subprocess.
//! Any non-zero exit is a [`SliceDbError::Git`]: the repository is an
//! environment precondition, so there is no per-release recovery.

mod clone;
mod worktree;

pub use clone::SharedClone;
pub use worktree::Worktree;

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{Result, SliceDbError};

/// Handle on a git executable
#[derive(Debug, Clone)]
pub struct Git {
    program: PathBuf,
}

impl Default for Git {
    fn default() -> Self {
        Self::new("git")
    }
}

impl Git {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Resolve the executable on `PATH`, failing early when it is not installed
    pub fn locate(&self) -> Result<PathBuf> {
        which::which(&self.program).map_err(|e| SliceDbError::ToolMissing {
            tool: self.program.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Run a git command and return stdout as string
    pub fn command(&self, args: &[&str], cwd: Option<&Path>) -> Result<String> {
        let mut cmd = Command::new(&self.program);
        cmd.args(args);

        if let Some(dir) = cwd {
            cmd.current_dir(dir);
        }

        tracing::debug!(
            "Running git command: {} {} in {}",
            self.program.display(),
            args.join(" "),
            cwd.map(|p| p.display().to_string())
                .unwrap_or_else(|| ".".to_string())
        );

        let output = cmd.output().map_err(|e| SliceDbError::Git {
            message: format!("Failed to execute {}: {}", self.program.display(), e),
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::error!("Git command which must succeed failed: git {}", args.join(" "));
            return Err(SliceDbError::Git {
                message: format!("git {} failed: {}", args.join(" "), stderr.trim()),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    /// Shallow clone of every branch of `url` into `dest`
    pub fn clone_all_branches(&self, url: &str, dest: &Path) -> Result<()> {
        let dest = dest.to_string_lossy();
        self.command(
            &["clone", "--depth=1", "--no-single-branch", url, &dest],
            None,
        )?;
        Ok(())
    }

    /// Remote-tracking branches of `origin`, without the `origin/` prefix
    pub fn remote_branches(&self, repo: &Path) -> Result<Vec<String>> {
        let output = self.command(
            &["branch", "--remote", "--format=%(refname:short)"],
            Some(repo),
        )?;
        Ok(parse_remote_branches(&output))
    }

    /// Detached worktree of `reference` at `target`
    pub fn add_worktree(&self, repo: &Path, reference: &str, target: &Path) -> Result<()> {
        let target = target.to_string_lossy();
        self.command(
            &["worktree", "add", "--detach", &target, reference],
            Some(repo),
        )?;
        Ok(())
    }

    /// Unregister and delete a worktree
    pub fn remove_worktree(&self, repo: &Path, target: &Path) -> Result<()> {
        let target = target.to_string_lossy();
        self.command(&["worktree", "remove", "--force", &target], Some(repo))?;
        Ok(())
    }
}

/// Parse `git branch --remote --format=%(refname:short)` output
fn parse_remote_branches(output: &str) -> Vec<String> {
    output
        .lines()
        .map(|line| line.trim().trim_matches('\''))
        .filter_map(|name| name.strip_prefix("origin/"))
        .filter(|name| !name.is_empty() && *name != "HEAD")
        .map(str::to_string)
        .collect()
}
