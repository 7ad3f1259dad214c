//! The one shared clone of the source repository

use std::path::{Path, PathBuf};

use parking_lot::{Mutex, MutexGuard};
use tempfile::TempDir;

use super::{Git, Worktree};
use crate::error::Result;

/// A multi-branch clone shared by every extraction task
///
/// Worktree registration mutates the clone's `.git` directory, so
/// [`SharedClone::add_worktree`] and worktree removal serialize on one lock.
/// Reading files inside a worktree needs no lock.
pub struct SharedClone {
    git: Git,
    path: PathBuf,
    url: String,
    lock: Mutex<()>,
    /// Owned temporary directory, `None` for adopted clones
    dir: Option<TempDir>,
    keep: bool,
}

impl SharedClone {
    /// Clone `url` (shallow, all branches) into a fresh temporary directory
    pub fn create(git: Git, url: &str, keep: bool) -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix("slicedb-clone-")
            .tempdir()?;

        tracing::info!("Cloning {} ...", url);
        git.clone_all_branches(url, dir.path())?;
        tracing::debug!("Cloned {} into '{}'", url, dir.path().display());

        Ok(Self {
            git,
            path: dir.path().to_path_buf(),
            url: url.to_string(),
            lock: Mutex::new(()),
            dir: Some(dir),
            keep,
        })
    }

    /// Use an existing local clone; it is left in place on drop
    pub fn open(git: Git, path: &Path, url: &str, keep: bool) -> Self {
        Self {
            git,
            path: path.to_path_buf(),
            url: url.to_string(),
            lock: Mutex::new(()),
            dir: None,
            keep,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn git(&self) -> &Git {
        &self.git
    }

    /// Whether temporary worktrees should outlive their extraction
    pub fn keeps_worktrees(&self) -> bool {
        self.keep
    }

    pub fn remote_branches(&self) -> Result<Vec<String>> {
        self.git.remote_branches(&self.path)
    }

    /// Check out `origin/<branch>` into a new temporary worktree
    ///
    /// The clone lock is held only while git registers the worktree.
    pub fn add_worktree(&self, branch: &str, label: &str) -> Result<Worktree<'_>> {
        let dir = tempfile::Builder::new()
            .prefix(&format!("slicedb-{}-", label))
            .tempdir()?;
        let reference = format!("origin/{}", branch);

        {
            let _guard = self.lock();
            self.git.add_worktree(&self.path, &reference, dir.path())?;
        }

        tracing::debug!(
            "Set up git worktree for {} in '{}'",
            reference,
            dir.path().display()
        );

        Ok(Worktree::new(self, dir))
    }

    pub(super) fn lock(&self) -> MutexGuard<'_, ()> {
        self.lock.lock()
    }
}

impl Drop for SharedClone {
    fn drop(&mut self) {
        let Some(dir) = self.dir.take() else {
            return;
        };

        if self.keep {
            #[allow(deprecated)]
            let path = dir.into_path();
            tracing::info!("Keeping repository clone at '{}'", path.display());
        } else if let Err(e) = dir.close() {
            tracing::warn!("Failed to remove clone '{}': {}", self.path.display(), e);
        } else {
            tracing::debug!("Cleaned up clone '{}'", self.path.display());
        }
    }
}
