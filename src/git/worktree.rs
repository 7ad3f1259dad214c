//! Temporary worktrees checked out from the shared clone

use std::path::Path;

use tempfile::TempDir;

use super::SharedClone;

/// A detached worktree that unregisters itself on drop
///
/// Dropping happens on every exit path of an extraction, including errors
/// and unwinding, so worktrees never leak into the shared clone.
pub struct Worktree<'a> {
    clone: &'a SharedClone,
    dir: Option<TempDir>,
}

impl<'a> Worktree<'a> {
    pub(super) fn new(clone: &'a SharedClone, dir: TempDir) -> Self {
        Self {
            clone,
            dir: Some(dir),
        }
    }

    pub fn path(&self) -> &Path {
        // Only `drop` takes the directory out
        self.dir
            .as_ref()
            .map(TempDir::path)
            .unwrap_or_else(|| Path::new(""))
    }
}

impl Drop for Worktree<'_> {
    fn drop(&mut self) {
        let Some(dir) = self.dir.take() else {
            return;
        };

        if self.clone.keeps_worktrees() {
            #[allow(deprecated)]
            let path = dir.into_path();
            tracing::debug!("Keeping worktree at '{}'", path.display());
            return;
        }

        let result = {
            let _guard = self.clone.lock();
            self.clone.git().remove_worktree(self.clone.path(), dir.path())
        };
        if let Err(e) = result {
            tracing::warn!("Failed to remove worktree '{}': {}", dir.path().display(), e);
        }
        // git already deleted the directory; TempDir cleans up whatever is left
        drop(dir);
    }
}
