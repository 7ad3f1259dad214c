//! Per-release slice extraction
//!
//! Every release branch is materialized as a temporary worktree of the
//! [`SharedClone`], and each `slices/*.yaml` file in it is read as
//! `package name -> definition text`.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::catalog::Release;
use crate::error::Result;
use crate::git::SharedClone;

/// Directory of slice definition files on every release branch
pub const SLICES_DIR: &str = "slices";

/// Extension of slice definition files
pub const SLICE_EXTENSION: &str = "yaml";

/// Raw definition file contents by package name
///
/// Kept as bytes: decoding problems belong to the analysis step.
pub type SliceTexts = BTreeMap<String, Vec<u8>>;

/// Anything that can produce the slice definitions of a release
///
/// Implementations are called concurrently for different releases and
/// never for the same release at once.
pub trait SliceSource: Sync {
    fn slices(&self, release: &Release) -> Result<SliceTexts>;
}

/// Reads slice definitions out of release branches of the shared clone
pub struct SliceExtractor<'a> {
    clone: &'a SharedClone,
    branch_prefix: String,
}

impl<'a> SliceExtractor<'a> {
    pub fn new(clone: &'a SharedClone, branch_prefix: &str) -> Self {
        Self {
            clone,
            branch_prefix: branch_prefix.to_string(),
        }
    }
}

impl SliceSource for SliceExtractor<'_> {
    fn slices(&self, release: &Release) -> Result<SliceTexts> {
        let branch = release.branch_name(&self.branch_prefix);
        let worktree = self.clone.add_worktree(&branch, &release.short_codename())?;

        match read_slice_dir(&worktree.path().join(SLICES_DIR))? {
            Some(slices) => {
                tracing::debug!("Read {} slice definitions for {}", slices.len(), release);
                Ok(slices)
            }
            None => {
                tracing::warn!(
                    "Release {} does not have a '{}/' directory. Skipping.",
                    release,
                    SLICES_DIR
                );
                Ok(SliceTexts::new())
            }
        }
    }
}

/// Read every `*.yaml` file directly inside `dir`
///
/// Returns `Ok(None)` when `dir` does not exist.
pub fn read_slice_dir(dir: &Path) -> Result<Option<SliceTexts>> {
    if !dir.is_dir() {
        return Ok(None);
    }

    let mut slices = SliceTexts::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some(SLICE_EXTENSION) {
            continue;
        }
        let Some(package) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };

        slices.insert(package.to_string(), fs::read(&path)?);
    }

    Ok(Some(slices))
}
