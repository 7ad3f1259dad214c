//! slicedb: snapshots of chisel slice definitions
//!
//! Builds one SQLite database holding every release's slice definitions,
//! the static-analysis notes for each definition, and the matching archive
//! package metadata. Releases come from a metadata feed (`distro-info`),
//! definitions from one branch per release of the source repository, and
//! package metadata from the archive's `Packages.gz` manifests.
//!
//! # Pipeline
//!
//! 1. [`catalog`] resolves target releases from the feed and the repository branches
//! 2. [`extract`] reads each release's `slices/*.yaml` through a temporary worktree
//! 3. [`manifest`] downloads every (release, component, sub-repo) manifest
//! 4. [`lint`] analyzes each definition
//! 5. [`snapshot`] writes the database and the optional `.br` copy
//!
//! [`pipeline`] ties the stages together on a [`schedule::WorkerPool`].
//!
//! # Example
//!
//! ```no_run
//! use slicedb::{pipeline, PipelineConfig};
//!
//! let mut config = PipelineConfig::new("snapshot.db");
//! config.compress = true;
//! let stats = pipeline::run(&config)?;
//! println!("{} slice rows", stats.slice_rows);
//! # Ok::<(), slicedb::SliceDbError>(())
//! ```

pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod extract;
pub mod fs_utils;
pub mod git;
pub mod lint;
pub mod manifest;
pub mod pipeline;
pub mod schedule;
pub mod snapshot;

// Re-export commonly used types
pub use catalog::{Release, ReleaseCatalog, ReleaseFeed, ResolvedReleases};
pub use cli::Cli;
pub use config::PipelineConfig;
pub use error::{Result, SliceDbError};
pub use lint::{analyze, Note, NoteKind};
pub use manifest::{Component, Package, SubRepo};
pub use pipeline::{gather, ReleaseData, SliceDefinition, SnapshotBundle};
pub use schedule::{Jobs, WorkerPool};
pub use snapshot::{SnapshotStats, SnapshotWriter};
