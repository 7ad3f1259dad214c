//! Common test utilities and fixtures for slicedb integration tests
//!
//! This module provides:
//! - `TestRepo` builder for throw-away multi-branch git repositories
//! - `ArchiveServer` serving gzip `Packages` manifests over HTTP
//! - Snapshot read-back helpers for comparing databases

#![allow(unused_imports)]
#![allow(dead_code)]

pub mod archive;
pub mod assertions;
pub mod test_repo;

pub use archive::ArchiveServer;
pub use assertions::*;
pub use test_repo::TestRepo;
