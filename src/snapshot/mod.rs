//! SQLite snapshot output
//!
//! Writes one fresh database per run. Tables:
//!
//! - `release(version PK, branch UNIQUE NULL, codename, lts, supported, devel)`
//! - `slice(branch, package, version, component, repo, section, definition, notes)`
//! - `description(package UNIQUE, description)`
//! - `meta(key UNIQUE, value)` with `last_update` and `source_url`
//!
//! All rows go in through one transaction. A failed write leaves no file behind.

mod compress;
mod stats;

pub use compress::{compressed_path, Brotli, Compressor, COMPRESSED_EXTENSION};
pub use stats::SnapshotStats;

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use rusqlite::{params, Connection, Transaction};
use serde_json::Value;

use crate::catalog::Release;
use crate::error::{Result, SliceDbError};
use crate::fs_utils::remove_if_exists;
use crate::pipeline::SnapshotBundle;

/// `meta` key of the build timestamp
pub const META_LAST_UPDATE: &str = "last_update";
/// `meta` key of the source repository URL
pub const META_SOURCE_URL: &str = "source_url";

/// Fail before any work when an output exists and overwriting is not allowed
pub fn check_outputs(db_path: &Path, compressed: Option<&Path>, force: bool) -> Result<()> {
    for path in std::iter::once(db_path).chain(compressed) {
        if path.exists() {
            if !force {
                return Err(SliceDbError::OutputExists {
                    path: path.to_path_buf(),
                });
            }
            tracing::warn!("Overwriting existing file '{}'", path.display());
        }
    }
    Ok(())
}

/// Writes a [`SnapshotBundle`] to a fresh database file
pub struct SnapshotWriter {
    path: PathBuf,
    source_url: String,
    branch_prefix: String,
}

impl SnapshotWriter {
    pub fn new(path: &Path, source_url: &str, branch_prefix: &str) -> Self {
        Self {
            path: path.to_path_buf(),
            source_url: source_url.to_string(),
            branch_prefix: branch_prefix.to_string(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace whatever is at the output path with the bundle's snapshot
    pub fn write(&self, bundle: &SnapshotBundle) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        remove_if_exists(&self.path)?;

        tracing::info!("Writing data to database '{}' ...", self.path.display());
        let result = self.write_fresh(bundle);
        if result.is_err() {
            if let Err(e) = remove_if_exists(&self.path) {
                tracing::warn!(
                    "Failed to remove partial database '{}': {}",
                    self.path.display(),
                    e
                );
            }
        }
        result
    }

    fn write_fresh(&self, bundle: &SnapshotBundle) -> Result<()> {
        let mut conn = Connection::open(&self.path)?;
        let tx = conn.transaction()?;

        create_schema(&tx)?;
        self.insert_releases(&tx, bundle)?;
        self.insert_slices(&tx, bundle)?;
        insert_descriptions(&tx, bundle)?;
        insert_meta(&tx, META_LAST_UPDATE, &chrono::Utc::now().to_rfc3339())?;
        insert_meta(&tx, META_SOURCE_URL, &self.source_url)?;

        tx.commit()?;
        Ok(())
    }

    fn insert_releases(&self, tx: &Transaction<'_>, bundle: &SnapshotBundle) -> Result<()> {
        let mut stmt = tx.prepare(
            "INSERT INTO \"release\" (version, branch, codename, lts, supported, devel)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )?;

        let releases: BTreeSet<&Release> =
            bundle.catalog.iter().chain(bundle.targets.iter()).collect();
        for release in releases {
            let branch = bundle
                .targets
                .contains(release)
                .then(|| release.branch_name(&self.branch_prefix));
            stmt.execute(params![
                release.version,
                branch,
                release.codename,
                release.lts,
                release.supported,
                release.devel,
            ])?;
        }
        Ok(())
    }

    fn insert_slices(&self, tx: &Transaction<'_>, bundle: &SnapshotBundle) -> Result<()> {
        let mut stmt = tx.prepare(
            "INSERT INTO slice (branch, package, version, component, repo, section, definition, notes)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )?;

        for (release, data) in &bundle.releases {
            let branch = release.branch_name(&self.branch_prefix);
            for slice in &data.slices {
                let package = data.packages.get(&slice.package);
                if package.is_none() {
                    tracing::warn!(
                        "No archive metadata for package '{}' in {}",
                        slice.package,
                        release
                    );
                }

                let definition =
                    serde_json::to_string(slice.parsed.as_ref().unwrap_or(&Value::Null))?;
                let notes = serde_json::to_string(&slice.notes)?;
                stmt.execute(params![
                    branch,
                    slice.package,
                    package.map(|p| p.version.as_str()),
                    package.map(|p| p.component.as_str()),
                    package.map(|p| p.sub_repo.as_str()),
                    package.map(|p| p.section.as_str()),
                    definition,
                    notes,
                ])?;
            }
        }
        Ok(())
    }
}

fn create_schema(tx: &Transaction<'_>) -> Result<()> {
    tx.execute_batch(
        r#"
        CREATE TABLE "release" (
            version TEXT PRIMARY KEY,
            branch TEXT UNIQUE,
            codename TEXT NOT NULL,
            lts INTEGER NOT NULL DEFAULT 0,
            supported INTEGER NOT NULL DEFAULT 0,
            devel INTEGER NOT NULL DEFAULT 0
        );

        -- version/component/repo/section are NULL when the archive has no such package
        CREATE TABLE slice (
            branch TEXT NOT NULL,
            package TEXT NOT NULL,
            version TEXT,
            component TEXT,
            repo TEXT,
            section TEXT,
            definition TEXT NOT NULL,
            notes TEXT NOT NULL DEFAULT '[]',
            PRIMARY KEY (branch, package)
        );

        CREATE TABLE description (
            package TEXT NOT NULL UNIQUE,
            description TEXT
        );

        CREATE TABLE meta (
            key TEXT NOT NULL UNIQUE,
            value TEXT
        );
        "#,
    )?;
    Ok(())
}

/// One row per package referenced by a slice; newer releases overwrite older ones
fn insert_descriptions(tx: &Transaction<'_>, bundle: &SnapshotBundle) -> Result<()> {
    let mut stmt =
        tx.prepare("INSERT OR REPLACE INTO description (package, description) VALUES (?1, ?2)")?;

    // `releases` iterates oldest first, so newer synopses replace older ones
    for data in bundle.releases.values() {
        for package in data.packages.values() {
            stmt.execute(params![package.name, package.description])?;
        }
    }
    Ok(())
}

fn insert_meta(tx: &Transaction<'_>, key: &str, value: &str) -> Result<()> {
    tx.execute(
        "INSERT INTO meta (key, value) VALUES (?1, ?2)",
        params![key, value],
    )?;
    Ok(())
}
