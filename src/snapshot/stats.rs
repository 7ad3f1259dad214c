//! Summary of a written snapshot

use std::path::Path;

use rusqlite::{Connection, OpenFlags};

use crate::error::Result;
use crate::fs_utils::file_size;

/// Counts read back from a finished snapshot
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct SnapshotStats {
    /// Rows in `slice`
    pub slice_rows: usize,
    /// Distinct `slice.branch` values
    pub branches: usize,
    /// Distinct `slice.package` values
    pub packages: usize,
    /// Rows in `release`
    pub releases: usize,
    pub file_size_bytes: u64,
    pub compressed_size_bytes: Option<u64>,
}

impl SnapshotStats {
    pub fn collect(db_path: &Path, compressed: Option<&Path>) -> Result<Self> {
        let conn = Connection::open_with_flags(db_path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
        let count = |sql: &str| -> Result<usize> {
            let n: i64 = conn.query_row(sql, [], |row| row.get(0))?;
            Ok(usize::try_from(n).unwrap_or(0))
        };

        Ok(Self {
            slice_rows: count("SELECT COUNT(*) FROM slice")?,
            branches: count("SELECT COUNT(DISTINCT branch) FROM slice")?,
            packages: count("SELECT COUNT(DISTINCT package) FROM slice")?,
            releases: count("SELECT COUNT(*) FROM \"release\"")?,
            file_size_bytes: file_size(db_path),
            compressed_size_bytes: compressed.filter(|p| p.exists()).map(file_size),
        })
    }

    /// Compressed size as a fraction of the database size
    pub fn compression_ratio(&self) -> Option<f64> {
        match (self.compressed_size_bytes, self.file_size_bytes) {
            (Some(compressed), size) if size > 0 => Some(compressed as f64 / size as f64),
            _ => None,
        }
    }

    pub fn log(&self) {
        tracing::info!(
            "Database contains {} rows, {} unique releases, {} unique packages ({} releases in catalog)",
            self.slice_rows,
            self.branches,
            self.packages,
            self.releases
        );
        tracing::info!("Database size: {:.2} MB", mib(self.file_size_bytes));
        if let Some(compressed) = self.compressed_size_bytes {
            tracing::info!("Compressed size: {:.2} MB", mib(compressed));
        }
        if let Some(ratio) = self.compression_ratio() {
            tracing::info!("Compression ratio: {:.2}%", ratio * 100.0);
        }
    }
}

fn mib(bytes: u64) -> f64 {
    bytes as f64 / (1024.0 * 1024.0)
}
