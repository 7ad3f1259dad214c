//! Filesystem helpers for snapshot outputs
//!
//! - `atomic_rename`: replace a file in one step (Windows needs an explicit delete)
//! - `remove_if_exists`: delete a file, ignoring "not found"
//! - `file_size`: size in bytes, 0 when missing
//! - `with_appended_extension`: `snapshot.db` -> `snapshot.db.br`

use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};

/// Rename `src` over `dst`.
///
/// On Unix, `fs::rename` atomically replaces the target if it exists.
/// On Windows, `fs::rename` fails if the target exists, so it is removed first.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use slicedb::fs_utils::atomic_rename;
///
/// std::fs::write("snapshot.db.br.tmp", b"compressed")?;
/// atomic_rename(Path::new("snapshot.db.br.tmp"), Path::new("snapshot.db.br"))?;
/// # Ok::<(), std::io::Error>(())
/// ```
pub fn atomic_rename(src: &Path, dst: &Path) -> io::Result<()> {
    #[cfg(windows)]
    {
        if dst.exists() {
            std::fs::remove_file(dst)?;
        }
    }
    std::fs::rename(src, dst)
}

/// Remove a file; returns whether something was removed
pub fn remove_if_exists(path: &Path) -> io::Result<bool> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

pub fn file_size(path: &Path) -> u64 {
    std::fs::metadata(path).map(|m| m.len()).unwrap_or(0)
}

/// Append `.ext` to the full file name, keeping any existing extension
pub fn with_appended_extension(path: &Path, ext: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".");
    name.push(ext);
    PathBuf::from(name)
}
