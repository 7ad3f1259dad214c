//! Error types and exit codes for slicedb

use std::path::PathBuf;
use std::process::ExitCode;
use thiserror::Error;

/// Main error type for snapshot builds
///
/// Everything here aborts the run. Recoverable conditions (a release without
/// a `slices/` directory, a definition that fails to decode) never become a
/// `SliceDbError`; they are logged or recorded as notes instead.
#[derive(Error, Debug)]
pub enum SliceDbError {
    #[error("Git error: {message}")]
    Git { message: String },

    #[error("Required tool '{tool}' failed: {message}")]
    ToolMissing { tool: String, message: String },

    #[error("Unknown release version '{version}' for branch '{branch}'")]
    UnknownRelease { branch: String, version: String },

    #[error("Release catalog error: {message}")]
    Catalog { message: String },

    #[error("Failed to download '{url}': {message}")]
    Network { url: String, message: String },

    #[error("Output file '{}' already exists. Use --force to overwrite.", path.display())]
    OutputExists { path: PathBuf },

    #[error("Invalid configuration: {message}")]
    Config { message: String },

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SliceDbError {
    /// Convert error to an exit code:
    /// - 0: Success
    /// - 1: IO error
    /// - 2: Output conflict / invalid configuration
    /// - 3: Release catalog inconsistency
    /// - 4: Manifest download failure
    /// - 5: Git or other external tool failure
    /// - 6: Database or serialization failure
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::Io(_) => ExitCode::from(1),
            Self::OutputExists { .. } | Self::Config { .. } => ExitCode::from(2),
            Self::UnknownRelease { .. } | Self::Catalog { .. } => ExitCode::from(3),
            Self::Network { .. } => ExitCode::from(4),
            Self::Git { .. } | Self::ToolMissing { .. } => ExitCode::from(5),
            Self::Database(_) | Self::Json(_) => ExitCode::from(6),
        }
    }
}

/// Result type alias for slicedb operations
pub type Result<T> = std::result::Result<T, SliceDbError>;
