//! CLI argument definitions using clap
//!
//! Every network or tool location has an environment fallback so CI jobs can
//! point the build at mirrors without changing the command line.

use clap::Parser;
use std::path::PathBuf;

use crate::catalog::DEFAULT_BRANCH_PREFIX;
use crate::manifest::{DEFAULT_ARCH, DEFAULT_ARCHIVE_URL, DEFAULT_FALLBACK_ARCHIVE_URL};

/// Default source of slice definitions
pub const DEFAULT_REPO_URL: &str = "https://github.com/canonical/chisel-releases";

/// Build a queryable snapshot of chisel slice definitions
#[derive(Parser, Debug, Clone)]
#[command(name = "slicedb")]
#[command(about = "Build a SQLite snapshot of slice definitions and archive package metadata")]
#[command(version)]
pub struct Cli {
    /// Output database file
    #[arg(value_name = "DB_PATH")]
    pub db_path: PathBuf,

    /// Overwrite existing output files
    #[arg(short, long)]
    pub force: bool,

    /// Also write a Brotli-compressed copy to <DB_PATH>.br
    #[arg(long)]
    pub compress: bool,

    /// Worker threads: 1 runs sequentially, -1 uses one per task
    #[arg(short, long, default_value_t = 1, allow_negative_numbers = true)]
    pub jobs: i64,

    /// Debug logging; temporary clone and worktrees are kept
    #[arg(long)]
    pub debug: bool,

    /// Repository holding one branch per release
    #[arg(long, env = "CHISEL_RELEASES_URL", default_value = DEFAULT_REPO_URL)]
    pub repo_url: String,

    /// git executable
    #[arg(long = "git", env = "GIT_PATH", default_value = "git")]
    pub git_path: PathBuf,

    /// Token for API rate-limit relief
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,

    /// Prefix of release branch names
    #[arg(long, env = "SLICEDB_BRANCH_PREFIX", default_value = DEFAULT_BRANCH_PREFIX)]
    pub branch_prefix: String,

    /// Release metadata program
    #[arg(long, env = "DISTRO_INFO_PATH", default_value = "distro-info")]
    pub distro_info: PathBuf,

    /// Primary package archive
    #[arg(long, default_value = DEFAULT_ARCHIVE_URL)]
    pub archive_url: String,

    /// Archive for releases removed from the primary
    #[arg(long, default_value = DEFAULT_FALLBACK_ARCHIVE_URL)]
    pub fallback_archive_url: String,

    /// Binary architecture of the manifests
    #[arg(long, default_value = DEFAULT_ARCH)]
    pub arch: String,
}
