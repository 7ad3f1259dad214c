//! Validated run configuration
//!
//! [`PipelineConfig`] is plain data. The binary builds it from [`Cli`];
//! tests and embedders can fill it in directly.

use std::path::PathBuf;

use crate::catalog::DEFAULT_BRANCH_PREFIX;
use crate::cli::{Cli, DEFAULT_REPO_URL};
use crate::error::{Result, SliceDbError};
use crate::git::Git;
use crate::manifest::{ArchiveMirrors, FetchOptions};
use crate::schedule::Jobs;

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub db_path: PathBuf,
    pub force: bool,
    pub compress: bool,
    pub jobs: Jobs,
    /// Keep the temporary clone and worktrees for inspection
    pub keep_temp: bool,
    pub repo_url: String,
    pub git: Git,
    pub token: Option<String>,
    pub branch_prefix: String,
    pub distro_info: PathBuf,
    pub mirrors: ArchiveMirrors,
    pub fetch: FetchOptions,
}

impl PipelineConfig {
    /// Defaults for everything but the output path
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
            force: false,
            compress: false,
            jobs: Jobs::SEQUENTIAL,
            keep_temp: false,
            repo_url: DEFAULT_REPO_URL.to_string(),
            git: Git::default(),
            token: None,
            branch_prefix: DEFAULT_BRANCH_PREFIX.to_string(),
            distro_info: PathBuf::from("distro-info"),
            mirrors: ArchiveMirrors::default(),
            fetch: FetchOptions::default(),
        }
    }

    pub fn from_cli(cli: &Cli) -> Result<Self> {
        if cli.branch_prefix.is_empty() {
            return Err(SliceDbError::Config {
                message: "--branch-prefix must not be empty".to_string(),
            });
        }
        if cli.repo_url.trim().is_empty() {
            return Err(SliceDbError::Config {
                message: "repository URL must not be empty".to_string(),
            });
        }

        Ok(Self {
            db_path: cli.db_path.clone(),
            force: cli.force,
            compress: cli.compress,
            jobs: Jobs::from_arg(cli.jobs)?,
            keep_temp: cli.debug,
            repo_url: cli.repo_url.clone(),
            git: Git::new(&cli.git_path),
            token: cli.github_token.clone(),
            branch_prefix: cli.branch_prefix.clone(),
            distro_info: cli.distro_info.clone(),
            mirrors: ArchiveMirrors {
                primary: cli.archive_url.trim_end_matches('/').to_string(),
                fallback: cli.fallback_archive_url.trim_end_matches('/').to_string(),
                arch: cli.arch.clone(),
            },
            fetch: FetchOptions::default(),
        })
    }
}
