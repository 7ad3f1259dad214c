//! Release metadata feed
//!
//! The feed is three newline-delimited text outputs ("all", "supported",
//! "devel"), each line shaped like `Ubuntu 24.04 LTS "Noble Numbat"`.
//! [`DistroInfo`] reads them from the `distro-info` tool; [`StaticFeed`]
//! serves fixed text.

use std::path::{Path, PathBuf};
use std::process::Command;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Result, SliceDbError};

static FEED_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^\S+ (\d{1,2}\.\d{2})( LTS)? "([A-Za-z ]+)"$"#).expect("valid feed line regex")
});

/// One parsed feed line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedEntry {
    pub version: String,
    pub codename: String,
    pub lts: bool,
}

/// Parse a single `<Name> <Version>[ LTS] "<Codename>"` line
pub fn parse_feed_line(line: &str) -> Result<FeedEntry> {
    let caps = FEED_LINE
        .captures(line.trim())
        .ok_or_else(|| SliceDbError::Catalog {
            message: format!("Invalid release feed line: '{}'", line),
        })?;

    Ok(FeedEntry {
        version: caps[1].to_string(),
        codename: caps[3].to_string(),
        lts: caps.get(2).is_some(),
    })
}

/// Parse every non-blank line of one feed output
pub fn parse_feed_output(output: &str) -> Result<Vec<FeedEntry>> {
    output
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(parse_feed_line)
        .collect()
}

/// Source of release metadata
pub trait ReleaseFeed {
    /// Every release the feed knows about
    fn all(&self) -> Result<String>;

    /// Currently supported releases
    fn supported(&self) -> Result<String>;

    /// The development release line, empty when there is none
    fn devel(&self) -> Result<String>;
}

/// Feed backed by the `distro-info` command
pub struct DistroInfo {
    program: PathBuf,
}

impl DistroInfo {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    fn query(&self, selector: &str) -> Result<String> {
        tracing::debug!("Running {} {} --fullname", self.program.display(), selector);

        let output = Command::new(&self.program)
            .args([selector, "--fullname"])
            .output()
            .map_err(|e| SliceDbError::ToolMissing {
                tool: self.program.display().to_string(),
                message: e.to_string(),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SliceDbError::ToolMissing {
                tool: self.program.display().to_string(),
                message: format!("{} failed: {}", selector, stderr.trim()),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

impl Default for DistroInfo {
    fn default() -> Self {
        Self::new("distro-info")
    }
}

impl ReleaseFeed for DistroInfo {
    fn all(&self) -> Result<String> {
        self.query("--all")
    }

    fn supported(&self) -> Result<String> {
        self.query("--supported")
    }

    fn devel(&self) -> Result<String> {
        // distro-info exits non-zero when no development release is open
        match self.query("--devel") {
            Ok(out) => Ok(out),
            Err(e) => {
                tracing::warn!("No development release reported: {}", e);
                Ok(String::new())
            }
        }
    }
}

/// Feed with fixed contents
#[derive(Debug, Clone, Default)]
pub struct StaticFeed {
    pub all: String,
    pub supported: String,
    pub devel: String,
}

impl StaticFeed {
    pub fn new(all: &str, supported: &str, devel: &str) -> Self {
        Self {
            all: all.to_string(),
            supported: supported.to_string(),
            devel: devel.to_string(),
        }
    }
}

impl ReleaseFeed for StaticFeed {
    fn all(&self) -> Result<String> {
        Ok(self.all.clone())
    }

    fn supported(&self) -> Result<String> {
        Ok(self.supported.clone())
    }

    fn devel(&self) -> Result<String> {
        Ok(self.devel.clone())
    }
}
