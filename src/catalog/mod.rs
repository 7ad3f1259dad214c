//! Release catalog resolution
//!
//! Intersects the release metadata feed with the release branches present in
//! the source repository. A release branch whose version the feed does not
//! know is fatal; feed releases without a branch are kept so the snapshot
//! records the complete catalog.

mod feed;

pub use feed::{parse_feed_line, parse_feed_output, DistroInfo, FeedEntry, ReleaseFeed, StaticFeed};

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::Serialize;

use crate::error::{Result, SliceDbError};

/// Branch prefix used by release branches unless configured otherwise
pub const DEFAULT_BRANCH_PREFIX: &str = "release-";

/// A distribution release
///
/// Identity is the version string; ordering is numeric on `(year, month)`.
#[derive(Debug, Clone, Serialize)]
pub struct Release {
    pub version: String,
    pub codename: String,
    pub lts: bool,
    pub supported: bool,
    pub devel: bool,
}

impl Release {
    pub fn new(version: &str, codename: &str) -> Self {
        Self {
            version: version.to_string(),
            codename: codename.to_string(),
            lts: false,
            supported: false,
            devel: false,
        }
    }

    /// Branch holding this release's slice definitions
    pub fn branch_name(&self, prefix: &str) -> String {
        format!("{}{}", prefix, self.version)
    }

    /// First word of the codename, lowercased ("Noble Numbat" -> "noble")
    pub fn short_codename(&self) -> String {
        self.codename
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .to_lowercase()
    }

    /// Numeric `(year, month)` pair; unparsable parts sort first
    pub fn version_key(&self) -> (u32, u32) {
        let mut parts = self.version.splitn(2, '.');
        let year = parts.next().and_then(|p| p.parse().ok()).unwrap_or(0);
        let month = parts.next().and_then(|p| p.parse().ok()).unwrap_or(0);
        (year, month)
    }
}

impl fmt::Display for Release {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.version, self.codename)
    }
}

impl PartialEq for Release {
    fn eq(&self, other: &Self) -> bool {
        self.version == other.version
    }
}

impl Eq for Release {}

impl Hash for Release {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.version.hash(state);
    }
}

impl PartialOrd for Release {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Release {
    fn cmp(&self, other: &Self) -> Ordering {
        self.version_key()
            .cmp(&other.version_key())
            .then_with(|| self.version.cmp(&other.version))
    }
}

/// Every release known to the metadata feed, keyed by version
#[derive(Debug, Clone, Default)]
pub struct ReleaseCatalog {
    releases: BTreeMap<String, Release>,
}

/// Outcome of intersecting the catalog with the repository branches
#[derive(Debug, Clone)]
pub struct ResolvedReleases {
    /// Releases with a branch in the repository, to be processed
    pub targets: BTreeSet<Release>,
    /// The full feed catalog, for completeness
    pub catalog: BTreeSet<Release>,
}

impl ReleaseCatalog {
    /// Load and cross-check the three feed outputs
    pub fn load(feed: &dyn ReleaseFeed) -> Result<Self> {
        let all = parse_feed_output(&feed.all()?)?;
        let supported = parse_feed_output(&feed.supported()?)?;
        let devel = parse_feed_output(&feed.devel()?)?;

        let mut releases: BTreeMap<String, Release> = all
            .into_iter()
            .map(|entry| {
                let release = Release {
                    version: entry.version.clone(),
                    codename: entry.codename,
                    lts: entry.lts,
                    supported: false,
                    devel: false,
                };
                (entry.version, release)
            })
            .collect();

        for entry in &supported {
            let release = releases
                .get_mut(&entry.version)
                .ok_or_else(|| SliceDbError::Catalog {
                    message: format!(
                        "Supported release {} is missing from the full release list",
                        entry.version
                    ),
                })?;
            release.supported = true;
        }

        if devel.len() > 1 {
            return Err(SliceDbError::Catalog {
                message: format!("Expected at most one development release, got {}", devel.len()),
            });
        }
        for entry in &devel {
            let release = releases
                .get_mut(&entry.version)
                .ok_or_else(|| SliceDbError::Catalog {
                    message: format!(
                        "Development release {} is missing from the full release list",
                        entry.version
                    ),
                })?;
            release.devel = true;
        }

        tracing::debug!(
            "Release catalog: {} releases, {} supported, devel={:?}",
            releases.len(),
            supported.len(),
            devel.first().map(|e| &e.version)
        );

        Ok(Self { releases })
    }

    pub fn get(&self, version: &str) -> Option<&Release> {
        self.releases.get(version)
    }

    pub fn len(&self) -> usize {
        self.releases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.releases.is_empty()
    }

    pub fn releases(&self) -> impl Iterator<Item = &Release> {
        self.releases.values()
    }

    /// Map a branch name to its release, failing on unknown versions
    ///
    /// Returns `Ok(None)` for branches outside the naming convention.
    pub fn release_for_branch(&self, branch: &str, prefix: &str) -> Result<Option<Release>> {
        let Some(version) = branch.strip_prefix(prefix) else {
            return Ok(None);
        };

        match self.releases.get(version) {
            Some(release) => Ok(Some(release.clone())),
            None => Err(SliceDbError::UnknownRelease {
                branch: branch.to_string(),
                version: version.to_string(),
            }),
        }
    }

    /// Intersect with the repository's remote branches
    pub fn resolve(&self, branches: &[String], prefix: &str) -> Result<ResolvedReleases> {
        let mut targets = BTreeSet::new();
        for branch in branches {
            if let Some(release) = self.release_for_branch(branch, prefix)? {
                targets.insert(release);
            }
        }

        Ok(ResolvedReleases {
            targets,
            catalog: self.releases.values().cloned().collect(),
        })
    }
}
