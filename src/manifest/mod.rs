//! Archive package manifests
//!
//! One manifest exists per (release, component, sub-repository). The
//! coordinator fetches the whole cross product and folds each release's
//! listings into a single `name -> Package` map with [`merge_listings`].

mod fetch;
mod parse;

pub use fetch::{
    next_endpoint, ArchiveMirrors, Endpoint, FetchOptions, ManifestFetcher, DEFAULT_ARCH,
    DEFAULT_ARCHIVE_URL, DEFAULT_FALLBACK_ARCHIVE_URL,
};
pub use parse::{parse_manifest, split_stanzas};

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::catalog::Release;
use crate::error::Result;

/// Archive component, declared in precedence order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Component {
    Main,
    Restricted,
    Universe,
    Multiverse,
}

impl Component {
    pub const ALL: [Component; 4] = [
        Component::Main,
        Component::Restricted,
        Component::Universe,
        Component::Multiverse,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Component::Main => "main",
            Component::Restricted => "restricted",
            Component::Universe => "universe",
            Component::Multiverse => "multiverse",
        }
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Archive pocket, declared in precedence order
///
/// `Release` is the main archive and has an empty suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SubRepo {
    #[serde(rename = "")]
    Release,
    Security,
    Updates,
    Backports,
}

impl SubRepo {
    pub const ALL: [SubRepo; 4] = [
        SubRepo::Release,
        SubRepo::Security,
        SubRepo::Updates,
        SubRepo::Backports,
    ];

    /// Suffix appended to the codename in archive paths ("" for the main archive)
    pub fn as_str(&self) -> &'static str {
        match self {
            SubRepo::Release => "",
            SubRepo::Security => "security",
            SubRepo::Updates => "updates",
            SubRepo::Backports => "backports",
        }
    }

    /// `noble`, `noble-security`, ...
    pub fn dist_name(&self, codename: &str) -> String {
        match self {
            SubRepo::Release => codename.to_string(),
            other => format!("{}-{}", codename, other.as_str()),
        }
    }
}

impl fmt::Display for SubRepo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One binary package entry of a manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Package {
    pub name: String,
    pub version: String,
    pub component: Component,
    pub sub_repo: SubRepo,
    /// Synopsis line of the description
    pub description: String,
    /// Section with any `<component>/` prefix removed
    pub section: String,
}

/// Packages of one release by name
pub type PackageMap = BTreeMap<String, Package>;

/// Anything that can list the packages of one manifest
///
/// Called concurrently for arbitrary combinations.
pub trait PackageSource: Sync {
    fn packages(
        &self,
        release: &Release,
        component: Component,
        sub_repo: SubRepo,
    ) -> Result<Vec<Package>>;
}

/// Every (component, sub-repo) combination, highest precedence first
pub fn manifest_combinations() -> Vec<(Component, SubRepo)> {
    Component::ALL
        .iter()
        .flat_map(|&component| SubRepo::ALL.iter().map(move |&sub_repo| (component, sub_repo)))
        .collect()
}

/// Fold one release's listings into a single map
///
/// When a name appears in several listings the highest-precedence one wins:
/// `main > restricted > universe > multiverse`, then
/// `"" > security > updates > backports`. The result does not depend on the
/// order listings arrive in.
pub fn merge_listings(listings: BTreeMap<(Component, SubRepo), Vec<Package>>) -> PackageMap {
    let mut merged = PackageMap::new();
    // BTreeMap iterates keys in precedence order
    for (_, packages) in listings {
        for package in packages {
            merged.entry(package.name.clone()).or_insert(package);
        }
    }
    merged
}
