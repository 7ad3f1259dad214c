//! Snapshot build coordination
//!
//! Slice extraction (one task per target release) and manifest downloads
//! (one task per release, component and sub-repo) run side by side on one
//! [`WorkerPool`]. Results are keyed by release and package name, never by
//! completion order, so the snapshot does not depend on scheduling.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;

use serde_json::Value;

use crate::catalog::{DistroInfo, Release, ReleaseCatalog, ReleaseFeed, ResolvedReleases};
use crate::config::PipelineConfig;
use crate::error::Result;
use crate::extract::{SliceExtractor, SliceSource, SliceTexts};
use crate::git::SharedClone;
use crate::lint::{check_definition_bytes, Note};
use crate::manifest::{
    manifest_combinations, merge_listings, Component, ManifestFetcher, Package, PackageMap,
    PackageSource, SubRepo,
};
use crate::schedule::WorkerPool;
use crate::snapshot::{self, Brotli, Compressor, SnapshotStats, SnapshotWriter};

/// One analyzed slice definition file
#[derive(Debug, Clone, PartialEq)]
pub struct SliceDefinition {
    pub package: String,
    /// File contents, lossily decoded when they are not UTF-8
    pub raw_text: String,
    /// `None` when the text failed to decode
    pub parsed: Option<Value>,
    pub notes: Vec<Note>,
}

impl SliceDefinition {
    pub fn analyze(package: &str, raw: impl Into<Vec<u8>>) -> Self {
        let raw = raw.into();
        let checked = check_definition_bytes(&raw);
        let raw_text = match String::from_utf8(raw) {
            Ok(text) => text,
            Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
        };
        Self {
            package: package.to_string(),
            raw_text,
            parsed: checked.parsed,
            notes: checked.notes,
        }
    }
}

/// Everything gathered for one target release
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReleaseData {
    /// Sorted by package name
    pub slices: Vec<SliceDefinition>,
    pub packages: PackageMap,
}

/// Input to the snapshot writer
#[derive(Debug, Clone, Default)]
pub struct SnapshotBundle {
    /// Every release known to the feed
    pub catalog: BTreeSet<Release>,
    /// Releases with a branch in the repository
    pub targets: BTreeSet<Release>,
    pub releases: BTreeMap<Release, ReleaseData>,
}

impl SnapshotBundle {
    pub fn slice_count(&self) -> usize {
        self.releases.values().map(|r| r.slices.len()).sum()
    }
}

/// Gather slices and packages for every target release
///
/// Any failing task aborts the whole gather.
pub fn gather(
    pool: &WorkerPool,
    slices: &dyn SliceSource,
    packages: &dyn PackageSource,
    resolved: &ResolvedReleases,
) -> Result<SnapshotBundle> {
    let targets: Vec<Release> = resolved.targets.iter().cloned().collect();
    let fetches: Vec<(Release, Component, SubRepo)> = targets
        .iter()
        .flat_map(|release| {
            manifest_combinations()
                .into_iter()
                .map(move |(component, sub_repo)| (release.clone(), component, sub_repo))
        })
        .collect();

    tracing::info!(
        "Gathering {} releases ({} manifests) with {} workers",
        targets.len(),
        fetches.len(),
        pool.threads()
    );

    let start = Instant::now();
    let (extracted, listings) = pool.join(
        || {
            let result = pool.map(&targets, |release| slices.slices(release));
            tracing::info!(
                "Fetched slices for {} releases in {:.2} seconds",
                targets.len(),
                start.elapsed().as_secs_f64()
            );
            result
        },
        || {
            let result = pool.map(&fetches, |(release, component, sub_repo)| {
                packages.packages(release, *component, *sub_repo)
            });
            tracing::info!(
                "Fetched {} package manifests in {:.2} seconds",
                fetches.len(),
                start.elapsed().as_secs_f64()
            );
            result
        },
    );
    let extracted = extracted?;
    let listings = listings?;

    let mut by_release: BTreeMap<Release, BTreeMap<(Component, SubRepo), Vec<Package>>> =
        BTreeMap::new();
    for ((release, component, sub_repo), listing) in fetches.into_iter().zip(listings) {
        by_release
            .entry(release)
            .or_default()
            .insert((component, sub_repo), listing);
    }

    let start = Instant::now();
    let work: Vec<(Release, SliceTexts)> = targets.into_iter().zip(extracted).collect();
    let analyzed = pool.map(&work, |(release, texts)| Ok(analyze_release(release, texts)))?;
    tracing::info!(
        "Analyzed {} slice definitions in {:.2} seconds",
        analyzed.iter().map(Vec::len).sum::<usize>(),
        start.elapsed().as_secs_f64()
    );

    let mut releases = BTreeMap::new();
    for ((release, _), slices) in work.into_iter().zip(analyzed) {
        let packages = merge_listings(by_release.remove(&release).unwrap_or_default());
        releases.insert(release, ReleaseData { slices, packages });
    }

    Ok(SnapshotBundle {
        catalog: resolved.catalog.clone(),
        targets: resolved.targets.clone(),
        releases,
    })
}

fn analyze_release(release: &Release, texts: &SliceTexts) -> Vec<SliceDefinition> {
    let slices: Vec<SliceDefinition> = texts
        .iter()
        .map(|(package, text)| SliceDefinition::analyze(package, text.clone()))
        .collect();

    let noted = slices.iter().filter(|s| !s.notes.is_empty()).count();
    tracing::debug!(
        "{}: {} slice definitions, {} with notes",
        release,
        slices.len(),
        noted
    );
    slices
}

/// Warn about a token that is set but unusable
pub fn check_token(token: Option<&str>) {
    match token {
        Some(t) if t.trim().is_empty() => {
            tracing::warn!("GITHUB_TOKEN is set but empty; continuing without a token")
        }
        Some(_) => tracing::debug!("GITHUB_TOKEN is set"),
        None => tracing::debug!("GITHUB_TOKEN is not set"),
    }
}

/// Build a snapshot with the release feed from `distro-info`
pub fn run(config: &PipelineConfig) -> Result<SnapshotStats> {
    let feed = DistroInfo::new(&config.distro_info);
    run_with_feed(config, &feed)
}

/// Build a snapshot end to end
pub fn run_with_feed(config: &PipelineConfig, feed: &dyn ReleaseFeed) -> Result<SnapshotStats> {
    let total = Instant::now();
    let compressed = config.compress.then(|| snapshot::compressed_path(&config.db_path));

    snapshot::check_outputs(&config.db_path, compressed.as_deref(), config.force)?;
    check_token(config.token.as_deref());
    let git_path = config.git.locate()?;
    tracing::debug!("Using git at '{}'", git_path.display());

    let catalog = ReleaseCatalog::load(feed)?;
    tracing::info!("Release feed lists {} releases", catalog.len());

    let clone = SharedClone::create(config.git.clone(), &config.repo_url, config.keep_temp)?;
    let branches = clone.remote_branches()?;
    let resolved = catalog.resolve(&branches, &config.branch_prefix)?;
    tracing::info!(
        "Found {} release branches: {}",
        resolved.targets.len(),
        resolved
            .targets
            .iter()
            .map(|r| r.version.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );

    let task_count = resolved.targets.len() * manifest_combinations().len();
    let pool = WorkerPool::new(config.jobs, task_count)?;
    let fetcher = ManifestFetcher::new(config.mirrors.clone(), config.fetch.clone())?;
    let extractor = SliceExtractor::new(&clone, &config.branch_prefix);

    let bundle = gather(&pool, &extractor, &fetcher, &resolved)?;
    drop(clone);

    let start = Instant::now();
    SnapshotWriter::new(&config.db_path, &config.repo_url, &config.branch_prefix).write(&bundle)?;
    tracing::info!(
        "Finished writing data to database in {:.2} seconds",
        start.elapsed().as_secs_f64()
    );

    if let Some(path) = &compressed {
        let start = Instant::now();
        Brotli::default().compress_file(&config.db_path, path)?;
        tracing::info!(
            "Finished compressing database file in {:.2} seconds",
            start.elapsed().as_secs_f64()
        );
    }

    let stats = SnapshotStats::collect(&config.db_path, compressed.as_deref())?;
    stats.log();
    tracing::info!("Done in {:.2} seconds", total.elapsed().as_secs_f64());
    Ok(stats)
}
