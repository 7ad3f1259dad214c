//! Slice extraction against real git repositories

mod common;

use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::thread;

use common::TestRepo;
use slicedb::catalog::Release;
use slicedb::extract::{SliceExtractor, SliceSource};
use slicedb::git::{Git, SharedClone};
use slicedb::SliceDbError;

const HELLO: &str = "package: hello\nslices:\n  copyright:\n    contents:\n      /usr/share/doc/hello/copyright:\n";
const BASH: &str = "package: bash\nslices:\n  bins:\n    contents:\n      /usr/bin/bash:\n";
const LATIN1: &[u8] = b"slices:\n  bins: {} # caf\xe9\n";

fn repo() -> TestRepo {
    let repo = TestRepo::new();
    repo.release_branch("release-22.04", &[("hello", HELLO), ("bash", BASH)])
        .release_branch("release-24.04", &[("hello", HELLO)])
        .bare_branch("release-24.10")
        .branch("main", &[("README.md", "docs\n")]);
    repo
}

#[test]
fn test_remote_branches_of_clone() {
    if !TestRepo::git_available() {
        return;
    }
    let repo = repo();
    let clone = SharedClone::create(Git::default(), &repo.url(), false).unwrap();

    let mut branches = clone.remote_branches().unwrap();
    branches.sort();
    assert_eq!(
        branches,
        vec!["main", "release-22.04", "release-24.04", "release-24.10"]
    );
}

#[test]
fn test_extract_reads_slice_files() {
    if !TestRepo::git_available() {
        return;
    }
    let repo = repo();
    let clone = SharedClone::create(Git::default(), &repo.url(), false).unwrap();
    let extractor = SliceExtractor::new(&clone, "release-");

    let slices = extractor
        .slices(&Release::new("22.04", "Jammy Jellyfish"))
        .unwrap();
    assert_eq!(slices.keys().collect::<Vec<_>>(), vec!["bash", "hello"]);
    assert_eq!(slices["hello"], HELLO.as_bytes());
}

#[test]
fn test_missing_slices_dir_is_empty() {
    if !TestRepo::git_available() {
        return;
    }
    let repo = repo();
    let clone = SharedClone::create(Git::default(), &repo.url(), false).unwrap();
    let extractor = SliceExtractor::new(&clone, "release-");

    let slices = extractor
        .slices(&Release::new("24.10", "Oracular Oriole"))
        .unwrap();
    assert!(slices.is_empty());
}

#[test]
fn test_unknown_branch_is_git_error() {
    if !TestRepo::git_available() {
        return;
    }
    let repo = repo();
    let clone = SharedClone::create(Git::default(), &repo.url(), false).unwrap();
    let extractor = SliceExtractor::new(&clone, "release-");

    let err = extractor
        .slices(&Release::new("30.04", "Missing Release"))
        .unwrap_err();
    assert!(matches!(err, slicedb::SliceDbError::Git { .. }));
}

fn worktree_count(clone: &SharedClone) -> usize {
    let listing = clone
        .git()
        .command(&["worktree", "list", "--porcelain"], Some(clone.path()))
        .unwrap();
    listing.matches("worktree ").count()
}

/// Check out `branch`, then fail reading a file the branch does not have
fn read_missing_file(
    clone: &SharedClone,
    branch: &str,
    checked_out: &mut Option<PathBuf>,
) -> slicedb::Result<Vec<u8>> {
    let worktree = clone.add_worktree(branch, "jammy")?;
    *checked_out = Some(worktree.path().to_path_buf());
    Ok(std::fs::read(worktree.path().join("slices").join("absent.yaml"))?)
}

#[test]
fn test_non_utf8_slice_is_extracted() {
    if !TestRepo::git_available() {
        return;
    }
    let repo = TestRepo::new();
    repo.release_branch("release-22.04", &[("hello", HELLO.as_bytes()), ("latin1", LATIN1)]);
    let clone = SharedClone::create(Git::default(), &repo.url(), false).unwrap();
    let extractor = SliceExtractor::new(&clone, "release-");

    let slices = extractor
        .slices(&Release::new("22.04", "Jammy Jellyfish"))
        .unwrap();
    assert_eq!(slices.len(), 2);
    assert_eq!(slices["latin1"], LATIN1);
    assert_eq!(worktree_count(&clone), 1);
}

#[test]
fn test_worktree_removed_when_reading_fails() {
    if !TestRepo::git_available() {
        return;
    }
    let repo = repo();
    let clone = SharedClone::create(Git::default(), &repo.url(), false).unwrap();

    let mut checked_out = None;
    let err = read_missing_file(&clone, "release-22.04", &mut checked_out).unwrap_err();
    assert!(matches!(err, SliceDbError::Io(_)), "{:?}", err);

    let dir = checked_out.expect("worktree was created before the failure");
    assert!(!dir.exists(), "{} left behind", dir.display());
    assert_eq!(worktree_count(&clone), 1);
}

#[test]
fn test_worktree_removed_on_panic() {
    if !TestRepo::git_available() {
        return;
    }
    let repo = repo();
    let clone = SharedClone::create(Git::default(), &repo.url(), false).unwrap();

    let mut checked_out: Option<PathBuf> = None;
    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        let worktree = clone.add_worktree("release-24.04", "noble").unwrap();
        checked_out = Some(worktree.path().to_path_buf());
        panic!("extraction interrupted");
    }));
    assert!(result.is_err());

    let dir = checked_out.unwrap();
    assert!(!dir.exists(), "{} left behind", dir.display());
    assert_eq!(worktree_count(&clone), 1);
}

#[test]
fn test_worktrees_removed_after_extraction() {
    if !TestRepo::git_available() {
        return;
    }
    let repo = repo();
    let clone = SharedClone::create(Git::default(), &repo.url(), false).unwrap();
    let extractor = SliceExtractor::new(&clone, "release-");

    extractor
        .slices(&Release::new("24.04", "Noble Numbat"))
        .unwrap();

    assert_eq!(worktree_count(&clone), 1);
}

#[test]
fn test_concurrent_extraction_of_different_releases() {
    if !TestRepo::git_available() {
        return;
    }
    let repo = repo();
    let clone = SharedClone::create(Git::default(), &repo.url(), false).unwrap();
    let extractor = SliceExtractor::new(&clone, "release-");

    let releases = [
        Release::new("22.04", "Jammy Jellyfish"),
        Release::new("24.04", "Noble Numbat"),
        Release::new("24.10", "Oracular Oriole"),
    ];
    let extractor = &extractor;
    let counts: Vec<usize> = thread::scope(|s| {
        let handles: Vec<_> = releases
            .iter()
            .map(|release| s.spawn(move || extractor.slices(release).unwrap().len()))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    assert_eq!(counts, vec![2, 1, 0]);
}

#[test]
fn test_open_existing_clone_is_left_in_place() {
    if !TestRepo::git_available() {
        return;
    }
    let repo = repo();
    let dest = tempfile::TempDir::new().unwrap();
    let path = dest.path().join("clone");
    Git::default()
        .clone_all_branches(&repo.url(), &path)
        .unwrap();

    {
        let clone = SharedClone::open(Git::default(), &path, &repo.url(), false);
        let extractor = SliceExtractor::new(&clone, "release-");
        let slices = extractor
            .slices(&Release::new("24.04", "Noble Numbat"))
            .unwrap();
        assert_eq!(slices.len(), 1);
    }
    assert!(path.join(".git").exists());
}
