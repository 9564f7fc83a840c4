//! Nested-repository detection
//!
//! Runs over the complete discovered set: a repository is nested when its
//! path is a strict filesystem descendant of another discovered repository.

use std::path::{Path, PathBuf};

/// Find a discovered repository that strictly contains `repo`.
///
/// `Path::starts_with` matches whole components, which is exactly the
/// "prefix followed by the separator" rule. The candidate list is scanned
/// in order, so with a sorted set the outermost ancestor wins. A repository
/// is never its own ancestor. The pairwise scan is fine at the intended
/// scale of tens to low hundreds of repositories.
pub fn find_parent<'a>(repo: &Path, all: &'a [PathBuf]) -> Option<&'a Path> {
    all.iter()
        .map(PathBuf::as_path)
        .find(|other| *other != repo && repo.starts_with(other))
}
