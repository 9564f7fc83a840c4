//! Two-phase repository discovery
//!
//! A fast recursive enumeration runs first; only when it comes back empty
//! across every root does the bounded breadth-first fallback re-walk the
//! same roots with explicit depth, exclusion and directory budgets.

use std::collections::{BTreeSet, VecDeque};
use std::path::{Path, PathBuf};
use tracing::{debug, trace, warn};
use walkdir::WalkDir;

use crate::config::ScanConfig;

/// A directory is a repository root when its immediate `.git` child exists.
pub fn is_repo_root(path: &Path) -> bool {
    path.join(".git").exists()
}

/// Discover repository roots under the configured roots.
///
/// Returns the sorted, deduplicated union of hits from whichever phase ran.
///
/// An empty quick scan is indistinguishable from one that failed and
/// swallowed the error, so emptiness always triggers the fallback traversal
/// even over legitimately empty trees. The fallback is the correctness net
/// for the quick phase's all-or-nothing error handling.
pub fn discover(config: &ScanConfig) -> Vec<PathBuf> {
    let mut hits = quick_scan(&config.roots);

    if hits.is_empty() {
        debug!("quick scan found no repositories, running bounded fallback traversal");
        hits = fallback_scan(config);
    }

    hits.into_iter().collect()
}

/// Quick phase: unbounded recursive enumeration of every root.
///
/// No depth or exclusion control. A root whose enumeration errors at any
/// point contributes nothing, not a partial set.
pub fn quick_scan(roots: &[PathBuf]) -> BTreeSet<PathBuf> {
    let mut hits = BTreeSet::new();

    for root in roots {
        match quick_scan_root(root) {
            Some(found) => hits.extend(found),
            None => trace!(root = %root.display(), "quick scan failed for root, dropping its results"),
        }
    }

    hits
}

fn quick_scan_root(root: &Path) -> Option<BTreeSet<PathBuf>> {
    let mut hits = BTreeSet::new();

    for entry in WalkDir::new(root).follow_links(false) {
        match entry {
            Ok(entry) => {
                if entry.file_type().is_dir() && is_repo_root(entry.path()) {
                    hits.insert(entry.path().to_path_buf());
                }
            }
            // All-or-nothing per root: one enumeration error discards the
            // root's entire contribution.
            Err(err) => {
                trace!(root = %root.display(), error = %err, "quick scan enumeration error");
                return None;
            }
        }
    }

    Some(hits)
}

/// Fallback phase: breadth-first traversal with explicit budgets.
///
/// Maintains a single dequeue counter across all roots; reaching `max_dirs`
/// halts the whole traversal and returns whatever was accumulated.
pub fn fallback_scan(config: &ScanConfig) -> BTreeSet<PathBuf> {
    let mut hits = BTreeSet::new();
    let mut dequeued = 0usize;

    for root in &config.roots {
        if !walk_bounded(root, config, &mut dequeued, &mut hits) {
            warn!(
                max_dirs = config.max_dirs,
                "directory budget reached, discovery results are partial"
            );
            break;
        }
    }

    hits
}

/// Walk one root breadth-first. Returns false when the directory budget ran
/// out, true when the root's queue drained normally.
fn walk_bounded(
    root: &Path,
    config: &ScanConfig,
    dequeued: &mut usize,
    hits: &mut BTreeSet<PathBuf>,
) -> bool {
    let mut queue: VecDeque<(PathBuf, usize)> = VecDeque::new();
    queue.push_back((root.to_path_buf(), 0));

    while let Some((dir, depth)) = queue.pop_front() {
        if *dequeued >= config.max_dirs {
            return false;
        }
        *dequeued += 1;

        if is_repo_root(&dir) {
            hits.insert(dir.clone());
        }

        if depth >= config.max_depth {
            continue;
        }

        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            // Unreadable directory is a leaf: skip the subtree, keep going.
            Err(err) => {
                trace!(dir = %dir.display(), error = %err, "skipping unreadable directory");
                continue;
            }
        };

        for entry in entries.flatten() {
            let name = entry.file_name();
            if config.is_excluded(&name.to_string_lossy()) {
                continue;
            }

            let file_type = match entry.file_type() {
                Ok(file_type) => file_type,
                Err(_) => continue,
            };

            if file_type.is_symlink() {
                if config.skip_junctions {
                    continue;
                }
                // Follow the link only if it points at a directory.
                if !entry.path().is_dir() {
                    continue;
                }
            } else if !file_type.is_dir() {
                continue;
            }

            queue.push_back((entry.path(), depth + 1));
        }
    }

    true
}
