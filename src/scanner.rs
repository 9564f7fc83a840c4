//! Scan pipeline orchestration
//!
//! Drives the four phases in order: Discover, Analyze (bounded parallel),
//! DetectNested (over the complete discovered set), Aggregate. Each phase
//! returns its results as values; nothing is accumulated through shared
//! mutable state.

use anyhow::{Context, Result};
use futures::stream::{FuturesUnordered, StreamExt};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tracing::{debug, info};

use crate::config::ScanConfig;
use crate::report::Report;
use crate::status::{RepoStatus, StatusCollector};
use crate::{discover, nested};

/// Runs one scan over the configured roots.
pub struct Scanner {
    config: Arc<ScanConfig>,
}

impl Scanner {
    pub fn new(config: ScanConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// Execute the full pipeline and return the aggregated report.
    pub async fn run(&self) -> Result<Report> {
        let start = Instant::now();

        if !self.config.quiet {
            eprintln!("Scanning {} root(s) for repositories...", self.config.roots.len());
        }

        let config = self.config.clone();
        let repos = tokio::task::spawn_blocking(move || discover::discover(&config))
            .await
            .context("Discovery task failed")?;

        info!("Discovered {} repositories", repos.len());
        if !self.config.quiet {
            eprintln!("Found {} repositories, collecting status...", repos.len());
        }

        let mut rows = self.analyze(&repos).await;

        // Nested detection consumes the discovered path set, so it runs only
        // after every analysis result is in.
        for row in &mut rows {
            row.nested_parent = nested::find_parent(&row.path, &repos).map(Path::to_path_buf);
        }

        let report = Report::from_rows(rows);

        info!(
            "Scan completed in {:.2}s: {} repositories, {} dirty, {} unpushed",
            start.elapsed().as_secs_f64(),
            report.summary.total,
            report.summary.dirty,
            report.summary.unpushed
        );

        Ok(report)
    }

    /// Collect status for every repository, at most `max_parallel` at a time.
    /// Each repository's queries keep their own independent timeouts.
    async fn analyze(&self, repos: &[PathBuf]) -> Vec<RepoStatus> {
        let semaphore = Arc::new(Semaphore::new(self.config.max_parallel.max(1)));
        let collector = Arc::new(StatusCollector::new(&self.config));

        let mut futures = FuturesUnordered::new();

        for repo in repos {
            let semaphore = semaphore.clone();
            let collector = collector.clone();
            let repo = repo.clone();

            futures.push(async move {
                let _permit = semaphore.acquire().await.expect("Semaphore closed");
                collector.collect(&repo).await
            });
        }

        let mut rows = Vec::with_capacity(repos.len());
        while let Some(row) = futures.next().await {
            debug!(repo = %row.path.display(), "status collected");
            rows.push(row);
        }

        rows
    }

    /// Configuration for external inspection
    pub fn config(&self) -> &ScanConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    /// A bare `.git` directory is enough for discovery; every status query
    /// against it fails cleanly and degrades to the sentinels.
    fn make_marker_repo(path: &Path) {
        fs::create_dir_all(path.join(".git")).unwrap();
    }

    fn scan_config(root: &Path) -> ScanConfig {
        let mut config = ScanConfig::new(vec![root.to_path_buf()], 6, 150_000);
        config.quiet = true;
        config
    }

    #[tokio::test]
    async fn test_run_reports_every_discovered_repo() {
        let temp = TempDir::new().unwrap();
        make_marker_repo(&temp.path().join("alpha"));
        make_marker_repo(&temp.path().join("beta"));

        let report = Scanner::new(scan_config(temp.path())).run().await.unwrap();

        assert_eq!(report.summary.total, 2);
        let paths: Vec<_> = report.rows.iter().map(|r| r.path.clone()).collect();
        assert_eq!(
            paths,
            vec![temp.path().join("alpha"), temp.path().join("beta")]
        );
    }

    #[tokio::test]
    async fn test_run_annotates_nested_repos() {
        let temp = TempDir::new().unwrap();
        let outer = temp.path().join("outer");
        let inner = outer.join("libs/inner");
        make_marker_repo(&outer);
        make_marker_repo(&inner);

        let report = Scanner::new(scan_config(temp.path())).run().await.unwrap();

        assert_eq!(report.summary.nested, 1);
        let inner_row = report.rows.iter().find(|r| r.path == inner).unwrap();
        assert_eq!(inner_row.nested_parent.as_deref(), Some(outer.as_path()));
        let outer_row = report.rows.iter().find(|r| r.path == outer).unwrap();
        assert!(outer_row.nested_parent.is_none());
    }

    #[tokio::test]
    async fn test_run_over_empty_tree() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("just/dirs")).unwrap();

        let report = Scanner::new(scan_config(temp.path())).run().await.unwrap();
        assert_eq!(report.summary.total, 0);
        assert!(report.rows.is_empty());
    }
}
