//! Per-repository status collection
//!
//! Every git query goes through a single timeout-guarded invocation
//! primitive. Failures never propagate out of the collector: each field
//! degrades to its sentinel and the run moves on to the next field.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::process::Command as AsyncCommand;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::config::ScanConfig;

/// Sentinel shown when no branch is checked out.
pub const BRANCH_NONE: &str = "(detached or none)";
/// Sentinel shown when no origin remote is configured.
pub const ORIGIN_NONE: &str = "(no origin)";
/// Sentinel shown for the origin column in local mode.
pub const ORIGIN_SKIPPED: &str = "Skipped (Local Mode)";
/// Sentinel shown when the branch has no upstream tracking ref.
pub const UPSTREAM_NONE: &str = "(none)";

/// Result of one timeout-guarded git invocation.
///
/// The user-visible behavior collapses everything but `Output` to an empty
/// answer; the variants stay distinct so tests can assert on the condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryOutcome {
    /// Clean exit; trimmed standard output, possibly empty.
    Output(String),
    /// The query exceeded its timeout and the child was killed.
    Timeout,
    /// The child could not be launched or waited on.
    ProcessError,
}

impl QueryOutcome {
    /// Successful non-empty output, or None for every degraded case.
    pub fn non_empty(&self) -> Option<&str> {
        match self {
            QueryOutcome::Output(s) if !s.is_empty() => Some(s),
            _ => None,
        }
    }
}

/// Whether the current branch's tip exists on the configured remote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushState {
    Yes,
    No,
    Unknown,
    Skipped,
}

impl fmt::Display for PushState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PushState::Yes => "Yes",
            PushState::No => "No",
            PushState::Unknown => "Unknown",
            PushState::Skipped => "Skipped",
        };
        f.write_str(s)
    }
}

/// The origin remote, or why it is absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OriginState {
    Url(String),
    Missing,
    /// The query was never issued because the run is in local mode.
    Skipped,
}

impl OriginState {
    pub fn is_present(&self) -> bool {
        matches!(self, OriginState::Url(_))
    }

    pub fn display(&self) -> &str {
        match self {
            OriginState::Url(url) => url,
            OriginState::Missing => ORIGIN_NONE,
            OriginState::Skipped => ORIGIN_SKIPPED,
        }
    }
}

/// Synchronization status of one discovered repository.
///
/// Fixed shape: the nested-parent field is always present, empty unless the
/// repository sits inside another discovered repository.
#[derive(Debug, Clone)]
pub struct RepoStatus {
    pub path: PathBuf,
    pub branch: Option<String>,
    pub origin: OriginState,
    pub upstream: Option<String>,
    pub ahead: u32,
    pub behind: u32,
    pub pushed: PushState,
    pub dirty: bool,
    pub nested_parent: Option<PathBuf>,
}

impl RepoStatus {
    pub fn branch_display(&self) -> &str {
        self.branch.as_deref().unwrap_or(BRANCH_NONE)
    }

    pub fn upstream_display(&self) -> &str {
        self.upstream.as_deref().unwrap_or(UPSTREAM_NONE)
    }
}

/// Issues bounded git queries against one repository at a time.
pub struct StatusCollector {
    git_timeout: Duration,
    local_mode: bool,
}

impl StatusCollector {
    pub fn new(config: &ScanConfig) -> Self {
        Self {
            git_timeout: config.git_timeout,
            local_mode: config.local_mode,
        }
    }

    pub fn with_timeout(git_timeout: Duration, local_mode: bool) -> Self {
        Self {
            git_timeout,
            local_mode,
        }
    }

    /// Collect the full status of one repository.
    ///
    /// In local mode the origin and push queries are never issued; their
    /// fields carry the skipped sentinels instead.
    pub async fn collect(&self, repo: &Path) -> RepoStatus {
        let branch = self
            .run_query(repo, &["branch", "--show-current"])
            .await
            .non_empty()
            .map(str::to_string);

        let origin = if self.local_mode {
            OriginState::Skipped
        } else {
            match self
                .run_query(repo, &["remote", "get-url", "origin"])
                .await
                .non_empty()
            {
                Some(url) => OriginState::Url(url.to_string()),
                None => OriginState::Missing,
            }
        };

        let upstream = self
            .run_query(
                repo,
                &["rev-parse", "--abbrev-ref", "--symbolic-full-name", "@{u}"],
            )
            .await
            .non_empty()
            .map(str::to_string);

        let (ahead, behind) = if !self.local_mode && upstream.is_some() {
            self.query_ahead_behind(repo).await
        } else {
            (0, 0)
        };

        let pushed = self.query_pushed(repo, &origin, branch.as_deref()).await;

        let dirty = self
            .run_query(repo, &["status", "--porcelain"])
            .await
            .non_empty()
            .is_some();

        RepoStatus {
            path: repo.to_path_buf(),
            branch,
            origin,
            upstream,
            ahead,
            behind,
            pushed,
            dirty,
            nested_parent: None,
        }
    }

    async fn query_ahead_behind(&self, repo: &Path) -> (u32, u32) {
        match self
            .run_query(repo, &["rev-list", "--left-right", "--count", "@{u}...HEAD"])
            .await
        {
            QueryOutcome::Output(out) => match parse_ahead_behind(&out) {
                Some(counts) => counts,
                None => {
                    if !out.is_empty() {
                        warn!(repo = %repo.display(), output = %out, "malformed ahead/behind count, defaulting to 0/0");
                    }
                    (0, 0)
                }
            },
            _ => (0, 0),
        }
    }

    async fn query_pushed(
        &self,
        repo: &Path,
        origin: &OriginState,
        branch: Option<&str>,
    ) -> PushState {
        if self.local_mode {
            return PushState::Skipped;
        }

        let (OriginState::Url(_), Some(branch)) = (origin, branch) else {
            return PushState::Unknown;
        };

        match self
            .run_query(repo, &["ls-remote", "--heads", "origin", branch])
            .await
        {
            QueryOutcome::Output(out) if !out.is_empty() => PushState::Yes,
            QueryOutcome::Output(_) => PushState::No,
            _ => PushState::Unknown,
        }
    }

    /// Run one git query scoped to `repo`, bounded by the configured timeout.
    pub async fn run_query(&self, repo: &Path, args: &[&str]) -> QueryOutcome {
        self.run_tool(repo, "git", args).await
    }

    async fn run_tool(&self, repo: &Path, program: &str, args: &[&str]) -> QueryOutcome {
        let mut child = match AsyncCommand::new(program)
            .args(args)
            .current_dir(repo)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
        {
            Ok(child) => child,
            Err(err) => {
                debug!(repo = %repo.display(), program, error = %err, "failed to launch query");
                return QueryOutcome::ProcessError;
            }
        };

        // Drain stdout on a separate task so a chatty child cannot fill the
        // pipe while we wait on its exit status.
        let stdout = child.stdout.take();
        let reader = tokio::spawn(async move {
            let mut buf = Vec::new();
            if let Some(mut out) = stdout {
                let _ = out.read_to_end(&mut buf).await;
            }
            buf
        });

        match timeout(self.git_timeout, child.wait()).await {
            Ok(Ok(status)) => {
                let buf = reader.await.unwrap_or_default();
                if status.success() {
                    QueryOutcome::Output(String::from_utf8_lossy(&buf).trim().to_string())
                } else {
                    // Non-zero exit is a normal empty answer, e.g. asking
                    // for an upstream that is not configured.
                    QueryOutcome::Output(String::new())
                }
            }
            Ok(Err(err)) => {
                reader.abort();
                debug!(repo = %repo.display(), error = %err, "query wait failed");
                QueryOutcome::ProcessError
            }
            Err(_) => {
                reader.abort();
                let _ = child.kill().await;
                warn!(
                    repo = %repo.display(),
                    ?args,
                    timeout_secs = self.git_timeout.as_secs(),
                    "git query timed out, using degraded value"
                );
                QueryOutcome::Timeout
            }
        }
    }
}

/// Parse `rev-list --left-right --count` output: left is the upstream-only
/// commit count (behind), right is the local-only count (ahead).
fn parse_ahead_behind(out: &str) -> Option<(u32, u32)> {
    let mut parts = out.split_whitespace();
    let behind: u32 = parts.next()?.parse().ok()?;
    let ahead: u32 = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some((ahead, behind))
}
