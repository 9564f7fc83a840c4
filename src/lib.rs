//! repostatus - Filesystem-Wide Git Repository Status Scanner
//!
//! repostatus discovers git repositories scattered across a filesystem and
//! reports each one's synchronization status relative to its remote: branch,
//! origin, upstream tracking ref, commits ahead/behind, push presence and
//! local dirtiness, with detection of repositories nested inside other
//! repositories.
//!
//! ## Core Features
//!
//! - **Two-Phase Discovery**: fast recursive enumeration with a bounded
//!   breadth-first fallback governed by depth and directory budgets
//! - **Degraded-Mode Reporting**: every git query is timeout-guarded and
//!   falls back to a sentinel value instead of failing the run
//! - **Local Mode**: network-touching queries can be suppressed entirely
//! - **Configuration Management**: YAML-based configuration with XDG compliance
//!
//! ## Modules
//!
//! - [`discover`]: repository discovery over the configured roots
//! - [`status`]: per-repository status collection
//! - [`report`]: aggregation, console table and CSV export

pub mod config;
pub mod discover;
pub mod health;
pub mod nested;
pub mod report;
pub mod scanner;
pub mod status;

pub use config::{Config, ScanConfig};
pub use health::HealthCheck;
pub use report::{Report, Summary};
pub use scanner::Scanner;
pub use status::{OriginState, PushState, QueryOutcome, RepoStatus, StatusCollector};
