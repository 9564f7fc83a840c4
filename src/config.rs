use anyhow::{Context, Result};
use dirs::config_dir;
use path_clean::PathClean;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Depth budget bounds for the fallback traversal.
pub const MIN_DEPTH: usize = 1;
pub const MAX_DEPTH: usize = 20;

/// Directory-count budget bounds for the fallback traversal.
pub const MIN_DIRS: usize = 1_000;
pub const MAX_DIRS: usize = 1_000_000;

/// Defaults used for ad-hoc scans driven entirely from the command line.
pub const ADHOC_MAX_DEPTH: usize = 6;
pub const ADHOC_MAX_DIRS: usize = 150_000;

/// Directory names never descended into during the fallback traversal.
/// Exact match against the last path segment.
pub const DEFAULT_EXCLUDES: &[&str] = &[
    ".git",
    ".venv",
    "__pycache__",
    "node_modules",
    "target",
    "bin",
    "obj",
    "Windows",
    "Program Files",
    "Program Files (x86)",
    "ProgramData",
    "$Recycle.Bin",
    "System Volume Information",
];

/// Main configuration structure for repostatus
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    /// Scan defaults applied when the command line does not override them
    #[serde(default)]
    pub scan: ScanSection,

    /// Git query behavior
    #[serde(default)]
    pub git: GitSection,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Persisted scan defaults
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ScanSection {
    /// Root paths to scan when none are given on the command line
    #[serde(default)]
    pub roots: Vec<String>,

    /// Maximum traversal depth for the fallback scan
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Maximum directories visited by the fallback scan
    #[serde(default = "default_max_dirs")]
    pub max_dirs: usize,

    /// Directory names excluded in addition to the built-in set
    #[serde(default)]
    pub exclude: Vec<String>,

    /// Skip reparse-point/symlink directories during traversal
    #[serde(default = "default_true")]
    pub skip_junctions: bool,
}

/// Git query configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GitSection {
    /// Timeout for a single git query in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Maximum repositories analyzed in parallel
    #[serde(default = "default_max_parallel")]
    pub max_parallel: usize,
}

/// Logging configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String, // "info"

    /// Enable colored output
    #[serde(default = "default_true")]
    pub color: bool,
}

// Default value functions
fn default_max_depth() -> usize {
    4
}
fn default_max_dirs() -> usize {
    50_000
}
fn default_true() -> bool {
    true
}
fn default_timeout() -> u64 {
    30
}
fn default_max_parallel() -> usize {
    4
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ScanSection {
    fn default() -> Self {
        Self {
            roots: Vec::new(),
            max_depth: default_max_depth(),
            max_dirs: default_max_dirs(),
            exclude: Vec::new(),
            skip_junctions: default_true(),
        }
    }
}

impl Default for GitSection {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            max_parallel: default_max_parallel(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            color: default_true(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scan: ScanSection::default(),
            git: GitSection::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from the default location or create a default config
    pub fn load_or_default() -> Result<Self> {
        let config_path = Self::default_config_path()?;

        if config_path.exists() {
            Self::load(&config_path)
        } else {
            let config = Self::default();

            if let Some(parent) = config_path.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
            }

            config.save(&config_path)?;

            tracing::info!("Created default configuration at: {:?}", config_path);
            Ok(config)
        }
    }

    /// Load configuration from a specific file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;

        Ok(config)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_yaml::to_string(self).context("Failed to serialize configuration")?;

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {:?}", path))?;

        Ok(())
    }

    /// Get the default configuration file path (XDG compliant)
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = config_dir().context("Failed to get user config directory")?;

        Ok(config_dir.join("repostatus").join("config.yml"))
    }
}

/// Immutable settings for one scan run.
///
/// Built once from the config file plus command-line overrides, then shared
/// read-only across the discovery and analysis phases.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Absolute root paths, environment-expanded and cleaned
    pub roots: Vec<PathBuf>,
    /// Fallback traversal depth budget, clamped to 1..=20
    pub max_depth: usize,
    /// Fallback traversal directory budget, clamped to 1_000..=1_000_000
    pub max_dirs: usize,
    /// Excluded directory names (exact last-segment match)
    pub exclude: HashSet<String>,
    /// Skip reparse-point/symlink directories
    pub skip_junctions: bool,
    /// Suppress all network-touching git queries
    pub local_mode: bool,
    /// Suppress progress output
    pub quiet: bool,
    /// Annotate repositories nested inside other repositories
    pub show_nested: bool,
    /// Per-query git timeout
    pub git_timeout: Duration,
    /// Repositories analyzed concurrently
    pub max_parallel: usize,
}

impl ScanConfig {
    /// Build a scan configuration, clamping budgets into their valid ranges.
    pub fn new(roots: Vec<PathBuf>, max_depth: usize, max_dirs: usize) -> Self {
        Self {
            roots: roots.into_iter().map(normalize_root).collect(),
            max_depth: max_depth.clamp(MIN_DEPTH, MAX_DEPTH),
            max_dirs: max_dirs.clamp(MIN_DIRS, MAX_DIRS),
            exclude: DEFAULT_EXCLUDES.iter().map(|s| s.to_string()).collect(),
            skip_junctions: true,
            local_mode: false,
            quiet: false,
            show_nested: false,
            git_timeout: Duration::from_secs(default_timeout()),
            max_parallel: default_max_parallel(),
        }
    }

    /// Merge additional excluded names into the built-in set.
    pub fn with_excludes<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude.extend(names.into_iter().map(Into::into));
        self
    }

    /// Whether a directory name is excluded from traversal.
    pub fn is_excluded(&self, name: &str) -> bool {
        self.exclude.contains(name)
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self::new(Vec::new(), ADHOC_MAX_DEPTH, ADHOC_MAX_DIRS)
    }
}

/// Expand environment variables and produce an absolute, cleaned path.
pub fn normalize_root(path: PathBuf) -> PathBuf {
    let raw = path.to_string_lossy().into_owned();
    let expanded = shellexpand::full(&raw)
        .map(|c| PathBuf::from(c.into_owned()))
        .unwrap_or(path);

    if expanded.is_absolute() {
        expanded.clean()
    } else {
        std::env::current_dir()
            .unwrap_or_default()
            .join(expanded)
            .clean()
    }
}

/// Root paths for a whole-machine scan.
///
/// On Windows this enumerates existing drive letters; elsewhere the
/// filesystem root stands in for "all fixed drives".
pub fn all_drive_roots() -> Vec<PathBuf> {
    #[cfg(windows)]
    {
        (b'A'..=b'Z')
            .map(|letter| PathBuf::from(format!("{}:\\", letter as char)))
            .filter(|p| p.exists())
            .collect()
    }

    #[cfg(not(windows))]
    {
        vec![PathBuf::from("/")]
    }
}
