use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use repostatus::config::{all_drive_roots, normalize_root, ADHOC_MAX_DEPTH, ADHOC_MAX_DIRS};
use repostatus::health::ensure_git_available;
use repostatus::report::default_csv_path;
use repostatus::{Config, HealthCheck, ScanConfig, Scanner};

#[derive(Parser)]
#[command(name = "repostatus")]
#[command(about = "Filesystem-wide git repository discovery and sync-status reporting")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration file path (defaults to XDG config location)
    #[arg(short, long)]
    config: Option<std::path::PathBuf>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan for repositories and report their sync status
    Scan(ScanArgs),

    /// System health check and diagnostics
    Doctor,
}

#[derive(Args, Default)]
struct ScanArgs {
    /// Root path to scan (repeatable; defaults to the configured roots)
    #[arg(short, long = "root", value_name = "PATH")]
    roots: Vec<PathBuf>,

    /// Scan all fixed drives instead of explicit roots
    #[arg(long, conflicts_with = "roots")]
    all_drives: bool,

    /// Maximum traversal depth for the fallback scan (1-20)
    #[arg(long, value_name = "N")]
    max_depth: Option<usize>,

    /// Maximum directories visited by the fallback scan (1000-1000000)
    #[arg(long, value_name = "N")]
    max_dirs: Option<usize>,

    /// Descend into reparse-point/symlink directories
    #[arg(long)]
    follow_junctions: bool,

    /// Directory name to exclude from traversal (repeatable)
    #[arg(short, long = "exclude", value_name = "NAME")]
    excludes: Vec<String>,

    /// Local mode: skip all network-touching git queries
    #[arg(short, long)]
    local: bool,

    /// Suppress progress output
    #[arg(short, long)]
    quiet: bool,

    /// Show the nested-parent column in the report
    #[arg(long)]
    show_nested: bool,

    /// Export the report as CSV (timestamped filename when PATH is omitted)
    #[arg(long, value_name = "PATH", num_args = 0..=1)]
    csv: Option<Option<PathBuf>>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose)?;

    // Load configuration
    let config = match cli.config {
        Some(path) => Config::load(&path)?,
        None => Config::load_or_default()?,
    };

    // Execute command (default to a configured scan if none specified)
    match cli.command {
        None => cmd_scan(ScanArgs::default(), &config).await,
        Some(Commands::Scan(args)) => cmd_scan(args, &config).await,
        Some(Commands::Doctor) => cmd_doctor(&config),
    }
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    Ok(())
}

/// Resolve command-line arguments against the config file into one
/// immutable scan configuration.
fn build_scan_config(args: &ScanArgs, config: &Config) -> Result<ScanConfig> {
    let adhoc = args.all_drives || !args.roots.is_empty();

    let roots: Vec<PathBuf> = if args.all_drives {
        all_drive_roots()
    } else if !args.roots.is_empty() {
        args.roots.clone()
    } else {
        config
            .scan
            .roots
            .iter()
            .map(|s| normalize_root(PathBuf::from(s)))
            .collect()
    };

    if roots.is_empty() {
        bail!("No scan roots given. Pass --root, --all-drives, or configure scan.roots");
    }

    // Explicit roots use the ad-hoc defaults; configured scans use the
    // persisted budgets.
    let max_depth = args.max_depth.unwrap_or(if adhoc {
        ADHOC_MAX_DEPTH
    } else {
        config.scan.max_depth
    });
    let max_dirs = args.max_dirs.unwrap_or(if adhoc {
        ADHOC_MAX_DIRS
    } else {
        config.scan.max_dirs
    });

    let mut scan = ScanConfig::new(roots, max_depth, max_dirs)
        .with_excludes(config.scan.exclude.iter().cloned())
        .with_excludes(args.excludes.iter().cloned());

    scan.skip_junctions = config.scan.skip_junctions && !args.follow_junctions;
    scan.local_mode = args.local;
    scan.quiet = args.quiet;
    scan.show_nested = args.show_nested;
    scan.git_timeout = std::time::Duration::from_secs(config.git.timeout);
    scan.max_parallel = config.git.max_parallel;

    Ok(scan)
}

/// Scan for repositories and print the status report
async fn cmd_scan(args: ScanArgs, config: &Config) -> Result<()> {
    // Fatal prerequisite: checked once, before any discovery begins.
    ensure_git_available()?;

    let scan_config = build_scan_config(&args, config)?;

    let health = HealthCheck::run(&scan_config);
    if !scan_config.quiet {
        for warning in health.warnings() {
            eprintln!("⚠️  {}", warning.message);
            if let Some(details) = &warning.details {
                for line in details.lines() {
                    eprintln!("   {}", line);
                }
            }
        }
    }

    info!("Starting repository scan");

    let show_nested = scan_config.show_nested;
    let scanner = Scanner::new(scan_config);
    let report = scanner.run().await?;

    print!("{}", report.render_table(show_nested));
    println!();
    println!("{}", report.render_summary());

    if let Some(csv_arg) = args.csv {
        let csv_path = csv_arg.unwrap_or_else(default_csv_path);
        report.write_csv(&csv_path, show_nested)?;
        println!("Report written to {}", csv_path.display());
    }

    Ok(())
}

/// System health check and diagnostics
fn cmd_doctor(config: &Config) -> Result<()> {
    let roots: Vec<PathBuf> = config
        .scan
        .roots
        .iter()
        .map(|s| normalize_root(PathBuf::from(s)))
        .collect();
    let scan_config = ScanConfig::new(roots, config.scan.max_depth, config.scan.max_dirs);

    let health = HealthCheck::run(&scan_config);
    print_health_report(&health);
    Ok(())
}

/// Print health check report to stdout
fn print_health_report(health: &HealthCheck) {
    use repostatus::health::CheckResult;

    fn print_check(name: &str, result: &CheckResult) {
        println!("{}:", name);
        let icon = if result.passed {
            if result.is_warning {
                "⚠️ "
            } else {
                "✅"
            }
        } else {
            "❌"
        };
        println!("  {} {}", icon, result.message);
        if let Some(details) = &result.details {
            for line in details.lines() {
                println!("     {}", line);
            }
        }
    }

    println!("🔍 repostatus System Diagnostics");
    println!();

    for (name, result) in health.all_checks() {
        print_check(name, result);
        println!();
    }

    if health.all_passed() {
        println!("✅ All checks passed");
    } else {
        println!("❌ Some checks failed");
    }
}
