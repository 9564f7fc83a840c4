//! System health checks for repostatus
//!
//! Preflight checks run before any discovery begins. The git check is the
//! run-aborting prerequisite; everything else degrades to warnings.

use anyhow::{bail, Result};

use crate::config::ScanConfig;

/// Result of system health checks
#[derive(Debug, Clone)]
pub struct HealthCheck {
    /// Git installation status
    pub git: CheckResult,
    /// Scan root availability (warning only)
    pub roots: CheckResult,
}

/// Result of an individual health check
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub passed: bool,
    pub message: String,
    pub details: Option<String>,
    pub is_warning: bool,
}

#[allow(dead_code)]
impl CheckResult {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            passed: true,
            message: message.into(),
            details: None,
            is_warning: false,
        }
    }

    fn ok_with_details(message: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            passed: true,
            message: message.into(),
            details: Some(details.into()),
            is_warning: false,
        }
    }

    fn error_with_details(message: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            passed: false,
            message: message.into(),
            details: Some(details.into()),
            is_warning: false,
        }
    }

    fn warning_with_details(message: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            passed: true,
            message: message.into(),
            details: Some(details.into()),
            is_warning: true,
        }
    }
}

impl HealthCheck {
    /// Run all health checks
    pub fn run(config: &ScanConfig) -> Self {
        Self {
            git: Self::check_git(),
            roots: Self::check_roots(config),
        }
    }

    /// Check if all required checks passed (excludes warnings)
    pub fn all_passed(&self) -> bool {
        self.git.passed
        // Missing roots are a warning: their contribution is simply empty.
    }

    /// Get list of warnings
    pub fn warnings(&self) -> Vec<&CheckResult> {
        [&self.git, &self.roots]
            .into_iter()
            .filter(|r| r.is_warning)
            .collect()
    }

    /// Check git installation
    fn check_git() -> CheckResult {
        match std::process::Command::new("git").arg("--version").output() {
            Ok(output) if output.status.success() => {
                let version = String::from_utf8_lossy(&output.stdout);
                CheckResult::ok_with_details("Git installed", version.trim().to_string())
            }
            Ok(_) => CheckResult::error_with_details(
                "Git command failed",
                "git --version exited with an error",
            ),
            Err(_) => CheckResult::error_with_details(
                "Git not found in PATH",
                "Install git: https://git-scm.com/downloads",
            ),
        }
    }

    /// Check that the configured scan roots exist
    fn check_roots(config: &ScanConfig) -> CheckResult {
        let missing: Vec<String> = config
            .roots
            .iter()
            .filter(|root| !root.exists())
            .map(|root| root.display().to_string())
            .collect();

        if missing.is_empty() {
            CheckResult::ok(format!("{} scan root(s) reachable", config.roots.len()))
        } else {
            CheckResult::warning_with_details(
                "Some scan roots do not exist",
                missing.join("\n"),
            )
        }
    }

    /// Get all checks as a slice for iteration
    pub fn all_checks(&self) -> [(&'static str, &CheckResult); 2] {
        [("Git Installation", &self.git), ("Scan Roots", &self.roots)]
    }
}

/// The fatal startup precondition: the external git tool must be resolvable.
/// Checked once, before any discovery begins.
pub fn ensure_git_available() -> Result<()> {
    let check = HealthCheck::check_git();
    if !check.passed {
        bail!(
            "{}. {}",
            check.message,
            check.details.unwrap_or_default()
        );
    }
    Ok(())
}
