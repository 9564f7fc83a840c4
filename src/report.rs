//! Report aggregation and rendering
//!
//! Pure aggregation of per-repository rows into a path-sorted report with
//! summary counters, plus the console table and CSV renderings.

use anyhow::{Context, Result};
use chrono::Local;
use std::path::{Path, PathBuf};

use crate::status::{PushState, RepoStatus};

/// Derived counters over one report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Summary {
    pub total: usize,
    pub dirty: usize,
    pub unpushed: usize,
    pub ahead: usize,
    pub behind: usize,
    pub nested: usize,
}

/// The full set of status rows, sorted by path, with summary counters.
#[derive(Debug, Clone)]
pub struct Report {
    pub rows: Vec<RepoStatus>,
    pub summary: Summary,
}

impl Report {
    /// Aggregate rows into a report. Pure function of its input: sorts by
    /// path and computes the counters, regardless of completion order.
    pub fn from_rows(mut rows: Vec<RepoStatus>) -> Self {
        rows.sort_by(|a, b| a.path.cmp(&b.path));

        let summary = Summary {
            total: rows.len(),
            dirty: rows.iter().filter(|r| r.dirty).count(),
            unpushed: rows.iter().filter(|r| r.pushed == PushState::No).count(),
            ahead: rows.iter().filter(|r| r.ahead > 0).count(),
            behind: rows.iter().filter(|r| r.behind > 0).count(),
            nested: rows.iter().filter(|r| r.nested_parent.is_some()).count(),
        };

        Self { rows, summary }
    }

    /// Render the report as an aligned console table.
    pub fn render_table(&self, show_nested: bool) -> String {
        let headers = columns(show_nested);
        let table_rows: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|row| row_cells(row, show_nested))
            .collect();

        let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
        for cells in &table_rows {
            for (i, cell) in cells.iter().enumerate() {
                widths[i] = widths[i].max(cell.len());
            }
        }

        let mut out = String::new();
        render_line(&mut out, headers.iter().map(|s| s.to_string()), &widths);
        render_line(
            &mut out,
            widths.iter().map(|w| "-".repeat(*w)),
            &widths,
        );
        for cells in table_rows {
            render_line(&mut out, cells.into_iter(), &widths);
        }

        out
    }

    /// Render the summary counters.
    pub fn render_summary(&self) -> String {
        let s = &self.summary;
        format!(
            "Repositories: {}  Dirty: {}  Unpushed: {}  Ahead: {}  Behind: {}  Nested: {}",
            s.total, s.dirty, s.unpushed, s.ahead, s.behind, s.nested
        )
    }

    /// Export the report to a CSV file with the same columns as the table.
    pub fn write_csv(&self, path: &Path, show_nested: bool) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)
            .with_context(|| format!("Failed to create CSV file: {:?}", path))?;

        writer
            .write_record(columns(show_nested))
            .context("Failed to write CSV header")?;

        for row in &self.rows {
            writer
                .write_record(row_cells(row, show_nested))
                .context("Failed to write CSV row")?;
        }

        writer.flush().context("Failed to flush CSV file")?;
        Ok(())
    }
}

/// Timestamped default filename for CSV export in the current directory.
pub fn default_csv_path() -> PathBuf {
    PathBuf::from(format!(
        "repostatus-{}.csv",
        Local::now().format("%Y%m%d-%H%M%S")
    ))
}

fn columns(show_nested: bool) -> Vec<&'static str> {
    let mut headers = vec![
        "RepoRoot", "Branch", "Origin", "Upstream", "Ahead", "Behind", "Pushed", "Dirty",
    ];
    if show_nested {
        headers.push("Nested");
    }
    headers
}

fn row_cells(row: &RepoStatus, show_nested: bool) -> Vec<String> {
    let mut cells = vec![
        row.path.display().to_string(),
        row.branch_display().to_string(),
        row.origin.display().to_string(),
        row.upstream_display().to_string(),
        row.ahead.to_string(),
        row.behind.to_string(),
        row.pushed.to_string(),
        if row.dirty { "Yes" } else { "No" }.to_string(),
    ];
    if show_nested {
        cells.push(
            row.nested_parent
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
        );
    }
    cells
}

fn render_line<I>(out: &mut String, cells: I, widths: &[usize])
where
    I: Iterator<Item = String>,
{
    let padded: Vec<String> = cells
        .zip(widths.iter().copied())
        .map(|(cell, width)| format!("{cell:<width$}"))
        .collect();
    out.push_str(padded.join("  ").trim_end());
    out.push('\n');
}
