//! Local project-status scanner.
//!
//! Scans a directory tree of markdown planning files and counts PRDs,
//! epics, and tasks. The layout is fixed: PRD documents live directly under
//! a `PRDs` directory, each epic is a subdirectory of `Epics`, and tasks
//! are markdown files anywhere under `Epics`. A task is closed when its
//! content carries a literal `status: closed` line.

use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::debug;
use walkdir::WalkDir;

/// Directory of PRD markdown files, relative to the scan root.
pub const PRDS_DIR: &str = "PRDs";
/// Directory of epic subdirectories, relative to the scan root.
pub const EPICS_DIR: &str = "Epics";

/// The closed marker, matched case-sensitively against trimmed lines.
const CLOSED_MARKER: &str = "status: closed";

/// Counts for a section of the planning tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SectionCounts {
    /// Number of entries found.
    pub total: usize,
    /// Whether the section's directory exists. Absence is not an error.
    pub found: bool,
}

/// Task counts, split by open/closed status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TaskCounts {
    pub total: usize,
    pub found: bool,
    /// Tasks without a closed marker (the default).
    pub open: usize,
    /// Tasks with a literal `status: closed` line.
    pub closed: usize,
}

/// Result of scanning one planning tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    pub prds: SectionCounts,
    pub epics: SectionCounts,
    pub tasks: TaskCounts,
}

/// Scan `root` for PRD, epic, and task counts.
///
/// Missing `PRDs` or `Epics` directories produce `found: false` sections
/// with zero counts rather than an error.
pub fn scan(root: &Path) -> Result<StatusReport> {
    Ok(StatusReport {
        prds: scan_prds(&root.join(PRDS_DIR))?,
        epics: scan_epics(&root.join(EPICS_DIR))?,
        tasks: scan_tasks(&root.join(EPICS_DIR))?,
    })
}

/// Count markdown files directly under the PRDs directory.
fn scan_prds(dir: &Path) -> Result<SectionCounts> {
    if !dir.is_dir() {
        debug!("No PRDs directory at {}", dir.display());
        return Ok(SectionCounts::default());
    }

    let mut total = 0;
    for entry in fs::read_dir(dir)
        .with_context(|| format!("Failed to read PRDs directory: {}", dir.display()))?
    {
        let entry = entry?;
        if entry.path().is_file() && is_markdown(&entry.path()) {
            total += 1;
        }
    }

    Ok(SectionCounts { total, found: true })
}

/// Count subdirectories of the Epics directory.
fn scan_epics(dir: &Path) -> Result<SectionCounts> {
    if !dir.is_dir() {
        debug!("No Epics directory at {}", dir.display());
        return Ok(SectionCounts::default());
    }

    let mut total = 0;
    for entry in fs::read_dir(dir)
        .with_context(|| format!("Failed to read Epics directory: {}", dir.display()))?
    {
        if entry?.path().is_dir() {
            total += 1;
        }
    }

    Ok(SectionCounts { total, found: true })
}

/// Count markdown files recursively under the Epics directory, classifying
/// each as open or closed.
fn scan_tasks(dir: &Path) -> Result<TaskCounts> {
    if !dir.is_dir() {
        return Ok(TaskCounts::default());
    }

    let mut counts = TaskCounts {
        found: true,
        ..TaskCounts::default()
    };

    for entry in WalkDir::new(dir).into_iter().filter_map(|e| e.ok()) {
        let path = entry.path();
        if !entry.file_type().is_file() || !is_markdown(path) {
            continue;
        }

        counts.total += 1;
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read task file: {}", path.display()))?;
        if is_closed(&content) {
            counts.closed += 1;
        } else {
            counts.open += 1;
        }
    }

    Ok(counts)
}

fn is_markdown(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some("md")
}

/// A task is closed iff some line, trimmed, is exactly `status: closed`.
/// Any other status value, or no status line at all, means open.
fn is_closed(content: &str) -> bool {
    content.lines().any(|line| line.trim() == CLOSED_MARKER)
}
