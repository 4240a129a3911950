//! Recursive folder size aggregation with a reporting policy.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::info;

use foldersize_core::format::{name_column_width, size_line};
use foldersize_core::{FsNode, ScanError, ScanWarning, SizeConfig};

use crate::walker::{TreeWalker, Visitor};

/// Why an entry was selected for the report. First match wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Inclusion {
    /// Within `max_depth` of the root.
    Depth,
    /// Directory name is on the always-show list.
    AlwaysShow,
    /// Directory size exceeds the large-folder threshold.
    Large,
}

/// A reportable node and its aggregated size.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SizeEntry {
    /// The file or directory.
    pub node: FsNode,
    /// Full recursive size in bytes.
    pub size: u64,
    /// Rule that selected this entry.
    pub inclusion: Inclusion,
}

/// Result of a size aggregation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SizeReport {
    /// Canonical root that was aggregated.
    pub root: PathBuf,
    /// Reportable entries, sorted by size descending (stable on ties).
    pub entries: Vec<SizeEntry>,
    /// Sum of the root's immediate children, each counted once.
    pub total: u64,
    /// Directories visited, including the root.
    pub dirs: u64,
    /// Files visited.
    pub files: u64,
    /// Subtrees that were unreadable and counted as zero.
    pub warnings: Vec<ScanWarning>,
    /// Wall time of the run.
    pub duration: Duration,
}

impl SizeReport {
    /// Render the text report: a `total` line, a blank line, then one line
    /// per entry.
    pub fn lines(&self, full_path: bool) -> Vec<String> {
        let names: Vec<String> = self
            .entries
            .iter()
            .map(|e| e.node.display_name(full_path))
            .collect();
        let width = name_column_width(names.iter().map(|n| n.chars().count()).max().unwrap_or(0));

        let mut lines = Vec::with_capacity(self.entries.len() + 2);
        lines.push(size_line("total", self.total, width));
        lines.push(String::new());
        for (name, entry) in names.iter().zip(&self.entries) {
            lines.push(size_line(name, entry.size, width));
        }
        lines
    }
}

/// Computes cumulative directory sizes and selects reportable entries.
pub struct SizeAggregator {
    config: SizeConfig,
}

impl SizeAggregator {
    /// Create an aggregator for the given configuration.
    pub fn new(config: SizeConfig) -> Self {
        Self { config }
    }

    /// Walk the configured root and build the report.
    pub fn aggregate(&self) -> Result<SizeReport, ScanError> {
        let start = Instant::now();
        let mut state = AggregateState::new(&self.config);
        let summary = TreeWalker::new().walk(&self.config.root, &mut state)?;

        let mut entries = state.entries;
        entries.sort_by(|a, b| b.size.cmp(&a.size));

        info!(
            root = %summary.root.display(),
            total = state.total,
            reported = entries.len(),
            skipped = summary.warnings.len(),
            "size aggregation complete"
        );

        Ok(SizeReport {
            root: summary.root,
            entries,
            total: state.total,
            dirs: summary.dirs,
            files: summary.files,
            warnings: summary.warnings,
            duration: start.elapsed(),
        })
    }
}

fn within_depth(config: &SizeConfig, depth: usize) -> bool {
    // Walker depth 1 is the root's direct children, i.e. nesting level 0.
    match usize::try_from(config.max_depth) {
        Ok(max_depth) => depth >= 1 && depth - 1 <= max_depth,
        Err(_) => false,
    }
}

fn dir_inclusion(config: &SizeConfig, name: &str, depth: usize, size: u64) -> Option<Inclusion> {
    if depth == 0 {
        None
    } else if within_depth(config, depth) {
        Some(Inclusion::Depth)
    } else if config.is_always_shown(name) {
        Some(Inclusion::AlwaysShow)
    } else if config.exceeds_large_threshold(size) {
        Some(Inclusion::Large)
    } else {
        None
    }
}

/// Per-run accumulators. `open` holds one running total per directory on
/// the current root-to-leaf chain.
struct AggregateState<'a> {
    config: &'a SizeConfig,
    open: Vec<u64>,
    entries: Vec<SizeEntry>,
    total: u64,
}

impl<'a> AggregateState<'a> {
    fn new(config: &'a SizeConfig) -> Self {
        Self {
            config,
            open: Vec::new(),
            entries: Vec::new(),
            total: 0,
        }
    }
}

impl Visitor for AggregateState<'_> {
    fn enter_dir(&mut self, _dir: &FsNode) {
        self.open.push(0);
    }

    fn visit_file(&mut self, file: &FsNode) {
        if let Some(parent) = self.open.last_mut() {
            *parent += file.len;
        }
        if within_depth(self.config, file.depth) {
            self.entries.push(SizeEntry {
                node: file.clone(),
                size: file.len,
                inclusion: Inclusion::Depth,
            });
        }
    }

    fn leave_dir(&mut self, dir: &FsNode) {
        let size = self.open.pop().unwrap_or(0);
        if dir.depth == 0 {
            self.total = size;
            return;
        }
        // Inclusion never changes what the parent receives.
        if let Some(parent) = self.open.last_mut() {
            *parent += size;
        }
        if let Some(inclusion) = dir_inclusion(self.config, &dir.name, dir.depth, size) {
            self.entries.push(SizeEntry {
                node: dir.clone(),
                size,
                inclusion,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(max_depth: i32) -> SizeConfig {
        SizeConfig::builder()
            .root("/unused")
            .max_depth(max_depth)
            .always_show(vec!["Library".to_string()])
            .show_large_threshold(Some(100u64))
            .build()
            .unwrap()
    }

    #[test]
    fn test_depth_rule_wins_first() {
        let config = config(0);
        assert_eq!(dir_inclusion(&config, "Library", 1, 1_000), Some(Inclusion::Depth));
        assert_eq!(dir_inclusion(&config, "Library", 2, 1_000), Some(Inclusion::AlwaysShow));
        assert_eq!(dir_inclusion(&config, "big", 2, 101), Some(Inclusion::Large));
        assert_eq!(dir_inclusion(&config, "big", 2, 100), None);
    }

    #[test]
    fn test_root_never_reported() {
        let config = config(5);
        assert_eq!(dir_inclusion(&config, "Library", 0, 1_000), None);
    }

    #[test]
    fn test_depth_boundary() {
        let config = config(1);
        assert!(within_depth(&config, 1));
        assert!(within_depth(&config, 2));
        assert!(!within_depth(&config, 3));
        assert!(!within_depth(&config, 0));
    }

    #[test]
    fn test_negative_depth_lists_nothing_by_depth() {
        let config = config(-1);
        assert!(!within_depth(&config, 1));
        assert_eq!(dir_inclusion(&config, "src", 1, 10), None);
        assert_eq!(dir_inclusion(&config, "Library", 1, 10), Some(Inclusion::AlwaysShow));
        assert_eq!(dir_inclusion(&config, "big", 1, 101), Some(Inclusion::Large));
    }
}
