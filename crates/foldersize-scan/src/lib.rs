//! Tree walking and folder size aggregation for foldersize.
//!
//! # Overview
//!
//! - [`TreeWalker`] descends a directory tree on a single thread using jwalk
//!   and reports directories post-order, so callers building bottom-up
//!   aggregates always see children before parents. Unreadable subtrees are
//!   logged, recorded as warnings and counted as empty.
//! - [`SizeAggregator`] sums file lengths per directory and picks the
//!   entries worth reporting: everything within `max_depth`, directories on
//!   the always-show list, and directories above a size threshold.
//!
//! # Example
//!
//! ```rust,no_run
//! use foldersize_scan::{SizeAggregator, SizeConfig};
//!
//! let config = SizeConfig::builder()
//!     .root("/path/to/scan")
//!     .max_depth(1)
//!     .always_show(vec!["node_modules".to_string()])
//!     .build()
//!     .unwrap();
//!
//! let report = SizeAggregator::new(config).aggregate().unwrap();
//! for line in report.lines(false) {
//!     println!("{line}");
//! }
//! ```

mod aggregate;
mod walker;

pub use aggregate::{Inclusion, SizeAggregator, SizeEntry, SizeReport};
pub use walker::{FnVisitor, TreeWalker, Visitor, WalkSummary};

// Re-export core types for convenience
pub use foldersize_core::{
    FsNode, NodeKind, ScanError, ScanWarning, SizeConfig, WarningKind, format_size,
};
