//! Duplicate subtree detection and sync-collision reconciliation.
//!
//! - **Duplicate subtrees** - [`DuplicateTreeFinder`] hashes every directory
//!   from its children's names and groups directories with equal hashes.
//!   Groups are candidates only and need a manual check.
//! - **Collision reconciliation** - [`Reconciler`] pairs `name (N).ext`
//!   copies created by a sync client with their originals and cleans up the
//!   unambiguous cases.
//!
//! # Duplicate Subtrees
//!
//! ```rust,no_run
//! use std::path::Path;
//! use foldersize_analyze::DuplicateTreeFinder;
//!
//! let report = DuplicateTreeFinder::new()
//!     .find_duplicates(Path::new("/path/to/scan"))
//!     .unwrap();
//!
//! for group in &report.groups {
//!     println!("{} directories share {}", group.count(), group.hash.to_hex());
//! }
//! ```
//!
//! # Collision Reconciliation
//!
//! ```rust,no_run
//! use std::path::Path;
//! use foldersize_analyze::{ReconcileConfig, Reconciler};
//!
//! let config = ReconcileConfig::builder().dry_run(true).build().unwrap();
//! let report = Reconciler::with_config(config)
//!     .reconcile(Path::new("/path/to/drive"))
//!     .unwrap();
//!
//! for line in &report.lines {
//!     println!("{}", line.text);
//! }
//! ```

pub mod collision;
mod duplicates;
mod reconcile;

pub use collision::{CollisionIndex, CollisionMember, canonical_key, collision_number};
pub use duplicates::{
    DEFAULT_EXCLUDED_NAMES, DuplicateTreeConfig, DuplicateTreeConfigBuilder, DuplicateTreeFinder,
    DuplicateTreeGroup, DuplicateTreeReport, combine, name_hash,
};
pub use reconcile::{
    ActionOutcome, FlaggedGroup, GroupOutcome, LineLevel, ReconcileConfig, ReconcileConfigBuilder,
    ReconcileReport, Reconciler, ReportLine, Resolution,
};

// Re-export core types
pub use foldersize_core::{NodeKind, ScanError, StructuralHash};
pub use foldersize_ops::FsAction;
