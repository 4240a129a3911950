//! Core types and configuration for foldersize.
//!
//! This crate provides the data structures shared by the size aggregator,
//! the duplicate subtree finder and the collision reconciler: filesystem
//! nodes, structural hashes, the size report configuration, error types and
//! byte size formatting.

mod config;
mod error;
pub mod format;
mod node;

pub use config::{SizeConfig, SizeConfigBuilder};
pub use error::{ScanError, ScanWarning, WarningKind};
pub use format::format_size;
pub use node::{FsNode, NodeKind, StructuralHash};
