//! Destructive file operations for foldersize.
//!
//! The reconciler decides *what* should happen to a collision pair; this
//! crate carries those decisions out. Every action is synchronous and
//! touches only the paths it names.

mod compare;
mod executor;
mod operation;

pub use compare::files_equal;
pub use executor::execute;
pub use operation::{FsAction, OperationError, REPLACE_MARKER, marker_path};
