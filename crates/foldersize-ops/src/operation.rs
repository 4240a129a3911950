//! Filesystem action types.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Suffix appended to an original file while it is moved aside during a replace.
pub const REPLACE_MARKER: &str = ".badfile";

/// A destructive action decided by the reconciler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FsAction {
    /// Remove a single file.
    Delete { target: PathBuf },
    /// Put `replacement` in place of `target`, discarding the old `target`.
    ///
    /// Executed as three steps: move `target` aside to its marker path, move
    /// `replacement` to `target`, then delete the marker path.
    Replace { target: PathBuf, replacement: PathBuf },
}

impl FsAction {
    /// Create a delete action.
    pub fn delete(target: impl Into<PathBuf>) -> Self {
        Self::Delete {
            target: target.into(),
        }
    }

    /// Create a replace action.
    pub fn replace(target: impl Into<PathBuf>, replacement: impl Into<PathBuf>) -> Self {
        Self::Replace {
            target: target.into(),
            replacement: replacement.into(),
        }
    }

    /// Paths this action removes or moves.
    pub fn paths(&self) -> Vec<&Path> {
        match self {
            Self::Delete { target } => vec![target.as_path()],
            Self::Replace {
                target,
                replacement,
            } => vec![target.as_path(), replacement.as_path()],
        }
    }
}

/// Path an original is moved to before it is deleted.
pub fn marker_path(target: &Path) -> PathBuf {
    let mut name = OsString::from(target.as_os_str());
    name.push(REPLACE_MARKER);
    PathBuf::from(name)
}

/// An error that occurred while executing an action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationError {
    /// The path that caused the error.
    pub path: PathBuf,
    /// A human-readable error message.
    pub message: String,
}

impl OperationError {
    /// Create a new operation error.
    pub fn new(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for OperationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.message)
    }
}

impl std::error::Error for OperationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_path() {
        let marker = marker_path(Path::new("/tmp/report.pdf"));
        assert_eq!(marker, PathBuf::from("/tmp/report.pdf.badfile"));
    }

    #[test]
    fn test_action_paths() {
        let action = FsAction::replace("/a/foo.txt", "/a/foo (1).txt");
        assert_eq!(action.paths().len(), 2);
        assert_eq!(FsAction::delete("/a/x").paths(), vec![Path::new("/a/x")]);
    }
}
