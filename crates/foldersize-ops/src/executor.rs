//! Synchronous execution of filesystem actions.

use std::fs;

use tracing::{error, info};

use crate::operation::{FsAction, OperationError, marker_path};

/// Apply `action` to the filesystem.
pub fn execute(action: &FsAction) -> Result<(), OperationError> {
    match action {
        FsAction::Delete { target } => {
            fs::remove_file(target)
                .map_err(|e| OperationError::new(target, format!("Delete failed: {e}")))?;
            info!(path = %target.display(), "deleted");
            Ok(())
        }
        FsAction::Replace {
            target,
            replacement,
        } => {
            let marker = marker_path(target);
            if fs::symlink_metadata(&marker).is_ok() {
                return Err(OperationError::new(
                    &marker,
                    "Marker path already exists, nothing was changed",
                ));
            }

            // Original sits at its marker path until the rename succeeds.
            fs::rename(target, &marker)
                .map_err(|e| OperationError::new(target, format!("Move aside failed: {e}")))?;

            if let Err(e) = fs::rename(replacement, target) {
                if let Err(restore) = fs::rename(&marker, target) {
                    error!(
                        path = %marker.display(),
                        error = %restore,
                        "could not restore original after failed replace"
                    );
                }
                return Err(OperationError::new(
                    replacement,
                    format!("Rename failed: {e}"),
                ));
            }

            fs::remove_file(&marker)
                .map_err(|e| OperationError::new(&marker, format!("Delete failed: {e}")))?;
            info!(
                target = %target.display(),
                replacement = %replacement.display(),
                "replaced"
            );
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_delete() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("empty (1).txt");
        fs::write(&path, "").unwrap();

        execute(&FsAction::delete(&path)).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_replace_keeps_existing_marker() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("foo.txt");
        let replacement = temp.path().join("foo (1).txt");
        let marker = temp.path().join("foo.txt.badfile");
        fs::write(&target, "").unwrap();
        fs::write(&replacement, "copydata").unwrap();
        fs::write(&marker, "USER DATA").unwrap();

        let err = execute(&FsAction::replace(&target, &replacement)).unwrap_err();

        assert_eq!(err.path, marker);
        assert_eq!(fs::read_to_string(&marker).unwrap(), "USER DATA");
        assert_eq!(fs::read_to_string(&target).unwrap(), "");
        assert_eq!(fs::read_to_string(&replacement).unwrap(), "copydata");
    }

    #[test]
    fn test_replace() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("foo.txt");
        let replacement = temp.path().join("foo (1).txt");
        fs::write(&target, "").unwrap();
        fs::write(&replacement, "0123456789").unwrap();

        execute(&FsAction::replace(&target, &replacement)).unwrap();

        assert_eq!(fs::read_to_string(&target).unwrap(), "0123456789");
        assert!(!replacement.exists());
        assert!(!marker_path(&target).exists());
    }

    #[test]
    fn test_replace_restores_original_on_failure() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("foo.txt");
        fs::write(&target, "").unwrap();

        let err = execute(&FsAction::replace(&target, temp.path().join("missing (1).txt")))
            .unwrap_err();

        assert!(err.message.contains("Rename failed"));
        assert!(target.exists());
        assert!(!marker_path(&target).exists());
    }

    #[test]
    fn test_delete_missing_file() {
        let temp = TempDir::new().unwrap();
        let err = execute(&FsAction::delete(temp.path().join("nope"))).unwrap_err();
        assert!(err.to_string().contains("Delete failed"));
    }
}
