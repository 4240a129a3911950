//! Filesystem entry types shared by every engine.

use std::path::{Path, PathBuf};

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// Structural hash of a directory, combined from its children.
///
/// Equal hashes mark *candidate* duplicates only. The accumulator is a
/// single 64-bit integer, so unrelated trees can collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StructuralHash(pub u64);

impl StructuralHash {
    /// Create a new hash from a raw value.
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// Get the hash as a zero-padded hex string.
    pub fn to_hex(&self) -> String {
        format!("{:016x}", self.0)
    }
}

/// Type of filesystem node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    /// Regular file.
    File,
    /// Directory.
    Directory,
}

impl NodeKind {
    /// Check if this is a directory.
    pub fn is_dir(&self) -> bool {
        matches!(self, NodeKind::Directory)
    }

    /// Check if this is a regular file.
    pub fn is_file(&self) -> bool {
        matches!(self, NodeKind::File)
    }
}

/// A single file or directory discovered by a walk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FsNode {
    /// Full path of the entry.
    pub path: PathBuf,

    /// File/directory name (not full path).
    pub name: CompactString,

    /// Whether this is a file or a directory.
    pub kind: NodeKind,

    /// Byte length for files. Always 0 for directories, whose size is only
    /// known once aggregated.
    pub len: u64,

    /// Nesting depth below the walk root (the root itself is 0).
    pub depth: usize,
}

impl FsNode {
    /// Create a new file node.
    pub fn new_file(path: impl Into<PathBuf>, len: u64, depth: usize) -> Self {
        let path = path.into();
        Self {
            name: name_of(&path),
            path,
            kind: NodeKind::File,
            len,
            depth,
        }
    }

    /// Create a new directory node.
    pub fn new_directory(path: impl Into<PathBuf>, depth: usize) -> Self {
        let path = path.into();
        Self {
            name: name_of(&path),
            path,
            kind: NodeKind::Directory,
            len: 0,
            depth,
        }
    }

    /// Check if this node is a directory.
    pub fn is_dir(&self) -> bool {
        self.kind.is_dir()
    }

    /// Check if this node is a file.
    pub fn is_file(&self) -> bool {
        self.kind.is_file()
    }

    /// Name used in reports: the bare name or the full path, with a trailing
    /// separator for directories.
    pub fn display_name(&self, full_path: bool) -> String {
        let mut name = if full_path {
            self.path.display().to_string()
        } else {
            self.name.to_string()
        };
        if self.is_dir() {
            name.push(std::path::MAIN_SEPARATOR);
        }
        name
    }
}

fn name_of(path: &Path) -> CompactString {
    path.file_name()
        .map(|n| CompactString::new(n.to_string_lossy()))
        .unwrap_or_else(|| CompactString::new(path.to_string_lossy()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structural_hash_hex() {
        let hash = StructuralHash::new(0xab);
        assert_eq!(hash.to_hex().len(), 16);
        assert!(hash.to_hex().ends_with("ab"));
    }

    #[test]
    fn test_file_node_creation() {
        let node = FsNode::new_file("/data/test.txt", 1024, 1);
        assert!(node.is_file());
        assert!(!node.is_dir());
        assert_eq!(node.name.as_str(), "test.txt");
        assert_eq!(node.len, 1024);
    }

    #[test]
    fn test_display_name() {
        let dir = FsNode::new_directory("/data/photos", 1);
        let sep = std::path::MAIN_SEPARATOR;
        assert_eq!(dir.display_name(false), format!("photos{sep}"));
        assert_eq!(dir.display_name(true), format!("/data/photos{sep}"));

        let file = FsNode::new_file("/data/a.bin", 3, 1);
        assert_eq!(file.display_name(false), "a.bin");
    }
}
