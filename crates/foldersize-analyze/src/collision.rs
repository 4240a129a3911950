//! Collision-suffix parsing and grouping.
//!
//! Sync clients resolve name clashes by creating `name (1).ext` next to
//! `name.ext`. Every entry is indexed under its own path; an entry that
//! carries such a suffix is also indexed under the path it would have had
//! without it, so an original and its copies end up in one group.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use foldersize_core::{FsNode, NodeKind};

/// One member of a collision group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CollisionMember {
    /// The entry sits at the group's key itself.
    Canonical(PathBuf),
    /// The entry is a suffixed copy of the group's key.
    Collision(PathBuf),
}

impl CollisionMember {
    /// Path of the member on disk.
    pub fn path(&self) -> &Path {
        match self {
            Self::Canonical(path) | Self::Collision(path) => path,
        }
    }

    /// Check if this is the canonical member.
    pub fn is_canonical(&self) -> bool {
        matches!(self, Self::Canonical(_))
    }
}

/// Split `stem` into its base and collision number if it ends in ` (N)`.
///
/// `N` must be a positive decimal number and the base must be non-empty.
pub fn strip_collision_suffix(stem: &str) -> Option<(&str, u32)> {
    let inner = stem.strip_suffix(')')?;
    let (base, digits) = inner.rsplit_once(" (")?;
    if base.is_empty() || digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    match digits.parse::<u32>() {
        Ok(n) if n > 0 => Some((base, n)),
        _ => None,
    }
}

/// Split a file name at its last dot. Leading-dot names have no extension.
fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(i) if i > 0 => name.split_at(i),
        _ => (name, ""),
    }
}

/// Split an entry name into its unsuffixed name and collision number.
fn parse_collision(name: &str, kind: NodeKind) -> Option<(String, u32)> {
    match kind {
        NodeKind::File => {
            let (stem, extension) = split_extension(name);
            strip_collision_suffix(stem).map(|(base, n)| (format!("{base}{extension}"), n))
        }
        NodeKind::Directory => strip_collision_suffix(name).map(|(base, n)| (base.to_string(), n)),
    }
}

/// Name an entry would have without its collision suffix.
pub fn canonical_name(name: &str, kind: NodeKind) -> Option<String> {
    parse_collision(name, kind).map(|(base, _)| base)
}

/// The `N` of an entry's ` (N)` suffix, if it has one.
pub fn collision_number(name: &str, kind: NodeKind) -> Option<u32> {
    parse_collision(name, kind).map(|(_, n)| n)
}

/// Canonical key of a suffixed entry, or `None` if it carries no suffix.
pub fn canonical_key(node: &FsNode) -> Option<PathBuf> {
    let name = canonical_name(&node.name, node.kind)?;
    Some(match node.path.parent() {
        Some(parent) => parent.join(name),
        None => PathBuf::from(name),
    })
}

/// Members per canonical key, files and folders kept apart.
#[derive(Debug, Clone, Default)]
pub struct CollisionIndex {
    /// File groups in discovery order.
    pub files: IndexMap<PathBuf, Vec<CollisionMember>>,
    /// Folder groups in discovery order.
    pub folders: IndexMap<PathBuf, Vec<CollisionMember>>,
}

impl CollisionIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Index one entry under its own path and, if suffixed, its canonical key.
    pub fn record(&mut self, node: &FsNode) {
        let groups = match node.kind {
            NodeKind::File => &mut self.files,
            NodeKind::Directory => &mut self.folders,
        };

        if let Some(key) = canonical_key(node) {
            groups
                .entry(key)
                .or_default()
                .push(CollisionMember::Collision(node.path.clone()));
        }
        groups
            .entry(node.path.clone())
            .or_default()
            .push(CollisionMember::Canonical(node.path.clone()));
    }
}
