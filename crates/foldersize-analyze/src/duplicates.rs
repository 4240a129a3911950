//! Duplicate subtree detection using structural hashing.
//!
//! A directory's hash folds its subdirectory hashes, then the hashes of its
//! file names, into a polynomial accumulator (`hash * 7 + child`). File
//! contents are never read. Equal hashes only mark *candidates*: unrelated
//! trees can collide, so every group needs a manual look before anything
//! is removed.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use derive_builder::Builder;
use globset::{Glob, GlobSet, GlobSetBuilder};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use foldersize_core::{FsNode, ScanError, ScanWarning, StructuralHash};
use foldersize_scan::{TreeWalker, Visitor};

/// Multiplier of the polynomial accumulator.
const HASH_MULTIPLIER: u64 = 7;

/// Starting value of every directory accumulator. Non-zero so that an empty
/// subdirectory still changes its parent's hash.
const HASH_SEED: u64 = 1;

/// Directory names skipped by default: version control, IDE and build
/// caches, and package caches.
pub const DEFAULT_EXCLUDED_NAMES: [&str; 5] = [".git", "Library", ".vs", "Temp", "node_modules"];

/// Configuration for duplicate subtree detection.
#[derive(Debug, Clone, Builder)]
#[builder(setter(into))]
pub struct DuplicateTreeConfig {
    /// Glob patterns matched against a directory's own name. Matching
    /// directories are neither visited nor hashed.
    #[builder(default = "Self::default_excluded()")]
    pub exclude_names: Vec<String>,

    /// Whether to list the first member's children for each group.
    #[builder(default = "true")]
    pub list_first_member: bool,
}

impl DuplicateTreeConfigBuilder {
    fn default_excluded() -> Vec<String> {
        DEFAULT_EXCLUDED_NAMES.iter().map(|s| s.to_string()).collect()
    }
}

impl Default for DuplicateTreeConfig {
    fn default() -> Self {
        Self {
            exclude_names: DuplicateTreeConfigBuilder::default_excluded(),
            list_first_member: true,
        }
    }
}

impl DuplicateTreeConfig {
    /// Create a new config builder.
    pub fn builder() -> DuplicateTreeConfigBuilder {
        DuplicateTreeConfigBuilder::default()
    }

    fn exclusion_set(&self) -> Result<GlobSet, ScanError> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &self.exclude_names {
            let glob = Glob::new(pattern).map_err(|e| {
                ScanError::invalid_config(format!("bad exclude pattern '{pattern}': {e}"))
            })?;
            builder.add(glob);
        }
        builder
            .build()
            .map_err(|e| ScanError::invalid_config(e.to_string()))
    }
}

/// Directories sharing one structural hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicateTreeGroup {
    /// Hash shared by every member.
    pub hash: StructuralHash,
    /// Member directories in discovery order.
    pub paths: Vec<PathBuf>,
    /// Immediate children of the first member, subdirectories first.
    pub first_member_children: Vec<PathBuf>,
}

impl DuplicateTreeGroup {
    /// Get the number of directories in the group.
    pub fn count(&self) -> usize {
        self.paths.len()
    }
}

/// Results from a duplicate subtree search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicateTreeReport {
    /// Canonical root that was walked.
    pub root: PathBuf,
    /// Every directory hashed, keyed by hash, in discovery order.
    #[serde(skip)]
    pub hashes: IndexMap<StructuralHash, Vec<PathBuf>>,
    /// Hashes shared by more than one directory.
    pub groups: Vec<DuplicateTreeGroup>,
    /// Number of directories hashed.
    pub dirs_hashed: u64,
    /// Subtrees that could not be read.
    pub warnings: Vec<ScanWarning>,
}

impl DuplicateTreeReport {
    /// Check if any candidate duplicates were found.
    pub fn has_duplicates(&self) -> bool {
        !self.groups.is_empty()
    }

    /// Render the grouped listing, one line per entry.
    pub fn lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        for group in &self.groups {
            lines.push("Files:".to_string());
            for child in &group.first_member_children {
                lines.push(format!("    {}", child.display()));
            }
            lines.push("Dir:".to_string());
            for path in &group.paths {
                lines.push(format!("    {}", path.display()));
            }
            lines.push(String::new());
            lines.push(String::new());
        }
        lines
    }
}

/// Duplicate subtree finder.
pub struct DuplicateTreeFinder {
    config: DuplicateTreeConfig,
}

impl DuplicateTreeFinder {
    /// Create a finder with the default exclusions.
    pub fn new() -> Self {
        Self {
            config: DuplicateTreeConfig::default(),
        }
    }

    /// Create a finder with custom config.
    pub fn with_config(config: DuplicateTreeConfig) -> Self {
        Self { config }
    }

    /// Hash every directory under `root` and group equal hashes.
    pub fn find_duplicates(&self, root: &Path) -> Result<DuplicateTreeReport, ScanError> {
        let start = Instant::now();
        let excluded = self.config.exclusion_set()?;
        let walker = TreeWalker::new().sort_by_name(true).skip_dirs(excluded);

        let mut state = HashState::default();
        let root_name = root
            .canonicalize()
            .map_err(|e| ScanError::io(root, e))?
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        let summary = if walker.is_skipped(&root_name) {
            debug!(root = %root.display(), "root itself is excluded");
            foldersize_scan::WalkSummary {
                root: root.to_path_buf(),
                ..Default::default()
            }
        } else {
            walker.walk(root, &mut state)?
        };

        let groups: Vec<DuplicateTreeGroup> = state
            .hashes
            .iter()
            .filter(|(_, paths)| paths.len() > 1)
            .map(|(hash, paths)| DuplicateTreeGroup {
                hash: *hash,
                paths: paths.clone(),
                first_member_children: if self.config.list_first_member {
                    list_children(&paths[0])
                } else {
                    Vec::new()
                },
            })
            .collect();

        info!(
            root = %summary.root.display(),
            dirs = state.dirs_hashed,
            groups = groups.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "duplicate subtree search complete"
        );

        Ok(DuplicateTreeReport {
            root: summary.root,
            hashes: state.hashes,
            groups,
            dirs_hashed: state.dirs_hashed,
            warnings: summary.warnings,
        })
    }
}

impl Default for DuplicateTreeFinder {
    fn default() -> Self {
        Self::new()
    }
}

/// Hash a file name. Stable across runs and platforms.
pub fn name_hash(name: &str) -> u64 {
    let digest = blake3::hash(name.as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest.as_bytes()[..8]);
    u64::from_le_bytes(bytes)
}

/// Fold child hashes into a directory hash: subdirectories first, then files.
pub fn combine(subdirs: &[u64], files: &[u64]) -> StructuralHash {
    let hash = subdirs
        .iter()
        .chain(files)
        .fold(HASH_SEED, |acc, child| {
            acc.wrapping_mul(HASH_MULTIPLIER).wrapping_add(*child)
        });
    StructuralHash::new(hash)
}

/// Children of one open directory.
#[derive(Default)]
struct PendingDir {
    subdirs: Vec<u64>,
    files: Vec<u64>,
}

#[derive(Default)]
struct HashState {
    open: Vec<PendingDir>,
    hashes: IndexMap<StructuralHash, Vec<PathBuf>>,
    dirs_hashed: u64,
    /// Directories whose children could not be listed.
    unreadable: HashSet<PathBuf>,
}

impl Visitor for HashState {
    fn enter_dir(&mut self, _dir: &FsNode) {
        self.open.push(PendingDir::default());
    }

    fn visit_file(&mut self, file: &FsNode) {
        if let Some(parent) = self.open.last_mut() {
            parent.files.push(name_hash(&file.name));
        }
    }

    fn read_failed(&mut self, warning: &ScanWarning) {
        self.unreadable.insert(warning.path.clone());
    }

    fn leave_dir(&mut self, dir: &FsNode) {
        let pending = self.open.pop().unwrap_or_default();

        // Unreadable directories are never grouped and add 0 to the parent.
        if self.unreadable.remove(&dir.path) {
            debug!(path = %dir.path.display(), "not hashing unreadable directory");
            if let Some(parent) = self.open.last_mut() {
                parent.subdirs.push(0);
            }
            return;
        }

        let hash = combine(&pending.subdirs, &pending.files);
        debug!(path = %dir.path.display(), hash = %hash.to_hex(), "hashed directory");

        if let Some(parent) = self.open.last_mut() {
            parent.subdirs.push(hash.0);
        }
        self.hashes.entry(hash).or_default().push(dir.path.clone());
        self.dirs_hashed += 1;
    }
}

/// List a directory's subdirectories, then its files, each sorted by name.
fn list_children(dir: &Path) -> Vec<PathBuf> {
    let Ok(read_dir) = fs::read_dir(dir) else {
        return Vec::new();
    };

    let (mut dirs, mut files): (Vec<PathBuf>, Vec<PathBuf>) = read_dir
        .filter_map(Result::ok)
        .map(|e| e.path())
        .partition(|p| p.is_dir());
    dirs.sort();
    files.sort();
    dirs.extend(files);
    dirs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_hash_is_stable() {
        assert_eq!(name_hash("a.txt"), name_hash("a.txt"));
        assert_ne!(name_hash("a.txt"), name_hash("b.txt"));
    }

    #[test]
    fn test_combine_is_order_sensitive() {
        let a = name_hash("a");
        let b = name_hash("b");
        assert_ne!(combine(&[], &[a, b]), combine(&[], &[b, a]));
    }

    #[test]
    fn test_empty_subdir_changes_hash() {
        let file = name_hash("readme.md");
        let empty = combine(&[], &[]).0;
        assert_ne!(combine(&[], &[file]), combine(&[empty], &[file]));
    }

    #[test]
    fn test_unreadable_dir_is_not_grouped() {
        let mut state = HashState::default();
        let root = FsNode::new_directory("/r", 0);
        let locked = FsNode::new_directory("/r/locked", 1);
        let empty = FsNode::new_directory("/r/empty", 1);

        state.enter_dir(&root);
        state.enter_dir(&locked);
        state.read_failed(&ScanWarning::permission_denied("/r/locked"));
        state.leave_dir(&locked);
        state.enter_dir(&empty);
        state.leave_dir(&empty);
        state.leave_dir(&root);

        let all: Vec<&PathBuf> = state.hashes.values().flatten().collect();
        assert!(!all.contains(&&PathBuf::from("/r/locked")));
        assert_eq!(state.hashes[&combine(&[], &[])], vec![PathBuf::from("/r/empty")]);
        assert_eq!(state.dirs_hashed, 2);

        let empty_hash = combine(&[], &[]).0;
        let root_hash = combine(&[0, empty_hash], &[]);
        assert_eq!(state.hashes[&root_hash], vec![PathBuf::from("/r")]);
    }

    #[test]
    fn test_default_exclusions() {
        let config = DuplicateTreeConfig::default();
        let set = config.exclusion_set().unwrap();
        assert!(set.is_match("node_modules"));
        assert!(set.is_match(".git"));
        assert!(!set.is_match("src"));
    }

    #[test]
    fn test_bad_pattern_is_config_error() {
        let config = DuplicateTreeConfig::builder()
            .exclude_names(vec!["[".to_string()])
            .build()
            .unwrap();
        assert!(matches!(
            config.exclusion_set(),
            Err(ScanError::InvalidConfig { .. })
        ));
    }
}
