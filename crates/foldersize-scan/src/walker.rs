//! Serial, post-order directory walker built on jwalk.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use globset::GlobSet;
use jwalk::{Parallelism, WalkDir};
use tracing::{debug, warn};

use foldersize_core::{FsNode, ScanError, ScanWarning};

/// Callbacks fired while walking a tree.
///
/// Directories are reported post-order: `leave_dir` fires only after every
/// descendant has been visited. The root itself is reported with depth 0.
pub trait Visitor {
    /// Called before any child of `dir` is visited.
    fn enter_dir(&mut self, _dir: &FsNode) {}

    /// Called once per regular file.
    fn visit_file(&mut self, file: &FsNode);

    /// Called once per directory, after its whole subtree.
    fn leave_dir(&mut self, dir: &FsNode);

    /// Called when part of the tree could not be read. That subtree
    /// contributes nothing further to the walk.
    fn read_failed(&mut self, _warning: &ScanWarning) {}
}

/// Adapter turning a pair of closures into a [`Visitor`].
pub struct FnVisitor<D, F> {
    on_dir: D,
    on_file: F,
}

impl<D, F> FnVisitor<D, F>
where
    D: FnMut(&FsNode),
    F: FnMut(&FsNode),
{
    /// Wrap an on-directory and an on-file callback.
    pub fn new(on_dir: D, on_file: F) -> Self {
        Self { on_dir, on_file }
    }
}

impl<D, F> Visitor for FnVisitor<D, F>
where
    D: FnMut(&FsNode),
    F: FnMut(&FsNode),
{
    fn visit_file(&mut self, file: &FsNode) {
        (self.on_file)(file);
    }

    fn leave_dir(&mut self, dir: &FsNode) {
        (self.on_dir)(dir);
    }
}

/// Counters and warnings from a finished walk.
#[derive(Debug, Clone, Default)]
pub struct WalkSummary {
    /// Canonical root path that was walked.
    pub root: PathBuf,
    /// Directories visited, including the root.
    pub dirs: u64,
    /// Files visited.
    pub files: u64,
    /// Subtrees that could not be read.
    pub warnings: Vec<ScanWarning>,
}

/// Single-threaded tree walker.
///
/// jwalk yields entries depth-first, parents before children. The walker
/// keeps the chain of open directories on an explicit stack and closes them
/// as soon as an entry at the same or a shallower depth arrives, which turns
/// that stream into post-order directory events without native recursion.
#[derive(Debug, Clone, Default)]
pub struct TreeWalker {
    sort_by_name: bool,
    skip_dirs: Option<GlobSet>,
}

impl TreeWalker {
    /// Create a walker using filesystem enumeration order.
    pub fn new() -> Self {
        Self::default()
    }

    /// Visit siblings in name order instead of enumeration order.
    pub fn sort_by_name(mut self, sort: bool) -> Self {
        self.sort_by_name = sort;
        self
    }

    /// Never descend into (or report) directories whose name matches.
    pub fn skip_dirs(mut self, names: GlobSet) -> Self {
        self.skip_dirs = Some(names);
        self
    }

    /// Check whether a directory name is pruned by this walker.
    pub fn is_skipped(&self, name: &str) -> bool {
        self.skip_dirs
            .as_ref()
            .is_some_and(|set| set.is_match(Path::new(name)))
    }

    /// Walk `root`, calling `on_dir` post-order and `on_file` per file.
    pub fn walk_with<D, F>(&self, root: &Path, on_dir: D, on_file: F) -> Result<WalkSummary, ScanError>
    where
        D: FnMut(&FsNode),
        F: FnMut(&FsNode),
    {
        self.walk(root, &mut FnVisitor::new(on_dir, on_file))
    }

    /// Walk `root` and feed every entry to `visitor`.
    ///
    /// Fails only when the root itself is unusable. Unreadable subtrees are
    /// reported through [`Visitor::read_failed`] and the summary.
    pub fn walk<V: Visitor + ?Sized>(&self, root: &Path, visitor: &mut V) -> Result<WalkSummary, ScanError> {
        let root_path = root.canonicalize().map_err(|e| ScanError::io(root, e))?;
        if !root_path.is_dir() {
            return Err(ScanError::NotADirectory { path: root_path });
        }

        let mut walker = WalkDir::new(&root_path)
            .parallelism(Parallelism::Serial)
            .skip_hidden(false)
            .follow_links(false)
            .sort(self.sort_by_name)
            .min_depth(0);

        if let Some(skip) = self.skip_dirs.clone() {
            walker = walker.process_read_dir(move |_depth, _path, _state, children| {
                children.retain(|child| match child {
                    Ok(entry) => {
                        !(entry.file_type().is_dir() && skip.is_match(Path::new(entry.file_name())))
                    }
                    Err(_) => true,
                });
            });
        }

        let mut summary = WalkSummary {
            root: root_path.clone(),
            ..WalkSummary::default()
        };
        let mut warned: HashSet<PathBuf> = HashSet::new();
        let mut open: Vec<FsNode> = Vec::new();

        for entry_result in walker {
            let entry = match entry_result {
                Ok(e) => e,
                Err(err) => {
                    let path = err.path().map(Path::to_path_buf).unwrap_or_default();
                    let warning = match err.io_error() {
                        Some(io) => ScanWarning::read_error(&path, io),
                        None => ScanWarning::new(
                            &path,
                            err.to_string(),
                            foldersize_core::WarningKind::ReadError,
                        ),
                    };
                    record_warning(&mut summary, &mut warned, visitor, warning);
                    continue;
                }
            };

            let depth = entry.depth();
            close_until(&mut open, depth, visitor);

            let path = entry.path();
            let file_type = entry.file_type();

            if file_type.is_dir() {
                let node = FsNode::new_directory(&path, depth);
                debug!(path = %path.display(), depth, "enter directory");
                visitor.enter_dir(&node);
                summary.dirs += 1;
                open.push(node);

                if let Some(err) = entry.read_children_error.as_ref() {
                    let warning = match err.io_error() {
                        Some(io) => ScanWarning::read_error(&path, io),
                        None => ScanWarning::new(
                            &path,
                            err.to_string(),
                            foldersize_core::WarningKind::ReadError,
                        ),
                    };
                    record_warning(&mut summary, &mut warned, visitor, warning);
                }
            } else if file_type.is_file() {
                let len = match entry.metadata() {
                    Ok(m) => m.len(),
                    Err(err) => {
                        let warning = match err.io_error() {
                            Some(io) => ScanWarning::metadata_error(&path, io),
                            None => ScanWarning::new(
                                &path,
                                err.to_string(),
                                foldersize_core::WarningKind::MetadataError,
                            ),
                        };
                        record_warning(&mut summary, &mut warned, visitor, warning);
                        continue;
                    }
                };
                visitor.visit_file(&FsNode::new_file(path, len, depth));
                summary.files += 1;
            } else {
                debug!(path = %path.display(), "skipping non-regular entry");
            }
        }

        close_until(&mut open, 0, visitor);

        Ok(summary)
    }
}

/// Close every open directory at `depth` or deeper.
fn close_until<V: Visitor + ?Sized>(open: &mut Vec<FsNode>, depth: usize, visitor: &mut V) {
    while open.last().is_some_and(|dir| dir.depth >= depth) {
        if let Some(dir) = open.pop() {
            visitor.leave_dir(&dir);
        }
    }
}

fn record_warning<V: Visitor + ?Sized>(
    summary: &mut WalkSummary,
    warned: &mut HashSet<PathBuf>,
    visitor: &mut V,
    warning: ScanWarning,
) {
    if !warned.insert(warning.path.clone()) {
        return;
    }
    warn!(path = %warning.path.display(), kind = ?warning.kind, "{}", warning.message);
    visitor.read_failed(&warning);
    summary.warnings.push(warning);
}
