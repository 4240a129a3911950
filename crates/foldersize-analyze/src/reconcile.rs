//! Reconciliation of sync-client collision copies.
//!
//! After a walk has grouped every `name (N)` copy with its original, each
//! two-member group gets exactly one decision. Only two outcomes touch the
//! disk: an empty copy next to a non-empty original is deleted, and a
//! non-empty copy replaces an empty original. Everything else is reported
//! and left alone, and dry runs log the same decisions without acting.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use foldersize_core::{FsNode, NodeKind, ScanError, ScanWarning};
use foldersize_ops::{FsAction, OperationError, execute, files_equal};
use foldersize_scan::{TreeWalker, Visitor};

use crate::collision::{CollisionIndex, CollisionMember, collision_number};

/// Configuration for a reconciliation run.
#[derive(Debug, Clone, Builder)]
#[builder(setter(into))]
pub struct ReconcileConfig {
    /// Decide and log, but never touch the filesystem.
    #[builder(default = "true")]
    pub dry_run: bool,

    /// Absolute paths skipped together with everything below them.
    #[builder(default)]
    pub exclusions: HashSet<PathBuf>,

    /// Byte-compare pairs where both members are non-empty.
    #[builder(default = "true")]
    pub compare_contents: bool,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            dry_run: true,
            exclusions: HashSet::new(),
            compare_contents: true,
        }
    }
}

impl ReconcileConfig {
    /// Create a new config builder.
    pub fn builder() -> ReconcileConfigBuilder {
        ReconcileConfigBuilder::default()
    }

    /// Read a newline-delimited exclusions file. Blank lines are ignored.
    pub fn load_exclusions(path: &Path) -> io::Result<HashSet<PathBuf>> {
        let contents = fs::read_to_string(path)?;
        Ok(contents
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(PathBuf::from)
            .collect())
    }

    /// Check if a path is excluded, directly or through an ancestor.
    pub fn is_excluded(&self, path: &Path) -> bool {
        !self.exclusions.is_empty() && path.ancestors().any(|p| self.exclusions.contains(p))
    }
}

/// Decision taken for a two-member group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Resolution {
    /// The copy is empty and the original is not: delete the copy.
    DeleteCopy { copy: PathBuf, copy_len: u64 },
    /// The original is empty and the copy is not: move the copy over it.
    ReplaceOriginal {
        original: PathBuf,
        original_len: u64,
        copy: PathBuf,
        copy_len: u64,
    },
    /// Both members hold data. `same_content` is `None` when not compared.
    BothNonEmpty { same_content: Option<bool> },
    /// Both members are empty.
    BothEmpty,
    /// Two canonical members share a key.
    BothCanonical,
    /// Two copies share a key with no original present.
    NoCanonical,
    /// The copy carries a suffix other than ` (1)`, e.g. `Report (2019).pdf`.
    /// Never resolved automatically.
    NotFirstCopy { copy: PathBuf, number: u32 },
    /// A folder and its copy; folders are never changed automatically.
    FolderPair { original: PathBuf, copy: PathBuf },
    /// A member could not be inspected.
    Unreadable { path: PathBuf, message: String },
}

impl Resolution {
    /// Filesystem action implied by this decision, if any.
    pub fn action(&self) -> Option<FsAction> {
        match self {
            Self::DeleteCopy { copy, .. } => Some(FsAction::delete(copy)),
            Self::ReplaceOriginal { original, copy, .. } => {
                Some(FsAction::replace(original, copy))
            }
            _ => None,
        }
    }

    /// Check if this decision needs a human to look at it.
    pub fn is_conflict(&self) -> bool {
        self.action().is_none() && !matches!(self, Self::FolderPair { .. })
    }
}

/// What happened to a group's action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ActionOutcome {
    /// No action was implied.
    None,
    /// Dry run: the action was only logged.
    Planned,
    /// The action was carried out.
    Applied,
    /// The action failed part-way.
    Failed(OperationError),
}

/// A two-member group and its decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupOutcome {
    /// Canonical key of the group.
    pub key: PathBuf,
    /// Whether the members are files or folders.
    pub kind: NodeKind,
    /// The two members.
    pub members: Vec<CollisionMember>,
    /// Decision for the pair.
    pub resolution: Resolution,
    /// Result of carrying the decision out.
    pub outcome: ActionOutcome,
}

/// A group with more than two members. Never resolved automatically.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlaggedGroup {
    /// Canonical key of the group.
    pub key: PathBuf,
    /// Whether the members are files or folders.
    pub kind: NodeKind,
    /// Every member seen.
    pub members: Vec<CollisionMember>,
}

/// Severity of a report line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineLevel {
    /// Plain progress or action line.
    Info,
    /// Ambiguous state or failure.
    Error,
    /// Group needing manual handling.
    Flag,
}

/// One line of the reconciliation log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportLine {
    /// Severity.
    pub level: LineLevel,
    /// Text, without any severity prefix.
    pub text: String,
}

impl ReportLine {
    fn info(text: impl Into<String>) -> Self {
        Self {
            level: LineLevel::Info,
            text: text.into(),
        }
    }

    fn error(text: impl Into<String>) -> Self {
        Self {
            level: LineLevel::Error,
            text: text.into(),
        }
    }

    fn flag(text: impl Into<String>) -> Self {
        Self {
            level: LineLevel::Flag,
            text: text.into(),
        }
    }
}

/// Results from a reconciliation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcileReport {
    /// Canonical root that was walked.
    pub root: PathBuf,
    /// Whether mutations were suppressed.
    pub dry_run: bool,
    /// Two-member groups, files before folders.
    pub groups: Vec<GroupOutcome>,
    /// Groups with more than two members.
    pub flagged: Vec<FlaggedGroup>,
    /// The decision log in output order.
    pub lines: Vec<ReportLine>,
    /// Subtrees that could not be read.
    pub warnings: Vec<ScanWarning>,
}

impl ReconcileReport {
    /// Actions decided for this run, applied or not.
    pub fn actions(&self) -> Vec<FsAction> {
        self.groups
            .iter()
            .filter_map(|g| g.resolution.action())
            .collect()
    }

    /// Number of groups that need manual attention.
    pub fn conflict_count(&self) -> usize {
        self.groups
            .iter()
            .filter(|g| g.resolution.is_conflict())
            .count()
            + self.flagged.len()
    }

    /// Number of actions that failed.
    pub fn failure_count(&self) -> usize {
        self.groups
            .iter()
            .filter(|g| matches!(g.outcome, ActionOutcome::Failed(_)))
            .count()
    }
}

/// Collision reconciler.
pub struct Reconciler {
    config: ReconcileConfig,
}

impl Reconciler {
    /// Create a reconciler with the default (dry-run) config.
    pub fn new() -> Self {
        Self {
            config: ReconcileConfig::default(),
        }
    }

    /// Create a reconciler with custom config.
    pub fn with_config(config: ReconcileConfig) -> Self {
        Self { config }
    }

    /// Walk `root`, group collision copies and resolve every pair.
    pub fn reconcile(&self, root: &Path) -> Result<ReconcileReport, ScanError> {
        let mut collector = Collector {
            config: &self.config,
            index: CollisionIndex::new(),
        };
        let summary = TreeWalker::new().walk(root, &mut collector)?;
        let index = collector.index;

        let mut groups = Vec::new();
        let mut flagged = Vec::new();
        let mut lines = Vec::new();

        for (kind, map) in [(NodeKind::File, &index.files), (NodeKind::Directory, &index.folders)] {
            for (key, members) in map.iter().filter(|(_, m)| m.len() == 2) {
                lines.push(ReportLine::info(format!("{}:{}", kind_label(kind), key.display())));
                let resolution = match kind {
                    NodeKind::File => self.resolve_files(key, members),
                    NodeKind::Directory => resolve_folders(key, members),
                };
                describe(&resolution, key, &mut lines);
                let outcome = self.apply(&resolution, &mut lines);
                lines.push(ReportLine::info(""));

                groups.push(GroupOutcome {
                    key: key.clone(),
                    kind,
                    members: members.clone(),
                    resolution,
                    outcome,
                });
            }
        }

        for (kind, map) in [(NodeKind::File, &index.files), (NodeKind::Directory, &index.folders)] {
            for (key, members) in map.iter().filter(|(_, m)| m.len() > 2) {
                if flagged.is_empty() {
                    lines.push(ReportLine::flag("ABOVE 2 SAME"));
                }
                warn!(key = %key.display(), members = members.len(), "collision group needs manual handling");
                lines.push(ReportLine::flag(format!("{}:{}", kind_label(kind), key.display())));
                for member in members {
                    lines.push(ReportLine::flag(format!("    {}", member.path().display())));
                }
                flagged.push(FlaggedGroup {
                    key: key.clone(),
                    kind,
                    members: members.clone(),
                });
            }
        }

        info!(
            root = %summary.root.display(),
            dry_run = self.config.dry_run,
            pairs = groups.len(),
            flagged = flagged.len(),
            "reconciliation complete"
        );

        Ok(ReconcileReport {
            root: summary.root,
            dry_run: self.config.dry_run,
            groups,
            flagged,
            lines,
            warnings: summary.warnings,
        })
    }

    /// Decide what to do with a file pair.
    fn resolve_files(&self, key: &Path, members: &[CollisionMember]) -> Resolution {
        let (original, copy) = match members {
            [CollisionMember::Canonical(a), CollisionMember::Collision(b)]
            | [CollisionMember::Collision(b), CollisionMember::Canonical(a)] => (a, b),
            [CollisionMember::Canonical(_), CollisionMember::Canonical(_)] => {
                return Resolution::BothCanonical;
            }
            _ => return Resolution::NoCanonical,
        };
        debug_assert_eq!(original.as_path(), key);

        let number = copy
            .file_name()
            .and_then(|n| collision_number(&n.to_string_lossy(), NodeKind::File));
        if let Some(number) = number.filter(|n| *n != 1) {
            return Resolution::NotFirstCopy {
                copy: copy.clone(),
                number,
            };
        }

        let original_len = match fs::metadata(original) {
            Ok(m) => m.len(),
            Err(e) => return unreadable(original, &e),
        };
        let copy_len = match fs::metadata(copy) {
            Ok(m) => m.len(),
            Err(e) => return unreadable(copy, &e),
        };

        match (original_len, copy_len) {
            (0, 0) => Resolution::BothEmpty,
            (_, 0) => Resolution::DeleteCopy {
                copy: copy.clone(),
                copy_len,
            },
            (0, _) => Resolution::ReplaceOriginal {
                original: original.clone(),
                original_len,
                copy: copy.clone(),
                copy_len,
            },
            _ => {
                let same_content = if self.config.compare_contents {
                    files_equal(original, copy)
                        .inspect_err(|e| warn!(error = %e, "content comparison failed"))
                        .ok()
                } else {
                    None
                };
                Resolution::BothNonEmpty { same_content }
            }
        }
    }

    /// Carry out (or only plan) the action behind a decision.
    fn apply(&self, resolution: &Resolution, lines: &mut Vec<ReportLine>) -> ActionOutcome {
        let Some(action) = resolution.action() else {
            return ActionOutcome::None;
        };
        if self.config.dry_run {
            return ActionOutcome::Planned;
        }
        match execute(&action) {
            Ok(()) => ActionOutcome::Applied,
            Err(e) => {
                lines.push(ReportLine::error(e.to_string()));
                ActionOutcome::Failed(e)
            }
        }
    }
}

impl Default for Reconciler {
    fn default() -> Self {
        Self::new()
    }
}

/// Decide what to do with a folder pair. Folders are only ever reported.
fn resolve_folders(_key: &Path, members: &[CollisionMember]) -> Resolution {
    match members {
        [CollisionMember::Canonical(a), CollisionMember::Collision(b)]
        | [CollisionMember::Collision(b), CollisionMember::Canonical(a)] => {
            Resolution::FolderPair {
                original: a.clone(),
                copy: b.clone(),
            }
        }
        [CollisionMember::Canonical(_), CollisionMember::Canonical(_)] => Resolution::BothCanonical,
        _ => Resolution::NoCanonical,
    }
}

fn unreadable(path: &Path, error: &io::Error) -> Resolution {
    Resolution::Unreadable {
        path: path.to_path_buf(),
        message: error.to_string(),
    }
}

fn kind_label(kind: NodeKind) -> &'static str {
    match kind {
        NodeKind::File => "File",
        NodeKind::Directory => "Folder",
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

/// Append the log lines describing a decision.
fn describe(resolution: &Resolution, key: &Path, lines: &mut Vec<ReportLine>) {
    match resolution {
        Resolution::DeleteCopy { copy, copy_len } => {
            info!(copy = %copy.display(), "empty copy");
            lines.push(ReportLine::info(format!("Delete {} - {copy_len}", file_name(copy))));
        }
        Resolution::ReplaceOriginal {
            original,
            original_len,
            copy,
            copy_len,
        } => {
            info!(original = %original.display(), "empty original");
            lines.push(ReportLine::info(format!("Rename {} - {copy_len}", file_name(copy))));
            lines.push(ReportLine::info(format!(
                "Delete {} - {original_len}",
                file_name(original)
            )));
        }
        Resolution::BothNonEmpty { same_content } => {
            let same = same_content.map_or_else(|| "unknown".to_string(), |s| s.to_string());
            warn!(key = %key.display(), same_content = %same, "both members hold data");
            lines.push(ReportLine::error(format!("Both have size, sameFile={same}")));
        }
        Resolution::BothEmpty => {
            warn!(key = %key.display(), "both members empty");
            lines.push(ReportLine::error("Both Zero"));
        }
        Resolution::BothCanonical => {
            warn!(key = %key.display(), "two canonical members");
            lines.push(ReportLine::error(format!("Both files real {}", key.display())));
        }
        Resolution::NoCanonical => {
            warn!(key = %key.display(), "only copies, no original");
            lines.push(ReportLine::error(format!("No original for {}", key.display())));
        }
        Resolution::NotFirstCopy { copy, number } => {
            warn!(copy = %copy.display(), number, "copy suffix is not (1)");
            lines.push(ReportLine::error(format!(
                "Suffix ({number}) is not a sync copy, review {}",
                file_name(copy)
            )));
        }
        Resolution::FolderPair { original, copy } => {
            lines.push(ReportLine::info(format!(
                "Review {} against {}",
                copy.display(),
                original.display()
            )));
        }
        Resolution::Unreadable { path, message } => {
            warn!(path = %path.display(), "{message}");
            lines.push(ReportLine::error(format!(
                "Could not read {}: {message}",
                path.display()
            )));
        }
    }
}

/// Walk visitor feeding the collision index.
struct Collector<'a> {
    config: &'a ReconcileConfig,
    index: CollisionIndex,
}

impl Collector<'_> {
    fn record(&mut self, node: &FsNode) {
        if node.depth == 0 || self.config.is_excluded(&node.path) {
            return;
        }
        self.index.record(node);
    }
}

impl Visitor for Collector<'_> {
    fn visit_file(&mut self, file: &FsNode) {
        self.record(file);
    }

    fn leave_dir(&mut self, dir: &FsNode) {
        self.record(dir);
    }
}
