//! Size report configuration.

use std::path::PathBuf;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

/// Configuration for a size aggregation run.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct SizeConfig {
    /// Root path to aggregate.
    pub root: PathBuf,

    /// Nesting levels below the root that are always reported.
    ///
    /// `0` reports only the root's direct children, `1` adds grandchildren.
    /// A negative value reports nothing by depth, leaving only always-show
    /// and large folders.
    #[builder(default = "1")]
    #[serde(default = "default_max_depth")]
    pub max_depth: i32,

    /// Directory names reported wherever they occur, regardless of depth or size.
    #[builder(default)]
    #[serde(default)]
    pub always_show: Vec<String>,

    /// Report any directory whose aggregated size exceeds this many bytes.
    #[builder(default)]
    #[serde(default)]
    pub show_large_threshold: Option<u64>,
}

fn default_max_depth() -> i32 {
    1
}

impl SizeConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(ref root) = self.root {
            if root.as_os_str().is_empty() {
                return Err("Root path cannot be empty".to_string());
            }
        } else {
            return Err("Root path is required".to_string());
        }
        Ok(())
    }
}

impl SizeConfig {
    /// Threshold used by `--show-large` (500 MB, decimal).
    pub const LARGE_FOLDER_THRESHOLD: u64 = 500_000_000;

    /// Create a new size config builder.
    pub fn builder() -> SizeConfigBuilder {
        SizeConfigBuilder::default()
    }

    /// Create a simple config for a path with default depth.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            max_depth: default_max_depth(),
            always_show: Vec::new(),
            show_large_threshold: None,
        }
    }

    /// Check if a directory name is on the always-show list.
    pub fn is_always_shown(&self, name: &str) -> bool {
        self.always_show.iter().any(|n| n == name)
    }

    /// Check if an aggregated size is above the large-folder threshold.
    pub fn exceeds_large_threshold(&self, size: u64) -> bool {
        self.show_large_threshold.is_some_and(|t| size > t)
    }
}

impl Default for SizeConfig {
    fn default() -> Self {
        Self::new(".")
    }
}
