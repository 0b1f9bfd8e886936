//! Explorer configuration.

use std::path::PathBuf;

use evalscope_store::FsRunStore;
use serde::{Deserialize, Serialize};

use crate::explorer::RunExplorer;

/// Default results directory, relative to the project root.
pub const DEFAULT_RESULTS_DIR: &str = "evals/results";

/// Where run documents live and what `file_path` is reported against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplorerConfig {
    pub results_dir: PathBuf,
    pub project_root: PathBuf,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            results_dir: PathBuf::from(DEFAULT_RESULTS_DIR),
            project_root: PathBuf::from("."),
        }
    }
}

impl ExplorerConfig {
    pub fn new(results_dir: impl Into<PathBuf>, project_root: impl Into<PathBuf>) -> Self {
        Self {
            results_dir: results_dir.into(),
            project_root: project_root.into(),
        }
    }

    /// Results directory, resolved against the project root when relative.
    pub fn resolved_results_dir(&self) -> PathBuf {
        if self.results_dir.is_absolute() {
            self.results_dir.clone()
        } else {
            self.project_root.join(&self.results_dir)
        }
    }

    pub fn store(&self) -> FsRunStore {
        FsRunStore::new(self.resolved_results_dir()).with_project_root(&self.project_root)
    }

    /// Explorer over the filesystem store this config describes.
    pub fn open(&self) -> RunExplorer<FsRunStore> {
        RunExplorer::new(self.store())
    }
}
