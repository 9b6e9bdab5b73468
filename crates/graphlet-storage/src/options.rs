//! Snapshot configuration options

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Options for configuring where and how snapshots are written
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotOptions {
    /// Path of the snapshot file
    pub path: PathBuf,

    /// Whether to create missing parent directories on save
    pub create_if_missing: bool,

    /// Sync file contents to disk after every save (slower but safer)
    pub sync_on_save: bool,
}

impl SnapshotOptions {
    /// Create options for a snapshot at the given path
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    /// Create options optimized for tests
    pub fn for_testing<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            create_if_missing: true,
            sync_on_save: false, // Faster for tests
        }
    }

    /// Enable or disable parent directory creation
    pub fn create_if_missing(mut self, create: bool) -> Self {
        self.create_if_missing = create;
        self
    }

    /// Enable or disable sync after save
    pub fn sync_on_save(mut self, sync: bool) -> Self {
        self.sync_on_save = sync;
        self
    }
}

impl Default for SnapshotOptions {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./graphlet.snapshot"),
            create_if_missing: true,
            sync_on_save: true,
        }
    }
}
