//! Graph configuration

use graphlet_storage::SnapshotOptions;
use serde::{Deserialize, Serialize};

/// Configuration for a graph instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphConfig {
    /// Name of the graph, used in log lines
    pub name: String,

    /// Where [`crate::Graph::save`] and [`crate::Graph::load`] put the snapshot
    #[serde(default)]
    pub snapshot: Option<SnapshotOptions>,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            snapshot: None,
        }
    }
}

impl GraphConfig {
    /// Create a configuration without snapshot persistence
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Attach snapshot options
    pub fn with_snapshot(mut self, options: SnapshotOptions) -> Self {
        self.snapshot = Some(options);
        self
    }
}
