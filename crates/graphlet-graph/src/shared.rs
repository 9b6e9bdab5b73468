//! Thread-shareable graph handle

use crate::config::GraphConfig;
use crate::graph::Graph;
use graphlet_core::{Error, Result};
use std::sync::{Arc, RwLock};

/// A [`Graph`] behind one reader-writer lock
///
/// Every call holds the lock for the whole closure, so readers never
/// observe a graph halfway through a mutation.
#[derive(Debug, Clone, Default)]
pub struct SharedGraph {
    inner: Arc<RwLock<Graph>>,
}

impl SharedGraph {
    /// Create a handle around an empty graph
    pub fn new(config: GraphConfig) -> Self {
        Graph::with_config(config).into()
    }

    /// Run `f` with shared access
    pub fn read<R>(&self, f: impl FnOnce(&Graph) -> R) -> Result<R> {
        let graph = self
            .inner
            .read()
            .map_err(|_| Error::Internal("Failed to acquire graph lock".to_string()))?;
        Ok(f(&graph))
    }

    /// Run `f` with exclusive access
    pub fn write<R>(&self, f: impl FnOnce(&mut Graph) -> R) -> Result<R> {
        let mut graph = self
            .inner
            .write()
            .map_err(|_| Error::Internal("Failed to acquire graph lock".to_string()))?;
        Ok(f(&mut graph))
    }

    /// Take the graph back if this is the last handle
    pub fn try_unwrap(self) -> std::result::Result<Graph, Self> {
        match Arc::try_unwrap(self.inner) {
            Ok(lock) => lock
                .into_inner()
                .map_err(|poisoned| Self::from(poisoned.into_inner())),
            Err(inner) => Err(Self { inner }),
        }
    }
}

impl From<Graph> for SharedGraph {
    fn from(graph: Graph) -> Self {
        Self {
            inner: Arc::new(RwLock::new(graph)),
        }
    }
}
