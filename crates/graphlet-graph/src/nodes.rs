//! Node storage: per node type, identifier → attribute values

use graphlet_core::{Attributes, Error, NodeId, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Nodes of one node type in insertion order
pub type NodeTable = IndexMap<NodeId, Attributes>;

/// Attribute records for every installed node type
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeStore {
    tables: HashMap<String, NodeTable>,
}

impl NodeStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if `id` exists under `node_type`
    pub fn contains(&self, node_type: &str, id: NodeId) -> bool {
        self.tables
            .get(node_type)
            .is_some_and(|table| table.contains_key(&id))
    }

    /// Number of nodes stored under `node_type`
    pub fn count(&self, node_type: &str) -> usize {
        self.tables.get(node_type).map_or(0, NodeTable::len)
    }

    /// Attributes of one node
    pub fn get(&self, node_type: &str, id: NodeId) -> Option<&Attributes> {
        self.tables.get(node_type)?.get(&id)
    }

    /// Iterate over the nodes of `node_type` in insertion order
    pub fn iter(&self, node_type: &str) -> impl Iterator<Item = (&NodeId, &Attributes)> {
        self.tables
            .get(node_type)
            .into_iter()
            .flat_map(|table| table.iter())
    }

    /// Fail with [`Error::NodeNotFound`] for the first id absent from `node_type`
    pub fn require(&self, node_type: &str, ids: &[NodeId]) -> Result<()> {
        match ids.iter().find(|id| !self.contains(node_type, **id)) {
            Some(missing) => Err(Error::node_not_found(node_type, missing)),
            None => Ok(()),
        }
    }

    pub(crate) fn install_type(&mut self, node_type: &str) {
        self.tables.entry(node_type.to_string()).or_default();
    }

    pub(crate) fn remove_type(&mut self, node_type: &str) -> Option<NodeTable> {
        self.tables.remove(node_type)
    }

    pub(crate) fn insert(&mut self, node_type: &str, id: NodeId, attributes: Attributes) {
        self.tables
            .entry(node_type.to_string())
            .or_default()
            .insert(id, attributes);
    }

    pub(crate) fn remove(&mut self, node_type: &str, id: NodeId) -> Option<Attributes> {
        // shift_remove keeps the remaining rows in insertion order
        self.tables.get_mut(node_type)?.shift_remove(&id)
    }
}
