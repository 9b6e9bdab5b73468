//! Node identification for Graphlet
//!
//! Identifiers come from a single counter per store, so they are unique
//! across every node type and never handed out twice.

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier for a node in the graph
///
/// Renders as its decimal string ("0", "1", ...).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(u64);

impl NodeId {
    /// Create from the raw counter value
    pub fn from_internal(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw counter value
    pub fn as_internal(&self) -> u64 {
        self.0
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for NodeId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // "007" would never be produced by the generator
        if s.len() > 1 && s.starts_with('0') {
            return Err(Error::InvalidId(s.to_string()));
        }
        s.parse::<u64>()
            .map(NodeId)
            .map_err(|_| Error::InvalidId(s.to_string()))
    }
}

impl From<u64> for NodeId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Sequential identifier generator owned by a store instance
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdGenerator {
    next: u64,
}

impl IdGenerator {
    /// Create a generator starting at "0"
    pub fn new() -> Self {
        Self::default()
    }

    /// Hand out the next id
    pub fn next_id(&mut self) -> NodeId {
        let id = NodeId(self.next);
        self.next += 1;
        id
    }

    /// Value the next call to [`IdGenerator::next_id`] will return
    pub fn peek(&self) -> u64 {
        self.next
    }
}
