//! Core graph types for Graphlet
//!
//! Defines link types (the schema-level relationship triples) and the
//! direction of a traversal.

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A named, directed relationship kind between two node types
///
/// The link name is scoped to the triple: `(Showing, of, Movie)` and
/// `(Showing, of, Play)` are distinct link types.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "(String, String, String)", into = "(String, String, String)")]
pub struct LinkType {
    /// Node type the link starts from
    pub source: String,

    /// Name of the link
    pub name: String,

    /// Node type the link points at
    pub target: String,
}

impl LinkType {
    /// Create a new link type
    pub fn new<S, N, T>(source: S, name: N, target: T) -> Self
    where
        S: Into<String>,
        N: Into<String>,
        T: Into<String>,
    {
        Self {
            source: source.into(),
            name: name.into(),
            target: target.into(),
        }
    }

    /// The same link name with source and target swapped
    pub fn reversed(&self) -> Self {
        Self {
            source: self.target.clone(),
            name: self.name.clone(),
            target: self.source.clone(),
        }
    }

    /// Returns true if `node_type` is either endpoint
    pub fn touches(&self, node_type: &str) -> bool {
        self.source == node_type || self.target == node_type
    }
}

impl From<(String, String, String)> for LinkType {
    fn from((source, name, target): (String, String, String)) -> Self {
        Self {
            source,
            name,
            target,
        }
    }
}

impl From<LinkType> for (String, String, String) {
    fn from(link: LinkType) -> Self {
        (link.source, link.name, link.target)
    }
}

impl fmt::Display for LinkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.source, self.name, self.target)
    }
}

/// Direction of a traversal along a link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Follow links from source to target (->)
    Forward,
    /// Follow links from target back to source (<-)
    Backward,
}

impl Direction {
    /// Arrow token for this direction
    pub fn arrow(self) -> &'static str {
        match self {
            Direction::Forward => "->",
            Direction::Backward => "<-",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.arrow())
    }
}

impl FromStr for Direction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "->" | "forward" => Ok(Direction::Forward),
            "<-" | "backward" => Ok(Direction::Backward),
            other => Err(Error::InvalidDirection(other.to_string())),
        }
    }
}
