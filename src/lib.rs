//! Graphlet - embedded property graph store
//!
//! This is the main library crate that re-exports all Graphlet components.

pub use graphlet_core as core;
pub use graphlet_graph as graph;
pub use graphlet_storage as storage;

// Re-export commonly used types
pub use graphlet_core::{
    AttributeType, AttributeValue, Attributes, Direction, Error, ErrorKind, IdGenerator, LinkType,
    NodeId, Result,
};

pub use graphlet_graph::{Graph, GraphConfig, Schema, SchemaDiff, Selection, SharedGraph};
pub use graphlet_storage::SnapshotOptions;
