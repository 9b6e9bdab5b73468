//! Graphlet Graph Engine
//!
//! Schema-checked node storage with a bidirectional link index.
//!
//! # Overview
//!
//! - [`SchemaRegistry`]: installed node types and link types
//! - [`NodeStore`]: attribute records per node type
//! - [`LinkIndex`]: forward and backward adjacency kept in lockstep
//! - [`Graph`]: create, get, link, unlink, traverse and delete
//! - Migrations: [`Graph::migrate`] moves a graph between schemas without
//!   orphaning data

pub mod config;
pub mod graph;
pub mod links;
pub mod migration;
pub mod nodes;
pub mod schema;
pub mod shared;

pub use config::GraphConfig;
pub use graph::{Graph, Selection};
pub use links::{AnchorBucket, LinkIndex, Neighbors, Orientation};
pub use migration::SchemaDiff;
pub use nodes::{NodeStore, NodeTable};
pub use schema::{AttributeSchema, ID_ATTRIBUTE, Schema, SchemaRegistry};
pub use shared::SharedGraph;
