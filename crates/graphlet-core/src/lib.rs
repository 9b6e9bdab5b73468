//! Graphlet Core Library
//!
//! This crate provides the fundamental types and error handling shared by
//! every Graphlet component.
//!
//! # Overview
//!
//! Graphlet is an embedded property-graph store: typed nodes connected by
//! named, directed links, with a schema that can be migrated over the
//! lifetime of the store.
//!
//! # Modules
//!
//! - `types` - Link types and traversal direction
//! - `error` - Error types and result aliases
//! - `id` - Node identification and generation
//! - `attribute` - Attribute type tags and values

pub mod attribute;
pub mod error;
pub mod id;
pub mod types;

pub use attribute::{AttributeType, AttributeValue, Attributes};
pub use error::{Error, ErrorKind, Result};
pub use id::{IdGenerator, NodeId};
pub use types::{Direction, LinkType};
