//! Error types for Graphlet
//!
//! Every failure belongs to one [`ErrorKind`] so hosts can tell schema
//! problems, missing entities and integrity conflicts apart without
//! matching on individual variants.

use thiserror::Error;

/// Broad classification of an [`Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Request shape does not match the installed schema
    SchemaViolation,
    /// A node id does not exist under the given node type
    NotFound,
    /// A migration would orphan live data
    IntegrityViolation,
    /// Snapshot save/load failed
    Persistence,
    /// Lock poisoning, missing configuration and similar host-side faults
    Internal,
}

/// The main error type for Graphlet operations
#[derive(Error, Debug)]
pub enum Error {
    // ========== Schema Violations ==========
    #[error("Unknown node type: {0}")]
    UnknownNodeType(String),

    #[error("Unknown link type: ({source_type}, {link}, {target_type})")]
    UnknownLinkType {
        source_type: String,
        link: String,
        target_type: String,
    },

    #[error("Unknown attribute '{attribute}' on node type {node_type}")]
    UnknownAttribute { node_type: String, attribute: String },

    #[error("Missing attribute '{attribute}' for node type {node_type} (attribute set #{index})")]
    MissingAttribute {
        node_type: String,
        attribute: String,
        index: usize,
    },

    #[error(
        "Type mismatch on {node_type}.{attribute} (attribute set #{index}): expected {expected}, found {found}"
    )]
    TypeMismatch {
        node_type: String,
        attribute: String,
        index: usize,
        expected: String,
        found: String,
    },

    #[error("No attribute sets given for node type {0}")]
    EmptyBatch(String),

    #[error("Invalid direction: {0} (expected '->' or '<-')")]
    InvalidDirection(String),

    #[error("Invalid schema: {0}")]
    InvalidSchema(String),

    // ========== Not Found ==========
    #[error("Node type not found: {0}")]
    NodeTypeNotFound(String),

    #[error("Node not found: {id} in {node_type}")]
    NodeNotFound { node_type: String, id: String },

    #[error("Invalid node id: {0}")]
    InvalidId(String),

    // ========== Integrity Violations ==========
    #[error(
        "Link ({source_type}, {link}, {target_type}) still has {remaining} remaining connections; unlink them before migrating"
    )]
    LinkInUse {
        source_type: String,
        link: String,
        target_type: String,
        remaining: usize,
    },

    #[error("Node type {node_type} is still used by link types: {links:?}")]
    NodeTypeReferenced {
        node_type: String,
        links: Vec<String>,
    },

    #[error("Node type {node_type} still holds {count} nodes")]
    NodeTypeNotEmpty { node_type: String, count: usize },

    // ========== Persistence Errors ==========
    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("Snapshot corruption detected: {0}")]
    DataCorruption(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ========== Internal Errors ==========
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for Graphlet operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::UnknownNodeType(_)
            | Error::UnknownLinkType { .. }
            | Error::UnknownAttribute { .. }
            | Error::MissingAttribute { .. }
            | Error::TypeMismatch { .. }
            | Error::EmptyBatch(_)
            | Error::InvalidDirection(_)
            | Error::InvalidSchema(_) => ErrorKind::SchemaViolation,

            Error::NodeTypeNotFound(_) | Error::NodeNotFound { .. } | Error::InvalidId(_) => {
                ErrorKind::NotFound
            }

            Error::LinkInUse { .. }
            | Error::NodeTypeReferenced { .. }
            | Error::NodeTypeNotEmpty { .. } => ErrorKind::IntegrityViolation,

            Error::Serialization(_)
            | Error::Deserialization(_)
            | Error::DataCorruption(_)
            | Error::Io(_) => ErrorKind::Persistence,

            Error::Configuration(_) | Error::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Returns true if the request did not fit the schema
    pub fn is_schema_violation(&self) -> bool {
        self.kind() == ErrorKind::SchemaViolation
    }

    /// Returns true if a referenced node does not exist
    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    /// Returns true if a migration was refused because of live data
    pub fn is_integrity_violation(&self) -> bool {
        self.kind() == ErrorKind::IntegrityViolation
    }

    /// Build a [`Error::NodeNotFound`] for `id` under `node_type`
    pub fn node_not_found(node_type: &str, id: impl ToString) -> Self {
        Error::NodeNotFound {
            node_type: node_type.to_string(),
            id: id.to_string(),
        }
    }
}
