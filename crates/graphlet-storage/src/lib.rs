//! Graphlet Snapshot Storage
//!
//! Persists the complete state of a store as one opaque byte stream and
//! restores it verbatim.
//!
//! # Format
//!
//! - 8-byte magic `GRAPHLET`
//! - `u32` little-endian format version
//! - bincode-encoded state body
//!
//! The state type is chosen by the caller; this crate only frames,
//! encodes and moves bytes.

pub mod options;
pub mod snapshot;

pub use options::SnapshotOptions;
pub use snapshot::{FORMAT_VERSION, MAGIC, SnapshotFile, decode, encode};
