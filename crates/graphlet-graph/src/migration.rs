//! Schema migration
//!
//! A migration diffs the installed schema against a proposed one, checks
//! the change against live data, and only then applies it. Validation
//! never mutates, so a refused migration leaves schema and indices exactly
//! as they were.

use crate::graph::Graph;
use crate::schema::Schema;
use graphlet_core::{Error, LinkType, Result};
use tracing::{info, warn};

/// Structural difference between two schemas
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaDiff {
    /// Link types present now but not in the proposal
    pub deleted_links: Vec<LinkType>,

    /// Link types only in the proposal
    pub new_links: Vec<LinkType>,

    /// Node types present now but not in the proposal
    pub deleted_node_types: Vec<String>,

    /// Node types only in the proposal
    pub new_node_types: Vec<String>,

    /// Node types in both whose attribute schema differs
    pub changed_node_types: Vec<String>,
}

impl SchemaDiff {
    /// Compute the difference from `current` to `proposed`
    pub fn between(current: &Schema, proposed: &Schema) -> Self {
        let deleted_links = current.links.difference(&proposed.links).cloned().collect();
        let new_links = proposed.links.difference(&current.links).cloned().collect();

        let deleted_node_types = current
            .nodes
            .keys()
            .filter(|name| !proposed.nodes.contains_key(*name))
            .cloned()
            .collect();
        let new_node_types = proposed
            .nodes
            .keys()
            .filter(|name| !current.nodes.contains_key(*name))
            .cloned()
            .collect();
        let changed_node_types = current
            .nodes
            .iter()
            .filter(|(name, attrs)| proposed.nodes.get(*name).is_some_and(|p| p != *attrs))
            .map(|(name, _)| name.clone())
            .collect();

        Self {
            deleted_links,
            new_links,
            deleted_node_types,
            new_node_types,
            changed_node_types,
        }
    }

    /// Returns true if the schemas are identical
    pub fn is_empty(&self) -> bool {
        self.deleted_links.is_empty()
            && self.new_links.is_empty()
            && self.deleted_node_types.is_empty()
            && self.new_node_types.is_empty()
            && self.changed_node_types.is_empty()
    }
}

impl Graph {
    /// Move the graph to `proposed`, returning what changed
    ///
    /// The first call installs the schema into an empty graph. Later calls
    /// refuse to drop a link type that still has edges, or a node type that
    /// still has nodes or is still used by a surviving link type.
    pub fn migrate(&mut self, proposed: Schema) -> Result<SchemaDiff> {
        let diff = self.plan_migration(&proposed)?;
        self.apply_migration(&diff, proposed);

        info!(
            "Migrated graph {}: -{} +{} link types, -{} +{} ~{} node types",
            self.name(),
            diff.deleted_links.len(),
            diff.new_links.len(),
            diff.deleted_node_types.len(),
            diff.new_node_types.len(),
            diff.changed_node_types.len()
        );
        Ok(diff)
    }

    /// Validate a migration without applying it
    pub fn plan_migration(&self, proposed: &Schema) -> Result<SchemaDiff> {
        let diff = SchemaDiff::between(self.schema(), proposed);

        // data checks first: dropping a type a kept link still uses is an
        // integrity problem, not just a malformed proposal
        let checked = if self.is_initialized() {
            self.check_migration(&diff, proposed)
                .and_then(|()| proposed.validate())
        } else {
            proposed.validate()
        };
        if let Err(err) = checked {
            warn!("Refused migration of graph {}: {}", self.name(), err);
            return Err(err);
        }
        Ok(diff)
    }

    fn check_migration(&self, diff: &SchemaDiff, proposed: &Schema) -> Result<()> {
        let links = &self.state.links;
        let nodes = &self.state.nodes;

        for link in &diff.deleted_links {
            let (forward, backward) = links.edge_count(link);
            if forward > 0 || backward > 0 {
                return Err(Error::LinkInUse {
                    source_type: link.source.clone(),
                    link: link.name.clone(),
                    target_type: link.target.clone(),
                    remaining: forward.max(backward),
                });
            }
        }

        for node_type in &diff.deleted_node_types {
            // link types that exist before and after the migration
            let surviving: Vec<String> = self
                .registry()
                .link_types_touching(node_type)
                .filter(|link| proposed.links.contains(*link))
                .map(ToString::to_string)
                .collect();
            if !surviving.is_empty() {
                return Err(Error::NodeTypeReferenced {
                    node_type: node_type.clone(),
                    links: surviving,
                });
            }

            let count = nodes.count(node_type);
            if count > 0 {
                return Err(Error::NodeTypeNotEmpty {
                    node_type: node_type.clone(),
                    count,
                });
            }
        }

        for node_type in &diff.changed_node_types {
            let count = nodes.count(node_type);
            if count > 0 {
                return Err(Error::NodeTypeNotEmpty {
                    node_type: node_type.clone(),
                    count,
                });
            }
        }
        Ok(())
    }

    fn apply_migration(&mut self, diff: &SchemaDiff, mut proposed: Schema) {
        let state = &mut self.state;

        // 1) Remove links
        for link in &diff.deleted_links {
            state.registry.remove_link_type(link);
            state.links.remove_link_type(link, state.registry.link_types());
        }

        // 2) Remove node types
        for node_type in &diff.deleted_node_types {
            state.registry.remove_node_type(node_type);
            state.nodes.remove_type(node_type);
            state.links.remove_node_type(node_type);
        }

        // 3) Add and replace node types
        for node_type in diff.new_node_types.iter().chain(&diff.changed_node_types) {
            if let Some(attributes) = proposed.nodes.remove(node_type) {
                state.registry.insert_node_type(node_type.clone(), attributes);
                state.nodes.install_type(node_type);
            }
        }

        // 4) Add links
        for link in &diff.new_links {
            state.links.install_link_type(link);
            state.registry.insert_link_type(link.clone());
        }

        state.initialized = true;
    }
}
