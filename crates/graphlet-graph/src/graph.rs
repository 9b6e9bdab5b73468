//! Graph instance implementation

use crate::config::GraphConfig;
use crate::links::LinkIndex;
use crate::nodes::NodeStore;
use crate::schema::{ID_ATTRIBUTE, Schema, SchemaRegistry};
use graphlet_core::{
    AttributeValue, Attributes, Direction, Error, IdGenerator, LinkType, NodeId, Result,
};
use graphlet_storage::{SnapshotFile, decode, encode};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::io::{Read, Write};
use tracing::{debug, info};

/// Which nodes [`Graph::get`] returns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection<'a> {
    /// Every node of the type, in insertion order
    All,
    /// The given ids, in request order
    Ids(&'a [NodeId]),
}

impl<'a> From<&'a [NodeId]> for Selection<'a> {
    fn from(ids: &'a [NodeId]) -> Self {
        Selection::Ids(ids)
    }
}

/// Everything a snapshot carries
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub(crate) struct GraphState {
    pub(crate) initialized: bool,
    pub(crate) registry: SchemaRegistry,
    pub(crate) nodes: NodeStore,
    pub(crate) links: LinkIndex,
    pub(crate) id_gen: IdGenerator,
}

/// An embedded property graph
///
/// Mutating operations take `&mut self`; there is no internal locking.
/// Wrap the graph in a [`crate::SharedGraph`] to share it between threads.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    config: GraphConfig,
    pub(crate) state: GraphState,
}

impl Graph {
    /// Create an uninitialized graph; the first [`Graph::migrate`] installs its schema
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an uninitialized graph with the given configuration
    pub fn with_config(config: GraphConfig) -> Self {
        Self {
            config,
            state: GraphState::default(),
        }
    }

    /// Get the graph name
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Get the configuration
    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    /// Returns true once a schema has been installed
    pub fn is_initialized(&self) -> bool {
        self.state.initialized
    }

    /// Read-only schema lookups
    pub fn registry(&self) -> &SchemaRegistry {
        &self.state.registry
    }

    /// The installed schema
    pub fn schema(&self) -> &Schema {
        self.state.registry.schema()
    }

    /// Read-only view of the node records
    pub fn nodes(&self) -> &NodeStore {
        &self.state.nodes
    }

    /// Read-only view of the link index
    pub fn links(&self) -> &LinkIndex {
        &self.state.links
    }

    /// Number of nodes of `node_type`
    pub fn count(&self, node_type: &str) -> Result<usize> {
        self.state.registry.require_node_type(node_type)?;
        Ok(self.state.nodes.count(node_type))
    }

    /// Check if `id` exists under `node_type`
    pub fn contains(&self, node_type: &str, id: NodeId) -> bool {
        self.state.nodes.contains(node_type, id)
    }

    /// Number of live edges of a registered link type
    pub fn edge_count(&self, link: &LinkType) -> Result<usize> {
        self.state
            .registry
            .require_link_type(&link.source, &link.name, &link.target)?;
        Ok(self.state.links.edge_count(link).0)
    }

    // ========== Node Operations ==========

    /// Create one node per attribute set; returns the new ids in input order
    ///
    /// Every attribute set is validated before any node is stored.
    pub fn create(&mut self, node_type: &str, attribute_sets: Vec<Attributes>) -> Result<Vec<NodeId>> {
        let schema = self.state.registry.require_node_type(node_type)?;
        if attribute_sets.is_empty() {
            return Err(Error::EmptyBatch(node_type.to_string()));
        }
        for (index, attrs) in attribute_sets.iter().enumerate() {
            schema.validate(node_type, index, attrs)?;
        }

        let mut ids = Vec::with_capacity(attribute_sets.len());
        for attrs in attribute_sets {
            let id = self.state.id_gen.next_id();
            self.state.nodes.insert(node_type, id, attrs);
            ids.push(id);
        }

        debug!("Created {} {} nodes in graph {}", ids.len(), node_type, self.name());
        Ok(ids)
    }

    /// Delete nodes together with every link touching them
    pub fn delete(&mut self, node_type: &str, ids: &[NodeId]) -> Result<()> {
        if !self.state.registry.has_node_type(node_type) {
            return Err(Error::NodeTypeNotFound(node_type.to_string()));
        }
        self.state.nodes.require(node_type, ids)?;

        let mut seen = HashSet::with_capacity(ids.len());
        for &id in ids {
            if !seen.insert(id) {
                continue;
            }
            self.state.links.cascade_remove(node_type, id);
            self.state.nodes.remove(node_type, id);
            debug!("Deleted {} {} in graph {}", node_type, id, self.name());
        }
        Ok(())
    }

    /// Read attribute rows
    ///
    /// Each row holds the values of `attributes` in the order requested;
    /// the `id` pseudo-attribute yields the node's own identifier.
    pub fn get(
        &self,
        node_type: &str,
        selection: Selection<'_>,
        attributes: &[&str],
    ) -> Result<Vec<Vec<AttributeValue>>> {
        let schema = self.state.registry.require_node_type(node_type)?;
        for name in attributes {
            if *name != ID_ATTRIBUTE && !schema.contains(name) {
                return Err(Error::UnknownAttribute {
                    node_type: node_type.to_string(),
                    attribute: name.to_string(),
                });
            }
        }

        match selection {
            Selection::All => self
                .state
                .nodes
                .iter(node_type)
                .map(|(id, attrs)| Self::row(node_type, *id, attrs, attributes))
                .collect(),
            Selection::Ids(ids) => ids
                .iter()
                .map(|id| {
                    let attrs = self
                        .state
                        .nodes
                        .get(node_type, *id)
                        .ok_or_else(|| Error::node_not_found(node_type, id))?;
                    Self::row(node_type, *id, attrs, attributes)
                })
                .collect(),
        }
    }

    fn row(
        node_type: &str,
        id: NodeId,
        attrs: &Attributes,
        attributes: &[&str],
    ) -> Result<Vec<AttributeValue>> {
        attributes
            .iter()
            .map(|name| {
                if *name == ID_ATTRIBUTE {
                    return Ok(AttributeValue::String(id.to_string()));
                }
                attrs.get(name).cloned().ok_or_else(|| {
                    Error::Internal(format!(
                        "{} {} is missing declared attribute '{}'",
                        node_type, id, name
                    ))
                })
            })
            .collect()
    }

    // ========== Link Operations ==========

    /// Link every source id to every target id; returns the number of new edges
    ///
    /// Re-linking an existing pair is a no-op.
    pub fn link(
        &mut self,
        source_type: &str,
        source_ids: &[NodeId],
        link: &str,
        target_type: &str,
        target_ids: &[NodeId],
    ) -> Result<usize> {
        let link_type = self.check_link_request(source_type, source_ids, link, target_type, target_ids)?;

        let mut added = 0;
        for &source in source_ids {
            for &target in target_ids {
                if self.state.links.link(&link_type, source, target) {
                    added += 1;
                }
            }
        }

        debug!("Linked {} new {} edges in graph {}", added, link_type, self.name());
        Ok(added)
    }

    /// Unlink every source id from every target id; returns the number of removed edges
    ///
    /// Pairs that were never linked are skipped silently.
    pub fn unlink(
        &mut self,
        source_type: &str,
        source_ids: &[NodeId],
        link: &str,
        target_type: &str,
        target_ids: &[NodeId],
    ) -> Result<usize> {
        let link_type = self.check_link_request(source_type, source_ids, link, target_type, target_ids)?;

        let mut removed = 0;
        for &source in source_ids {
            for &target in target_ids {
                if self.state.links.unlink(&link_type, source, target) {
                    removed += 1;
                }
            }
        }

        debug!("Unlinked {} {} edges in graph {}", removed, link_type, self.name());
        Ok(removed)
    }

    fn check_link_request(
        &self,
        source_type: &str,
        source_ids: &[NodeId],
        link: &str,
        target_type: &str,
        target_ids: &[NodeId],
    ) -> Result<LinkType> {
        let registry = &self.state.registry;
        registry.require_node_type(source_type)?;
        registry.require_node_type(target_type)?;
        let link_type = registry.require_link_type(source_type, link, target_type)?;

        self.state.nodes.require(source_type, source_ids)?;
        self.state.nodes.require(target_type, target_ids)?;
        Ok(link_type)
    }

    /// Follow `link` one hop from `source_ids` in `direction`
    ///
    /// `source_type` is the type of the starting nodes and `target_type`
    /// the type of the nodes reached, whichever way the link is declared.
    /// Returns the distinct reached ids in ascending order.
    pub fn traverse(
        &self,
        source_type: &str,
        source_ids: &[NodeId],
        direction: Direction,
        link: &str,
        target_type: &str,
    ) -> Result<Vec<NodeId>> {
        let registry = &self.state.registry;
        registry.require_node_type(source_type)?;
        registry.require_node_type(target_type)?;
        let link_type = LinkType::new(source_type, link, target_type);
        let declared = registry.link_types();
        if !declared.contains(&link_type) && !declared.contains(&link_type.reversed()) {
            return Err(Error::UnknownLinkType {
                source_type: link_type.source,
                link: link_type.name,
                target_type: link_type.target,
            });
        }
        self.state.nodes.require(source_type, source_ids)?;

        let orientation = self.state.links.orientation(direction);
        let mut reached = BTreeSet::new();
        for &id in source_ids {
            if let Some(ids) = orientation.neighbors_of_type(link, source_type, id, target_type) {
                reached.extend(ids.iter().copied());
            }
        }
        Ok(reached.into_iter().collect())
    }

    // ========== Persistence ==========

    /// Write the complete state as a snapshot
    pub fn save_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        encode(writer, &self.state)
    }

    /// Replace the complete state with a snapshot
    ///
    /// On failure the current state is left untouched.
    pub fn load_from<R: Read>(&mut self, reader: &mut R) -> Result<()> {
        self.state = decode(reader)?;
        info!("Loaded snapshot into graph {}", self.name());
        Ok(())
    }

    /// Save to the configured snapshot file
    pub fn save(&self) -> Result<()> {
        self.snapshot_file()?.write(&self.state)
    }

    /// Load from the configured snapshot file
    pub fn load(&mut self) -> Result<()> {
        self.state = self.snapshot_file()?.read()?;
        info!("Loaded snapshot into graph {}", self.name());
        Ok(())
    }

    fn snapshot_file(&self) -> Result<SnapshotFile> {
        self.config
            .snapshot
            .clone()
            .map(SnapshotFile::new)
            .ok_or_else(|| {
                Error::Configuration(format!(
                    "no snapshot options configured for graph '{}'",
                    self.name()
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use graphlet_core::{AttributeType, ErrorKind};
    use graphlet_storage::SnapshotOptions;
    use proptest::prelude::*;
    use tempfile::TempDir;

    fn theater_schema() -> Schema {
        Schema::new()
            .node("Person", [("name", AttributeType::String)])
            .node("Movie", [("title", AttributeType::String)])
            .node("Play", [("title", AttributeType::String)])
            .node(
                "Showing",
                [
                    ("date", AttributeType::Timestamp),
                    ("theater", AttributeType::String),
                ],
            )
            .node("Ticket", [("seat", AttributeType::String)])
            .link("Person", "has", "Ticket")
            .link("Ticket", "for", "Showing")
            .link("Showing", "of", "Movie")
            .link("Showing", "of", "Play")
    }

    fn create_test_graph() -> Graph {
        let mut graph = Graph::with_config(GraphConfig::new("test"));
        graph.migrate(theater_schema()).unwrap();
        graph
    }

    fn person(graph: &mut Graph, name: &str) -> NodeId {
        graph
            .create("Person", vec![Attributes::new().with("name", name)])
            .unwrap()[0]
    }

    fn ticket(graph: &mut Graph, seat: &str) -> NodeId {
        graph
            .create("Ticket", vec![Attributes::new().with("seat", seat)])
            .unwrap()[0]
    }

    /// Every forward entry has a backward mirror, every indexed id exists,
    /// every indexed triple is registered
    fn assert_invariants(graph: &Graph) {
        let links = graph.links();
        for (link, s_type, s, t_type, t) in links.forward().entries() {
            assert!(
                links
                    .backward()
                    .neighbors_of_type(link, t_type, t, s_type)
                    .is_some_and(|ids| ids.contains(&s))
            );
            assert!(graph.contains(s_type, s) && graph.contains(t_type, t));
            assert!(graph.registry().has_link_type(s_type, link, t_type));
        }
        for (link, t_type, t, s_type, s) in links.backward().entries() {
            assert!(
                links
                    .forward()
                    .neighbors_of_type(link, s_type, s, t_type)
                    .is_some_and(|ids| ids.contains(&t))
            );
        }
    }

    #[test]
    fn test_uninitialized_graph_rejects_requests() {
        let mut graph = Graph::new();
        assert!(!graph.is_initialized());
        let err = graph
            .create("Person", vec![Attributes::new().with("name", "Ann")])
            .unwrap_err();
        assert!(err.is_schema_violation());
    }

    #[test]
    fn test_create_returns_sequential_ids() {
        let mut graph = create_test_graph();
        let people = graph
            .create(
                "Person",
                vec![
                    Attributes::new().with("name", "Ann"),
                    Attributes::new().with("name", "Bob"),
                ],
            )
            .unwrap();
        let seats = graph
            .create("Ticket", vec![Attributes::new().with("seat", "A1")])
            .unwrap();

        let ids: Vec<String> = people.iter().chain(&seats).map(ToString::to_string).collect();
        assert_eq!(ids, vec!["0", "1", "2"]);
        assert_eq!(graph.count("Person").unwrap(), 2);
    }

    #[test]
    fn test_create_validates_every_attribute_set() {
        let mut graph = create_test_graph();
        let err = graph
            .create(
                "Person",
                vec![
                    Attributes::new().with("name", "Ann"),
                    Attributes::new().with("name", 42i64),
                ],
            )
            .unwrap_err();

        assert!(matches!(err, Error::TypeMismatch { index: 1, .. }));
        // nothing stored, no id consumed
        assert_eq!(graph.count("Person").unwrap(), 0);
        assert_eq!(person(&mut graph, "Ann").to_string(), "0");
    }

    #[test]
    fn test_create_errors() {
        let mut graph = create_test_graph();

        assert!(matches!(
            graph.create("Person", vec![]).unwrap_err(),
            Error::EmptyBatch(_)
        ));
        assert!(matches!(
            graph
                .create("Robot", vec![Attributes::new().with("name", "R2")])
                .unwrap_err(),
            Error::UnknownNodeType(_)
        ));
        assert!(matches!(
            graph.create("Person", vec![Attributes::new()]).unwrap_err(),
            Error::MissingAttribute { .. }
        ));
        let extra = graph
            .create(
                "Person",
                vec![Attributes::new().with("name", "Ann").with("age", 3i64)],
            )
            .unwrap_err();
        assert!(extra.is_schema_violation());
    }

    #[test]
    fn test_get_round_trip() {
        let mut graph = create_test_graph();
        let date = Utc.with_ymd_and_hms(2024, 3, 9, 20, 0, 0).unwrap();
        let showing = graph
            .create(
                "Showing",
                vec![Attributes::new().with("date", date).with("theater", "Roxy")],
            )
            .unwrap();

        let rows = graph
            .get("Showing", Selection::Ids(&showing), &["theater", "id", "date"])
            .unwrap();
        assert_eq!(
            rows,
            vec![vec![
                AttributeValue::from("Roxy"),
                AttributeValue::String(showing[0].to_string()),
                AttributeValue::Timestamp(date),
            ]]
        );
    }

    #[test]
    fn test_get_all_in_insertion_order() {
        let mut graph = create_test_graph();
        let ann = person(&mut graph, "Ann");
        let bob = person(&mut graph, "Bob");
        let cid = person(&mut graph, "Cid");
        graph.delete("Person", &[bob]).unwrap();

        let rows = graph.get("Person", Selection::All, &["id", "name"]).unwrap();
        assert_eq!(
            rows,
            vec![
                vec![AttributeValue::String(ann.to_string()), "Ann".into()],
                vec![AttributeValue::String(cid.to_string()), "Cid".into()],
            ]
        );
    }

    #[test]
    fn test_get_errors() {
        let mut graph = create_test_graph();
        let ann = person(&mut graph, "Ann");

        let missing = NodeId::from_internal(99);
        assert!(
            graph
                .get("Person", Selection::Ids(&[missing]), &["name"])
                .unwrap_err()
                .is_not_found()
        );
        assert!(
            graph
                .get("InvalidNode", Selection::Ids(&[ann]), &["name"])
                .unwrap_err()
                .is_schema_violation()
        );
        assert!(matches!(
            graph
                .get("Person", Selection::Ids(&[ann]), &["invalid_attribute"])
                .unwrap_err(),
            Error::UnknownAttribute { .. }
        ));
        // a Ticket id is not a Person id
        let seat = ticket(&mut graph, "A1");
        assert!(
            graph
                .get("Person", Selection::Ids(&[seat]), &["name"])
                .unwrap_err()
                .is_not_found()
        );
    }

    #[test]
    fn test_link_and_traverse_both_ways() {
        let mut graph = create_test_graph();
        let ann = person(&mut graph, "Ann");
        let a1 = ticket(&mut graph, "A1");
        let a2 = ticket(&mut graph, "A2");

        assert_eq!(graph.link("Person", &[ann], "has", "Ticket", &[a1, a2]).unwrap(), 2);

        assert_eq!(
            graph
                .traverse("Person", &[ann], Direction::Forward, "has", "Ticket")
                .unwrap(),
            vec![a1, a2]
        );
        assert_eq!(
            graph
                .traverse("Ticket", &[a1, a2], Direction::Backward, "has", "Person")
                .unwrap(),
            vec![ann]
        );
        // no edges in that direction: empty, not an error
        assert!(
            graph
                .traverse("Ticket", &[a1], Direction::Forward, "has", "Person")
                .unwrap()
                .is_empty()
        );
        assert_invariants(&graph);
    }

    #[test]
    fn test_link_is_idempotent() {
        let mut graph = create_test_graph();
        let ann = person(&mut graph, "Ann");
        let a1 = ticket(&mut graph, "A1");

        graph.link("Person", &[ann], "has", "Ticket", &[a1]).unwrap();
        let links_after_one = graph.links().clone();
        assert_eq!(graph.link("Person", &[ann], "has", "Ticket", &[a1]).unwrap(), 0);
        assert_eq!(graph.links(), &links_after_one);
    }

    #[test]
    fn test_unlink_absent_pair_is_noop() {
        let mut graph = create_test_graph();
        let ann = person(&mut graph, "Ann");
        let a1 = ticket(&mut graph, "A1");

        assert_eq!(graph.unlink("Person", &[ann], "has", "Ticket", &[a1]).unwrap(), 0);
        graph.link("Person", &[ann], "has", "Ticket", &[a1]).unwrap();
        assert_eq!(graph.unlink("Person", &[ann], "has", "Ticket", &[a1]).unwrap(), 1);
        assert_eq!(graph.unlink("Person", &[ann], "has", "Ticket", &[a1]).unwrap(), 0);
        assert_eq!(
            graph
                .edge_count(&LinkType::new("Person", "has", "Ticket"))
                .unwrap(),
            0
        );
    }

    #[test]
    fn test_link_errors() {
        let mut graph = create_test_graph();
        let ann = person(&mut graph, "Ann");
        let a1 = ticket(&mut graph, "A1");
        let missing = NodeId::from_internal(99);

        let kind = |r: Result<usize>| r.unwrap_err().kind();
        assert_eq!(
            kind(graph.link("Robot", &[ann], "has", "Ticket", &[a1])),
            ErrorKind::SchemaViolation
        );
        assert_eq!(
            kind(graph.link("Person", &[ann], "owns", "Ticket", &[a1])),
            ErrorKind::SchemaViolation
        );
        // declared the other way round only
        assert_eq!(
            kind(graph.link("Ticket", &[a1], "has", "Person", &[ann])),
            ErrorKind::SchemaViolation
        );
        assert_eq!(
            kind(graph.link("Person", &[ann], "has", "Ticket", &[a1, missing])),
            ErrorKind::NotFound
        );
        assert_eq!(
            kind(graph.unlink("Person", &[missing], "has", "Ticket", &[a1])),
            ErrorKind::NotFound
        );
        // the failed call linked nothing, not even the valid pair
        assert_eq!(
            graph
                .edge_count(&LinkType::new("Person", "has", "Ticket"))
                .unwrap(),
            0
        );
    }

    #[test]
    fn test_traverse_errors() {
        let mut graph = create_test_graph();
        let ann = person(&mut graph, "Ann");

        assert!(
            graph
                .traverse("InvalidNode", &[ann], Direction::Forward, "has", "Ticket")
                .unwrap_err()
                .is_schema_violation()
        );
        assert!(
            graph
                .traverse("Person", &[ann], Direction::Forward, "has", "InvalidNode")
                .unwrap_err()
                .is_schema_violation()
        );
        assert!(
            graph
                .traverse("Person", &[ann], Direction::Forward, "holds", "Ticket")
                .unwrap_err()
                .is_schema_violation()
        );
        assert!(
            graph
                .traverse(
                    "Person",
                    &[NodeId::from_internal(7)],
                    Direction::Forward,
                    "has",
                    "Ticket"
                )
                .unwrap_err()
                .is_not_found()
        );
    }

    #[test]
    fn test_traverse_deduplicates() {
        let mut graph = create_test_graph();
        let ann = person(&mut graph, "Ann");
        let bob = person(&mut graph, "Bob");
        let a1 = ticket(&mut graph, "A1");
        graph.link("Person", &[ann, bob], "has", "Ticket", &[a1]).unwrap();

        assert_eq!(
            graph
                .traverse("Person", &[ann, bob, ann], Direction::Forward, "has", "Ticket")
                .unwrap(),
            vec![a1]
        );
    }

    #[test]
    fn test_traverse_shared_link_name() {
        let mut graph = create_test_graph();
        let date = Utc.with_ymd_and_hms(2024, 3, 9, 20, 0, 0).unwrap();
        let showing = graph
            .create(
                "Showing",
                vec![Attributes::new().with("date", date).with("theater", "Roxy")],
            )
            .unwrap();
        let movie = graph
            .create("Movie", vec![Attributes::new().with("title", "Heat")])
            .unwrap();
        let play = graph
            .create("Play", vec![Attributes::new().with("title", "Hamlet")])
            .unwrap();
        graph.link("Showing", &showing, "of", "Movie", &movie).unwrap();
        graph.link("Showing", &showing, "of", "Play", &play).unwrap();

        assert_eq!(
            graph
                .traverse("Showing", &showing, Direction::Forward, "of", "Movie")
                .unwrap(),
            movie
        );
        assert_eq!(
            graph
                .traverse("Showing", &showing, Direction::Forward, "of", "Play")
                .unwrap(),
            play
        );
    }

    #[test]
    fn test_delete_cascades_links() {
        let mut graph = create_test_graph();
        let ann = person(&mut graph, "Ann");
        let a1 = ticket(&mut graph, "A1");
        graph.link("Person", &[ann], "has", "Ticket", &[a1]).unwrap();

        graph.delete("Person", &[ann]).unwrap();

        assert!(!graph.contains("Person", ann));
        assert!(
            graph
                .traverse("Ticket", &[a1], Direction::Backward, "has", "Person")
                .unwrap()
                .is_empty()
        );
        let mentions_ann = graph
            .links()
            .forward()
            .entries()
            .chain(graph.links().backward().entries())
            .any(|(_, _, a, _, b)| a == ann || b == ann);
        assert!(!mentions_ann);
        assert_invariants(&graph);
    }

    #[test]
    fn test_delete_target_side_cascades() {
        let mut graph = create_test_graph();
        let ann = person(&mut graph, "Ann");
        let a1 = ticket(&mut graph, "A1");
        graph.link("Person", &[ann], "has", "Ticket", &[a1]).unwrap();

        graph.delete("Ticket", &[a1]).unwrap();

        assert!(
            graph
                .traverse("Person", &[ann], Direction::Forward, "has", "Ticket")
                .unwrap()
                .is_empty()
        );
        assert_invariants(&graph);
    }

    #[test]
    fn test_delete_errors() {
        let mut graph = create_test_graph();
        let ann = person(&mut graph, "Ann");

        assert!(matches!(
            graph.delete("Robot", &[ann]).unwrap_err(),
            Error::NodeTypeNotFound(_)
        ));
        let err = graph
            .delete("Person", &[ann, NodeId::from_internal(50)])
            .unwrap_err();
        assert!(err.is_not_found());
        // validation happens before anything is removed
        assert!(graph.contains("Person", ann));

        // duplicates in one call are fine
        graph.delete("Person", &[ann, ann]).unwrap();
        assert_eq!(graph.count("Person").unwrap(), 0);
    }

    #[test]
    fn test_ids_are_never_reused() {
        let mut graph = create_test_graph();
        let ann = person(&mut graph, "Ann");
        graph.delete("Person", &[ann]).unwrap();
        let bob = person(&mut graph, "Bob");
        assert_ne!(ann, bob);
        assert_eq!(bob.to_string(), "1");
    }

    #[test]
    fn test_snapshot_round_trip_in_memory() {
        let mut graph = create_test_graph();
        let ann = person(&mut graph, "Ann");
        let bob = person(&mut graph, "Bob");
        let a1 = ticket(&mut graph, "A1");
        graph.link("Person", &[ann, bob], "has", "Ticket", &[a1]).unwrap();

        let mut buf = Vec::new();
        graph.save_to(&mut buf).unwrap();

        let mut restored = Graph::new();
        restored.load_from(&mut buf.as_slice()).unwrap();

        assert!(restored.is_initialized());
        assert_eq!(restored.schema(), graph.schema());
        assert_eq!(
            restored.get("Person", Selection::All, &["id", "name"]).unwrap(),
            graph.get("Person", Selection::All, &["id", "name"]).unwrap()
        );
        assert_eq!(
            restored
                .traverse("Ticket", &[a1], Direction::Backward, "has", "Person")
                .unwrap(),
            vec![ann, bob]
        );
        // the counter came along
        assert_eq!(ticket(&mut restored, "A2").to_string(), "3");
    }

    #[test]
    fn test_failed_load_keeps_state() {
        let mut graph = create_test_graph();
        let ann = person(&mut graph, "Ann");

        let err = graph.load_from(&mut &b"garbage!garbage!"[..]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Persistence);
        assert!(graph.contains("Person", ann));
    }

    #[test]
    fn test_corrupt_body_keeps_state() {
        let mut graph = create_test_graph();
        let ann = person(&mut graph, "Ann");

        // valid header; the first node type name claims 2^46 bytes
        let mut buf = graphlet_storage::MAGIC.to_vec();
        buf.extend_from_slice(&graphlet_storage::FORMAT_VERSION.to_le_bytes());
        buf.push(1);
        buf.extend_from_slice(&1u64.to_le_bytes());
        buf.extend_from_slice(&(1u64 << 46).to_le_bytes());
        buf.extend_from_slice(b"Person");

        let err = graph.load_from(&mut buf.as_slice()).unwrap_err();
        assert!(matches!(err, Error::Deserialization(_)));
        assert_eq!(err.kind(), ErrorKind::Persistence);
        assert!(graph.is_initialized());
        assert_eq!(
            graph.get("Person", Selection::All, &["name"]).unwrap(),
            vec![vec![AttributeValue::from("Ann")]]
        );
        assert!(graph.contains("Person", ann));
    }

    #[test]
    fn test_snapshot_file() {
        let dir = TempDir::new().unwrap();
        let config = GraphConfig::new("theater")
            .with_snapshot(SnapshotOptions::for_testing(dir.path().join("theater.snapshot")));

        let mut graph = Graph::with_config(config.clone());
        graph.migrate(theater_schema()).unwrap();
        let ann = person(&mut graph, "Ann");
        graph.save().unwrap();

        let mut restored = Graph::with_config(config);
        restored.load().unwrap();
        assert_eq!(
            restored.get("Person", Selection::Ids(&[ann]), &["name"]).unwrap(),
            vec![vec![AttributeValue::from("Ann")]]
        );
    }

    #[test]
    fn test_save_without_snapshot_config() {
        let graph = create_test_graph();
        assert!(matches!(graph.save().unwrap_err(), Error::Configuration(_)));
    }

    #[derive(Debug, Clone)]
    enum Op {
        Link(usize, usize),
        Unlink(usize, usize),
        Delete(usize),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0..4usize, 0..4usize).prop_map(|(p, t)| Op::Link(p, t)),
            (0..4usize, 0..4usize).prop_map(|(p, t)| Op::Unlink(p, t)),
            (0..8usize).prop_map(Op::Delete),
        ]
    }

    proptest! {
        #[test]
        fn prop_index_stays_mirrored(ops in prop::collection::vec(op(), 0..40)) {
            let mut graph = create_test_graph();
            let people: Vec<NodeId> = (0..4).map(|i| person(&mut graph, &format!("p{i}"))).collect();
            let tickets: Vec<NodeId> = (0..4).map(|i| ticket(&mut graph, &format!("t{i}"))).collect();

            for op in ops {
                match op {
                    Op::Link(p, t) | Op::Unlink(p, t)
                        if !graph.contains("Person", people[p]) || !graph.contains("Ticket", tickets[t]) => {}
                    Op::Link(p, t) => {
                        graph.link("Person", &[people[p]], "has", "Ticket", &[tickets[t]]).unwrap();
                        graph.link("Person", &[people[p]], "has", "Ticket", &[tickets[t]]).unwrap();
                        prop_assert!(graph.links().contains(
                            &LinkType::new("Person", "has", "Ticket"),
                            people[p],
                            tickets[t]
                        ));
                    }
                    Op::Unlink(p, t) => {
                        graph.unlink("Person", &[people[p]], "has", "Ticket", &[tickets[t]]).unwrap();
                    }
                    Op::Delete(n) => {
                        let (node_type, id) = if n < 4 { ("Person", people[n]) } else { ("Ticket", tickets[n - 4]) };
                        if graph.contains(node_type, id) {
                            graph.delete(node_type, &[id]).unwrap();
                        }
                    }
                }
                assert_invariants(&graph);
            }

            let (forward, backward) = graph.links().edge_count(&LinkType::new("Person", "has", "Ticket"));
            prop_assert_eq!(forward, backward);
        }
    }
}
