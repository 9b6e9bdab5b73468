//! Bidirectional link index
//!
//! Every edge lives twice: once in the forward orientation, anchored at its
//! source node, and once in the backward orientation, anchored at its
//! target node. Both orientations share the same shape:
//!
//! ```text
//! link name -> anchor node type -> anchor id -> other node type -> {other ids}
//! ```
//!
//! Empty per-node containers are pruned eagerly, so an empty bucket means
//! the link has no live edges there. Per-(link, anchor type) buckets exist
//! exactly as long as a registered link type needs them.

use graphlet_core::{Direction, LinkType, NodeId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Neighbors of one anchor node, grouped by the node type at the far end
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Neighbors {
    by_type: BTreeMap<String, BTreeSet<NodeId>>,
}

impl Neighbors {
    /// Neighbor ids of type `node_type`
    pub fn of_type(&self, node_type: &str) -> Option<&BTreeSet<NodeId>> {
        self.by_type.get(node_type)
    }

    /// All (node type, id) pairs
    pub fn iter(&self) -> impl Iterator<Item = (&String, NodeId)> {
        self.by_type
            .iter()
            .flat_map(|(node_type, ids)| ids.iter().map(move |id| (node_type, *id)))
    }

    /// Total neighbor count across types
    pub fn len(&self) -> usize {
        self.by_type.values().map(BTreeSet::len).sum()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.by_type.is_empty()
    }
}

/// Edges of one link name anchored at one node type
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchorBucket {
    edges: BTreeMap<NodeId, Neighbors>,
}

impl AnchorBucket {
    /// Neighbors of `anchor`
    pub fn neighbors(&self, anchor: NodeId) -> Option<&Neighbors> {
        self.edges.get(&anchor)
    }

    /// Number of edges whose far end has type `other_type`
    pub fn count_to(&self, other_type: &str) -> usize {
        self.edges
            .values()
            .filter_map(|n| n.of_type(other_type))
            .map(BTreeSet::len)
            .sum()
    }

    /// Check if the bucket holds no edges at all
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

/// One orientation of the index
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Orientation {
    links: BTreeMap<String, BTreeMap<String, AnchorBucket>>,
}

impl Orientation {
    /// Bucket for (link name, anchor type)
    pub fn bucket(&self, link: &str, anchor_type: &str) -> Option<&AnchorBucket> {
        self.links.get(link)?.get(anchor_type)
    }

    /// Check if any bucket exists for `link`
    pub fn has_link(&self, link: &str) -> bool {
        self.links.contains_key(link)
    }

    /// Neighbor ids of type `other_type` reachable from `anchor`
    pub fn neighbors_of_type(
        &self,
        link: &str,
        anchor_type: &str,
        anchor: NodeId,
        other_type: &str,
    ) -> Option<&BTreeSet<NodeId>> {
        self.bucket(link, anchor_type)?
            .neighbors(anchor)?
            .of_type(other_type)
    }

    /// Iterate over every stored entry as
    /// (link, anchor type, anchor id, other type, other id)
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str, NodeId, &str, NodeId)> {
        self.links.iter().flat_map(|(link, anchors)| {
            anchors.iter().flat_map(move |(anchor_type, bucket)| {
                bucket.edges.iter().flat_map(move |(anchor, neighbors)| {
                    neighbors.iter().map(move |(other_type, other)| {
                        (
                            link.as_str(),
                            anchor_type.as_str(),
                            *anchor,
                            other_type.as_str(),
                            other,
                        )
                    })
                })
            })
        })
    }

    fn install(&mut self, link: &str, anchor_type: &str) {
        self.links
            .entry(link.to_string())
            .or_default()
            .entry(anchor_type.to_string())
            .or_default();
    }

    fn drop_bucket(&mut self, link: &str, anchor_type: &str) {
        if let Some(anchors) = self.links.get_mut(link) {
            anchors.remove(anchor_type);
            if anchors.is_empty() {
                self.links.remove(link);
            }
        }
    }

    fn insert(
        &mut self,
        link: &str,
        anchor_type: &str,
        anchor: NodeId,
        other_type: &str,
        other: NodeId,
    ) -> bool {
        self.links
            .entry(link.to_string())
            .or_default()
            .entry(anchor_type.to_string())
            .or_default()
            .edges
            .entry(anchor)
            .or_default()
            .by_type
            .entry(other_type.to_string())
            .or_default()
            .insert(other)
    }

    fn remove(
        &mut self,
        link: &str,
        anchor_type: &str,
        anchor: NodeId,
        other_type: &str,
        other: NodeId,
    ) -> bool {
        let Some(bucket) = self
            .links
            .get_mut(link)
            .and_then(|anchors| anchors.get_mut(anchor_type))
        else {
            return false;
        };
        let Some(neighbors) = bucket.edges.get_mut(&anchor) else {
            return false;
        };
        let Some(ids) = neighbors.by_type.get_mut(other_type) else {
            return false;
        };

        let removed = ids.remove(&other);
        if ids.is_empty() {
            neighbors.by_type.remove(other_type);
        }
        if neighbors.is_empty() {
            bucket.edges.remove(&anchor);
        }
        removed
    }
}

/// Forward and backward orientations plus the node type → link name side index
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkIndex {
    forward: Orientation,
    backward: Orientation,
    /// node type → names of links it takes part in, as source or target
    participation: BTreeMap<String, BTreeSet<String>>,
}

impl LinkIndex {
    /// Create an empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// The forward orientation (anchored at sources)
    pub fn forward(&self) -> &Orientation {
        &self.forward
    }

    /// The backward orientation (anchored at targets)
    pub fn backward(&self) -> &Orientation {
        &self.backward
    }

    /// Orientation used when traversing in `direction`
    pub fn orientation(&self, direction: Direction) -> &Orientation {
        match direction {
            Direction::Forward => &self.forward,
            Direction::Backward => &self.backward,
        }
    }

    /// Link names `node_type` takes part in
    pub fn link_names_for(&self, node_type: &str) -> impl Iterator<Item = &String> {
        self.participation
            .get(node_type)
            .into_iter()
            .flat_map(|names| names.iter())
    }

    /// Check if `source → target` is recorded under `link`
    pub fn contains(&self, link: &LinkType, source: NodeId, target: NodeId) -> bool {
        self.forward
            .neighbors_of_type(&link.name, &link.source, source, &link.target)
            .is_some_and(|ids| ids.contains(&target))
    }

    /// Live edge counts of one link type as (forward, backward)
    pub fn edge_count(&self, link: &LinkType) -> (usize, usize) {
        let forward = self
            .forward
            .bucket(&link.name, &link.source)
            .map_or(0, |b| b.count_to(&link.target));
        let backward = self
            .backward
            .bucket(&link.name, &link.target)
            .map_or(0, |b| b.count_to(&link.source));
        (forward, backward)
    }

    /// Record `source → target`; returns false if it was already present
    pub(crate) fn link(&mut self, link: &LinkType, source: NodeId, target: NodeId) -> bool {
        let added = self
            .forward
            .insert(&link.name, &link.source, source, &link.target, target);
        self.backward
            .insert(&link.name, &link.target, target, &link.source, source);
        added
    }

    /// Forget `source → target`; returns false if it was absent
    pub(crate) fn unlink(&mut self, link: &LinkType, source: NodeId, target: NodeId) -> bool {
        let removed = self
            .forward
            .remove(&link.name, &link.source, source, &link.target, target);
        self.backward
            .remove(&link.name, &link.target, target, &link.source, source);
        removed
    }

    /// Every edge touching `id` of `node_type`, in either orientation
    pub fn incident_edges(&self, node_type: &str, id: NodeId) -> Vec<(LinkType, NodeId, NodeId)> {
        let mut edges = Vec::new();
        for name in self.link_names_for(node_type) {
            if let Some(neighbors) = self
                .forward
                .bucket(name, node_type)
                .and_then(|b| b.neighbors(id))
            {
                for (target_type, target) in neighbors.iter() {
                    edges.push((LinkType::new(node_type, name.as_str(), target_type.as_str()), id, target));
                }
            }
            if let Some(neighbors) = self
                .backward
                .bucket(name, node_type)
                .and_then(|b| b.neighbors(id))
            {
                for (source_type, source) in neighbors.iter() {
                    edges.push((LinkType::new(source_type.as_str(), name.as_str(), node_type), source, id));
                }
            }
        }
        edges
    }

    /// Remove every edge touching `id`; returns the number of edges removed
    pub(crate) fn cascade_remove(&mut self, node_type: &str, id: NodeId) -> usize {
        let mut removed = 0;
        for (link, source, target) in self.incident_edges(node_type, id) {
            // a self-loop shows up in both orientations; the second unlink is a no-op
            if self.unlink(&link, source, target) {
                removed += 1;
            }
        }
        if removed > 0 {
            debug!("Cascade removed {} links of {} {}", removed, node_type, id);
        }
        removed
    }

    /// Install the empty buckets and side-index entries for a new link type
    pub(crate) fn install_link_type(&mut self, link: &LinkType) {
        self.forward.install(&link.name, &link.source);
        self.backward.install(&link.name, &link.target);
        for endpoint in [&link.source, &link.target] {
            self.participation
                .entry(endpoint.clone())
                .or_default()
                .insert(link.name.clone());
        }
    }

    /// Drop the buckets and side-index entries of a removed link type
    ///
    /// `remaining` is the link-type set after removal; anything a remaining
    /// type still needs (a sibling triple sharing the name and an endpoint)
    /// is kept.
    pub(crate) fn remove_link_type(&mut self, link: &LinkType, remaining: &BTreeSet<LinkType>) {
        let siblings: Vec<&LinkType> = remaining.iter().filter(|l| l.name == link.name).collect();

        if !siblings.iter().any(|l| l.source == link.source) {
            self.forward.drop_bucket(&link.name, &link.source);
        }
        if !siblings.iter().any(|l| l.target == link.target) {
            self.backward.drop_bucket(&link.name, &link.target);
        }

        for endpoint in [&link.source, &link.target] {
            if siblings.iter().any(|l| l.touches(endpoint)) {
                continue;
            }
            if let Some(names) = self.participation.get_mut(endpoint) {
                names.remove(&link.name);
                if names.is_empty() {
                    self.participation.remove(endpoint);
                }
            }
        }
    }

    /// Forget the side-index entry of a removed node type
    pub(crate) fn remove_node_type(&mut self, node_type: &str) {
        self.participation.remove(node_type);
    }
}
