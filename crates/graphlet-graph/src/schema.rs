//! Schema definitions and the schema registry

use graphlet_core::{AttributeType, Attributes, Error, LinkType, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Name of the identifier pseudo-attribute accepted by [`crate::Graph::get`]
pub const ID_ATTRIBUTE: &str = "id";

/// Attribute name → declared type for one node type
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttributeSchema(BTreeMap<String, AttributeType>);

impl AttributeSchema {
    /// Create an empty attribute schema
    pub fn new() -> Self {
        Self::default()
    }

    /// Declared type of `name`
    pub fn get(&self, name: &str) -> Option<AttributeType> {
        self.0.get(name).copied()
    }

    /// Check if an attribute is declared
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Number of declared attributes
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over declarations in name order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &AttributeType)> {
        self.0.iter()
    }

    /// Check that `attrs` has exactly the declared keys with matching types
    ///
    /// `index` is the position of the attribute set within its batch and
    /// only ends up in error messages.
    pub fn validate(&self, node_type: &str, index: usize, attrs: &Attributes) -> Result<()> {
        for (name, expected) in &self.0 {
            let value = attrs.get(name).ok_or_else(|| Error::MissingAttribute {
                node_type: node_type.to_string(),
                attribute: name.clone(),
                index,
            })?;
            let found = value.attribute_type();
            if found != *expected {
                return Err(Error::TypeMismatch {
                    node_type: node_type.to_string(),
                    attribute: name.clone(),
                    index,
                    expected: expected.to_string(),
                    found: found.to_string(),
                });
            }
        }

        // every declared key is present, so a size difference means extras
        if attrs.len() != self.0.len() {
            if let Some(extra) = attrs.keys().find(|k| !self.0.contains_key(k.as_str())) {
                return Err(Error::UnknownAttribute {
                    node_type: node_type.to_string(),
                    attribute: extra.clone(),
                });
            }
        }
        Ok(())
    }
}

impl<K: Into<String>> FromIterator<(K, AttributeType)> for AttributeSchema {
    fn from_iter<I: IntoIterator<Item = (K, AttributeType)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, t)| (k.into(), t)).collect())
    }
}

/// A complete schema: node types and link types
///
/// Serializes to the document form
/// `{"nodes": {"Person": {"name": "string"}}, "links": [["Person", "has", "Ticket"]]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    /// Node types by name
    #[serde(default)]
    pub nodes: BTreeMap<String, AttributeSchema>,

    /// Registered link types
    #[serde(default)]
    pub links: BTreeSet<LinkType>,
}

impl Schema {
    /// Create a new empty schema
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: declare a node type
    pub fn node<N, I, K>(mut self, name: N, attributes: I) -> Self
    where
        N: Into<String>,
        I: IntoIterator<Item = (K, AttributeType)>,
        K: Into<String>,
    {
        self.nodes
            .insert(name.into(), attributes.into_iter().collect());
        self
    }

    /// Builder: declare a link type
    pub fn link<S, N, T>(mut self, source: S, name: N, target: T) -> Self
    where
        S: Into<String>,
        N: Into<String>,
        T: Into<String>,
    {
        self.links.insert(LinkType::new(source, name, target));
        self
    }

    /// Parse a schema document
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::InvalidSchema(e.to_string()))
    }

    /// Render as a schema document
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Check the schema is internally consistent
    ///
    /// Every link endpoint must be a declared node type, names must be
    /// non-empty, and no node type may declare the `id` pseudo-attribute.
    pub fn validate(&self) -> Result<()> {
        for (name, attributes) in &self.nodes {
            if name.is_empty() {
                return Err(Error::InvalidSchema("empty node type name".to_string()));
            }
            if attributes.contains(ID_ATTRIBUTE) {
                return Err(Error::InvalidSchema(format!(
                    "node type {} declares reserved attribute '{}'",
                    name, ID_ATTRIBUTE
                )));
            }
        }

        for link in &self.links {
            if link.name.is_empty() {
                return Err(Error::InvalidSchema(format!("empty link name in {}", link)));
            }
            for endpoint in [&link.source, &link.target] {
                if !self.nodes.contains_key(endpoint) {
                    return Err(Error::InvalidSchema(format!(
                        "link {} references undeclared node type {}",
                        link, endpoint
                    )));
                }
            }
        }
        Ok(())
    }
}

/// The installed schema, read-only outside of migrations
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaRegistry {
    schema: Schema,
}

impl SchemaRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// The installed schema
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Check if a node type is installed
    pub fn has_node_type(&self, node_type: &str) -> bool {
        self.schema.nodes.contains_key(node_type)
    }

    /// Check if the exact triple is installed
    pub fn has_link_type(&self, source: &str, name: &str, target: &str) -> bool {
        self.schema.links.contains(&LinkType::new(source, name, target))
    }

    /// Attribute schema of an installed node type
    pub fn attribute_schema_of(&self, node_type: &str) -> Option<&AttributeSchema> {
        self.schema.nodes.get(node_type)
    }

    /// Installed link types
    pub fn link_types(&self) -> &BTreeSet<LinkType> {
        &self.schema.links
    }

    /// Link types with `node_type` at either end
    pub fn link_types_touching<'a>(
        &'a self,
        node_type: &'a str,
    ) -> impl Iterator<Item = &'a LinkType> + 'a {
        self.schema.links.iter().filter(move |l| l.touches(node_type))
    }

    /// Fail with a schema violation unless `node_type` is installed
    pub fn require_node_type(&self, node_type: &str) -> Result<&AttributeSchema> {
        self.attribute_schema_of(node_type)
            .ok_or_else(|| Error::UnknownNodeType(node_type.to_string()))
    }

    /// Fail with a schema violation unless the triple is installed
    pub fn require_link_type(&self, source: &str, name: &str, target: &str) -> Result<LinkType> {
        let link = LinkType::new(source, name, target);
        if self.schema.links.contains(&link) {
            Ok(link)
        } else {
            Err(Error::UnknownLinkType {
                source_type: link.source,
                link: link.name,
                target_type: link.target,
            })
        }
    }

    // ========== Migration-only mutation ==========

    pub(crate) fn insert_node_type(&mut self, name: String, attributes: AttributeSchema) {
        self.schema.nodes.insert(name, attributes);
    }

    pub(crate) fn remove_node_type(&mut self, name: &str) -> Option<AttributeSchema> {
        self.schema.nodes.remove(name)
    }

    pub(crate) fn insert_link_type(&mut self, link: LinkType) {
        self.schema.links.insert(link);
    }

    pub(crate) fn remove_link_type(&mut self, link: &LinkType) -> bool {
        self.schema.links.remove(link)
    }
}
