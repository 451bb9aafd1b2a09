//! Entity Materializer
//!
//! Converts classified remote values into row values. Scalars, lists and maps
//! convert structurally in both modes; nodes, relationships and paths become
//! either plain maps or handles into the row's [`VirtualGraph`].

use std::collections::{BTreeMap, HashMap};

use tether_config::BridgeConfig;

use crate::classify::{classify, Classified};
use crate::error::UnsupportedVariant;
use crate::graph::{NodeRef, RelationshipRef, VirtualGraph};
use crate::value::{
    IsoDuration, PathEntity, Point, PropertyMap, RemoteNode, RemotePath, RemoteRelationship,
    RemoteValue, Temporal,
};

/// Endpoint nodes fetched separately from the record, keyed by remote id
pub type EndpointIndex = HashMap<i64, RemoteNode>;

/// Entity output shape
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MaterializeMode {
    /// Entities become `{entityType, ...}` maps
    #[default]
    Map,
    /// Entities become virtual graph objects
    Virtual,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MaterializeOptions {
    pub mode: MaterializeMode,
    /// Give virtual relationship endpoints their full property sets
    pub attach_endpoint_properties: bool,
}

impl MaterializeOptions {
    pub fn from_config(config: &BridgeConfig) -> Self {
        Self {
            mode: if config.virtual_entities {
                MaterializeMode::Virtual
            } else {
                MaterializeMode::Map
            },
            attach_endpoint_properties: config.with_relationship_node_properties,
        }
    }

    /// Whether endpoint nodes missing from a record should be fetched
    pub fn wants_endpoint_data(&self) -> bool {
        self.mode == MaterializeMode::Virtual && self.attach_endpoint_properties
    }
}

/// A materialized column value
#[derive(Debug, Clone, PartialEq)]
pub enum RowValue {
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Bytes(Vec<u8>),
    List(Vec<RowValue>),
    Map(BTreeMap<String, RowValue>),
    Point(Point),
    Duration(IsoDuration),
    Temporal(Temporal),
    Node(NodeRef),
    Relationship(RelationshipRef),
}

impl RowValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[RowValue]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, RowValue>> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_node(&self) -> Option<NodeRef> {
        match self {
            Self::Node(handle) => Some(*handle),
            _ => None,
        }
    }

    pub fn as_relationship(&self) -> Option<RelationshipRef> {
        match self {
            Self::Relationship(handle) => Some(*handle),
            _ => None,
        }
    }

    /// Map lookup, `None` for non-maps
    pub fn get(&self, key: &str) -> Option<&RowValue> {
        self.as_map().and_then(|m| m.get(key))
    }
}

impl From<&str> for RowValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<i64> for RowValue {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

/// Materializes the values of one row into one graph
pub struct Materializer<'a> {
    options: MaterializeOptions,
    graph: &'a mut VirtualGraph,
    endpoints: &'a EndpointIndex,
}

impl<'a> Materializer<'a> {
    pub fn new(
        options: MaterializeOptions,
        graph: &'a mut VirtualGraph,
        endpoints: &'a EndpointIndex,
    ) -> Self {
        Self {
            options,
            graph,
            endpoints,
        }
    }

    pub fn materialize(
        &mut self,
        value: &RemoteValue,
    ) -> Result<RowValue, UnsupportedVariant> {
        Ok(match classify(value)? {
            Classified::Null => RowValue::Null,
            Classified::Boolean(b) => RowValue::Boolean(b),
            Classified::Integer(i) => RowValue::Integer(i),
            Classified::Float(f) => RowValue::Float(f),
            Classified::String(s) => RowValue::String(s.to_string()),
            Classified::Bytes(b) => RowValue::Bytes(b.to_vec()),
            Classified::List(items) => RowValue::List(
                items
                    .iter()
                    .map(|item| self.materialize(item))
                    .collect::<Result<_, _>>()?,
            ),
            Classified::Map(map) => RowValue::Map(self.properties(map)?),
            Classified::Point(point) => RowValue::Point(*point),
            Classified::Duration(duration) => RowValue::Duration(*duration),
            Classified::Temporal(temporal) => RowValue::Temporal(temporal.clone()),
            Classified::Node(node) => match self.options.mode {
                MaterializeMode::Map => self.node_map(node)?,
                MaterializeMode::Virtual => RowValue::Node(self.graph.node(node)),
            },
            Classified::Relationship(rel) => match self.options.mode {
                MaterializeMode::Map => self.relationship_map(rel)?,
                MaterializeMode::Virtual => RowValue::Relationship(self.virtual_relationship(rel)),
            },
            Classified::Path(path) => self.path(path)?,
        })
    }

    fn properties(&mut self, map: &PropertyMap) -> Result<BTreeMap<String, RowValue>, UnsupportedVariant> {
        map.iter()
            .map(|(k, v)| self.materialize(v).map(|m| (k.clone(), m)))
            .collect()
    }

    fn node_map(&mut self, node: &RemoteNode) -> Result<RowValue, UnsupportedVariant> {
        let mut map = BTreeMap::new();
        map.insert("entityType".to_string(), RowValue::from("NODE"));
        map.insert(
            "labels".to_string(),
            RowValue::List(node.labels.iter().map(|l| RowValue::from(l.as_str())).collect()),
        );
        map.insert(
            "properties".to_string(),
            RowValue::Map(self.properties(&node.properties)?),
        );
        Ok(RowValue::Map(map))
    }

    fn relationship_map(&mut self, rel: &RemoteRelationship) -> Result<RowValue, UnsupportedVariant> {
        let mut map = BTreeMap::new();
        map.insert("entityType".to_string(), RowValue::from("RELATIONSHIP"));
        map.insert("start".to_string(), RowValue::Integer(rel.start_id));
        map.insert("end".to_string(), RowValue::Integer(rel.end_id));
        map.insert("type".to_string(), RowValue::from(rel.rel_type.as_str()));
        map.insert(
            "properties".to_string(),
            RowValue::Map(self.properties(&rel.properties)?),
        );
        Ok(RowValue::Map(map))
    }

    fn virtual_relationship(&mut self, rel: &RemoteRelationship) -> RelationshipRef {
        if let Some(existing) = self.graph.lookup_relationship(rel.id) {
            return existing;
        }
        let start = self.endpoint(rel.start_id, rel.start_node.as_ref());
        let end = self.endpoint(rel.end_id, rel.end_node.as_ref());
        self.graph.relationship(rel, start, end)
    }

    fn endpoint(&mut self, remote_id: i64, embedded: Option<&RemoteNode>) -> NodeRef {
        if self.options.attach_endpoint_properties {
            if let Some(node) = embedded.filter(|n| n.id == remote_id) {
                return self.graph.node(node);
            }
            if let Some(node) = self.endpoints.get(&remote_id) {
                return self.graph.node(node);
            }
        }
        self.graph.placeholder(remote_id)
    }

    fn path(&mut self, path: &RemotePath) -> Result<RowValue, UnsupportedVariant> {
        if self.options.mode == MaterializeMode::Map {
            let mut out = Vec::with_capacity(path.len() * 2 + 1);
            for entity in path.entities() {
                out.push(match entity {
                    PathEntity::Node(node) => self.node_map(node)?,
                    PathEntity::Relationship(rel) => self.relationship_map(rel)?,
                });
            }
            return Ok(RowValue::List(out));
        }

        // Intern every node first so relationships resolve to full nodes, not placeholders
        let nodes: Vec<NodeRef> = path.nodes().iter().map(|n| self.graph.node(n)).collect();

        let mut out = Vec::with_capacity(nodes.len() + path.len());
        out.push(RowValue::Node(nodes[0]));
        for (i, rel) in path.relationships().iter().enumerate() {
            let (a, b) = (nodes[i], nodes[i + 1]);
            let (start, end) = if rel.start_id == path.nodes()[i].id {
                (a, b)
            } else {
                (b, a)
            };
            let handle = match self.graph.lookup_relationship(rel.id) {
                Some(existing) => existing,
                None => self.graph.relationship(rel, start, end),
            };
            out.push(RowValue::Relationship(handle));
            out.push(RowValue::Node(b));
        }
        Ok(RowValue::List(out))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person(id: i64, name: &str) -> RemoteNode {
        RemoteNode::new(id, ["Person"])
            .with_property("name", name)
            .with_property("age", 54)
    }

    fn run(options: MaterializeOptions, value: &RemoteValue) -> (RowValue, VirtualGraph) {
        let mut graph = VirtualGraph::new();
        let endpoints = EndpointIndex::new();
        let out = Materializer::new(options, &mut graph, &endpoints)
            .materialize(value)
            .unwrap();
        (out, graph)
    }

    fn virtual_mode() -> MaterializeOptions {
        MaterializeOptions {
            mode: MaterializeMode::Virtual,
            attach_endpoint_properties: false,
        }
    }

    #[test]
    fn test_node_map_shape() {
        let (out, graph) = run(
            MaterializeOptions::default(),
            &RemoteValue::from(person(1, "Michael Jordan")),
        );

        assert!(graph.is_empty());
        assert_eq!(out.get("entityType"), Some(&RowValue::from("NODE")));
        assert_eq!(
            out.get("labels"),
            Some(&RowValue::List(vec![RowValue::from("Person")]))
        );
        assert_eq!(
            out.get("properties").and_then(|p| p.get("name")),
            Some(&RowValue::from("Michael Jordan"))
        );
        assert!(out.get("id").is_none());
    }

    #[test]
    fn test_relationship_map_shape() {
        let rel = RemoteRelationship::new(5, "KNOWS", 1, 2).with_property("since", 1993);
        let (out, _) = run(MaterializeOptions::default(), &RemoteValue::from(rel));

        assert_eq!(out.get("entityType"), Some(&RowValue::from("RELATIONSHIP")));
        assert_eq!(out.get("start"), Some(&RowValue::Integer(1)));
        assert_eq!(out.get("end"), Some(&RowValue::Integer(2)));
        assert_eq!(out.get("type"), Some(&RowValue::from("KNOWS")));
        assert_eq!(
            out.get("properties").and_then(|p| p.get("since")),
            Some(&RowValue::Integer(1993))
        );
    }

    #[test]
    fn test_virtual_relationship_without_attach_has_empty_endpoints() {
        let rel = RemoteRelationship::new(5, "KNOWS", 1, 2)
            .with_endpoints(person(1, "a"), person(2, "b"));
        let (out, graph) = run(virtual_mode(), &RemoteValue::from(rel));

        let handle = out.as_relationship().unwrap();
        assert!(graph.start_node(handle).unwrap().properties().is_empty());
        assert!(graph.end_node(handle).unwrap().properties().is_empty());
    }

    #[test]
    fn test_virtual_relationship_with_attach_uses_embedded_nodes() {
        let rel = RemoteRelationship::new(5, "KNOWS", 1, 2)
            .with_endpoints(person(1, "a"), person(2, "b"));
        let options = MaterializeOptions {
            attach_endpoint_properties: true,
            ..virtual_mode()
        };
        let (out, graph) = run(options, &RemoteValue::from(rel));

        let handle = out.as_relationship().unwrap();
        let start = graph.start_node(handle).unwrap();
        assert_eq!(start.property("name"), Some(&RemoteValue::from("a")));
        assert!(start.has_label("Person"));
        assert_eq!(
            graph.end_node(handle).unwrap().property("name"),
            Some(&RemoteValue::from("b"))
        );
    }

    #[test]
    fn test_attach_falls_back_to_fetched_endpoints() {
        let rel = RemoteRelationship::new(5, "KNOWS", 1, 2);
        let options = MaterializeOptions {
            attach_endpoint_properties: true,
            ..virtual_mode()
        };
        let mut endpoints = EndpointIndex::new();
        endpoints.insert(2, person(2, "fetched"));

        let mut graph = VirtualGraph::new();
        let out = Materializer::new(options, &mut graph, &endpoints)
            .materialize(&RemoteValue::from(rel))
            .unwrap();

        let handle = out.as_relationship().unwrap();
        assert!(graph.start_node(handle).unwrap().is_placeholder());
        assert_eq!(
            graph.end_node(handle).unwrap().property("name"),
            Some(&RemoteValue::from("fetched"))
        );
    }

    #[test]
    fn test_virtual_path_shares_repeated_node() {
        let path = RemotePath::start(person(1, "a"))
            .push(RemoteRelationship::new(10, "KNOWS", 1, 2), person(2, "b"))
            .unwrap()
            .push(RemoteRelationship::new(11, "KNOWS", 2, 1), person(1, "a"))
            .unwrap();

        let (out, graph) = run(virtual_mode(), &RemoteValue::from(path));
        let items = out.as_list().unwrap();

        assert_eq!(items.len(), 5);
        assert_eq!(items[0], items[4]);
        assert_eq!(graph.node_count(), 2);

        let back = items[3].as_relationship().unwrap();
        assert_eq!(graph[back].start(), items[2].as_node().unwrap());
        assert_eq!(graph[back].end(), items[0].as_node().unwrap());
        assert!(!graph[graph[back].end()].is_placeholder());
    }

    #[test]
    fn test_map_path_alternates() {
        let path = RemotePath::start(person(1, "a"))
            .push(RemoteRelationship::new(10, "KNOWS", 1, 2), person(2, "b"))
            .unwrap();
        let (out, _) = run(MaterializeOptions::default(), &RemoteValue::from(path));
        let items = out.as_list().unwrap();

        let types: Vec<_> = items
            .iter()
            .map(|i| i.get("entityType").and_then(RowValue::as_str).unwrap())
            .collect();
        assert_eq!(types, ["NODE", "RELATIONSHIP", "NODE"]);
    }

    #[test]
    fn test_nested_unknown_surfaces() {
        let value = RemoteValue::List(vec![
            RemoteValue::from(1),
            RemoteValue::Unknown {
                type_name: "VECTOR".to_string(),
            },
        ]);
        let mut graph = VirtualGraph::new();
        let endpoints = EndpointIndex::new();
        let err = Materializer::new(MaterializeOptions::default(), &mut graph, &endpoints)
            .materialize(&value)
            .unwrap_err();
        assert_eq!(err.type_name, "VECTOR");
    }

    #[test]
    fn test_options_from_config() {
        let config = BridgeConfig {
            virtual_entities: true,
            with_relationship_node_properties: true,
            ..Default::default()
        };
        let options = MaterializeOptions::from_config(&config);
        assert_eq!(options.mode, MaterializeMode::Virtual);
        assert!(options.wants_endpoint_data());
        assert!(!MaterializeOptions::default().wants_endpoint_data());
    }
}
