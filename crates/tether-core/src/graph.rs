//! Virtual Graph Builder
//!
//! A per-row arena of virtual nodes and relationships with an index from
//! remote id to arena slot. Entities refer to each other through [`NodeRef`]
//! handles rather than pointers, so cycles in a path need no shared ownership.
//!
//! Identity rules:
//! - one remote node id maps to one [`VirtualNode`] for the lifetime of the graph
//! - the first full snapshot of a node wins; later snapshots are ignored
//! - a node first seen only as a relationship endpoint is a placeholder with no
//!   labels or properties, and is filled in place by the first full snapshot

use std::collections::{BTreeSet, HashMap};
use std::ops::Index;
use std::sync::atomic::{AtomicI64, Ordering};

use tracing::{debug, trace};

use crate::value::{PropertyMap, RemoteNode, RemoteRelationship, RemoteValue};

static NEXT_VIRTUAL_ID: AtomicI64 = AtomicI64::new(-1);

/// Allocate a process-unique virtual id. Virtual ids are negative, persisted ids never are.
pub fn allocate_virtual_id() -> i64 {
    NEXT_VIRTUAL_ID.fetch_sub(1, Ordering::Relaxed)
}

/// Handle to a node in a [`VirtualGraph`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeRef(usize);

/// Handle to a relationship in a [`VirtualGraph`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RelationshipRef(usize);

/// In-memory node that is never written to storage
#[derive(Debug, Clone, PartialEq)]
pub struct VirtualNode {
    id: i64,
    remote_id: i64,
    labels: BTreeSet<String>,
    properties: PropertyMap,
    hydrated: bool,
}

impl VirtualNode {
    /// Virtual (negative) id
    pub fn id(&self) -> i64 {
        self.id
    }

    /// Id of the remote node this was built from
    pub fn remote_id(&self) -> i64 {
        self.remote_id
    }

    pub fn labels(&self) -> &BTreeSet<String> {
        &self.labels
    }

    pub fn has_label(&self, label: &str) -> bool {
        self.labels.contains(label)
    }

    pub fn properties(&self) -> &PropertyMap {
        &self.properties
    }

    pub fn property(&self, key: &str) -> Option<&RemoteValue> {
        self.properties.get(key)
    }

    /// True while only the id is known
    pub fn is_placeholder(&self) -> bool {
        !self.hydrated
    }
}

/// In-memory relationship between two nodes of the same graph
#[derive(Debug, Clone, PartialEq)]
pub struct VirtualRelationship {
    id: i64,
    remote_id: i64,
    rel_type: String,
    start: NodeRef,
    end: NodeRef,
    properties: PropertyMap,
}

impl VirtualRelationship {
    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn remote_id(&self) -> i64 {
        self.remote_id
    }

    pub fn rel_type(&self) -> &str {
        &self.rel_type
    }

    pub fn start(&self) -> NodeRef {
        self.start
    }

    pub fn end(&self) -> NodeRef {
        self.end
    }

    pub fn properties(&self) -> &PropertyMap {
        &self.properties
    }

    pub fn property(&self, key: &str) -> Option<&RemoteValue> {
        self.properties.get(key)
    }
}

/// Arena owning every virtual entity materialized for one row
#[derive(Debug, Clone, Default)]
pub struct VirtualGraph {
    nodes: Vec<VirtualNode>,
    relationships: Vec<VirtualRelationship>,
    node_index: HashMap<i64, NodeRef>,
    relationship_index: HashMap<i64, RelationshipRef>,
}

impl VirtualGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a remote node, returning the existing handle if the id was seen before
    pub fn node(&mut self, remote: &RemoteNode) -> NodeRef {
        if let Some(&existing) = self.node_index.get(&remote.id) {
            let node = &mut self.nodes[existing.0];
            if !node.hydrated {
                trace!(remote_id = remote.id, "Hydrating placeholder node");
                node.labels = remote.labels.iter().cloned().collect();
                node.properties = remote.properties.clone();
                node.hydrated = true;
            } else if node.properties != remote.properties
                || node.labels.len() != remote.labels.len()
                || !remote.labels.iter().all(|l| node.labels.contains(l))
            {
                debug!(
                    remote_id = remote.id,
                    "Node changed within one row, keeping first snapshot"
                );
            }
            return existing;
        }

        self.insert_node(VirtualNode {
            id: allocate_virtual_id(),
            remote_id: remote.id,
            labels: remote.labels.iter().cloned().collect(),
            properties: remote.properties.clone(),
            hydrated: true,
        })
    }

    /// Handle for a node known only by id. Reuses any node already interned.
    pub fn placeholder(&mut self, remote_id: i64) -> NodeRef {
        if let Some(&existing) = self.node_index.get(&remote_id) {
            return existing;
        }
        self.insert_node(VirtualNode {
            id: allocate_virtual_id(),
            remote_id,
            labels: BTreeSet::new(),
            properties: PropertyMap::new(),
            hydrated: false,
        })
    }

    /// Intern a remote relationship between two nodes of this graph.
    ///
    /// A relationship id seen before returns the existing handle unchanged.
    pub fn relationship(
        &mut self,
        remote: &RemoteRelationship,
        start: NodeRef,
        end: NodeRef,
    ) -> RelationshipRef {
        if let Some(&existing) = self.relationship_index.get(&remote.id) {
            return existing;
        }

        let handle = RelationshipRef(self.relationships.len());
        self.relationships.push(VirtualRelationship {
            id: allocate_virtual_id(),
            remote_id: remote.id,
            rel_type: remote.rel_type.clone(),
            start,
            end,
            properties: remote.properties.clone(),
        });
        self.relationship_index.insert(remote.id, handle);
        handle
    }

    fn insert_node(&mut self, node: VirtualNode) -> NodeRef {
        let handle = NodeRef(self.nodes.len());
        self.node_index.insert(node.remote_id, handle);
        self.nodes.push(node);
        handle
    }

    /// Handle of the node built from `remote_id`, if any
    pub fn lookup(&self, remote_id: i64) -> Option<NodeRef> {
        self.node_index.get(&remote_id).copied()
    }

    pub fn lookup_relationship(&self, remote_id: i64) -> Option<RelationshipRef> {
        self.relationship_index.get(&remote_id).copied()
    }

    pub fn get_node(&self, handle: NodeRef) -> Option<&VirtualNode> {
        self.nodes.get(handle.0)
    }

    pub fn get_relationship(&self, handle: RelationshipRef) -> Option<&VirtualRelationship> {
        self.relationships.get(handle.0)
    }

    pub fn start_node(&self, rel: RelationshipRef) -> Option<&VirtualNode> {
        self.get_relationship(rel)
            .and_then(|r| self.get_node(r.start))
    }

    pub fn end_node(&self, rel: RelationshipRef) -> Option<&VirtualNode> {
        self.get_relationship(rel).and_then(|r| self.get_node(r.end))
    }

    pub fn nodes(&self) -> impl Iterator<Item = &VirtualNode> {
        self.nodes.iter()
    }

    pub fn relationships(&self) -> impl Iterator<Item = &VirtualRelationship> {
        self.relationships.iter()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn relationship_count(&self) -> usize {
        self.relationships.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.relationships.is_empty()
    }
}

impl Index<NodeRef> for VirtualGraph {
    type Output = VirtualNode;

    /// Panics if the handle belongs to another graph
    fn index(&self, handle: NodeRef) -> &VirtualNode {
        &self.nodes[handle.0]
    }
}

impl Index<RelationshipRef> for VirtualGraph {
    type Output = VirtualRelationship;

    fn index(&self, handle: RelationshipRef) -> &VirtualRelationship {
        &self.relationships[handle.0]
    }
}
