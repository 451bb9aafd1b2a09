//! Materialized rows

use crate::graph::{VirtualGraph, VirtualNode, VirtualRelationship};
use crate::materialize::RowValue;
use crate::value::SummaryCounters;

/// One translated result row and the virtual graph its entities live in.
///
/// The graph belongs to the row alone; two rows never share entities even
/// when they were built from the same remote ids.
#[derive(Debug, Clone, Default)]
pub struct MaterializedRow {
    columns: Vec<(String, RowValue)>,
    graph: VirtualGraph,
}

impl MaterializedRow {
    pub fn new(columns: Vec<(String, RowValue)>, graph: VirtualGraph) -> Self {
        Self { columns, graph }
    }

    /// Column names in result order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(k, _)| k.as_str())
    }

    pub fn columns(&self) -> &[(String, RowValue)] {
        &self.columns
    }

    pub fn get(&self, column: &str) -> Option<&RowValue> {
        self.columns
            .iter()
            .find(|(k, _)| k == column)
            .map(|(_, v)| v)
    }

    /// The virtual node in `column`, if the column holds one
    pub fn node(&self, column: &str) -> Option<&VirtualNode> {
        self.get(column)
            .and_then(RowValue::as_node)
            .and_then(|handle| self.graph.get_node(handle))
    }

    /// The virtual relationship in `column`, if the column holds one
    pub fn relationship(&self, column: &str) -> Option<&VirtualRelationship> {
        self.get(column)
            .and_then(RowValue::as_relationship)
            .and_then(|handle| self.graph.get_relationship(handle))
    }

    pub fn graph(&self) -> &VirtualGraph {
        &self.graph
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn into_parts(self) -> (Vec<(String, RowValue)>, VirtualGraph) {
        (self.columns, self.graph)
    }
}

impl SummaryCounters {
    /// The single row reported in statistics mode
    pub fn to_row(&self) -> MaterializedRow {
        let columns = self
            .entries()
            .into_iter()
            .map(|(name, value)| (name.to_string(), RowValue::Integer(value)))
            .collect();
        MaterializedRow::new(columns, VirtualGraph::new())
    }
}
