//! Result Row Translator
//!
//! Turns one remote record into one [`MaterializedRow`]. Every column of a
//! record shares the row's graph, so an entity referenced from two columns is
//! one virtual object.

use std::collections::BTreeSet;

use tether_config::BridgeConfig;
use tracing::trace;

use crate::error::{CoreError, CoreResult};
use crate::graph::VirtualGraph;
use crate::materialize::{EndpointIndex, MaterializeOptions, Materializer};
use crate::row::MaterializedRow;
use crate::value::{RemoteRecord, RemoteValue};

#[derive(Debug, Clone, Copy, Default)]
pub struct RowTranslator {
    options: MaterializeOptions,
}

impl RowTranslator {
    pub fn new(options: MaterializeOptions) -> Self {
        Self { options }
    }

    pub fn from_config(config: &BridgeConfig) -> Self {
        Self::new(MaterializeOptions::from_config(config))
    }

    pub fn options(&self) -> MaterializeOptions {
        self.options
    }

    /// Remote ids of relationship endpoints that need fetching before
    /// `translate` can attach their properties.
    ///
    /// Empty unless endpoint properties were requested in virtual mode. Ids of
    /// nodes that appear in full anywhere in the record are not reported.
    pub fn missing_endpoints(&self, record: &RemoteRecord) -> Vec<i64> {
        if !self.options.wants_endpoint_data() {
            return Vec::new();
        }

        let mut known = BTreeSet::new();
        let mut wanted = BTreeSet::new();
        for value in record.values() {
            scan(value, &mut known, &mut wanted);
        }
        wanted.difference(&known).copied().collect()
    }

    /// Translate one record into a row with its own virtual graph
    pub fn translate(
        &self,
        record: RemoteRecord,
        endpoints: &EndpointIndex,
    ) -> CoreResult<MaterializedRow> {
        let mut graph = VirtualGraph::new();
        let mut columns = Vec::with_capacity(record.len());

        let mut materializer = Materializer::new(self.options, &mut graph, endpoints);
        for (key, value) in record {
            let out = materializer
                .materialize(&value)
                .map_err(|e| CoreError::in_column(&key, e))?;
            columns.push((key, out));
        }

        trace!(
            columns = columns.len(),
            nodes = graph.node_count(),
            relationships = graph.relationship_count(),
            "Translated record"
        );
        Ok(MaterializedRow::new(columns, graph))
    }
}

fn scan(value: &RemoteValue, known: &mut BTreeSet<i64>, wanted: &mut BTreeSet<i64>) {
    match value {
        RemoteValue::Node(node) => {
            known.insert(node.id);
        }
        RemoteValue::Relationship(rel) => {
            for (id, embedded) in [(rel.start_id, &rel.start_node), (rel.end_id, &rel.end_node)] {
                match embedded {
                    Some(node) if node.id == id => {
                        known.insert(id);
                    }
                    _ => {
                        wanted.insert(id);
                    }
                }
            }
        }
        RemoteValue::Path(path) => known.extend(path.nodes().iter().map(|n| n.id)),
        RemoteValue::List(items) => items.iter().for_each(|v| scan(v, known, wanted)),
        RemoteValue::Map(map) => map.values().for_each(|v| scan(v, known, wanted)),
        _ => {}
    }
}
