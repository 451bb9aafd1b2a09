//! JSON rendering of rows and remote values
//!
//! Entities render as maps tagged with `entityType`. Virtual entities expose
//! their virtual ids; relationships point at their endpoints by virtual id.
//! Temporal values and durations render as ISO-8601 strings.

use serde_json::{json, Map, Number, Value};

use crate::graph::VirtualGraph;
use crate::materialize::RowValue;
use crate::row::MaterializedRow;
use crate::value::{PathEntity, Point, PropertyMap, RemoteValue};

impl MaterializedRow {
    /// Columns as a JSON object keyed by column name
    pub fn to_json(&self) -> Value {
        let mut out = Map::new();
        for (key, value) in self.columns() {
            out.insert(key.clone(), row_value_json(value, self.graph()));
        }
        Value::Object(out)
    }

    /// The caller-visible record shape: `{"row": {...}}`
    pub fn to_record_json(&self) -> Value {
        json!({ "row": self.to_json() })
    }
}

impl RemoteValue {
    /// JSON form of a value, with entities in their map shape
    pub fn to_json(&self) -> Value {
        match self {
            Self::Null | Self::Unknown { .. } => Value::Null,
            Self::Boolean(b) => Value::Bool(*b),
            Self::Integer(i) => Value::from(*i),
            Self::Float(f) => float(*f),
            Self::String(s) => Value::String(s.clone()),
            Self::Bytes(b) => Value::from(b.clone()),
            Self::List(items) => Value::Array(items.iter().map(RemoteValue::to_json).collect()),
            Self::Map(map) => properties_json(map),
            Self::Node(node) => json!({
                "entityType": "NODE",
                "labels": node.labels,
                "properties": properties_json(&node.properties),
            }),
            Self::Relationship(rel) => json!({
                "entityType": "RELATIONSHIP",
                "start": rel.start_id,
                "end": rel.end_id,
                "type": rel.rel_type,
                "properties": properties_json(&rel.properties),
            }),
            Self::Path(path) => Value::Array(
                path.entities()
                    .map(|e| match e {
                        PathEntity::Node(n) => RemoteValue::Node(n.clone()).to_json(),
                        PathEntity::Relationship(r) => {
                            RemoteValue::Relationship(r.clone()).to_json()
                        }
                    })
                    .collect(),
            ),
            Self::Point(point) => point_json(point),
            Self::Duration(duration) => Value::String(duration.to_string()),
            Self::Temporal(temporal) => Value::String(temporal.to_string()),
        }
    }
}

fn row_value_json(value: &RowValue, graph: &VirtualGraph) -> Value {
    match value {
        RowValue::Null => Value::Null,
        RowValue::Boolean(b) => Value::Bool(*b),
        RowValue::Integer(i) => Value::from(*i),
        RowValue::Float(f) => float(*f),
        RowValue::String(s) => Value::String(s.clone()),
        RowValue::Bytes(b) => Value::from(b.clone()),
        RowValue::List(items) => {
            Value::Array(items.iter().map(|v| row_value_json(v, graph)).collect())
        }
        RowValue::Map(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), row_value_json(v, graph)))
                .collect(),
        ),
        RowValue::Point(point) => point_json(point),
        RowValue::Duration(duration) => Value::String(duration.to_string()),
        RowValue::Temporal(temporal) => Value::String(temporal.to_string()),
        RowValue::Node(handle) => match graph.get_node(*handle) {
            Some(node) => json!({
                "entityType": "NODE",
                "id": node.id(),
                "labels": node.labels(),
                "properties": properties_json(node.properties()),
            }),
            None => Value::Null,
        },
        RowValue::Relationship(handle) => match graph.get_relationship(*handle) {
            Some(rel) => json!({
                "entityType": "RELATIONSHIP",
                "id": rel.id(),
                "type": rel.rel_type(),
                "start": graph.get_node(rel.start()).map(|n| n.id()),
                "end": graph.get_node(rel.end()).map(|n| n.id()),
                "properties": properties_json(rel.properties()),
            }),
            None => Value::Null,
        },
    }
}

fn properties_json(map: &PropertyMap) -> Value {
    Value::Object(map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect())
}

fn point_json(point: &Point) -> Value {
    let mut out = Map::new();
    out.insert("srid".to_string(), Value::from(point.srid));
    out.insert("x".to_string(), float(point.x));
    out.insert("y".to_string(), float(point.y));
    if let Some(z) = point.z {
        out.insert("z".to_string(), float(z));
    }
    Value::Object(out)
}

fn float(f: f64) -> Value {
    Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{IsoDuration, RemoteNode, RemoteRelationship};

    #[test]
    fn test_scalar_row_json() {
        let row = MaterializedRow::new(
            vec![
                ("name".to_string(), RowValue::from("Tom Burton")),
                ("age".to_string(), RowValue::Integer(23)),
                (
                    "duration".to_string(),
                    RowValue::Duration(IsoDuration::new(5, 1, 43200, 0)),
                ),
                (
                    "born".to_string(),
                    RowValue::Point(Point::new_3d(4979, 56.7, 12.78, 100.0)),
                ),
            ],
            VirtualGraph::new(),
        );

        assert_eq!(
            row.to_record_json(),
            json!({
                "row": {
                    "name": "Tom Burton",
                    "age": 23,
                    "duration": "P5M1DT43200S",
                    "born": { "srid": 4979, "x": 56.7, "y": 12.78, "z": 100.0 }
                }
            })
        );
    }

    #[test]
    fn test_virtual_entities_render_with_virtual_ids() {
        let mut graph = VirtualGraph::new();
        let a = graph.node(&RemoteNode::new(1, ["Person"]).with_property("name", "a"));
        let b = graph.placeholder(2);
        let rel = graph.relationship(&RemoteRelationship::new(9, "KNOWS", 1, 2), a, b);
        let (a_id, b_id) = (graph[a].id(), graph[b].id());

        let row = MaterializedRow::new(
            vec![
                ("n".to_string(), RowValue::Node(a)),
                ("r".to_string(), RowValue::Relationship(rel)),
            ],
            graph,
        );
        let out = row.to_json();

        assert_eq!(out["n"]["entityType"], "NODE");
        assert_eq!(out["n"]["id"], a_id);
        assert_eq!(out["n"]["labels"], json!(["Person"]));
        assert_eq!(out["r"]["start"], a_id);
        assert_eq!(out["r"]["end"], b_id);
        assert_eq!(out["r"]["type"], "KNOWS");
    }

    #[test]
    fn test_non_finite_float_is_null() {
        assert_eq!(RemoteValue::Float(f64::NAN).to_json(), Value::Null);
    }

    #[test]
    fn test_remote_node_json_has_no_id() {
        let json = RemoteValue::from(RemoteNode::new(5, ["Person"])).to_json();
        assert!(json.get("id").is_none());
        assert_eq!(json["entityType"], "NODE");
    }
}
