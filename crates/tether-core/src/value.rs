//! Values as delivered by the wire-protocol driver
//!
//! Everything here is plain owned data. A driver decodes one record into these
//! types and hands it to the translator, which consumes it.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::AddAssign;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Property map of a node or relationship
pub type PropertyMap = BTreeMap<String, RemoteValue>;

/// Named statement parameters
pub type Params = BTreeMap<String, RemoteValue>;

/// A single value from a remote result
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteValue {
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Bytes(Vec<u8>),
    List(Vec<RemoteValue>),
    Map(BTreeMap<String, RemoteValue>),
    Node(RemoteNode),
    Relationship(RemoteRelationship),
    Path(RemotePath),
    Point(Point),
    Duration(IsoDuration),
    Temporal(Temporal),
    /// A wire kind the driver could decode structurally but has no model for
    Unknown { type_name: String },
}

impl RemoteValue {
    /// Protocol name of the value kind, as used in error messages
    pub fn type_name(&self) -> &str {
        match self {
            Self::Null => "NULL",
            Self::Boolean(_) => "BOOLEAN",
            Self::Integer(_) => "INTEGER",
            Self::Float(_) => "FLOAT",
            Self::String(_) => "STRING",
            Self::Bytes(_) => "BYTES",
            Self::List(_) => "LIST",
            Self::Map(_) => "MAP",
            Self::Node(_) => "NODE",
            Self::Relationship(_) => "RELATIONSHIP",
            Self::Path(_) => "PATH",
            Self::Point(_) => "POINT",
            Self::Duration(_) => "DURATION",
            Self::Temporal(t) => t.type_name(),
            Self::Unknown { type_name } => type_name,
        }
    }

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

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

macro_rules! remote_value_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for RemoteValue {
                fn from(v: $ty) -> Self {
                    Self::$variant(v.into())
                }
            }
        )*
    };
}

remote_value_from! {
    bool => Boolean,
    i64 => Integer,
    i32 => Integer,
    f64 => Float,
    String => String,
    &str => String,
    Vec<RemoteValue> => List,
    RemoteNode => Node,
    RemoteRelationship => Relationship,
    RemotePath => Path,
    Point => Point,
    IsoDuration => Duration,
    Temporal => Temporal,
}

/// A node as seen by the remote instance
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteNode {
    /// Remote identity, stable only within one session
    pub id: i64,
    pub labels: Vec<String>,
    pub properties: PropertyMap,
}

impl RemoteNode {
    pub fn new<I, S>(id: i64, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id,
            labels: labels.into_iter().map(Into::into).collect(),
            properties: PropertyMap::new(),
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<RemoteValue>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }
}

/// A directed relationship as seen by the remote instance
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteRelationship {
    pub id: i64,
    pub rel_type: String,
    pub start_id: i64,
    pub end_id: i64,
    pub properties: PropertyMap,
    /// Endpoint data some drivers embed alongside the relationship
    pub start_node: Option<RemoteNode>,
    pub end_node: Option<RemoteNode>,
}

impl RemoteRelationship {
    pub fn new(id: i64, rel_type: impl Into<String>, start_id: i64, end_id: i64) -> Self {
        Self {
            id,
            rel_type: rel_type.into(),
            start_id,
            end_id,
            properties: PropertyMap::new(),
            start_node: None,
            end_node: None,
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<RemoteValue>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Embed the endpoint nodes. Their ids must match `start_id` and `end_id`.
    pub fn with_endpoints(mut self, start: RemoteNode, end: RemoteNode) -> Self {
        self.start_node = Some(start);
        self.end_node = Some(end);
        self
    }

    /// Whether the relationship joins `a` and `b`, in either direction
    pub fn connects(&self, a: i64, b: i64) -> bool {
        (self.start_id == a && self.end_id == b) || (self.start_id == b && self.end_id == a)
    }
}

/// Alternating node/relationship sequence that starts and ends with a node
#[derive(Debug, Clone, PartialEq)]
pub struct RemotePath {
    nodes: Vec<RemoteNode>,
    relationships: Vec<RemoteRelationship>,
}

/// One position in a path
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathEntity<'a> {
    Node(&'a RemoteNode),
    Relationship(&'a RemoteRelationship),
}

impl RemotePath {
    /// Zero-length path
    pub fn start(node: RemoteNode) -> Self {
        Self {
            nodes: vec![node],
            relationships: Vec::new(),
        }
    }

    /// Extend the path by one hop. The relationship must join the current
    /// last node and `node`, in either direction.
    pub fn push(mut self, relationship: RemoteRelationship, node: RemoteNode) -> CoreResult<Self> {
        let last = self.end().id;
        if !relationship.connects(last, node.id) {
            return Err(CoreError::MalformedPath(format!(
                "relationship {} ({} -> {}) does not join nodes {} and {}",
                relationship.id, relationship.start_id, relationship.end_id, last, node.id
            )));
        }
        self.relationships.push(relationship);
        self.nodes.push(node);
        Ok(self)
    }

    /// Build a path from its separated parts, as a driver decodes them
    pub fn from_parts(
        nodes: Vec<RemoteNode>,
        relationships: Vec<RemoteRelationship>,
    ) -> CoreResult<Self> {
        let mut nodes = nodes.into_iter();
        let first = nodes
            .next()
            .ok_or_else(|| CoreError::MalformedPath("path has no nodes".to_string()))?;
        if nodes.len() != relationships.len() {
            return Err(CoreError::MalformedPath(format!(
                "{} relationships need {} nodes, got {}",
                relationships.len(),
                relationships.len() + 1,
                nodes.len() + 1
            )));
        }

        relationships
            .into_iter()
            .zip(nodes)
            .try_fold(Self::start(first), |path, (rel, node)| path.push(rel, node))
    }

    pub fn nodes(&self) -> &[RemoteNode] {
        &self.nodes
    }

    pub fn relationships(&self) -> &[RemoteRelationship] {
        &self.relationships
    }

    /// Number of relationships
    pub fn len(&self) -> usize {
        self.relationships.len()
    }

    pub fn is_empty(&self) -> bool {
        self.relationships.is_empty()
    }

    pub fn end(&self) -> &RemoteNode {
        // a path always holds at least its start node
        &self.nodes[self.nodes.len() - 1]
    }

    /// Entities in traversal order: node, relationship, node, ...
    pub fn entities(&self) -> impl Iterator<Item = PathEntity<'_>> {
        let hops = self
            .relationships
            .iter()
            .zip(&self.nodes[1..])
            .flat_map(|(rel, node)| [PathEntity::Relationship(rel), PathEntity::Node(node)]);
        std::iter::once(PathEntity::Node(&self.nodes[0])).chain(hops)
    }
}

/// Spatial point in a coordinate reference system
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub srid: i32,
    pub x: f64,
    pub y: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub z: Option<f64>,
}

impl Point {
    pub fn new_2d(srid: i32, x: f64, y: f64) -> Self {
        Self { srid, x, y, z: None }
    }

    pub fn new_3d(srid: i32, x: f64, y: f64, z: f64) -> Self {
        Self {
            srid,
            x,
            y,
            z: Some(z),
        }
    }

    /// Name of the coordinate reference system, when the srid is a well-known one
    pub fn crs_name(&self) -> Option<&'static str> {
        match self.srid {
            4326 => Some("wgs-84"),
            4979 => Some("wgs-84-3d"),
            7203 => Some("cartesian"),
            9157 => Some("cartesian-3d"),
            _ => None,
        }
    }
}

/// Duration split into the calendar-aware parts the protocol carries
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct IsoDuration {
    pub months: i64,
    pub days: i64,
    pub seconds: i64,
    pub nanoseconds: i32,
}

impl IsoDuration {
    pub fn new(months: i64, days: i64, seconds: i64, nanoseconds: i32) -> Self {
        Self {
            months,
            days,
            seconds,
            nanoseconds,
        }
    }
}

impl fmt::Display for IsoDuration {
    /// ISO-8601 form, e.g. `P5M1DT43200S`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.months == 0 && self.days == 0 && self.seconds == 0 && self.nanoseconds == 0 {
            return f.write_str("PT0S");
        }
        f.write_str("P")?;
        if self.months != 0 {
            write!(f, "{}M", self.months)?;
        }
        if self.days != 0 {
            write!(f, "{}D", self.days)?;
        }
        if self.seconds != 0 || self.nanoseconds != 0 {
            write!(f, "T{}", self.seconds)?;
            if self.nanoseconds != 0 {
                let fraction = format!("{:09}", self.nanoseconds.unsigned_abs());
                write!(f, ".{}", fraction.trim_end_matches('0'))?;
            }
            f.write_str("S")?;
        }
        Ok(())
    }
}

/// Calendar and clock values
#[derive(Debug, Clone, PartialEq)]
pub enum Temporal {
    Date(NaiveDate),
    LocalTime(NaiveTime),
    OffsetTime {
        time: NaiveTime,
        offset: FixedOffset,
    },
    LocalDateTime(NaiveDateTime),
    /// Instant with its offset, plus the named zone when the remote value carried one
    ZonedDateTime {
        datetime: DateTime<FixedOffset>,
        zone_id: Option<String>,
    },
}

impl Temporal {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Date(_) => "DATE",
            Self::LocalTime(_) => "LOCAL_TIME",
            Self::OffsetTime { .. } => "TIME",
            Self::LocalDateTime(_) => "LOCAL_DATE_TIME",
            Self::ZonedDateTime { .. } => "DATE_TIME",
        }
    }
}

impl fmt::Display for Temporal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Date(date) => write!(f, "{}", date.format("%Y-%m-%d")),
            Self::LocalTime(time) => write!(f, "{}", time.format("%H:%M:%S%.f")),
            Self::OffsetTime { time, offset } => {
                write!(f, "{}{}", time.format("%H:%M:%S%.f"), offset)
            }
            Self::LocalDateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S%.f")),
            Self::ZonedDateTime { datetime, zone_id } => {
                write!(f, "{}", datetime.format("%Y-%m-%dT%H:%M:%S%.f%:z"))?;
                match zone_id {
                    Some(zone) => write!(f, "[{}]", zone),
                    None => Ok(()),
                }
            }
        }
    }
}

/// One record of a remote result: column names and their values, in order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RemoteRecord {
    keys: Vec<String>,
    values: Vec<RemoteValue>,
}

impl RemoteRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, K>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, RemoteValue)>,
        K: Into<String>,
    {
        let (keys, values) = pairs.into_iter().map(|(k, v)| (k.into(), v)).unzip();
        Self { keys, values }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<RemoteValue>) -> Self {
        self.keys.push(key.into());
        self.values.push(value.into());
        self
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn values(&self) -> &[RemoteValue] {
        &self.values
    }

    pub fn get(&self, key: &str) -> Option<&RemoteValue> {
        self.keys
            .iter()
            .position(|k| k == key)
            .map(|i| &self.values[i])
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RemoteValue)> {
        self.keys.iter().map(String::as_str).zip(&self.values)
    }
}

impl IntoIterator for RemoteRecord {
    type Item = (String, RemoteValue);
    type IntoIter = std::iter::Zip<std::vec::IntoIter<String>, std::vec::IntoIter<RemoteValue>>;

    fn into_iter(self) -> Self::IntoIter {
        self.keys.into_iter().zip(self.values)
    }
}

/// Write counters reported by the remote instance after a statement
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SummaryCounters {
    pub nodes_created: i64,
    pub nodes_deleted: i64,
    pub relationships_created: i64,
    pub relationships_deleted: i64,
    pub properties_set: i64,
    pub labels_added: i64,
    pub labels_removed: i64,
    pub indexes_added: i64,
    pub indexes_removed: i64,
    pub constraints_added: i64,
    pub constraints_removed: i64,
}

impl SummaryCounters {
    /// Counter names and values in reporting order
    pub fn entries(&self) -> [(&'static str, i64); 11] {
        [
            ("nodesCreated", self.nodes_created),
            ("nodesDeleted", self.nodes_deleted),
            ("relationshipsCreated", self.relationships_created),
            ("relationshipsDeleted", self.relationships_deleted),
            ("propertiesSet", self.properties_set),
            ("labelsAdded", self.labels_added),
            ("labelsRemoved", self.labels_removed),
            ("indexesAdded", self.indexes_added),
            ("indexesRemoved", self.indexes_removed),
            ("constraintsAdded", self.constraints_added),
            ("constraintsRemoved", self.constraints_removed),
        ]
    }

    pub fn contains_updates(&self) -> bool {
        self.entries().iter().any(|(_, v)| *v != 0)
    }
}

impl AddAssign for SummaryCounters {
    fn add_assign(&mut self, rhs: Self) {
        self.nodes_created += rhs.nodes_created;
        self.nodes_deleted += rhs.nodes_deleted;
        self.relationships_created += rhs.relationships_created;
        self.relationships_deleted += rhs.relationships_deleted;
        self.properties_set += rhs.properties_set;
        self.labels_added += rhs.labels_added;
        self.labels_removed += rhs.labels_removed;
        self.indexes_added += rhs.indexes_added;
        self.indexes_removed += rhs.indexes_removed;
        self.constraints_added += rhs.constraints_added;
        self.constraints_removed += rhs.constraints_removed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use test_case::test_case;

    fn person(id: i64, name: &str) -> RemoteNode {
        RemoteNode::new(id, ["Person"]).with_property("name", name)
    }

    fn knows(id: i64, start: i64, end: i64) -> RemoteRelationship {
        RemoteRelationship::new(id, "KNOWS", start, end)
    }

    #[test]
    fn test_path_entities_alternate() {
        let path = RemotePath::start(person(1, "Michael"))
            .push(knows(10, 1, 2), person(2, "Tom"))
            .unwrap()
            .push(knows(11, 3, 2), person(3, "John"))
            .unwrap();

        assert_eq!(path.len(), 2);
        let kinds: Vec<&str> = path
            .entities()
            .map(|e| match e {
                PathEntity::Node(_) => "n",
                PathEntity::Relationship(_) => "r",
            })
            .collect();
        assert_eq!(kinds, ["n", "r", "n", "r", "n"]);
        assert_eq!(path.end().id, 3);
    }

    #[test]
    fn test_path_rejects_disconnected_hop() {
        let result = RemotePath::start(person(1, "Michael")).push(knows(10, 5, 6), person(2, "Tom"));
        assert!(matches!(result, Err(CoreError::MalformedPath(_))));
    }

    #[test]
    fn test_path_from_parts_checks_counts() {
        let ok = RemotePath::from_parts(
            vec![person(1, "a"), person(2, "b")],
            vec![knows(10, 1, 2)],
        );
        assert!(ok.is_ok());

        let short = RemotePath::from_parts(vec![person(1, "a")], vec![knows(10, 1, 2)]);
        assert!(short.is_err());
        assert!(RemotePath::from_parts(vec![], vec![]).is_err());
    }

    #[test]
    fn test_cyclic_path_allowed() {
        let path = RemotePath::start(person(1, "a"))
            .push(knows(10, 1, 2), person(2, "b"))
            .unwrap()
            .push(knows(11, 2, 1), person(1, "a"))
            .unwrap();
        assert_eq!(path.nodes().first().map(|n| n.id), Some(1));
        assert_eq!(path.end().id, 1);
    }

    #[test_case(IsoDuration::new(5, 1, 43200, 0), "P5M1DT43200S")]
    #[test_case(IsoDuration::new(0, 0, 0, 0), "PT0S")]
    #[test_case(IsoDuration::new(14, 0, 0, 0), "P14M")]
    #[test_case(IsoDuration::new(0, 3, 0, 0), "P3D")]
    #[test_case(IsoDuration::new(0, 0, 1, 500_000_000), "PT1.5S")]
    fn test_duration_iso_text(duration: IsoDuration, expected: &str) {
        assert_eq!(duration.to_string(), expected);
    }

    #[test]
    fn test_temporal_text() {
        let date = NaiveDate::from_ymd_opt(1984, 10, 11).unwrap();
        let time = NaiveTime::from_hms_opt(12, 50, 35).unwrap();
        let offset = FixedOffset::east_opt(3600).unwrap();

        assert_eq!(Temporal::Date(date).to_string(), "1984-10-11");
        assert_eq!(Temporal::LocalTime(time).to_string(), "12:50:35");
        assert_eq!(
            Temporal::OffsetTime { time, offset }.to_string(),
            "12:50:35+01:00"
        );
        assert_eq!(
            Temporal::LocalDateTime(date.and_time(time)).to_string(),
            "1984-10-11T12:50:35"
        );

        let datetime = offset.with_ymd_and_hms(1984, 10, 11, 12, 50, 35).unwrap();
        assert_eq!(
            Temporal::ZonedDateTime {
                datetime,
                zone_id: Some("Europe/Stockholm".to_string())
            }
            .to_string(),
            "1984-10-11T12:50:35+01:00[Europe/Stockholm]"
        );
    }

    #[test]
    fn test_point_crs_names() {
        assert_eq!(Point::new_2d(4326, 56.7, 12.78).crs_name(), Some("wgs-84"));
        assert_eq!(
            Point::new_3d(4979, 56.7, 12.78, 100.0).crs_name(),
            Some("wgs-84-3d")
        );
        assert_eq!(Point::new_2d(1, 0.0, 0.0).crs_name(), None);
    }

    #[test]
    fn test_record_lookup_keeps_column_order() {
        let record = RemoteRecord::new()
            .with("name", "Tom Burton")
            .with("age", 23)
            .with("alive", true);

        assert_eq!(record.keys(), ["name", "age", "alive"]);
        assert_eq!(record.get("age"), Some(&RemoteValue::Integer(23)));
        assert_eq!(record.get("missing"), None);
    }

    #[test]
    fn test_counters_accumulate() {
        let mut total = SummaryCounters::default();
        assert!(!total.contains_updates());

        total += SummaryCounters {
            nodes_created: 1,
            labels_added: 1,
            properties_set: 2,
            ..Default::default()
        };
        total += SummaryCounters {
            nodes_created: 2,
            ..Default::default()
        };

        assert_eq!(total.nodes_created, 3);
        assert_eq!(total.labels_added, 1);
        assert_eq!(total.properties_set, 2);
        assert!(total.contains_updates());
        assert_eq!(total.entries()[0], ("nodesCreated", 3));
    }

    #[test]
    fn test_type_names() {
        assert_eq!(RemoteValue::from(1.5).type_name(), "FLOAT");
        assert_eq!(
            RemoteValue::Unknown {
                type_name: "VECTOR".to_string()
            }
            .type_name(),
            "VECTOR"
        );
    }
}
