//! Value Type Classifier
//!
//! Reports the kind of a remote value together with borrowed access to the
//! fields materialization needs. Classification never copies or mutates the
//! input, and it is the single place where an unmodelled wire kind becomes
//! an error instead of a silent null.

use crate::error::UnsupportedVariant;
use crate::value::{
    IsoDuration, Point, PropertyMap, RemoteNode, RemotePath, RemoteRelationship, RemoteValue,
    Temporal,
};

/// Variant tag of a remote value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Null,
    Boolean,
    Integer,
    Float,
    String,
    Bytes,
    List,
    Map,
    Node,
    Relationship,
    Path,
    Point,
    Duration,
    Date,
    LocalTime,
    OffsetTime,
    LocalDateTime,
    ZonedDateTime,
}

impl ValueKind {
    /// Kinds that become graph entities in virtual mode
    pub fn is_entity(&self) -> bool {
        matches!(self, Self::Node | Self::Relationship | Self::Path)
    }

    pub fn is_temporal(&self) -> bool {
        matches!(
            self,
            Self::Date | Self::LocalTime | Self::OffsetTime | Self::LocalDateTime | Self::ZonedDateTime
        )
    }
}

/// A classified value borrowing from the record it came from
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Classified<'a> {
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(&'a str),
    Bytes(&'a [u8]),
    List(&'a [RemoteValue]),
    Map(&'a PropertyMap),
    Node(&'a RemoteNode),
    Relationship(&'a RemoteRelationship),
    Path(&'a RemotePath),
    Point(&'a Point),
    Duration(&'a IsoDuration),
    Temporal(&'a Temporal),
}

impl Classified<'_> {
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Null => ValueKind::Null,
            Self::Boolean(_) => ValueKind::Boolean,
            Self::Integer(_) => ValueKind::Integer,
            Self::Float(_) => ValueKind::Float,
            Self::String(_) => ValueKind::String,
            Self::Bytes(_) => ValueKind::Bytes,
            Self::List(_) => ValueKind::List,
            Self::Map(_) => ValueKind::Map,
            Self::Node(_) => ValueKind::Node,
            Self::Relationship(_) => ValueKind::Relationship,
            Self::Path(_) => ValueKind::Path,
            Self::Point(_) => ValueKind::Point,
            Self::Duration(_) => ValueKind::Duration,
            Self::Temporal(Temporal::Date(_)) => ValueKind::Date,
            Self::Temporal(Temporal::LocalTime(_)) => ValueKind::LocalTime,
            Self::Temporal(Temporal::OffsetTime { .. }) => ValueKind::OffsetTime,
            Self::Temporal(Temporal::LocalDateTime(_)) => ValueKind::LocalDateTime,
            Self::Temporal(Temporal::ZonedDateTime { .. }) => ValueKind::ZonedDateTime,
        }
    }
}

/// Classify one remote value
pub fn classify(value: &RemoteValue) -> Result<Classified<'_>, UnsupportedVariant> {
    Ok(match value {
        RemoteValue::Null => Classified::Null,
        RemoteValue::Boolean(b) => Classified::Boolean(*b),
        RemoteValue::Integer(i) => Classified::Integer(*i),
        RemoteValue::Float(f) => Classified::Float(*f),
        RemoteValue::String(s) => Classified::String(s),
        RemoteValue::Bytes(b) => Classified::Bytes(b),
        RemoteValue::List(items) => Classified::List(items),
        RemoteValue::Map(map) => Classified::Map(map),
        RemoteValue::Node(node) => Classified::Node(node),
        RemoteValue::Relationship(rel) => Classified::Relationship(rel),
        RemoteValue::Path(path) => Classified::Path(path),
        RemoteValue::Point(point) => Classified::Point(point),
        RemoteValue::Duration(duration) => Classified::Duration(duration),
        RemoteValue::Temporal(temporal) => Classified::Temporal(temporal),
        RemoteValue::Unknown { type_name } => {
            return Err(UnsupportedVariant {
                type_name: type_name.clone(),
            })
        }
    })
}

/// Shorthand for `classify(value).map(|c| c.kind())`
pub fn kind_of(value: &RemoteValue) -> Result<ValueKind, UnsupportedVariant> {
    classify(value).map(|c| c.kind())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, NaiveDate, NaiveTime, TimeZone};
    use test_case::test_case;

    fn time() -> NaiveTime {
        NaiveTime::from_hms_opt(12, 0, 0).unwrap()
    }

    fn zoned() -> Temporal {
        let offset = FixedOffset::east_opt(3600).unwrap();
        Temporal::ZonedDateTime {
            datetime: offset.with_ymd_and_hms(2020, 1, 1, 12, 0, 0).unwrap(),
            zone_id: Some("Europe/Stockholm".to_string()),
        }
    }

    #[test_case(RemoteValue::Null, ValueKind::Null)]
    #[test_case(RemoteValue::from(true), ValueKind::Boolean)]
    #[test_case(RemoteValue::from(54), ValueKind::Integer)]
    #[test_case(RemoteValue::from(1.5), ValueKind::Float)]
    #[test_case(RemoteValue::from("Tom"), ValueKind::String)]
    #[test_case(RemoteValue::Bytes(vec![1, 2]), ValueKind::Bytes)]
    #[test_case(RemoteValue::List(vec![]), ValueKind::List)]
    #[test_case(RemoteValue::Map(Default::default()), ValueKind::Map)]
    #[test_case(RemoteValue::from(RemoteNode::new(1, ["Person"])), ValueKind::Node)]
    #[test_case(RemoteValue::from(RemoteRelationship::new(1, "KNOWS", 1, 2)), ValueKind::Relationship)]
    #[test_case(RemoteValue::from(RemotePath::start(RemoteNode::new(1, ["Person"]))), ValueKind::Path)]
    #[test_case(RemoteValue::from(Point::new_2d(7203, 2.3, 4.5)), ValueKind::Point)]
    #[test_case(RemoteValue::from(IsoDuration::new(5, 1, 43200, 0)), ValueKind::Duration)]
    #[test_case(RemoteValue::from(Temporal::Date(NaiveDate::from_ymd_opt(2020, 1, 1).unwrap())), ValueKind::Date)]
    #[test_case(RemoteValue::from(Temporal::LocalTime(time())), ValueKind::LocalTime)]
    #[test_case(RemoteValue::from(Temporal::OffsetTime { time: time(), offset: FixedOffset::east_opt(0).unwrap() }), ValueKind::OffsetTime)]
    #[test_case(RemoteValue::from(Temporal::LocalDateTime(NaiveDate::from_ymd_opt(2020, 1, 1).unwrap().and_time(time()))), ValueKind::LocalDateTime)]
    #[test_case(RemoteValue::from(zoned()), ValueKind::ZonedDateTime)]
    fn test_kinds(value: RemoteValue, expected: ValueKind) {
        assert_eq!(kind_of(&value).unwrap(), expected);
    }

    #[test]
    fn test_unknown_kind_is_error() {
        let value = RemoteValue::Unknown {
            type_name: "VECTOR".to_string(),
        };
        assert_eq!(
            classify(&value).unwrap_err(),
            UnsupportedVariant {
                type_name: "VECTOR".to_string()
            }
        );
    }

    #[test]
    fn test_node_fields_are_borrowed() {
        let value = RemoteValue::from(
            RemoteNode::new(7, ["Person", "Athlete"]).with_property("name", "Michael Jordan"),
        );
        match classify(&value).unwrap() {
            Classified::Node(node) => {
                assert_eq!(node.labels, ["Person", "Athlete"]);
                assert_eq!(node.properties["name"], RemoteValue::from("Michael Jordan"));
            }
            other => panic!("expected node, got {:?}", other),
        }
    }

    #[test]
    fn test_kind_groups() {
        assert!(ValueKind::Path.is_entity());
        assert!(!ValueKind::Map.is_entity());
        assert!(ValueKind::OffsetTime.is_temporal());
        assert!(!ValueKind::Duration.is_temporal());
    }
}
