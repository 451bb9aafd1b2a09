//! Shared fixtures: a small social graph of people who know each other.

#![allow(dead_code)]

use chrono::{FixedOffset, NaiveDate, NaiveTime, TimeZone};
use tether_core::{
    IsoDuration, Point, RemoteNode, RemotePath, RemoteRelationship, RemoteValue, Temporal,
};

pub fn michael() -> RemoteNode {
    RemoteNode::new(1, ["Person"])
        .with_property("name", "Michael Jordan")
        .with_property("age", 54)
        .with_property("state", true)
}

pub fn tom() -> RemoteNode {
    RemoteNode::new(2, ["Person"])
        .with_property("name", "Tom Burton")
        .with_property("age", 23)
}

pub fn john() -> RemoteNode {
    RemoteNode::new(3, ["Person"])
        .with_property("name", "John William")
        .with_property("age", 22)
}

/// `(michael)-[:KNOWS]->(tom)` with a property of every scalar kind
pub fn knows() -> RemoteRelationship {
    RemoteRelationship::new(10, "KNOWS", 1, 2)
        .with_property("since", 1993)
        .with_property("born", Point::new_3d(4979, 56.7, 12.78, 100.0))
        .with_property("duration", IsoDuration::new(5, 1, 43200, 0))
}

pub fn person_with(id: i64, name: &str) -> RemoteNode {
    RemoteNode::new(id, ["Person"]).with_property("name", name)
}

/// A node carrying one property of every kind a property may hold
pub fn kitchen_sink() -> RemoteNode {
    let date = NaiveDate::from_ymd_opt(1984, 10, 11).expect("valid date");
    let time = NaiveTime::from_hms_milli_opt(12, 50, 35, 556).expect("valid time");
    let offset = FixedOffset::east_opt(3600).expect("valid offset");

    RemoteNode::new(42, ["Sample", "Everything"])
        .with_property("flag", true)
        .with_property("count", 7)
        .with_property("ratio", 0.25)
        .with_property("text", "hello")
        .with_property("tags", vec![RemoteValue::from("a"), RemoteValue::from("b")])
        .with_property("cartesian", Point::new_2d(7203, 2.3, 4.5))
        .with_property("wgs", Point::new_2d(4326, 56.7, 12.78))
        .with_property("cartesian3d", Point::new_3d(9157, 2.3, 4.5, 1.2))
        .with_property("duration", IsoDuration::new(5, 1, 43200, 0))
        .with_property("date", Temporal::Date(date))
        .with_property("localTime", Temporal::LocalTime(time))
        .with_property("offsetTime", Temporal::OffsetTime { time, offset })
        .with_property("localDateTime", Temporal::LocalDateTime(date.and_time(time)))
        .with_property(
            "zonedDateTime",
            Temporal::ZonedDateTime {
                datetime: offset
                    .with_ymd_and_hms(1984, 10, 11, 12, 50, 35)
                    .single()
                    .expect("unambiguous instant"),
                zone_id: Some("Europe/Stockholm".to_string()),
            },
        )
}

/// Path visiting nodes `ids` in order, each hop a KNOWS relationship
pub fn chain(ids: &[i64]) -> RemotePath {
    let mut path = RemotePath::start(person_with(ids[0], &format!("p{}", ids[0])));
    for (hop, pair) in ids.windows(2).enumerate() {
        let rel = RemoteRelationship::new(1000 + hop as i64, "KNOWS", pair[0], pair[1]);
        path = path
            .push(rel, person_with(pair[1], &format!("p{}", pair[1])))
            .expect("consecutive nodes are joined");
    }
    path
}
