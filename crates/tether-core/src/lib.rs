//! # Tether Core
//!
//! Turns records from a remote graph database into local rows.
//!
//! A record flows through three stages:
//!
//! 1. [`classify`] tags each value with its [`ValueKind`]
//! 2. [`Materializer`] converts it to a [`RowValue`], building entities either
//!    as plain maps or as virtual nodes and relationships in a per-row
//!    [`VirtualGraph`]
//! 3. [`RowTranslator`] does this for every column and returns a
//!    [`MaterializedRow`]
//!
//! The [`Driver`], [`RemoteSession`] and [`LocalQueryEngine`] traits are the
//! seams to the wire-protocol driver and the local database.

pub mod classify;
pub mod driver;
pub mod error;
pub mod graph;
pub mod local;
pub mod materialize;
mod render;
pub mod row;
pub mod translate;
pub mod value;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_support;

pub use classify::{classify, Classified, ValueKind};
pub use driver::{
    AccessMode, Driver, DriverError, DriverResult, RemoteSession, SessionRequest,
    ACCESS_MODE_ERROR_CODE,
};
pub use error::{CoreError, CoreResult, UnsupportedVariant};
pub use graph::{NodeRef, RelationshipRef, VirtualGraph, VirtualNode, VirtualRelationship};
pub use local::{LocalQueryEngine, LocalQueryError, LocalRowStream};
pub use materialize::{EndpointIndex, MaterializeMode, MaterializeOptions, Materializer, RowValue};
pub use row::MaterializedRow;
pub use translate::RowTranslator;
pub use value::{
    IsoDuration, Params, PathEntity, Point, PropertyMap, RemoteNode, RemotePath, RemoteRecord,
    RemoteRelationship, RemoteValue, SummaryCounters, Temporal,
};
