//! In-memory collaborators for tests
//!
//! - [`InMemoryRemote`]: a [`Driver`](crate::driver::Driver) with scripted
//!   statements, a node registry, failure injection and session accounting
//! - [`InMemoryLocalEngine`]: a [`LocalQueryEngine`](crate::local::LocalQueryEngine)
//!   with scripted row sequences

mod local;
mod remote;

pub use local::InMemoryLocalEngine;
pub use remote::{ExecutedStatement, InMemoryRemote, ScriptedResult};

use crate::value::{Params, RemoteValue};

/// Build a parameter map from `(name, value)` pairs
pub fn params<I, K, V>(pairs: I) -> Params
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<RemoteValue>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}
