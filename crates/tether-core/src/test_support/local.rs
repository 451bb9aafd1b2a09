//! Scripted local engine

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::stream::{self, StreamExt};

use crate::local::{LocalQueryEngine, LocalQueryError, LocalRowStream};
use crate::value::Params;

#[derive(Debug, Clone)]
enum LocalScript {
    Rows(Vec<Params>),
    RowsThenFail(Vec<Params>, LocalQueryError),
    Fail(LocalQueryError),
}

/// Local engine answering statements with fixed row sequences.
///
/// Unscripted statements return no rows.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLocalEngine {
    scripts: Arc<Mutex<HashMap<String, LocalScript>>>,
    runs: Arc<Mutex<Vec<String>>>,
}

impl InMemoryLocalEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(self, statement: &str, rows: Vec<Params>) -> Self {
        self.insert(statement, LocalScript::Rows(rows))
    }

    /// Yield `rows`, then fail the stream
    pub fn with_rows_then_failure(self, statement: &str, rows: Vec<Params>, message: &str) -> Self {
        self.insert(
            statement,
            LocalScript::RowsThenFail(rows, LocalQueryError::Stream(message.to_string())),
        )
    }

    /// Fail before producing a stream
    pub fn with_failure(self, statement: &str, message: &str) -> Self {
        self.insert(
            statement,
            LocalScript::Fail(LocalQueryError::Statement(message.to_string())),
        )
    }

    fn insert(self, statement: &str, script: LocalScript) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(statement.trim().to_string(), script);
        self
    }

    /// Statements run so far
    pub fn runs(&self) -> Vec<String> {
        self.runs.lock().unwrap().clone()
    }
}

#[async_trait]
impl LocalQueryEngine for InMemoryLocalEngine {
    async fn run(&self, statement: &str, _params: &Params) -> Result<LocalRowStream, LocalQueryError> {
        let key = statement.trim().to_string();
        self.runs.lock().unwrap().push(key.clone());

        let script = self.scripts.lock().unwrap().get(&key).cloned();
        let items: Vec<Result<Params, LocalQueryError>> = match script {
            None => Vec::new(),
            Some(LocalScript::Fail(err)) => return Err(err),
            Some(LocalScript::Rows(rows)) => rows.into_iter().map(Ok).collect(),
            Some(LocalScript::RowsThenFail(rows, err)) => rows
                .into_iter()
                .map(Ok)
                .chain(std::iter::once(Err(err)))
                .collect(),
        };
        Ok(stream::iter(items).boxed())
    }
}
