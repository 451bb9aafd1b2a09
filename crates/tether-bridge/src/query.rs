//! One remote statement on one scoped session
//!
//! ```text
//! Idle -> Connected -> Streaming -> Exhausted
//!    \         \           \
//!     +---------+-----------+--> Failed
//! ```
//!
//! `Exhausted` and `Failed` are terminal and both close the session.

use std::fmt;
use std::sync::Arc;

use futures::stream::BoxStream;
use tether_config::{BridgeConfig, RemoteUrl};
use tether_core::{
    AccessMode, Driver, DriverError, EndpointIndex, MaterializedRow, Params, RowTranslator,
    SessionRequest, SummaryCounters,
};
use tracing::{debug, trace, warn};

use crate::error::{BridgeError, BridgeResult};
use crate::session::SessionScope;

/// Lazily produced rows of a remote call
pub type RowStream = BoxStream<'static, BridgeResult<MaterializedRow>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryState {
    Idle,
    Connected,
    Streaming,
    Exhausted,
    Failed,
}

impl QueryState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Exhausted | Self::Failed)
    }
}

impl fmt::Display for QueryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Connected => "connected",
            Self::Streaming => "streaming",
            Self::Exhausted => "exhausted",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

pub struct RemoteQuery {
    driver: Arc<dyn Driver>,
    request: SessionRequest,
    statement: String,
    params: Params,
    translator: RowTranslator,
    scope: Option<SessionScope>,
    state: QueryState,
    statement_index: Option<usize>,
    rows: usize,
    counters: Option<SummaryCounters>,
}

impl RemoteQuery {
    pub fn new(
        driver: Arc<dyn Driver>,
        url: RemoteUrl,
        statement: &str,
        params: Params,
        config: &BridgeConfig,
    ) -> Self {
        let access_mode = if config.access_mode_is_read() {
            AccessMode::Read
        } else {
            AccessMode::Write
        };

        Self {
            driver,
            request: SessionRequest {
                url,
                access_mode,
                database: config.database_name.clone(),
                driver: config.driver.clone(),
            },
            statement: statement.to_string(),
            params,
            translator: RowTranslator::from_config(config),
            scope: None,
            state: QueryState::Idle,
            statement_index: None,
            rows: 0,
            counters: None,
        }
    }

    /// Report failures as statement `position` of a statement stream
    pub fn with_statement_index(mut self, position: usize) -> Self {
        self.statement_index = Some(position);
        self
    }

    /// Connect and start the statement
    pub async fn open(
        driver: Arc<dyn Driver>,
        url: RemoteUrl,
        statement: &str,
        params: Params,
        config: &BridgeConfig,
    ) -> BridgeResult<Self> {
        let mut query = Self::new(driver, url, statement, params, config);
        query.start().await?;
        Ok(query)
    }

    /// Idle -> Connected -> Streaming
    pub async fn start(&mut self) -> BridgeResult<()> {
        if self.state != QueryState::Idle {
            return Ok(());
        }

        let opened = SessionScope::open(self.driver.as_ref(), &self.request).await;
        let scope = match opened {
            Ok(scope) => scope,
            Err(e) => return Err(self.fail(e)),
        };
        self.scope = Some(scope);
        self.transition(QueryState::Connected);

        let run = match self.scope.as_mut().map(SessionScope::session) {
            Some(Ok(session)) => session.run(&self.statement, &self.params).await,
            Some(Err(e)) => Err(e),
            None => Err(DriverError::SessionClosed),
        };
        match run {
            Ok(keys) => {
                debug!(columns = ?keys, "Remote statement started");
                self.transition(QueryState::Streaming);
                Ok(())
            }
            Err(e) => {
                let err = BridgeError::from_driver(&self.request.url, &self.statement, e);
                Err(self.fail(err))
            }
        }
    }

    /// Pull and translate the next row. `None` once the query is exhausted or failed.
    pub async fn next_row(&mut self) -> BridgeResult<Option<MaterializedRow>> {
        if self.state != QueryState::Streaming {
            return Ok(None);
        }

        match self.pull().await {
            Ok(Some(row)) => {
                self.rows += 1;
                Ok(Some(row))
            }
            Ok(None) => {
                self.exhaust().await?;
                Ok(None)
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    async fn pull(&mut self) -> BridgeResult<Option<MaterializedRow>> {
        let next = match self.scope.as_mut().map(SessionScope::session) {
            Some(Ok(session)) => session.next_record().await,
            Some(Err(e)) => Err(e),
            None => Err(DriverError::SessionClosed),
        };
        let record = match next {
            Ok(Some(record)) => record,
            Ok(None) => return Ok(None),
            Err(e) => {
                return Err(BridgeError::from_driver(&self.request.url, &self.statement, e));
            }
        };

        let missing = self.translator.missing_endpoints(&record);
        let endpoints = if missing.is_empty() {
            EndpointIndex::new()
        } else {
            self.fetch_endpoints(&missing).await?
        };

        self.translator
            .translate(record, &endpoints)
            .map(Some)
            .map_err(|e| BridgeError::from_core(&self.request.url, &self.statement, e))
    }

    /// Endpoint nodes are read on a short-lived session of their own so the
    /// open result is never buffered behind the lookup.
    async fn fetch_endpoints(&mut self, ids: &[i64]) -> BridgeResult<EndpointIndex> {
        trace!(ids = ?ids, "Fetching relationship endpoints");
        let request = SessionRequest {
            access_mode: AccessMode::Read,
            ..self.request.clone()
        };

        let mut scope = SessionScope::open(self.driver.as_ref(), &request).await?;
        let looked_up = match scope.session() {
            Ok(session) => session.lookup_nodes(ids).await,
            Err(e) => Err(e),
        };
        scope.finish();

        let nodes = looked_up
            .map_err(|e| BridgeError::from_driver(&self.request.url, &self.statement, e))?;
        Ok(nodes.into_iter().map(|node| (node.id, node)).collect())
    }

    /// Streaming -> Exhausted, collecting the write counters
    async fn exhaust(&mut self) -> BridgeResult<()> {
        let consumed = match self.scope.as_mut().map(SessionScope::session) {
            Some(Ok(session)) => session.consume().await,
            Some(Err(e)) => Err(e),
            None => Err(DriverError::SessionClosed),
        };

        match consumed {
            Ok(counters) => {
                self.counters = Some(counters);
                if let Some(scope) = self.scope.as_mut() {
                    scope.finish();
                }
                self.transition(QueryState::Exhausted);
                debug!(rows = self.rows, "Remote result exhausted");
                Ok(())
            }
            Err(e) => {
                let err = BridgeError::from_driver(&self.request.url, &self.statement, e);
                Err(self.fail(err))
            }
        }
    }

    /// Discard remaining rows and return the statement's write counters
    pub async fn finish(mut self) -> BridgeResult<SummaryCounters> {
        if self.state == QueryState::Streaming {
            self.exhaust().await?;
        }
        Ok(self.counters.unwrap_or_default())
    }

    /// Enter `Failed`, close the session and return the error to surface
    fn fail(&mut self, err: BridgeError) -> BridgeError {
        let err = match self.statement_index {
            Some(position) => err.with_statement_index(position),
            None => err,
        };
        warn!(
            url = %self.request.url,
            state = %self.state,
            error = %err,
            "Remote query failed"
        );
        if let Some(mut scope) = self.scope.take() {
            scope.finish();
        }
        self.transition(QueryState::Failed);
        err
    }

    fn transition(&mut self, next: QueryState) {
        trace!(from = %self.state, to = %next, "Remote query state change");
        self.state = next;
    }

    pub fn state(&self) -> QueryState {
        self.state
    }

    pub fn statement(&self) -> &str {
        &self.statement
    }

    /// Rows produced so far
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Rows as a stream. Dropping the stream early closes the session.
    pub fn into_stream(mut self) -> RowStream {
        Box::pin(async_stream::stream! {
            loop {
                match self.next_row().await {
                    Ok(Some(row)) => yield Ok(row),
                    Ok(None) => break,
                    Err(e) => {
                        yield Err(e);
                        break;
                    }
                }
            }
        })
    }
}
