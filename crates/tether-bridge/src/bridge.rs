//! Entry points: `load`, `execute` and `load_from_local`

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use serde_json::Value;
use tether_config::{scrub, BridgeConfig, RemoteUrl, TetherConfig};
use tether_core::{Driver, LocalQueryEngine, Params, SummaryCounters};
use tracing::{debug, info, instrument, trace};

use crate::error::{BridgeError, BridgeResult};
use crate::query::{RemoteQuery, RowStream};

/// Runs statements against remote graph databases on behalf of the local one
#[derive(Clone)]
pub struct RemoteBridge {
    driver: Arc<dyn Driver>,
    local: Option<Arc<dyn LocalQueryEngine>>,
    config: TetherConfig,
}

impl RemoteBridge {
    pub fn new(driver: Arc<dyn Driver>) -> Self {
        Self {
            driver,
            local: None,
            config: TetherConfig::default(),
        }
    }

    /// Engine used by [`RemoteBridge::load_from_local`]
    pub fn with_local_engine(mut self, engine: Arc<dyn LocalQueryEngine>) -> Self {
        self.local = Some(engine);
        self
    }

    /// URL aliases and default options
    pub fn with_config(mut self, config: TetherConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &TetherConfig {
        &self.config
    }

    fn prepare(&self, url: &str, options: &Value) -> BridgeResult<(RemoteUrl, BridgeConfig)> {
        let remote = self.config.resolve_url(url)?;
        let config = self.config.defaults.overlay(options)?;
        config.driver.validate_for(&remote)?;
        Ok((remote, config))
    }

    /// Run `statement` on the remote and stream its rows.
    ///
    /// The session is opened before this returns, so connection and
    /// statement errors surface here rather than on the first poll.
    #[instrument(skip_all, fields(url = %scrub(url)))]
    pub async fn load(
        &self,
        url: &str,
        statement: &str,
        params: Option<Params>,
        options: &Value,
    ) -> BridgeResult<RowStream> {
        let (remote, config) = self.prepare(url, options)?;
        info!(
            virtual_entities = config.virtual_entities,
            read_only = config.read_only,
            "Loading from remote"
        );

        let query = RemoteQuery::open(
            Arc::clone(&self.driver),
            remote,
            statement,
            params.unwrap_or_default(),
            &config,
        )
        .await?;
        Ok(query.into_stream())
    }

    /// Run `statement` on the remote. With `statistics` set the rows are
    /// discarded and a single row of write counters is returned instead.
    #[instrument(skip_all, fields(url = %scrub(url)))]
    pub async fn execute(
        &self,
        url: &str,
        statement: &str,
        params: Option<Params>,
        options: &Value,
    ) -> BridgeResult<RowStream> {
        let (remote, config) = self.prepare(url, options)?;
        let query = RemoteQuery::open(
            Arc::clone(&self.driver),
            remote,
            statement,
            params.unwrap_or_default(),
            &config,
        )
        .await?;

        if !config.statistics {
            return Ok(query.into_stream());
        }

        let counters = query.finish().await?;
        info!(updates = counters.contains_updates(), "Executed remote statement");
        Ok(stream::iter([Ok(counters.to_row())]).boxed())
    }

    /// Run `local_statement` locally and replay each of its rows on the remote.
    ///
    /// By default every local row becomes the parameters of `remote_statement`.
    /// With `streamStatements` each local row must hold a single string column,
    /// which is run as a statement of its own. Remote calls are sequential and
    /// in local row order; the first failure ends the stream.
    #[instrument(skip_all, fields(url = %scrub(url)))]
    pub async fn load_from_local(
        &self,
        url: &str,
        local_statement: &str,
        remote_statement: Option<&str>,
        options: &Value,
    ) -> BridgeResult<RowStream> {
        let engine = self.local.clone().ok_or(BridgeError::NoLocalEngine)?;
        let (remote, config) = self.prepare(url, options)?;

        let stream_statements = config.stream_statements;
        let statistics = config.statistics;
        let remote_statement = match (stream_statements, remote_statement) {
            (true, Some(ignored)) => {
                debug!(statement = %ignored, "Ignoring remote statement while streaming statements");
                String::new()
            }
            (true, None) => String::new(),
            (false, Some(statement)) => statement.to_string(),
            (false, None) => return Err(BridgeError::MissingRemoteStatement),
        };

        let mut local_rows = engine.run(local_statement, &Params::new()).await?;
        info!(stream_statements, statistics, "Replaying local rows on remote");

        let driver = Arc::clone(&self.driver);
        let rows = async_stream::stream! {
            let mut totals = SummaryCounters::default();
            let mut index = 0usize;

            while let Some(next) = local_rows.next().await {
                index += 1;
                let local_row = match next {
                    Ok(row) => row,
                    Err(e) => {
                        yield Err(BridgeError::from(e));
                        return;
                    }
                };

                let (statement, params) = if stream_statements {
                    match statement_from_row(index, &local_row) {
                        Ok(Some(statement)) => (statement, Params::new()),
                        Ok(None) => {
                            trace!(index, "Skipping blank statement");
                            continue;
                        }
                        Err(e) => {
                            yield Err(e);
                            return;
                        }
                    }
                } else {
                    (remote_statement.clone(), local_row)
                };

                let mut query = RemoteQuery::new(
                    Arc::clone(&driver),
                    remote.clone(),
                    &statement,
                    params,
                    &config,
                );
                if stream_statements {
                    query = query.with_statement_index(index);
                }
                if let Err(e) = query.start().await {
                    yield Err(e);
                    return;
                }

                if statistics {
                    match query.finish().await {
                        Ok(counters) => totals += counters,
                        Err(e) => {
                            yield Err(e);
                            return;
                        }
                    }
                    continue;
                }

                loop {
                    match query.next_row().await {
                        Ok(Some(row)) => yield Ok(row),
                        Ok(None) => break,
                        Err(e) => {
                            yield Err(e);
                            return;
                        }
                    }
                }
            }

            debug!(local_rows = index, "Local rows replayed");
            if statistics {
                yield Ok(totals.to_row());
            }
        };
        Ok(Box::pin(rows))
    }
}

/// The statement held by a local row in statement-stream mode.
///
/// `None` for blank statements. A trailing `;` is dropped.
fn statement_from_row(index: usize, row: &Params) -> BridgeResult<Option<String>> {
    let invalid = |message: String| BridgeError::InvalidStatementStream { index, message };

    let mut columns = row.iter();
    let (column, value) = match (columns.next(), columns.next()) {
        (Some(only), None) => only,
        _ => {
            return Err(invalid(format!(
                "expected exactly one column, found {}",
                row.len()
            )))
        }
    };

    if value.is_null() {
        return Ok(None);
    }
    let text = value.as_str().ok_or_else(|| {
        invalid(format!(
            "column '{}' holds {}, expected a string",
            column,
            value.type_name()
        ))
    })?;

    let statement = text.trim().trim_end_matches(';').trim_end();
    if statement.is_empty() {
        Ok(None)
    } else {
        Ok(Some(statement.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tether_core::test_support::params;
    use tether_core::RemoteValue;
    use test_case::test_case;

    #[test_case("CREATE (n:Person)", Some("CREATE (n:Person)"); "plain")]
    #[test_case("  CREATE (n:Person);  ", Some("CREATE (n:Person)"); "trailing semicolon")]
    #[test_case("   ", None; "whitespace")]
    #[test_case(";", None; "lone semicolon")]
    fn test_statement_from_row(text: &str, expected: Option<&str>) {
        let row = params([("statement", RemoteValue::from(text))]);
        let statement = statement_from_row(1, &row).unwrap();
        assert_eq!(statement.as_deref(), expected);
    }

    #[test]
    fn test_null_statement_is_skipped() {
        let row = params([("statement", RemoteValue::Null)]);
        assert_eq!(statement_from_row(1, &row).unwrap(), None);
    }

    #[test]
    fn test_statement_row_must_have_one_column() {
        let row = params([
            ("a", RemoteValue::from("RETURN 1")),
            ("b", RemoteValue::from("RETURN 2")),
        ]);
        let err = statement_from_row(7, &row).unwrap_err();
        assert_eq!(err.statement_index(), Some(7));
        assert!(err.to_string().contains("found 2"));
    }

    #[test]
    fn test_statement_must_be_text() {
        let row = params([("statement", RemoteValue::from(42i64))]);
        let err = statement_from_row(2, &row).unwrap_err();
        assert!(matches!(err, BridgeError::InvalidStatementStream { index: 2, .. }));
    }
}
