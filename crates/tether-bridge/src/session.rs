//! Scoped remote sessions
//!
//! [`SessionScope`] owns a driver session and closes it exactly once: on
//! exhaustion, on failure, or when the owner is dropped mid-stream.

use tether_config::RemoteUrl;
use tether_core::{Driver, DriverError, RemoteSession, SessionRequest};
use tracing::{debug, warn};

use crate::error::{BridgeError, BridgeResult};

pub struct SessionScope {
    session: Option<Box<dyn RemoteSession>>,
    url: RemoteUrl,
    exhausted: bool,
    log_leaked: bool,
}

impl SessionScope {
    /// Open a session through `driver`. Any failure here is a connection failure.
    pub async fn open(driver: &dyn Driver, request: &SessionRequest) -> BridgeResult<Self> {
        let session = driver
            .connect(request)
            .await
            .map_err(|e| BridgeError::connection(&request.url, e))?;

        debug!(
            url = %request.url,
            access_mode = ?request.access_mode,
            database = request.database.as_deref().unwrap_or("<default>"),
            "Opened remote session"
        );

        Ok(Self {
            session: Some(session),
            url: request.url.clone(),
            exhausted: false,
            log_leaked: request.driver.log_leaked_sessions(),
        })
    }

    /// The open session, or `SessionClosed` once the scope has been closed
    pub fn session(&mut self) -> Result<&mut (dyn RemoteSession + 'static), DriverError> {
        self.session.as_deref_mut().ok_or(DriverError::SessionClosed)
    }

    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    /// Record that the result was read to the end, then close
    pub fn finish(&mut self) {
        self.exhausted = true;
        self.close();
    }

    /// Close the session if it is still open
    pub fn close(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.close();
            debug!(url = %self.url, exhausted = self.exhausted, "Closed remote session");
        }
    }
}

impl Drop for SessionScope {
    fn drop(&mut self) {
        if self.session.is_some() && !self.exhausted {
            if self.log_leaked {
                warn!(url = %self.url, "Remote session abandoned before its result was consumed");
            } else {
                debug!(url = %self.url, "Remote session abandoned before its result was consumed");
            }
        }
        self.close();
    }
}
