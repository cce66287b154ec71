/// Per-endpoint physical link
///
/// A [`DataSource`] owns the single link to one endpoint together with what
/// the server told us when the link was opened. Every Connection to that
/// endpoint shares it through the registry and creates its sessions on it.
use crate::error::Result;
use crate::models::{AuthMode, Credentials, ProtocolVersion};
use crate::registry::EndpointKey;
use crate::transport::{Connector, Link, WireResult, WireSession};
use crate::utils::{block_on_wire, run_cleanup};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

pub struct DataSource {
    key: EndpointKey,
    link: Arc<dyn Link>,
    auth_mode: AuthMode,
    master_id: i32,
    closed: AtomicBool,
}

impl std::fmt::Debug for DataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataSource")
            .field("key", &self.key)
            .field("auth_mode", &self.auth_mode)
            .field("master_id", &self.master_id)
            .field("closed", &self.closed.load(Ordering::Acquire))
            .finish()
    }
}

impl DataSource {
    /// Open the link and record the negotiated authorization mode and master id.
    pub(crate) async fn open(connector: &dyn Connector, key: EndpointKey) -> WireResult<Self> {
        let (link, info) = connector.open(&key).await?;
        debug!(
            endpoint = %key,
            auth_mode = ?info.auth_mode,
            master_id = info.master_id,
            "DataSource opened"
        );
        Ok(Self {
            key,
            link: Arc::from(link),
            auth_mode: info.auth_mode,
            master_id: info.master_id,
            closed: AtomicBool::new(false),
        })
    }

    pub fn key(&self) -> &EndpointKey {
        &self.key
    }

    pub fn auth_mode(&self) -> AuthMode {
        self.auth_mode
    }

    /// Negotiated protocol version code.
    pub fn master_id(&self) -> i32 {
        self.master_id
    }

    pub fn supports(&self, version: ProtocolVersion) -> bool {
        self.master_id >= version.code()
    }

    pub fn is_open(&self) -> bool {
        !self.closed.load(Ordering::Acquire)
    }

    /// Session scoped by database only, for servers without user management.
    pub(crate) async fn create_session(&self, database: &str) -> WireResult<Box<dyn WireSession>> {
        self.link.create_session(database, None).await
    }

    pub(crate) async fn create_session_with_credentials(
        &self,
        database: &str,
        credentials: &Credentials,
    ) -> WireResult<Box<dyn WireSession>> {
        self.link.create_session(database, Some(credentials)).await
    }

    /// Close the link. Later calls are no-ops.
    pub fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        debug!(endpoint = %self.key, "closing DataSource");
        block_on_wire(self.link.close())
    }
}

impl Drop for DataSource {
    fn drop(&mut self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        let link = Arc::clone(&self.link);
        let key = self.key;
        debug!(endpoint = %key, "DataSource released, closing link");
        run_cleanup(async move {
            if let Err(e) = link.close().await {
                warn!(endpoint = %key, error = %e, "failed to close link");
            }
        });
    }
}
