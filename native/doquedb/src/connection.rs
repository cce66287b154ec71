/// Connection establishment and session lifecycle
///
/// [`Driver`] turns a connection string into a [`Connection`]: parse the
/// target, resolve it to an endpoint, fetch or open that endpoint's
/// DataSource, then create a session on it according to the server's
/// authorization mode. A Connection owns its session and shares the
/// DataSource with every other Connection to the same endpoint.
use crate::cursor::{ResultCursor, RowCursor};
use crate::datasource::DataSource;
use crate::error::{Error, Result};
use crate::models::{AuthMode, ConnectProperties, Credentials, DriverConfig, ProtocolVersion};
use crate::registry::{EndpointKey, EndpointRegistry};
use crate::transport::{Connector, WireSession};
use crate::url::{self as target_url, TargetDescriptor};
use crate::utils::{block_on_wire, block_on_with_timeout, drain, run_cleanup};
use crate::value::Value;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

/// Entry point: parses connection strings and opens Connections
#[derive(Debug, Clone)]
pub struct Driver {
    registry: Arc<EndpointRegistry>,
    config: DriverConfig,
}

impl Driver {
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        Self::with_config(connector, DriverConfig::default())
    }

    pub fn with_config(connector: Arc<dyn Connector>, config: DriverConfig) -> Self {
        let registry = Arc::new(EndpointRegistry::new(
            connector,
            config.eviction,
            config.open_timeout,
        ));
        Self { registry, config }
    }

    /// Share an existing registry, e.g. between drivers with different init statements.
    pub fn with_registry(registry: Arc<EndpointRegistry>, config: DriverConfig) -> Self {
        Self { registry, config }
    }

    pub fn registry(&self) -> &Arc<EndpointRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    pub fn accepts_url(&self, url: &str) -> bool {
        target_url::accepts_url(url)
    }

    /// Connect to the target named by `url`.
    ///
    /// Returns `Ok(None)` when the string is not a DoqueDB target, so a caller
    /// can try another driver. `user` and `password` are read from `properties`,
    /// absent keys meaning empty strings.
    pub fn connect(&self, url: &str, properties: &ConnectProperties) -> Result<Option<Connection>> {
        let Some(target) = target_url::parse(url) else {
            debug!(url, "connection string not recognized");
            return Ok(None);
        };
        let credentials = properties.credentials();
        self.connect_target(&target, Some(&credentials)).map(Some)
    }

    /// Connect to an already parsed target.
    pub fn connect_target(
        &self,
        target: &TargetDescriptor,
        credentials: Option<&Credentials>,
    ) -> Result<Connection> {
        let key = self
            .registry
            .resolve(&target.host, target.port, target.protocol_version)?;
        let data_source = self.registry.get_or_create(&key)?;
        let credentials = credentials.cloned().unwrap_or_default();

        let session = self.create_session(&data_source, &target.database_name, &credentials)?;
        debug!(
            endpoint = %key,
            database = %target.database_name,
            auth_mode = ?data_source.auth_mode(),
            "session created"
        );

        let connection = Connection {
            id: Uuid::new_v4(),
            url: target.url(),
            database_name: target.database_name.clone(),
            endpoint: key,
            credentials,
            master_id: data_source.master_id(),
            session: Some(session),
            data_source: Some(data_source),
            auto_commit: true,
            read_only: false,
            read_mode_set: false,
            in_transaction: false,
            isolation: IsolationLevel::default(),
        };

        let guard = ConnectionGuard::new(connection);
        guard.initialize(&self.config.init_statements)
    }

    fn create_session(
        &self,
        data_source: &Arc<DataSource>,
        database: &str,
        credentials: &Credentials,
    ) -> Result<Box<dyn WireSession>> {
        block_on_with_timeout(self.config.session_timeout, async {
            match data_source.auth_mode() {
                AuthMode::None => data_source.create_session(database).await,
                AuthMode::Password => {
                    data_source
                        .create_session_with_credentials(database, credentials)
                        .await
                }
            }
        })
    }
}

/// Transaction isolation levels the server understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IsolationLevel {
    ReadUncommitted,
    #[default]
    ReadCommitted,
    RepeatableRead,
    Serializable,
    /// Read-only snapshot of the database as of transaction start
    UsingSnapshot,
}

impl IsolationLevel {
    fn statement(self) -> &'static str {
        match self {
            IsolationLevel::ReadUncommitted => "set transaction isolation level read uncommitted",
            IsolationLevel::ReadCommitted => "set transaction isolation level read committed",
            IsolationLevel::RepeatableRead => "set transaction isolation level repeatable read",
            IsolationLevel::Serializable => "set transaction isolation level serializable",
            IsolationLevel::UsingSnapshot => "set transaction read only, using snapshot",
        }
    }
}

/// A session on one database of one endpoint
pub struct Connection {
    id: Uuid,
    url: String,
    database_name: String,
    endpoint: EndpointKey,
    credentials: Credentials,
    master_id: i32,
    /// `None` once closed
    session: Option<Box<dyn WireSession>>,
    data_source: Option<Arc<DataSource>>,
    auto_commit: bool,
    read_only: bool,
    /// Whether a read mode statement has been sent on this session
    read_mode_set: bool,
    in_transaction: bool,
    isolation: IsolationLevel,
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("url", &self.url)
            .field("endpoint", &self.endpoint)
            .field("user", &self.credentials.user)
            .field("master_id", &self.master_id)
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

impl Connection {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn database_name(&self) -> &str {
        &self.database_name
    }

    pub fn endpoint(&self) -> &EndpointKey {
        &self.endpoint
    }

    pub fn user(&self) -> &str {
        &self.credentials.user
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Negotiated protocol version code of the endpoint.
    pub fn master_id(&self) -> i32 {
        self.master_id
    }

    /// Whether the negotiated protocol is at least `version`.
    pub fn supports(&self, version: ProtocolVersion) -> bool {
        self.master_id >= version.code()
    }

    /// The shared DataSource, until the connection is closed.
    pub fn data_source(&self) -> Option<&Arc<DataSource>> {
        self.data_source.as_ref()
    }

    pub fn is_closed(&self) -> bool {
        self.session.is_none()
    }

    pub fn auto_commit(&self) -> bool {
        self.auto_commit
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub fn in_transaction(&self) -> bool {
        self.in_transaction
    }

    pub fn transaction_isolation(&self) -> IsolationLevel {
        self.isolation
    }

    /// Execute a statement and return a cursor over its answer.
    ///
    /// With auto-commit off, the first statement outside a transaction
    /// starts one.
    pub fn execute(&mut self, sql: &str, params: &[Value]) -> Result<ResultCursor> {
        self.ensure_open()?;
        if !self.auto_commit && !self.in_transaction {
            self.begin_transaction()?;
        }
        let session = self.session_mut()?;
        let wire = block_on_wire(session.execute(sql, params))?;
        Ok(ResultCursor::new(wire, params.len()))
    }

    /// Execute a statement and discard its rows. Returns the row count.
    pub fn execute_update(&mut self, sql: &str, params: &[Value]) -> Result<usize> {
        let mut cursor = self.execute(sql, params)?;
        let mut rows = 0;
        while cursor.next()? {
            rows += 1;
        }
        cursor.close()?;
        Ok(rows)
    }

    pub fn set_auto_commit(&mut self, auto_commit: bool) -> Result<()> {
        self.ensure_open()?;
        if auto_commit == self.auto_commit {
            return Ok(());
        }
        if self.in_transaction {
            self.commit()?;
        }
        self.auto_commit = auto_commit;
        Ok(())
    }

    pub fn commit(&mut self) -> Result<()> {
        self.end_transaction("commit")
    }

    pub fn rollback(&mut self) -> Result<()> {
        self.end_transaction("rollback")
    }

    pub fn set_read_only(&mut self, read_only: bool) -> Result<()> {
        self.ensure_open()?;
        if self.in_transaction {
            return Err(Error::BadArgument(
                "read mode cannot change inside a transaction".to_string(),
            ));
        }
        if self.isolation == IsolationLevel::UsingSnapshot {
            if read_only {
                return Ok(());
            }
            return Err(Error::BadArgument(
                "snapshot transactions are read only".to_string(),
            ));
        }
        if !self.read_mode_set || self.read_only != read_only {
            let sql = if read_only {
                "set transaction read only"
            } else {
                "set transaction read write"
            };
            self.run_control(sql)?;
            self.read_mode_set = true;
        }
        self.read_only = read_only;
        Ok(())
    }

    pub fn set_transaction_isolation(&mut self, level: IsolationLevel) -> Result<()> {
        self.ensure_open()?;
        if self.in_transaction {
            return Err(Error::BadArgument(
                "isolation level cannot change inside a transaction".to_string(),
            ));
        }
        self.run_control(level.statement())?;
        self.isolation = level;
        if level == IsolationLevel::UsingSnapshot {
            self.read_only = true;
            self.read_mode_set = true;
        }
        Ok(())
    }

    /// Close the session and release the DataSource. Later calls are no-ops.
    pub fn close(&mut self) -> Result<()> {
        let Some(mut session) = self.session.take() else {
            return Ok(());
        };
        debug!(id = %self.id, endpoint = %self.endpoint, "closing connection");
        let closed = block_on_wire(session.close());
        drop(session);
        self.data_source = None;
        self.in_transaction = false;
        closed
    }

    fn ensure_open(&self) -> Result<()> {
        if self.session.is_none() {
            return Err(Error::SessionNotAvailable);
        }
        Ok(())
    }

    fn session_mut(&mut self) -> Result<&mut Box<dyn WireSession>> {
        self.session.as_mut().ok_or(Error::SessionNotAvailable)
    }

    fn run_control(&mut self, sql: &str) -> Result<()> {
        let session = self.session_mut()?;
        block_on_wire(async {
            let answer = session.execute(sql, &[]).await?;
            drain(answer).await
        })?;
        Ok(())
    }

    fn begin_transaction(&mut self) -> Result<()> {
        let sql = if self.isolation == IsolationLevel::UsingSnapshot {
            "start transaction read only, using snapshot"
        } else if self.read_only {
            "start transaction read only"
        } else {
            "start transaction read write"
        };
        self.run_control(sql)?;
        self.in_transaction = true;
        Ok(())
    }

    fn end_transaction(&mut self, sql: &str) -> Result<()> {
        self.ensure_open()?;
        if self.auto_commit {
            return Err(Error::BadArgument(format!(
                "{sql} requested with auto-commit on"
            )));
        }
        if !self.in_transaction {
            return Ok(());
        }
        // The transaction is over whatever the server answers.
        self.in_transaction = false;
        self.run_control(sql)
    }

    fn initialize(&mut self, statements: &[String]) -> Result<()> {
        for sql in statements {
            self.run_control(sql)?;
        }
        Ok(())
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        if let Some(mut session) = self.session.take() {
            let id = self.id;
            debug!(%id, "connection dropped while open, closing session");
            run_cleanup(async move {
                if let Err(e) = session.close().await {
                    warn!(%id, error = %e, "failed to close session");
                }
            });
        }
    }
}

/// Closes a half-built Connection unless it is handed out.
///
/// Wraps a Connection between session creation and the end of its
/// initialization, so a failure on any path still closes the session once.
struct ConnectionGuard {
    connection: Option<Connection>,
}

impl ConnectionGuard {
    fn new(connection: Connection) -> Self {
        Self {
            connection: Some(connection),
        }
    }

    fn initialize(mut self, statements: &[String]) -> Result<Connection> {
        let connection = self
            .connection
            .as_mut()
            .ok_or_else(|| Error::unexpected("connection guard already released"))?;
        connection.initialize(statements)?;
        self.connection
            .take()
            .ok_or_else(|| Error::unexpected("connection guard already released"))
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        if let Some(mut connection) = self.connection.take() {
            warn!(id = %connection.id, "connection setup failed, closing session");
            if let Err(e) = connection.close() {
                warn!(id = %connection.id, error = %e, "failed to close session after setup failure");
            }
        }
    }
}
