//! Wire collaborator interface
//!
//! Framing, authentication negotiation and the binary codec belong to the
//! wire layer, which this crate consumes through the traits below. A
//! [`Connector`] opens one physical [`Link`] per endpoint; a link hands out
//! logical [`WireSession`]s, and each executed statement streams its answer
//! back as [`Tuple`]s through a [`WireResultSet`].
//!
//! All methods are asynchronous and are driven from the blocking client API
//! through [`TOKIO_RUNTIME`](crate::constants::TOKIO_RUNTIME).

use crate::metadata::ColumnMetaData;
use crate::models::{AuthMode, Credentials, ProtocolVersion};
use crate::registry::EndpointKey;
use crate::value::Value;
use async_trait::async_trait;
use std::io;
use std::net::IpAddr;
use thiserror::Error;

/// Result type alias for wire operations
pub type WireResult<T> = std::result::Result<T, WireError>;

/// Failures reported by the wire layer
#[derive(Debug, Error)]
pub enum WireError {
    /// Socket or stream failure
    #[error("i/o failure: {0}")]
    Io(#[from] io::Error),

    /// The server answered with an error status
    #[error("server error {code}: {message}")]
    Server { code: i32, message: String },

    /// The peer sent something this client cannot interpret
    #[error("protocol violation: {0}")]
    Protocol(String),
}

/// What the server reported when a link was opened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenInfo {
    pub auth_mode: AuthMode,
    /// Negotiated protocol version code
    pub master_id: i32,
}

impl OpenInfo {
    /// Whether the negotiated protocol is at least `version`.
    pub fn supports(&self, version: ProtocolVersion) -> bool {
        self.master_id >= version.code()
    }
}

/// One item of a statement's answer stream
#[derive(Debug, Clone, PartialEq)]
pub enum Tuple {
    /// Column descriptions; precedes the first data row
    MetaData(Vec<ColumnMetaData>),
    /// One row of cell values
    Data(Vec<Value>),
    /// The statement finished; no further tuples follow
    End,
}

/// Opens links to endpoints
#[async_trait]
pub trait Connector: Send + Sync {
    /// Resolve a host name to the address used as the registry key.
    async fn resolve(&self, host: &str, port: u16) -> io::Result<IpAddr> {
        tokio::net::lookup_host((host, port))
            .await?
            .next()
            .map(|addr| addr.ip())
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("no address found for {host}"),
                )
            })
    }

    /// Open a link to a resolved endpoint and negotiate its protocol.
    async fn open(&self, endpoint: &EndpointKey) -> WireResult<(Box<dyn Link>, OpenInfo)>;
}

/// A physical link to one endpoint, shared by every session on it
#[async_trait]
pub trait Link: Send + Sync {
    /// Open a session scoped to a database, with or without credentials.
    async fn create_session(
        &self,
        database: &str,
        credentials: Option<&Credentials>,
    ) -> WireResult<Box<dyn WireSession>>;

    async fn close(&self) -> WireResult<()>;
}

/// A logical session on a link
#[async_trait]
pub trait WireSession: Send {
    async fn execute(&mut self, sql: &str, params: &[Value])
        -> WireResult<Box<dyn WireResultSet>>;

    async fn close(&mut self) -> WireResult<()>;
}

/// The answer stream of one executed statement
#[async_trait]
pub trait WireResultSet: Send {
    async fn next_tuple(&mut self) -> WireResult<Tuple>;

    /// Ask the server to stop producing tuples.
    async fn cancel(&mut self) -> WireResult<()>;

    async fn close(&mut self) -> WireResult<()>;
}
