//! `doquedb`: client connectivity layer for the DoqueDB server
//!
//! This is the root module of the client library. It parses connection
//! strings, shares one DataSource per server endpoint, opens authenticated
//! sessions, and exposes result rows and array cells through forward-only
//! cursors. The wire protocol itself is supplied by a [`transport::Connector`].
pub mod array_cursor;
pub mod connection;
pub mod constants;
pub mod cursor;
pub mod datasource;
pub mod error;
pub mod metadata;
pub mod models;
pub mod registry;
pub mod transport;
pub mod types;
pub mod url;
pub mod utils;
pub mod value;

// Re-export the types most callers need
pub use array_cursor::ArrayCursor;
pub use connection::{Connection, Driver, IsolationLevel};
pub use cursor::{LobStream, ResultCursor, RowCursor};
pub use error::{Error, Result};
pub use metadata::{ColumnMetaData, ParameterMetaData, ResultSetMetaData};
pub use models::*;
pub use registry::{EndpointKey, EndpointRegistry};
pub use types::{CatalogType, HostRepr, StandardType};
pub use url::TargetDescriptor;
pub use value::{Array, Value, Word};

#[cfg(test)]
mod tests;
