/// Global constants for the DoqueDB client
///
/// This module holds all static configuration: the fixed connection-string
/// tokens, property keys, default timeouts, and the shared Tokio runtime that
/// drives the asynchronous wire collaborator from the blocking client API.
use once_cell::sync::Lazy;
use tokio::runtime::Runtime;

/// Global Tokio runtime for async operations
///
/// IMPORTANT: This panics if Tokio runtime creation fails, which can only happen in
/// extremely rare circumstances (e.g., system has no available threads). In normal
/// operation, runtime creation succeeds immediately on the first connect.
///
/// The blocking client API calls `block_on` on this runtime, so it must not be
/// invoked from inside another Tokio runtime's worker thread.
#[allow(clippy::expect_used)]
pub static TOKIO_RUNTIME: Lazy<Runtime> = Lazy::new(|| {
    Runtime::new()
        .expect("Failed to initialize Tokio runtime - check system resources and thread limits")
});

/// Default timeout for opening a DataSource (in seconds)
pub const DEFAULT_OPEN_TIMEOUT_SECS: u64 = 30;

/// Default timeout for creating a session on an open DataSource (in seconds)
pub const DEFAULT_SESSION_TIMEOUT_SECS: u64 = 30;

// Connection-string tokens: `jdbc:ricoh:doquedb://host:port/database`
pub const URL_SCHEME: &str = "jdbc";
pub const URL_VENDOR: &str = "ricoh";
pub const URL_DIALECT: &str = "doquedb";

/// Property key carrying the user name
pub const PROPERTY_USER: &str = "user";

/// Property key carrying the password
pub const PROPERTY_PASSWORD: &str = "password";

/// Display size reported for unbounded columns (large objects, images)
pub const UNLIMITED_DISPLAY_SIZE: i32 = 0x7FFF_FFFF;

/// Suffix appended to a column's type name when the column is an array
pub const ARRAY_TYPE_SUFFIX: &str = " array";

/// Name of the synthesized element-index column of an array cursor
pub const ELEMENT_INDEX_COLUMN: &str = "INDEX";

/// Fallback name of the element column when the array carries no metadata
pub const ELEMENT_VALUE_COLUMN: &str = "VALUE";

/// Display size and precision of a 32-bit integer column
pub const INTEGER_DISPLAY_SIZE: i32 = 10;
