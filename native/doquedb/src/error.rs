//! Error types for the DoqueDB client
//!
//! Every fallible operation in this crate returns [`Error`], a closed set of
//! kinds. Failures raised by the wire collaborator arrive as
//! [`WireError`](crate::transport::WireError) and are mapped here, in one place,
//! with the original failure kept as the error source.

use crate::transport::WireError;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, Error>;

/// Boxed underlying cause attached to wrapped failures
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur while connecting, executing or reading results
#[derive(Debug, Error)]
pub enum Error {
    /// The connection string is not one this driver handles
    #[error("not a recognized connection target: {0}")]
    NotRecognizedTarget(String),

    /// Host name resolution failed before any traffic was sent
    #[error("cannot connect to {host}:{port}: {source}")]
    CannotConnect {
        host: String,
        port: u16,
        #[source]
        source: BoxError,
    },

    /// Transport-level failure while opening, negotiating or streaming
    #[error("connection ran out: {0}")]
    ConnectionRanOut(#[source] BoxError),

    /// Any other failure, with the unforeseen cause attached
    #[error("unexpected error: {0}")]
    Unexpected(#[source] BoxError),

    /// A caller-supplied index or value is out of its valid range
    #[error("bad argument: {0}")]
    BadArgument(String),

    /// The feature is intentionally not implemented by this client
    #[error("not supported: {0}")]
    NotSupported(&'static str),

    /// The connection or cursor has already been closed
    #[error("session not available")]
    SessionNotAvailable,

    /// No column carries the requested label
    #[error("entry not found: {0}")]
    EntryNotFound(String),

    /// The server rejected the statement
    #[error("server error {code}: {message}")]
    Server { code: i32, message: String },

    /// A cell value cannot be read as the requested host type
    #[error("cannot read {from} value as {to}")]
    ClassCast {
        from: &'static str,
        to: &'static str,
    },
}

impl Error {
    /// Wrap any cause as [`Error::Unexpected`].
    pub fn unexpected<E>(cause: E) -> Self
    where
        E: Into<BoxError>,
    {
        Error::Unexpected(cause.into())
    }

    /// Wrap a transport failure as [`Error::ConnectionRanOut`].
    pub fn ran_out<E>(cause: E) -> Self
    where
        E: Into<BoxError>,
    {
        Error::ConnectionRanOut(cause.into())
    }

    /// The same failure, for another caller that waited on the same attempt.
    ///
    /// Kinds that carry only data are rebuilt as-is; kinds with a boxed cause
    /// point at the shared original.
    pub fn shared(err: &Arc<Error>) -> Self {
        let cause = || -> BoxError { Box::new(SharedCause(Arc::clone(err))) };
        match err.as_ref() {
            Error::NotRecognizedTarget(url) => Error::NotRecognizedTarget(url.clone()),
            Error::CannotConnect { host, port, .. } => Error::CannotConnect {
                host: host.clone(),
                port: *port,
                source: cause(),
            },
            Error::ConnectionRanOut(_) => Error::ConnectionRanOut(cause()),
            Error::Unexpected(_) => Error::Unexpected(cause()),
            Error::BadArgument(message) => Error::BadArgument(message.clone()),
            Error::NotSupported(what) => Error::NotSupported(*what),
            Error::SessionNotAvailable => Error::SessionNotAvailable,
            Error::EntryNotFound(label) => Error::EntryNotFound(label.clone()),
            Error::Server { code, message } => Error::Server {
                code: *code,
                message: message.clone(),
            },
            Error::ClassCast { from, to } => Error::ClassCast {
                from: *from,
                to: *to,
            },
        }
    }
}

/// The boxed cause of a failure observed by several callers
#[derive(Debug)]
struct SharedCause(Arc<Error>);

impl SharedCause {
    fn cause(&self) -> Option<&(dyn std::error::Error + 'static)> {
        std::error::Error::source(self.0.as_ref())
    }
}

impl fmt::Display for SharedCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.cause() {
            Some(cause) => fmt::Display::fmt(cause, f),
            None => fmt::Display::fmt(&self.0, f),
        }
    }
}

impl std::error::Error for SharedCause {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause().and_then(std::error::Error::source)
    }
}

impl From<WireError> for Error {
    fn from(err: WireError) -> Self {
        match err {
            WireError::Io(io) => Error::ConnectionRanOut(Box::new(io)),
            WireError::Server { code, message } => Error::Server { code, message },
            other @ WireError::Protocol(_) => Error::Unexpected(Box::new(other)),
        }
    }
}

impl From<tokio::time::error::Elapsed> for Error {
    fn from(elapsed: tokio::time::error::Elapsed) -> Self {
        Error::ConnectionRanOut(Box::new(elapsed))
    }
}
