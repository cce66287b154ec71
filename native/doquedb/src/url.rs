/// Connection-string parsing
///
/// Recognizes exactly `jdbc:ricoh:doquedb://<host>:<port>/<database>`.
/// Anything else is "not ours" rather than an error: [`parse`] returns `None`
/// so a caller holding several drivers can offer the string to the next one.
use crate::constants::{URL_DIALECT, URL_SCHEME, URL_VENDOR};
use crate::error::Error;
use crate::models::ProtocolVersion;
use std::fmt;
use std::str::FromStr;

/// A parsed connection target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetDescriptor {
    pub host: String,
    pub port: u16,
    pub database_name: String,
    /// Always [`ProtocolVersion::CURRENT`]; the string carries no version token
    pub protocol_version: ProtocolVersion,
}

impl TargetDescriptor {
    pub fn new(host: impl Into<String>, port: u16, database_name: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port,
            database_name: database_name.into(),
            protocol_version: ProtocolVersion::CURRENT,
        }
    }

    /// Canonical connection string for this target.
    pub fn url(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for TargetDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{URL_SCHEME}:{URL_VENDOR}:{URL_DIALECT}://{}:{}/{}",
            self.host, self.port, self.database_name
        )
    }
}

impl FromStr for TargetDescriptor {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse(s).ok_or_else(|| Error::NotRecognizedTarget(s.to_string()))
    }
}

/// Parse a connection string, returning `None` when it is not a DoqueDB target.
///
/// Never panics. Every literal token is compared case-sensitively; the port
/// must be a non-empty run of ASCII digits that fits a TCP port. The database
/// name is whatever follows the final `/`.
pub fn parse(url: &str) -> Option<TargetDescriptor> {
    let rest = strip_token(url, URL_SCHEME)?;
    let rest = strip_token(rest, URL_VENDOR)?;
    let rest = strip_token(rest, URL_DIALECT)?;
    let rest = rest.strip_prefix("//")?;

    let (host, rest) = rest.split_once(':')?;
    let (port, rest) = rest.split_once('/')?;
    let database_name = rest.rsplit_once('/').map_or(rest, |(_, name)| name);

    if port.is_empty() || !port.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let port: u16 = port.parse().ok()?;

    Some(TargetDescriptor::new(host, port, database_name))
}

/// Whether [`parse`] would accept this string.
pub fn accepts_url(url: &str) -> bool {
    parse(url).is_some()
}

/// Strip `<token>:` from the front of `input`.
fn strip_token<'a>(input: &'a str, token: &str) -> Option<&'a str> {
    input.strip_prefix(token)?.strip_prefix(':')
}
