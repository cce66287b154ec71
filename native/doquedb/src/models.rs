/// Data structures and configuration for the DoqueDB client
///
/// This module defines the small value types shared by every layer: protocol
/// versions, the server's authorization mode, registry eviction policy,
/// connection properties and the driver configuration.
use crate::constants::{
    DEFAULT_OPEN_TIMEOUT_SECS, DEFAULT_SESSION_TIMEOUT_SECS, PROPERTY_PASSWORD, PROPERTY_USER,
};
use std::collections::HashMap;
use std::time::Duration;

/// Client/server protocol versions, oldest first.
///
/// The ordinal code is what the server reports back as its master id, so
/// capability checks compare a connection's master id against these codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ProtocolVersion {
    V1,
    V2,
    V3,
    V4,
    V5,
}

impl ProtocolVersion {
    /// The version every parsed target asks for.
    pub const CURRENT: ProtocolVersion = ProtocolVersion::V5;

    /// All versions in ascending order.
    pub const ALL: [ProtocolVersion; 5] = [
        ProtocolVersion::V1,
        ProtocolVersion::V2,
        ProtocolVersion::V3,
        ProtocolVersion::V4,
        ProtocolVersion::V5,
    ];

    pub fn code(self) -> i32 {
        match self {
            ProtocolVersion::V1 => 0,
            ProtocolVersion::V2 => 1,
            ProtocolVersion::V3 => 2,
            ProtocolVersion::V4 => 3,
            ProtocolVersion::V5 => 4,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.code() == code)
    }
}

/// Authorization mode negotiated when a DataSource is opened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    /// The server does not manage users; sessions are scoped by database only
    None,
    /// Sessions must present a user name and password
    Password,
}

/// What the endpoint registry does with a DataSource nobody references any more
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EvictionPolicy {
    /// Keep every DataSource for the lifetime of the registry
    #[default]
    Never,
    /// Drop the registry's claim once the last Connection is gone, closing
    /// the DataSource; the next connect to that endpoint opens a fresh one
    WhenUnused,
}

/// User name and password presented when the server requires them
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub user: String,
    pub password: String,
}

impl Credentials {
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            password: password.into(),
        }
    }
}

/// Out-of-band connection properties
///
/// Recognized keys are `user` and `password`; absent keys read as empty
/// strings, never as "no authentication".
#[derive(Debug, Clone, Default)]
pub struct ConnectProperties {
    values: HashMap<String, String>,
}

impl ConnectProperties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.values.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Credentials carried by these properties, defaulting to empty strings.
    pub fn credentials(&self) -> Credentials {
        Credentials {
            user: self.get(PROPERTY_USER).unwrap_or_default().to_string(),
            password: self.get(PROPERTY_PASSWORD).unwrap_or_default().to_string(),
        }
    }
}

impl<K, V> FromIterator<(K, V)> for ConnectProperties
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Driver-wide configuration
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// Upper bound on opening a new DataSource (resolution excluded)
    pub open_timeout: Duration,
    /// Upper bound on creating a session on an open DataSource
    pub session_timeout: Duration,
    /// Registry behaviour for DataSources no Connection references
    pub eviction: EvictionPolicy,
    /// Statements run on every new session before the Connection is handed out
    pub init_statements: Vec<String>,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            open_timeout: Duration::from_secs(DEFAULT_OPEN_TIMEOUT_SECS),
            session_timeout: Duration::from_secs(DEFAULT_SESSION_TIMEOUT_SECS),
            eviction: EvictionPolicy::default(),
            init_statements: Vec::new(),
        }
    }
}
