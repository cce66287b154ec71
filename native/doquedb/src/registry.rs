/// Endpoint registry
///
/// Maps a resolved endpoint to the one [`DataSource`] serving it. Lookups for
/// different endpoints proceed in parallel. Concurrent first connects to the
/// same endpoint join a single open attempt: the link is opened exactly once
/// and every caller sees that attempt's DataSource or its failure.
use crate::constants::TOKIO_RUNTIME;
use crate::datasource::DataSource;
use crate::error::{Error, Result};
use crate::models::{EvictionPolicy, ProtocolVersion};
use crate::transport::Connector;
use crate::utils::{block_on_with_timeout, safe_lock, safe_lock_arc};
use std::collections::HashMap;
use std::fmt;
use std::net::IpAddr;
use std::sync::{Arc, Mutex, OnceLock, Weak};
use std::time::Duration;
use tracing::{debug, warn};

/// Identity of an endpoint: resolved address, port and protocol version
///
/// Two host names that resolve to the same address share one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EndpointKey {
    pub address: IpAddr,
    pub port: u16,
    pub protocol_version: ProtocolVersion,
}

impl EndpointKey {
    pub fn new(address: IpAddr, port: u16, protocol_version: ProtocolVersion) -> Self {
        Self {
            address,
            port,
            protocol_version,
        }
    }
}

impl fmt::Display for EndpointKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.address {
            IpAddr::V4(v4) => write!(f, "{v4}:{}", self.port)?,
            IpAddr::V6(v6) => write!(f, "[{v6}]:{}", self.port)?,
        }
        write!(f, " ({:?})", self.protocol_version)
    }
}

/// One open attempt, shared by every caller that joins it
type Attempt = OnceLock<std::result::Result<Arc<DataSource>, Arc<Error>>>;

/// What the registry holds for one endpoint
enum Slot {
    Empty,
    /// An open is in flight
    Opening(Arc<Attempt>),
    /// Kept alive by the registry itself
    Held(Arc<DataSource>),
    /// Kept alive only by the Connections using it
    Watched(Weak<DataSource>),
}

impl Slot {
    fn live(&self) -> Option<Arc<DataSource>> {
        match self {
            Slot::Empty | Slot::Opening(_) => None,
            Slot::Held(ds) => Some(Arc::clone(ds)),
            Slot::Watched(weak) => weak.upgrade(),
        }
    }

    fn is_opening(&self) -> bool {
        matches!(self, Slot::Opening(_))
    }
}

/// Registry of DataSources, one per endpoint
pub struct EndpointRegistry {
    connector: Arc<dyn Connector>,
    eviction: EvictionPolicy,
    open_timeout: Duration,
    slots: Mutex<HashMap<EndpointKey, Arc<Mutex<Slot>>>>,
}

impl EndpointRegistry {
    pub fn new(
        connector: Arc<dyn Connector>,
        eviction: EvictionPolicy,
        open_timeout: Duration,
    ) -> Self {
        Self {
            connector,
            eviction,
            open_timeout,
            slots: Mutex::new(HashMap::new()),
        }
    }

    pub fn eviction(&self) -> EvictionPolicy {
        self.eviction
    }

    /// Resolve a host to the key its DataSource is registered under.
    ///
    /// Resolution failure is reported as [`Error::CannotConnect`].
    pub fn resolve(
        &self,
        host: &str,
        port: u16,
        protocol_version: ProtocolVersion,
    ) -> Result<EndpointKey> {
        let address = TOKIO_RUNTIME
            .block_on(self.connector.resolve(host, port))
            .map_err(|e| {
                warn!(host, port, error = %e, "host resolution failed");
                Error::CannotConnect {
                    host: host.to_string(),
                    port,
                    source: Box::new(e),
                }
            })?;
        Ok(EndpointKey::new(address, port, protocol_version))
    }

    /// The live DataSource for `key`, opening one if there is none.
    ///
    /// A caller that finds an open in flight waits for it and takes its
    /// outcome instead of starting another. A failed open is reported to every
    /// caller that joined it, then leaves the slot empty so the next call
    /// tries again.
    pub fn get_or_create(&self, key: &EndpointKey) -> Result<Arc<DataSource>> {
        let slot = {
            let mut slots = safe_lock(&self.slots, "get_or_create slots")?;
            Arc::clone(
                slots
                    .entry(*key)
                    .or_insert_with(|| Arc::new(Mutex::new(Slot::Empty))),
            )
        };

        let attempt = {
            let mut guard = safe_lock_arc(&slot, "get_or_create slot")?;
            if let Some(ds) = guard.live() {
                debug!(endpoint = %key, "reusing DataSource");
                return Ok(ds);
            }
            match &*guard {
                Slot::Opening(attempt) => Arc::clone(attempt),
                _ => {
                    let attempt = Arc::new(Attempt::new());
                    *guard = Slot::Opening(Arc::clone(&attempt));
                    attempt
                }
            }
        };

        let outcome = attempt.get_or_init(|| self.open(key)).clone();

        let mut guard = safe_lock_arc(&slot, "get_or_create slot")?;
        if matches!(&*guard, Slot::Opening(current) if Arc::ptr_eq(current, &attempt)) {
            *guard = match (&outcome, self.eviction) {
                (Err(_), _) => Slot::Empty,
                (Ok(ds), EvictionPolicy::Never) => Slot::Held(Arc::clone(ds)),
                (Ok(ds), EvictionPolicy::WhenUnused) => Slot::Watched(Arc::downgrade(ds)),
            };
        }
        drop(guard);

        outcome.map_err(|e| Error::shared(&e))
    }

    fn open(&self, key: &EndpointKey) -> std::result::Result<Arc<DataSource>, Arc<Error>> {
        debug!(endpoint = %key, "opening DataSource");
        let connector = Arc::clone(&self.connector);
        let key = *key;
        block_on_with_timeout(self.open_timeout, async move {
            DataSource::open(connector.as_ref(), key).await
        })
        .map(Arc::new)
        .map_err(|e| {
            warn!(endpoint = %key, error = %e, "failed to open DataSource");
            Arc::new(e)
        })
    }

    /// The live DataSource for `key`, if any, without opening one.
    pub fn get(&self, key: &EndpointKey) -> Result<Option<Arc<DataSource>>> {
        let slot = {
            let slots = safe_lock(&self.slots, "get slots")?;
            match slots.get(key) {
                Some(slot) => Arc::clone(slot),
                None => return Ok(None),
            }
        };
        let slot = safe_lock_arc(&slot, "get slot")?;
        Ok(slot.live())
    }

    /// Number of endpoints with a live DataSource.
    pub fn live_count(&self) -> Result<usize> {
        let slots: Vec<_> = safe_lock(&self.slots, "live_count slots")?
            .values()
            .cloned()
            .collect();
        let mut live = 0;
        for slot in slots {
            if safe_lock_arc(&slot, "live_count slot")?.live().is_some() {
                live += 1;
            }
        }
        Ok(live)
    }

    /// Forget endpoints whose DataSource is gone. Returns how many were removed.
    pub fn prune(&self) -> Result<usize> {
        let mut slots = safe_lock(&self.slots, "prune slots")?;
        let before = slots.len();
        // A slot another thread holds or is opening right now stays.
        slots.retain(|_, slot| match slot.try_lock() {
            Ok(guard) => guard.is_opening() || guard.live().is_some(),
            Err(_) => true,
        });
        Ok(before - slots.len())
    }

    /// Close and forget every DataSource the registry holds.
    ///
    /// Connections still using one will fail on their next wire call.
    pub fn close_all(&self) -> Result<()> {
        let drained: Vec<_> = safe_lock(&self.slots, "close_all slots")?
            .drain()
            .collect();
        let mut first_error = None;
        for (key, slot) in drained {
            let ds = {
                let mut slot = safe_lock_arc(&slot, "close_all slot")?;
                let ds = slot.live();
                *slot = Slot::Empty;
                ds
            };
            if let Some(ds) = ds {
                if let Err(e) = ds.close() {
                    warn!(endpoint = %key, error = %e, "failed to close DataSource");
                    first_error.get_or_insert(e);
                }
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

impl fmt::Debug for EndpointRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EndpointRegistry")
            .field("eviction", &self.eviction)
            .field("open_timeout", &self.open_timeout)
            .finish_non_exhaustive()
    }
}
