/// Utility functions and helpers for the DoqueDB client
///
/// This module provides the locking helpers, the bridge from the blocking API
/// onto the shared runtime, and the small drain loop used for control
/// statements.
use crate::constants::TOKIO_RUNTIME;
use crate::error::{Error, Result};
use crate::transport::{Tuple, WireResultSet, WireResult};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// Safely lock a mutex with proper error handling
///
/// Returns a descriptive error if the mutex is poisoned.
pub fn safe_lock<'a, T>(mutex: &'a Mutex<T>, context: &str) -> Result<MutexGuard<'a, T>> {
    mutex
        .lock()
        .map_err(|e| Error::unexpected(format!("Mutex poisoned in {context}: {e}")))
}

/// Safely lock an Arc<Mutex<T>> with proper error handling
///
/// Returns a descriptive error if the mutex is poisoned.
pub fn safe_lock_arc<'a, T>(
    arc_mutex: &'a Arc<Mutex<T>>,
    context: &str,
) -> Result<MutexGuard<'a, T>> {
    arc_mutex
        .lock()
        .map_err(|e| Error::unexpected(format!("Arc mutex poisoned in {context}: {e}")))
}

/// Drive a wire future to completion on the shared runtime.
pub fn block_on_wire<F, T>(future: F) -> Result<T>
where
    F: Future<Output = WireResult<T>>,
{
    TOKIO_RUNTIME.block_on(future).map_err(Error::from)
}

/// Drive a wire future on the shared runtime, giving up after `timeout`.
///
/// An elapsed timeout is reported as a transport failure.
pub fn block_on_with_timeout<F, T>(timeout: Duration, future: F) -> Result<T>
where
    F: Future<Output = WireResult<T>>,
{
    TOKIO_RUNTIME.block_on(async {
        let answer = tokio::time::timeout(timeout, future).await?;
        answer.map_err(Error::from)
    })
}

/// Run a cleanup future from a destructor.
///
/// Outside any runtime this blocks until the cleanup is done. Inside one,
/// blocking would panic, so the cleanup is spawned instead.
pub fn run_cleanup<F>(future: F)
where
    F: Future<Output = ()> + Send + 'static,
{
    if tokio::runtime::Handle::try_current().is_ok() {
        TOKIO_RUNTIME.spawn(future);
    } else {
        TOKIO_RUNTIME.block_on(future);
    }
}

/// Read a control statement's answer to the end, then close it.
///
/// Returns the number of data rows seen.
pub async fn drain(mut result: Box<dyn WireResultSet>) -> WireResult<usize> {
    let mut rows = 0;
    loop {
        match result.next_tuple().await? {
            Tuple::MetaData(_) => {}
            Tuple::Data(_) => rows += 1,
            Tuple::End => break,
        }
    }
    result.close().await?;
    Ok(rows)
}
