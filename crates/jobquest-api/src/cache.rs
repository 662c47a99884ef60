//! Time-expiring single-value cache.

use std::future::Future;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;

/// Whether a lookup was served from the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    Hit,
    Miss,
}

/// Holds one value for `ttl`, recomputing it on the first read after expiry.
///
/// Concurrent misses are collapsed: one caller recomputes while the others
/// wait and then read the fresh value.
pub struct TtlCache<T> {
    ttl: Duration,
    slot: RwLock<Option<(Instant, T)>>,
    refill: Mutex<()>,
}

impl<T: Clone> TtlCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slot: RwLock::new(None),
            refill: Mutex::new(()),
        }
    }

    async fn fresh(&self) -> Option<T> {
        let slot = self.slot.read().await;
        match &*slot {
            Some((stored_at, value)) if stored_at.elapsed() < self.ttl => Some(value.clone()),
            _ => None,
        }
    }

    /// Return the cached value, or compute and store a new one.
    ///
    /// A failed computation leaves the previous entry untouched.
    pub async fn get_or_compute<F, Fut, E>(&self, compute: F) -> Result<(T, Lookup), E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(value) = self.fresh().await {
            return Ok((value, Lookup::Hit));
        }

        let _guard = self.refill.lock().await;
        if let Some(value) = self.fresh().await {
            return Ok((value, Lookup::Hit));
        }

        let value = compute().await?;
        *self.slot.write().await = Some((Instant::now(), value.clone()));
        Ok((value, Lookup::Miss))
    }
}
