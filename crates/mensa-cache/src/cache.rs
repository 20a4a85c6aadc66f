use std::fmt::Display;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// A cached value together with the time it was fetched
#[derive(Debug)]
pub struct CacheSnapshot<T> {
    pub value: Arc<T>,
    pub fetched_at: DateTime<Utc>,
}

impl<T> Clone for CacheSnapshot<T> {
    fn clone(&self) -> Self {
        Self {
            value: Arc::clone(&self.value),
            fetched_at: self.fetched_at,
        }
    }
}

/// Single-slot TTL cache with single-flight refresh.
///
/// The slot lock is held for the whole refresh, so at most one refresh runs
/// at a time. Callers that arrive during a refresh queue on the lock and get
/// that refresh's outcome once they hold it: the new value after a success,
/// a clone of its error after a failure. Only a caller that arrives after a
/// refresh has finished starts a new one.
///
/// A failed refresh never touches the cached value.
pub struct CacheGate<T, E> {
    ttl: Duration,
    /// Number of refreshes that have finished, successful or not
    completed: AtomicU64,
    slot: Mutex<Slot<T, E>>,
}

struct Slot<T, E> {
    entry: Option<CacheSnapshot<T>>,
    /// Error of the most recent refresh, tagged with the value `completed`
    /// took when it finished. Cleared by the next successful refresh.
    last_failure: Option<(u64, E)>,
}

impl<T, E> CacheGate<T, E>
where
    E: Clone + Display,
{
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            completed: AtomicU64::new(0),
            slot: Mutex::new(Slot {
                entry: None,
                last_failure: None,
            }),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Return the cached value if it is younger than the TTL at `now`,
    /// otherwise run `refresh` and store its result stamped with `now`.
    pub async fn get_or_refresh<F, Fut>(&self, now: DateTime<Utc>, refresh: F) -> Result<Arc<T>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        // Refreshes that finish after this point ran while we were queued
        let seen = self.completed.load(Ordering::Acquire);
        let mut slot = self.slot.lock().await;

        match slot.entry.as_ref() {
            Some(entry) if self.is_fresh(entry, now) => {
                debug!("Cache hit (fetched at {})", entry.fetched_at);
                return Ok(Arc::clone(&entry.value));
            }
            _ => {}
        }

        if let Some((finished, err)) = slot.last_failure.as_ref() {
            if *finished > seen {
                debug!("Sharing failure of the refresh we queued behind: {}", err);
                return Err(err.clone());
            }
        }

        match slot.entry.as_ref() {
            Some(entry) => info!("Cache expired (fetched at {}), refreshing", entry.fetched_at),
            None => info!("Cache empty, fetching"),
        }

        let outcome = refresh().await;
        let finished = self.completed.fetch_add(1, Ordering::AcqRel) + 1;

        match outcome {
            Ok(value) => {
                let value = Arc::new(value);
                slot.entry = Some(CacheSnapshot {
                    value: Arc::clone(&value),
                    fetched_at: now,
                });
                slot.last_failure = None;
                Ok(value)
            }
            Err(err) => {
                warn!("Refresh failed, cache left unchanged: {}", err);
                slot.last_failure = Some((finished, err.clone()));
                Err(err)
            }
        }
    }

    /// Current contents, fresh or not
    pub async fn snapshot(&self) -> Option<CacheSnapshot<T>> {
        self.slot.lock().await.entry.clone()
    }

    /// Drop the cached value so the next call refreshes
    pub async fn invalidate(&self) {
        let mut slot = self.slot.lock().await;
        slot.entry = None;
        slot.last_failure = None;
    }

    fn is_fresh(&self, entry: &CacheSnapshot<T>, now: DateTime<Utc>) -> bool {
        // Callers that queued behind a refresh may carry a `now` slightly
        // older than the new stamp; a negative age counts as fresh.
        now.signed_duration_since(entry.fetched_at) < self.ttl
    }
}
