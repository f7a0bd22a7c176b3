//! TTL-bounded resolution cache with single-flight fetches
//!
//! The cache is responsible for:
//! - Serving previously resolved record sets until their TTL elapses
//! - Evicting stale entries lazily, on the lookup that finds them expired
//! - Collapsing concurrent misses for the same key into one upstream fetch
//!
//! ## Single-flight
//!
//! ```text
//! caller A ──miss──► [in_flight: key] ──spawn──► fetch() ──┐
//! caller B ──miss──► (joins key) ──────────wait─────────┐  │
//!                                                       ▼  ▼
//!                                        outcome ◄── store (Ok only)
//! ```
//!
//! The first caller to miss registers an in-flight marker and spawns the
//! fetch on its own task, so a caller that goes away does not cancel the
//! fetch for the others. Every waiter gets a clone of the same outcome.
//! Errors are handed to the waiters but never stored.

use crate::error::{Error, Result};
use crate::records::DnsRecord;
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::debug;

type Outcome = Option<Result<Vec<DnsRecord>>>;

/// A cached record set
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The cached records
    pub records: Vec<DnsRecord>,
    /// Entry is served only while `now < expires_at`
    pub expires_at: Instant,
}

/// An upstream fetch in progress for one key
struct Flight {
    id: u64,
    rx: watch::Receiver<Outcome>,
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<String, CacheEntry>,
    in_flight: HashMap<String, Flight>,
}

impl CacheState {
    fn lookup(&mut self, key: &str, now: Instant) -> Option<Vec<DnsRecord>> {
        let expired = match self.entries.get(key) {
            Some(entry) if now < entry.expires_at => return Some(entry.records.clone()),
            Some(_) => true,
            None => false,
        };

        if expired {
            debug!("Evicting expired cache entry for {}", key);
            self.entries.remove(key);
        }
        None
    }
}

/// Resolution cache
///
/// Keys are normalized names; values are record sets whose lifetime is the
/// TTL of their first record, capped at `max_ttl`.
///
/// ## Thread Safety
///
/// All state sits behind one mutex that is never held across an await.
/// Cloning the cache yields another handle onto the same state.
#[derive(Clone)]
pub struct ResolutionCache {
    state: Arc<Mutex<CacheState>>,
    max_ttl: Duration,
    next_flight: Arc<AtomicU64>,
}

impl ResolutionCache {
    /// Create an empty cache
    ///
    /// # Parameters
    ///
    /// - `max_ttl`: upper bound on how long any entry is served
    pub fn new(max_ttl: Duration) -> Self {
        Self {
            state: Arc::new(Mutex::new(CacheState::default())),
            max_ttl,
            next_flight: Arc::new(AtomicU64::new(0)),
        }
    }

    fn state(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Look up an unexpired entry
    ///
    /// An expired entry is removed as a side effect and reported as absent.
    pub fn lookup(&self, key: &str) -> Option<Vec<DnsRecord>> {
        self.state().lookup(key, Instant::now())
    }

    /// Insert or overwrite an entry expiring `ttl` from now
    pub fn store(&self, key: &str, records: Vec<DnsRecord>, ttl: Duration) {
        let expires_at = Instant::now() + ttl.min(self.max_ttl);
        self.state()
            .entries
            .insert(key.to_string(), CacheEntry { records, expires_at });
    }

    /// Number of stored entries, expired or not
    pub fn len(&self) -> usize {
        self.state().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of keys with a fetch in progress
    pub fn in_flight(&self) -> usize {
        self.state().in_flight.len()
    }

    /// Return the cached records for `key`, or fetch them exactly once
    ///
    /// Concurrent callers that miss on the same key share one execution of
    /// `fetch` and all receive its outcome. A successful, non-empty outcome
    /// is stored with the TTL of its first record.
    ///
    /// # Parameters
    ///
    /// - `key`: normalized name
    /// - `fetch`: upstream lookup, run on its own task
    pub async fn resolve_or_fetch<F, Fut>(&self, key: &str, fetch: F) -> Result<Vec<DnsRecord>>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<Vec<DnsRecord>>> + Send + 'static,
    {
        let mut rx = {
            let mut state = self.state();

            if let Some(records) = state.lookup(key, Instant::now()) {
                debug!("Cache hit for {}", key);
                return Ok(records);
            }

            match state.in_flight.get(key) {
                Some(flight) => {
                    debug!("Joining in-flight resolution for {}", key);
                    flight.rx.clone()
                }
                None => {
                    let id = self.next_flight.fetch_add(1, Ordering::Relaxed);
                    let (tx, rx) = watch::channel(None);
                    state.in_flight.insert(
                        key.to_string(),
                        Flight {
                            id,
                            rx: rx.clone(),
                        },
                    );

                    debug!("Cache miss for {}, starting resolution", key);
                    let guard = FlightGuard {
                        cache: self.clone(),
                        key: key.to_string(),
                        id,
                        tx,
                        completed: false,
                    };
                    tokio::spawn(async move {
                        let outcome = fetch().await;
                        guard.complete(outcome);
                    });
                    rx
                }
            }
        };

        match rx.wait_for(Option::is_some).await {
            Ok(outcome) => match outcome.as_ref() {
                Some(result) => result.clone(),
                None => Err(Error::upstream("resolution produced no outcome")),
            },
            Err(_) => Err(Error::upstream(format!(
                "resolution task for {} ended without an outcome",
                key
            ))),
        }
    }

    fn ttl_for(&self, records: &[DnsRecord]) -> Option<Duration> {
        records.first().map(|record| record.ttl().min(self.max_ttl))
    }
}

/// Clears the in-flight marker for one fetch, with or without an outcome
struct FlightGuard {
    cache: ResolutionCache,
    key: String,
    id: u64,
    tx: watch::Sender<Outcome>,
    completed: bool,
}

impl FlightGuard {
    fn complete(mut self, outcome: Result<Vec<DnsRecord>>) {
        {
            let mut state = self.cache.state();

            if let Ok(records) = &outcome {
                if let Some(ttl) = self.cache.ttl_for(records) {
                    state.entries.insert(
                        self.key.clone(),
                        CacheEntry {
                            records: records.clone(),
                            expires_at: Instant::now() + ttl,
                        },
                    );
                }
            }

            remove_flight(&mut state, &self.key, self.id);
        }

        self.completed = true;
        self.tx.send_replace(Some(outcome));
    }
}

impl Drop for FlightGuard {
    fn drop(&mut self) {
        if !self.completed {
            remove_flight(&mut self.cache.state(), &self.key, self.id);
        }
    }
}

fn remove_flight(state: &mut CacheState, key: &str, id: u64) {
    if state.in_flight.get(key).is_some_and(|flight| flight.id == id) {
        state.in_flight.remove(key);
    }
}
