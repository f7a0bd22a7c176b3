//! Sync-progress publish/subscribe hub
//!
//! The hub turns the chain client's pull-based sync query into a pushed
//! stream of text events:
//!
//! ```text
//!                      ┌──────────────┐ try_send ┌──────────────┐
//! ChainClient ◄─poll── │ sync poller  │ ───────► │ subscriber 1 │
//!                      │  (one task)  │    │     └──────────────┘
//!                      └──────────────┘    │     ┌──────────────┐
//!                                          └───► │ subscriber N │
//!                                                └──────────────┘
//! ```
//!
//! ## Delivery
//!
//! - Each subscriber owns a bounded FIFO channel, so per-subscriber order
//!   matches publication order.
//! - Broadcast never waits: a subscriber whose buffer is full or whose
//!   receiver is gone is dropped from the set.
//! - Register, unregister and broadcast all take the same lock, so once
//!   `unregister` returns no later broadcast reaches that subscriber.

use crate::config::HubConfig;
use crate::error::{Error, Result};
use crate::traits::{ChainClient, SyncProgress};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::IntervalStream;
use tracing::{debug, info, warn};

/// Event text while the chain client cannot be attached
pub const INITIALIZING_MESSAGE: &str = "Node initializing...";

/// Terminal event text
pub const SYNCED_MESSAGE: &str = "Fully synced";

/// Chain sync state as observed by one poll
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SyncStatus {
    Initializing,
    Syncing(SyncProgress),
    Synced,
}

impl SyncStatus {
    /// Text pushed to subscribers for this status
    pub fn message(&self) -> String {
        match self {
            SyncStatus::Initializing => INITIALIZING_MESSAGE.to_string(),
            SyncStatus::Syncing(progress) => format!("{:.2}", progress_fraction(progress)),
            SyncStatus::Synced => SYNCED_MESSAGE.to_string(),
        }
    }
}

/// Fraction of the block range covered so far, clamped to `[0, 1]`
///
/// A range with `highest <= start` has nothing left to sync and reports 1.
pub fn progress_fraction(progress: &SyncProgress) -> f64 {
    if progress.highest_block <= progress.starting_block {
        return 1.0;
    }

    let done = progress.current_block.saturating_sub(progress.starting_block) as f64;
    let total = (progress.highest_block - progress.starting_block) as f64;
    (done / total).clamp(0.0, 1.0)
}

/// Most recently published status
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusSnapshot {
    #[serde(flatten)]
    pub status: SyncStatus,
    pub message: String,
    pub observed_at: DateTime<Utc>,
}

struct HubState {
    subscribers: HashMap<u64, mpsc::Sender<String>>,
    latest: Option<StatusSnapshot>,
    closed: bool,
}

/// Fan-out hub for sync-progress events
pub struct SyncProgressHub {
    state: Mutex<HubState>,
    next_id: AtomicU64,
    buffer: usize,
}

impl SyncProgressHub {
    /// Create a hub whose subscribers each buffer up to `buffer` events
    pub fn new(buffer: usize) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(HubState {
                subscribers: HashMap::new(),
                latest: None,
                closed: false,
            }),
            next_id: AtomicU64::new(1),
            buffer: buffer.max(1),
        })
    }

    fn state(&self) -> MutexGuard<'_, HubState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a subscriber
    ///
    /// The latest status message, if any, is queued to the new subscriber
    /// before any later broadcast.
    ///
    /// # Errors
    ///
    /// Fails once the hub has been closed.
    pub fn register(self: &Arc<Self>) -> Result<Subscription> {
        let mut state = self.state();
        if state.closed {
            return Err(Error::Other("sync hub is closed".to_string()));
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::channel(self.buffer);

        if let Some(latest) = &state.latest {
            let _ = tx.try_send(latest.message.clone());
        }

        state.subscribers.insert(id, tx);
        debug!("Subscriber {} registered ({} total)", id, state.subscribers.len());

        Ok(Subscription {
            id,
            rx,
            hub: Arc::downgrade(self),
        })
    }

    /// Remove a subscriber; returns whether it was still registered
    pub fn unregister(&self, id: u64) -> bool {
        let mut state = self.state();
        let removed = state.subscribers.remove(&id).is_some();
        if removed {
            debug!("Subscriber {} unregistered ({} left)", id, state.subscribers.len());
        }
        removed
    }

    /// Deliver `message` to every subscriber without waiting
    ///
    /// # Returns
    ///
    /// The number of subscribers the message was queued for
    pub fn broadcast(&self, message: &str) -> usize {
        let mut state = self.state();
        Self::deliver(&mut state.subscribers, message)
    }

    /// Record a new status and broadcast its message
    pub fn publish(&self, status: SyncStatus) -> usize {
        let snapshot = StatusSnapshot {
            status,
            message: status.message(),
            observed_at: Utc::now(),
        };

        let mut state = self.state();
        let delivered = Self::deliver(&mut state.subscribers, &snapshot.message);
        state.latest = Some(snapshot);
        delivered
    }

    fn deliver(subscribers: &mut HashMap<u64, mpsc::Sender<String>>, message: &str) -> usize {
        subscribers.retain(|id, tx| match tx.try_send(message.to_string()) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!("Subscriber {} is not keeping up, dropping it", id);
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                debug!("Subscriber {} went away", id);
                false
            }
        });
        subscribers.len()
    }

    /// Latest published status, if any poll has completed
    pub fn latest(&self) -> Option<StatusSnapshot> {
        self.state().latest.clone()
    }

    pub fn subscriber_count(&self) -> usize {
        self.state().subscribers.len()
    }

    /// Drop every subscriber and refuse new ones
    pub fn close(&self) {
        let mut state = self.state();
        state.closed = true;
        state.subscribers.clear();
        info!("Sync hub closed");
    }

    pub fn is_closed(&self) -> bool {
        self.state().closed
    }
}

/// A registered subscriber; unregisters itself when dropped
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    rx: mpsc::Receiver<String>,
    hub: Weak<SyncProgressHub>,
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Next event, or `None` once unregistered and drained
    pub async fn recv(&mut self) -> Option<String> {
        self.rx.recv().await
    }

    pub fn try_recv(&mut self) -> Option<String> {
        self.rx.try_recv().ok()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(hub) = self.hub.upgrade() {
            hub.unregister(self.id);
        }
    }
}

impl std::fmt::Debug for SyncProgressHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncProgressHub")
            .field("subscribers", &self.subscriber_count())
            .field("buffer", &self.buffer)
            .finish()
    }
}

/// Why the poller stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollerExit {
    /// The chain reported fully synced
    Synced,
    /// The shutdown signal fired
    Shutdown,
}

/// Poll the chain's sync state and publish each observation
///
/// Waits `warmup`, then polls every `poll_interval` until the chain reports
/// no sync progress (publishing one terminal "Fully synced" event) or
/// `shutdown` becomes `true`. Poll failures other than
/// `ChainInitializing` are logged and skipped.
pub async fn run_sync_poller(
    hub: Arc<SyncProgressHub>,
    chain: Arc<dyn ChainClient>,
    config: HubConfig,
    mut shutdown: watch::Receiver<bool>,
) -> PollerExit {
    info!(
        "Sync poller starting in {:?} (interval {:?})",
        config.warmup(),
        config.poll_interval()
    );

    tokio::select! {
        _ = tokio::time::sleep(config.warmup()) => {}
        _ = shutdown_signalled(&mut shutdown) => return PollerExit::Shutdown,
    }

    let mut interval = tokio::time::interval(config.poll_interval());
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut ticks = IntervalStream::new(interval);

    loop {
        tokio::select! {
            tick = ticks.next() => {
                if tick.is_none() {
                    return PollerExit::Shutdown;
                }
            }
            _ = shutdown_signalled(&mut shutdown) => {
                info!("Sync poller stopping on shutdown");
                return PollerExit::Shutdown;
            }
        }

        match poll_status(chain.as_ref()).await {
            Ok(SyncStatus::Synced) => {
                hub.publish(SyncStatus::Synced);
                info!("Chain fully synced, sync poller exiting");
                return PollerExit::Synced;
            }
            Ok(status) => {
                hub.publish(status);
            }
            Err(e) => {
                warn!("Sync progress query failed: {}", e);
            }
        }
    }
}

/// One observation of the chain's sync state
pub async fn poll_status(chain: &dyn ChainClient) -> Result<SyncStatus> {
    match chain.sync_progress().await {
        Ok(Some(progress)) => Ok(SyncStatus::Syncing(progress)),
        Ok(None) => Ok(SyncStatus::Synced),
        Err(Error::ChainInitializing) => Ok(SyncStatus::Initializing),
        Err(e) => Err(e),
    }
}

/// Resolves once the flag is `true`; never resolves if the sender is gone
async fn shutdown_signalled(rx: &mut watch::Receiver<bool>) {
    if rx.wait_for(|stop| *stop).await.is_err() {
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_fraction() {
        assert_eq!(progress_fraction(&SyncProgress::new(0, 50, 100)), 0.5);
        assert_eq!(progress_fraction(&SyncProgress::new(10, 10, 110)), 0.0);
        assert_eq!(progress_fraction(&SyncProgress::new(0, 150, 100)), 1.0);
        assert_eq!(progress_fraction(&SyncProgress::new(100, 100, 100)), 1.0);
    }

    #[test]
    fn test_status_messages() {
        assert_eq!(SyncStatus::Initializing.message(), "Node initializing...");
        assert_eq!(SyncStatus::Syncing(SyncProgress::new(0, 42, 100)).message(), "0.42");
        assert_eq!(SyncStatus::Syncing(SyncProgress::new(0, 0, 100)).message(), "0.00");
        assert_eq!(SyncStatus::Synced.message(), "Fully synced");
    }

    #[test]
    fn test_snapshot_json_shape() {
        let snapshot = StatusSnapshot {
            status: SyncStatus::Syncing(SyncProgress::new(0, 50, 100)),
            message: "0.50".to_string(),
            observed_at: Utc::now(),
        };
        let json = serde_json::to_value(&snapshot).unwrap();

        assert_eq!(json["state"], "syncing");
        assert_eq!(json["current_block"], 50);
        assert_eq!(json["message"], "0.50");
        assert!(json["observed_at"].is_string());
    }

    #[tokio::test]
    async fn test_late_subscriber_gets_latest() {
        let hub = SyncProgressHub::new(8);
        hub.publish(SyncStatus::Synced);

        let mut sub = hub.register().unwrap();
        assert_eq!(sub.recv().await.as_deref(), Some("Fully synced"));
    }

    #[tokio::test]
    async fn test_full_subscriber_is_dropped() {
        let hub = SyncProgressHub::new(1);
        let mut slow = hub.register().unwrap();

        assert_eq!(hub.broadcast("a"), 1);
        assert_eq!(hub.broadcast("b"), 0);
        assert_eq!(hub.subscriber_count(), 0);

        assert_eq!(slow.recv().await.as_deref(), Some("a"));
        assert_eq!(slow.recv().await, None);
    }

    #[tokio::test]
    async fn test_drop_unregisters() {
        let hub = SyncProgressHub::new(4);
        let sub = hub.register().unwrap();
        assert_eq!(hub.subscriber_count(), 1);

        drop(sub);
        assert_eq!(hub.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_close_refuses_registration() {
        let hub = SyncProgressHub::new(4);
        let mut sub = hub.register().unwrap();

        hub.close();

        assert!(hub.register().is_err());
        assert_eq!(sub.recv().await, None);
    }
}
