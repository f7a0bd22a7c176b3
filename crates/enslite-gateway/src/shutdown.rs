//! Orderly shutdown shared by the stop endpoint and the daemon's signal handler
//!
//! Triggering runs, once:
//! 1. stop the chain client
//! 2. close the sync hub (streaming sessions end)
//! 3. flip the watch flag the server and poller are waiting on

use enslite_core::{ResolutionService, SyncProgressHub};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::watch;
use tracing::{info, warn};

#[derive(Clone)]
pub struct Shutdown {
    triggered: Arc<AtomicBool>,
    tx: Arc<watch::Sender<bool>>,
    service: Arc<ResolutionService>,
    hub: Arc<SyncProgressHub>,
}

impl Shutdown {
    pub fn new(service: Arc<ResolutionService>, hub: Arc<SyncProgressHub>) -> Self {
        let (tx, _) = watch::channel(false);
        Self {
            triggered: Arc::new(AtomicBool::new(false)),
            tx: Arc::new(tx),
            service,
            hub,
        }
    }

    /// Receiver that observes `true` once shutdown has been triggered
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }

    pub fn is_triggered(&self) -> bool {
        self.triggered.load(Ordering::SeqCst)
    }

    /// Run the shutdown sequence; later calls are no-ops
    pub async fn trigger(&self) {
        if self.triggered.swap(true, Ordering::SeqCst) {
            return;
        }

        info!("Shutdown requested");
        if let Err(e) = self.service.stop().await {
            warn!("Continuing shutdown after chain client error: {}", e);
        }
        self.hub.close();
        self.tx.send_replace(true);
    }

    /// Resolves once shutdown has been triggered
    pub async fn wait(mut rx: watch::Receiver<bool>) {
        if rx.wait_for(|stop| *stop).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
