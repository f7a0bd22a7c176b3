// # Chain Client Trait
//
// Defines the interface to the blockchain client the resolver rides on.
//
// ## Implementations
//
// - JSON-RPC over HTTP: `enslite-rpc` crate
//
// ## Usage
//
// ```rust,ignore
// use enslite_core::ChainClient;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let chain = /* ChainClient implementation */;
//
//     chain.start().await?;
//     match chain.sync_progress().await? {
//         Some(progress) => println!("syncing: {:?}", progress),
//         None => println!("synced"),
//     }
//
//     Ok(())
// }
// ```

use crate::traits::Address;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Block-range progress reported by a syncing chain client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncProgress {
    /// Block the current sync started at
    pub starting_block: u64,
    /// Block the client has reached
    pub current_block: u64,
    /// Highest block known on the network
    pub highest_block: u64,
}

impl SyncProgress {
    pub fn new(starting_block: u64, current_block: u64, highest_block: u64) -> Self {
        Self {
            starting_block,
            current_block,
            highest_block,
        }
    }
}

/// Trait for chain client implementations
///
/// The chain client is a black box: the resolver trusts whatever it
/// returns and never re-verifies chain validity.
///
/// # Thread Safety
///
/// Implementations must be thread-safe; every method is called
/// concurrently from connection handlers and the sync poller.
///
/// # Errors
///
/// - `Error::ChainInitializing`: the client cannot be attached yet
/// - `Error::CallReverted`: a call reached the chain and reverted
/// - `Error::Upstream`: any transport failure
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Start the client
    async fn start(&self) -> Result<(), crate::Error>;

    /// Stop the client
    ///
    /// After `stop()` every other method fails with `ChainInitializing`.
    async fn stop(&self) -> Result<(), crate::Error>;

    /// Check the client can be attached to
    async fn attach(&self) -> Result<(), crate::Error>;

    /// Query sync progress
    ///
    /// # Returns
    ///
    /// - `Ok(Some(SyncProgress))`: the client is syncing
    /// - `Ok(None)`: the client is fully synced
    /// - `Err(Error::ChainInitializing)`: the client is not attachable yet
    async fn sync_progress(&self) -> Result<Option<SyncProgress>, crate::Error>;

    /// Issue a read-only contract call against the latest block
    ///
    /// # Parameters
    ///
    /// - `to`: contract address
    /// - `data`: ABI-encoded call data
    ///
    /// # Returns
    ///
    /// The raw ABI-encoded return data
    async fn call(&self, to: Address, data: Vec<u8>) -> Result<Vec<u8>, crate::Error>;

    /// Get the client name (for logging/debugging)
    fn client_name(&self) -> &'static str;
}
