//! Sync-guarded contract resolution
//!
//! The ResolverClient is responsible for:
//! - Refusing lookups while the chain client is initializing or syncing
//! - Hashing the name into its on-chain identifier
//! - Binding the registry contracts exactly once, on first use
//! - Walking registry -> resolver -> records
//!
//! ## Flow
//!
//! ```text
//! name ──► attach? ──► sync_progress? ──► namehash ──► registry.resolver(node)
//!            │               │                                   │
//!     ChainInitializing  ChainSyncing              None => NotFound
//!                                                                ▼
//!                                   resolver.dns_records / resolver.content_hash
//! ```
//!
//! Names handed to this client are expected to be normalized already;
//! `ResolutionService` applies the name policy before calling in.

use crate::error::{Error, Result};
use crate::namehash::{NameIdentifier, namehash};
use crate::records::DnsRecord;
use crate::traits::{Address, ChainClient, ContentHash, ContractsFactory, RegistryContracts};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::debug;

/// Resolves names against the registry through a chain client
pub struct ResolverClient {
    chain: Arc<dyn ChainClient>,
    factory: Arc<dyn ContractsFactory>,
    registry: Address,
    contracts: OnceCell<Arc<dyn RegistryContracts>>,
}

impl ResolverClient {
    /// Create a resolver client
    ///
    /// No contract binding happens here; the registry is bound on the
    /// first lookup that gets past the sync guard.
    ///
    /// # Parameters
    ///
    /// - `chain`: chain client used for sync checks and contract calls
    /// - `factory`: builds the registry/resolver bindings
    /// - `registry`: registry contract address
    pub fn new(
        chain: Arc<dyn ChainClient>,
        factory: Arc<dyn ContractsFactory>,
        registry: Address,
    ) -> Self {
        Self {
            chain,
            factory,
            registry,
            contracts: OnceCell::new(),
        }
    }

    pub fn chain(&self) -> &Arc<dyn ChainClient> {
        &self.chain
    }

    /// Whether the contract bindings have been created yet
    pub fn is_bound(&self) -> bool {
        self.contracts.initialized()
    }

    /// Resolve the DNS address records of a normalized name
    ///
    /// # Errors
    ///
    /// - `ChainInitializing` / `ChainSyncing`: before any contract call
    /// - `NotFound`: no resolver, a reverted call, or an empty record set
    /// - `Upstream` / `Decode`: transport or payload failures
    pub async fn resolve_records(&self, name: &str) -> Result<Vec<DnsRecord>> {
        self.ensure_synced().await?;

        let node = namehash(name);
        let contracts = self.contracts().await?;
        let resolver = self.resolver_for(&contracts, name, node).await?;

        let records = contracts
            .dns_records(resolver, node, name)
            .await
            .map_err(structural)?;

        if records.is_empty() {
            return Err(Error::not_found(format!("no address records for {}", name)));
        }

        debug!("Resolved {} record(s) for {}", records.len(), name);
        Ok(records)
    }

    /// Resolve the raw 32-byte address hash of a normalized name
    ///
    /// An all-zero hash means the resolver has nothing set and is reported
    /// as `NotFound`.
    pub async fn resolve_address(&self, name: &str) -> Result<ContentHash> {
        self.ensure_synced().await?;

        let node = namehash(name);
        let contracts = self.contracts().await?;
        let resolver = self.resolver_for(&contracts, name, node).await?;

        let hash = contracts
            .content_hash(resolver, node)
            .await
            .map_err(structural)?;

        if hash == [0u8; 32] {
            return Err(Error::not_found(format!("no address hash for {}", name)));
        }

        Ok(hash)
    }

    /// Fail fast unless the chain client is attached and fully synced
    async fn ensure_synced(&self) -> Result<()> {
        if let Err(e) = self.chain.attach().await {
            debug!("{} not attachable: {}", self.chain.client_name(), e);
            return Err(Error::ChainInitializing);
        }

        match self.chain.sync_progress().await? {
            Some(progress) => {
                debug!(
                    "Chain syncing ({}/{}), refusing lookup",
                    progress.current_block, progress.highest_block
                );
                Err(Error::ChainSyncing)
            }
            None => Ok(()),
        }
    }

    async fn contracts(&self) -> Result<Arc<dyn RegistryContracts>> {
        self.contracts
            .get_or_try_init(|| async {
                debug!("Binding registry contracts at {}", self.registry);
                self.factory.bind(self.chain.clone(), self.registry)
            })
            .await
            .cloned()
    }

    async fn resolver_for(
        &self,
        contracts: &Arc<dyn RegistryContracts>,
        name: &str,
        node: NameIdentifier,
    ) -> Result<Address> {
        match contracts.resolver(node).await.map_err(structural)? {
            Some(resolver) if !resolver.is_zero() => Ok(resolver),
            _ => Err(Error::not_found(format!("no resolver set for {}", name))),
        }
    }
}

fn structural(err: Error) -> Error {
    match err {
        Error::CallReverted(msg) => Error::NotFound(msg),
        other => other,
    }
}
