//! Resolution service
//!
//! Owns everything a request handler needs: the name policy, the cache
//! and the resolver client. Built once at startup and shared by handle
//! with the gateway and background tasks.

use crate::cache::ResolutionCache;
use crate::config::EnsConfig;
use crate::error::Result;
use crate::namehash::NamePolicy;
use crate::records::DnsRecord;
use crate::resolver::ResolverClient;
use crate::traits::{ChainClient, ContentHash, ContractsFactory};
use std::sync::Arc;
use tracing::{info, warn};

pub struct ResolutionService {
    policy: NamePolicy,
    cache: ResolutionCache,
    resolver: Arc<ResolverClient>,
}

impl ResolutionService {
    /// Build the service from its collaborators and configuration
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the configured registry address is invalid.
    pub fn new(
        chain: Arc<dyn ChainClient>,
        factory: Arc<dyn ContractsFactory>,
        config: &EnsConfig,
    ) -> Result<Self> {
        let registry = config.chain.registry()?;

        Ok(Self {
            policy: NamePolicy::new(config.cache.normalization),
            cache: ResolutionCache::new(config.cache.max_ttl()),
            resolver: Arc::new(ResolverClient::new(chain, factory, registry)),
        })
    }

    /// DNS records for `name`, served from cache while fresh
    ///
    /// Concurrent misses for the same normalized name share one upstream
    /// resolution.
    pub async fn resolve_dns(&self, name: &str) -> Result<Vec<DnsRecord>> {
        let key = self.policy.normalize(name)?;

        let resolver = self.resolver.clone();
        let fetch_name = key.clone();
        self.cache
            .resolve_or_fetch(&key, move || async move {
                resolver.resolve_records(&fetch_name).await
            })
            .await
    }

    /// Address hash for `name`, always read live
    pub async fn resolve_address(&self, name: &str) -> Result<ContentHash> {
        let key = self.policy.normalize(name)?;
        self.resolver.resolve_address(&key).await
    }

    /// Stop the underlying chain client
    pub async fn stop(&self) -> Result<()> {
        let chain = self.resolver.chain();
        info!("Stopping chain client {}", chain.client_name());

        chain.stop().await.inspect_err(|e| {
            warn!("Chain client did not stop cleanly: {}", e);
        })
    }

    pub fn chain(&self) -> Arc<dyn ChainClient> {
        self.resolver.chain().clone()
    }

    pub fn cache(&self) -> &ResolutionCache {
        &self.cache
    }

    pub fn policy(&self) -> &NamePolicy {
        &self.policy
    }
}
