// # enslite-core
//
// Core library for the ENS light resolver.
//
// ## Architecture Overview
//
// This library provides the resolution core shared by the daemon and the
// gateway:
// - **namehash**: Name -> 256-bit on-chain identifier, plus the name policy
// - **ResolutionCache**: TTL-bounded record cache with single-flight fetches
// - **ResolverClient**: Sync-guarded registry -> resolver -> records walk
// - **SyncProgressHub**: Polls chain sync state and fans events out to subscribers
// - **ResolutionService**: The service object handed to request handlers
// - **ChainClient / RegistryContracts**: Traits for the chain collaborators
//
// ## Design Principles
//
// 1. **Explicit Service Object**: No process-wide mutable state; everything
//    hangs off a `ResolutionService` constructed once at startup
// 2. **Trait Seams**: The chain client and contract bindings are trait
//    objects, implemented out of crate
// 3. **Library-First**: All core functionality can be used as a library

pub mod traits;
pub mod cache;
pub mod resolver;
pub mod hub;
pub mod service;
pub mod namehash;
pub mod records;
pub mod config;
pub mod error;

// Re-export core types for convenience
pub use traits::{Address, ChainClient, ContentHash, ContractsFactory, RegistryContracts, SyncProgress};
pub use cache::ResolutionCache;
pub use resolver::ResolverClient;
pub use hub::{StatusSnapshot, Subscription, SyncProgressHub, SyncStatus, run_sync_poller};
pub use service::ResolutionService;
pub use namehash::{NameIdentifier, NamePolicy, namehash};
pub use records::{DnsRecord, RecordData, RecordType};
pub use config::{EnsConfig, ChainConfig, GatewayConfig, CacheConfig, HubConfig, NameNormalization};
pub use error::{Error, Result};
