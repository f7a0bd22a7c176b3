//! Test doubles and common utilities for resolver contract tests
//!
//! These doubles stand in for the chain client and the contract bindings;
//! they count calls so tests can assert how often the upstream was hit.

use async_trait::async_trait;
use enslite_core::config::EnsConfig;
use enslite_core::error::{Error, Result};
use enslite_core::traits::{
    Address, ChainClient, ContentHash, ContractsFactory, RegistryContracts, SyncProgress,
};
use enslite_core::{DnsRecord, NameIdentifier, ResolutionService, namehash};
use std::collections::{HashMap, VecDeque};
use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// What the mock chain reports from `sync_progress()`
#[derive(Debug, Clone)]
pub enum ChainState {
    Initializing,
    Syncing(SyncProgress),
    Synced,
    Failing(String),
}

/// A chain client whose sync state is set by the test
///
/// States queued with `script()` are consumed one per `sync_progress()`
/// call; the last one sticks.
#[derive(Clone)]
pub struct MockChainClient {
    states: Arc<Mutex<VecDeque<ChainState>>>,
    stopped: Arc<AtomicBool>,
    attach_calls: Arc<AtomicUsize>,
    sync_calls: Arc<AtomicUsize>,
    stop_calls: Arc<AtomicUsize>,
}

impl MockChainClient {
    pub fn new(state: ChainState) -> Self {
        Self::script(vec![state])
    }

    pub fn script(states: Vec<ChainState>) -> Self {
        Self {
            states: Arc::new(Mutex::new(states.into())),
            stopped: Arc::new(AtomicBool::new(false)),
            attach_calls: Arc::new(AtomicUsize::new(0)),
            sync_calls: Arc::new(AtomicUsize::new(0)),
            stop_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Replace whatever is queued with a single state
    pub fn set_state(&self, state: ChainState) {
        let mut states = self.states.lock().unwrap();
        states.clear();
        states.push_back(state);
    }

    pub fn attach_calls(&self) -> usize {
        self.attach_calls.load(Ordering::SeqCst)
    }

    pub fn sync_calls(&self) -> usize {
        self.sync_calls.load(Ordering::SeqCst)
    }

    pub fn stop_calls(&self) -> usize {
        self.stop_calls.load(Ordering::SeqCst)
    }

    fn current(&self) -> ChainState {
        let mut states = self.states.lock().unwrap();
        if states.len() > 1 {
            states.pop_front().unwrap()
        } else {
            states.front().cloned().unwrap_or(ChainState::Synced)
        }
    }

    fn peek(&self) -> ChainState {
        let states = self.states.lock().unwrap();
        states.front().cloned().unwrap_or(ChainState::Synced)
    }
}

#[async_trait]
impl ChainClient for MockChainClient {
    async fn start(&self) -> Result<()> {
        self.stopped.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        self.stop_calls.fetch_add(1, Ordering::SeqCst);
        self.stopped.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn attach(&self) -> Result<()> {
        self.attach_calls.fetch_add(1, Ordering::SeqCst);
        if self.stopped.load(Ordering::SeqCst) {
            return Err(Error::ChainInitializing);
        }
        match self.peek() {
            ChainState::Initializing => Err(Error::ChainInitializing),
            _ => Ok(()),
        }
    }

    async fn sync_progress(&self) -> Result<Option<SyncProgress>> {
        self.sync_calls.fetch_add(1, Ordering::SeqCst);
        if self.stopped.load(Ordering::SeqCst) {
            return Err(Error::ChainInitializing);
        }
        match self.current() {
            ChainState::Initializing => Err(Error::ChainInitializing),
            ChainState::Syncing(progress) => Ok(Some(progress)),
            ChainState::Synced => Ok(None),
            ChainState::Failing(msg) => Err(Error::upstream(msg)),
        }
    }

    async fn call(&self, _to: Address, _data: Vec<u8>) -> Result<Vec<u8>> {
        Err(Error::upstream("mock chain does not execute calls"))
    }

    fn client_name(&self) -> &'static str {
        "mock"
    }
}

/// Resolver address every registered mock name points at
pub const MOCK_RESOLVER: Address = Address::from_bytes([0x11; 20]);

#[derive(Debug, Clone, Default)]
struct MockName {
    records: Vec<DnsRecord>,
    content: ContentHash,
}

/// Contract bindings backed by an in-memory name table
#[derive(Clone, Default)]
pub struct MockContracts {
    names: Arc<Mutex<HashMap<NameIdentifier, MockName>>>,
    delay: Arc<Mutex<Duration>>,
    resolver_calls: Arc<AtomicUsize>,
    record_calls: Arc<AtomicUsize>,
    content_calls: Arc<AtomicUsize>,
}

impl MockContracts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register DNS records for `name`
    pub fn with_records(self, name: &str, records: Vec<DnsRecord>) -> Self {
        self.names
            .lock()
            .unwrap()
            .entry(namehash(name))
            .or_default()
            .records = records;
        self
    }

    /// Register an address hash for `name`
    pub fn with_content(self, name: &str, content: ContentHash) -> Self {
        self.names
            .lock()
            .unwrap()
            .entry(namehash(name))
            .or_default()
            .content = content;
        self
    }

    /// Make every record/content call take `delay`
    pub fn with_delay(self, delay: Duration) -> Self {
        *self.delay.lock().unwrap() = delay;
        self
    }

    pub fn resolver_calls(&self) -> usize {
        self.resolver_calls.load(Ordering::SeqCst)
    }

    pub fn record_calls(&self) -> usize {
        self.record_calls.load(Ordering::SeqCst)
    }

    pub fn content_calls(&self) -> usize {
        self.content_calls.load(Ordering::SeqCst)
    }

    async fn pause(&self) {
        let delay = *self.delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    fn entry(&self, node: NameIdentifier) -> Option<MockName> {
        self.names.lock().unwrap().get(&node).cloned()
    }
}

#[async_trait]
impl RegistryContracts for MockContracts {
    async fn resolver(&self, node: NameIdentifier) -> Result<Option<Address>> {
        self.resolver_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.entry(node).map(|_| MOCK_RESOLVER))
    }

    async fn dns_records(
        &self,
        _resolver: Address,
        node: NameIdentifier,
        _name: &str,
    ) -> Result<Vec<DnsRecord>> {
        self.record_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        Ok(self.entry(node).map(|entry| entry.records).unwrap_or_default())
    }

    async fn content_hash(&self, _resolver: Address, node: NameIdentifier) -> Result<ContentHash> {
        self.content_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        Ok(self.entry(node).map(|entry| entry.content).unwrap_or_default())
    }
}

/// Factory handing out one shared `MockContracts`
#[derive(Clone)]
pub struct MockContractsFactory {
    contracts: MockContracts,
    bind_calls: Arc<AtomicUsize>,
}

impl MockContractsFactory {
    pub fn new(contracts: MockContracts) -> Self {
        Self {
            contracts,
            bind_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn bind_calls(&self) -> usize {
        self.bind_calls.load(Ordering::SeqCst)
    }
}

impl ContractsFactory for MockContractsFactory {
    fn bind(
        &self,
        _chain: Arc<dyn ChainClient>,
        _registry: Address,
    ) -> Result<Arc<dyn RegistryContracts>> {
        self.bind_calls.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(self.contracts.clone()))
    }
}

/// `alice.eth` -> A 1.2.3.4, TTL 300s
pub fn alice_records() -> Vec<DnsRecord> {
    vec![DnsRecord::a("alice.eth", 300, Ipv4Addr::new(1, 2, 3, 4))]
}

/// Build a service over the given doubles with default configuration
pub fn service(chain: &MockChainClient, factory: &MockContractsFactory) -> ResolutionService {
    service_with_config(chain, factory, &EnsConfig::default())
}

pub fn service_with_config(
    chain: &MockChainClient,
    factory: &MockContractsFactory,
    config: &EnsConfig,
) -> ResolutionService {
    ResolutionService::new(Arc::new(chain.clone()), Arc::new(factory.clone()), config)
        .expect("service construction succeeds")
}
