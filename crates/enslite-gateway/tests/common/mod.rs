//! Test doubles for gateway contract tests

use async_trait::async_trait;
use enslite_core::config::{EnsConfig, GatewayConfig};
use enslite_core::error::{Error, Result};
use enslite_core::traits::{
    Address, ChainClient, ContentHash, ContractsFactory, RegistryContracts, SyncProgress,
};
use enslite_core::{DnsRecord, NameIdentifier, ResolutionService, SyncProgressHub, namehash};
use enslite_gateway::Gateway;
use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Chain client with a switchable syncing flag
#[derive(Clone, Default)]
pub struct MockChainClient {
    syncing: Arc<AtomicBool>,
    stopped: Arc<AtomicBool>,
    stop_calls: Arc<AtomicUsize>,
}

impl MockChainClient {
    pub fn syncing() -> Self {
        let chain = Self::default();
        chain.set_syncing(true);
        chain
    }

    pub fn synced() -> Self {
        Self::default()
    }

    pub fn set_syncing(&self, syncing: bool) {
        self.syncing.store(syncing, Ordering::SeqCst);
    }

    pub fn stop_calls(&self) -> usize {
        self.stop_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChainClient for MockChainClient {
    async fn start(&self) -> Result<()> {
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        self.stop_calls.fetch_add(1, Ordering::SeqCst);
        self.stopped.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn attach(&self) -> Result<()> {
        if self.stopped.load(Ordering::SeqCst) {
            return Err(Error::ChainInitializing);
        }
        Ok(())
    }

    async fn sync_progress(&self) -> Result<Option<SyncProgress>> {
        if self.syncing.load(Ordering::SeqCst) {
            Ok(Some(SyncProgress::new(0, 50, 100)))
        } else {
            Ok(None)
        }
    }

    async fn call(&self, _to: Address, _data: Vec<u8>) -> Result<Vec<u8>> {
        Err(Error::upstream("mock chain does not execute calls"))
    }

    fn client_name(&self) -> &'static str {
        "mock"
    }
}

/// Bindings that know `alice.eth` only
#[derive(Clone, Default)]
pub struct MockContracts {
    record_calls: Arc<AtomicUsize>,
    content_calls: Arc<AtomicUsize>,
    records: Arc<Mutex<Vec<DnsRecord>>>,
}

impl MockContracts {
    pub fn new() -> Self {
        let contracts = Self::default();
        *contracts.records.lock().unwrap() = alice_records();
        contracts
    }

    pub fn with_records(self, records: Vec<DnsRecord>) -> Self {
        *self.records.lock().unwrap() = records;
        self
    }

    pub fn record_calls(&self) -> usize {
        self.record_calls.load(Ordering::SeqCst)
    }

    pub fn content_calls(&self) -> usize {
        self.content_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RegistryContracts for MockContracts {
    async fn resolver(&self, node: NameIdentifier) -> Result<Option<Address>> {
        Ok((node == namehash("alice.eth")).then_some(Address::from_bytes([0x11; 20])))
    }

    async fn dns_records(
        &self,
        _resolver: Address,
        _node: NameIdentifier,
        _name: &str,
    ) -> Result<Vec<DnsRecord>> {
        self.record_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.records.lock().unwrap().clone())
    }

    async fn content_hash(&self, _resolver: Address, _node: NameIdentifier) -> Result<ContentHash> {
        self.content_calls.fetch_add(1, Ordering::SeqCst);
        Ok([0xab; 32])
    }
}

pub struct MockContractsFactory(pub MockContracts);

impl ContractsFactory for MockContractsFactory {
    fn bind(
        &self,
        _chain: Arc<dyn ChainClient>,
        _registry: Address,
    ) -> Result<Arc<dyn RegistryContracts>> {
        Ok(Arc::new(self.0.clone()))
    }
}

/// `alice.eth` -> A 1.2.3.4, TTL 300s
pub fn alice_records() -> Vec<DnsRecord> {
    vec![DnsRecord::a("alice.eth", 300, Ipv4Addr::new(1, 2, 3, 4))]
}

/// Everything a gateway test needs to poke at
pub struct Harness {
    pub chain: MockChainClient,
    pub contracts: MockContracts,
    pub hub: Arc<SyncProgressHub>,
    pub gateway: Gateway,
}

pub fn harness(chain: MockChainClient, contracts: MockContracts) -> Harness {
    let config = EnsConfig::default();
    let service = ResolutionService::new(
        Arc::new(chain.clone()),
        Arc::new(MockContractsFactory(contracts.clone())),
        &config,
    )
    .expect("service construction succeeds");

    let hub = SyncProgressHub::new(config.gateway.subscriber_buffer);
    let gateway_config = GatewayConfig {
        listen_addr: "127.0.0.1:0".parse().unwrap(),
        ..config.gateway
    };
    let gateway = Gateway::new(Arc::new(service), hub.clone(), gateway_config);

    Harness {
        chain,
        contracts,
        hub,
        gateway,
    }
}
