//! Registry and resolver bindings over `eth_call`
//!
//! Calls used:
//!
//! - registry `resolver(bytes32)` -> `address`
//! - resolver `dnsRecord(bytes32,bytes32,uint16)` -> `bytes` (RFC 1035 RRs)
//! - resolver `content(bytes32)` -> `bytes32`

use crate::abi;
use async_trait::async_trait;
use enslite_core::namehash::keccak256;
use enslite_core::records::{self, DnsRecord, RecordType};
use enslite_core::traits::{Address, ChainClient, ContentHash, ContractsFactory, RegistryContracts};
use enslite_core::{Error, NameIdentifier, Result};
use std::sync::Arc;
use tracing::debug;

const RESOLVER_SIG: &str = "resolver(bytes32)";
const DNS_RECORD_SIG: &str = "dnsRecord(bytes32,bytes32,uint16)";
const CONTENT_SIG: &str = "content(bytes32)";

/// Contract bindings backed by a `ChainClient`
pub struct EthContracts {
    chain: Arc<dyn ChainClient>,
    registry: Address,
}

impl EthContracts {
    pub fn new(chain: Arc<dyn ChainClient>, registry: Address) -> Self {
        Self { chain, registry }
    }

    pub fn registry(&self) -> Address {
        self.registry
    }

    async fn call(&self, to: Address, data: Vec<u8>) -> Result<Vec<u8>> {
        self.chain.call(to, data).await.map_err(|e| match e {
            Error::CallReverted(msg) => Error::NotFound(msg),
            other => other,
        })
    }
}

#[async_trait]
impl RegistryContracts for EthContracts {
    async fn resolver(&self, node: NameIdentifier) -> Result<Option<Address>> {
        let data = abi::encode_call(RESOLVER_SIG, &[*node.as_bytes()]);
        let ret = self.call(self.registry, data).await?;

        if ret.is_empty() {
            return Ok(None);
        }

        let resolver = abi::decode_address(&ret)?;
        debug!("Resolver for {} is {}", node, resolver);
        Ok((!resolver.is_zero()).then_some(resolver))
    }

    async fn dns_records(
        &self,
        resolver: Address,
        node: NameIdentifier,
        name: &str,
    ) -> Result<Vec<DnsRecord>> {
        let name_hash = keccak256(&records::encode_name(name)?);
        let data = abi::encode_call(
            DNS_RECORD_SIG,
            &[
                *node.as_bytes(),
                name_hash,
                abi::word_u64(u64::from(RecordType::A.code())),
            ],
        );

        let ret = self.call(resolver, data).await?;
        if ret.is_empty() {
            return Err(Error::not_found(format!("resolver {} has no DNS records", resolver)));
        }

        records::decode_records(&abi::decode_bytes(&ret)?)
    }

    async fn content_hash(&self, resolver: Address, node: NameIdentifier) -> Result<ContentHash> {
        let data = abi::encode_call(CONTENT_SIG, &[*node.as_bytes()]);
        let ret = self.call(resolver, data).await?;

        if ret.is_empty() {
            return Err(Error::not_found(format!("resolver {} has no content", resolver)));
        }

        abi::decode_bytes32(&ret)
    }
}

/// Factory for `EthContracts`
pub struct EthContractsFactory;

impl ContractsFactory for EthContractsFactory {
    fn bind(
        &self,
        chain: Arc<dyn ChainClient>,
        registry: Address,
    ) -> Result<Arc<dyn RegistryContracts>> {
        if registry.is_zero() {
            return Err(Error::config("registry address cannot be zero"));
        }
        Ok(Arc::new(EthContracts::new(chain, registry)))
    }
}
