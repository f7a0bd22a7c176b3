// # Contract Binding Traits
//
// Defines the interface to the on-chain registry and resolver contracts.
//
// ## Implementations
//
// - `eth_call` based bindings: `enslite-rpc` crate
//
// The registry maps a name identifier to a resolver address; the resolver
// maps the same identifier to record data.
//
// ```text
// NameIdentifier ──► registry.resolver(node) ──► Address
//                                                  │
//                    resolver.dnsRecord(node, ..) ◄┤
//                    resolver.content(node)       ◄┘
// ```

use crate::namehash::NameIdentifier;
use crate::records::DnsRecord;
use crate::traits::ChainClient;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Raw 32-byte content hash returned by a resolver
pub type ContentHash = [u8; 32];

/// 20-byte contract address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address([u8; 20]);

impl Address {
    pub const ZERO: Self = Self([0u8; 20]);

    pub const fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for Address {
    type Err = crate::Error;

    /// Parse a hex address, with or without `0x`; checksum casing is not enforced
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(digits)
            .map_err(|e| crate::Error::malformed(format!("invalid address '{}': {}", s, e)))?;
        let bytes: [u8; 20] = bytes.try_into().map_err(|_| {
            crate::Error::malformed(format!("address must be 20 bytes: '{}'", s))
        })?;
        Ok(Self(bytes))
    }
}

/// Trait for registry/resolver contract bindings
///
/// # Errors
///
/// Structural failures (no resolver, reverted call, empty record set)
/// surface as `Error::NotFound`; transport failures as `Error::Upstream`.
///
/// # Thread Safety
///
/// A single binding is shared by every resolution; calls are stateless.
#[async_trait]
pub trait RegistryContracts: Send + Sync {
    /// Look up the resolver registered for a name
    ///
    /// # Returns
    ///
    /// - `Ok(Some(Address))`: the resolver address
    /// - `Ok(None)`: no resolver set for this name
    async fn resolver(&self, node: NameIdentifier) -> Result<Option<Address>, crate::Error>;

    /// Fetch address records for a name from its resolver
    ///
    /// # Parameters
    ///
    /// - `resolver`: resolver contract address
    /// - `node`: namehash of `name`
    /// - `name`: normalized dotted name
    async fn dns_records(
        &self,
        resolver: Address,
        node: NameIdentifier,
        name: &str,
    ) -> Result<Vec<DnsRecord>, crate::Error>;

    /// Fetch the raw content hash for a name from its resolver
    async fn content_hash(
        &self,
        resolver: Address,
        node: NameIdentifier,
    ) -> Result<ContentHash, crate::Error>;
}

/// Helper trait for constructing contract bindings
///
/// Called at most once per `ResolverClient`, on first use.
pub trait ContractsFactory: Send + Sync {
    /// Bind the registry at `registry` through `chain`
    fn bind(
        &self,
        chain: Arc<dyn ChainClient>,
        registry: Address,
    ) -> Result<Arc<dyn RegistryContracts>, crate::Error>;
}
