// # Ethereum JSON-RPC Chain Collaborator
//
// This crate provides the concrete chain client and contract bindings for
// the ENS light resolver.
//
// ## Components
//
// - `RpcChainClient`: `ChainClient` over a node's HTTP JSON-RPC endpoint
// - `EthContracts`: `RegistryContracts` encoded as `eth_call`s
// - `abi`: the small slice of Solidity ABI encoding the calls need
//
// ## Error Mapping
//
// - Connection refused: `ChainInitializing` (the node is not up yet)
// - JSON-RPC revert (code 3 or a "revert" message): `CallReverted`,
//   which the bindings turn into `NotFound`
// - Anything else on the wire: `Upstream`
//
// ## Trust
//
// The node is trusted. Nothing returned here is re-verified against
// chain state.

pub mod abi;
pub mod client;
pub mod contracts;

pub use client::RpcChainClient;
pub use contracts::{EthContracts, EthContractsFactory};
