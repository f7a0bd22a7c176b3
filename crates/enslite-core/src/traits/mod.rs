//! Collaborator traits for the ENS light resolver
//!
//! This module defines the abstract interfaces the resolution core talks to.
//!
//! - [`ChainClient`]: attach to a chain node, report sync progress, issue read-only calls
//! - [`RegistryContracts`]: registry/resolver contract bindings
//! - [`ContractsFactory`]: one-shot construction of the contract bindings

pub mod chain_client;
pub mod contracts;

pub use chain_client::{ChainClient, SyncProgress};
pub use contracts::{Address, ContentHash, ContractsFactory, RegistryContracts};
