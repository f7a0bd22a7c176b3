//! Configuration types for the ENS light resolver
//!
//! This module defines all configuration structures used throughout the crate.

use crate::traits::Address;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Mainnet ENS registry
pub const DEFAULT_REGISTRY_ADDRESS: &str = "0x00000000000C2E074eC69A0dFb2997BA6C7d2e1e";

/// Main resolver configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnsConfig {
    /// Data directory handed to the chain collaborator
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Chain connection settings
    #[serde(default)]
    pub chain: ChainConfig,

    /// HTTP / streaming surface
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Resolution cache settings
    #[serde(default)]
    pub cache: CacheConfig,

    /// Sync-progress hub settings
    #[serde(default)]
    pub hub: HubConfig,
}

impl EnsConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self {
            data_dir: default_data_dir(),
            chain: ChainConfig::default(),
            gateway: GatewayConfig::default(),
            cache: CacheConfig::default(),
            hub: HubConfig::default(),
        }
    }

    /// Load a configuration file, filling missing fields with defaults
    pub fn load(path: &Path) -> Result<Self, crate::Error> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            crate::Error::config(format!("cannot read {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&raw).map_err(|e| {
            crate::Error::config(format!("invalid config file {}: {}", path.display(), e))
        })
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.data_dir.as_os_str().is_empty() {
            return Err(crate::Error::config("data_dir cannot be empty"));
        }

        self.chain.validate()?;
        self.gateway.validate()?;
        self.cache.validate()?;
        self.hub.validate()?;

        Ok(())
    }
}

impl Default for EnsConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Default data directory
///
/// - Linux: `~/.ens`
/// - macOS: `~/Library/Application Support/ens`
/// - elsewhere: `~/ens`
///
/// Falls back to a relative directory when no home directory is known.
pub fn default_data_dir() -> PathBuf {
    let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));

    if cfg!(target_os = "linux") {
        home.join(".ens")
    } else if cfg!(target_os = "macos") {
        home.join("Library").join("Application Support").join("ens")
    } else {
        home.join("ens")
    }
}

/// Chain connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    /// JSON-RPC endpoint of the local node
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,

    /// Registry contract address
    #[serde(default = "default_registry_address")]
    pub registry_address: String,

    /// Per-request timeout (in seconds)
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl ChainConfig {
    /// Validate the chain configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.rpc_url.is_empty() {
            return Err(crate::Error::config("chain.rpc_url cannot be empty"));
        }
        if !self.rpc_url.starts_with("http://") && !self.rpc_url.starts_with("https://") {
            return Err(crate::Error::config(format!(
                "chain.rpc_url must use HTTP or HTTPS scheme. Got: {}",
                self.rpc_url
            )));
        }
        self.registry()?;
        if self.request_timeout_secs == 0 {
            return Err(crate::Error::config("chain.request_timeout_secs must be > 0"));
        }
        Ok(())
    }

    /// Parsed registry address
    pub fn registry(&self) -> Result<Address, crate::Error> {
        self.registry_address.parse().map_err(|_| {
            crate::Error::config(format!(
                "chain.registry_address is not a valid address: {}",
                self.registry_address
            ))
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            rpc_url: default_rpc_url(),
            registry_address: default_registry_address(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// HTTP / streaming surface configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Listen address; must be loopback (the stop endpoint is unauthenticated)
    #[serde(default = "default_listen_addr")]
    pub listen_addr: SocketAddr,

    /// Path of the streaming endpoint
    #[serde(default = "default_ws_path")]
    pub ws_path: String,

    /// Outbound buffer per streaming subscriber
    ///
    /// A subscriber whose buffer is full when an event is broadcast is dropped.
    #[serde(default = "default_subscriber_buffer")]
    pub subscriber_buffer: usize,

    /// Relay client-sent messages to every subscriber
    #[serde(default = "default_relay_client_messages")]
    pub relay_client_messages: bool,
}

impl GatewayConfig {
    /// Validate the gateway configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if !self.listen_addr.ip().is_loopback() {
            return Err(crate::Error::config(format!(
                "gateway.listen_addr must be a loopback address. Got: {}",
                self.listen_addr
            )));
        }
        if !self.ws_path.starts_with('/') {
            return Err(crate::Error::config("gateway.ws_path must start with '/'"));
        }
        if self.ws_path == "/resolver" || self.ws_path.starts_with("/resolver/") {
            return Err(crate::Error::config(
                "gateway.ws_path cannot live under /resolver",
            ));
        }
        if self.subscriber_buffer == 0 {
            return Err(crate::Error::config("gateway.subscriber_buffer must be > 0"));
        }
        Ok(())
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            ws_path: default_ws_path(),
            subscriber_buffer: default_subscriber_buffer(),
            relay_client_messages: default_relay_client_messages(),
        }
    }
}

/// Case policy applied to names before hashing and caching
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NameNormalization {
    /// ASCII-lowercase every name
    #[default]
    Lowercase,
    /// Use names exactly as requested
    Preserve,
}

impl std::str::FromStr for NameNormalization {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lowercase" => Ok(Self::Lowercase),
            "preserve" => Ok(Self::Preserve),
            other => Err(crate::Error::config(format!(
                "unknown name normalization '{}'. Valid: lowercase, preserve",
                other
            ))),
        }
    }
}

/// Resolution cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Upper bound applied to record TTLs (in seconds)
    #[serde(default = "default_max_ttl_secs")]
    pub max_ttl_secs: u64,

    /// Case policy for names
    #[serde(default)]
    pub normalization: NameNormalization,
}

impl CacheConfig {
    /// Validate the cache configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.max_ttl_secs == 0 {
            return Err(crate::Error::config("cache.max_ttl_secs must be > 0"));
        }
        Ok(())
    }

    pub fn max_ttl(&self) -> Duration {
        Duration::from_secs(self.max_ttl_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_ttl_secs: default_max_ttl_secs(),
            normalization: NameNormalization::default(),
        }
    }
}

/// Sync-progress hub configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HubConfig {
    /// Delay before the first poll (in milliseconds)
    #[serde(default = "default_warmup_ms")]
    pub warmup_ms: u64,

    /// Interval between polls (in milliseconds)
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl HubConfig {
    /// Validate the hub configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.poll_interval_ms == 0 {
            return Err(crate::Error::config("hub.poll_interval_ms must be > 0"));
        }
        Ok(())
    }

    pub fn warmup(&self) -> Duration {
        Duration::from_millis(self.warmup_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            warmup_ms: default_warmup_ms(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

fn default_rpc_url() -> String {
    "http://127.0.0.1:8545".to_string()
}

fn default_registry_address() -> String {
    DEFAULT_REGISTRY_ADDRESS.to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 31313))
}

fn default_ws_path() -> String {
    "/ws".to_string()
}

fn default_subscriber_buffer() -> usize {
    256
}

fn default_relay_client_messages() -> bool {
    true
}

fn default_max_ttl_secs() -> u64 {
    86_400
}

fn default_warmup_ms() -> u64 {
    5_000
}

fn default_poll_interval_ms() -> u64 {
    100
}
