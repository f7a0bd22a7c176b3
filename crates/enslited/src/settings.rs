//! Daemon settings: defaults, then `<data_dir>/config.json`, then environment
//!
//! ## Environment
//!
//! - `ENS_DATA_DIR`: data directory (`--datadir` wins)
//! - `ENS_RPC_URL`: node JSON-RPC endpoint
//! - `ENS_REGISTRY_ADDRESS`: ENS registry contract
//! - `ENS_LISTEN_ADDR`: gateway listen address (loopback only)
//! - `ENS_CACHE_MAX_TTL_SECS`: cap on cached record lifetimes
//! - `ENS_NAME_NORMALIZATION`: `lowercase` or `preserve`
//! - `ENS_LOG_LEVEL`: trace, debug, info, warn, error

use anyhow::{Context, Result};
use enslite_core::config::{EnsConfig, NameNormalization, default_data_dir};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use tracing::Level;

pub const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone)]
pub struct Settings {
    pub config: EnsConfig,
    pub log_level: Level,
}

impl Settings {
    /// Load from the process environment
    pub fn load(datadir: Option<PathBuf>) -> Result<Self> {
        Self::from_source(datadir, |key| std::env::var(key).ok())
    }

    /// Load with `var` standing in for the environment
    pub fn from_source<F>(datadir: Option<PathBuf>, var: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let data_dir = datadir
            .or_else(|| var("ENS_DATA_DIR").map(PathBuf::from))
            .unwrap_or_else(default_data_dir);

        let config_path = data_dir.join(CONFIG_FILE);
        let mut config = if config_path.exists() {
            EnsConfig::load(&config_path)?
        } else {
            EnsConfig::default()
        };
        config.data_dir = data_dir;

        if let Some(url) = var("ENS_RPC_URL") {
            config.chain.rpc_url = url;
        }
        if let Some(registry) = var("ENS_REGISTRY_ADDRESS") {
            config.chain.registry_address = registry;
        }
        if let Some(addr) = var("ENS_LISTEN_ADDR") {
            config.gateway.listen_addr = addr
                .parse::<SocketAddr>()
                .with_context(|| format!("ENS_LISTEN_ADDR '{}' is not a socket address", addr))?;
        }
        if let Some(secs) = var("ENS_CACHE_MAX_TTL_SECS") {
            config.cache.max_ttl_secs = secs
                .parse()
                .with_context(|| format!("ENS_CACHE_MAX_TTL_SECS '{}' is not a number", secs))?;
        }
        if let Some(policy) = var("ENS_NAME_NORMALIZATION") {
            config.cache.normalization = policy.parse::<NameNormalization>()?;
        }

        let log_level = parse_log_level(&var("ENS_LOG_LEVEL").unwrap_or_else(|| "info".into()))?;

        config.validate()?;

        Ok(Self { config, log_level })
    }

    pub fn data_dir(&self) -> &Path {
        &self.config.data_dir
    }

    /// Create the data directory if it does not exist yet
    pub fn prepare_data_dir(&self) -> Result<()> {
        std::fs::create_dir_all(self.data_dir()).with_context(|| {
            format!("cannot create data directory {}", self.data_dir().display())
        })
    }

    /// Base URL of the local gateway
    pub fn gateway_url(&self) -> String {
        format!("http://{}", self.config.gateway.listen_addr)
    }
}

fn parse_log_level(raw: &str) -> Result<Level> {
    match raw.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => anyhow::bail!(
            "ENS_LOG_LEVEL '{}' is not valid. \
            Valid levels: trace, debug, info, warn, error",
            raw
        ),
    }
}
