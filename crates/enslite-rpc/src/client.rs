//! JSON-RPC chain client
//!
//! Talks to a local Ethereum node over HTTP. The node is the trust anchor:
//! whatever it answers is taken as chain state.
//!
//! ## Method mapping
//!
//! | ChainClient     | JSON-RPC        |
//! |-----------------|-----------------|
//! | `attach`        | `eth_chainId`   |
//! | `sync_progress` | `eth_syncing`   |
//! | `call`          | `eth_call` at `latest` |

use async_trait::async_trait;
use enslite_core::config::ChainConfig;
use enslite_core::traits::{Address, ChainClient, SyncProgress};
use enslite_core::{Error, Result};
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, info, warn};

/// JSON-RPC error code used by geth and others for execution reverts
const EXECUTION_REVERTED_CODE: i64 = 3;

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

/// Ethereum JSON-RPC chain client
///
/// The client starts out stopped; every query fails with
/// `ChainInitializing` until `start()` is called and again after `stop()`.
pub struct RpcChainClient {
    url: String,
    http: reqwest::Client,
    running: AtomicBool,
    next_id: AtomicU64,
}

impl RpcChainClient {
    /// Create a client for `url`
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the HTTP client cannot be built.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            url: url.into(),
            http,
            running: AtomicBool::new(false),
            next_id: AtomicU64::new(1),
        })
    }

    /// Create a client from the chain section of the configuration
    pub fn from_config(config: &ChainConfig) -> Result<Self> {
        config.validate()?;
        Self::new(config.rpc_url.clone(), config.request_timeout())
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn ensure_running(&self) -> Result<()> {
        if self.is_running() {
            Ok(())
        } else {
            Err(Error::ChainInitializing)
        }
    }

    async fn request(&self, method: &str, params: Value) -> Result<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        let response = self
            .http
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    debug!("{} unreachable: {}", self.url, e);
                    Error::ChainInitializing
                } else {
                    Error::upstream(format!("{} request failed: {}", method, e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::upstream(format!(
                "{} returned HTTP {}",
                method, status
            )));
        }

        let response: RpcResponse = response
            .json()
            .await
            .map_err(|e| Error::decode(format!("invalid {} response: {}", method, e)))?;

        if let Some(error) = response.error {
            return Err(classify_rpc_error(method, error.code, &error.message));
        }

        response
            .result
            .ok_or_else(|| Error::decode(format!("{} response has no result", method)))
    }
}

#[async_trait]
impl ChainClient for RpcChainClient {
    async fn start(&self) -> Result<()> {
        self.running.store(true, Ordering::SeqCst);

        match self.request("eth_chainId", json!([])).await {
            Ok(chain_id) => info!("Connected to {} (chain id {})", self.url, chain_id),
            Err(e) => warn!("{} not answering yet: {}", self.url, e),
        }
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        self.running.store(false, Ordering::SeqCst);
        info!("Chain client for {} stopped", self.url);
        Ok(())
    }

    async fn attach(&self) -> Result<()> {
        self.ensure_running()?;
        self.request("eth_chainId", json!([])).await.map(|_| ())
    }

    async fn sync_progress(&self) -> Result<Option<SyncProgress>> {
        self.ensure_running()?;
        let result = self.request("eth_syncing", json!([])).await?;
        parse_sync_status(&result)
    }

    async fn call(&self, to: Address, data: Vec<u8>) -> Result<Vec<u8>> {
        self.ensure_running()?;

        let params = json!([
            { "to": to.to_string(), "data": format!("0x{}", hex::encode(&data)) },
            "latest"
        ]);
        let result = self.request("eth_call", params).await?;

        let encoded = result
            .as_str()
            .ok_or_else(|| Error::decode("eth_call result is not a string"))?;
        decode_hex(encoded)
    }

    fn client_name(&self) -> &'static str {
        "json-rpc"
    }
}

/// Map a JSON-RPC error object onto the resolver's taxonomy
pub fn classify_rpc_error(method: &str, code: i64, message: &str) -> Error {
    if code == EXECUTION_REVERTED_CODE || message.to_ascii_lowercase().contains("revert") {
        Error::reverted(format!("{}: {}", method, message))
    } else {
        Error::upstream(format!("{} failed ({}): {}", method, code, message))
    }
}

/// Interpret an `eth_syncing` result
///
/// `false` means synced; an object carries hex block numbers.
pub fn parse_sync_status(result: &Value) -> Result<Option<SyncProgress>> {
    match result {
        Value::Bool(false) => Ok(None),
        Value::Object(fields) => {
            let block = |key: &str| -> Result<u64> {
                let raw = fields
                    .get(key)
                    .and_then(Value::as_str)
                    .ok_or_else(|| Error::decode(format!("eth_syncing missing {}", key)))?;
                parse_quantity(raw)
            };

            Ok(Some(SyncProgress::new(
                block("startingBlock")?,
                block("currentBlock")?,
                block("highestBlock")?,
            )))
        }
        other => Err(Error::decode(format!("unexpected eth_syncing result: {}", other))),
    }
}

/// Parse a `0x`-prefixed hex quantity
pub fn parse_quantity(raw: &str) -> Result<u64> {
    let digits = raw
        .strip_prefix("0x")
        .ok_or_else(|| Error::decode(format!("quantity without 0x prefix: {}", raw)))?;
    if digits.is_empty() {
        return Err(Error::decode("empty quantity"));
    }
    u64::from_str_radix(digits, 16).map_err(|e| Error::decode(format!("bad quantity {}: {}", raw, e)))
}

fn decode_hex(raw: &str) -> Result<Vec<u8>> {
    let digits = raw.strip_prefix("0x").unwrap_or(raw);
    hex::decode(digits).map_err(|e| Error::decode(format!("bad hex data: {}", e)))
}
