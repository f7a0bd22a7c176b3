//! `/resolver` HTTP surface
//!
//! ```text
//! GET  /resolver/address/<name>          hex of the 32-byte address hash
//! GET  /resolver/dns/<name>?lookup=bool  primary IPv4, or all records
//! GET  /resolver/status                  latest sync snapshot (JSON)
//! POST /resolver/<anything>              orderly shutdown
//! ```
//!
//! Errors carry a status code and an empty body.

use crate::shutdown::Shutdown;
use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use enslite_core::records::primary_ipv4;
use enslite_core::{Error, ResolutionService, SyncProgressHub};
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

/// Shared state for every handler
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ResolutionService>,
    pub hub: Arc<SyncProgressHub>,
    pub shutdown: Shutdown,
    pub relay_client_messages: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct DnsQuery {
    #[serde(default)]
    lookup: Option<String>,
}

impl DnsQuery {
    /// `true`/`1` (any case) asks for the full record dump
    fn full_listing(&self) -> bool {
        self.lookup
            .as_deref()
            .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
            .unwrap_or(false)
    }
}

/// Status code for a resolution error
pub fn status_for(err: &Error) -> StatusCode {
    match err {
        Error::ChainSyncing | Error::ChainInitializing => StatusCode::SERVICE_UNAVAILABLE,
        Error::MalformedInput(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::NOT_FOUND,
    }
}

fn error_response(name: &str, err: &Error) -> Response {
    debug!("Resolution of {:?} failed: {}", name, err);
    status_for(err).into_response()
}

pub async fn resolver_root(State(state): State<AppState>, method: Method) -> Response {
    dispatch(state, method, "", DnsQuery::default()).await
}

pub async fn resolver(
    State(state): State<AppState>,
    method: Method,
    Path(path): Path<String>,
    query: Option<Query<DnsQuery>>,
) -> Response {
    // An unparseable query string must not keep POST from shutting down
    let query = query.map(|Query(query)| query).unwrap_or_default();
    dispatch(state, method, &path, query).await
}

async fn dispatch(state: AppState, method: Method, path: &str, query: DnsQuery) -> Response {
    if method == Method::POST {
        state.shutdown.trigger().await;
        return StatusCode::OK.into_response();
    }

    if method != Method::GET {
        return StatusCode::METHOD_NOT_ALLOWED.into_response();
    }

    let (kind, name) = path.split_once('/').unwrap_or((path, ""));
    match kind {
        "address" => address(&state, name).await,
        "dns" => dns(&state, name, &query).await,
        "status" if name.is_empty() => status(&state),
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn address(state: &AppState, name: &str) -> Response {
    match state.service.resolve_address(name).await {
        Ok(hash) => hex::encode(hash).into_response(),
        Err(e) => error_response(name, &e),
    }
}

async fn dns(state: &AppState, name: &str, query: &DnsQuery) -> Response {
    let records = match state.service.resolve_dns(name).await {
        Ok(records) => records,
        Err(e) => return error_response(name, &e),
    };

    if query.full_listing() {
        let listing = records
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n");
        return listing.into_response();
    }

    match primary_ipv4(&records) {
        Some(addr) => addr.to_string().into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

fn status(state: &AppState) -> Response {
    match state.hub.latest() {
        Some(snapshot) => Json(snapshot).into_response(),
        None => StatusCode::SERVICE_UNAVAILABLE.into_response(),
    }
}
