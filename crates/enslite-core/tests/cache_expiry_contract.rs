//! Architectural Contract Test: Cache Expiry
//!
//! This test verifies that cached records live exactly as long as their TTL.
//!
//! Constraints verified:
//! - An entry is served for every lookup before its expiry
//! - An entry is never served at or after its expiry
//! - The lookup that finds an expired entry removes it
//! - Record TTLs are capped by the configured maximum
//!
//! All tests run on a paused clock and move time with `advance`.

mod common;

use common::*;
use enslite_core::config::EnsConfig;
use enslite_core::{DnsRecord, ResolutionCache};
use std::net::Ipv4Addr;
use std::time::Duration;
use tokio::time::advance;

#[tokio::test(start_paused = true)]
async fn entry_is_served_until_ttl_then_refetched() {
    let chain = MockChainClient::new(ChainState::Synced);
    let contracts = MockContracts::new().with_records("alice.eth", alice_records());
    let factory = MockContractsFactory::new(contracts.clone());
    let service = service(&chain, &factory);

    assert_eq!(service.resolve_dns("alice.eth").await, Ok(alice_records()));
    assert_eq!(contracts.record_calls(), 1);

    advance(Duration::from_secs(299)).await;
    assert_eq!(service.resolve_dns("alice.eth").await, Ok(alice_records()));
    assert_eq!(contracts.record_calls(), 1, "served from cache before expiry");

    advance(Duration::from_secs(1)).await;
    assert_eq!(service.resolve_dns("alice.eth").await, Ok(alice_records()));
    assert_eq!(contracts.record_calls(), 2, "refetched at expiry");
}

#[tokio::test(start_paused = true)]
async fn lookup_at_expiry_removes_entry() {
    let cache = ResolutionCache::new(Duration::from_secs(3600));
    cache.store("alice.eth", alice_records(), Duration::from_secs(10));

    advance(Duration::from_millis(9_999)).await;
    assert_eq!(cache.lookup("alice.eth"), Some(alice_records()));
    assert_eq!(cache.len(), 1);

    advance(Duration::from_millis(1)).await;
    assert_eq!(cache.lookup("alice.eth"), None);
    assert_eq!(cache.len(), 0, "expired entry removed by the lookup");
}

#[tokio::test(start_paused = true)]
async fn expired_entry_stays_until_looked_up() {
    let cache = ResolutionCache::new(Duration::from_secs(3600));
    cache.store("alice.eth", alice_records(), Duration::from_secs(1));

    advance(Duration::from_secs(60)).await;
    assert_eq!(cache.len(), 1, "no background sweep");

    assert_eq!(cache.lookup("alice.eth"), None);
    assert!(cache.is_empty());
}

#[tokio::test(start_paused = true)]
async fn ttl_is_capped_by_configured_maximum() {
    let mut config = EnsConfig::default();
    config.cache.max_ttl_secs = 60;

    let chain = MockChainClient::new(ChainState::Synced);
    let contracts = MockContracts::new().with_records("alice.eth", alice_records());
    let factory = MockContractsFactory::new(contracts.clone());
    let service = service_with_config(&chain, &factory, &config);

    service.resolve_dns("alice.eth").await.unwrap();
    advance(Duration::from_secs(59)).await;
    service.resolve_dns("alice.eth").await.unwrap();
    assert_eq!(contracts.record_calls(), 1);

    advance(Duration::from_secs(1)).await;
    service.resolve_dns("alice.eth").await.unwrap();
    assert_eq!(contracts.record_calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn expiry_follows_first_record_ttl() {
    let records = vec![
        DnsRecord::a("multi.eth", 30, Ipv4Addr::new(10, 0, 0, 1)),
        DnsRecord::a("multi.eth", 600, Ipv4Addr::new(10, 0, 0, 2)),
    ];
    let chain = MockChainClient::new(ChainState::Synced);
    let contracts = MockContracts::new().with_records("multi.eth", records.clone());
    let factory = MockContractsFactory::new(contracts.clone());
    let service = service(&chain, &factory);

    assert_eq!(service.resolve_dns("multi.eth").await, Ok(records));
    advance(Duration::from_secs(30)).await;
    service.resolve_dns("multi.eth").await.unwrap();

    assert_eq!(contracts.record_calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn zero_ttl_is_never_served_from_cache() {
    let records = vec![DnsRecord::a("zero.eth", 0, Ipv4Addr::new(10, 0, 0, 1))];
    let chain = MockChainClient::new(ChainState::Synced);
    let contracts = MockContracts::new().with_records("zero.eth", records);
    let factory = MockContractsFactory::new(contracts.clone());
    let service = service(&chain, &factory);

    service.resolve_dns("zero.eth").await.unwrap();
    service.resolve_dns("zero.eth").await.unwrap();

    assert_eq!(contracts.record_calls(), 2);
}
