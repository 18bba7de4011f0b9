//! Proxy-aware JSON-RPC HTTP transport (spec.md §2 row K, §6).
//!
//! The teacher's RPC calls are all direct `alloy` providers with no proxy
//! layer; this is the one piece of ambient transport plumbing spec.md names
//! that the teacher doesn't already do. Grounded on the teacher's own
//! `reqwest` dependency (`rustls-tls`) plus `reqwest::Proxy`, the standard
//! way to tunnel an HTTP client through SOCKS5/HTTP.

use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::client::RpcClient;
use alloy::transports::http::Http;
use anyhow::{Context, Result};
use std::time::Duration;

/// Builds a `reqwest::Client` configured for JSON-RPC calls, optionally
/// tunneled through a SOCKS5 or HTTP(S) proxy. The resulting client is
/// handed to `alloy`'s HTTP transport layer (`alloy::transports::http::Http`)
/// at provider construction; this module owns only the proxy plumbing.
pub fn build_http_client(proxy_url: Option<&str>, timeout: Duration) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder().timeout(timeout);
    if let Some(url) = proxy_url {
        let proxy = reqwest::Proxy::all(url).with_context(|| format!("invalid proxy url: {url}"))?;
        builder = builder.proxy(proxy);
    }
    builder.build().context("failed to build HTTP client")
}

/// Builds an `alloy` HTTP provider over `rpc_url`, routed through
/// `proxy_url` when set. Always goes through the custom-client path (even
/// with no proxy) so the returned provider is one concrete type regardless
/// of whether a proxy is configured.
pub fn connect_provider(rpc_url: &str, proxy_url: Option<&str>, timeout: Duration) -> Result<impl Provider + Clone> {
    let url: reqwest::Url = rpc_url.parse().with_context(|| format!("invalid RPC_URL: {rpc_url}"))?;
    let client = build_http_client(proxy_url, timeout)?;
    let http = Http::with_client(client, url);
    let rpc_client = RpcClient::new(http, false);
    Ok(ProviderBuilder::new().on_client(rpc_client))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_without_proxy() {
        let client = build_http_client(None, Duration::from_secs(10));
        assert!(client.is_ok());
    }

    #[test]
    fn rejects_malformed_proxy_url() {
        let client = build_http_client(Some("not a url"), Duration::from_secs(10));
        assert!(client.is_err());
    }

    #[test]
    fn accepts_socks5_proxy_url() {
        let client = build_http_client(Some("socks5://127.0.0.1:9050"), Duration::from_secs(10));
        assert!(client.is_ok());
    }

    #[test]
    fn connect_provider_rejects_bad_rpc_url() {
        assert!(connect_provider("not a url", None, Duration::from_secs(10)).is_err());
    }
}
