//! HTTP client construction for catalog traffic.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Duration;

use reqwest::{Client, ClientBuilder, Proxy};
use tracing::warn;

use super::CatalogError;

/// Default connect and read timeout for catalog requests.
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 60;

/// User-Agent sent with every catalog request.
#[must_use]
pub fn catalog_user_agent() -> String {
    format!("cdm-packager/{}", env!("CARGO_PKG_VERSION"))
}

/// Builds the catalog HTTP client.
///
/// `timeout_secs` bounds both connecting and the whole request. With
/// `verify_tls` off, invalid and self-signed certificates are accepted.
///
/// # Errors
///
/// Returns [`CatalogError::ClientBuild`] when reqwest rejects the configuration.
pub fn build_catalog_http_client(timeout_secs: u64, verify_tls: bool) -> Result<Client, CatalogError> {
    if !verify_tls {
        warn!("TLS certificate verification is disabled for catalog requests");
    }
    match try_build(timeout_secs, verify_tls, false) {
        Ok(client) => Ok(client),
        Err(BuildFailure::Panic) => {
            // System proxy lookup panics in some sandboxed environments.
            warn!("HTTP client builder panicked while loading system proxy settings; retrying with env-proxy fallback");
            match try_build(timeout_secs, verify_tls, true) {
                Ok(client) => Ok(client),
                Err(BuildFailure::Build(source)) => Err(CatalogError::ClientBuild { source }),
                Err(BuildFailure::Panic) => {
                    // Last resort: no proxy support at all.
                    base_builder(timeout_secs, verify_tls)
                        .no_proxy()
                        .build()
                        .map_err(|source| CatalogError::ClientBuild { source })
                }
            }
        }
        Err(BuildFailure::Build(source)) => Err(CatalogError::ClientBuild { source }),
    }
}

enum BuildFailure {
    Panic,
    Build(reqwest::Error),
}

fn try_build(timeout_secs: u64, verify_tls: bool, env_proxy_only: bool) -> Result<Client, BuildFailure> {
    catch_unwind(AssertUnwindSafe(move || {
        let mut builder = base_builder(timeout_secs, verify_tls);
        if env_proxy_only {
            builder = apply_env_proxies(builder.no_proxy());
        }
        builder.build().map_err(BuildFailure::Build)
    }))
    .map_err(|_| BuildFailure::Panic)?
}

fn base_builder(timeout_secs: u64, verify_tls: bool) -> ClientBuilder {
    Client::builder()
        .connect_timeout(Duration::from_secs(timeout_secs))
        .timeout(Duration::from_secs(timeout_secs))
        .user_agent(catalog_user_agent())
        .gzip(true)
        .danger_accept_invalid_certs(!verify_tls)
}

fn apply_env_proxies(mut builder: ClientBuilder) -> ClientBuilder {
    if let Some(proxy) = first_env_var(&["HTTPS_PROXY", "https_proxy", "ALL_PROXY", "all_proxy"])
        && let Ok(resolved) = Proxy::https(&proxy)
    {
        builder = builder.proxy(resolved);
    }
    if let Some(proxy) = first_env_var(&["HTTP_PROXY", "http_proxy", "ALL_PROXY", "all_proxy"])
        && let Ok(resolved) = Proxy::http(&proxy)
    {
        builder = builder.proxy(resolved);
    }
    builder
}

fn first_env_var(names: &[&str]) -> Option<String> {
    names.iter().find_map(|name| {
        std::env::var(name)
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    })
}
