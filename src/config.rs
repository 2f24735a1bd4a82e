//! Configuration loading.
//!
//! Horizon reads a JSON config file; every field has a default so a
//! missing file or an empty object `{}` yields a fully working setup.

use std::fs;
use std::net::SocketAddr;
use std::path::Path;

use anyhow::Context;
use serde::Deserialize;
use tracing::info;

#[derive(Debug, Clone, Deserialize)]
pub struct HorizonConfig {
    #[serde(default)]
    pub resolver: ResolverConfig,
    #[serde(default)]
    pub transport: TransportConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResolverConfig {
    /// Seconds an in-flight query may wait for its upstream response.
    #[serde(default = "default_query_timeout_secs")]
    pub query_timeout_secs: u64,
    /// Upper bound on concurrently in-flight queries.
    #[serde(default = "default_max_inflight")]
    pub max_inflight: usize,
    #[serde(default)]
    pub stub: StubConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StubConfig {
    /// IPv4 address of the upstream resolver queries are forwarded to.
    #[serde(default = "default_upstream")]
    pub primary_upstream_ipv4: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransportConfig {
    /// Address the downstream (client-facing) socket binds to.
    #[serde(default = "default_downstream_bind")]
    pub downstream_bind: String,
}

fn default_query_timeout_secs() -> u64 {
    5
}

fn default_max_inflight() -> usize {
    4096
}

fn default_upstream() -> String {
    "1.1.1.1".to_string()
}

fn default_downstream_bind() -> String {
    "0.0.0.0:53".to_string()
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            query_timeout_secs: default_query_timeout_secs(),
            max_inflight: default_max_inflight(),
            stub: StubConfig::default(),
        }
    }
}

impl Default for StubConfig {
    fn default() -> Self {
        Self {
            primary_upstream_ipv4: default_upstream(),
        }
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            downstream_bind: default_downstream_bind(),
        }
    }
}

impl Default for HorizonConfig {
    fn default() -> Self {
        Self {
            resolver: ResolverConfig::default(),
            transport: TransportConfig::default(),
        }
    }
}

impl HorizonConfig {
    /// The upstream resolver as a socket address (DNS port 53).
    pub fn upstream_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:53", self.resolver.stub.primary_upstream_ipv4)
            .parse()
            .with_context(|| {
                format!(
                    "invalid upstream address {:?}",
                    self.resolver.stub.primary_upstream_ipv4
                )
            })
    }

    pub fn downstream_bind_addr(&self) -> anyhow::Result<SocketAddr> {
        self.transport
            .downstream_bind
            .parse()
            .with_context(|| format!("invalid bind address {:?}", self.transport.downstream_bind))
    }
}

/// Load the config file, falling back to defaults when it does not exist.
pub fn load_config(path: &Path) -> anyhow::Result<HorizonConfig> {
    if !path.exists() {
        info!(path = %path.display(), "no config file, using defaults");
        return Ok(HorizonConfig::default());
    }

    let raw = fs::read_to_string(path)
        .with_context(|| format!("read config file {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parse config file {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_yields_defaults() {
        let config: HorizonConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.resolver.query_timeout_secs, 5);
        assert_eq!(config.resolver.max_inflight, 4096);
        assert_eq!(config.resolver.stub.primary_upstream_ipv4, "1.1.1.1");
        assert_eq!(config.transport.downstream_bind, "0.0.0.0:53");
    }

    #[test]
    fn partial_config_overrides_only_named_fields() {
        let raw = r#"{
            "resolver": {
                "query_timeout_secs": 2,
                "stub": { "primary_upstream_ipv4": "9.9.9.9" }
            }
        }"#;
        let config: HorizonConfig = serde_json::from_str(raw).unwrap();
        assert_eq!(config.resolver.query_timeout_secs, 2);
        assert_eq!(config.resolver.max_inflight, 4096);
        assert_eq!(
            config.upstream_addr().unwrap(),
            "9.9.9.9:53".parse::<SocketAddr>().unwrap()
        );
    }

    #[test]
    fn bad_upstream_address_is_an_error() {
        let mut config = HorizonConfig::default();
        config.resolver.stub.primary_upstream_ipv4 = "not-an-ip".to_string();
        assert!(config.upstream_addr().is_err());
    }
}
