//! Service configuration, populated from environment variables.

use std::net::SocketAddr;

/// Runtime configuration for the recall service.
///
/// | Variable | Default | Description |
/// |----------|---------|-------------|
/// | `RECALLWIRE_BIND` | `0.0.0.0:3000` | TCP socket address to listen on |
/// | `RECALLWIRE_API_BASE` | derived from `RECALLWIRE_BIND` | Base URL for generated links |
/// | `RECALLWIRE_NAME` | (absent) | Human-readable service name |
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Human-readable name, shown in the discovery document and startup log.
    pub name: Option<String>,

    /// Base URL of the `/v1/` API that every `links` entry is rooted at.
    /// Example: `"https://api.example.com/v1"`.
    pub api_base: String,

    /// Socket address the server binds to.
    pub bind_addr: SocketAddr,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("RECALLWIRE_BIND must be a socket address such as 0.0.0.0:3000, got {0:?}")]
    InvalidBind(String),
}

impl NodeConfig {
    /// Populate config from environment variables, applying defaults where absent.
    pub fn from_env() -> Result<Self, ConfigError> {
        let raw_bind = std::env::var("RECALLWIRE_BIND").unwrap_or_else(|_| "0.0.0.0:3000".into());
        let bind_addr: SocketAddr = raw_bind
            .parse()
            .map_err(|_| ConfigError::InvalidBind(raw_bind.clone()))?;

        let api_base = std::env::var("RECALLWIRE_API_BASE")
            .map(|base| base.trim_end_matches('/').to_string())
            .unwrap_or_else(|_| format!("http://{bind_addr}/v1"));

        Ok(Self {
            name: std::env::var("RECALLWIRE_NAME").ok(),
            api_base,
            bind_addr,
        })
    }

    /// Config for in-process use: tests and the conformance suite.
    pub fn local(bind_addr: SocketAddr) -> Self {
        Self {
            name: None,
            api_base: format!("http://{bind_addr}/v1"),
            bind_addr,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_config_derives_api_base() {
        let config = NodeConfig::local("127.0.0.1:4000".parse().unwrap());
        assert_eq!(config.api_base, "http://127.0.0.1:4000/v1");
        assert!(config.name.is_none());
    }
}
