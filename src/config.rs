use std::net::SocketAddr;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::store::StoreConfig;

/// Server configuration, stored as a JSON file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Address the HTTP API binds to.
    pub listen_addr: SocketAddr,
    /// Storage backend selection.
    pub store: StoreConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 8000)),
            store: StoreConfig::default(),
        }
    }
}

impl Config {
    /// Loads configuration from `path`, or writes defaults there when the
    /// file does not exist yet.
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save(path)?;
            Ok(config)
        }
    }

    /// Writes the configuration to `path` as pretty-printed JSON.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.listen_addr.port(), 8000);
        assert!(matches!(config.store, StoreConfig::Sqlite { .. }));
    }

    #[test]
    fn test_config_roundtrip() {
        let config = Config {
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 9000)),
            store: StoreConfig::Memory,
        };
        let json = serde_json::to_string(&config).unwrap();
        let parsed: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.listen_addr, config.listen_addr);
        assert!(matches!(parsed.store, StoreConfig::Memory));
    }

    #[test]
    fn test_store_backend_tag() {
        let config: Config = serde_json::from_str(
            r#"{
                "listen_addr": "0.0.0.0:8000",
                "store": { "backend": "sqlite", "path": "/tmp/ipam.db" }
            }"#,
        )
        .unwrap();
        match config.store {
            StoreConfig::Sqlite { path } => assert_eq!(path, "/tmp/ipam.db"),
            other => panic!("unexpected backend: {:?}", other),
        }
    }
}
