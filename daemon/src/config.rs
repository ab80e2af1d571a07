// Copyright 2026 Validator Net Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// On-disk configuration (SPEC_FULL §11), TOML-backed with a `Default` for
/// every field so a bare `valnet.toml` containing only `netuid` is valid.
/// Mirrors `forest_cli_shared::cli::Config`'s shape: one flat struct, `clap`
/// overrides layered on top at the call site, not here.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub netuid: u16,
    pub bind_address: String,
    pub testnet: bool,
    pub port: u16,
    pub max_connections: usize,
    pub ping_interval_s: u64,
    pub inactivity_timeout_s: u64,
    pub reconcile_interval_s: u64,
    pub identifier_timeout_s: u64,
    pub connect_timeout_s: u64,
    pub mempool_capacity: usize,
    pub rpc_url: String,
    pub registry_poll_interval_s: u64,
    pub key_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            netuid: 0,
            bind_address: "0.0.0.0".to_string(),
            testnet: false,
            port: 9001,
            max_connections: 64,
            ping_interval_s: 5,
            inactivity_timeout_s: 10,
            reconcile_interval_s: 10,
            identifier_timeout_s: 5,
            connect_timeout_s: 5,
            mempool_capacity: valnet_net::NetConfig::default().mempool_capacity,
            rpc_url: "http://127.0.0.1:9944".to_string(),
            registry_poll_interval_s: 10,
            key_path: PathBuf::from("validator.key"),
        }
    }
}

impl Config {
    /// Load from `path`, falling back to every field's default for whatever
    /// the TOML file omits. A missing file is not an error: it is treated as
    /// an empty document, i.e. every field defaulted.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(ConfigError::Io(path.to_path_buf(), e)),
        };
        let config: Config = toml::from_str(&text)
            .map_err(|e| ConfigError::Parse(path.to_path_buf(), e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations `run` would otherwise silently misbehave under
    /// (SPEC_FULL §11): both checks are Configuration-class errors, fatal at
    /// load time before any worker is spawned.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.inactivity_timeout_s <= self.ping_interval_s {
            return Err(ConfigError::Invalid(
                "inactivity_timeout_s",
                "must be greater than ping_interval_s".to_string(),
            ));
        }
        if self.bind_address.parse::<std::net::IpAddr>().is_err() {
            return Err(ConfigError::Invalid(
                "bind_address",
                "not a valid IP address".to_string(),
            ));
        }
        Ok(())
    }

    pub fn net_config(&self) -> valnet_net::NetConfig {
        valnet_net::NetConfig {
            bind_address: self.bind_address.clone(),
            port: self.port,
            netuid: self.netuid,
            max_connections: self.max_connections,
            ping_interval: Duration::from_secs(self.ping_interval_s),
            inactivity_timeout: Duration::from_secs(self.inactivity_timeout_s),
            reconcile_interval: Duration::from_secs(self.reconcile_interval_s),
            identifier_timeout: Duration::from_secs(self.identifier_timeout_s),
            connect_timeout: Duration::from_secs(self.connect_timeout_s),
            mempool_capacity: self.mempool_capacity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_loads_all_defaults() {
        let config = Config::load(Path::new("/nonexistent/valnet.toml")).unwrap();
        assert_eq!(config.netuid, 0);
        assert_eq!(config.port, 9001);
    }

    #[test]
    fn partial_file_defaults_the_rest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("valnet.toml");
        std::fs::write(&path, "netuid = 7\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.netuid, 7);
        assert_eq!(config.port, 9001);
    }

    #[test]
    fn rejects_inactivity_timeout_not_greater_than_ping_interval() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("valnet.toml");
        std::fs::write(&path, "ping_interval_s = 10\ninactivity_timeout_s = 10\n").unwrap();

        assert!(matches!(
            Config::load(&path),
            Err(ConfigError::Invalid("inactivity_timeout_s", _))
        ));
    }

    #[test]
    fn rejects_unparseable_bind_address() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("valnet.toml");
        std::fs::write(&path, "bind_address = \"not-an-ip\"\n").unwrap();

        assert!(matches!(
            Config::load(&path),
            Err(ConfigError::Invalid("bind_address", _))
        ));
    }
}
