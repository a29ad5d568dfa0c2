//! Application configuration.
//!
//! Configuration is loaded from a TOML file at:
//! 1. `$WWIVNET_CONFIG` (environment variable)
//! 2. `~/.config/wwivnet/config.toml` (Linux/macOS)
//!    `%APPDATA%\wwivnet\config.toml` (Windows)
//! 3. Built-in defaults
//!
//! Only the CLI reads this; library code takes a [`Network`] and paths as
//! explicit arguments.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{NetError, Result};
use crate::fido::address::FidoAddress;
use crate::fido::convert::{ExportOptions, ImportOptions, FTN_FAKE_OUTBOUND_NODE};
use crate::model::network::Network;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "WWIVNET_CONFIG";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General behavior settings.
    pub general: GeneralConfig,
    /// The network this system takes part in.
    pub network: NetworkConfig,
}

/// General behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub log_level: String,
    /// Override cache directory for logs.
    pub cache_dir: Option<PathBuf>,
}

/// Network identity and FidoNet gateway settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Network name written into routing lines.
    pub name: String,
    /// Our node number on the network.
    pub system_number: u16,
    /// Directory holding the network's packet files.
    pub dir: Option<PathBuf>,
    /// Our FidoNet address, when gating to FidoNet.
    pub fido_address: Option<String>,
    /// Origin line text for exported echomail.
    pub origin_line: Option<String>,
    /// WWIVnet node number FidoNet traffic is attributed to.
    pub fake_outbound_node: u16,
    /// Packet passwords of the FidoNet nodes we exchange mail with, keyed by
    /// address (`"21:2/115" = "SECRET"`).
    pub packet_passwords: BTreeMap<String, String>,
}

impl NetworkConfig {
    pub fn to_network(&self) -> Network {
        Network::new(self.name.clone(), self.system_number)
    }

    /// Parsed `fido_address`.
    pub fn fido_address(&self) -> Result<FidoAddress> {
        self.fido_address
            .as_deref()
            .ok_or_else(|| NetError::Config("network.fido_address is not set".to_string()))?
            .parse()
    }

    /// Password configured for `node`; empty when it has none.
    ///
    /// Keys that do not parse as addresses are ignored.
    pub fn packet_password_for(&self, node: &FidoAddress) -> String {
        self.packet_passwords
            .iter()
            .find(|(key, _)| {
                key.parse::<FidoAddress>().is_ok_and(|addr| {
                    (addr.zone, addr.net, addr.node, addr.point)
                        == (node.zone, node.net, node.node, node.point)
                })
            })
            .map(|(_, password)| password.clone())
            .unwrap_or_default()
    }

    /// Import settings for a packet sent by `orig`.
    pub fn import_options(&self, orig: &FidoAddress, fallback_daten: u32) -> ImportOptions {
        ImportOptions {
            fake_outbound_node: self.fake_outbound_node,
            to_system: self.system_number,
            fallback_daten,
            packet_password: self.packet_password_for(orig),
        }
    }

    /// Export settings for messages sent to `dest`.
    pub fn export_options(&self, dest: FidoAddress) -> Result<ExportOptions> {
        let origin = self
            .origin_line
            .clone()
            .unwrap_or_else(|| format!("{} node {}", self.name, self.system_number));
        Ok(ExportOptions::new(self.fido_address()?, dest, origin))
    }

    /// Join `name` onto the network directory, if one is configured.
    pub fn resolve(&self, name: impl Into<PathBuf>) -> PathBuf {
        let name = name.into();
        match &self.dir {
            Some(dir) if name.is_relative() => dir.join(name),
            _ => name,
        }
    }
}

// ── Default implementations ─────────────────────────────────────

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            cache_dir: None,
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            name: "WWIVnet".to_string(),
            system_number: 1,
            dir: None,
            fido_address: None,
            origin_line: None,
            fake_outbound_node: FTN_FAKE_OUTBOUND_NODE,
            packet_passwords: BTreeMap::new(),
        }
    }
}

// ── Load / save ─────────────────────────────────────────────────

/// Load configuration, searching standard locations.
///
/// Returns the default configuration if no file is found or on parse error.
pub fn load_config() -> Config {
    if let Some(path) = config_file_path() {
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(contents) => match toml::from_str::<Config>(&contents) {
                    Ok(cfg) => {
                        tracing::info!(path = %path.display(), "Loaded config");
                        return cfg;
                    }
                    Err(e) => {
                        tracing::warn!(
                            path = %path.display(),
                            error = %e,
                            "Failed to parse config, using defaults"
                        );
                    }
                },
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "Failed to read config file, using defaults"
                    );
                }
            }
        }
    }
    Config::default()
}

/// Save configuration to the standard location.
pub fn save_config(config: &Config) -> anyhow::Result<()> {
    let path = config_file_path()
        .ok_or_else(|| anyhow::anyhow!("Could not determine config file path"))?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(&path, contents)?;
    tracing::info!(path = %path.display(), "Saved config");
    Ok(())
}

/// Determine the config file path (checking env var first, then standard dirs).
pub fn config_file_path() -> Option<PathBuf> {
    if let Ok(env_path) = std::env::var(CONFIG_ENV_VAR) {
        return Some(PathBuf::from(env_path));
    }
    dirs::config_dir().map(|d| d.join("wwivnet").join("config.toml"))
}

/// Return the cache directory for logs.
pub fn cache_dir(config: &Config) -> PathBuf {
    if let Some(ref dir) = config.general.cache_dir {
        return dir.clone();
    }
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("wwivnet")
}

/// Return the log file path.
pub fn log_file_path(config: &Config) -> PathBuf {
    cache_dir(config).join("wwivnet.log")
}
