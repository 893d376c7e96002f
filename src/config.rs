//! Proxy configuration.
//!
//! Read from a JSON file with camelCase keys. Every field has a default, so a
//! partial file (or no file at all) yields a working configuration.

use serde::Deserialize;
use std::net::{IpAddr, SocketAddr};
use std::path::Path;

use crate::dns::{DNS_PORT, RecordData, RecordType};
use crate::error::ConfigError;

pub const DEFAULT_CONFIG_PATH: &str = "pns-config.json";

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    /// Port the TCP listener binds to.
    pub dns_port: u16,

    /// Address the TCP listener binds to.
    pub bind_address: String,

    /// Upstream servers, tried in order. `ip` or `ip:port`.
    pub forwarders: Vec<String>,

    pub cache: CacheConfig,

    pub blocklist: BlocklistConfig,

    /// Static answers served before the cache and upstreams.
    pub custom_records: Vec<CustomRecord>,

    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CacheConfig {
    pub enabled: bool,
    /// TTL in seconds used when an answer carries none.
    pub ttl: u32,
    pub max_entries: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BlocklistConfig {
    pub enabled: bool,
    /// Any query name containing one of these (case-insensitively) is blocked.
    pub domains: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct CustomRecord {
    pub name: String,
    #[serde(rename = "type", default = "default_record_type")]
    pub record_type: String,
    #[serde(default = "default_record_ttl")]
    pub ttl: u32,
    #[serde(alias = "data", default)]
    pub address: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LoggingConfig {
    /// Log one line per answered query.
    pub enabled: bool,
}

fn default_record_type() -> String {
    "A".to_string()
}

fn default_record_ttl() -> u32 {
    300
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dns_port: DNS_PORT,
            bind_address: "0.0.0.0".to_string(),
            forwarders: vec![
                "8.8.8.8".to_string(),
                "8.8.4.4".to_string(),
                "1.1.1.1".to_string(),
            ],
            cache: CacheConfig::default(),
            blocklist: BlocklistConfig::default(),
            custom_records: vec![CustomRecord {
                name: "local.pns".to_string(),
                record_type: "A".to_string(),
                ttl: 300,
                address: "192.168.1.100".to_string(),
            }],
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl: 300,
            max_entries: 10_000,
        }
    }
}

impl Default for BlocklistConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            domains: vec!["example-blocked-domain.com".to_string()],
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Config {
    /// Load configuration from `path`, falling back to defaults when the file
    /// does not exist.
    pub fn load(path: &Path, overrides: CliOverrides) -> Result<Self, ConfigError> {
        let mut config = if path.exists() {
            Self::from_file(path)?
        } else {
            Self::default()
        };

        config.apply_cli_overrides(overrides);
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileRead(path.display().to_string(), e.to_string()))?;
        Self::from_json(&contents)
    }

    pub fn from_json(contents: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    fn apply_cli_overrides(&mut self, overrides: CliOverrides) {
        if let Some(port) = overrides.dns_port {
            self.dns_port = port;
        }
        if let Some(bind) = overrides.bind_address {
            self.bind_address = bind;
        }
    }

    /// Socket address the listener binds to.
    pub fn listen_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip: IpAddr = self.bind_address.parse().map_err(|_| {
            ConfigError::Validation(format!("invalid bind address '{}'", self.bind_address))
        })?;
        Ok(SocketAddr::new(ip, self.dns_port))
    }

    /// Upstream addresses in configured order.
    pub fn forwarder_addrs(&self) -> Result<Vec<SocketAddr>, ConfigError> {
        self.forwarders
            .iter()
            .map(|f| parse_forwarder(f))
            .collect()
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.dns_port == 0 {
            return Err(ConfigError::Validation("DNS port cannot be 0".to_string()));
        }

        self.listen_addr()?;

        if self.forwarders.is_empty() {
            return Err(ConfigError::Validation(
                "No upstream servers configured".to_string(),
            ));
        }
        self.forwarder_addrs()?;

        for record in &self.custom_records {
            record.rdata().map_err(|e| {
                ConfigError::Validation(format!("custom record '{}': {}", record.name, e))
            })?;
        }

        Ok(())
    }
}

impl CustomRecord {
    /// The payload this record answers with.
    pub fn rdata(&self) -> Result<RecordData, crate::error::WireError> {
        let rtype: RecordType = self.record_type.parse()?;
        RecordData::from_text(rtype, &self.address)
    }
}

/// Parse `ip` or `ip:port`; the port defaults to 53.
pub fn parse_forwarder(value: &str) -> Result<SocketAddr, ConfigError> {
    if let Ok(addr) = value.parse::<SocketAddr>() {
        return Ok(addr);
    }
    value
        .parse::<IpAddr>()
        .map(|ip| SocketAddr::new(ip, DNS_PORT))
        .map_err(|_| ConfigError::Validation(format!("invalid forwarder address '{}'", value)))
}

/// Command-line overrides for configuration
#[derive(Debug, Default)]
pub struct CliOverrides {
    pub dns_port: Option<u16>,
    pub bind_address: Option<String>,
}
