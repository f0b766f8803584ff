//! greeter.toml configuration parser.
//!
//! Configuration is layered: built-in defaults, then an optional TOML
//! file, then environment overrides. The environment names match what
//! the service has always been deployed with (`DEBUG`,
//! `REDIS_CLUSTER_ADDRESS`, `AWS_REGION`).

use serde::{Deserialize, Serialize};
use std::net::{Ipv6Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

/// Region used when none is configured and metadata can't supply one.
pub const DEFAULT_REGION: &str = "us-west-2";

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid duration for {field}: {value:?}")]
    InvalidDuration { field: &'static str, value: String },

    #[error("invalid port: {0:?}")]
    InvalidPort(String),

    #[error("{0} must not be empty")]
    Empty(&'static str),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GreeterConfig {
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub cluster: ClusterConfig,
    pub metadata: MetadataConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: 80 }
    }
}

/// Which counter store implementation to run against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Redis,
    Memory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// `host:port` or a full `redis://` URL.
    pub address: String,
    /// Sorted-set key holding the counts.
    pub key: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Redis,
            address: "127.0.0.1:6379".to_string(),
            key: "hello.names".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    /// Local stand-ins for instance identity and peer discovery.
    pub debug: bool,
    /// Cloud region. Resolved from instance metadata when absent.
    pub region: Option<String>,
    pub load_balancer: String,
    /// The only peer reported in debug mode.
    pub local_peer: String,
    pub peer_timeout: String,
    /// Report failed peers alongside healthy ones instead of failing the request.
    pub partial_results: bool,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            debug: false,
            region: None,
            load_balancer: "hello-service-elb".to_string(),
            local_peer: "localhost".to_string(),
            peer_timeout: "5s".to_string(),
            partial_results: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataConfig {
    pub endpoint: String,
    pub timeout: String,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            endpoint: "169.254.169.254".to_string(),
            timeout: "2s".to_string(),
        }
    }
}

impl GreeterConfig {
    /// Defaults, overlaid by `path` if given, overlaid by the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Overlay environment variables read through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(debug) = lookup("DEBUG") {
            self.cluster.debug = debug == "true";
        }
        if let Some(address) = lookup("REDIS_CLUSTER_ADDRESS").filter(|a| !a.is_empty()) {
            self.store.address = address;
        }
        if let Some(region) = lookup("AWS_REGION").filter(|r| !r.is_empty()) {
            self.cluster.region = Some(region);
        }
        if let Some(name) = lookup("GREETER_LOAD_BALANCER").filter(|n| !n.is_empty()) {
            self.cluster.load_balancer = name;
        }
        if let Some(port) = lookup("GREETER_PORT") {
            self.server.port = port
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidPort(port.clone()))?;
        }
        Ok(())
    }

    /// Reject values that would only fail later, at request time.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.store.key.is_empty() {
            return Err(ConfigError::Empty("store.key"));
        }
        if self.store.backend == StoreBackend::Redis && self.store.address.is_empty() {
            return Err(ConfigError::Empty("store.address"));
        }
        if self.cluster.local_peer.is_empty() {
            return Err(ConfigError::Empty("cluster.local_peer"));
        }
        if !self.cluster.debug && self.cluster.load_balancer.is_empty() {
            return Err(ConfigError::Empty("cluster.load_balancer"));
        }
        checked_duration("cluster.peer_timeout", &self.cluster.peer_timeout)?;
        checked_duration("metadata.timeout", &self.metadata.timeout)?;
        Ok(())
    }

    pub fn peer_timeout(&self) -> Duration {
        parse_duration(&self.cluster.peer_timeout).unwrap_or(Duration::from_secs(5))
    }

    pub fn metadata_timeout(&self) -> Duration {
        parse_duration(&self.metadata.timeout).unwrap_or(Duration::from_secs(2))
    }

    /// The peer queried in debug mode. A bare host is assumed to be this
    /// node, so it gets the port the server listens on.
    pub fn local_peer_address(&self) -> String {
        with_default_port(&self.cluster.local_peer, self.server.port)
    }

    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

fn checked_duration(field: &'static str, value: &str) -> Result<Duration, ConfigError> {
    parse_duration(value).ok_or_else(|| ConfigError::InvalidDuration {
        field,
        value: value.to_string(),
    })
}

/// Parse a duration string like "5s", "500ms", "1m". A bare number is seconds.
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    let (value, unit) = s.split_at(s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len()));
    let value: u64 = value.parse().ok()?;
    match unit {
        "" | "s" => Some(Duration::from_secs(value)),
        "ms" => Some(Duration::from_millis(value)),
        "m" => value.checked_mul(60).map(Duration::from_secs),
        _ => None,
    }
}

/// Append `port` to `address` unless it already names one.
pub fn with_default_port(address: &str, port: u16) -> String {
    if address.parse::<SocketAddr>().is_ok() {
        return address.to_string();
    }
    if address.parse::<Ipv6Addr>().is_ok() {
        return format!("[{address}]:{port}");
    }
    match address.rsplit_once(':') {
        Some((_, p)) if p.parse::<u16>().is_ok() => address.to_string(),
        _ => format!("{address}:{port}"),
    }
}
