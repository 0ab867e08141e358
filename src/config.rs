//! Probe configuration
//!
//! Endpoint and dataset settings, loaded once at startup from an optional
//! TOML file and then overridden by command-line flags. Defaults reproduce
//! the fixed wine-quality deployment the probe was written against.

use crate::error::{ProbeError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default dataset location, relative to the working directory
pub const DEFAULT_DATASET: &str = "./training/wine-quality.csv";

/// How the endpoint URL is formed
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum GatewayMode {
    /// Istio ingress gateway
    #[default]
    Istio,
    /// Ambassador gateway
    Ambassador,
    /// Deployment executor reached directly, no ingress prefix
    #[serde(alias = "seldon")]
    Direct,
}

impl std::fmt::Display for GatewayMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GatewayMode::Istio => write!(f, "istio"),
            GatewayMode::Ambassador => write!(f, "ambassador"),
            GatewayMode::Direct => write!(f, "direct"),
        }
    }
}

impl std::str::FromStr for GatewayMode {
    type Err = ProbeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "istio" => Ok(GatewayMode::Istio),
            "ambassador" => Ok(GatewayMode::Ambassador),
            "direct" | "seldon" => Ok(GatewayMode::Direct),
            other => Err(ProbeError::Config(format!(
                "unknown gateway mode '{}' (expected istio, ambassador or direct)",
                other
            ))),
        }
    }
}

/// Where predictions and feedback are sent
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EndpointConfig {
    pub gateway: GatewayMode,

    /// Kubernetes namespace of the deployment
    pub namespace: String,

    /// `host:port` of the gateway (or executor in direct mode)
    pub gateway_endpoint: String,

    /// Deployment to target
    pub deployment_name: String,

    /// Per-request timeout enforced by the HTTP client (in seconds)
    #[serde(with = "serde_duration")]
    pub timeout: Duration,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            gateway: GatewayMode::Istio,
            namespace: "default".to_string(),
            gateway_endpoint: "localhost:8083".to_string(),
            deployment_name: "wines-classifier".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Top-level probe configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProbeConfig {
    /// Dataset file (header row, label in the last column)
    pub dataset: PathBuf,

    /// Single-character column delimiter
    pub delimiter: char,

    pub endpoint: EndpointConfig,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            dataset: PathBuf::from(DEFAULT_DATASET),
            delimiter: ',',
            endpoint: EndpointConfig::default(),
        }
    }
}

// Durations are written as whole seconds (`timeout = 30`)
mod serde_duration {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

impl ProbeConfig {
    /// Load configuration from TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: ProbeConfig = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Delimiter as the byte the CSV reader expects
    pub fn delimiter_byte(&self) -> Result<u8> {
        if self.delimiter.is_ascii() {
            Ok(self.delimiter as u8)
        } else {
            Err(ProbeError::Config(format!(
                "delimiter '{}' must be a single ASCII character",
                self.delimiter
            )))
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.dataset.as_os_str().is_empty() {
            return Err(ProbeError::Config("dataset path cannot be empty".to_string()));
        }

        self.delimiter_byte()?;
        self.endpoint.validate()
    }
}

impl EndpointConfig {
    /// Validate endpoint values
    pub fn validate(&self) -> Result<()> {
        if self.namespace.trim().is_empty() {
            return Err(ProbeError::Config("namespace cannot be empty".to_string()));
        }

        if self.deployment_name.trim().is_empty() {
            return Err(ProbeError::Config(
                "deployment_name cannot be empty".to_string(),
            ));
        }

        // host:port with a numeric port
        let port_ok = self
            .gateway_endpoint
            .rsplit_once(':')
            .map(|(host, port)| !host.is_empty() && port.parse::<u16>().is_ok())
            .unwrap_or(false);
        if !port_ok {
            return Err(ProbeError::Config(format!(
                "gateway_endpoint '{}' must be of the form host:port",
                self.gateway_endpoint
            )));
        }

        // Timeout between 1 second and 10 minutes
        if self.timeout < Duration::from_secs(1) || self.timeout > Duration::from_secs(600) {
            return Err(ProbeError::Config(
                "timeout must be between 1 and 600 seconds".to_string(),
            ));
        }

        Ok(())
    }
}
