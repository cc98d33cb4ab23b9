//! Configuration for the inference client.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for reaching the inference endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Endpoint base address, without trailing slash
    pub base_url: String,
    /// File name sent with the multipart image part
    #[serde(default = "default_upload_file_name")]
    pub upload_file_name: String,
    /// Optional per-call timeout, applied through `TimeoutClient`
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

fn default_upload_file_name() -> String {
    "upload.jpg".to_string()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            upload_file_name: default_upload_file_name(),
            timeout_ms: None,
        }
    }
}

impl ClientConfig {
    /// Create a config for the given base address.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            ..Default::default()
        }
    }

    /// Set the per-call timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = Some(timeout.as_millis() as u64);
        self
    }

    /// Per-call timeout, if configured.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// Load config from YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        let mut config: Self = serde_yaml::from_str(yaml)?;
        config.base_url = config.base_url.trim_end_matches('/').to_string();
        Ok(config)
    }

    /// Serialize to YAML.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }

    /// Build an endpoint URL from a path such as `/predict`.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}
