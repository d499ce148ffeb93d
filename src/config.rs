//! Configuration Management
//!
//! Handles persistent provider connection settings for rmqform.

use crate::error::{ProviderError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use url::Url;

const DEFAULT_ENDPOINT: &str = "http://localhost:15672";
const DEFAULT_USERNAME: &str = "guest";
const DEFAULT_PASSWORD: &str = "guest";

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_username() -> String {
    DEFAULT_USERNAME.to_string()
}

fn default_password() -> String {
    DEFAULT_PASSWORD.to_string()
}

/// Connection settings for the RabbitMQ management API
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProviderConfig {
    /// Management API base URL
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_username")]
    pub username: String,
    #[serde(default = "default_password")]
    pub password: String,
    /// Accept invalid TLS certificates
    #[serde(default)]
    pub insecure: bool,
    /// Extra PEM root certificate
    #[serde(default)]
    pub cacert_file: Option<PathBuf>,
    /// PEM client certificate (requires `clientkey_file`)
    #[serde(default)]
    pub clientcert_file: Option<PathBuf>,
    #[serde(default)]
    pub clientkey_file: Option<PathBuf>,
    #[serde(default)]
    pub proxy: Option<String>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            username: default_username(),
            password: default_password(),
            insecure: false,
            cacert_file: None,
            clientcert_file: None,
            clientkey_file: None,
            proxy: None,
        }
    }
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("endpoint", &self.endpoint)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("insecure", &self.insecure)
            .field("cacert_file", &self.cacert_file)
            .field("clientcert_file", &self.clientcert_file)
            .field("clientkey_file", &self.clientkey_file)
            .field("proxy", &self.proxy)
            .finish()
    }
}

impl ProviderConfig {
    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("rmqform").join("config.json"))
    }

    /// Load configuration from disk
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };

        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!("Ignoring unreadable config {:?}: {}", path, e);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Save configuration to disk
    pub fn save(&self) -> anyhow::Result<PathBuf> {
        let Some(path) = Self::config_path() else {
            anyhow::bail!("No configuration directory available on this platform");
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, content)?;

        Ok(path)
    }

    /// Layer `RABBITMQ_*` environment variables over the loaded values
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Layer overrides from an arbitrary variable lookup
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(v) = lookup("RABBITMQ_ENDPOINT") {
            self.endpoint = v;
        }
        if let Some(v) = lookup("RABBITMQ_USERNAME") {
            self.username = v;
        }
        if let Some(v) = lookup("RABBITMQ_PASSWORD") {
            self.password = v;
        }
        if let Some(v) = lookup("RABBITMQ_INSECURE") {
            self.insecure = matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes");
        }
        if let Some(v) = lookup("RABBITMQ_CACERT") {
            self.cacert_file = Some(PathBuf::from(v));
        }
        self
    }

    /// Parse and check the endpoint URL
    pub fn endpoint_url(&self) -> Result<Url> {
        let url = Url::parse(&self.endpoint).map_err(|e| {
            ProviderError::Configuration(format!("endpoint `{}`: {}", self.endpoint, e))
        })?;

        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(ProviderError::Configuration(format!(
                "endpoint scheme must be http or https, got `{}`",
                other
            ))),
        }
    }
}
