//! Management API Client
//!
//! Main client for the RabbitMQ management plugin, combining credentials,
//! the HTTP wrapper and URL construction.

use super::auth::Credentials;
use super::http::{ApiResponse, ManagementHttpClient};
use crate::config::ProviderConfig;
use crate::error::{ProviderError, Result};
use reqwest::{Certificate, Client, Identity, Proxy};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

const USER_AGENT: &str = concat!("rmqform/", env!("CARGO_PKG_VERSION"));

/// Main management API client
#[derive(Clone)]
pub struct ManagementClient {
    pub credentials: Credentials,
    pub http: ManagementHttpClient,
    base_url: String,
}

impl std::fmt::Debug for ManagementClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManagementClient")
            .field("base_url", &self.base_url)
            .field("credentials", &self.credentials)
            .finish()
    }
}

impl ManagementClient {
    /// Create a new client from provider settings
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let endpoint = config.endpoint_url()?;

        let mut builder = Client::builder()
            .user_agent(USER_AGENT)
            .danger_accept_invalid_certs(config.insecure);

        if let Some(path) = &config.cacert_file {
            let pem = read_pem(path)?;
            let cert = Certificate::from_pem(&pem).map_err(|e| {
                ProviderError::Configuration(format!("cacert_file {:?}: {}", path, e))
            })?;
            builder = builder.add_root_certificate(cert);
        }

        match (&config.clientcert_file, &config.clientkey_file) {
            (Some(cert_path), Some(key_path)) => {
                let mut pem = read_pem(cert_path)?;
                pem.extend(read_pem(key_path)?);
                let identity = Identity::from_pem(&pem).map_err(|e| {
                    ProviderError::Configuration(format!("client certificate: {}", e))
                })?;
                builder = builder.identity(identity);
            }
            (None, None) => {}
            _ => {
                return Err(ProviderError::Configuration(
                    "clientcert_file and clientkey_file must be set together".to_string(),
                ))
            }
        }

        if let Some(proxy) = &config.proxy {
            let proxy = Proxy::all(proxy.as_str())
                .map_err(|e| ProviderError::Configuration(format!("proxy `{}`: {}", proxy, e)))?;
            builder = builder.proxy(proxy);
        }

        let client = builder
            .build()
            .map_err(|e| ProviderError::Configuration(format!("HTTP client: {}", e)))?;

        tracing::debug!("Management client for {} as {}", endpoint, config.username);

        Ok(Self {
            credentials: Credentials::new(&config.username, &config.password),
            http: ManagementHttpClient::new(client),
            base_url: endpoint.as_str().trim_end_matches('/').to_string(),
        })
    }

    /// Build a management API URL from raw path segments
    ///
    /// Every segment is percent-encoded, so a vhost of `/` becomes `%2F`.
    pub fn api_url(&self, segments: &[&str]) -> String {
        let path = segments
            .iter()
            .map(|s| urlencoding::encode(s).into_owned())
            .collect::<Vec<_>>()
            .join("/");
        format!("{}/api/{}", self.base_url, path)
    }

    /// GET a resource and decode it into a wire type
    pub async fn get<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let value = self.http.get(url, &self.credentials).await?;
        serde_json::from_value(value)
            .map_err(|e| ProviderError::UnexpectedResponse(format!("GET {}: {}", url, e)))
    }

    /// PUT a JSON body
    pub async fn put<B: Serialize + ?Sized>(&self, url: &str, body: &B) -> Result<ApiResponse> {
        self.http.put(url, &self.credentials, body).await
    }

    /// POST a JSON body
    pub async fn post<B: Serialize + ?Sized>(&self, url: &str, body: &B) -> Result<ApiResponse> {
        self.http.post(url, &self.credentials, body).await
    }

    /// DELETE a resource
    pub async fn delete(&self, url: &str) -> Result<ApiResponse> {
        self.http.delete(url, &self.credentials).await
    }
}

fn read_pem(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path)
        .map_err(|e| ProviderError::Configuration(format!("cannot read {:?}: {}", path, e)))
}
