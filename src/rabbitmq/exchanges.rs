//! Exchanges
//!
//! Declare, fetch and delete exchanges.

use super::client::ManagementClient;
use super::http::ApiResponse;
use super::Arguments;
use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Body of an exchange declaration
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExchangeSettings {
    #[serde(rename = "type")]
    pub kind: String,
    pub durable: bool,
    pub auto_delete: bool,
    #[serde(skip_serializing_if = "Arguments::is_empty")]
    pub arguments: Arguments,
}

/// Exchange as reported by the server
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ExchangeInfo {
    pub name: String,
    pub vhost: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub durable: bool,
    #[serde(default)]
    pub auto_delete: bool,
    #[serde(default)]
    pub arguments: Arguments,
}

pub async fn get_exchange(client: &ManagementClient, vhost: &str, name: &str) -> Result<ExchangeInfo> {
    let url = client.api_url(&["exchanges", vhost, name]);
    client.get(&url).await
}

pub async fn declare_exchange(
    client: &ManagementClient,
    vhost: &str,
    name: &str,
    settings: &ExchangeSettings,
) -> Result<ApiResponse> {
    let url = client.api_url(&["exchanges", vhost, name]);
    client.put(&url, settings).await
}

pub async fn delete_exchange(client: &ManagementClient, vhost: &str, name: &str) -> Result<ApiResponse> {
    let url = client.api_url(&["exchanges", vhost, name]);
    client.delete(&url).await
}
