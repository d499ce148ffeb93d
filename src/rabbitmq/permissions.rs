//! Permissions
//!
//! A user's configure/write/read regular expressions within one vhost.

use super::client::ManagementClient;
use super::http::ApiResponse;
use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Body of a permissions update
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Permissions {
    pub configure: String,
    pub write: String,
    pub read: String,
}

/// Permissions as reported by the server
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PermissionInfo {
    pub user: String,
    pub vhost: String,
    #[serde(default)]
    pub configure: String,
    #[serde(default)]
    pub write: String,
    #[serde(default)]
    pub read: String,
}

pub async fn get_permissions_in(client: &ManagementClient, vhost: &str, user: &str) -> Result<PermissionInfo> {
    let url = client.api_url(&["permissions", vhost, user]);
    client.get(&url).await
}

pub async fn update_permissions_in(
    client: &ManagementClient,
    vhost: &str,
    user: &str,
    permissions: &Permissions,
) -> Result<ApiResponse> {
    let url = client.api_url(&["permissions", vhost, user]);
    client.put(&url, permissions).await
}

pub async fn clear_permissions_in(client: &ManagementClient, vhost: &str, user: &str) -> Result<ApiResponse> {
    let url = client.api_url(&["permissions", vhost, user]);
    client.delete(&url).await
}
