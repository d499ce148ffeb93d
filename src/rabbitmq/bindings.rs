//! Bindings
//!
//! Bindings are addressed by their endpoints plus a server-assigned
//! properties key, which the server only reveals through the `Location`
//! header of the declaration response.

use super::client::ManagementClient;
use super::http::ApiResponse;
use super::Arguments;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of node a binding routes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DestinationType {
    Queue,
    Exchange,
}

impl DestinationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DestinationType::Queue => "queue",
            DestinationType::Exchange => "exchange",
        }
    }

    /// Single-letter path segment used by the bindings API
    fn path_segment(&self) -> &'static str {
        match self {
            DestinationType::Queue => "q",
            DestinationType::Exchange => "e",
        }
    }
}

impl fmt::Display for DestinationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DestinationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "queue" => Ok(DestinationType::Queue),
            "exchange" => Ok(DestinationType::Exchange),
            other => Err(format!(
                "destination type must be `queue` or `exchange`, got `{}`",
                other
            )),
        }
    }
}

/// Body of a binding declaration
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BindingDeclaration {
    pub routing_key: String,
    #[serde(skip_serializing_if = "Arguments::is_empty")]
    pub arguments: Arguments,
}

/// Binding as reported by the server
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BindingInfo {
    pub source: String,
    pub vhost: String,
    pub destination: String,
    pub destination_type: String,
    #[serde(default)]
    pub routing_key: String,
    #[serde(default)]
    pub arguments: Arguments,
    #[serde(default)]
    pub properties_key: String,
}

fn between_url(
    client: &ManagementClient,
    vhost: &str,
    source: &str,
    destination: &str,
    destination_type: DestinationType,
) -> String {
    client.api_url(&[
        "bindings",
        vhost,
        "e",
        source,
        destination_type.path_segment(),
        destination,
    ])
}

/// List every binding from `source` to `destination`
pub async fn list_bindings_between(
    client: &ManagementClient,
    vhost: &str,
    source: &str,
    destination: &str,
    destination_type: DestinationType,
) -> Result<Vec<BindingInfo>> {
    let url = between_url(client, vhost, source, destination, destination_type);
    client.get(&url).await
}

pub async fn declare_binding(
    client: &ManagementClient,
    vhost: &str,
    source: &str,
    destination: &str,
    destination_type: DestinationType,
    declaration: &BindingDeclaration,
) -> Result<ApiResponse> {
    let url = between_url(client, vhost, source, destination, destination_type);
    client.post(&url, declaration).await
}

pub async fn delete_binding(
    client: &ManagementClient,
    vhost: &str,
    source: &str,
    destination: &str,
    destination_type: DestinationType,
    properties_key: &str,
) -> Result<ApiResponse> {
    let mut url = between_url(client, vhost, source, destination, destination_type);
    url.push('/');
    url.push_str(&urlencoding::encode(properties_key));
    client.delete(&url).await
}

/// Extract the properties key from a declaration's `Location` header
///
/// The key is the last path segment, percent-decoded.
pub fn properties_key_from_location(location: &str) -> Option<String> {
    let segment = location.rsplit('/').next()?;
    urlencoding::decode(segment).ok().map(|s| s.into_owned())
}
