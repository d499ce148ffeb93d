//! Shovels
//!
//! Dynamic shovels are runtime parameters of the `shovel` component.

use super::client::ManagementClient;
use super::http::ApiResponse;
use super::{uri_set, AckMode, Arguments, ParameterBody};
use crate::error::Result;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

pub const COMPONENT: &str = "shovel";

/// Protocol spoken to a shovel endpoint
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShovelProtocol {
    #[default]
    Amqp091,
    Amqp10,
}

/// When a shovel removes itself: `never`, `queue-length` or a message count
///
/// Numeric values travel as JSON numbers, the rest as strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteAfter(pub String);

impl fmt::Display for DeleteAfter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for DeleteAfter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0.parse::<i64>() {
            Ok(count) => serializer.serialize_i64(count),
            Err(_) => serializer.serialize_str(&self.0),
        }
    }
}

impl<'de> Deserialize<'de> for DeleteAfter {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Count(i64),
            Text(String),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Count(count) => DeleteAfter(count.to_string()),
            Raw::Text(text) => DeleteAfter(text),
        })
    }
}

/// Wire form of a shovel definition
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ShovelDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ack_mode: Option<AckMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub add_forward_headers: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delete_after: Option<DeleteAfter>,
    #[serde(rename = "dest-add-forward-headers", default, skip_serializing_if = "Option::is_none")]
    pub destination_add_forward_headers: Option<bool>,
    #[serde(rename = "dest-add-timestamp-header", default, skip_serializing_if = "Option::is_none")]
    pub destination_add_timestamp_header: Option<bool>,
    #[serde(rename = "dest-address", default, skip_serializing_if = "Option::is_none")]
    pub destination_address: Option<String>,
    #[serde(rename = "dest-application-properties", default, skip_serializing_if = "Option::is_none")]
    pub destination_application_properties: Option<Arguments>,
    #[serde(rename = "dest-exchange", default, skip_serializing_if = "Option::is_none")]
    pub destination_exchange: Option<String>,
    #[serde(rename = "dest-exchange-key", default, skip_serializing_if = "Option::is_none")]
    pub destination_exchange_key: Option<String>,
    #[serde(rename = "dest-properties", default, skip_serializing_if = "Option::is_none")]
    pub destination_properties: Option<Arguments>,
    #[serde(rename = "dest-protocol", default, skip_serializing_if = "Option::is_none")]
    pub destination_protocol: Option<ShovelProtocol>,
    #[serde(rename = "dest-publish-properties", default, skip_serializing_if = "Option::is_none")]
    pub destination_publish_properties: Option<Arguments>,
    #[serde(rename = "dest-queue", default, skip_serializing_if = "Option::is_none")]
    pub destination_queue: Option<String>,
    #[serde(rename = "dest-queue-args", default, skip_serializing_if = "Option::is_none")]
    pub destination_queue_arguments: Option<Arguments>,
    #[serde(rename = "dest-uri", default, with = "uri_set")]
    pub destination_uri: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefetch_count: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reconnect_delay: Option<i64>,
    #[serde(rename = "src-address", default, skip_serializing_if = "Option::is_none")]
    pub source_address: Option<String>,
    #[serde(rename = "src-delete-after", default, skip_serializing_if = "Option::is_none")]
    pub source_delete_after: Option<DeleteAfter>,
    #[serde(rename = "src-exchange", default, skip_serializing_if = "Option::is_none")]
    pub source_exchange: Option<String>,
    #[serde(rename = "src-exchange-key", default, skip_serializing_if = "Option::is_none")]
    pub source_exchange_key: Option<String>,
    #[serde(rename = "src-prefetch-count", default, skip_serializing_if = "Option::is_none")]
    pub source_prefetch_count: Option<i64>,
    #[serde(rename = "src-protocol", default, skip_serializing_if = "Option::is_none")]
    pub source_protocol: Option<ShovelProtocol>,
    #[serde(rename = "src-queue", default, skip_serializing_if = "Option::is_none")]
    pub source_queue: Option<String>,
    #[serde(rename = "src-uri", default, with = "uri_set")]
    pub source_uri: Vec<String>,
}

/// Shovel as reported by the server
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ShovelInfo {
    pub name: String,
    pub vhost: String,
    #[serde(default)]
    pub component: String,
    pub value: ShovelDefinition,
}

fn shovel_url(client: &ManagementClient, vhost: &str, name: &str) -> String {
    client.api_url(&["parameters", COMPONENT, vhost, name])
}

pub async fn get_shovel(client: &ManagementClient, vhost: &str, name: &str) -> Result<ShovelInfo> {
    client.get(&shovel_url(client, vhost, name)).await
}

pub async fn declare_shovel(
    client: &ManagementClient,
    vhost: &str,
    name: &str,
    definition: &ShovelDefinition,
) -> Result<ApiResponse> {
    let body = ParameterBody { value: definition };
    client.put(&shovel_url(client, vhost, name), &body).await
}

pub async fn delete_shovel(client: &ManagementClient, vhost: &str, name: &str) -> Result<ApiResponse> {
    client.delete(&shovel_url(client, vhost, name)).await
}
