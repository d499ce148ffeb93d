//! Federation upstreams
//!
//! Upstreams are runtime parameters of the `federation-upstream` component.

use super::client::ManagementClient;
use super::http::ApiResponse;
use super::{uri_set, AckMode, ParameterBody};
use crate::error::Result;
use serde::{Deserialize, Serialize};

pub const COMPONENT: &str = "federation-upstream";

fn is_zero(value: &i64) -> bool {
    *value == 0
}

/// Wire form of an upstream definition; zero values are omitted so the
/// server applies its own defaults
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FederationDefinition {
    #[serde(default, with = "uri_set")]
    pub uri: Vec<String>,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub expires: i64,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub message_ttl: i64,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub max_hops: i64,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub prefetch_count: i64,
    #[serde(default)]
    pub reconnect_delay: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ack_mode: Option<AckMode>,
    #[serde(default)]
    pub trust_user_id: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub exchange: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub queue: String,
}

/// Upstream as reported by the server
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FederationUpstream {
    pub name: String,
    pub vhost: String,
    #[serde(default)]
    pub component: String,
    pub value: FederationDefinition,
}

fn upstream_url(client: &ManagementClient, vhost: &str, name: &str) -> String {
    client.api_url(&["parameters", COMPONENT, vhost, name])
}

pub async fn get_federation_upstream(
    client: &ManagementClient,
    vhost: &str,
    name: &str,
) -> Result<FederationUpstream> {
    client.get(&upstream_url(client, vhost, name)).await
}

pub async fn put_federation_upstream(
    client: &ManagementClient,
    vhost: &str,
    name: &str,
    definition: &FederationDefinition,
) -> Result<ApiResponse> {
    let body = ParameterBody { value: definition };
    client.put(&upstream_url(client, vhost, name), &body).await
}

pub async fn delete_federation_upstream(
    client: &ManagementClient,
    vhost: &str,
    name: &str,
) -> Result<ApiResponse> {
    client.delete(&upstream_url(client, vhost, name)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_zero_values_are_omitted() {
        let definition = FederationDefinition {
            uri: vec!["amqp://upstream".to_string()],
            prefetch_count: 1000,
            reconnect_delay: 5,
            ack_mode: Some(AckMode::OnConfirm),
            max_hops: 1,
            ..Default::default()
        };

        assert_eq!(
            serde_json::to_value(&definition).unwrap(),
            json!({
                "uri": ["amqp://upstream"],
                "max-hops": 1,
                "prefetch-count": 1000,
                "reconnect-delay": 5,
                "ack-mode": "on-confirm",
                "trust-user-id": false
            })
        );
    }

    #[test]
    fn test_upstream_reads_single_uri() {
        let upstream: FederationUpstream = serde_json::from_value(json!({
            "name": "origin",
            "vhost": "/",
            "component": "federation-upstream",
            "value": {"uri": "amqp://upstream", "expires": 3600000, "ack-mode": "no-ack"}
        }))
        .unwrap();

        assert_eq!(upstream.value.uri, vec!["amqp://upstream"]);
        assert_eq!(upstream.value.expires, 3_600_000);
        assert_eq!(upstream.value.ack_mode, Some(AckMode::NoAck));
    }
}
