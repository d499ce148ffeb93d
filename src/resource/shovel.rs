//! `rabbitmq_shovel`
//!
//! `add_forward_headers`, `delete_after` and `prefetch_count` are deprecated
//! aliases of their `destination_`/`source_` counterparts. The schema
//! declares each pair as conflicting; this module forwards whatever is set.
//!
//! A changed `info` block replaces the shovel, so update only refreshes.

use super::id::VhostScopedId;
use super::{block, check_delete_response, check_deleted, check_response, ReadOutcome, Resource};
use crate::error::Result;
use crate::rabbitmq::client::ManagementClient;
use crate::rabbitmq::shovels::{self, DeleteAfter, ShovelDefinition, ShovelProtocol};
use crate::rabbitmq::{AckMode, Arguments};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub const TYPE_NAME: &str = "rabbitmq_shovel";

fn default_reconnect_delay() -> i64 {
    1
}

/// Shovel attributes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shovel {
    pub name: String,
    pub vhost: String,
    #[serde(with = "block")]
    pub info: ShovelBlock,
}

/// The `info` block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShovelBlock {
    #[serde(default)]
    pub ack_mode: AckMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub add_forward_headers: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delete_after: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_add_forward_headers: Option<bool>,
    #[serde(default)]
    pub destination_add_timestamp_header: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_application_properties: Option<Arguments>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_exchange: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_exchange_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_properties: Option<Arguments>,
    #[serde(default)]
    pub destination_protocol: ShovelProtocol,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_publish_properties: Option<Arguments>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_queue: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_queue_arguments: Option<Arguments>,
    pub destination_uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefetch_count: Option<i64>,
    #[serde(default = "default_reconnect_delay")]
    pub reconnect_delay: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_delete_after: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_exchange: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_exchange_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_prefetch_count: Option<i64>,
    #[serde(default)]
    pub source_protocol: ShovelProtocol,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_queue: Option<String>,
    pub source_uri: String,
}

impl From<&ShovelBlock> for ShovelDefinition {
    fn from(info: &ShovelBlock) -> Self {
        Self {
            ack_mode: Some(info.ack_mode),
            add_forward_headers: info.add_forward_headers,
            delete_after: info.delete_after.clone().map(DeleteAfter),
            destination_add_forward_headers: info.destination_add_forward_headers,
            destination_add_timestamp_header: Some(info.destination_add_timestamp_header),
            destination_address: info.destination_address.clone(),
            destination_application_properties: info.destination_application_properties.clone(),
            destination_exchange: info.destination_exchange.clone(),
            destination_exchange_key: info.destination_exchange_key.clone(),
            destination_properties: info.destination_properties.clone(),
            destination_protocol: Some(info.destination_protocol),
            destination_publish_properties: info.destination_publish_properties.clone(),
            destination_queue: info.destination_queue.clone(),
            destination_queue_arguments: info.destination_queue_arguments.clone(),
            destination_uri: vec![info.destination_uri.clone()],
            prefetch_count: info.prefetch_count,
            reconnect_delay: Some(info.reconnect_delay),
            source_address: info.source_address.clone(),
            source_delete_after: info.source_delete_after.clone().map(DeleteAfter),
            source_exchange: info.source_exchange.clone(),
            source_exchange_key: info.source_exchange_key.clone(),
            source_prefetch_count: info.source_prefetch_count,
            source_protocol: Some(info.source_protocol),
            source_queue: info.source_queue.clone(),
            source_uri: vec![info.source_uri.clone()],
        }
    }
}

impl From<ShovelDefinition> for ShovelBlock {
    fn from(def: ShovelDefinition) -> Self {
        Self {
            ack_mode: def.ack_mode.unwrap_or_default(),
            add_forward_headers: def.add_forward_headers,
            delete_after: def.delete_after.map(|d| d.0),
            destination_add_forward_headers: def.destination_add_forward_headers,
            destination_add_timestamp_header: def.destination_add_timestamp_header.unwrap_or_default(),
            destination_address: def.destination_address,
            destination_application_properties: def.destination_application_properties,
            destination_exchange: def.destination_exchange,
            destination_exchange_key: def.destination_exchange_key,
            destination_properties: def.destination_properties,
            destination_protocol: def.destination_protocol.unwrap_or_default(),
            destination_publish_properties: def.destination_publish_properties,
            destination_queue: def.destination_queue,
            destination_queue_arguments: def.destination_queue_arguments,
            destination_uri: def.destination_uri.into_iter().next().unwrap_or_default(),
            prefetch_count: def.prefetch_count,
            reconnect_delay: def.reconnect_delay.unwrap_or_else(default_reconnect_delay),
            source_address: def.source_address,
            source_delete_after: def.source_delete_after.map(|d| d.0),
            source_exchange: def.source_exchange,
            source_exchange_key: def.source_exchange_key,
            source_prefetch_count: def.source_prefetch_count,
            source_protocol: def.source_protocol.unwrap_or_default(),
            source_queue: def.source_queue,
            source_uri: def.source_uri.into_iter().next().unwrap_or_default(),
        }
    }
}

async fn declare(client: &ManagementClient, id: &VhostScopedId, info: &ShovelBlock) -> Result<()> {
    let definition = ShovelDefinition::from(info);

    tracing::debug!("Attempting to declare shovel {} in vhost {}", id.name, id.vhost);
    let response = shovels::declare_shovel(client, &id.vhost, &id.name, &definition).await?;
    tracing::debug!("Shovel declaration response: {}", response.status);
    check_response(&response, "Error declaring RabbitMQ shovel")
}

pub struct ShovelResource;

#[async_trait]
impl Resource for ShovelResource {
    type Model = Shovel;

    const TYPE_NAME: &'static str = TYPE_NAME;

    async fn create(client: &ManagementClient, model: &Shovel) -> Result<(String, ReadOutcome<Shovel>)> {
        let id = VhostScopedId::new(&model.name, &model.vhost);
        declare(client, &id, &model.info).await?;

        let id = id.to_string();
        let state = Self::read(client, &id, Some(model)).await?;
        Ok((id, state))
    }

    async fn read(client: &ManagementClient, id: &str, _prior: Option<&Shovel>) -> Result<ReadOutcome<Shovel>> {
        let id: VhostScopedId = id.parse()?;

        let shovel = match check_deleted(shovels::get_shovel(client, &id.vhost, &id.name).await)? {
            ReadOutcome::Found(shovel) => shovel,
            ReadOutcome::Deleted => return Ok(ReadOutcome::Deleted),
        };

        tracing::debug!("Shovel retrieved: Vhost: {}, Name: {}", shovel.vhost, shovel.name);

        Ok(ReadOutcome::Found(Shovel {
            name: shovel.name,
            vhost: shovel.vhost,
            info: shovel.value.into(),
        }))
    }

    async fn delete(client: &ManagementClient, id: &str) -> Result<()> {
        let id: VhostScopedId = id.parse()?;
        tracing::debug!("Attempting to delete shovel {}", id);

        let response = shovels::delete_shovel(client, &id.vhost, &id.name).await?;
        tracing::debug!("Shovel deletion response: {}", response.status);
        check_delete_response(&response, "Error deleting RabbitMQ shovel")
    }
}
