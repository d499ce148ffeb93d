//! `rabbitmq_exchange`

use super::id::VhostScopedId;
use super::{
    block, check_delete_response, check_deleted, check_response, default_vhost, effective_arguments,
    reported_arguments, ReadOutcome, Resource,
};
use crate::error::Result;
use crate::rabbitmq::client::ManagementClient;
use crate::rabbitmq::exchanges::{self, ExchangeInfo, ExchangeSettings};
use crate::rabbitmq::Arguments;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub const TYPE_NAME: &str = "rabbitmq_exchange";

/// Exchange attributes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exchange {
    pub name: String,
    #[serde(default = "default_vhost")]
    pub vhost: String,
    #[serde(with = "block")]
    pub settings: ExchangeBlock,
}

/// The `settings` block
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExchangeBlock {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub durable: bool,
    #[serde(default)]
    pub auto_delete: bool,
    #[serde(default)]
    pub arguments: Arguments,
    /// Same as `arguments`, as JSON text; wins when both are set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments_json: Option<String>,
}

impl Exchange {
    pub fn id(&self) -> VhostScopedId {
        VhostScopedId::new(&self.name, &self.vhost)
    }

    /// Build state from a server report
    ///
    /// `prior` decides whether arguments come back as a map or as JSON text.
    pub(crate) fn from_info(info: ExchangeInfo, prior: Option<&ExchangeBlock>) -> Result<Self> {
        let prior_json = prior.and_then(|p| p.arguments_json.as_deref());
        let (arguments, arguments_json) = reported_arguments(info.arguments, prior_json)?;

        Ok(Self {
            name: info.name,
            vhost: info.vhost,
            settings: ExchangeBlock {
                kind: info.kind,
                durable: info.durable,
                auto_delete: info.auto_delete,
                arguments,
                arguments_json,
            },
        })
    }
}

pub(crate) async fn fetch(
    client: &ManagementClient,
    id: &VhostScopedId,
    prior: Option<&ExchangeBlock>,
) -> Result<ReadOutcome<Exchange>> {
    let info = match check_deleted(exchanges::get_exchange(client, &id.vhost, &id.name).await)? {
        ReadOutcome::Found(info) => info,
        ReadOutcome::Deleted => return Ok(ReadOutcome::Deleted),
    };

    tracing::debug!("Exchange retrieved {}: {:?}", id, info);

    Exchange::from_info(info, prior).map(ReadOutcome::Found)
}

pub struct ExchangeResource;

#[async_trait]
impl Resource for ExchangeResource {
    type Model = Exchange;

    const TYPE_NAME: &'static str = TYPE_NAME;

    async fn create(
        client: &ManagementClient,
        model: &Exchange,
    ) -> Result<(String, ReadOutcome<Exchange>)> {
        let settings = ExchangeSettings {
            kind: model.settings.kind.clone(),
            durable: model.settings.durable,
            auto_delete: model.settings.auto_delete,
            arguments: effective_arguments(
                &model.settings.arguments,
                model.settings.arguments_json.as_deref(),
            )?,
        };

        let id = model.id();
        tracing::debug!("Attempting to declare exchange {}: {:?}", id, settings);

        let response = exchanges::declare_exchange(client, &model.vhost, &model.name, &settings).await?;
        tracing::debug!("Exchange declare response: {}", response.status);
        check_response(&response, "Error declaring RabbitMQ exchange")?;

        let state = fetch(client, &id, Some(&model.settings)).await?;
        Ok((id.to_string(), state))
    }

    async fn read(
        client: &ManagementClient,
        id: &str,
        prior: Option<&Exchange>,
    ) -> Result<ReadOutcome<Exchange>> {
        let id: VhostScopedId = id.parse()?;
        fetch(client, &id, prior.map(|p| &p.settings)).await
    }

    async fn delete(client: &ManagementClient, id: &str) -> Result<()> {
        let id: VhostScopedId = id.parse()?;
        tracing::debug!("Attempting to delete exchange {}", id);

        let response = exchanges::delete_exchange(client, &id.vhost, &id.name).await?;
        tracing::debug!("Exchange delete response: {}", response.status);
        check_delete_response(&response, "Error deleting RabbitMQ exchange")
    }
}
