//! `rabbitmq_federation_upstream`

use super::id::VhostScopedId;
use super::{block, check_delete_response, check_deleted, check_response, ReadOutcome, Resource};
use crate::error::Result;
use crate::rabbitmq::client::ManagementClient;
use crate::rabbitmq::federation::{self, FederationDefinition};
use crate::rabbitmq::AckMode;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub const TYPE_NAME: &str = "rabbitmq_federation_upstream";

fn default_prefetch_count() -> i64 {
    1000
}

fn default_reconnect_delay() -> i64 {
    5
}

fn default_max_hops() -> i64 {
    1
}

/// Federation upstream attributes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FederationUpstream {
    pub name: String,
    pub vhost: String,
    /// Always `federation-upstream`, reported by the server
    #[serde(default)]
    pub component: String,
    #[serde(with = "block")]
    pub definition: UpstreamDefinition,
}

/// The `definition` block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpstreamDefinition {
    pub uri: String,
    #[serde(default = "default_prefetch_count")]
    pub prefetch_count: i64,
    #[serde(default = "default_reconnect_delay")]
    pub reconnect_delay: i64,
    #[serde(default)]
    pub ack_mode: AckMode,
    #[serde(default)]
    pub trust_user_id: bool,
    /// Federated exchanges only
    #[serde(default)]
    pub exchange: String,
    #[serde(default = "default_max_hops")]
    pub max_hops: i64,
    #[serde(default)]
    pub expires: i64,
    #[serde(default)]
    pub message_ttl: i64,
    /// Federated queues only
    #[serde(default)]
    pub queue: String,
}

impl From<&UpstreamDefinition> for FederationDefinition {
    fn from(def: &UpstreamDefinition) -> Self {
        Self {
            uri: vec![def.uri.clone()],
            expires: def.expires,
            message_ttl: def.message_ttl,
            max_hops: def.max_hops,
            prefetch_count: def.prefetch_count,
            reconnect_delay: def.reconnect_delay,
            ack_mode: Some(def.ack_mode),
            trust_user_id: def.trust_user_id,
            exchange: def.exchange.clone(),
            queue: def.queue.clone(),
        }
    }
}

impl From<FederationDefinition> for UpstreamDefinition {
    fn from(def: FederationDefinition) -> Self {
        Self {
            uri: def.uri.into_iter().next().unwrap_or_default(),
            prefetch_count: def.prefetch_count,
            reconnect_delay: def.reconnect_delay,
            ack_mode: def.ack_mode.unwrap_or_default(),
            trust_user_id: def.trust_user_id,
            exchange: def.exchange,
            max_hops: def.max_hops,
            expires: def.expires,
            message_ttl: def.message_ttl,
            queue: def.queue,
        }
    }
}

async fn put_federation_upstream(
    client: &ManagementClient,
    id: &VhostScopedId,
    definition: &UpstreamDefinition,
) -> Result<()> {
    let wire = FederationDefinition::from(definition);
    tracing::debug!(
        "Attempting to declare federation upstream for {} (ack-mode {}, prefetch {})",
        id,
        definition.ack_mode,
        definition.prefetch_count
    );

    let response = federation::put_federation_upstream(client, &id.vhost, &id.name, &wire).await?;
    tracing::debug!("Federation upstream declare response: {}", response.status);
    check_response(&response, "Error creating RabbitMQ federation upstream")
}

pub struct FederationUpstreamResource;

#[async_trait]
impl Resource for FederationUpstreamResource {
    type Model = FederationUpstream;

    const TYPE_NAME: &'static str = TYPE_NAME;

    async fn create(
        client: &ManagementClient,
        model: &FederationUpstream,
    ) -> Result<(String, ReadOutcome<FederationUpstream>)> {
        let id = VhostScopedId::new(&model.name, &model.vhost);
        put_federation_upstream(client, &id, &model.definition).await?;

        let id = id.to_string();
        let state = Self::read(client, &id, Some(model)).await?;
        Ok((id, state))
    }

    async fn read(
        client: &ManagementClient,
        id: &str,
        _prior: Option<&FederationUpstream>,
    ) -> Result<ReadOutcome<FederationUpstream>> {
        let id: VhostScopedId = id.parse()?;

        let upstream =
            match check_deleted(federation::get_federation_upstream(client, &id.vhost, &id.name).await)? {
                ReadOutcome::Found(upstream) => upstream,
                ReadOutcome::Deleted => return Ok(ReadOutcome::Deleted),
            };

        tracing::debug!("Federation upstream retrieved for {}", id);

        Ok(ReadOutcome::Found(FederationUpstream {
            name: upstream.name,
            vhost: upstream.vhost,
            component: upstream.component,
            definition: upstream.value.into(),
        }))
    }

    async fn update(
        client: &ManagementClient,
        id: &str,
        old: &FederationUpstream,
        new: &FederationUpstream,
    ) -> Result<ReadOutcome<FederationUpstream>> {
        if old.definition != new.definition {
            let parsed: VhostScopedId = id.parse()?;
            put_federation_upstream(client, &parsed, &new.definition).await?;
        }

        Self::read(client, id, Some(new)).await
    }

    async fn delete(client: &ManagementClient, id: &str) -> Result<()> {
        let id: VhostScopedId = id.parse()?;
        tracing::debug!("Attempting to delete federation upstream for {}", id);

        let response = federation::delete_federation_upstream(client, &id.vhost, &id.name).await?;
        tracing::debug!("Federation upstream delete response: {}", response.status);
        check_delete_response(&response, "Error deleting RabbitMQ federation upstream")
    }
}
