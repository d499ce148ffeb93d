//! `rabbitmq_binding`
//!
//! The server derives a binding's properties key from its routing key and
//! arguments and reveals it only when the binding is declared, so the key is
//! captured at creation and carried in the identifier.

use super::id::BindingId;
use super::{
    check_delete_response, check_response, effective_arguments, reported_arguments, ReadOutcome,
    Resource,
};
use crate::error::{ProviderError, Result};
use crate::rabbitmq::bindings::{self, BindingDeclaration, DestinationType};
use crate::rabbitmq::client::ManagementClient;
use crate::rabbitmq::Arguments;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub const TYPE_NAME: &str = "rabbitmq_binding";

/// Binding attributes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Binding {
    pub source: String,
    pub vhost: String,
    pub destination: String,
    pub destination_type: DestinationType,
    /// Assigned by the server
    #[serde(default)]
    pub properties_key: String,
    #[serde(default)]
    pub routing_key: String,
    #[serde(default)]
    pub arguments: Arguments,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments_json: Option<String>,
}

pub struct BindingResource;

#[async_trait]
impl Resource for BindingResource {
    type Model = Binding;

    const TYPE_NAME: &'static str = TYPE_NAME;

    async fn create(
        client: &ManagementClient,
        model: &Binding,
    ) -> Result<(String, ReadOutcome<Binding>)> {
        let declaration = BindingDeclaration {
            routing_key: model.routing_key.clone(),
            arguments: effective_arguments(&model.arguments, model.arguments_json.as_deref())?,
        };

        tracing::debug!(
            "Attempting to declare binding for: vhost={} source={} destination={} destinationType={}",
            model.vhost,
            model.source,
            model.destination,
            model.destination_type
        );

        let response = bindings::declare_binding(
            client,
            &model.vhost,
            &model.source,
            &model.destination,
            model.destination_type,
            &declaration,
        )
        .await?;
        tracing::debug!("Binding declare response: {} {:?}", response.status, response.location);
        check_response(&response, "Error declaring RabbitMQ binding")?;

        let properties_key = response
            .location
            .as_deref()
            .and_then(bindings::properties_key_from_location)
            .ok_or_else(|| {
                ProviderError::UnexpectedResponse(
                    "binding declaration returned no Location header".to_string(),
                )
            })?;
        tracing::debug!("Binding properties key: {}", properties_key);

        let id = BindingId {
            vhost: model.vhost.clone(),
            source: model.source.clone(),
            destination: model.destination.clone(),
            destination_type: model.destination_type,
            properties_key,
        };

        let state = find(client, &id, Some(model)).await?;
        Ok((id.to_string(), state))
    }

    async fn read(
        client: &ManagementClient,
        id: &str,
        prior: Option<&Binding>,
    ) -> Result<ReadOutcome<Binding>> {
        tracing::trace!("read binding resource ID (pre-split): {}", id);
        let id: BindingId = id.parse()?;
        find(client, &id, prior).await
    }

    async fn delete(client: &ManagementClient, id: &str) -> Result<()> {
        let id: BindingId = id.parse()?;
        tracing::debug!(
            "Attempting to delete binding for: vhost={} source={} destination={} destinationType={} propertiesKey={}",
            id.vhost,
            id.source,
            id.destination,
            id.destination_type,
            id.properties_key
        );

        let response = bindings::delete_binding(
            client,
            &id.vhost,
            &id.source,
            &id.destination,
            id.destination_type,
            &id.properties_key,
        )
        .await?;
        tracing::debug!("Binding delete response: {}", response.status);
        check_delete_response(&response, "Error deleting RabbitMQ binding")
    }
}

/// Scan the bindings between the endpoints for the identified tuple
async fn find(
    client: &ManagementClient,
    id: &BindingId,
    prior: Option<&Binding>,
) -> Result<ReadOutcome<Binding>> {
    let listed = bindings::list_bindings_between(
        client,
        &id.vhost,
        &id.source,
        &id.destination,
        id.destination_type,
    )
    .await;

    // A missing endpoint takes its bindings with it.
    let listed = match listed {
        Ok(listed) => listed,
        Err(e) if e.is_not_found() => return Ok(ReadOutcome::Deleted),
        Err(e) => return Err(e),
    };

    tracing::debug!("Bindings retrieved: {}", listed.len());

    let Some(found) = listed.into_iter().find(|b| {
        b.source == id.source
            && b.destination == id.destination
            && b.destination_type == id.destination_type.as_str()
            && b.properties_key == id.properties_key
    }) else {
        tracing::debug!("Binding {} not found, considering it deleted", id);
        return Ok(ReadOutcome::Deleted);
    };

    tracing::debug!("Found Binding: {:?}", found);

    let prior_json = prior.and_then(|p| p.arguments_json.as_deref());
    let (arguments, arguments_json) = reported_arguments(found.arguments, prior_json)?;

    Ok(ReadOutcome::Found(Binding {
        source: found.source,
        vhost: found.vhost,
        destination: found.destination,
        destination_type: id.destination_type,
        properties_key: found.properties_key,
        routing_key: found.routing_key,
        arguments,
        arguments_json,
    }))
}
