//! Resource abstraction layer
//!
//! Each RabbitMQ entity kind is exposed as a [`Resource`]: a typed attribute
//! record plus create/read/update/delete adapters that translate between the
//! record and the management API.
//!
//! # Architecture
//!
//! - [`id`] - identifier codec (`name@vhost`, binding tuples)
//! - [`registry`] - schema declarations loaded from embedded JSON
//! - [`data`] - the generic attribute bag handed around by the orchestrator
//! - [`dispatch`] - routes lifecycle calls on a bag to the right adapter
//! - one module per entity kind, plus [`data_source`] for read-only lookups
//!
//! # Example
//!
//! ```ignore
//! use rmqform::resource::{exchange::ExchangeResource, Resource};
//!
//! async fn adopt(client: &ManagementClient) -> rmqform::error::Result<()> {
//!     match ExchangeResource::read(client, "events@/", None).await? {
//!         ReadOutcome::Found(exchange) => println!("{:?}", exchange.settings),
//!         ReadOutcome::Deleted => println!("gone"),
//!     }
//!     Ok(())
//! }
//! ```

pub mod binding;
pub mod data;
pub mod data_source;
pub mod dispatch;
pub mod exchange;
pub mod federation_upstream;
pub mod id;
pub mod permissions;
pub mod registry;
pub mod shovel;
pub mod user;

use crate::error::{ProviderError, Result};
use crate::rabbitmq::client::ManagementClient;
use crate::rabbitmq::http::ApiResponse;
use crate::rabbitmq::Arguments;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

pub use data::ResourceData;
pub use dispatch::{plan, PlannedAction};
pub use registry::{get_all_type_names, get_schema};

/// Result of refreshing an entity from the server
#[derive(Debug, Clone, PartialEq)]
pub enum ReadOutcome<T> {
    Found(T),
    /// The server no longer knows the entity
    Deleted,
}

impl<T> ReadOutcome<T> {
    pub fn is_deleted(&self) -> bool {
        matches!(self, ReadOutcome::Deleted)
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ReadOutcome<U> {
        match self {
            ReadOutcome::Found(value) => ReadOutcome::Found(f(value)),
            ReadOutcome::Deleted => ReadOutcome::Deleted,
        }
    }
}

/// Lifecycle adapters for one entity kind
#[async_trait]
pub trait Resource: Send + Sync {
    /// Attribute record, used both as configuration and as refreshed state
    type Model: Serialize + DeserializeOwned + Send + Sync;

    const TYPE_NAME: &'static str;

    /// Declare the entity, then refresh it
    ///
    /// Returns the identifier together with the refreshed state.
    async fn create(
        client: &ManagementClient,
        model: &Self::Model,
    ) -> Result<(String, ReadOutcome<Self::Model>)>;

    /// Fetch the entity behind `id`
    ///
    /// `prior` is the last known state, if any; adapters consult it for
    /// attributes the server never reports back.
    async fn read(
        client: &ManagementClient,
        id: &str,
        prior: Option<&Self::Model>,
    ) -> Result<ReadOutcome<Self::Model>>;

    /// Apply in-place changes, then refresh
    ///
    /// Kinds whose attributes all force replacement only refresh.
    async fn update(
        client: &ManagementClient,
        id: &str,
        _old: &Self::Model,
        new: &Self::Model,
    ) -> Result<ReadOutcome<Self::Model>> {
        Self::read(client, id, Some(new)).await
    }

    /// Delete the entity; an already missing entity is not an error
    async fn delete(client: &ManagementClient, id: &str) -> Result<()>;
}

/// Map a GET failure to the "missing means deleted" policy
pub(crate) fn check_deleted<T>(result: Result<T>) -> Result<ReadOutcome<T>> {
    match result {
        Ok(value) => Ok(ReadOutcome::Found(value)),
        Err(ProviderError::NotFound(what)) => {
            tracing::debug!("{} is gone, treating as deleted", what);
            Ok(ReadOutcome::Deleted)
        }
        Err(e) => Err(e),
    }
}

/// Reject a declaration the server refused
pub(crate) fn check_response(response: &ApiResponse, context: &str) -> Result<()> {
    if response.is_error() {
        return Err(ProviderError::rejected(context, response.status_text()));
    }
    Ok(())
}

/// Like [`check_response`], but a 404 means the entity was already gone
pub(crate) fn check_delete_response(response: &ApiResponse, context: &str) -> Result<()> {
    if response.is_not_found() {
        tracing::debug!("{}: already deleted", context);
        return Ok(());
    }
    check_response(response, context)
}

/// Arguments to transmit: `arguments_json` wins over the structured map
pub(crate) fn effective_arguments(
    arguments: &Arguments,
    arguments_json: Option<&str>,
) -> Result<Arguments> {
    match arguments_json {
        Some(text) if !text.is_empty() => serde_json::from_str(text)
            .map_err(|e| ProviderError::malformed(format!("arguments_json is not a JSON object: {}", e))),
        _ => Ok(arguments.clone()),
    }
}

/// Render server arguments back into whichever attribute was in use
///
/// Returns `(arguments, arguments_json)`.
pub(crate) fn reported_arguments(
    remote: Arguments,
    prior_json: Option<&str>,
) -> Result<(Arguments, Option<String>)> {
    match prior_json {
        Some(text) if !text.is_empty() => {
            let json = serde_json::to_string(&remote).map_err(|e| {
                ProviderError::UnexpectedResponse(format!("could not encode arguments as JSON: {}", e))
            })?;
            Ok((Arguments::new(), Some(json)))
        }
        _ => Ok((remote, None)),
    }
}

/// Serde adapter for nested blocks stored as a one-element list
pub(crate) mod block {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer, T: Serialize>(value: &T, serializer: S) -> Result<S::Ok, S::Error> {
        std::slice::from_ref(value).serialize(serializer)
    }

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de>,
    {
        let mut items = Vec::<T>::deserialize(deserializer)?;
        match items.len() {
            1 => Ok(items.remove(0)),
            0 => Err(D::Error::custom("block is missing its single element")),
            n => Err(D::Error::custom(format!(
                "block takes a single element, found {}",
                n
            ))),
        }
    }
}

fn default_vhost() -> String {
    "/".to_string()
}
