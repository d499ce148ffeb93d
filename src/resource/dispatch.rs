//! Resource Dispatch
//!
//! Routes lifecycle calls on an attribute bag to the adapter registered for
//! its type name, and plans what applying a configuration would do.

use super::binding::{self, BindingResource};
use super::data::ResourceData;
use super::data_source::{self, ExchangeQuery, UserQuery};
use super::exchange::{self, ExchangeResource};
use super::federation_upstream::{self, FederationUpstreamResource};
use super::permissions::{self, PermissionsResource};
use super::registry;
use super::shovel::{self, ShovelResource};
use super::user::{self, UserResource};
use super::{ReadOutcome, Resource};
use crate::error::{ProviderError, Result};
use crate::rabbitmq::client::ManagementClient;
use serde::Serialize;

/// What applying a configuration to an instance requires
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlannedAction {
    Create,
    /// In-place update of the listed attribute paths
    Update(Vec<String>),
    /// Destroy then create; at least one listed path forces it
    Replace(Vec<String>),
    NoOp,
}

impl PlannedAction {
    pub fn symbol(&self) -> &'static str {
        match self {
            PlannedAction::Create => "+",
            PlannedAction::Update(_) => "~",
            PlannedAction::Replace(_) => "-/+",
            PlannedAction::NoOp => " ",
        }
    }
}

macro_rules! route {
    ($type_name:expr, $op:ident ( $($arg:expr),* )) => {
        match $type_name {
            exchange::TYPE_NAME => $op::<ExchangeResource>($($arg),*).await,
            binding::TYPE_NAME => $op::<BindingResource>($($arg),*).await,
            user::TYPE_NAME => $op::<UserResource>($($arg),*).await,
            permissions::TYPE_NAME => $op::<PermissionsResource>($($arg),*).await,
            federation_upstream::TYPE_NAME => $op::<FederationUpstreamResource>($($arg),*).await,
            shovel::TYPE_NAME => $op::<ShovelResource>($($arg),*).await,
            other => Err(unsupported("resource", other)),
        }
    };
}

fn unsupported(kind: &str, type_name: &str) -> ProviderError {
    ProviderError::malformed(format!("unsupported {} type `{}`", kind, type_name))
}

/// Validate the configured attributes in place, logging deprecations
fn prepare(data: &mut ResourceData) -> Result<()> {
    let validated = registry::validate(data.type_name(), data.attributes())?;
    for warning in &validated.warnings {
        tracing::warn!("{}: {}", data.type_name(), warning);
    }
    data.set_attributes(validated.attributes);
    Ok(())
}

fn apply_outcome<T: Serialize>(data: &mut ResourceData, outcome: ReadOutcome<T>) -> Result<()> {
    match outcome {
        ReadOutcome::Found(model) => data.set_state(&model),
        ReadOutcome::Deleted => {
            tracing::info!("{} {} no longer exists", data.type_name(), data.id());
            data.clear_id();
            Ok(())
        }
    }
}

fn require_id(data: &ResourceData) -> Result<()> {
    if data.id().is_empty() {
        return Err(ProviderError::malformed(format!(
            "{} has no identifier",
            data.type_name()
        )));
    }
    Ok(())
}

/// Create the entity described by `data`, then store its identifier and
/// refreshed state
pub async fn create(client: &ManagementClient, data: &mut ResourceData) -> Result<()> {
    prepare(data)?;
    let type_name = data.type_name().to_string();
    route!(type_name.as_str(), create_with(client, data))
}

/// Refresh `data` from the server; clears the identifier when the entity is gone
///
/// With no attributes this adopts an existing entity by identifier.
pub async fn read(client: &ManagementClient, data: &mut ResourceData) -> Result<()> {
    require_id(data)?;
    let type_name = data.type_name().to_string();
    route!(type_name.as_str(), read_with(client, data))
}

/// Apply the configured attributes to an existing entity
///
/// `data` must carry the prior state.
pub async fn update(client: &ManagementClient, data: &mut ResourceData) -> Result<()> {
    require_id(data)?;
    prepare(data)?;
    let type_name = data.type_name().to_string();
    route!(type_name.as_str(), update_with(client, data))
}

pub async fn delete(client: &ManagementClient, data: &mut ResourceData) -> Result<()> {
    require_id(data)?;
    let type_name = data.type_name().to_string();
    route!(type_name.as_str(), delete_with(client, data))
}

async fn create_with<R: Resource>(client: &ManagementClient, data: &mut ResourceData) -> Result<()> {
    let model: R::Model = data.decode()?;
    let (id, outcome) = R::create(client, &model).await?;
    tracing::info!("Created {} {}", R::TYPE_NAME, id);

    data.set_id(id);
    apply_outcome(data, outcome)
}

async fn read_with<R: Resource>(client: &ManagementClient, data: &mut ResourceData) -> Result<()> {
    let prior: Option<R::Model> = if data.attributes().is_empty() {
        None
    } else {
        Some(data.decode()?)
    };

    let outcome = R::read(client, data.id(), prior.as_ref()).await?;
    apply_outcome(data, outcome)
}

async fn update_with<R: Resource>(client: &ManagementClient, data: &mut ResourceData) -> Result<()> {
    let old: R::Model = data
        .decode_prior()?
        .ok_or_else(|| ProviderError::malformed(format!("{} has no prior state", R::TYPE_NAME)))?;
    let new: R::Model = data.decode()?;

    let outcome = R::update(client, data.id(), &old, &new).await?;
    tracing::info!("Updated {} {}", R::TYPE_NAME, data.id());
    apply_outcome(data, outcome)
}

async fn delete_with<R: Resource>(client: &ManagementClient, data: &mut ResourceData) -> Result<()> {
    R::delete(client, data.id()).await?;
    tracing::info!("Deleted {} {}", R::TYPE_NAME, data.id());
    data.clear_id();
    Ok(())
}

/// Look up an existing entity through a data source
///
/// The identifier stays empty when nothing matches.
pub async fn read_data_source(client: &ManagementClient, data: &mut ResourceData) -> Result<()> {
    let schema = registry::get_data_source_schema(data.type_name())
        .ok_or_else(|| unsupported("data source", data.type_name()))?;
    let validated = registry::validate_against(schema, data.attributes())?;
    data.set_attributes(validated.attributes);

    let type_name = data.type_name().to_string();
    match type_name.as_str() {
        data_source::EXCHANGE => {
            let query: ExchangeQuery = data.decode()?;
            let (id, outcome) = data_source::read_exchange(client, &query).await?;
            data.set_id(id);
            apply_outcome(data, outcome)
        }
        data_source::USER => {
            let query: UserQuery = data.decode()?;
            let (id, outcome) = data_source::read_user(client, &query).await?;
            data.set_id(id);
            apply_outcome(data, outcome)
        }
        other => Err(unsupported("data source", other)),
    }
}

/// Decide what applying `data`'s attributes over its prior state takes
pub fn plan(data: &ResourceData) -> Result<PlannedAction> {
    let prior = match data.prior() {
        Some(prior) if !data.id().is_empty() => prior,
        _ => return Ok(PlannedAction::Create),
    };

    let schema = registry::get_schema(data.type_name())
        .ok_or_else(|| unsupported("resource", data.type_name()))?;
    let validated = registry::validate_against(schema, data.attributes())?;

    let changes = registry::diff(schema, prior, &validated.attributes);
    if changes.is_empty() {
        return Ok(PlannedAction::NoOp);
    }

    let replace = changes.iter().any(|c| c.force_new);
    let paths = changes.into_iter().map(|c| c.path).collect();
    Ok(if replace {
        PlannedAction::Replace(paths)
    } else {
        PlannedAction::Update(paths)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map, Value};

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    fn permissions(configure: &str) -> Value {
        json!({
            "user": "app",
            "vhost": "/",
            "permissions": [{"configure": configure, "write": ".*", "read": ".*"}]
        })
    }

    #[test]
    fn test_plan_without_state_creates() {
        let data = ResourceData::new("rabbitmq_permissions", object(permissions(".*")));
        assert_eq!(plan(&data).unwrap(), PlannedAction::Create);
    }

    #[test]
    fn test_plan_unchanged_is_noop() {
        let data = ResourceData::new("rabbitmq_permissions", object(permissions(".*")))
            .with_prior("app@/", object(permissions(".*")));
        assert_eq!(plan(&data).unwrap(), PlannedAction::NoOp);
    }

    #[test]
    fn test_plan_block_change_updates_in_place() {
        let data = ResourceData::new("rabbitmq_permissions", object(permissions("^app-.*")))
            .with_prior("app@/", object(permissions(".*")));
        assert_eq!(
            plan(&data).unwrap(),
            PlannedAction::Update(vec!["permissions.configure".to_string()])
        );
    }

    #[test]
    fn test_plan_force_new_change_replaces() {
        let mut config = permissions(".*");
        config["vhost"] = json!("staging");
        let data = ResourceData::new("rabbitmq_permissions", object(config))
            .with_prior("app@/", object(permissions(".*")));

        assert_eq!(plan(&data).unwrap(), PlannedAction::Replace(vec!["vhost".to_string()]));
    }

    #[test]
    fn test_plan_shovel_info_change_replaces() {
        let shovel = |queue: &str| {
            json!({
                "name": "move",
                "vhost": "/",
                "info": [{
                    "source_uri": "amqp://a",
                    "source_queue": queue,
                    "destination_uri": "amqp://b",
                    "destination_queue": "archive"
                }]
            })
        };
        let prior = registry::validate("rabbitmq_shovel", &object(shovel("q1"))).unwrap().attributes;
        let data = ResourceData::new("rabbitmq_shovel", object(shovel("q2"))).with_prior("move@/", prior);

        assert_eq!(
            plan(&data).unwrap(),
            PlannedAction::Replace(vec!["info.source_queue".to_string()])
        );
    }

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_adapters_are_send_and_sync() {
        assert_send_sync::<crate::resource::shovel::ShovelResource>();
        assert_send_sync::<crate::resource::user::UserResource>();
    }

    #[test]
    fn test_plan_fills_defaults_before_diffing() {
        let prior = json!({
            "name": "events",
            "vhost": "/",
            "settings": [{"type": "topic", "durable": false, "auto_delete": false, "arguments": {}}]
        });
        let config = json!({"name": "events", "settings": [{"type": "topic"}]});

        let data = ResourceData::new("rabbitmq_exchange", object(config)).with_prior("events@/", object(prior));
        assert_eq!(plan(&data).unwrap(), PlannedAction::NoOp);
    }

    #[test]
    fn test_plan_rejects_unknown_type() {
        let data = ResourceData::new("rabbitmq_vhost", Map::new()).with_prior("x", Map::new());
        assert!(plan(&data).is_err());
    }
}
