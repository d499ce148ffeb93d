//! Read-only lookups of existing exchanges and users

use super::exchange::{self, Exchange};
use super::id::VhostScopedId;
use super::user::clean_tags;
use super::{check_deleted, default_vhost, ReadOutcome};
use crate::error::Result;
use crate::rabbitmq::client::ManagementClient;
use crate::rabbitmq::users;
use serde::{Deserialize, Serialize};

pub const EXCHANGE: &str = "rabbitmq_exchange";
pub const USER: &str = "rabbitmq_user";

/// Exchange lookup arguments
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeQuery {
    pub name: String,
    #[serde(default = "default_vhost")]
    pub vhost: String,
}

/// Look up an exchange; the identifier is `name@vhost`
pub async fn read_exchange(
    client: &ManagementClient,
    query: &ExchangeQuery,
) -> Result<(String, ReadOutcome<Exchange>)> {
    let id = VhostScopedId::new(&query.name, &query.vhost);
    let outcome = exchange::fetch(client, &id, None).await?;
    Ok((id.to_string(), outcome))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserQuery {
    pub name: String,
}

/// What the user lookup reports; the password is never exposed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub name: String,
    pub tags: Vec<String>,
}

pub async fn read_user(
    client: &ManagementClient,
    query: &UserQuery,
) -> Result<(String, ReadOutcome<UserSummary>)> {
    let outcome = check_deleted(users::get_user(client, &query.name).await)?;
    tracing::debug!("User lookup for {}: found={}", query.name, !outcome.is_deleted());

    let outcome = outcome.map(|info| UserSummary {
        name: info.name,
        tags: clean_tags(&info.tags),
    });
    Ok((query.name.clone(), outcome))
}
