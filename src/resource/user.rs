//! `rabbitmq_user`

use super::{check_delete_response, check_deleted, check_response, ReadOutcome, Resource};
use crate::error::Result;
use crate::rabbitmq::client::ManagementClient;
use crate::rabbitmq::users::{self, UserSettings};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub const TYPE_NAME: &str = "rabbitmq_user";

/// User attributes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub name: String,
    /// Never reported back by the server; state keeps the configured value
    pub password: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Drop empty tags, keeping order
pub(crate) fn clean_tags(tags: &[String]) -> Vec<String> {
    tags.iter().filter(|t| !t.is_empty()).cloned().collect()
}

async fn put(client: &ManagementClient, user: &User, context: &str) -> Result<()> {
    let settings = UserSettings {
        password: user.password.clone(),
        tags: clean_tags(&user.tags),
    };

    let response = users::put_user(client, &user.name, &settings).await?;
    tracing::debug!("User put response: {}", response.status);
    check_response(&response, context)
}

pub struct UserResource;

#[async_trait]
impl Resource for UserResource {
    type Model = User;

    const TYPE_NAME: &'static str = TYPE_NAME;

    async fn create(client: &ManagementClient, model: &User) -> Result<(String, ReadOutcome<User>)> {
        tracing::debug!("Attempting to create user {}", model.name);
        put(client, model, "Error creating RabbitMQ user").await?;

        let id = model.name.clone();
        let state = Self::read(client, &id, Some(model)).await?;
        Ok((id, state))
    }

    async fn read(client: &ManagementClient, id: &str, prior: Option<&User>) -> Result<ReadOutcome<User>> {
        let info = match check_deleted(users::get_user(client, id).await)? {
            ReadOutcome::Found(info) => info,
            ReadOutcome::Deleted => return Ok(ReadOutcome::Deleted),
        };

        tracing::debug!("User retrieved: {} {:?}", info.name, info.tags);

        Ok(ReadOutcome::Found(User {
            name: info.name,
            password: prior.map(|p| p.password.clone()).unwrap_or_default(),
            tags: clean_tags(&info.tags),
        }))
    }

    async fn update(
        client: &ManagementClient,
        id: &str,
        old: &User,
        new: &User,
    ) -> Result<ReadOutcome<User>> {
        if old.password != new.password || clean_tags(&old.tags) != clean_tags(&new.tags) {
            tracing::debug!("Attempting to update user {}", id);
            let user = User {
                name: id.to_string(),
                ..new.clone()
            };
            put(client, &user, "Error updating RabbitMQ user").await?;
        }

        Self::read(client, id, Some(new)).await
    }

    async fn delete(client: &ManagementClient, id: &str) -> Result<()> {
        tracing::debug!("Attempting to delete user {}", id);

        let response = users::delete_user(client, id).await?;
        tracing::debug!("User delete response: {}", response.status);
        check_delete_response(&response, "Error deleting RabbitMQ user")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_tags_keeps_order() {
        let tags = vec![
            "monitoring".to_string(),
            String::new(),
            "administrator".to_string(),
        ];
        assert_eq!(clean_tags(&tags), vec!["monitoring", "administrator"]);
    }
}
