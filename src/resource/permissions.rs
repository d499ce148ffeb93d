//! `rabbitmq_permissions`

use super::id::VhostScopedId;
use super::{
    block, check_delete_response, check_deleted, check_response, default_vhost, ReadOutcome,
    Resource,
};
use crate::error::Result;
use crate::rabbitmq::client::ManagementClient;
use crate::rabbitmq::permissions::{self, Permissions};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub const TYPE_NAME: &str = "rabbitmq_permissions";

/// Permission attributes; identified as `user@vhost`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPermissions {
    pub user: String,
    #[serde(default = "default_vhost")]
    pub vhost: String,
    #[serde(with = "block")]
    pub permissions: PermissionBlock,
}

/// The `permissions` block: one regular expression per access kind
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionBlock {
    pub configure: String,
    pub write: String,
    pub read: String,
}

async fn set_permissions_in(
    client: &ManagementClient,
    id: &VhostScopedId,
    block: &PermissionBlock,
) -> Result<()> {
    let perms = Permissions {
        configure: block.configure.clone(),
        write: block.write.clone(),
        read: block.read.clone(),
    };

    tracing::debug!("Attempting to set permissions for {}: {:?}", id, perms);

    let response = permissions::update_permissions_in(client, &id.vhost, &id.name, &perms).await?;
    tracing::debug!("Permission response: {}", response.status);
    check_response(&response, "Error setting permissions")
}

pub struct PermissionsResource;

#[async_trait]
impl Resource for PermissionsResource {
    type Model = UserPermissions;

    const TYPE_NAME: &'static str = TYPE_NAME;

    async fn create(
        client: &ManagementClient,
        model: &UserPermissions,
    ) -> Result<(String, ReadOutcome<UserPermissions>)> {
        let id = VhostScopedId::new(&model.user, &model.vhost);
        set_permissions_in(client, &id, &model.permissions).await?;

        let id = id.to_string();
        let state = Self::read(client, &id, Some(model)).await?;
        Ok((id, state))
    }

    async fn read(
        client: &ManagementClient,
        id: &str,
        _prior: Option<&UserPermissions>,
    ) -> Result<ReadOutcome<UserPermissions>> {
        let id: VhostScopedId = id.parse()?;

        let perms = match check_deleted(permissions::get_permissions_in(client, &id.vhost, &id.name).await)? {
            ReadOutcome::Found(perms) => perms,
            ReadOutcome::Deleted => return Ok(ReadOutcome::Deleted),
        };

        tracing::debug!("Permission retrieved for {}: {:?}", id, perms);

        Ok(ReadOutcome::Found(UserPermissions {
            user: perms.user,
            vhost: perms.vhost,
            permissions: PermissionBlock {
                configure: perms.configure,
                write: perms.write,
                read: perms.read,
            },
        }))
    }

    async fn update(
        client: &ManagementClient,
        id: &str,
        old: &UserPermissions,
        new: &UserPermissions,
    ) -> Result<ReadOutcome<UserPermissions>> {
        if old.permissions != new.permissions {
            let parsed: VhostScopedId = id.parse()?;
            set_permissions_in(client, &parsed, &new.permissions).await?;
        }

        Self::read(client, id, Some(new)).await
    }

    async fn delete(client: &ManagementClient, id: &str) -> Result<()> {
        let id: VhostScopedId = id.parse()?;
        tracing::debug!("Attempting to delete permission for {}", id);

        let response = permissions::clear_permissions_in(client, &id.vhost, &id.name).await?;
        tracing::debug!("Permission delete response: {}", response.status);
        check_delete_response(&response, "Error deleting RabbitMQ permission")
    }
}
