//! Users

use super::client::ManagementClient;
use super::http::ApiResponse;
use crate::error::Result;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Body of a user declaration
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UserSettings {
    pub password: String,
    #[serde(serialize_with = "serialize_tags")]
    pub tags: Vec<String>,
}

/// User as reported by the server
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UserInfo {
    pub name: String,
    #[serde(default, deserialize_with = "deserialize_tags")]
    pub tags: Vec<String>,
}

/// Tags travel as one comma-separated string
fn serialize_tags<S: Serializer>(tags: &[String], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&tags.join(","))
}

/// Older servers report tags as a comma-separated string, newer ones as a list
fn deserialize_tags<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Tags {
        Joined(String),
        List(Vec<String>),
    }

    Ok(match Option::<Tags>::deserialize(deserializer)? {
        Some(Tags::Joined(joined)) => joined.split(',').map(|t| t.trim().to_string()).collect(),
        Some(Tags::List(list)) => list,
        None => Vec::new(),
    })
}

pub async fn get_user(client: &ManagementClient, name: &str) -> Result<UserInfo> {
    let url = client.api_url(&["users", name]);
    client.get(&url).await
}

pub async fn put_user(client: &ManagementClient, name: &str, settings: &UserSettings) -> Result<ApiResponse> {
    let url = client.api_url(&["users", name]);
    client.put(&url, settings).await
}

pub async fn delete_user(client: &ManagementClient, name: &str) -> Result<ApiResponse> {
    let url = client.api_url(&["users", name]);
    client.delete(&url).await
}
