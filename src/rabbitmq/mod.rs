//! RabbitMQ management API interaction module
//!
//! Typed access to the management plugin's HTTP API. Every call is a single
//! blocking round-trip; nothing here retries.
//!
//! # Module Structure
//!
//! - [`auth`] - basic-auth credentials
//! - [`client`] - main client: TLS setup, URL building, typed GET
//! - [`http`] - HTTP utilities and the mutating-call response type
//! - [`exchanges`], [`bindings`], [`users`], [`permissions`],
//!   [`federation`], [`shovels`] - wire types and calls per entity kind
//!
//! # Example
//!
//! ```ignore
//! use rmqform::rabbitmq::{client::ManagementClient, exchanges};
//!
//! async fn example(client: &ManagementClient) -> rmqform::error::Result<()> {
//!     let exchange = exchanges::get_exchange(client, "/", "events").await?;
//!     println!("{} is {}", exchange.name, exchange.kind);
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod bindings;
pub mod client;
pub mod exchanges;
pub mod federation;
pub mod http;
pub mod permissions;
pub mod shovels;
pub mod users;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Free-form `x-*` arguments attached to exchanges, bindings and queues
pub type Arguments = BTreeMap<String, Value>;

/// How federation links and shovels acknowledge messages
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AckMode {
    #[default]
    OnConfirm,
    OnPublish,
    NoAck,
}

impl AckMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AckMode::OnConfirm => "on-confirm",
            AckMode::OnPublish => "on-publish",
            AckMode::NoAck => "no-ack",
        }
    }
}

impl fmt::Display for AckMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AckMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "on-confirm" => Ok(AckMode::OnConfirm),
            "on-publish" => Ok(AckMode::OnPublish),
            "no-ack" => Ok(AckMode::NoAck),
            other => Err(format!("unknown ack mode `{}`", other)),
        }
    }
}

/// Body of a runtime parameter PUT
#[derive(Debug, Serialize)]
pub(crate) struct ParameterBody<'a, T: Serialize> {
    pub value: &'a T,
}

/// (De)serialize a URI list that the server may render as a single string
pub(crate) mod uri_set {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    pub fn serialize<S: Serializer>(uris: &[String], serializer: S) -> Result<S::Ok, S::Error> {
        uris.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
        Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
            Some(OneOrMany::One(uri)) => vec![uri],
            Some(OneOrMany::Many(uris)) => uris,
            None => Vec::new(),
        })
    }
}
