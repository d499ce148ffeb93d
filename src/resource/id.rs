//! Resource identifiers
//!
//! The identifier is the only key persisted between invocations, so its
//! text form must stay stable:
//!
//! - `name@vhost` for exchanges, permissions, federation upstreams and shovels
//! - `name` for users
//! - `vhost/source/destination/destination_type/properties_key` for bindings,
//!   with `%` and `/` in the vhost percent-encoded
//!
//! A name containing `@` is split at its first `@` and therefore cannot be
//! recovered; the format predates this crate and is kept as is.

use crate::error::{ProviderError, Result};
use crate::rabbitmq::bindings::DestinationType;
use std::fmt;
use std::str::FromStr;

/// Identifier of an entity scoped to a vhost: `name@vhost`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VhostScopedId {
    pub name: String,
    pub vhost: String,
}

impl VhostScopedId {
    pub fn new(name: &str, vhost: &str) -> Self {
        Self {
            name: name.to_string(),
            vhost: vhost.to_string(),
        }
    }
}

impl fmt::Display for VhostScopedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.vhost)
    }
}

impl FromStr for VhostScopedId {
    type Err = ProviderError;

    fn from_str(id: &str) -> Result<Self> {
        let (name, vhost) = id
            .split_once('@')
            .ok_or_else(|| ProviderError::malformed(format!("Unable to parse resource id: {}", id)))?;
        Ok(Self::new(name, vhost))
    }
}

/// Identifier of a binding
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BindingId {
    pub vhost: String,
    pub source: String,
    pub destination: String,
    pub destination_type: DestinationType,
    pub properties_key: String,
}

impl fmt::Display for BindingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}/{}",
            percent_encode_slashes(&self.vhost),
            self.source,
            self.destination,
            self.destination_type,
            self.properties_key
        )
    }
}

impl FromStr for BindingId {
    type Err = ProviderError;

    fn from_str(id: &str) -> Result<Self> {
        // The properties key is last, so it keeps any further slashes.
        let parts: Vec<&str> = id.splitn(5, '/').collect();
        let [vhost, source, destination, destination_type, properties_key] = parts[..] else {
            return Err(ProviderError::malformed(format!(
                "Unable to determine binding ID: {}",
                id
            )));
        };

        let destination_type = destination_type
            .parse::<DestinationType>()
            .map_err(|e| ProviderError::malformed(format!("binding ID {}: {}", id, e)))?;

        Ok(Self {
            vhost: percent_decode_slashes(vhost),
            source: source.to_string(),
            destination: destination.to_string(),
            destination_type,
            properties_key: properties_key.to_string(),
        })
    }
}

/// Encode `%` then `/`, so decoding is exact
pub fn percent_encode_slashes(s: &str) -> String {
    s.replace('%', "%25").replace('/', "%2F")
}

pub fn percent_decode_slashes(s: &str) -> String {
    s.replace("%2F", "/").replace("%25", "%")
}
