//! Generic attribute bag
//!
//! A [`ResourceData`] is what the orchestrator holds for one instance: the
//! configured or refreshed attributes, the last known state they are being
//! compared against, and the identifier (empty when the entity does not
//! exist remotely).

use crate::error::{ProviderError, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceData {
    type_name: String,
    id: String,
    attributes: Map<String, Value>,
    prior: Option<Map<String, Value>>,
}

impl ResourceData {
    pub fn new(type_name: impl Into<String>, attributes: Map<String, Value>) -> Self {
        Self {
            type_name: type_name.into(),
            attributes,
            ..Default::default()
        }
    }

    /// Attach the last known state of an existing entity
    pub fn with_prior(mut self, id: impl Into<String>, prior: Map<String, Value>) -> Self {
        self.id = id.into();
        self.prior = Some(prior);
        self
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = id.into();
    }

    /// Mark the entity as gone
    pub fn clear_id(&mut self) {
        self.id.clear();
    }

    pub fn attributes(&self) -> &Map<String, Value> {
        &self.attributes
    }

    pub fn set_attributes(&mut self, attributes: Map<String, Value>) {
        self.attributes = attributes;
    }

    pub fn prior(&self) -> Option<&Map<String, Value>> {
        self.prior.as_ref()
    }

    /// Look up an attribute by dotted path; list elements are addressed by
    /// index (`settings.0.durable`)
    pub fn get(&self, path: &str) -> Option<&Value> {
        lookup(&self.attributes, path)
    }

    /// Set a top-level attribute
    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.attributes.insert(key.into(), value);
    }

    /// `(old, new)` for an attribute path
    pub fn get_change(&self, path: &str) -> (Option<&Value>, Option<&Value>) {
        let old = self.prior.as_ref().and_then(|prior| lookup(prior, path));
        (old, self.get(path))
    }

    pub fn has_change(&self, path: &str) -> bool {
        let (old, new) = self.get_change(path);
        old != new
    }

    /// Decode the current attributes into a typed record
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        decode_map(&self.type_name, &self.attributes)
    }

    pub fn decode_prior<T: DeserializeOwned>(&self) -> Result<Option<T>> {
        self.prior
            .as_ref()
            .map(|prior| decode_map(&self.type_name, prior))
            .transpose()
    }

    /// Replace the attributes with a refreshed record
    pub fn set_state<T: Serialize>(&mut self, model: &T) -> Result<()> {
        match serde_json::to_value(model) {
            Ok(Value::Object(attributes)) => {
                self.attributes = attributes;
                Ok(())
            }
            Ok(other) => Err(ProviderError::UnexpectedResponse(format!(
                "{} state is not an object: {}",
                self.type_name, other
            ))),
            Err(e) => Err(ProviderError::UnexpectedResponse(format!(
                "could not encode {} state: {}",
                self.type_name, e
            ))),
        }
    }

    /// Split into identifier and attributes
    pub fn into_parts(self) -> (String, Map<String, Value>) {
        (self.id, self.attributes)
    }
}

fn lookup<'a>(attributes: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let mut current = attributes.get(segments.next()?)?;
    for segment in segments {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

fn decode_map<T: DeserializeOwned>(type_name: &str, attributes: &Map<String, Value>) -> Result<T> {
    serde_json::from_value(Value::Object(attributes.clone()))
        .map_err(|e| ProviderError::malformed(format!("invalid {} attributes: {}", type_name, e)))
}
