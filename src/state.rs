//! Local state file
//!
//! Records, per managed instance, the identifier the server knows it by and
//! the attributes last read back.

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

pub const STATE_VERSION: u32 = 1;
pub const DEFAULT_STATE_FILE: &str = "rmqform.state.json";

/// One managed instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceState {
    #[serde(rename = "type")]
    pub type_name: String,
    /// Manifest label, unique per type
    pub label: String,
    pub id: String,
    #[serde(default)]
    pub attributes: Map<String, Value>,
    pub updated_at: DateTime<Utc>,
}

impl InstanceState {
    pub fn new(type_name: &str, label: &str, id: &str, attributes: Map<String, Value>) -> Self {
        Self {
            type_name: type_name.to_string(),
            label: label.to_string(),
            id: id.to_string(),
            attributes,
            updated_at: Utc::now(),
        }
    }

    /// `type.label`, as shown to users
    pub fn address(&self) -> String {
        format!("{}.{}", self.type_name, self.label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateFile {
    pub version: u32,
    #[serde(default)]
    pub instances: Vec<InstanceState>,
}

impl Default for StateFile {
    fn default() -> Self {
        Self {
            version: STATE_VERSION,
            instances: Vec::new(),
        }
    }
}

impl StateFile {
    /// Load state from disk; a missing file is an empty state
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read state file {:?}", path))?;
        let state: StateFile = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse state file {:?}", path))?;

        if state.version > STATE_VERSION {
            anyhow::bail!(
                "State file {:?} has version {}, newer than supported version {}",
                path,
                state.version,
                STATE_VERSION
            );
        }

        Ok(state)
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content).with_context(|| format!("Failed to write state file {:?}", path))?;
        tracing::debug!("State saved to {:?} ({} instances)", path, self.instances.len());
        Ok(())
    }

    pub fn find(&self, type_name: &str, label: &str) -> Option<&InstanceState> {
        self.instances
            .iter()
            .find(|i| i.type_name == type_name && i.label == label)
    }

    /// Insert or replace the instance with the same type and label
    pub fn upsert(&mut self, instance: InstanceState) {
        match self
            .instances
            .iter_mut()
            .find(|i| i.type_name == instance.type_name && i.label == instance.label)
        {
            Some(existing) => *existing = instance,
            None => self.instances.push(instance),
        }
    }

    pub fn remove(&mut self, type_name: &str, label: &str) -> Option<InstanceState> {
        let index = self
            .instances
            .iter()
            .position(|i| i.type_name == type_name && i.label == label)?;
        Some(self.instances.remove(index))
    }
}
