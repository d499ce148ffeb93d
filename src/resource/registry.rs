//! Schema Registry - Load entity schemas from JSON
//!
//! This module loads the attribute schema of every resource and data source
//! from embedded JSON files and provides lookup, validation and diffing for
//! the rest of the application.

use crate::error::{ProviderError, Result};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::OnceLock;

/// Embedded schema JSON files (compiled into the binary)
const SCHEMA_FILES: &[&str] = &[
    include_str!("../resources/exchange.json"),
    include_str!("../resources/binding.json"),
    include_str!("../resources/user.json"),
    include_str!("../resources/permissions.json"),
    include_str!("../resources/federation_upstream.json"),
    include_str!("../resources/shovel.json"),
    include_str!("../resources/data_sources.json"),
];

/// Shown in place of sensitive values
pub const REDACTED: &str = "(sensitive value)";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttributeType {
    String,
    Bool,
    Int,
    /// List of strings
    List,
    /// Free-form JSON object
    Map,
    /// Nested attributes, stored as a one-element list
    Block,
}

impl AttributeType {
    fn describe(self) -> &'static str {
        match self {
            AttributeType::String => "a string",
            AttributeType::Bool => "a boolean",
            AttributeType::Int => "an integer",
            AttributeType::List => "a list of strings",
            AttributeType::Map => "a map",
            AttributeType::Block => "a single block",
        }
    }
}

/// Attribute definition from JSON
#[derive(Debug, Clone, Deserialize)]
pub struct AttributeDef {
    #[serde(rename = "type")]
    pub kind: AttributeType,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub required: bool,
    /// Reported by the server
    #[serde(default)]
    pub computed: bool,
    #[serde(default)]
    pub default: Option<Value>,
    /// A change requires destroying and recreating the entity
    #[serde(default)]
    pub force_new: bool,
    #[serde(default)]
    pub sensitive: bool,
    /// Sibling attributes that may not be set together with this one
    #[serde(default)]
    pub conflicts_with: Vec<String>,
    /// Deprecation message
    #[serde(default)]
    pub deprecated: Option<String>,
    #[serde(default)]
    pub one_of: Vec<String>,
    /// String holding a JSON document; compared semantically
    #[serde(default)]
    pub json: bool,
    /// Nested attributes of a block
    #[serde(default)]
    pub attributes: BTreeMap<String, AttributeDef>,
}

impl AttributeDef {
    /// Computed attributes that configuration cannot set
    pub fn is_computed_only(&self) -> bool {
        self.computed && !self.required && self.default.is_none()
    }
}

/// Schema of one resource or data source
#[derive(Debug, Clone, Deserialize)]
pub struct Schema {
    #[serde(default)]
    pub description: String,
    pub attributes: BTreeMap<String, AttributeDef>,
}

/// Root structure of resources/*.json
#[derive(Debug, Clone, Deserialize, Default)]
pub struct SchemaConfig {
    #[serde(default)]
    pub resources: HashMap<String, Schema>,
    #[serde(default)]
    pub data_sources: HashMap<String, Schema>,
}

/// Global registry loaded from JSON
static REGISTRY: OnceLock<SchemaConfig> = OnceLock::new();

/// Get the schema registry (loads from embedded JSON on first access)
pub fn get_registry() -> &'static SchemaConfig {
    REGISTRY.get_or_init(|| {
        let mut final_config = SchemaConfig::default();

        for content in SCHEMA_FILES {
            let partial: SchemaConfig = serde_json::from_str(content)
                .unwrap_or_else(|e| panic!("Failed to parse embedded schema JSON: {}", e));
            final_config.resources.extend(partial.resources);
            final_config.data_sources.extend(partial.data_sources);
        }

        final_config
    })
}

/// Get a resource schema by type name
pub fn get_schema(type_name: &str) -> Option<&'static Schema> {
    get_registry().resources.get(type_name)
}

pub fn get_data_source_schema(type_name: &str) -> Option<&'static Schema> {
    get_registry().data_sources.get(type_name)
}

/// All resource type names, sorted
pub fn get_all_type_names() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = get_registry().resources.keys().map(|s| s.as_str()).collect();
    names.sort_unstable();
    names
}

/// Configuration that passed validation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Validated {
    /// Input with nulls dropped and defaults filled in
    pub attributes: Map<String, Value>,
    /// Deprecation notices for attributes in use
    pub warnings: Vec<String>,
}

/// Validate resource configuration against its schema
pub fn validate(type_name: &str, attributes: &Map<String, Value>) -> Result<Validated> {
    let schema = get_schema(type_name)
        .ok_or_else(|| ProviderError::malformed(format!("unknown resource type `{}`", type_name)))?;
    validate_against(schema, attributes)
}

pub fn validate_against(schema: &Schema, attributes: &Map<String, Value>) -> Result<Validated> {
    let mut warnings = Vec::new();
    let attributes = validate_level(&schema.attributes, attributes, "", &mut warnings)?;
    Ok(Validated { attributes, warnings })
}

fn join(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", prefix, name)
    }
}

fn validate_level(
    defs: &BTreeMap<String, AttributeDef>,
    input: &Map<String, Value>,
    prefix: &str,
    warnings: &mut Vec<String>,
) -> Result<Map<String, Value>> {
    let present: Map<String, Value> = input
        .iter()
        .filter(|(_, v)| !v.is_null())
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    if let Some(unknown) = present.keys().find(|k| !defs.contains_key(k.as_str())) {
        return Err(ProviderError::malformed(format!(
            "unsupported attribute `{}`",
            join(prefix, unknown)
        )));
    }

    let mut out = Map::new();
    for (name, def) in defs {
        let path = join(prefix, name);

        let Some(value) = present.get(name) else {
            if def.required {
                return Err(ProviderError::malformed(format!(
                    "missing required attribute `{}`",
                    path
                )));
            }
            if let Some(default) = &def.default {
                out.insert(name.clone(), default.clone());
            }
            continue;
        };

        if def.is_computed_only() {
            return Err(ProviderError::malformed(format!(
                "`{}` is computed and cannot be configured",
                path
            )));
        }

        if let Some(other) = def.conflicts_with.iter().find(|o| present.contains_key(o.as_str())) {
            return Err(ProviderError::malformed(format!(
                "`{}` conflicts with `{}`",
                path,
                join(prefix, other)
            )));
        }

        if let Some(message) = &def.deprecated {
            warnings.push(format!("`{}` is deprecated: {}", path, message));
        }

        out.insert(name.clone(), check_value(def, value, &path, warnings)?);
    }

    Ok(out)
}

fn check_value(def: &AttributeDef, value: &Value, path: &str, warnings: &mut Vec<String>) -> Result<Value> {
    let type_error = || ProviderError::malformed(format!("`{}` must be {}", path, def.kind.describe()));

    match def.kind {
        AttributeType::String => {
            let text = value.as_str().ok_or_else(type_error)?;
            if !def.one_of.is_empty() && !def.one_of.iter().any(|o| o == text) {
                return Err(ProviderError::malformed(format!(
                    "`{}` must be one of {}, got `{}`",
                    path,
                    def.one_of.join(", "),
                    text
                )));
            }
            if def.json && !text.is_empty() {
                serde_json::from_str::<Value>(text).map_err(|e| {
                    ProviderError::malformed(format!("`{}` is not valid JSON: {}", path, e))
                })?;
            }
        }
        AttributeType::Bool if !value.is_boolean() => return Err(type_error()),
        AttributeType::Int if !value.is_i64() => return Err(type_error()),
        AttributeType::List => match value.as_array() {
            Some(items) if items.iter().all(Value::is_string) => {}
            _ => return Err(type_error()),
        },
        AttributeType::Map if !value.is_object() => return Err(type_error()),
        AttributeType::Block => {
            let items = value.as_array().ok_or_else(type_error)?;
            let [element] = items.as_slice() else {
                return Err(ProviderError::malformed(format!(
                    "`{}` takes exactly one block, found {}",
                    path,
                    items.len()
                )));
            };
            let element = element.as_object().ok_or_else(type_error)?;
            let nested = validate_level(&def.attributes, element, path, warnings)?;
            return Ok(Value::Array(vec![Value::Object(nested)]));
        }
        _ => {}
    }

    Ok(value.clone())
}

/// One attribute whose configured value differs from state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeChange {
    /// Dotted path, blocks included (`settings.durable`)
    pub path: String,
    /// Set when the attribute or an enclosing block forces replacement
    pub force_new: bool,
}

/// Attributes that differ between prior state and configuration
pub fn diff(schema: &Schema, prior: &Map<String, Value>, config: &Map<String, Value>) -> Vec<AttributeChange> {
    let mut changes = Vec::new();
    diff_level(&schema.attributes, Some(prior), Some(config), "", false, &mut changes);
    changes
}

fn diff_level(
    defs: &BTreeMap<String, AttributeDef>,
    prior: Option<&Map<String, Value>>,
    config: Option<&Map<String, Value>>,
    prefix: &str,
    parent_force_new: bool,
    changes: &mut Vec<AttributeChange>,
) {
    for (name, def) in defs {
        if def.is_computed_only() {
            continue;
        }

        let path = join(prefix, name);
        let force_new = parent_force_new || def.force_new;
        let old = prior.and_then(|m| m.get(name));
        let new = config.and_then(|m| m.get(name));

        if def.kind == AttributeType::Block {
            diff_level(&def.attributes, block_element(old), block_element(new), &path, force_new, changes);
        } else if !same_value(def, old, new) {
            changes.push(AttributeChange { path, force_new });
        }
    }
}

fn block_element(value: Option<&Value>) -> Option<&Map<String, Value>> {
    value?.as_array()?.first()?.as_object()
}

fn is_zero(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
    }
}

fn same_value(def: &AttributeDef, old: Option<&Value>, new: Option<&Value>) -> bool {
    let old = old.filter(|v| !is_zero(v));
    let new = new.filter(|v| !is_zero(v));

    match (old, new) {
        (None, None) => true,
        (Some(a), Some(b)) if def.json => same_json_text(a, b),
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

fn same_json_text(a: &Value, b: &Value) -> bool {
    let (Some(a), Some(b)) = (a.as_str(), b.as_str()) else {
        return a == b;
    };
    match (serde_json::from_str::<Value>(a), serde_json::from_str::<Value>(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

/// Copy of `attributes` with sensitive values masked for display
pub fn redact(schema: &Schema, attributes: &Map<String, Value>) -> Map<String, Value> {
    redact_level(&schema.attributes, attributes)
}

fn redact_level(defs: &BTreeMap<String, AttributeDef>, attributes: &Map<String, Value>) -> Map<String, Value> {
    attributes
        .iter()
        .map(|(name, value)| {
            let value = match defs.get(name) {
                Some(def) if def.sensitive && !is_zero(value) => Value::String(REDACTED.to_string()),
                Some(def) if def.kind == AttributeType::Block => match value {
                    Value::Array(items) => Value::Array(
                        items
                            .iter()
                            .map(|item| match item {
                                Value::Object(nested) => Value::Object(redact_level(&def.attributes, nested)),
                                other => other.clone(),
                            })
                            .collect(),
                    ),
                    other => other.clone(),
                },
                _ => value.clone(),
            };
            (name.clone(), value)
        })
        .collect()
}
