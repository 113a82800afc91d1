//! HAPI metadata description
//!
//! Serde model of a HAPI `info` response. Keys the engine does not interpret
//! are preserved verbatim in `extra` so a merged description round-trips.

pub mod reconcile;

pub use reconcile::{reconcile, ReconcileError, RenameMap};

use serde::{Deserialize, Deserializer, Serialize};

/// Schema plus semantics of a record collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    /// Ordered parameter list; order defines column order
    pub parameters: Vec<ParameterDescriptor>,
    /// Originating dataset identifier, used to disambiguate colliding names
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_dataset: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Metadata {
    pub fn new(parameters: Vec<ParameterDescriptor>) -> Self {
        Self {
            parameters,
            x_dataset: None,
            extra: serde_json::Map::new(),
        }
    }

    pub fn with_dataset(mut self, dataset: impl Into<String>) -> Self {
        self.x_dataset = Some(dataset.into());
        self
    }

    pub fn dataset_id(&self) -> Option<&str> {
        self.x_dataset.as_deref()
    }

    pub fn parameter(&self, name: &str) -> Option<&ParameterDescriptor> {
        self.parameters.iter().find(|p| p.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.parameter(name).is_some()
    }

    pub fn parameter_names(&self) -> impl Iterator<Item = &str> {
        self.parameters.iter().map(|p| p.name.as_str())
    }
}

/// One parameter entry of a metadata description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterDescriptor {
    pub name: String,
    /// HAPI type name: `isotime`, `double`, `integer` or `string`
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<Vec<usize>>,
    /// Sentinel text meaning "missing"; servers sometimes send a bare number
    #[serde(default, deserialize_with = "fill_from_json")]
    pub fill: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ParameterDescriptor {
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            length: None,
            size: None,
            fill: None,
            extra: serde_json::Map::new(),
        }
    }

    pub fn with_length(mut self, length: usize) -> Self {
        self.length = Some(length);
        self
    }

    pub fn with_size(mut self, size: Vec<usize>) -> Self {
        self.size = Some(size);
        self
    }

    pub fn with_fill(mut self, fill: impl Into<String>) -> Self {
        self.fill = Some(fill.into());
        self
    }

    pub fn with_units(mut self, units: &str) -> Self {
        self.extra
            .insert("units".to_string(), serde_json::Value::String(units.to_string()));
        self
    }
}

fn fill_from_json<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match raw {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}
