// flowdeck/src/model/entity.rs

//! Instance-level view of a node or edge as the editor holds it.
//!
//! The property pipeline reads and writes three maps: `metadata`, `data`
//! (what the canvas renders) and `properties` (what the property panel edits).

use super::JsonMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
  pub id: String,
  #[serde(rename = "type")]
  pub entity_type: String,
  #[serde(default)]
  pub metadata: JsonMap,
  #[serde(default)]
  pub data: JsonMap,
  #[serde(default)]
  pub properties: JsonMap,
}

impl Entity {
  pub fn new(id: impl Into<String>, entity_type: impl Into<String>) -> Self {
    Self {
      id: id.into(),
      entity_type: entity_type.into(),
      ..Default::default()
    }
  }

  pub fn with_property(mut self, key: impl Into<String>, value: Value) -> Self {
    self.properties.insert(key.into(), value);
    self
  }

  pub fn with_data(mut self, key: impl Into<String>, value: Value) -> Self {
    self.data.insert(key.into(), value);
    self
  }

  pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
    self.metadata.insert(key.into(), value);
    self
  }

  pub fn property(&self, key: &str) -> Option<&Value> {
    self.properties.get(key)
  }
}

/// An edge instance: an entity plus its endpoints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeEntity {
  #[serde(flatten)]
  pub entity: Entity,
  pub source: String,
  pub target: String,
}
