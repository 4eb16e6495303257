// flowdeck/src/registry/edge.rs

//! Edge type registry and edge instance factory.

use super::item::RegistryItem;
use super::store::Registry;
use crate::events::EventBus;
use crate::model::{merge_json_maps, EdgeEntity, Entity, JsonMap};
use crate::properties::PropertyFieldDefinition;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::ops::Deref;
use std::sync::Arc;
use tracing::{event, Level};

pub const EDGE_NAMESPACE: &str = "edges";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeConfig {
  pub id: String,
  #[serde(rename = "type")]
  pub edge_type: String,
  pub name: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub category: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  /// Stroke/marker hints for the renderer. Opaque here.
  #[serde(default)]
  pub style: JsonMap,
  #[serde(default)]
  pub properties: JsonMap,
  #[serde(default)]
  pub property_definitions: Vec<PropertyFieldDefinition>,
  #[serde(default)]
  pub animated: bool,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub label: Option<String>,
}

impl EdgeConfig {
  pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
    let id = id.into();
    Self {
      edge_type: id.clone(),
      id,
      name: name.into(),
      category: None,
      description: None,
      style: JsonMap::new(),
      properties: JsonMap::new(),
      property_definitions: Vec::new(),
      animated: false,
      label: None,
    }
  }
}

#[derive(Debug, Clone, Default)]
pub struct EdgeOverrides {
  pub id: Option<String>,
  pub label: Option<String>,
  pub data: JsonMap,
  pub properties: JsonMap,
}

pub struct EdgeRegistry {
  store: Registry<EdgeConfig>,
}

impl Deref for EdgeRegistry {
  type Target = Registry<EdgeConfig>;

  fn deref(&self) -> &Self::Target {
    &self.store
  }
}

impl EdgeRegistry {
  pub fn new(bus: Arc<EventBus>) -> Self {
    Self {
      store: Registry::new(EDGE_NAMESPACE, bus),
    }
  }

  pub fn register_edge(&self, config: EdgeConfig) {
    let mut item = RegistryItem::new(config.id.clone(), config.edge_type.clone(), config.name.clone(), config.clone());
    item.category = config.category.clone();
    item.description = config.description.clone();
    self.store.register(item);
  }

  pub fn edge_types(&self) -> Vec<String> {
    self.store.ids()
  }

  /// Builds an edge of `edge_type` between `source` and `target`. Returns
  /// `None` if the type is not registered.
  pub fn create_edge(&self, edge_type: &str, source: &str, target: &str, overrides: EdgeOverrides) -> Option<EdgeEntity> {
    let Some(config) = self.store.get_config(edge_type) else {
      event!(Level::WARN, %edge_type, "Cannot create edge of unregistered type.");
      return None;
    };

    let properties = merge_json_maps(&config.properties, &overrides.properties);
    let mut data = merge_json_maps(&config.properties, &overrides.data);
    if let Some(label) = overrides.label.or(config.label) {
      data.insert("label".to_string(), Value::String(label));
    }
    data.insert("style".to_string(), Value::Object(config.style.clone()));
    data.insert("animated".to_string(), Value::Bool(config.animated));

    let id = overrides
      .id
      .unwrap_or_else(|| format!("{}-{}-{}", source, target, uuid::Uuid::new_v4()));
    event!(Level::DEBUG, %edge_type, %id, %source, %target, "Edge instance created.");
    Some(EdgeEntity {
      entity: Entity {
        id,
        entity_type: config.edge_type,
        metadata: JsonMap::new(),
        data,
        properties,
      },
      source: source.to_string(),
      target: target.to_string(),
    })
  }
}
