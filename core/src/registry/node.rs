// flowdeck/src/registry/node.rs

//! Node type registry and the node instance factory used by the canvas.

use super::item::RegistryItem;
use super::store::Registry;
use crate::events::EventBus;
use crate::model::{merge_json_maps, BaseNodeConfig, ConnectionRules, Entity, JsonMap};
use crate::properties::PropertyFieldDefinition;
use serde_json::Value;
use std::ops::Deref;
use std::sync::Arc;
use tracing::{event, Level};

pub const NODE_NAMESPACE: &str = "nodes";

/// Caller-supplied values layered over a node type's defaults by [`NodeRegistry::create_node`].
#[derive(Debug, Clone, Default)]
pub struct NodeOverrides {
  /// Instance id; a random one is generated when absent.
  pub id: Option<String>,
  pub data: JsonMap,
  pub properties: JsonMap,
  pub metadata: JsonMap,
}

impl NodeOverrides {
  pub fn with_id(mut self, id: impl Into<String>) -> Self {
    self.id = Some(id.into());
    self
  }

  pub fn with_property(mut self, key: impl Into<String>, value: Value) -> Self {
    self.properties.insert(key.into(), value);
    self
  }

  pub fn with_data(mut self, key: impl Into<String>, value: Value) -> Self {
    self.data.insert(key.into(), value);
    self
  }
}

pub struct NodeRegistry {
  store: Registry<BaseNodeConfig>,
}

impl Deref for NodeRegistry {
  type Target = Registry<BaseNodeConfig>;

  fn deref(&self) -> &Self::Target {
    &self.store
  }
}

impl NodeRegistry {
  pub fn new(bus: Arc<EventBus>) -> Self {
    Self {
      store: Registry::new(NODE_NAMESPACE, bus),
    }
  }

  /// Registers `config` under its own id, deriving name/category/description
  /// from its metadata.
  pub fn register_node(&self, config: BaseNodeConfig) {
    let mut item = RegistryItem::new(
      config.id.clone(),
      config.node_type.clone(),
      config.metadata.title.clone(),
      config.clone(),
    )
    .with_category(config.category.clone());
    item.description = config.metadata.description.clone();
    self.store.register(item);
  }

  pub fn node_types(&self) -> Vec<String> {
    self.store.ids()
  }

  pub fn property_definitions(&self, node_type: &str) -> Vec<PropertyFieldDefinition> {
    self
      .store
      .get_config(node_type)
      .map(|c| c.property_definitions)
      .unwrap_or_default()
  }

  pub fn connection_rules(&self, node_type: &str) -> Option<ConnectionRules> {
    self.store.get_config(node_type).map(|c| c.connection_rules)
  }

  /// Builds a node instance of `node_type` from the registered defaults.
  ///
  /// `properties` and `data` both start from the type's default properties and
  /// take the overrides on top. `label` falls back to the metadata title.
  /// Returns `None` if the type is not registered.
  pub fn create_node(&self, node_type: &str, overrides: NodeOverrides) -> Option<Entity> {
    let Some(config) = self.store.get_config(node_type) else {
      event!(Level::WARN, %node_type, "Cannot create node of unregistered type.");
      return None;
    };

    let mut properties = merge_json_maps(&config.properties, &overrides.properties);
    let mut data = merge_json_maps(&config.properties, &overrides.data);
    let title = Value::String(config.metadata.title.clone());
    data.entry("label").or_insert_with(|| title.clone());
    properties.entry("label").or_insert(title);

    let mut metadata = JsonMap::new();
    metadata.insert("title".to_string(), Value::String(config.metadata.title.clone()));
    metadata.insert("version".to_string(), Value::String(config.metadata.version.clone()));
    if let Some(description) = &config.metadata.description {
      metadata.insert("description".to_string(), Value::String(description.clone()));
    }
    let metadata = merge_json_maps(&metadata, &overrides.metadata);

    let id = overrides.id.unwrap_or_else(|| format!("{}-{}", node_type, uuid::Uuid::new_v4()));
    event!(Level::DEBUG, %node_type, %id, "Node instance created.");
    Some(Entity {
      id,
      entity_type: config.node_type,
      metadata,
      data,
      properties,
    })
  }
}
