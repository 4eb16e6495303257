// flowdeck/src/model/node.rs

//! Defines `BaseNodeConfig`, the complete description of a node type as stored
//! in the node registry.

use super::JsonMap;
use crate::inheritance::BaseNodeType;
use crate::properties::PropertyFieldDefinition;
use crate::registry::context_menu::ContextMenuItem;
use serde::{Deserialize, Serialize};

/// Presentation hints (colors, size, shape). Opaque to this crate.
pub type VisualConfig = JsonMap;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeMetadata {
  pub id: String,
  pub title: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  #[serde(default = "default_version")]
  pub version: String,
}

fn default_version() -> String {
  "1.0.0".to_string()
}

impl NodeMetadata {
  pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
    Self {
      id: id.into(),
      title: title.into(),
      description: None,
      version: default_version(),
    }
  }
}

/// Constraints on how a node may be wired. Every field is optional so that
/// overrides can name only what they change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionRules {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub can_be_source: Option<bool>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub can_be_target: Option<bool>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub max_incoming: Option<u32>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub max_outgoing: Option<u32>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub allowed_sources: Option<Vec<String>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub allowed_targets: Option<Vec<String>>,
}

impl ConnectionRules {
  /// Shallow merge: every field set in `over` replaces the base value.
  pub fn merged_with(&self, over: &ConnectionRules) -> ConnectionRules {
    ConnectionRules {
      can_be_source: over.can_be_source.or(self.can_be_source),
      can_be_target: over.can_be_target.or(self.can_be_target),
      max_incoming: over.max_incoming.or(self.max_incoming),
      max_outgoing: over.max_outgoing.or(self.max_outgoing),
      allowed_sources: over.allowed_sources.clone().or_else(|| self.allowed_sources.clone()),
      allowed_targets: over.allowed_targets.clone().or_else(|| self.allowed_targets.clone()),
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseNodeConfig {
  pub id: String,
  #[serde(rename = "type")]
  pub node_type: String,
  pub category: String,
  pub metadata: NodeMetadata,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub visual_config: Option<VisualConfig>,
  #[serde(default)]
  pub properties: JsonMap,
  #[serde(default)]
  pub property_definitions: Vec<PropertyFieldDefinition>,
  #[serde(default)]
  pub connection_rules: ConnectionRules,
  pub collapsible: bool,
  pub collapsed: bool,
  pub editable: bool,
  pub deletable: bool,
  pub connectable: bool,
  pub draggable: bool,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub icon: Option<String>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub context_menu_items: Vec<ContextMenuItem>,
  /// Archetype this config was derived from, if any.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub extends: Option<BaseNodeType>,
}

impl BaseNodeConfig {
  /// A minimal config with the default behaviour flags and no properties.
  pub fn new(id: impl Into<String>, category: impl Into<String>, title: impl Into<String>) -> Self {
    let id = id.into();
    Self {
      node_type: id.clone(),
      category: category.into(),
      metadata: NodeMetadata::new(id.clone(), title),
      id,
      visual_config: None,
      properties: JsonMap::new(),
      property_definitions: Vec::new(),
      connection_rules: ConnectionRules::default(),
      collapsible: true,
      collapsed: false,
      editable: true,
      deletable: true,
      connectable: true,
      draggable: true,
      icon: None,
      context_menu_items: Vec::new(),
      extends: None,
    }
  }

  pub fn property_definition(&self, field_id: &str) -> Option<&PropertyFieldDefinition> {
    self.property_definitions.iter().find(|d| d.id == field_id)
  }
}
